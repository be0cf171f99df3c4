//! # Format Catalog
//!
//! The fixed set of output formats a source advertisement is adapted into.
//!
//! | Key | Size | Name |
//! |-----|------|------|
//! | `format600x500` | 600×500 | Banner Cuadrado |
//! | `format728x90` | 728×90 | Leaderboard |
//! | `format640x200` | 640×200 | Banner Rectangular |
//!
//! Catalogs can be replaced with a JSON array of `{width, height, display_name}`
//! objects. Order is significant: it is the order formats are scheduled in.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use adfmt_scale::presets::Size;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{AdaptError, AdaptResult};

/// One target output format. The aspect ratio is derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormatSpec {
    pub width: u32,
    pub height: u32,
    #[serde(alias = "name", alias = "displayName")]
    pub display_name: String,
}

impl FormatSpec {
    pub fn new(width: u32, height: u32, display_name: impl Into<String>) -> Self {
        Self {
            width,
            height,
            display_name: display_name.into(),
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.size().aspect_ratio()
    }

    /// Stable report key, e.g. `format728x90`.
    pub fn key(&self) -> String {
        format!("format{}x{}", self.width, self.height)
    }

    /// Human-readable ratio, e.g. `8.09:1`.
    pub fn ratio_label(&self) -> String {
        format!("{:.2}:1", self.aspect_ratio())
    }
}

static BUILTIN: Lazy<FormatCatalog> = Lazy::new(FormatCatalog::default);

/// Ordered, read-only list of output formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FormatSpec>", into = "Vec<FormatSpec>")]
pub struct FormatCatalog {
    formats: Vec<FormatSpec>,
}

impl Default for FormatCatalog {
    fn default() -> Self {
        Self {
            formats: vec![
                FormatSpec::new(600, 500, "Banner Cuadrado"),
                FormatSpec::new(728, 90, "Leaderboard"),
                FormatSpec::new(640, 200, "Banner Rectangular"),
            ],
        }
    }
}

impl FormatCatalog {
    /// Build a catalog, rejecting empty lists, zero sides and duplicate keys.
    pub fn new(formats: Vec<FormatSpec>) -> AdaptResult<Self> {
        if formats.is_empty() {
            return Err(AdaptError::config("catalog", "at least one format is required"));
        }

        let mut seen = HashSet::new();
        for format in &formats {
            if format.width == 0 || format.height == 0 {
                return Err(AdaptError::config(
                    "catalog",
                    format!(
                        "format '{}' has zero dimension {}x{}",
                        format.display_name, format.width, format.height
                    ),
                ));
            }
            if !seen.insert(format.key()) {
                return Err(AdaptError::config(
                    "catalog",
                    format!("duplicate format key '{}'", format.key()),
                ));
            }
        }

        Ok(Self { formats })
    }

    /// The process-wide default catalog.
    pub fn builtin() -> &'static FormatCatalog {
        &BUILTIN
    }

    pub fn from_json_str(json: &str) -> AdaptResult<Self> {
        let formats: Vec<FormatSpec> = serde_json::from_str(json)?;
        Self::new(formats)
    }

    pub fn from_path(path: impl AsRef<Path>) -> AdaptResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| AdaptError::io(format!("reading catalog {}", path.display()), e))?;
        Self::from_json_str(&json)
    }

    pub fn formats(&self) -> &[FormatSpec] {
        &self.formats
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FormatSpec> {
        self.formats.iter()
    }

    pub fn get(&self, key: &str) -> Option<&FormatSpec> {
        self.formats.iter().find(|f| f.key() == key)
    }
}

impl TryFrom<Vec<FormatSpec>> for FormatCatalog {
    type Error = AdaptError;

    fn try_from(formats: Vec<FormatSpec>) -> Result<Self, Self::Error> {
        Self::new(formats)
    }
}

impl From<FormatCatalog> for Vec<FormatSpec> {
    fn from(catalog: FormatCatalog) -> Self {
        catalog.formats
    }
}

impl<'a> IntoIterator for &'a FormatCatalog {
    type Item = &'a FormatSpec;
    type IntoIter = std::slice::Iter<'a, FormatSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
