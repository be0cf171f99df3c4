//! Immutable analysis data produced once per source image.

use std::fmt;
use std::str::FromStr;

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::AdaptError;

/// Upper bound on detected objects kept in an [`AnalysisResult`].
pub const MAX_OBJECTS: usize = 10;
/// Default cap on dominant colors.
pub const DEFAULT_MAX_COLORS: usize = 5;
/// Upper bound on text lines synthesised from detector labels.
pub const MAX_SYNTHESIZED_TEXT_LINES: usize = 3;

/// Axis-aligned box in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    /// Build a box, swapping corners so that `xmin <= xmax` and `ymin <= ymax`.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            xmin: x0.min(x1),
            ymin: y0.min(y1),
            xmax: x0.max(x1),
            ymax: y0.max(y1),
        }
    }

    fn normalized(self) -> Self {
        Self::new(self.xmin, self.ymin, self.xmax, self.ymax)
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// One labelled detection from the external object detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    #[serde(alias = "score")]
    pub confidence: f64,
    #[serde(rename = "boundingBox", alias = "box", alias = "bounding_box")]
    pub bounding_box: BoundingBox,
}

impl DetectedObject {
    pub fn new(label: impl Into<String>, confidence: f64, bounding_box: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bounding_box,
        }
        .normalized()
    }

    fn normalized(mut self) -> Self {
        self.confidence = if self.confidence.is_nan() {
            0.0
        } else {
            self.confidence.clamp(0.0, 1.0)
        };
        self.bounding_box = self.bounding_box.normalized();
        self
    }
}

/// Opaque RGB color. Serialized as `rgb(r, g, b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = AdaptError;

    /// Accepts `rgb(r, g, b)`, `#rrggbb`, `#rgb`, `white` and `black`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase();
        let bad = || AdaptError::decode("color", format!("unsupported color '{}'", s));

        match raw.as_str() {
            "white" => return Ok(Color::WHITE),
            "black" => return Ok(Color::BLACK),
            _ => {}
        }

        if let Some(body) = raw.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
            let parts: Vec<u8> = body
                .split(',')
                .map(|p| p.trim().parse::<u8>())
                .collect::<Result<_, _>>()
                .map_err(|_| bad())?;
            return match parts.as_slice() {
                [r, g, b] => Ok(Color::new(*r, *g, *b)),
                _ => Err(bad()),
            };
        }

        if let Some(hex) = raw.strip_prefix('#').filter(|h| h.is_ascii()) {
            let channel = |h: &str| u8::from_str_radix(h, 16).map_err(|_| bad());
            return match hex.len() {
                6 => Ok(Color::new(
                    channel(&hex[0..2])?,
                    channel(&hex[2..4])?,
                    channel(&hex[4..6])?,
                )),
                3 => {
                    let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                    Ok(Color::new(short(0)?, short(1)?, short(2)?))
                }
                _ => Err(bad()),
            };
        }

        Err(bad())
    }
}

impl TryFrom<String> for Color {
    type Error = AdaptError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Visual style of the advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Modern,
    Classic,
    Minimal,
    Bold,
}

impl Style {
    /// Map the top-1 classifier label to a style. Absent labels mean modern.
    pub fn from_label(label: Option<&str>) -> Style {
        let Some(label) = label else {
            return Style::Modern;
        };
        let label = label.to_lowercase();
        let has = |keys: &[&str]| keys.iter().any(|k| label.contains(k));

        if has(&["minimal", "simple"]) {
            Style::Minimal
        } else if has(&["vintage", "classic"]) {
            Style::Classic
        } else if has(&["bold", "bright"]) {
            Style::Bold
        } else {
            Style::Modern
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Style::Modern => "modern",
            Style::Classic => "classic",
            Style::Minimal => "minimal",
            Style::Bold => "bold",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stand-in for OCR: detections whose label mentions text or signage.
pub fn text_lines_from_objects(objects: &[DetectedObject]) -> Vec<String> {
    objects
        .iter()
        .filter(|o| o.label.contains("text") || o.label.contains("sign"))
        .map(|o| format!("Texto detectado: {}", o.label))
        .take(MAX_SYNTHESIZED_TEXT_LINES)
        .collect()
}

/// Content analysis for one source image.
///
/// Fields are private: once built, an analysis is never mutated. A new
/// adaptation run needs a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAnalysis")]
pub struct AnalysisResult {
    objects: Vec<DetectedObject>,
    colors: Vec<Color>,
    style: Style,
    #[serde(rename = "textLines")]
    text_lines: Vec<String>,
}

/// Wire shape accepted from analysis JSON; normalized through [`AnalysisResult::new`].
#[derive(Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    objects: Vec<DetectedObject>,
    #[serde(default)]
    colors: Vec<Color>,
    #[serde(default)]
    style: Style,
    #[serde(default, rename = "textLines", alias = "text", alias = "text_lines")]
    text_lines: Vec<String>,
}

impl From<RawAnalysis> for AnalysisResult {
    fn from(raw: RawAnalysis) -> Self {
        AnalysisResult::new(raw.objects, raw.colors, raw.style, raw.text_lines, DEFAULT_MAX_COLORS)
    }
}

impl AnalysisResult {
    /// Build an analysis: objects are ordered by descending confidence (stable)
    /// and capped at [`MAX_OBJECTS`]; colors are capped at `max_colors`.
    pub fn new(
        objects: Vec<DetectedObject>,
        mut colors: Vec<Color>,
        style: Style,
        text_lines: Vec<String>,
        max_colors: usize,
    ) -> Self {
        let mut objects: Vec<DetectedObject> =
            objects.into_iter().map(DetectedObject::normalized).collect();
        objects.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        objects.truncate(MAX_OBJECTS);
        colors.truncate(max_colors);

        Self {
            objects,
            colors,
            style,
            text_lines,
        }
    }

    /// Fallback used when the vision backend is unavailable: no objects, no
    /// text, no colors (white background) and modern style.
    pub fn degraded() -> Self {
        Self::new(Vec::new(), Vec::new(), Style::Modern, Vec::new(), DEFAULT_MAX_COLORS)
    }

    pub fn objects(&self) -> &[DetectedObject] {
        &self.objects
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn text_lines(&self) -> &[String] {
        &self.text_lines
    }

    /// Dominant color, or white when none were found.
    pub fn background(&self) -> Color {
        self.colors.first().copied().unwrap_or(Color::WHITE)
    }

    pub fn headline(&self) -> Option<&str> {
        self.text_lines.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(label: &str, confidence: f64) -> DetectedObject {
        DetectedObject::new(label, confidence, BoundingBox::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn test_color_parsing() {
        assert_eq!("rgb(12, 34, 56)".parse::<Color>().unwrap(), Color::new(12, 34, 56));
        assert_eq!("#ffffff".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!("#0f0".parse::<Color>().unwrap(), Color::new(0, 255, 0));
        assert_eq!("White".parse::<Color>().unwrap(), Color::WHITE);
        assert!("rgb(1, 2)".parse::<Color>().is_err());
        assert!("rgb(300, 0, 0)".parse::<Color>().is_err());
        assert!("teal".parse::<Color>().is_err());
        assert!("#aéaaa".parse::<Color>().is_err());
        assert_eq!(Color::new(1, 2, 3).to_string(), "rgb(1, 2, 3)");
    }

    #[test]
    fn test_style_from_label() {
        assert_eq!(Style::from_label(Some("Simple Layout")), Style::Minimal);
        assert_eq!(Style::from_label(Some("vintage poster")), Style::Classic);
        assert_eq!(Style::from_label(Some("BRIGHT colors")), Style::Bold);
        assert_eq!(Style::from_label(Some("sports car")), Style::Modern);
        assert_eq!(Style::from_label(None), Style::Modern);
    }

    #[test]
    fn test_objects_sorted_and_capped() {
        let objects = (0..15).map(|i| obj(&format!("o{i}"), i as f64 / 20.0)).collect();
        let analysis = AnalysisResult::new(objects, vec![], Style::Bold, vec![], 5);
        assert_eq!(analysis.objects().len(), MAX_OBJECTS);
        assert_eq!(analysis.objects()[0].label, "o14");
        assert!(
            analysis
                .objects()
                .windows(2)
                .all(|w| w[0].confidence >= w[1].confidence)
        );
    }

    #[test]
    fn test_bounding_box_and_confidence_normalized() {
        let o = DetectedObject::new("cup", 1.7, BoundingBox::new(50.0, 40.0, 10.0, 5.0));
        assert_eq!(o.confidence, 1.0);
        assert_eq!(o.bounding_box, BoundingBox { xmin: 10.0, ymin: 5.0, xmax: 50.0, ymax: 40.0 });
    }

    #[test]
    fn test_text_lines_from_objects() {
        let objects = vec![obj("person", 0.9), obj("stop sign", 0.8), obj("text", 0.7)];
        assert_eq!(
            text_lines_from_objects(&objects),
            vec!["Texto detectado: stop sign", "Texto detectado: text"]
        );
    }

    #[test]
    fn test_deserialize_detector_field_names() {
        let json = r##"{
            "objects": [
                {"label": "car", "score": 0.5, "box": {"xmin": 0, "ymin": 0, "xmax": 4, "ymax": 4}},
                {"label": "sign", "score": 0.9, "box": {"xmin": 1, "ymin": 1, "xmax": 2, "ymax": 2}}
            ],
            "colors": ["rgb(1, 2, 3)", "#ffffff"],
            "style": "classic",
            "text": ["SALE"]
        }"##;
        let analysis: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.objects()[0].label, "sign");
        assert_eq!(analysis.background(), Color::new(1, 2, 3));
        assert_eq!(analysis.style(), Style::Classic);
        assert_eq!(analysis.headline(), Some("SALE"));
    }

    #[test]
    fn test_degraded_defaults() {
        let analysis = AnalysisResult::degraded();
        assert_eq!(analysis.background(), Color::WHITE);
        assert_eq!(analysis.style(), Style::Modern);
        assert!(analysis.objects().is_empty());
    }
}
