//! Vision backend capability.
//!
//! The object detector and image classifier are external collaborators. They
//! are reached through [`VisionBackend`], constructed explicitly and handed to
//! the [`ContentAnalyzer`](super::analyzer::ContentAnalyzer).

use std::fmt;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::analysis::model::DetectedObject;
use crate::error::{AdaptError, AdaptResult};

/// Compute device a backend runs its models on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Gpu,
    Cpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Gpu => f.write_str("gpu"),
            Device::Cpu => f.write_str("cpu"),
        }
    }
}

/// Which device to ask for first, and whether CPU is an acceptable fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevicePolicy {
    pub preferred: Device,
    pub allow_cpu_fallback: bool,
}

impl Default for DevicePolicy {
    fn default() -> Self {
        Self {
            preferred: Device::Gpu,
            allow_cpu_fallback: true,
        }
    }
}

impl DevicePolicy {
    /// Devices to try, in order.
    pub fn candidates(&self) -> Vec<Device> {
        let mut devices = vec![self.preferred];
        if self.allow_cpu_fallback && self.preferred != Device::Cpu {
            devices.push(Device::Cpu);
        }
        devices
    }
}

/// One image-level label from the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub score: f64,
}

impl Classification {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Name used in logs and error reports.
    fn name(&self) -> &str;

    /// Load models on `device`. Called at most once per successful start.
    async fn initialize(&mut self, device: Device) -> AdaptResult<()>;

    async fn detect_objects(&self, image: &RgbaImage) -> AdaptResult<Vec<DetectedObject>>;

    async fn classify(&self, image: &RgbaImage) -> AdaptResult<Vec<Classification>>;
}

/// Precomputed detector and classifier output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticDetections {
    #[serde(default)]
    pub objects: Vec<DetectedObject>,
    #[serde(default)]
    pub classifications: Vec<Classification>,
}

/// Replays fixed detections for every image.
#[derive(Debug, Clone)]
pub struct StaticBackend {
    detections: StaticDetections,
    devices: Vec<Device>,
}

impl StaticBackend {
    pub fn new(detections: StaticDetections) -> Self {
        Self {
            detections,
            devices: vec![Device::Gpu, Device::Cpu],
        }
    }

    /// Restrict the devices `initialize` accepts.
    pub fn with_devices(mut self, devices: Vec<Device>) -> Self {
        self.devices = devices;
        self
    }

    pub fn from_json_str(json: &str) -> AdaptResult<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn from_path(path: impl AsRef<Path>) -> AdaptResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| AdaptError::io(format!("reading analysis {}", path.display()), e))?;
        Self::from_json_str(&json)
    }
}

#[async_trait]
impl VisionBackend for StaticBackend {
    fn name(&self) -> &str {
        "static"
    }

    async fn initialize(&mut self, device: Device) -> AdaptResult<()> {
        if self.devices.contains(&device) {
            Ok(())
        } else {
            Err(AdaptError::upstream(self.name(), format!("device {} not supported", device)))
        }
    }

    async fn detect_objects(&self, _image: &RgbaImage) -> AdaptResult<Vec<DetectedObject>> {
        Ok(self.detections.objects.clone())
    }

    async fn classify(&self, _image: &RgbaImage) -> AdaptResult<Vec<Classification>> {
        Ok(self.detections.classifications.clone())
    }
}

/// A backend that is never available. Analysis through it always degrades.
#[derive(Debug, Clone, Default)]
pub struct UnavailableBackend {
    reason: String,
}

impl UnavailableBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> AdaptError {
        let reason = if self.reason.is_empty() {
            "no vision backend configured"
        } else {
            self.reason.as_str()
        };
        AdaptError::upstream(self.name(), reason)
    }
}

#[async_trait]
impl VisionBackend for UnavailableBackend {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn initialize(&mut self, _device: Device) -> AdaptResult<()> {
        Err(self.error())
    }

    async fn detect_objects(&self, _image: &RgbaImage) -> AdaptResult<Vec<DetectedObject>> {
        Err(self.error())
    }

    async fn classify(&self, _image: &RgbaImage) -> AdaptResult<Vec<Classification>> {
        Err(self.error())
    }
}
