//! Content analysis over an injected [`VisionBackend`].

use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::analysis::backend::{Device, DevicePolicy, VisionBackend};
use crate::analysis::model::{AnalysisResult, Style, text_lines_from_objects};
use crate::color::{SamplerConfig, sample_colors_with};
use crate::error::{AdaptError, AdaptResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackendState {
    Uninitialized,
    Ready(Device),
}

/// Produces an [`AnalysisResult`] per image.
///
/// The backend is initialized on first use and reused for every later image.
/// A failed initialization leaves the analyzer uninitialized, so the next call
/// tries again.
pub struct ContentAnalyzer<B> {
    backend: B,
    policy: DevicePolicy,
    sampler: SamplerConfig,
    state: BackendState,
}

impl<B: VisionBackend> ContentAnalyzer<B> {
    pub fn new(backend: B, policy: DevicePolicy, sampler: SamplerConfig) -> Self {
        Self {
            backend,
            policy,
            sampler,
            state: BackendState::Uninitialized,
        }
    }

    /// Device the backend is running on, once initialized.
    pub fn device(&self) -> Option<Device> {
        match self.state {
            BackendState::Ready(device) => Some(device),
            BackendState::Uninitialized => None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Bring the backend up on the first device the policy allows.
    /// No-op when already initialized.
    pub async fn initialize(&mut self) -> AdaptResult<Device> {
        if let BackendState::Ready(device) = self.state {
            return Ok(device);
        }

        let mut last_error = None;
        for device in self.policy.candidates() {
            match self.backend.initialize(device).await {
                Ok(()) => {
                    info!(backend = self.backend.name(), %device, "vision backend ready");
                    self.state = BackendState::Ready(device);
                    return Ok(device);
                }
                Err(e) => {
                    debug!(backend = self.backend.name(), %device, error = %e, "device unavailable");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AdaptError::upstream(self.backend.name(), "no device allowed by policy")
        }))
    }

    /// Full analysis, surfacing backend failures.
    pub async fn try_analyze(&mut self, image: &RgbaImage) -> AdaptResult<AnalysisResult> {
        self.initialize().await?;

        let objects = self.backend.detect_objects(image).await?;
        let mut classes = self.backend.classify(image).await?;
        if classes.is_empty() {
            return Err(AdaptError::upstream(
                self.backend.name(),
                "classifier returned no labels",
            ));
        }
        classes.sort_by(|a, b| b.score.total_cmp(&a.score));

        let style = Style::from_label(classes.first().map(|c| c.label.as_str()));
        let colors = sample_colors_with(image, &self.sampler);
        let text_lines = text_lines_from_objects(&objects);

        Ok(AnalysisResult::new(
            objects,
            colors,
            style,
            text_lines,
            self.sampler.max_colors,
        ))
    }

    /// Analysis that never fails: backend problems degrade to a white
    /// background, modern style and no objects.
    pub async fn analyze(&mut self, image: &RgbaImage) -> AnalysisResult {
        match self.try_analyze(image).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(kind = %e.kind(), error = %e, "content analysis degraded");
                AnalysisResult::degraded()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::backend::{
        Classification, StaticBackend, StaticDetections, UnavailableBackend,
    };
    use crate::analysis::model::{BoundingBox, Color, DetectedObject};
    use image::Rgba;

    fn image() -> RgbaImage {
        RgbaImage::from_pixel(64, 48, Rgba([200, 10, 10, 255]))
    }

    fn detections() -> StaticDetections {
        StaticDetections {
            objects: vec![
                DetectedObject::new("person", 0.4, BoundingBox::new(0.0, 0.0, 5.0, 5.0)),
                DetectedObject::new("street sign", 0.9, BoundingBox::new(1.0, 1.0, 9.0, 9.0)),
            ],
            classifications: vec![
                Classification::new("sports car", 0.2),
                Classification::new("vintage poster", 0.7),
            ],
        }
    }

    #[tokio::test]
    async fn test_analyze_with_static_backend() {
        let mut analyzer = ContentAnalyzer::new(
            StaticBackend::new(detections()),
            DevicePolicy::default(),
            SamplerConfig::default(),
        );
        let analysis = analyzer.analyze(&image()).await;

        assert_eq!(analyzer.device(), Some(Device::Gpu));
        assert_eq!(analysis.style(), Style::Classic);
        assert_eq!(analysis.objects()[0].label, "street sign");
        assert_eq!(analysis.colors(), &[Color::new(200, 10, 10)]);
        assert_eq!(analysis.text_lines(), &["Texto detectado: street sign".to_string()]);
    }

    #[tokio::test]
    async fn test_cpu_fallback() {
        let backend = StaticBackend::new(detections()).with_devices(vec![Device::Cpu]);
        let mut analyzer =
            ContentAnalyzer::new(backend, DevicePolicy::default(), SamplerConfig::default());
        assert_eq!(analyzer.initialize().await.unwrap(), Device::Cpu);
        // second call is a no-op
        assert_eq!(analyzer.initialize().await.unwrap(), Device::Cpu);
    }

    #[tokio::test]
    async fn test_no_fallback_degrades() {
        let backend = StaticBackend::new(detections()).with_devices(vec![Device::Cpu]);
        let policy = DevicePolicy {
            preferred: Device::Gpu,
            allow_cpu_fallback: false,
        };
        let mut analyzer = ContentAnalyzer::new(backend, policy, SamplerConfig::default());
        let analysis = analyzer.analyze(&image()).await;
        assert!(analysis.objects().is_empty());
        assert_eq!(analysis.style(), Style::Modern);
        assert_eq!(analysis.background(), Color::WHITE);
        assert_eq!(analyzer.device(), None);
    }

    #[tokio::test]
    async fn test_unavailable_backend_degrades() {
        let mut analyzer = ContentAnalyzer::new(
            UnavailableBackend::default(),
            DevicePolicy::default(),
            SamplerConfig::default(),
        );
        let err = analyzer.try_analyze(&image()).await.unwrap_err();
        assert!(crate::error::classify::is_degradable(&err));

        let analysis = analyzer.analyze(&image()).await;
        assert!(analysis.text_lines().is_empty());
        assert!(analysis.colors().is_empty());
        assert_eq!(analysis.background(), Color::WHITE);
    }

    #[tokio::test]
    async fn test_empty_classification_degrades() {
        let mut analyzer = ContentAnalyzer::new(
            StaticBackend::new(StaticDetections {
                objects: detections().objects,
                classifications: vec![],
            }),
            DevicePolicy::default(),
            SamplerConfig::default(),
        );
        let analysis = analyzer.analyze(&image()).await;
        assert!(analysis.objects().is_empty());
    }
}
