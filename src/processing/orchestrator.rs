//! # Adaptation Orchestrator
//!
//! Runs the configured renderer once per catalog format and gathers the
//! outcomes into an [`AdaptationReport`].
//!
//! ## Concurrency
//!
//! Every format is an independent task. Tasks are bounded by a semaphore sized
//! to `max_concurrency` and the CPU-bound rendering runs on tokio's blocking
//! pool. The source image and analysis are shared read-only through `Arc`;
//! each task owns its canvas.
//!
//! ## Progress
//!
//! `on_progress(display_name, 0)` fires when a format starts and
//! `on_progress(display_name, 100)` when it finishes, whatever the outcome.
//! Events for different formats may interleave.
//!
//! ## Failure isolation
//!
//! A failed or panicking format becomes an [`AdaptationResult::Failure`] in the
//! report. Siblings keep running and the batch itself never fails.
//!
//! Dropping the future returned by [`Orchestrator::adapt_all`] cancels the
//! batch: renders already on the blocking pool finish and are discarded.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use image::RgbaImage;
use serde::Serialize;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info, warn};

use crate::analysis::model::AnalysisResult;
use crate::catalog::{FormatCatalog, FormatSpec};
use crate::config::AdapterConfig;
use crate::error::{AdaptError, AdaptResult, ErrorKind};
use crate::render::{EncodedImage, FormatRenderer, build_renderer};

/// Progress reported before a format starts.
pub const PROGRESS_STARTED: u8 = 0;
/// Progress reported after a format finished or failed.
pub const PROGRESS_DONE: u8 = 100;

/// Outcome of one format.
#[derive(Debug, Clone, PartialEq)]
pub enum AdaptationResult {
    Success(EncodedImage),
    Failure {
        format: FormatSpec,
        kind: ErrorKind,
        message: String,
    },
}

impl AdaptationResult {
    fn failure(format: &FormatSpec, error: &AdaptError) -> Self {
        AdaptationResult::Failure {
            format: format.clone(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AdaptationResult::Success(_))
    }

    pub fn image(&self) -> Option<&EncodedImage> {
        match self {
            AdaptationResult::Success(image) => Some(image),
            AdaptationResult::Failure { .. } => None,
        }
    }
}

/// Per-format failure summary, as printed by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord<'a> {
    pub key: &'a str,
    pub format: &'a str,
    pub kind: ErrorKind,
    pub message: &'a str,
}

/// Outcomes keyed by `format<W>x<H>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdaptationReport {
    results: BTreeMap<String, AdaptationResult>,
    expected: usize,
}

impl AdaptationReport {
    fn new(expected: usize) -> Self {
        Self {
            results: BTreeMap::new(),
            expected,
        }
    }

    fn insert(&mut self, key: String, result: AdaptationResult) {
        self.results.insert(key, result);
    }

    /// Every scheduled format has reported.
    pub fn is_complete(&self) -> bool {
        self.results.len() == self.expected
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&AdaptationResult> {
        self.results.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AdaptationResult)> {
        self.results.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn successes(&self) -> impl Iterator<Item = (&str, &EncodedImage)> {
        self.iter().filter_map(|(k, r)| r.image().map(|img| (k, img)))
    }

    pub fn failures(&self) -> impl Iterator<Item = FailureRecord<'_>> {
        self.iter().filter_map(|(key, r)| match r {
            AdaptationResult::Failure {
                format,
                kind,
                message,
            } => Some(FailureRecord {
                key,
                format: &format.display_name,
                kind: *kind,
                message,
            }),
            AdaptationResult::Success(_) => None,
        })
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn into_results(self) -> BTreeMap<String, AdaptationResult> {
        self.results
    }
}

/// Schedules one render per catalog format.
#[derive(Clone)]
pub struct Orchestrator {
    renderer: Arc<dyn FormatRenderer>,
    max_concurrency: usize,
}

impl Orchestrator {
    pub fn new(renderer: Arc<dyn FormatRenderer>, max_concurrency: usize) -> Self {
        Self {
            renderer,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn from_config(config: &AdapterConfig) -> AdaptResult<Self> {
        Ok(Self::new(build_renderer(config)?, config.max_concurrency))
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Adapt `source` into every format of `catalog` concurrently.
    pub async fn adapt_all<F>(
        &self,
        source: Arc<RgbaImage>,
        analysis: Arc<AnalysisResult>,
        catalog: &FormatCatalog,
        on_progress: F,
    ) -> AdaptationReport
    where
        F: Fn(&str, u8) + Sync,
    {
        let started = Instant::now();
        info!(
            formats = catalog.len(),
            renderer = self.renderer.name(),
            max_concurrency = self.max_concurrency,
            "adapting formats"
        );

        let semaphore = Semaphore::new(self.max_concurrency);
        let semaphore = &semaphore;
        let on_progress = &on_progress;

        let tasks = catalog.iter().map(|format| {
            let renderer = Arc::clone(&self.renderer);
            let source = Arc::clone(&source);
            let analysis = Arc::clone(&analysis);
            let format = format.clone();

            async move {
                let _permit = match acquire_slot(semaphore, &format).await {
                    Ok(permit) => permit,
                    Err(failed) => {
                        on_progress(&format.display_name, PROGRESS_DONE);
                        return (format.key(), failed);
                    }
                };
                on_progress(&format.display_name, PROGRESS_STARTED);

                let job_format = format.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    renderer.render(&source, &analysis, &job_format)
                })
                .await;

                let result = match joined {
                    Ok(rendered) => settle(&format, rendered),
                    Err(e) if e.is_panic() => settle(&format, Err(panic_error(e.into_panic()))),
                    Err(e) => settle(&format, Err(AdaptError::render("task", e))),
                };

                on_progress(&format.display_name, PROGRESS_DONE);
                (format.key(), result)
            }
        });

        let mut report = AdaptationReport::new(catalog.len());
        for (key, result) in join_all(tasks).await {
            report.insert(key, result);
        }

        info!(
            succeeded = report.success_count(),
            total = report.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "adaptation finished"
        );
        report
    }

    /// Sequential variant of [`adapt_all`](Self::adapt_all) that needs no runtime.
    pub fn adapt_all_blocking<F>(
        &self,
        source: &RgbaImage,
        analysis: &AnalysisResult,
        catalog: &FormatCatalog,
        mut on_progress: F,
    ) -> AdaptationReport
    where
        F: FnMut(&str, u8),
    {
        let mut report = AdaptationReport::new(catalog.len());
        for format in catalog {
            on_progress(&format.display_name, PROGRESS_STARTED);
            let rendered = catch_unwind(AssertUnwindSafe(|| {
                self.renderer.render(source, analysis, format)
            }))
            .unwrap_or_else(|payload| Err(panic_error(payload)));
            report.insert(format.key(), settle(format, rendered));
            on_progress(&format.display_name, PROGRESS_DONE);
        }
        report
    }
}

fn settle(format: &FormatSpec, rendered: AdaptResult<EncodedImage>) -> AdaptationResult {
    match rendered {
        Ok(image) => {
            debug!(format = %format.key(), bytes = image.png.len(), "format rendered");
            AdaptationResult::Success(image)
        }
        Err(e) => {
            warn!(format = %format.key(), kind = %e.kind(), error = %e, "format failed");
            AdaptationResult::failure(format, &e)
        }
    }
}

/// Wait for a render slot. A closed limiter fails the format rather than
/// running it unbounded.
async fn acquire_slot<'a>(
    semaphore: &'a Semaphore,
    format: &FormatSpec,
) -> Result<SemaphorePermit<'a>, AdaptationResult> {
    semaphore
        .acquire()
        .await
        .map_err(|e| settle(format, Err(AdaptError::render("schedule", e))))
}

fn panic_error(payload: Box<dyn Any + Send>) -> AdaptError {
    let reason = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    AdaptError::render("task", format!("renderer panicked: {}", reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::Style;

    #[tokio::test]
    async fn test_closed_limiter_fails_format() {
        let format = FormatSpec::new(600, 500, "Banner Cuadrado");
        let semaphore = Semaphore::new(1);
        assert!(acquire_slot(&semaphore, &format).await.is_ok());

        semaphore.close();
        match acquire_slot(&semaphore, &format).await {
            Err(AdaptationResult::Failure { kind, message, .. }) => {
                assert_eq!(kind, ErrorKind::RenderError);
                assert!(message.contains("schedule"), "{message}");
            }
            other => panic!("expected failure, got {:?}", other.map(|_| ())),
        }
    }

    struct PanicRenderer;

    impl FormatRenderer for PanicRenderer {
        fn name(&self) -> &'static str {
            "panic"
        }

        fn render(&self, _: &RgbaImage, _: &AnalysisResult, format: &FormatSpec) -> AdaptResult<EncodedImage> {
            if format.width == 728 {
                panic!("boom");
            }
            Ok(EncodedImage::new(format, vec![]))
        }
    }

    #[test]
    fn test_blocking_isolates_panics() {
        let orchestrator = Orchestrator::new(Arc::new(PanicRenderer), 1);
        let analysis = AnalysisResult::new(vec![], vec![], Style::Modern, vec![], 5);
        let report = orchestrator.adapt_all_blocking(
            &RgbaImage::new(4, 4),
            &analysis,
            FormatCatalog::builtin(),
            |_, _| {},
        );

        assert!(report.is_complete());
        assert_eq!(report.success_count(), 2);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].key, "format728x90");
        assert_eq!(failures[0].kind, ErrorKind::RenderError);
        assert!(failures[0].message.contains("boom"));
    }

    #[test]
    fn test_zero_concurrency_clamped() {
        let orchestrator = Orchestrator::new(Arc::new(PanicRenderer), 0);
        assert_eq!(orchestrator.max_concurrency(), 1);
    }
}
