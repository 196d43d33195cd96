//! Parallel rendering of many documents.

use crate::pipeline::{MdxRenderer, RenderedDocument};
use lessonmark_core::CompiledMdx;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// A single document to render.
#[derive(Debug, Clone)]
pub struct BatchInput {
    /// Document identifier (typically its content path).
    pub id: String,
    /// Content to render.
    pub content: CompiledMdx,
}

/// Result for a single document in a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// Identifier matching the input.
    pub id: String,
    /// Rendered document (present on success).
    pub document: Option<RenderedDocument>,
    /// Error message (present on failure).
    pub error: Option<String>,
}

/// Statistics for batch rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    /// Total number of documents submitted.
    pub total: u32,
    /// Number of successfully rendered documents.
    pub succeeded: u32,
    /// Number of failed renders.
    pub failed: u32,
    /// Total processing time in milliseconds.
    pub processing_time_ms: f64,
}

/// Options for batch rendering.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum number of threads to use. Defaults to the global rayon pool.
    pub max_threads: Option<usize>,
    /// Whether to keep rendering after an error. Defaults to true.
    pub continue_on_error: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_threads: None,
            continue_on_error: true,
        }
    }
}

/// All results of a batch, in input order, with statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutput {
    /// Individual results for each rendered input.
    pub results: Vec<BatchResult>,
    /// Processing statistics.
    pub stats: BatchStats,
}

impl MdxRenderer {
    /// Renders many documents in parallel, sharing this renderer's highlighter.
    ///
    /// With `continue_on_error` disabled, documents are rendered in order and
    /// rendering stops after the first failure; the failing result is included.
    pub fn render_batch(&self, inputs: &[BatchInput], options: &BatchOptions) -> BatchOutput {
        let start = Instant::now();

        let pool = options.max_threads.and_then(|threads| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|err| log::warn!("Falling back to the global thread pool: {}", err))
                .ok()
        });

        let total = inputs.len() as u32;
        let succeeded = AtomicU32::new(0);
        let failed = AtomicU32::new(0);

        let process_input = |input: &BatchInput| -> BatchResult {
            match self.render(&input.content) {
                Ok(document) => {
                    succeeded.fetch_add(1, Ordering::Relaxed);
                    BatchResult {
                        id: input.id.clone(),
                        document: Some(document),
                        error: None,
                    }
                }
                Err(err) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    let err = err.at_path(&input.id);
                    log::debug!("Batch render of {} failed: {}", input.id, err);
                    BatchResult {
                        id: input.id.clone(),
                        document: None,
                        error: Some(err.to_string()),
                    }
                }
            }
        };

        let results: Vec<BatchResult> = if options.continue_on_error {
            match &pool {
                Some(pool) => pool.install(|| inputs.par_iter().map(process_input).collect()),
                None => inputs.par_iter().map(process_input).collect(),
            }
        } else {
            let mut results = Vec::with_capacity(inputs.len());
            for input in inputs {
                let result = process_input(input);
                let stop = result.error.is_some();
                results.push(result);
                if stop {
                    break;
                }
            }
            results
        };

        BatchOutput {
            results,
            stats: BatchStats {
                total,
                succeeded: succeeded.load(Ordering::Relaxed),
                failed: failed.load(Ordering::Relaxed),
                processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
            },
        }
    }
}
