//! One correction request at a time, from text to annotated document.

use std::sync::atomic::{AtomicBool, Ordering};

use redpen_core::{AnnotatedDocument, DiffOptions, annotate_with};

use crate::error::OracleError;
use crate::oracle::CorrectionOracle;

/// Result of [`Analyzer::analyze`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzeOutcome {
    /// Another request is in flight; the oracle was not contacted.
    Busy,
    /// The oracle returned nothing usable.
    NoCorrection,
    Annotated(AnnotatedDocument),
}

/// Sends text to an oracle and annotates the answer.
///
/// A busy flag admits one request at a time. It is released when the
/// request finishes, whether it succeeded or failed.
pub struct Analyzer<O> {
    oracle: O,
    options: DiffOptions,
    busy: AtomicBool,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<O: CorrectionOracle + Sync> Analyzer<O> {
    pub fn new(oracle: O) -> Self {
        Self::with_options(oracle, DiffOptions::default())
    }

    pub fn with_options(oracle: O, options: DiffOptions) -> Self {
        Self {
            oracle,
            options,
            busy: AtomicBool::new(false),
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Correct `text` with `model` and annotate the difference.
    pub async fn analyze(&self, text: &str, model: &str) -> Result<AnalyzeOutcome, OracleError> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            tracing::debug!("analysis already in progress");
            return Ok(AnalyzeOutcome::Busy);
        };
        if model.is_empty() {
            return Err(OracleError::NoModel);
        }

        let corrected = self.oracle.correct(text, model).await?;
        if corrected.trim().is_empty() {
            tracing::warn!(model, "oracle returned an empty correction");
            return Ok(AnalyzeOutcome::NoCorrection);
        }

        let doc = annotate_with(text, &corrected, self.options);
        tracing::info!(pending = doc.pending_count(), "analysis complete");
        Ok(AnalyzeOutcome::Annotated(doc))
    }
}
