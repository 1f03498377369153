use super::Detector;
use std::sync::Arc;
use tracing::debug;

/// Wraps the detector; empty string means the format was not determined
#[derive(Clone)]
pub struct GuessPipeline {
    detector: Arc<dyn Detector>,
}

impl GuessPipeline {
    pub fn new(detector: Arc<dyn Detector>) -> Self {
        Self { detector }
    }

    pub fn guess(&self, text: &str) -> String {
        let format = self.detector.guess(text).unwrap_or_default();
        debug!(text_len = text.len(), format = %format, "Guessed input format");
        format
    }
}
