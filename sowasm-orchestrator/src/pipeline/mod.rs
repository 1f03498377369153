//! Format guessing and conversion
//!
//! The detector and converter are black boxes; the pipelines only add the
//! session rules around them (empty format guard, yield before converting,
//! diagnostic extraction).

mod convert;
mod guess;

pub use convert::{ConvertPipeline, ConvertRequest};
pub use guess::GuessPipeline;

use async_trait::async_trait;

/// Failure reported by a [`Converter`]; its text is the raw diagnostic
pub type ConverterFailure = Box<dyn std::error::Error + Send + Sync>;

/// Names the serialization of a text
pub trait Detector: Send + Sync {
    /// Returns a format id, or `None` when no supported format parses the text.
    ///
    /// Must be deterministic.
    fn guess(&self, source: &str) -> Option<String>;
}

/// Converts a text between serializations
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(
        &self,
        source: &str,
        input_format: &str,
        output_format: &str,
        base_iri: &str,
    ) -> Result<String, ConverterFailure>;
}
