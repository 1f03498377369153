use super::Converter;
use crate::diagnostics::SessionError;
use crate::state::SessionState;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// One conversion, snapshotted from the session when it starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertRequest {
    pub source: String,
    pub input_format: String,
    pub output_format: String,
    pub base_iri: String,
}

impl ConvertRequest {
    /// Snapshot the live session; the remote URL doubles as base IRI when set
    pub fn from_state(state: &SessionState, default_base_iri: &str) -> Self {
        let base_iri = if state.remote_url.is_empty() {
            default_base_iri
        } else {
            &state.remote_url
        };
        Self {
            source: state.input_text.clone(),
            input_format: state.input_format.clone(),
            output_format: state.output_format.clone(),
            base_iri: base_iri.to_string(),
        }
    }

    /// A conversion needs a known input format
    pub fn check(&self) -> Result<(), SessionError> {
        if self.input_format.is_empty() {
            Err(SessionError::DetectionAmbiguous)
        } else {
            Ok(())
        }
    }
}

/// Wraps the converter
#[derive(Clone)]
pub struct ConvertPipeline {
    converter: Arc<dyn Converter>,
}

impl ConvertPipeline {
    pub fn new(converter: Arc<dyn Converter>) -> Self {
        Self { converter }
    }

    /// Run one conversion.
    ///
    /// An empty input format fails on the first poll without yielding.
    /// Otherwise the future yields once before calling the converter, so
    /// whoever started it can show a pending state first. The converter's
    /// output is returned untouched.
    pub async fn convert(&self, request: ConvertRequest) -> Result<String, SessionError> {
        request.check()?;
        tokio::task::yield_now().await;

        let start = Instant::now();
        let result = self
            .converter
            .convert(
                &request.source,
                &request.input_format,
                &request.output_format,
                &request.base_iri,
            )
            .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(output) => {
                info!(
                    input_format = %request.input_format,
                    output_format = %request.output_format,
                    output_len = output.len(),
                    duration_ms,
                    "Conversion finished"
                );
                Ok(output)
            }
            Err(failure) => {
                let err = SessionError::conversion(&failure.to_string());
                warn!(
                    input_format = %request.input_format,
                    output_format = %request.output_format,
                    duration_ms,
                    error = %err,
                    "Conversion failed"
                );
                Err(err)
            }
        }
    }
}
