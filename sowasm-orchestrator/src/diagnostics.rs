//! Session error taxonomy and diagnostic positions

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// `<msg> on line <N> at position <P>`, as reported by the RDF parsers
static POSITIONED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(.*) on line (\d+) at position (\d+)$").expect("valid diagnostic pattern")
});

/// A message anchored at a 1-based line and column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDiagnostic {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl ErrorDiagnostic {
    /// A diagnostic with no known position, anchored at 1:1
    pub fn unpositioned(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: 1,
            column: 1,
        }
    }
}

impl fmt::Display for ErrorDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on line {} at position {}",
            self.message, self.line, self.column
        )
    }
}

/// Extract the position from a raw diagnostic, if it carries one.
///
/// Line or position numbers too large to represent are treated as no match,
/// and a reported 0 is clamped to 1.
pub fn locate(raw: &str) -> Option<ErrorDiagnostic> {
    let caps = POSITIONED.captures(raw)?;
    let line: u32 = caps[2].parse().ok()?;
    let column: u32 = caps[3].parse().ok()?;
    Some(ErrorDiagnostic {
        message: caps[1].to_string(),
        line: line.max(1),
        column: column.max(1),
    })
}

/// Turn raw diagnostic text into a diagnostic; never fails
pub fn parse(raw: &str) -> ErrorDiagnostic {
    locate(raw).unwrap_or_else(|| ErrorDiagnostic::unpositioned(raw))
}

/// Every way a session attempt can fail.
///
/// Each error is terminal for the attempt that raised it and is shown in the
/// region that attempt writes to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The detector could not name a format, so there is nothing to convert from
    #[error("Input format could not be guessed")]
    DetectionAmbiguous,

    /// The converter rejected the input; `raw` is its message, shown unchanged
    #[error("{raw}")]
    Conversion {
        raw: String,
        /// Where the message points, when it carries a position
        marker: Option<ErrorDiagnostic>,
    },

    /// The remote server answered outside 2xx
    #[error("Got status {status}")]
    Load { status: u16 },

    /// The fetch itself failed; the transport's description is kept verbatim
    #[error("{0}")]
    Transport(String),
}

impl SessionError {
    /// Build a conversion error from the converter's raw message
    pub fn conversion(raw: &str) -> Self {
        SessionError::Conversion {
            raw: raw.to_string(),
            marker: locate(raw),
        }
    }

    /// The diagnostic to annotate the input with, if the error has a position
    pub fn marker(&self) -> Option<&ErrorDiagnostic> {
        match self {
            SessionError::Conversion { marker, .. } => marker.as_ref(),
            _ => None,
        }
    }
}
