//! Capabilities the controller needs from the page widgets
//!
//! Edits made by the user reach the controller as
//! [`SessionEvent::InputEdited`](crate::controller::SessionEvent::InputEdited);
//! these traits only cover what the controller pushes back out.

use crate::diagnostics::ErrorDiagnostic;

/// The input text widget
pub trait TextEditor: Send + Sync {
    /// Replace the buffer without emitting a change event
    fn set_value(&self, text: &str);

    /// Switch syntax highlighting to the given format id (empty when unknown)
    fn set_highlight_mode(&self, format: &str);
}

/// Inline error markers on the input widget
pub trait MarkerAnnotator: Send + Sync {
    /// Replace all markers; an empty slice clears them
    fn set_markers(&self, markers: &[ErrorDiagnostic]);
}

/// Destination of the permalink action
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str);
}
