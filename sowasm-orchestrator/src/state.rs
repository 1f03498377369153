//! Session state, owned by the controller

use crate::diagnostics::SessionError;

/// Who decides the input format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatMode {
    /// Written by the format guesser only
    #[default]
    Auto,
    /// Chosen by the user, or by a Load that got a known content type
    Manual,
}

/// What the output region currently shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputRegion {
    #[default]
    Empty,
    /// A conversion is running
    Pending,
    Converted(String),
    Failed(SessionError),
}

impl OutputRegion {
    /// Text displayed in the region
    pub fn display_text(&self) -> String {
        match self {
            OutputRegion::Empty => String::new(),
            OutputRegion::Pending => "(parsing)".to_string(),
            OutputRegion::Converted(text) => text.clone(),
            OutputRegion::Failed(err) => err.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, OutputRegion::Failed(_))
    }
}

/// Everything one page view knows about the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub input_text: String,
    pub input_format_mode: FormatMode,
    /// Empty when unknown
    pub input_format: String,
    pub output_format: String,
    pub auto_convert_enabled: bool,
    pub remote_url: String,
    pub cors_proxy_enabled: bool,
    /// The buffer holds exactly what was last loaded from `remote_url`
    pub url_synced: bool,
    pub output: OutputRegion,
    /// Last load error, shown on the input region
    pub last_input_error: Option<SessionError>,
    /// A Load is in flight
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            input_text: String::new(),
            input_format_mode: FormatMode::Auto,
            input_format: String::new(),
            output_format: String::new(),
            auto_convert_enabled: true,
            remote_url: String::new(),
            cors_proxy_enabled: false,
            url_synced: false,
            output: OutputRegion::Empty,
            last_input_error: None,
            loading: false,
        }
    }
}

impl SessionState {
    pub fn is_auto_detect(&self) -> bool {
        self.input_format_mode == FormatMode::Auto
    }

    /// The manual convert action is only offered when conversion is not automatic
    pub fn convert_action_enabled(&self) -> bool {
        !self.auto_convert_enabled
    }

    pub fn load_action_enabled(&self) -> bool {
        !self.remote_url.is_empty()
    }

    /// Text displayed in the input region
    pub fn input_display_text(&self) -> String {
        if self.loading {
            "loading".to_string()
        } else if let Some(err) = &self.last_input_error {
            err.to_string()
        } else {
            self.input_text.clone()
        }
    }

    /// Whether a permalink may carry the buffer.
    ///
    /// It may not while the input region shows an error or a load, nor when
    /// the buffer can be re-fetched from `remote_url`.
    pub fn input_is_shareable(&self) -> bool {
        self.last_input_error.is_none() && !self.loading && !self.url_synced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = SessionState::default();
        assert!(state.is_auto_detect());
        assert!(state.auto_convert_enabled);
        assert!(!state.cors_proxy_enabled);
        assert!(!state.convert_action_enabled());
        assert!(!state.load_action_enabled());
        assert!(state.input_is_shareable());
    }

    #[test]
    fn test_input_display() {
        let mut state = SessionState {
            input_text: "<a> <b> <c> .".into(),
            ..SessionState::default()
        };
        assert_eq!(state.input_display_text(), "<a> <b> <c> .");

        state.loading = true;
        assert_eq!(state.input_display_text(), "loading");
        assert!(!state.input_is_shareable());

        state.loading = false;
        state.last_input_error = Some(SessionError::Load { status: 500 });
        assert_eq!(state.input_display_text(), "Got status 500");
        assert!(!state.input_is_shareable());
    }

    #[test]
    fn test_output_display() {
        assert_eq!(OutputRegion::Pending.display_text(), "(parsing)");
        let failed = OutputRegion::Failed(SessionError::DetectionAmbiguous);
        assert!(failed.is_error());
        assert_eq!(failed.display_text(), "Input format could not be guessed");
    }
}
