//! Session <-> query string mapping
//!
//! | key | meaning |
//! |-----|---------|
//! | `guess` / `noguess` | auto / manual input format |
//! | `iformat` | input format, written only in manual mode |
//! | `oformat` | output format |
//! | `auto` / `noauto` | automatic conversion on / off |
//! | `input` | the buffer, when it is worth sharing |
//! | `url` | remote source |
//! | `corsproxy` | fetch through the proxy |
//!
//! Flags are written with an empty value (`guess=`). Decoding only looks at
//! key presence for flags, ignores unknown keys, and never fails.

use crate::state::{FormatMode, SessionState};
use url::{form_urlencoded, Url};

/// Build the query string for `state`, without the leading `?`
pub fn encode(state: &SessionState) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());

    match state.input_format_mode {
        FormatMode::Auto => {
            query.append_pair("guess", "");
        }
        FormatMode::Manual => {
            query.append_pair("noguess", "");
            query.append_pair("iformat", &state.input_format);
        }
    }
    query.append_pair("oformat", &state.output_format);
    query.append_pair(if state.auto_convert_enabled { "auto" } else { "noauto" }, "");
    if state.input_is_shareable() {
        query.append_pair("input", &state.input_text);
    }
    if !state.remote_url.is_empty() {
        query.append_pair("url", &state.remote_url);
    }
    if state.cors_proxy_enabled {
        query.append_pair("corsproxy", "");
    }

    query.finish()
}

/// Full shareable URL: `base` with its query replaced by [`encode`]
pub fn permalink(base: &str, state: &SessionState) -> Result<Url, url::ParseError> {
    let mut link = Url::parse(base)?;
    link.set_query(Some(&encode(state)));
    Ok(link)
}

/// Overrides decoded from a query string; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermalinkParams {
    pub input_format_mode: Option<FormatMode>,
    pub input_format: Option<String>,
    pub output_format: Option<String>,
    pub auto_convert_enabled: Option<bool>,
    pub input_text: Option<String>,
    pub remote_url: Option<String>,
    pub cors_proxy_enabled: Option<bool>,
}

impl PermalinkParams {
    /// Write the overrides onto `state`
    pub fn apply(self, state: &mut SessionState) {
        if let Some(mode) = self.input_format_mode {
            state.input_format_mode = mode;
        }
        // in auto mode the format belongs to the guesser
        if let Some(format) = self.input_format
            && state.input_format_mode == FormatMode::Manual
        {
            state.input_format = format;
        }
        if let Some(format) = self.output_format {
            state.output_format = format;
        }
        if let Some(enabled) = self.auto_convert_enabled {
            state.auto_convert_enabled = enabled;
        }
        if let Some(text) = self.input_text {
            state.input_text = text;
        }
        if let Some(url) = self.remote_url {
            state.remote_url = url;
        }
        if let Some(enabled) = self.cors_proxy_enabled {
            state.cors_proxy_enabled = enabled;
        }
    }
}

/// Parse a query string, with or without its leading `?`.
///
/// When both flags of a pair are present, the negative one wins. Repeated
/// keys keep their first value.
pub fn decode(query: &str) -> PermalinkParams {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut params = PermalinkParams::default();
    let mut guess = false;
    let mut noguess = false;
    let mut auto = false;
    let mut noauto = false;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "guess" => guess = true,
            "noguess" => noguess = true,
            "auto" => auto = true,
            "noauto" => noauto = true,
            "corsproxy" => params.cors_proxy_enabled = Some(true),
            "iformat" => {
                params.input_format.get_or_insert_with(|| value.into_owned());
            }
            "oformat" => {
                params.output_format.get_or_insert_with(|| value.into_owned());
            }
            "input" => {
                params.input_text.get_or_insert_with(|| value.into_owned());
            }
            "url" => {
                params.remote_url.get_or_insert_with(|| value.into_owned());
            }
            _ => {}
        }
    }

    if noguess {
        params.input_format_mode = Some(FormatMode::Manual);
    } else if guess {
        params.input_format_mode = Some(FormatMode::Auto);
    }
    if noauto {
        params.auto_convert_enabled = Some(false);
    } else if auto {
        params.auto_convert_enabled = Some(true);
    }

    params
}

/// Default session state with the overrides from `query` applied
pub fn decode_state(query: &str) -> SessionState {
    let mut state = SessionState::default();
    decode(query).apply(&mut state);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::SessionError;

    fn manual_state() -> SessionState {
        SessionState {
            input_text: "@prefix ex: <http://example.org/> .\nex:a ex:b \"c & d\" .".into(),
            input_format_mode: FormatMode::Manual,
            input_format: "text/turtle".into(),
            output_format: "application/n-triples".into(),
            auto_convert_enabled: false,
            remote_url: "http://example.org/data?x=1&y=2".into(),
            cors_proxy_enabled: true,
            ..SessionState::default()
        }
    }

    #[test]
    fn test_round_trip_manual() {
        let state = manual_state();
        assert_eq!(decode_state(&encode(&state)), state);
    }

    #[test]
    fn test_round_trip_auto_without_url() {
        let state = SessionState {
            input_text: "<http://a> <http://b> <http://c> .".into(),
            output_format: "text/turtle".into(),
            ..SessionState::default()
        };
        assert_eq!(decode_state(&encode(&state)), state);
    }

    #[test]
    fn test_encode_flags() {
        let query = encode(&manual_state());
        assert!(query.starts_with("noguess=&iformat=text%2Fturtle&oformat="));
        assert!(query.contains("&noauto=&"));
        assert!(query.ends_with("&corsproxy="));
        assert!(!query.split('&').any(|pair| pair == "guess=" || pair == "auto="));
    }

    #[test]
    fn test_input_format_not_written_in_auto_mode() {
        let state = SessionState {
            input_format: "text/turtle".into(),
            ..SessionState::default()
        };
        assert!(!encode(&state).contains("iformat"));
    }

    #[test]
    fn test_input_suppressed_when_synced_or_failed() {
        let mut state = manual_state();
        state.url_synced = true;
        assert!(!encode(&state).contains("input="));

        state.url_synced = false;
        state.last_input_error = Some(SessionError::Load { status: 404 });
        assert!(!encode(&state).contains("input="));

        state.last_input_error = None;
        state.loading = true;
        assert!(!encode(&state).contains("input="));

        // the url alone reproduces a synced session
        let mut synced = manual_state();
        synced.url_synced = true;
        let decoded = decode_state(&encode(&synced));
        assert_eq!(decoded.input_text, "");
        assert_eq!(decoded.remote_url, synced.remote_url);
    }

    #[test]
    fn test_decode_defaults_and_unknown_keys() {
        let state = decode_state("?theme=dark&%ZZ&oformat=text%2Fturtle");
        assert_eq!(state.output_format, "text/turtle");
        assert_eq!(state.input_format_mode, FormatMode::Auto);
        assert!(state.auto_convert_enabled);
        assert!(!state.cors_proxy_enabled);
        assert_eq!(decode_state(""), SessionState::default());
    }

    #[test]
    fn test_negative_flag_wins() {
        let params = decode("guess&noguess&noauto&auto");
        assert_eq!(params.input_format_mode, Some(FormatMode::Manual));
        assert_eq!(params.auto_convert_enabled, Some(false));

        let params = decode("guess");
        assert_eq!(params.input_format_mode, Some(FormatMode::Auto));
        assert_eq!(params.auto_convert_enabled, None);
    }

    #[test]
    fn test_apply_keeps_absent_fields() {
        let mut state = manual_state();
        decode("oformat=application%2Fld%2Bjson").apply(&mut state);
        assert_eq!(state.output_format, "application/ld+json");
        assert_eq!(state.input_format_mode, FormatMode::Manual);
        assert!(!state.auto_convert_enabled);
        assert!(state.cors_proxy_enabled);
    }

    #[test]
    fn test_permalink_replaces_query() {
        let link = permalink("https://pchampin.github.io/sowasm/?old=1", &manual_state()).unwrap();
        assert_eq!(link.path(), "/sowasm/");
        let query = link.query().unwrap_or_default();
        assert!(!query.contains("old"));
        assert_eq!(decode_state(query), manual_state());
    }

    #[test]
    fn test_input_format_ignored_in_auto_mode() {
        let state = decode_state("?guess&iformat=application%2Ftrig");
        assert_eq!(state.input_format_mode, FormatMode::Auto);
        assert_eq!(state.input_format, "");

        let state = decode_state("?iformat=application%2Ftrig");
        assert_eq!(state.input_format, "");

        let state = decode_state("?noguess&iformat=application%2Ftrig");
        assert_eq!(state.input_format, "application/trig");
    }
}
