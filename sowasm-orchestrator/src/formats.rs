//! Supported RDF serializations
//!
//! Format ids are MIME types. The catalog order is the order of the Accept
//! header sent when loading remote documents.

/// One supported serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    pub id: &'static str,
    pub label: &'static str,
    /// Can be parsed
    pub input: bool,
    /// Can be produced
    pub output: bool,
}

const fn format(id: &'static str, label: &'static str, input: bool, output: bool) -> Format {
    Format {
        id,
        label,
        input,
        output,
    }
}

pub const N_TRIPLES: &str = "application/n-triples";
pub const N_QUADS: &str = "application/n-quads";
pub const CANONICAL_N_QUADS: &str = "application/x-canonical-n-quads";
pub const TURTLE: &str = "text/turtle";
pub const TRIG: &str = "application/trig";
pub const JSON_LD: &str = "application/ld+json";
pub const RDF_XML: &str = "application/rdf+xml";
pub const YAML_LD: &str = "application/ld+yaml";

pub static FORMATS: &[Format] = &[
    format(N_TRIPLES, "N-Triples", true, true),
    format(N_QUADS, "N-Quads", true, true),
    format(CANONICAL_N_QUADS, "Canonical N-Quads", false, true),
    format(TURTLE, "Turtle", true, true),
    format(TRIG, "TriG", true, true),
    format(JSON_LD, "JSON-LD", true, true),
    format(RDF_XML, "RDF/XML", true, true),
    format(YAML_LD, "YAML-LD", true, true),
];

/// Shown in place of a label when no input format is known
pub const UNDETERMINED_LABEL: &str = "(format not determined)";

pub fn lookup(id: &str) -> Option<&'static Format> {
    FORMATS.iter().find(|f| f.id == id)
}

pub fn is_input_format(id: &str) -> bool {
    lookup(id).is_some_and(|f| f.input)
}

pub fn is_output_format(id: &str) -> bool {
    lookup(id).is_some_and(|f| f.output)
}

/// Human-readable name for a format id
pub fn label(id: &str) -> &str {
    if id.is_empty() {
        return UNDETERMINED_LABEL;
    }
    lookup(id).map(|f| f.label).unwrap_or(id)
}

/// Accept header listing every parseable format
pub fn accept_header() -> String {
    FORMATS
        .iter()
        .filter(|f| f.input)
        .map(|f| f.id)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Derive an input format from a Content-Type header value.
///
/// Parameters after the first `;` are dropped. Returns `None` when the
/// remaining MIME type is not a parseable format.
pub fn from_content_type(content_type: &str) -> Option<String> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if is_input_format(&essence) {
        Some(essence)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_with_parameters() {
        assert_eq!(
            from_content_type("application/ld+json; charset=utf-8"),
            Some("application/ld+json".to_string())
        );
        assert_eq!(from_content_type(" Text/Turtle ;q=1"), Some("text/turtle".to_string()));
    }

    #[test]
    fn test_unrecognized_content_type() {
        assert_eq!(from_content_type("text/html"), None);
        assert_eq!(from_content_type(""), None);
        // can be produced, but not parsed
        assert_eq!(from_content_type(CANONICAL_N_QUADS), None);
    }

    #[test]
    fn test_accept_header_order() {
        assert_eq!(
            accept_header(),
            "application/n-triples, application/n-quads, text/turtle, application/trig, \
             application/ld+json, application/rdf+xml, application/ld+yaml"
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(label(TURTLE), "Turtle");
        assert_eq!(label(""), UNDETERMINED_LABEL);
        assert_eq!(label("text/x-unknown"), "text/x-unknown");
        assert!(is_output_format(CANONICAL_N_QUADS));
        assert!(!is_input_format(CANONICAL_N_QUADS));
    }
}
