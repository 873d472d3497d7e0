//! Frontmatter codec
//!
//! A record file is a `---` line, the metadata as a YAML mapping, a closing
//! `---` line, then the body verbatim:
//!
//! ```text
//! ---
//! title: Hello World
//! date: 2024-05-01T10:00:00.000Z
//! tags:
//! - rust
//! draft: false
//! ---
//! Body text starts here.
//! ```

use thiserror::Error;

use crate::models::Metadata;

const DELIMITER: &str = "---";

/// Errors produced while encoding or decoding a record file
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("missing opening '---' frontmatter delimiter")]
    MissingHeader,

    #[error("frontmatter block is not closed by a '---' line")]
    UnterminatedHeader,

    #[error("invalid frontmatter: {0}")]
    InvalidHeader(#[source] serde_yaml::Error),

    #[error("failed to serialize frontmatter: {0}")]
    Serialize(#[source] serde_yaml::Error),
}

/// Render metadata and body into file text
pub fn encode(metadata: &Metadata, body: &str) -> Result<String, CodecError> {
    let yaml = serde_yaml::to_string(metadata).map_err(CodecError::Serialize)?;

    let mut out = String::with_capacity(yaml.len() + body.len() + 8);
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(&yaml);
    if !yaml.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(body);
    Ok(out)
}

/// Split file text into metadata and body
pub fn decode(text: &str) -> Result<(Metadata, String), CodecError> {
    let (header, body) = split(text)?;
    let metadata: Metadata = serde_yaml::from_str(header).map_err(CodecError::InvalidHeader)?;
    Ok((metadata, body.to_string()))
}

/// Locate the header block and the body
fn split(text: &str) -> Result<(&str, &str), CodecError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
        .ok_or(CodecError::MissingHeader)?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == DELIMITER {
            return Ok((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }

    Err(CodecError::UnterminatedHeader)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Metadata {
        Metadata::new("Hello World", "2024-05-01T10:00:00.000Z").with_tags(["rust", "blog"])
    }

    #[test]
    fn test_round_trip() {
        let meta = sample();
        let body = "# Heading\n\nSome *text*.\n";

        let text = encode(&meta, body).unwrap();
        let (decoded, decoded_body) = decode(&text).unwrap();

        assert_eq!(decoded, meta);
        assert_eq!(decoded_body, body);
    }

    #[test]
    fn test_round_trip_empty_body() {
        let meta = sample();
        let text = encode(&meta, "").unwrap();
        let (decoded, body) = decode(&text).unwrap();
        assert_eq!(decoded, meta);
        assert_eq!(body, "");
    }

    #[test]
    fn test_round_trip_body_with_delimiters() {
        let meta = sample();
        let body = "---\nnot frontmatter\n---\n\ntrailing";
        let text = encode(&meta, body).unwrap();
        let (_, decoded_body) = decode(&text).unwrap();
        assert_eq!(decoded_body, body);
    }

    #[test]
    fn test_round_trip_awkward_strings() {
        let mut meta = Metadata::new("line one\n---\nline three", "2024-05-01");
        meta.summary = Some("true".to_string());
        meta.layout = Some("PostSimple".to_string());
        meta.tags = vec!["c++".to_string(), "yes".to_string(), "中文".to_string()];
        meta.draft = true;

        let text = encode(&meta, "body").unwrap();
        let (decoded, _) = decode(&text).unwrap();
        assert_eq!(decoded, meta);
    }

    #[test]
    fn test_round_trip_preserves_extra_keys() {
        let mut meta = sample();
        meta.extra.insert(
            "canonicalUrl".to_string(),
            serde_yaml::Value::String("https://example.com/a".to_string()),
        );
        meta.extra.insert(
            "authors".to_string(),
            serde_yaml::Value::Sequence(vec![serde_yaml::Value::String("default".to_string())]),
        );

        let text = encode(&meta, "x").unwrap();
        let (decoded, _) = decode(&text).unwrap();
        assert_eq!(decoded, meta);
    }

    #[test]
    fn test_decode_hand_written_file() {
        let text = "---\ntitle: 'First post'\ndate: '2023-01-02'\ntags: [a, b]\nsummary: hi\n---\n\nHello\n";
        let (meta, body) = decode(text).unwrap();
        assert_eq!(meta.title, "First post");
        assert_eq!(meta.date, "2023-01-02");
        assert_eq!(meta.tags, vec!["a", "b"]);
        assert!(!meta.draft);
        assert_eq!(meta.summary.as_deref(), Some("hi"));
        assert_eq!(body, "\nHello\n");
    }

    #[test]
    fn test_decode_crlf() {
        let text = "---\r\ntitle: T\r\ndate: '2023-01-02'\r\n---\r\nBody\r\n";
        let (meta, body) = decode(text).unwrap();
        assert_eq!(meta.title, "T");
        assert_eq!(body, "Body\r\n");
    }

    #[test]
    fn test_decode_missing_header() {
        let err = decode("just a body").unwrap_err();
        assert!(matches!(err, CodecError::MissingHeader));
    }

    #[test]
    fn test_decode_unterminated_header() {
        let err = decode("---\ntitle: T\ndate: '2023-01-02'\n").unwrap_err();
        assert!(matches!(err, CodecError::UnterminatedHeader));
    }

    #[test]
    fn test_decode_invalid_yaml() {
        let err = decode("---\ntitle: \"unclosed\ntags: [a\n---\nbody").unwrap_err();
        assert!(matches!(err, CodecError::InvalidHeader(_)));
    }

    #[test]
    fn test_decode_missing_required_key() {
        let err = decode("---\ntitle: Only a title\n---\nbody").unwrap_err();
        assert!(matches!(err, CodecError::InvalidHeader(_)));
    }

    #[test]
    fn test_encoded_layout() {
        let text = encode(&Metadata::new("T", "2024-05-01"), "Body").unwrap();
        assert!(text.starts_with("---\ntitle: T\n"));
        assert!(text.ends_with("---\nBody"));
    }
}
