//! Encoding detection and transcoding.
//!
//! Feeds [`Dom::parse_bytes`](crate::Dom::parse_bytes): the byte order mark
//! picks the initial encoding (UTF-8 when there is none), and an
//! `encoding=` pseudo-attribute in the XML declaration overrides it. The
//! conversion itself is done by `encoding_rs`.

use crate::error::DomError;
use crate::parser::pseudo_attribute;

/// Detects the encoding of a byte stream from its byte order mark.
///
/// Returns the encoding label and the number of BOM bytes to skip.
///
/// # Examples
///
/// ```
/// use xmldom::encoding::detect_encoding;
///
/// assert_eq!(detect_encoding(b"\xEF\xBB\xBFhello"), ("UTF-8", 3));
/// assert_eq!(detect_encoding(b"\xFF\xFE<\x00"), ("UTF-16LE", 2));
/// assert_eq!(detect_encoding(b"<root/>"), ("UTF-8", 0));
/// ```
#[must_use]
pub fn detect_encoding(bytes: &[u8]) -> (&'static str, usize) {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => ("UTF-8", 3),
        [0xFE, 0xFF, ..] => ("UTF-16BE", 2),
        [0xFF, 0xFE, ..] => ("UTF-16LE", 2),
        _ => ("UTF-8", 0),
    }
}

/// Transcodes `bytes` from the encoding named by `label` into UTF-8.
///
/// # Errors
///
/// Returns `Syntax` if the label is unknown or the bytes are malformed.
pub fn transcode(bytes: &[u8], label: &str) -> Result<String, DomError> {
    let encoding = encoding_rs::Encoding::for_label(label.as_bytes()).ok_or_else(|| {
        DomError::syntax(format!("unsupported encoding '{label}'"), None)
    })?;
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(DomError::syntax(
            format!("malformed byte sequence for encoding '{label}'"),
            None,
        ));
    }
    log::debug!(target: "xmldom::parser", "transcoded {} bytes from {}", bytes.len(), encoding.name());
    Ok(text.into_owned())
}

/// Decodes raw XML bytes into UTF-8 text.
///
/// # Errors
///
/// Returns `Syntax` if the bytes are not valid in the detected or declared
/// encoding.
///
/// # Examples
///
/// ```
/// use xmldom::encoding::decode_to_utf8;
///
/// let text = decode_to_utf8(b"<?xml version=\"1.0\"?><root/>").unwrap();
/// assert!(text.ends_with("<root/>"));
/// ```
pub fn decode_to_utf8(bytes: &[u8]) -> Result<String, DomError> {
    let (bom_encoding, skip) = detect_encoding(bytes);
    let content = &bytes[skip..];

    if bom_encoding == "UTF-8" {
        let declared = declared_encoding(content);
        return match declared {
            Some(label) if !is_utf8_label(&label) => transcode(content, &label),
            _ => std::str::from_utf8(content)
                .map(str::to_string)
                .map_err(|e| DomError::syntax(format!("input is not valid UTF-8: {e}"), None)),
        };
    }

    // The BOM fixes UTF-16 byte order; a declaration naming UTF-16 agrees.
    transcode(content, bom_encoding)
}

/// Reads the `encoding` pseudo-attribute from an ASCII-compatible XML
/// declaration at the start of `bytes`.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(256)];
    if !head.starts_with(b"<?xml") {
        return None;
    }
    let end = head.windows(2).position(|w| w == b"?>")?;
    let decl = std::str::from_utf8(&head[5..end]).ok()?;
    pseudo_attribute(decl, "encoding").map(str::to_string)
}

fn is_utf8_label(label: &str) -> bool {
    label.eq_ignore_ascii_case("UTF-8") || label.eq_ignore_ascii_case("UTF8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect_boms() {
        assert_eq!(detect_encoding(b"\xFE\xFF\x00<"), ("UTF-16BE", 2));
        assert_eq!(detect_encoding(b"\xEF"), ("UTF-8", 0));
        assert_eq!(detect_encoding(b""), ("UTF-8", 0));
    }

    #[test]
    fn test_decode_utf8_strips_bom() {
        let text = decode_to_utf8(b"\xEF\xBB\xBF<root/>").unwrap();
        assert_eq!(text, "<root/>");
    }

    #[test]
    fn test_decode_utf16le() {
        let bytes = b"\xFF\xFE<\x00r\x00/\x00>\x00";
        assert_eq!(decode_to_utf8(bytes).unwrap(), "<r/>");
    }

    #[test]
    fn test_declared_latin1() {
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>".to_vec();
        bytes.extend_from_slice(b"<r>caf\xE9</r>");
        let text = decode_to_utf8(&bytes).unwrap();
        assert!(text.ends_with("<r>caf\u{e9}</r>"));
    }

    #[test]
    fn test_declared_encoding_lookup() {
        assert_eq!(
            declared_encoding(b"<?xml version='1.0' encoding='UTF-8'?><r/>").as_deref(),
            Some("UTF-8")
        );
        assert_eq!(declared_encoding(b"<?xml version=\"1.0\"?><r/>"), None);
        assert_eq!(declared_encoding(b"<r/>"), None);
    }

    #[test]
    fn test_errors() {
        assert!(decode_to_utf8(&[0x80, 0x81, 0x82]).is_err());
        assert!(transcode(b"x", "UNKNOWN-ENCODING-42")
            .unwrap_err()
            .message
            .contains("unsupported encoding"));
    }
}
