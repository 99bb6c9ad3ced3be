use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static CONTROL_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x00-\x08\x0B-\x0C\x0E-\x1F\x7F-\x9F]")
        .expect("Control chars regex pattern is valid and should compile")
});
static REPLACEMENT_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\u{FFFD}+").expect("Replacement chars regex pattern is valid and should compile"));
static CHARSET_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([A-Za-z0-9_\-:.]+)"#)
        .expect("Charset parameter regex pattern is valid and should compile")
});

/// Bytes inspected by [`looks_binary`].
const BINARY_SAMPLE_LEN: usize = 4096;

/// Share of control bytes above which a sample is treated as binary.
pub const BINARY_THRESHOLD: f64 = 0.10;

/// Decode crawled bytes into text.
///
/// UTF-8 (with or without BOM) is taken as is; otherwise the declared charset
/// is used when `encoding_rs` knows it, and chardetng guesses the rest.
/// Control characters and replacement characters are removed.
pub fn decode_text(byte_data: &[u8], declared_charset: Option<&str>) -> String {
    if byte_data.is_empty() {
        return String::new();
    }

    let without_bom = byte_data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(byte_data);
    if let Ok(text) = std::str::from_utf8(without_bom) {
        return strip_control_chars(text).into_owned();
    }

    if let Some(label) = declared_charset
        && let Some(encoding) = Encoding::for_label(label.trim().as_bytes())
    {
        let (decoded, _, _) = encoding.decode(byte_data);
        return strip_control_chars(&decoded).into_owned();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(byte_data, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(byte_data);
    strip_control_chars(&decoded).into_owned()
}

/// Remove control and replacement characters, keeping tab, CR and LF.
pub fn strip_control_chars(text: &str) -> Cow<'_, str> {
    let mut text = Cow::Borrowed(text);
    for pattern in [&*CONTROL_CHARS, &*REPLACEMENT_CHARS] {
        if pattern.is_match(&text) {
            text = Cow::Owned(pattern.replace_all(&text, "").into_owned());
        }
    }
    text
}

/// True when the leading bytes look like binary data rather than text.
pub fn looks_binary(byte_data: &[u8]) -> bool {
    let sample = &byte_data[..byte_data.len().min(BINARY_SAMPLE_LEN)];
    if sample.is_empty() {
        return false;
    }
    if memchr::memchr(0, sample).is_some() {
        return true;
    }
    let control = sample
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0C))
        .count();
    control as f64 / sample.len() as f64 > BINARY_THRESHOLD
}

/// Extract the `charset=` parameter from a Content-Type style value.
pub fn charset_from_content_type(value: &str) -> Option<String> {
    CHARSET_PARAM
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// Truncate to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Collapse every whitespace run into a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Append `part` to `target` separated by a space, staying within `max_chars`.
///
/// Returns false once the cap is reached.
pub fn push_capped(target: &mut String, part: &str, max_chars: usize) -> bool {
    let part = part.trim();
    if part.is_empty() {
        return target.chars().count() < max_chars;
    }
    let current = target.chars().count();
    if current >= max_chars {
        return false;
    }
    if !target.is_empty() {
        target.push(' ');
    }
    let room = max_chars.saturating_sub(current + 1);
    let room = if current == 0 { max_chars } else { room };
    target.extend(part.chars().take(room));
    target.chars().count() < max_chars
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_utf8() {
        let text = "Hello, 世界! مرحبا".as_bytes();
        assert_eq!(decode_text(text, None), "Hello, 世界! مرحبا");
    }

    #[test]
    fn test_decode_text_bom_and_controls() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFab\x01c\n", None), "abc\n");
    }

    #[test]
    fn test_decode_text_declared_latin1() {
        assert_eq!(decode_text(b"caf\xE9", Some("iso-8859-1")), "café");
    }

    #[test]
    fn test_decode_text_guessed() {
        let decoded = decode_text(b"Gr\xFC\xDFe aus M\xFCnchen", None);
        assert!(decoded.starts_with("Gr"));
        assert!(!decoded.contains('\u{FFFD}'));
    }

    #[test]
    fn test_looks_binary() {
        assert!(looks_binary(b"PK\x03\x04\x00\x00binary"));
        assert!(!looks_binary(b"plain text\twith tabs\r\n"));
        assert!(!looks_binary(b""));
    }

    #[test]
    fn test_charset_from_content_type() {
        assert_eq!(charset_from_content_type("text/html; charset=Shift_JIS").as_deref(), Some("shift_jis"));
        assert_eq!(charset_from_content_type("text/html; charset=\"utf-8\"").as_deref(), Some("utf-8"));
        assert_eq!(charset_from_content_type("text/html"), None);
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_push_capped() {
        let mut target = String::new();
        assert!(push_capped(&mut target, "alpha", 12));
        assert!(!push_capped(&mut target, "beta gamma", 12));
        assert_eq!(target.chars().count(), 12);
        assert_eq!(target, "alpha beta g");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}
