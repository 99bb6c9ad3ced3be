//! Linear PDF text recovery.
//!
//! This is not a PDF parser: objects are found by scanning for
//! `N G obj … endobj` spans in file order, the cross-reference table and
//! trailer are ignored, and text is pulled from text-show operators with a
//! small state machine. Word and line breaks come from heuristics
//! ([`PdfHeuristics`]) that are approximate by nature.

use crate::core::config::PdfHeuristics;
use flate2::read::ZlibDecoder;
use memchr::memmem;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::io::Read;

/// Objects inspected per document.
pub const MAX_PDF_OBJECTS: usize = 100_000;

/// Upper bound on the inflated size of a single stream.
pub const MAX_STREAM_SIZE: u64 = 16 * 1024 * 1024;

const FONT_PROGRAM_MARKER: &[u8] = b"PS-AdobeFont";

static OBJECT_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u)\b\d{1,10}\s+\d{1,5}\s+obj\b").expect("PDF object header regex pattern is valid and should compile")
});

/// Recover the text of a PDF.
///
/// Never fails; unreadable objects are skipped.
pub fn extract_pdf_text(bytes: &[u8], heuristics: &PdfHeuristics) -> String {
    let mut output: Vec<u8> = Vec::new();
    let mut cursor = 0usize;
    let mut objects = 0usize;

    while objects < MAX_PDF_OBJECTS {
        let Some(header) = OBJECT_HEADER.find_at(bytes, cursor) else {
            break;
        };
        objects += 1;

        let body_start = header.end();
        let (body, next) = match memmem::find(&bytes[body_start..], b"endobj") {
            Some(end) => (&bytes[body_start..body_start + end], body_start + end + b"endobj".len()),
            None => (&bytes[body_start..], bytes.len()),
        };
        cursor = next;

        let Some(object) = PdfObject::parse(body) else {
            continue;
        };
        if object.is_skipped() {
            continue;
        }
        let Some(stream) = object.decoded_stream() else {
            continue;
        };

        if let Some(marker) = memmem::find(&stream, FONT_PROGRAM_MARKER) {
            append_object_text(&mut output, &extract_text_operators(&stream[..marker], heuristics));
            tracing::debug!(object = objects, "Font program found in PDF stream, stopping scan");
            break;
        }

        append_object_text(&mut output, &extract_text_operators(&stream, heuristics));
    }

    String::from_utf8_lossy(&output).trim().to_string()
}

fn append_object_text(output: &mut Vec<u8>, text: &[u8]) {
    if text.iter().all(u8::is_ascii_whitespace) {
        return;
    }
    if !output.is_empty() && !output.ends_with(b"\n") {
        output.push(b'\n');
    }
    output.extend_from_slice(text);
}

/// Dictionary and optional stream of one indirect object.
#[derive(Debug, Clone, Copy)]
struct PdfObject<'a> {
    dictionary: &'a [u8],
    stream: Option<&'a [u8]>,
}

impl<'a> PdfObject<'a> {
    fn parse(body: &'a [u8]) -> Option<Self> {
        let start = body.iter().position(|b| !b.is_ascii_whitespace())?;
        let rest = &body[start..];
        if !rest.starts_with(b"<<") {
            return None;
        }

        let dict_end = matching_dictionary_end(rest)?;
        let dictionary = &rest[2..dict_end - 2];
        let after = &rest[dict_end..];

        let stream = memmem::find(after, b"stream").and_then(|at| {
            if !after[..at].iter().all(u8::is_ascii_whitespace) {
                return None;
            }
            let mut data_start = at + b"stream".len();
            if after.get(data_start) == Some(&b'\r') {
                data_start += 1;
            }
            if after.get(data_start) == Some(&b'\n') {
                data_start += 1;
            }
            let data = &after[data_start..];
            let end = memmem::find(data, b"endstream").unwrap_or(data.len());
            Some(&data[..end])
        });

        Some(Self { dictionary, stream })
    }

    fn has_name(&self, name: &[u8]) -> bool {
        memmem::find_iter(self.dictionary, name).any(|at| {
            let next = self.dictionary.get(at + name.len());
            next.is_none_or(|b| !b.is_ascii_alphanumeric())
        })
    }

    fn is_skipped(&self) -> bool {
        self.has_name(b"/Image") || self.has_name(b"/Catalog") || self.has_name(b"/XRef")
    }

    fn decoded_stream(&self) -> Option<Vec<u8>> {
        let raw = self.stream?;
        if !self.has_name(b"/FlateDecode") {
            return Some(raw.to_vec());
        }

        let mut inflated = Vec::new();
        match ZlibDecoder::new(raw).take(MAX_STREAM_SIZE).read_to_end(&mut inflated) {
            Ok(_) => Some(inflated),
            Err(e) if !inflated.is_empty() => {
                tracing::debug!(error = %e, "Truncated Flate stream, keeping partial output");
                Some(inflated)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Flate inflate failed, using raw stream bytes");
                Some(raw.to_vec())
            }
        }
    }
}

/// Index just past the `>>` closing the dictionary that starts `bytes`.
fn matching_dictionary_end(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = 0usize;
    while i + 1 < bytes.len() {
        match &bytes[i..i + 2] {
            b"<<" => {
                depth += 1;
                i += 2;
            }
            b">>" => {
                depth = depth.checked_sub(1)?;
                i += 2;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => i += 1,
        }
    }
    None
}

/// Rewrite `<hex>` strings as literal strings and `\NNN` octal escapes as
/// bytes so the operator scan only deals with `( … )` literals.
pub fn preprocess_escapes(stream: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(stream.len());
    let mut depth = 0usize;
    let mut i = 0usize;

    while i < stream.len() {
        let b = stream[i];
        if depth > 0 {
            match b {
                b'\\' => {
                    let digits = stream[i + 1..]
                        .iter()
                        .take(3)
                        .take_while(|d| (b'0'..=b'7').contains(d))
                        .count();
                    if digits > 0 {
                        let value = stream[i + 1..i + 1 + digits]
                            .iter()
                            .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                        push_literal_byte(&mut out, (value & 0xFF) as u8);
                        i += 1 + digits;
                    } else {
                        out.push(b'\\');
                        if let Some(&escaped) = stream.get(i + 1) {
                            out.push(escaped);
                        }
                        i += 2;
                    }
                    continue;
                }
                b'(' => depth += 1,
                b')' => depth -= 1,
                _ => {}
            }
            out.push(b);
            i += 1;
            continue;
        }

        match b {
            b'(' => {
                depth = 1;
                out.push(b);
                i += 1;
            }
            b'<' if stream.get(i + 1) != Some(&b'<') && (i == 0 || stream[i - 1] != b'<') => {
                match decode_hex_string(&stream[i + 1..]) {
                    Some((decoded, consumed)) => {
                        out.push(b'(');
                        for byte in decoded {
                            push_literal_byte(&mut out, byte);
                        }
                        out.push(b')');
                        i += 1 + consumed;
                    }
                    None => {
                        out.push(b);
                        i += 1;
                    }
                }
            }
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }

    out
}

fn push_literal_byte(out: &mut Vec<u8>, byte: u8) {
    if matches!(byte, b'(' | b')' | b'\\') {
        out.push(b'\\');
    }
    out.push(byte);
}

/// Decode hex digits up to `>`; returns the bytes and the input consumed
/// including the closing bracket.
fn decode_hex_string(bytes: &[u8]) -> Option<(Vec<u8>, usize)> {
    let end = memchr::memchr(b'>', bytes)?;
    let mut digits = Vec::with_capacity(end);
    for &b in &bytes[..end] {
        match b {
            b'0'..=b'9' => digits.push(b - b'0'),
            b'a'..=b'f' => digits.push(b - b'a' + 10),
            b'A'..=b'F' => digits.push(b - b'A' + 10),
            _ if b.is_ascii_whitespace() => {}
            _ => return None,
        }
    }
    if digits.len() % 2 == 1 {
        digits.push(0);
    }
    let decoded = digits.chunks(2).map(|pair| pair[0] << 4 | pair[1]).collect();
    Some((decoded, end + 1))
}

/// Scanner state for text-show operator extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Outside any array or string
    Default,
    /// Inside a `[ … ]` TJ array
    InArray,
    /// Inside a `( … )` literal, with nesting depth
    InString { in_array: bool, depth: usize },
    /// After a backslash inside a literal
    Escaped { in_array: bool, depth: usize },
}

/// Pull text-show operator payloads out of a content stream.
pub fn extract_text_operators(stream: &[u8], heuristics: &PdfHeuristics) -> Vec<u8> {
    let stream = preprocess_escapes(stream);
    let mut text = Vec::new();
    let mut literal = Vec::new();
    let mut state = ScanState::Default;
    let mut i = 0usize;

    while i < stream.len() {
        let b = stream[i];
        state = match state {
            ScanState::Default => match b {
                b'[' => ScanState::InArray,
                b'(' => {
                    literal.clear();
                    ScanState::InString {
                        in_array: false,
                        depth: 1,
                    }
                }
                _ => ScanState::Default,
            },
            ScanState::InArray => match b {
                b'(' => {
                    literal.clear();
                    ScanState::InString {
                        in_array: true,
                        depth: 1,
                    }
                }
                b']' => {
                    let after = skip_whitespace(&stream, i + 1);
                    if stream[after..].starts_with(b"TJ") {
                        push_tj_separator(&mut text, &stream[after + 2..], heuristics);
                        i = after + 1;
                    }
                    ScanState::Default
                }
                _ => ScanState::InArray,
            },
            ScanState::InString { in_array, depth } => match b {
                b'\\' => ScanState::Escaped { in_array, depth },
                b'(' => {
                    literal.push(b);
                    ScanState::InString {
                        in_array,
                        depth: depth + 1,
                    }
                }
                b')' if depth > 1 => {
                    literal.push(b);
                    ScanState::InString {
                        in_array,
                        depth: depth - 1,
                    }
                }
                b')' => {
                    let after = skip_whitespace(&stream, i + 1);
                    if in_array {
                        push_printable(&mut text, &literal);
                        if kerning_breaks_word(&stream[after..], heuristics.kerning_word_break_threshold) {
                            text.push(b' ');
                        }
                        ScanState::InArray
                    } else {
                        let rest = &stream[after..];
                        if rest.starts_with(b"Tj") {
                            push_printable(&mut text, &literal);
                        } else if rest.starts_with(b"'") || rest.starts_with(b"\"") {
                            text.push(b'\n');
                            push_printable(&mut text, &literal);
                        }
                        ScanState::Default
                    }
                }
                _ => {
                    literal.push(b);
                    ScanState::InString { in_array, depth }
                }
            },
            ScanState::Escaped { in_array, depth } => {
                match b {
                    b'n' => literal.push(b'\n'),
                    b'r' => literal.push(b'\r'),
                    b't' => literal.push(b'\t'),
                    b'(' | b')' | b'\\' => literal.push(b),
                    // line continuation, backspace and form feed produce nothing
                    _ => {}
                }
                ScanState::InString { in_array, depth }
            }
        };
        i += 1;
    }

    text
}

fn skip_whitespace(bytes: &[u8], from: usize) -> usize {
    let mut at = from.min(bytes.len());
    while at < bytes.len() && bytes[at].is_ascii_whitespace() {
        at += 1;
    }
    at
}

fn push_printable(text: &mut Vec<u8>, literal: &[u8]) {
    text.extend(
        literal
            .iter()
            .copied()
            .filter(|&b| matches!(b, b'\t' | b'\r' | b'\n' | 32..=126)),
    );
}

fn push_tj_separator(text: &mut Vec<u8>, following: &[u8], heuristics: &PdfHeuristics) {
    let window = &following[..following.len().min(4)];
    let font_change = window.windows(2).any(|pair| pair == b"/F");
    if heuristics.newline_on_font_change && font_change {
        text.push(b'\n');
    } else if heuristics.space_after_tj {
        text.push(b' ');
    }
}

/// True when `bytes` starts with a negative kerning value of at least three
/// digits whose magnitude reaches `threshold`.
fn kerning_breaks_word(bytes: &[u8], threshold: u32) -> bool {
    let Some(rest) = bytes.strip_prefix(b"-") else {
        return false;
    };
    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits < 3 {
        return false;
    }
    std::str::from_utf8(&rest[..digits])
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .is_some_and(|value| value >= u64::from(threshold))
}
