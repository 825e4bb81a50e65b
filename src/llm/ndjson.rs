//! Newline-delimited JSON framing for the generation stream
//!
//! The HTTP body arrives in arbitrary byte chunks; `LineDecoder` reassembles
//! complete lines and `decode_line` turns one line into stream chunks.

use super::{GenerationChunk, LlmError};
use serde::Deserialize;

/// Reassembles lines from a byte stream
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning every line completed by them.
    ///
    /// Blank lines are dropped; a trailing `\r` is stripped.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if !is_blank(&line) {
                lines.push(line);
            }
        }
        lines
    }

    /// Take whatever is left once the body has ended without a final newline
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let rest = std::mem::take(&mut self.buf);
        if is_blank(&rest) {
            None
        } else {
            Some(rest)
        }
    }
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Wire shape of one stream line
#[derive(Debug, Deserialize)]
struct WireChunk {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Decode one line into zero, one or two chunks.
///
/// An `error` field wins over anything else on the line. A line that is not a
/// JSON object of the expected shape is a protocol failure.
pub fn decode_line(line: &[u8]) -> Result<Vec<GenerationChunk>, LlmError> {
    let wire: WireChunk = serde_json::from_slice(line).map_err(|e| {
        LlmError::protocol(format!(
            "Malformed stream line: {e} - line: {}",
            String::from_utf8_lossy(line)
        ))
    })?;

    if let Some(error) = wire.error {
        return Ok(vec![GenerationChunk::Error(error)]);
    }

    let mut chunks = Vec::with_capacity(2);
    if let Some(text) = wire.response {
        if !text.is_empty() {
            chunks.push(GenerationChunk::Text(text));
        }
    }
    if wire.done {
        chunks.push(GenerationChunk::Done);
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmErrorKind;

    #[test]
    fn test_lines_split_across_pushes() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"{\"response\":\"Hel").is_empty());

        let lines = decoder.push(b"lo\"}\n{\"response\":\" there\"}\n{\"do");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], b"{\"response\":\"Hello\"}".to_vec());
        assert_eq!(lines[1], b"{\"response\":\" there\"}".to_vec());

        let lines = decoder.push(b"ne\":true}\n");
        assert_eq!(lines, vec![b"{\"done\":true}".to_vec()]);
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_blank_and_crlf_lines() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"\n  \r\n{\"done\":true}\r\n");
        assert_eq!(lines, vec![b"{\"done\":true}".to_vec()]);
    }

    #[test]
    fn test_finish_returns_unterminated_tail() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"{\"done\":true}").is_empty());
        assert_eq!(decoder.finish(), Some(b"{\"done\":true}".to_vec()));
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_decode_fragment() {
        let chunks = decode_line(br#"{"model":"llama3.2","response":"Hi","done":false}"#).unwrap();
        assert_eq!(chunks, vec![GenerationChunk::text("Hi")]);
    }

    #[test]
    fn test_decode_final_line() {
        let chunks = decode_line(br#"{"response":"","done":true,"eval_count":12}"#).unwrap();
        assert_eq!(chunks, vec![GenerationChunk::Done]);

        let chunks = decode_line(br#"{"response":"!","done":true}"#).unwrap();
        assert_eq!(chunks, vec![GenerationChunk::text("!"), GenerationChunk::Done]);
    }

    #[test]
    fn test_decode_error_field_wins() {
        let chunks = decode_line(br#"{"response":"x","error":"model not found"}"#).unwrap();
        assert_eq!(chunks, vec![GenerationChunk::Error("model not found".into())]);
    }

    #[test]
    fn test_decode_malformed_line_is_protocol_failure() {
        let err = decode_line(b"{\"response\": ").unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Protocol);
        assert!(err.message.contains("Malformed stream line"));

        let err = decode_line(b"[1, 2]").unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Protocol);
    }

    #[test]
    fn test_decode_line_without_known_fields() {
        assert!(decode_line(br#"{"created_at":"2024-01-01"}"#).unwrap().is_empty());
    }
}
