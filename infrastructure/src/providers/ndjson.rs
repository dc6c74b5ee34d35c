//! Newline-delimited JSON framing for chunked HTTP bodies.
//!
//! Network chunks do not line up with JSON records: one chunk can carry
//! several records, or end in the middle of one. [`LineBuffer`] holds the
//! unterminated tail between chunks.

#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every complete, non-blank line it finished.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line);
            let text = text.trim();
            if !text.is_empty() {
                lines.push(text.to_string());
            }
        }
        lines
    }

    /// Return the trailing line when the body ends without a newline.
    pub(crate) fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let text = String::from_utf8_lossy(&rest).trim().to_string();
        if text.is_empty() { None } else { Some(text) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_records_across_chunks() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"{\"a\":").is_empty());
        assert_eq!(buffer.push(b"1}\n{\"b\":2}\n{\"c\""), vec!["{\"a\":1}", "{\"b\":2}"]);
        assert_eq!(buffer.push(b":3}\n"), vec!["{\"c\":3}"]);
        assert!(buffer.finish().is_none());
    }

    #[test]
    fn skips_blank_lines_and_crlf() {
        let mut buffer = LineBuffer::new();
        assert_eq!(buffer.push(b"\r\n{\"a\":1}\r\n\n"), vec!["{\"a\":1}"]);
    }

    #[test]
    fn finish_returns_unterminated_tail() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"{\"done\":true}").is_empty());
        assert_eq!(buffer.finish().as_deref(), Some("{\"done\":true}"));
    }

    #[test]
    fn multibyte_split_across_chunks() {
        let mut buffer = LineBuffer::new();
        let text = "{\"t\":\"é\"}\n".as_bytes();
        assert!(buffer.push(&text[..7]).is_empty());
        assert_eq!(buffer.push(&text[7..]), vec!["{\"t\":\"é\"}"]);
    }
}
