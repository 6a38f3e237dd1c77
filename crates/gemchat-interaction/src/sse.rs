//! Minimal server-sent-events framing.
//!
//! Only `data:` fields matter for the Gemini stream; other fields and
//! comments are ignored. Bytes are buffered until a full line is available so
//! multi-byte characters split across network chunks stay intact.

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds raw bytes and returns the data payloads of completed events.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(event) = self.flush() {
                    events.push(event);
                }
            } else if let Some(data) = line.strip_prefix("data:") {
                self.data_lines
                    .push(data.strip_prefix(' ').unwrap_or(data).to_string());
            }
        }

        events
    }

    /// Returns the pending event when the byte stream ends without a blank line.
    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest);
            if let Some(data) = line.trim_end_matches('\r').strip_prefix("data:") {
                self.data_lines
                    .push(data.strip_prefix(' ').unwrap_or(data).to_string());
            }
        }
        if let Some(event) = self.flush() {
            events.push(event);
        }
        events
    }

    fn flush(&mut self) -> Option<String> {
        if self.data_lines.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.data_lines).join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_split_across_chunks() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.push(b"data: {\"a\":").is_empty());
        let events = decoder.push(b"1}\r\n\r\ndata: {\"b\":2}\n\n");

        assert_eq!(events, vec![r#"{"a":1}"#.to_string(), r#"{"b":2}"#.to_string()]);
    }

    #[test]
    fn test_multibyte_character_split() {
        let mut decoder = SseDecoder::new();
        let payload = "data: héllo\n\n".as_bytes();
        let split = payload.iter().position(|b| *b == 0xC3).unwrap() + 1;

        assert!(decoder.push(&payload[..split]).is_empty());
        assert_eq!(decoder.push(&payload[split..]), vec!["héllo".to_string()]);
    }

    #[test]
    fn test_multiline_data_and_comments() {
        let mut decoder = SseDecoder::new();

        let events = decoder.push(b": keep-alive\ndata: one\ndata: two\nevent: x\n\n");

        assert_eq!(events, vec!["one\ntwo".to_string()]);
    }

    #[test]
    fn test_finish_flushes_trailing_event() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.push(b"data: last").is_empty());
        assert_eq!(decoder.finish(), vec!["last".to_string()]);
        assert!(decoder.finish().is_empty());
    }
}
