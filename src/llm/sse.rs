/// Splits a chunked server-sent-events body into complete lines.
///
/// Bytes are buffered until a `\n` arrives, so a multi-byte UTF-8 character
/// split across two network chunks is decoded only once it is whole.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` and drains every line completed by them, without the
    /// trailing `\r\n` / `\n`.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Returns whatever is left once the body ends without a final newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&rest).trim_end_matches('\r').to_string())
    }
}

/// Payload of a `data:` field, or `None` for other SSE fields and comments.
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(|rest| rest.trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassembles_korean_split_across_chunks() {
        let mut buffer = SseLineBuffer::new();
        let line = "data: {\"text\":\"안녕\"}\n".as_bytes();
        // '안' is three bytes; cut through its middle.
        let cut = "data: {\"text\":\"".len() + 1;

        assert!(buffer.push(&line[..cut]).is_empty());
        let lines = buffer.push(&line[cut..]);
        assert_eq!(lines, vec!["data: {\"text\":\"안녕\"}".to_string()]);
    }

    #[test]
    fn yields_multiple_lines_and_strips_carriage_returns() {
        let mut buffer = SseLineBuffer::new();
        let lines = buffer.push(b"event: ping\r\ndata: 1\r\n\r\ndata: 2");
        assert_eq!(lines, vec!["event: ping", "data: 1", ""]);
        assert_eq!(buffer.finish().as_deref(), Some("data: 2"));
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn data_payload_ignores_other_fields() {
        assert_eq!(data_payload("data: {\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(data_payload("data:[DONE]"), Some("[DONE]"));
        assert_eq!(data_payload("event: message_start"), None);
        assert_eq!(data_payload(": keep-alive"), None);
    }
}
