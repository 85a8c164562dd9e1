use crate::providers::openai::ChatChunk;

/// SSE data-line prefix. The space after the colon is optional in the
/// wild, so matching strips the prefix and then trims.
pub const DATA_PREFIX: &str = "data:";

/// Marker the upstream sends when the completion is finished.
pub const DONE_SENTINEL: &str = "[DONE]";

/// In-band relay failure marker. Anything after the prefix is the
/// human-readable detail.
pub const ERROR_PREFIX: &str = "ERROR:";

/// One classified line out of the relay stream.
#[derive(Debug)]
pub enum StreamFrame {
    /// A parsed completion chunk.
    Chunk(ChatChunk),
    /// The `[DONE]` marker.
    Done,
    /// An `ERROR:<detail>` line injected by the relay.
    RelayError(String),
}

/// Classifies one line of relay output. Returns None for blank lines,
/// non-data lines, and data payloads that do not parse as chunk JSON.
pub fn parse_line(line: &str) -> Option<StreamFrame> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(detail) = line.strip_prefix(ERROR_PREFIX) {
        return Some(StreamFrame::RelayError(detail.trim().to_string()));
    }
    let payload = line.strip_prefix(DATA_PREFIX)?.trim();
    if payload == DONE_SENTINEL {
        return Some(StreamFrame::Done);
    }
    serde_json::from_str::<ChatChunk>(payload)
        .ok()
        .map(StreamFrame::Chunk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::openai::delta_text;

    #[test]
    fn test_data_line_with_space() {
        let frame = parse_line(r#"data: {"choices":[{"delta":{"content":"hi"}}]}"#).unwrap();
        match frame {
            StreamFrame::Chunk(chunk) => assert_eq!(delta_text(&chunk), Some("hi")),
            other => panic!("Expected chunk, got {:?}", other),
        }
    }

    #[test]
    fn test_data_line_without_space() {
        let frame = parse_line(r#"data:{"choices":[{"delta":{"content":"hi"}}]}"#).unwrap();
        assert!(matches!(frame, StreamFrame::Chunk(_)));
    }

    #[test]
    fn test_done_sentinel() {
        assert!(matches!(parse_line("data: [DONE]"), Some(StreamFrame::Done)));
        assert!(matches!(parse_line("data:[DONE]"), Some(StreamFrame::Done)));
    }

    #[test]
    fn test_error_frame() {
        match parse_line("ERROR:upstream status 500: rate limited") {
            Some(StreamFrame::RelayError(detail)) => {
                assert_eq!(detail, "upstream status 500: rate limited");
            }
            other => panic!("Expected relay error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_and_comment_lines_skipped() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line(": keep-alive").is_none());
        assert!(parse_line("event: ping").is_none());
    }

    #[test]
    fn test_malformed_json_skipped() {
        assert!(parse_line("data: {not json").is_none());
        assert!(parse_line("data: 42").is_none());
    }
}
