use std::str;

/// Incremental UTF-8 decoder for byte chunks arriving off the network.
///
/// Chunk boundaries fall anywhere, including inside a multi-byte scalar.
/// `feed` decodes as much as it can and stashes a trailing incomplete
/// sequence until the next chunk completes it. Invalid sequences become
/// U+FFFD rather than failing the stream.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    pending: Vec<u8>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        StreamDecoder::default()
    }

    /// Decodes the next chunk, returning all text that is complete so far.
    pub fn feed(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::new();
        let mut rest: &[u8] = &self.pending;
        loop {
            match str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(str::from_utf8(&rest[..valid]).unwrap());
                    match err.error_len() {
                        Some(len) => {
                            out.push('\u{FFFD}');
                            rest = &rest[valid + len..];
                        }
                        None => {
                            // Incomplete tail; hold it for the next chunk.
                            rest = &rest[valid..];
                            break;
                        }
                    }
                }
            }
        }
        self.pending = rest.to_vec();
        out
    }

    /// Flushes any held bytes at end of stream. A dangling partial
    /// sequence decodes as U+FFFD.
    pub fn finish(&mut self) -> String {
        let tail = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&tail).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed(b"hello"), "hello");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        // "é" is 0xC3 0xA9; split it between two feeds.
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed(&[0x63, 0x61, 0x66, 0xC3]), "caf");
        assert_eq!(decoder.feed(&[0xA9]), "é");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_four_byte_scalar_split_three_ways() {
        // U+1F600 GRINNING FACE: F0 9F 98 80.
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed(&[0xF0]), "");
        assert_eq!(decoder.feed(&[0x9F, 0x98]), "");
        assert_eq!(decoder.feed(&[0x80]), "😀");
    }

    #[test]
    fn test_invalid_byte_becomes_replacement() {
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed(&[0x61, 0xFF, 0x62]), "a\u{FFFD}b");
    }

    #[test]
    fn test_truncated_tail_flushes_as_replacement() {
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed(&[0x61, 0xC3]), "a");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }

    #[test]
    fn test_invalid_continuation_resumes_decoding() {
        // 0xC3 followed by an ASCII byte is an invalid sequence; the
        // ASCII byte itself must still come through.
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed(&[0xC3, 0x28]), "\u{FFFD}(");
    }
}
