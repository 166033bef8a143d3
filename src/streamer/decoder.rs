use std::str;

const REPLACEMENT: char = '\u{FFFD}';

/// Incremental UTF-8 decoder.
///
/// A multi-byte sequence split across chunks is held back until the rest
/// arrives. Invalid bytes decode to U+FFFD instead of failing the run.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        let mut cursor = 0;

        while cursor < self.pending.len() {
            let rest = &self.pending[cursor..];
            match str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    cursor = self.pending.len();
                }
                Err(err) => {
                    let (valid, _) = rest.split_at(err.valid_up_to());
                    out.push_str(str::from_utf8(valid).unwrap_or_default());
                    cursor += err.valid_up_to();

                    match err.error_len() {
                        Some(invalid_len) => {
                            out.push(REPLACEMENT);
                            cursor += invalid_len;
                        }
                        // Truncated sequence at the end: wait for more bytes.
                        None => break,
                    }
                }
            }
        }

        self.pending.drain(..cursor);
        out
    }

    /// Flushes a sequence left incomplete at end of stream.
    pub fn finish(&mut self) -> String {
        if !self.has_pending() {
            String::new()
        } else {
            self.pending.clear();
            REPLACEMENT.to_string()
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_straight_through() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"Progress: 1/6\n"), "Progress: 1/6\n");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn split_multibyte_sequence_is_carried_over() {
        let mut decoder = Utf8StreamDecoder::new();
        let bytes = "café ☕".as_bytes();
        // 'é' is 2 bytes starting at index 3; '☕' is 3 bytes at the end.
        assert_eq!(decoder.decode(&bytes[..4]), "caf");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(&bytes[4..7]), "é ");
        assert_eq!(decoder.decode(&bytes[7..8]), "");
        assert_eq!(decoder.decode(&bytes[8..]), "☕");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn invalid_bytes_become_replacement_chars() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"ok\xFFok"), "ok\u{FFFD}ok");
    }

    #[test]
    fn truncated_tail_is_flushed_as_replacement() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"end\xE2\x98"), "end");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert!(!decoder.has_pending());
    }
}
