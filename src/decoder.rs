use std::char::REPLACEMENT_CHARACTER;

/// Stateful UTF-8 decoder for a chunked byte stream.
///
/// Multi-byte sequences cut by a chunk boundary are held back until the
/// rest arrives. Invalid bytes decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk. May return an empty string when the chunk only
    /// carried the start of a character.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut text = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(invalid) => {
                            text.push(REPLACEMENT_CHARACTER);
                            rest = &after[invalid..];
                        }
                        None => {
                            // incomplete sequence at the end, wait for more bytes
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        let consumed = self.pending.len() - rest.len();
        self.pending.drain(..consumed);
        text
    }

    /// Flush at end of stream. A dangling partial character becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        self.pending.clear();
        REPLACEMENT_CHARACTER.to_string()
    }

    #[cfg(test)]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(chunks: &[&[u8]]) -> String {
        let mut decoder = Utf8StreamDecoder::new();
        let mut out = String::new();
        for chunk in chunks {
            out.push_str(&decoder.decode(chunk));
        }
        out.push_str(&decoder.finish());
        out
    }

    #[test]
    fn plain_ascii_passes_through() {
        assert_eq!(decode_all(&[b"Hel", b"lo, ", b"world"]), "Hello, world");
    }

    #[test]
    fn holds_back_split_two_byte_character() {
        let bytes = "café".as_bytes();
        let (head, tail) = bytes.split_at(bytes.len() - 1);

        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(head), "caf");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(tail), "é");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn every_split_point_gives_the_same_text() {
        let text = "Grüße 👋 from 東京";
        let bytes = text.as_bytes();
        for first in 0..=bytes.len() {
            for second in first..=bytes.len() {
                let chunks = [&bytes[..first], &bytes[first..second], &bytes[second..]];
                assert_eq!(decode_all(&chunks), text, "split at {first}/{second}");
            }
        }
    }

    #[test]
    fn byte_at_a_time_emoji() {
        let bytes = "👋".as_bytes();
        let chunks: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(decode_all(&chunks), "👋");
    }

    #[test]
    fn invalid_bytes_become_replacement_characters() {
        assert_eq!(decode_all(&[b"a\xffb"]), "a\u{FFFD}b");
        assert_eq!(decode_all(&[b"a\xc3", b"(b"]), "a\u{FFFD}(b");
    }

    #[test]
    fn truncated_tail_is_flushed_on_finish() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"ok\xe6\x9d"), "ok");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }
}
