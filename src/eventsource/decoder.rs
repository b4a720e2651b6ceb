/// Incremental UTF-8 decoder for a chunked byte stream.
///
/// A multi-byte character split across two chunks is held back until the
/// rest of its bytes arrive. Invalid sequences decode to U+FFFD, as a
/// non-fatal text decoder would.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Decodes as much of `chunk` (plus any carried-over bytes) as forms
    /// complete characters.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut text = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, invalid) = rest.split_at(err.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &invalid[len..];
                        }
                        // Truncated sequence at the end of the input.
                        None => {
                            self.pending = invalid.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        text
    }

    /// Flushes carried-over bytes at end of input.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
