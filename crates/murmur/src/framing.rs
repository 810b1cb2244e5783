//! Reassembles newline-delimited records from a chunked byte stream.
//!
//! Chunks from the network can end anywhere: in the middle of a record, or in the
//! middle of a multi-byte UTF-8 character. The decoder keeps raw bytes until a `\n`
//! arrives and only then decodes the completed line, so a character split across
//! two chunks is never decoded in halves. `\n` never occurs inside a multi-byte
//! UTF-8 sequence, which makes splitting on the raw byte safe.

#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completes, without terminators.
    ///
    /// A trailing `\r` is stripped so CRLF-delimited streams decode the same way.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            let line = match &self.buffer[start..end] {
                [rest @ .., b'\r'] => rest,
                line => line,
            };
            lines.push(String::from_utf8_lossy(line).into_owned());
            start = end + 1;
        }
        self.buffer.drain(..start);
        lines
    }

    /// Consume the decoder, returning the unterminated tail if there is one.
    ///
    /// Callers decide what an incomplete record means; the NDJSON client discards it.
    pub fn finish(self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.buffer).into_owned())
        }
    }
}
