//! Line reassembly from a raw byte stream
//!
//! The serial transport hands over arbitrary chunks; this framer buffers
//! them and yields complete newline-terminated lines.

use log::warn;

/// Longest sensible record is well under this; anything longer is garbage.
const MAX_BUFFER_BYTES: usize = 256;

/// Accumulates raw bytes and extracts complete lines.
///
/// Carriage returns are stripped, so both `\n` and `\r\n` terminated
/// streams work. The internal buffer is bounded: if garbage input piles up
/// without a newline, the oldest data is discarded.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of raw bytes.
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        if self.buffer.len() > MAX_BUFFER_BYTES && !self.buffer.contains(&b'\n') {
            warn!(
                "line buffer overflow ({} bytes without newline), discarding oldest data",
                self.buffer.len()
            );
            let excess = self.buffer.len() - MAX_BUFFER_BYTES / 2;
            self.buffer.drain(0..excess);
        }
    }

    /// Extract the next complete line, if one has been buffered.
    ///
    /// Returns the line without its terminator. Invalid UTF-8 is replaced
    /// rather than rejected; the decoder will flag the mangled record.
    pub fn pop_line(&mut self) -> Option<String> {
        let newline = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(0..=newline).collect();
        line.pop(); // the newline itself
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Number of bytes currently buffered.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassembles_split_lines() {
        let mut framer = LineFramer::new();
        framer.push_bytes(b"atxy 100");
        assert_eq!(framer.pop_line(), None);
        framer.push_bytes(b"00 1.0 2.0\ngtxyz");
        assert_eq!(framer.pop_line(), Some("atxy 10000 1.0 2.0".to_string()));
        assert_eq!(framer.pop_line(), None);
        assert_eq!(framer.pending_bytes(), 5);
    }

    #[test]
    fn handles_multiple_lines_in_one_chunk() {
        let mut framer = LineFramer::new();
        framer.push_bytes(b"a\nb\nc\n");
        assert_eq!(framer.pop_line(), Some("a".to_string()));
        assert_eq!(framer.pop_line(), Some("b".to_string()));
        assert_eq!(framer.pop_line(), Some("c".to_string()));
        assert_eq!(framer.pop_line(), None);
    }

    #[test]
    fn strips_carriage_returns() {
        let mut framer = LineFramer::new();
        framer.push_bytes(b"w low battery\r\n");
        assert_eq!(framer.pop_line(), Some("w low battery".to_string()));
    }

    #[test]
    fn bounds_buffer_growth_on_garbage() {
        let mut framer = LineFramer::new();
        for _ in 0..100 {
            framer.push_bytes(&[b'x'; 64]);
        }
        assert!(framer.pending_bytes() <= MAX_BUFFER_BYTES + 64);

        // A real record after the garbage still comes through
        framer.push_bytes(b"\natxy 10000 1.0 2.0\n");
        let garbage = framer.pop_line().unwrap();
        assert!(garbage.chars().all(|c| c == 'x'));
        assert_eq!(framer.pop_line(), Some("atxy 10000 1.0 2.0".to_string()));
    }
}
