/// Default number of complete lines kept in the log tail.
pub const DEFAULT_MAX_LOG_LINES: usize = 10_000;
/// Default byte cap, for output that rarely or never ends a line.
pub const DEFAULT_MAX_LOG_BYTES: usize = 4 * 1024 * 1024;

/// Append-only byte buffer for a live log tail, bounded by line count and
/// by size. Whichever limit is hit first drops the oldest output.
///
/// Every `reset` starts a new generation. Appends carry the generation they
/// were started with, so frames from a tail that has since been replaced are
/// dropped instead of leaking into the new buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBuffer {
    data: Vec<u8>,
    newlines: usize,
    max_lines: usize,
    max_bytes: usize,
    generation: u64,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOG_LINES, DEFAULT_MAX_LOG_BYTES)
    }
}

impl LogBuffer {
    pub fn new(max_lines: usize, max_bytes: usize) -> Self {
        Self {
            data: Vec::new(),
            newlines: 0,
            max_lines: max_lines.max(1),
            max_bytes: max_bytes.max(1),
            generation: 0,
        }
    }

    /// Drop all buffered bytes and return the new generation.
    pub fn reset(&mut self) -> u64 {
        self.data.clear();
        self.newlines = 0;
        self.generation += 1;
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Append `bytes` if `generation` is still current. Returns whether the
    /// bytes were kept.
    pub fn append(&mut self, generation: u64, bytes: &[u8]) -> bool {
        if generation != self.generation {
            return false;
        }

        self.data.extend_from_slice(bytes);
        self.newlines += bytes.iter().filter(|b| **b == b'\n').count();
        self.trim();
        true
    }

    fn trim(&mut self) {
        if self.newlines > self.max_lines {
            let excess = self.newlines - self.max_lines;
            let cut = self
                .data
                .iter()
                .enumerate()
                .filter(|(_, b)| **b == b'\n')
                .nth(excess - 1)
                .map(|(i, _)| i + 1);

            if let Some(cut) = cut {
                self.data.drain(..cut);
                self.newlines -= excess;
            }
        }

        if self.data.len() > self.max_bytes {
            let cut = self.data.len() - self.max_bytes;
            let dropped = self.data[..cut].iter().filter(|b| **b == b'\n').count();
            self.data.drain(..cut);
            self.newlines -= dropped;
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of newline-terminated lines currently held.
    pub fn line_count(&self) -> usize {
        self.newlines
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}
