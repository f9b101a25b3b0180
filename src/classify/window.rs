//! Sliding window assembler.
//!
//! Accumulates incoming sample batches until exactly one classification
//! window is buffered, then hands the window off and starts over. Windows
//! never overlap. When batches arrive faster than windows are consumed the
//! oldest samples are dropped, keeping only the freshest window-length of
//! audio.

/// Assembles fixed-length classification windows from a batch stream.
///
/// Pure in-memory state; never blocks, never fails.
#[derive(Debug)]
pub struct WindowAssembler {
    window_samples: usize,
    buffer: Vec<f32>,
}

impl WindowAssembler {
    /// Creates an assembler for windows of the given sample count.
    pub fn new(window_samples: usize) -> Self {
        Self {
            window_samples,
            buffer: Vec::with_capacity(window_samples),
        }
    }

    /// Number of samples per emitted window.
    pub fn window_samples(&self) -> usize {
        self.window_samples
    }

    /// Number of samples currently buffered. Always less than one window
    /// after `ingest` returns.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Feeds one batch in, taking ownership of it.
    ///
    /// Returns a complete window exactly when the buffer reaches the window
    /// length; the buffer is then reset to empty. Oversized backlogs keep
    /// only the most recent window-length of samples.
    pub fn ingest(&mut self, batch: Vec<f32>) -> Option<Vec<f32>> {
        if self.buffer.is_empty() && batch.len() == self.window_samples {
            // A batch that is exactly one window avoids the copy.
            return Some(batch);
        }
        self.buffer.extend_from_slice(&batch);

        if self.buffer.len() > self.window_samples {
            let excess = self.buffer.len() - self.window_samples;
            self.buffer.drain(..excess);
        }

        if self.buffer.len() == self.window_samples {
            Some(std::mem::take(&mut self.buffer))
        } else {
            None
        }
    }

    /// Discards any partially accumulated window.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
