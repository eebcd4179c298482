//! Common types for wavemark
//!
//! The fundamental audio types shared by the engine: the decoded sample
//! buffer and the time conversions the rest of the crate is built on.

use std::path::{Path, PathBuf};

/// Audio sample type (32-bit float for analysis, whatever depth on disk)
pub type Sample = f32;

/// A decoded mono audio clip.
///
/// Exactly one buffer is live at a time, corresponding to the working set's
/// current file; navigation replaces it wholesale. Multi-channel sources are
/// reduced to their first channel at decode time.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Mono amplitude samples
    pub samples: Vec<Sample>,
    /// Sample rate in Hz (always positive)
    pub sample_rate: u32,
    /// File the samples were decoded from
    pub path: PathBuf,
}

impl AudioBuffer {
    /// Create a buffer from raw mono samples
    pub fn new(samples: Vec<Sample>, sample_rate: u32, path: impl AsRef<Path>) -> Self {
        Self {
            samples,
            sample_rate,
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Number of samples
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer holds no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    #[inline]
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Time in seconds of a given sample index
    #[inline]
    pub fn sample_to_time(&self, sample: usize) -> f64 {
        sample as f64 / self.sample_rate as f64
    }

    /// Waveform x-axis: one timestamp per sample, 0..duration.
    ///
    /// Computed on demand for the rendering collaborator; not cached because
    /// it is only needed once per file activation.
    pub fn time_axis(&self) -> Vec<f64> {
        let rate = self.sample_rate as f64;
        (0..self.samples.len()).map(|i| i as f64 / rate).collect()
    }
}
