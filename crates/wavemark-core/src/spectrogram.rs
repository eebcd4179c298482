//! Spectrogram computation
//!
//! Short-time Fourier transform of the loaded clip, converted to a dB-scaled
//! magnitude matrix for display. The window length scales with the sample
//! rate so frequency resolution stays proportionate across recordings made
//! at different rates; frames overlap by 50%.
//!
//! The dB conversion references the loudest bin in the clip (0 dB = global
//! peak), then the matrix is shifted by its mean and its minimum so that the
//! values handed to the rendering layer are ≥ 0 and centered consistently
//! across files of different loudness. That shift is cosmetic: the output
//! is a display quantity, not calibrated power.

use rayon::prelude::*;
use realfft::RealFftPlanner;
use thiserror::Error;

use crate::types::AudioBuffer;

/// Guard against log(0) in the dB conversion
const EPSILON: f32 = 1e-12;

/// Errors that can occur during spectrogram computation
#[derive(Error, Debug)]
pub enum SpectrogramError {
    #[error("Clip too short for analysis: {got} samples, window needs {needed}")]
    TooShort { needed: usize, got: usize },

    #[error("FFT failed: {0}")]
    Fft(String),
}

/// Display extent of the matrix: time on x, frequency on y
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub t_min: f64,
    pub t_max: f64,
    pub f_min: f64,
    pub f_max: f64,
}

/// dB-scaled magnitude matrix, frequency bins × time frames
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// One column per frame, each holding `n_bins` values (bin 0 = DC)
    frames: Vec<Vec<f32>>,
    n_bins: usize,
    extent: Extent,
}

impl Spectrogram {
    /// Compute the spectrogram of a clip.
    ///
    /// Window length is `(sample_rate / 1000) * 4` samples, hop is half the
    /// window. Returns [`SpectrogramError::TooShort`] when the clip does not
    /// cover a single window.
    pub fn compute(buffer: &AudioBuffer) -> Result<Self, SpectrogramError> {
        let n_fft = (buffer.sample_rate as usize / 1000) * 4;
        let signal = &buffer.samples;

        // Sub-kHz sample rates degenerate to an empty window
        if n_fft < 2 || signal.len() < n_fft {
            return Err(SpectrogramError::TooShort {
                needed: n_fft.max(2),
                got: signal.len(),
            });
        }

        let hop = n_fft / 2;
        let num_frames = (signal.len() - n_fft) / hop + 1;
        let n_bins = n_fft / 2 + 1;

        // Symmetric Hann window
        let window: Vec<f32> = (0..n_fft)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / (n_fft - 1) as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect();

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n_fft);

        // Frames are independent; fan the FFTs out with per-thread scratch
        let mut frames: Vec<Vec<f32>> = (0..num_frames)
            .into_par_iter()
            .map_init(
                || {
                    (
                        vec![0.0f32; n_fft],
                        fft.make_output_vec(),
                        fft.make_scratch_vec(),
                    )
                },
                |(frame_buf, spectrum, scratch), frame_idx| {
                    let start = frame_idx * hop;
                    for i in 0..n_fft {
                        frame_buf[i] = signal[start + i] * window[i];
                    }

                    fft.process_with_scratch(frame_buf, spectrum, scratch)
                        .map_err(|e| SpectrogramError::Fft(format!("{:?}", e)))?;

                    Ok(spectrum.iter().map(|c| c.norm()).collect())
                },
            )
            .collect::<Result<_, SpectrogramError>>()?;

        // 0 dB reference = loudest bin anywhere in the clip. A fully silent
        // clip would make the reference zero; the epsilon floor turns that
        // into a flat 0 dB matrix instead of NaNs.
        let peak = frames
            .iter()
            .flatten()
            .fold(0.0f32, |acc, &m| acc.max(m))
            .max(EPSILON);

        let mut sum = 0.0f64;
        for column in frames.iter_mut() {
            for value in column.iter_mut() {
                *value = 20.0 * (value.max(EPSILON) / peak).log10();
                sum += *value as f64;
            }
        }

        // Center the dynamic range, then lift so displayed values are ≥ 0
        let mean = (sum / (num_frames * n_bins) as f64) as f32;
        let mut min = f32::INFINITY;
        for column in frames.iter_mut() {
            for value in column.iter_mut() {
                *value -= mean;
                min = min.min(*value);
            }
        }
        for column in frames.iter_mut() {
            for value in column.iter_mut() {
                *value -= min;
            }
        }

        Ok(Self {
            frames,
            n_bins,
            extent: Extent {
                t_min: 0.0,
                t_max: buffer.duration(),
                f_min: 0.0,
                f_max: buffer.sample_rate as f64 / 2.0,
            },
        })
    }

    /// Number of frequency bins (rows)
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Number of time frames (columns)
    #[inline]
    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    /// Bin values of one time frame
    #[inline]
    pub fn frame(&self, idx: usize) -> &[f32] {
        &self.frames[idx]
    }

    /// Display extent `(0, duration, 0, nyquist)`
    #[inline]
    pub fn extent(&self) -> Extent {
        self.extent
    }
}
