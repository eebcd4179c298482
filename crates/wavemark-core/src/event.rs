//! Engine notifications
//!
//! Everything the rendering layer needs to know leaves the engine as an
//! [`EngineEvent`] on a channel; the engine never calls into view objects.
//! Label events carry the index under the store's current numbering; a
//! `LabelRemoved` renumbers every later index, and the consumer must update
//! its own handle mapping in the same step.

use std::path::PathBuf;
use std::sync::Arc;

use crate::labels::Label;
use crate::spectrogram::Spectrogram;
use crate::types::AudioBuffer;

/// Notifications from the engine to the rendering layer
#[derive(Debug, Clone)]
pub enum EngineEvent {
    // File lifecycle
    /// A file became current: position in the working set plus its path
    FileActivated {
        index: usize,
        total: usize,
        path: PathBuf,
    },
    /// Decoded samples for the waveform display
    WaveformReady(Arc<AudioBuffer>),
    /// Analysis matrix for the spectrogram display
    SpectrogramReady(Arc<Spectrogram>),

    // Labels
    LabelAdded { index: usize, label: Label },
    LabelUpdated { index: usize, label: Label },
    /// Indices greater than `index` have shifted down by one
    LabelRemoved { index: usize },
    LabelsCleared,

    // Selection
    /// Committed interval changed; `None` means the selection was cleared
    SelectionChanged(Option<(f64, f64)>),

    // Playback
    /// Marker moved to this position (seconds)
    PlaybackPosition(f64),
    /// Playback ended or was stopped; remove the marker
    PlaybackCleared,

    // Persistence
    /// Labels written to this sidecar path
    SidecarSaved(PathBuf),

    /// Recoverable problem the user should see (bad range, corrupt sidecar,
    /// failed decode, ...), never fatal
    Warning(String),
}
