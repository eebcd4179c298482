//! Application session state and command dispatch
//!
//! `LabelSession` is the single state value behind the UI: the working set,
//! the live audio buffer + label store pair, the selection machine, and the
//! playback clock. All mutation enters through [`LabelSession::handle`] on
//! one control thread, and everything the rendering layer needs leaves as
//! [`EngineEvent`]s on a channel; the session never touches view objects.
//!
//! Navigation keeps the on-disk sidecars consistent: stepping away from a
//! file with labels writes its sidecar first (autosave), and activating a
//! file always leaves the label store matching that file's sidecar or empty,
//! never holding another file's labels. A failed autosave or decode aborts
//! the transition with the current state intact.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam::channel::{unbounded, Receiver, Sender};

use crate::config::SessionConfig;
use crate::decode::decode_audio_file;
use crate::event::EngineEvent;
use crate::labels::LabelStore;
use crate::navigator::WorkingSet;
use crate::playback::{PlaybackClock, Tick};
use crate::selection::SelectionModel;
use crate::sidecar::{self, AnnotationRecord};
use crate::spectrogram::Spectrogram;
use crate::types::AudioBuffer;

/// Commands from the interaction layer (pointer gestures arrive with their
/// view coordinates already mapped to clip time)
#[derive(Debug, Clone)]
pub enum Command {
    // Files
    OpenFile(PathBuf),
    OpenFolder(PathBuf),
    NextFile,
    PreviousFile,

    // Selection gestures
    PointerDown(f64),
    PointerMove(f64),
    PointerUp(f64),

    // Labels (edit/delete target the label under the committed selection)
    AddLabel(String),
    EditLabel(String),
    DeleteLabel,
    ClearLabels,
    Save,

    // Playback
    Play,
    Stop,
    SeekTo(f64),
    /// Fired by the 50 ms tick source while the owner's timer runs
    Tick,
}

/// The annotation session: one live file, its labels, and the machinery
/// around them
pub struct LabelSession {
    config: SessionConfig,
    working_set: Option<WorkingSet>,
    audio: Option<Arc<AudioBuffer>>,
    labels: LabelStore,
    selection: SelectionModel,
    clock: PlaybackClock,
    events: Sender<EngineEvent>,
}

impl LabelSession {
    /// Create a session and the event channel its owner should drain
    pub fn new(config: SessionConfig) -> (Self, Receiver<EngineEvent>) {
        let (events, receiver) = unbounded();
        (
            Self {
                config,
                working_set: None,
                audio: None,
                labels: LabelStore::default(),
                selection: SelectionModel::new(),
                clock: PlaybackClock::new(),
                events,
            },
            receiver,
        )
    }

    /// Dispatch one command. Failures surface as [`EngineEvent::Warning`]s;
    /// nothing here is fatal.
    pub fn handle(&mut self, command: Command) {
        match command {
            Command::OpenFile(path) => self.open_file(&path),
            Command::OpenFolder(path) => self.open_folder(&path),
            Command::NextFile => self.step(true),
            Command::PreviousFile => self.step(false),
            Command::PointerDown(t) => self.selection.pointer_down(t),
            Command::PointerMove(t) => self.selection.pointer_move(t),
            Command::PointerUp(t) => {
                let committed = self.selection.pointer_up(t);
                self.emit(EngineEvent::SelectionChanged(committed));
            }
            Command::AddLabel(text) => self.add_label(text),
            Command::EditLabel(text) => self.edit_label(text),
            Command::DeleteLabel => self.delete_label(),
            Command::ClearLabels => {
                self.labels.clear();
                self.emit(EngineEvent::LabelsCleared);
            }
            Command::Save => self.save_manual(),
            Command::Play => self.play(),
            Command::Stop => {
                self.clock.stop();
                self.emit(EngineEvent::PlaybackCleared);
            }
            Command::SeekTo(t) => {
                self.clock.seek_to(t);
                self.emit(EngineEvent::PlaybackPosition(t));
            }
            Command::Tick => match self.clock.tick() {
                Some(Tick::Advanced(pos)) => self.emit(EngineEvent::PlaybackPosition(pos)),
                Some(Tick::Finished) => self.emit(EngineEvent::PlaybackCleared),
                None => {}
            },
        }
    }

    // ── Files ────────────────────────────────────────────────────────────

    fn open_file(&mut self, path: &Path) {
        if !self.flush_outgoing() {
            return;
        }
        let set = WorkingSet::single(path);
        if self.activate(&set, 0) {
            self.working_set = Some(set);
        }
    }

    fn open_folder(&mut self, path: &Path) {
        if !self.flush_outgoing() {
            return;
        }
        let set = match WorkingSet::scan(path, &self.config.audio_extensions) {
            Ok(set) => set,
            Err(e) => {
                self.warn(format!("{}", e));
                return;
            }
        };
        if self.activate(&set, 0) {
            self.working_set = Some(set);
        }
    }

    /// Step to the neighboring file, wrapping at either end
    fn step(&mut self, forward: bool) {
        let Some(set) = self.working_set.clone() else {
            self.warn("No folder open".to_string());
            return;
        };
        let target = if forward {
            set.next_index()
        } else {
            set.previous_index()
        };

        // Outgoing labels hit the disk before anything is discarded
        if !self.flush_outgoing() {
            return;
        }

        if self.activate(&set, target) {
            let mut set = set;
            set.set_position(target);
            self.working_set = Some(set);
        }
    }

    /// Decode and swap in the file at `index` of `set`.
    ///
    /// Decoding happens before any current state is discarded, so a failure
    /// leaves the session exactly as it was (navigation aborts for that
    /// file). Returns whether the activation happened.
    fn activate(&mut self, set: &WorkingSet, index: usize) -> bool {
        let path = set.path_at(index).to_path_buf();

        let buffer = match decode_audio_file(&path) {
            Ok(buffer) => Arc::new(buffer),
            Err(e) => {
                log::error!("Decode failed: {}", e);
                self.warn(format!("Failed to load {}: {}", path.display(), e));
                return false;
            }
        };

        // Tear down the outgoing file's view state
        if self.clock.position().is_some() || self.clock.is_playing() {
            self.clock.stop();
            self.emit(EngineEvent::PlaybackCleared);
        }
        if self.selection.committed().is_some() {
            self.emit(EngineEvent::SelectionChanged(None));
        }
        self.selection.clear();
        self.labels = LabelStore::new(buffer.duration());
        self.emit(EngineEvent::LabelsCleared);

        self.emit(EngineEvent::FileActivated {
            index,
            total: set.len(),
            path: path.clone(),
        });
        self.emit(EngineEvent::WaveformReady(buffer.clone()));

        match Spectrogram::compute(&buffer) {
            Ok(spec) => self.emit(EngineEvent::SpectrogramReady(Arc::new(spec))),
            Err(e) => self.warn(format!("No spectrogram for {}: {}", path.display(), e)),
        }

        // Sidecar, if one exists; corrupt records degrade to an empty set
        match sidecar::load(&sidecar::sidecar_path(&path)) {
            Ok(Some(record)) => {
                self.labels.replace_all(record.labels);
                for (i, label) in self.labels.iter().cloned().enumerate() {
                    self.emit(EngineEvent::LabelAdded { index: i, label });
                }
                log::info!("Loaded {} labels for {:?}", self.labels.len(), path);
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("Sidecar load failed: {}", e);
                self.warn(format!("Ignoring sidecar for {}: {}", path.display(), e));
            }
        }

        self.audio = Some(buffer);
        true
    }

    // ── Persistence ──────────────────────────────────────────────────────

    /// Autosave the outgoing file's labels before a transition.
    ///
    /// Nothing to save counts as success; a write failure keeps the labels
    /// in memory and vetoes the transition so the user can retry.
    fn flush_outgoing(&mut self) -> bool {
        if self.labels.is_empty() {
            return true;
        }
        let Some(audio) = self.audio.clone() else {
            return true;
        };
        match self.write_sidecar(&audio) {
            Ok(path) => {
                self.emit(EngineEvent::SidecarSaved(path));
                true
            }
            Err(e) => {
                log::error!("Autosave failed: {}", e);
                self.warn(format!("Autosave failed, staying on current file: {}", e));
                false
            }
        }
    }

    fn save_manual(&mut self) {
        let Some(audio) = self.audio.clone() else {
            self.warn("No audio file loaded".to_string());
            return;
        };
        if self.labels.is_empty() {
            self.warn("No labels to save".to_string());
            return;
        }
        match self.write_sidecar(&audio) {
            Ok(path) => self.emit(EngineEvent::SidecarSaved(path)),
            Err(e) => self.warn(format!("Failed to save labels: {}", e)),
        }
    }

    fn write_sidecar(&self, audio: &AudioBuffer) -> Result<PathBuf, crate::sidecar::SidecarError> {
        let record = AnnotationRecord {
            audio_file: audio.path.display().to_string(),
            sample_rate: audio.sample_rate,
            duration: audio.duration(),
            labels: self.labels.iter().cloned().collect(),
        };
        let path = sidecar::sidecar_path(&audio.path);
        sidecar::save(&path, &record)?;
        Ok(path)
    }

    // ── Labels ───────────────────────────────────────────────────────────

    fn add_label(&mut self, text: String) {
        if self.audio.is_none() {
            self.warn("No audio file loaded".to_string());
            return;
        }
        let Some((start, end)) = self.selection.committed() else {
            self.warn("Select a region first".to_string());
            return;
        };
        if text.is_empty() {
            self.warn("Label text is empty".to_string());
            return;
        }
        match self.labels.add(start, end, text.clone()) {
            Ok(index) => {
                let label = crate::labels::Label { start, end, text };
                self.emit(EngineEvent::LabelAdded { index, label });
            }
            Err(e) => self.warn(format!("{}", e)),
        }
    }

    /// Label under the committed selection, via range matching
    fn selected_label_index(&self) -> Option<usize> {
        let (start, end) = self.selection.committed()?;
        self.labels
            .find_by_range(start, end, self.config.range_match_tolerance)
    }

    fn edit_label(&mut self, text: String) {
        let Some(index) = self.selected_label_index() else {
            self.warn("No label found in selected region".to_string());
            return;
        };
        match self.labels.edit_text(index, text) {
            Ok(()) => {
                if let Some(label) = self.labels.get(index).cloned() {
                    self.emit(EngineEvent::LabelUpdated { index, label });
                }
            }
            Err(e) => self.warn(format!("{}", e)),
        }
    }

    fn delete_label(&mut self) {
        let Some(index) = self.selected_label_index() else {
            self.warn("No label found in selected region".to_string());
            return;
        };
        match self.labels.delete(index) {
            Ok(_) => self.emit(EngineEvent::LabelRemoved { index }),
            Err(e) => self.warn(format!("{}", e)),
        }
    }

    // ── Playback ─────────────────────────────────────────────────────────

    fn play(&mut self) {
        let Some(audio) = &self.audio else {
            self.warn("No audio file loaded".to_string());
            return;
        };
        let duration = audio.duration();
        if let Some(start) = self.clock.play(self.selection.committed(), duration) {
            self.emit(EngineEvent::PlaybackPosition(start));
        }
    }

    // ── Plumbing ─────────────────────────────────────────────────────────

    fn emit(&self, event: EngineEvent) {
        // A dropped receiver just means nobody is rendering
        let _ = self.events.send(event);
    }

    fn warn(&self, message: String) {
        log::warn!("{}", message);
        self.emit(EngineEvent::Warning(message));
    }

    // Read-only accessors for the owner

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn labels(&self) -> &LabelStore {
        &self.labels
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn playback(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn audio(&self) -> Option<&Arc<AudioBuffer>> {
        self.audio.as_ref()
    }

    /// Current file path, if one is active
    pub fn current_file(&self) -> Option<&Path> {
        self.working_set.as_ref().map(|set| set.current())
    }

    /// `(index, total)` within the working set
    pub fn file_position(&self) -> Option<(usize, usize)> {
        self.working_set
            .as_ref()
            .map(|set| (set.position(), set.len()))
    }
}
