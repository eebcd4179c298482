//! Selection gesture state machine
//!
//! Converts pointer events (already mapped to time-domain coordinates by the
//! rendering layer) into a committed time interval. A release with no
//! measurable movement is a click, which clears the selection instead of
//! committing a zero-width interval.

/// Movement below this is a click, not a drag (seconds)
const CLICK_EPSILON: f64 = 1e-7;

/// Pointer-driven time range selection.
///
/// The committed interval always has sorted bounds regardless of drag
/// direction. Holds no reference to the audio content; bounds are not
/// clamped here; consumers validate against the clip duration.
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    /// Anchor set on pointer-down
    anchor: Option<f64>,
    /// Cursor position while a drag is active
    cursor: f64,
    /// Last committed interval, if any
    committed: Option<(f64, f64)>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a drag at time `t`
    pub fn pointer_down(&mut self, t: f64) {
        self.anchor = Some(t);
        self.cursor = t;
    }

    /// Update the drag cursor; ignored outside an active drag
    pub fn pointer_move(&mut self, t: f64) {
        if self.anchor.is_some() {
            self.cursor = t;
        }
    }

    /// End the drag at time `t`.
    ///
    /// Returns the new committed interval, or `None` when the gesture was a
    /// click (which also clears any previous selection). A release without a
    /// preceding pointer-down is ignored and leaves the committed interval
    /// untouched.
    pub fn pointer_up(&mut self, t: f64) -> Option<(f64, f64)> {
        let anchor = match self.anchor.take() {
            Some(a) => a,
            None => return self.committed,
        };

        if (t - anchor).abs() < CLICK_EPSILON {
            self.committed = None;
        } else {
            self.committed = Some((anchor.min(t), anchor.max(t)));
        }
        self.committed
    }

    /// Currently committed interval, if any
    #[inline]
    pub fn committed(&self) -> Option<(f64, f64)> {
        self.committed
    }

    /// Sorted bounds of the drag in progress, for rubber-band display
    pub fn active_range(&self) -> Option<(f64, f64)> {
        self.anchor
            .map(|a| (a.min(self.cursor), a.max(self.cursor)))
    }

    /// Whether a drag is in progress
    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }

    /// Drop any committed interval and abandon an in-flight drag
    pub fn clear(&mut self) {
        self.anchor = None;
        self.committed = None;
    }
}
