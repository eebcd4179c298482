//! Segment labels for the loaded clip
//!
//! The label store owns the insertion-ordered set of labeled time intervals
//! for exactly one audio file. Indices are positions in that order and are
//! NOT stable across deletion: removing a label shifts every later index
//! down by one, so any external index reference must be adjusted in the same
//! transaction as the delete.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default matching tolerance for [`LabelStore::find_by_range`] (seconds)
pub const RANGE_MATCH_TOLERANCE: f64 = 0.01;

/// Errors from label store mutations. Rejected calls leave the store
/// untouched.
#[derive(Error, Debug, PartialEq)]
pub enum LabelError {
    #[error("Invalid label range {start:.6}..{end:.6} for a {duration:.6}s clip")]
    InvalidRange { start: f64, end: f64, duration: f64 },

    #[error("Label index {index} out of range (store holds {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// A labeled time interval, `0 <= start < end <= duration`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub start: f64,
    pub end: f64,
    /// Sidecar files call this field `label`
    #[serde(rename = "label")]
    pub text: String,
}

/// Ordered label collection scoped to one audio file.
///
/// The store enforces the range invariant itself rather than trusting its
/// callers; the interactive layer is expected to reject bad ranges first,
/// but the store has to stay safe when reused elsewhere.
#[derive(Debug, Clone, Default)]
pub struct LabelStore {
    labels: Vec<Label>,
    /// Duration of the owning clip, the upper bound for label ends
    duration: f64,
}

impl LabelStore {
    /// Create an empty store for a clip of the given duration
    pub fn new(duration: f64) -> Self {
        Self {
            labels: Vec::new(),
            duration,
        }
    }

    /// Append a label, returning its index
    pub fn add(&mut self, start: f64, end: f64, text: impl Into<String>) -> Result<usize, LabelError> {
        if !(start < end) || start < 0.0 || end > self.duration {
            return Err(LabelError::InvalidRange {
                start,
                end,
                duration: self.duration,
            });
        }
        self.labels.push(Label {
            start,
            end,
            text: text.into(),
        });
        Ok(self.labels.len() - 1)
    }

    /// Replace the text of an existing label. Bounds are not editable.
    pub fn edit_text(&mut self, index: usize, text: impl Into<String>) -> Result<(), LabelError> {
        let len = self.labels.len();
        let label = self
            .labels
            .get_mut(index)
            .ok_or(LabelError::IndexOutOfRange { index, len })?;
        label.text = text.into();
        Ok(())
    }

    /// Remove a label. Every index greater than `index` shifts down by one.
    pub fn delete(&mut self, index: usize) -> Result<Label, LabelError> {
        if index >= self.labels.len() {
            return Err(LabelError::IndexOutOfRange {
                index,
                len: self.labels.len(),
            });
        }
        Ok(self.labels.remove(index))
    }

    /// First label whose bounds both lie within `tolerance` of the query.
    ///
    /// Resolves "the label under the current selection" when no explicit
    /// list selection exists.
    pub fn find_by_range(&self, start: f64, end: f64, tolerance: f64) -> Option<usize> {
        self.labels
            .iter()
            .position(|l| (l.start - start).abs() < tolerance && (l.end - end).abs() < tolerance)
    }

    /// Drop all labels (used before activating another file)
    pub fn clear(&mut self) {
        self.labels.clear();
    }

    /// Replace the entire contents (sidecar load path). Out-of-range entries
    /// are clamped into `[0, duration]`; degenerate ones are dropped.
    pub fn replace_all(&mut self, labels: Vec<Label>) {
        self.labels = labels
            .into_iter()
            .filter_map(|mut l| {
                l.start = l.start.max(0.0);
                l.end = l.end.min(self.duration);
                (l.start < l.end).then_some(l)
            })
            .collect();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Label> {
        self.labels.get(index)
    }

    /// Iterate labels in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    /// Clip duration this store validates against
    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(labels: &[(f64, f64, &str)]) -> LabelStore {
        let mut store = LabelStore::new(10.0);
        for (s, e, t) in labels {
            store.add(*s, *e, *t).unwrap();
        }
        store
    }

    #[test]
    fn test_add_returns_index() {
        let mut store = LabelStore::new(10.0);
        assert_eq!(store.add(0.5, 1.0, "speech").unwrap(), 0);
        assert_eq!(store.add(2.0, 3.0, "noise").unwrap(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_add_rejects_inverted_range() {
        let mut store = LabelStore::new(10.0);
        assert!(matches!(
            store.add(2.0, 1.0, "x"),
            Err(LabelError::InvalidRange { .. })
        ));
        assert!(matches!(
            store.add(1.0, 1.0, "x"),
            Err(LabelError::InvalidRange { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_rejects_out_of_bounds() {
        let mut store = LabelStore::new(10.0);
        assert!(store.add(-0.1, 1.0, "x").is_err());
        assert!(store.add(9.0, 10.1, "x").is_err());
        // Boundary values are fine
        assert!(store.add(0.0, 10.0, "full").is_ok());
    }

    #[test]
    fn test_edit_text() {
        let mut store = store_with(&[(0.0, 1.0, "a")]);
        store.edit_text(0, "b").unwrap();
        assert_eq!(store.get(0).unwrap().text, "b");
        assert_eq!(store.get(0).unwrap().start, 0.0);

        assert!(matches!(
            store.edit_text(1, "c"),
            Err(LabelError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_delete_shifts_later_indices() {
        let mut store = store_with(&[(0.0, 1.0, "a"), (1.0, 2.0, "b"), (2.0, 3.0, "c")]);
        let removed = store.delete(1).unwrap();
        assert_eq!(removed.text, "b");
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).unwrap().text, "a");
        assert_eq!(store.get(1).unwrap().text, "c");
    }

    #[test]
    fn test_delete_out_of_range() {
        let mut store = store_with(&[(0.0, 1.0, "a")]);
        assert!(store.delete(5).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_find_by_range_tolerance() {
        let store = store_with(&[(0.5, 1.0, "speech")]);
        // Matches within 0.01 of both bounds
        assert_eq!(store.find_by_range(0.501, 0.999, RANGE_MATCH_TOLERANCE), Some(0));
        // One bound too far off
        assert_eq!(store.find_by_range(0.52, 1.0, RANGE_MATCH_TOLERANCE), None);
        assert_eq!(store.find_by_range(0.5, 1.5, RANGE_MATCH_TOLERANCE), None);
    }

    #[test]
    fn test_find_returns_first_match() {
        let store = store_with(&[(0.5, 1.0, "a"), (0.5, 1.0, "b")]);
        assert_eq!(store.find_by_range(0.5, 1.0, RANGE_MATCH_TOLERANCE), Some(0));
    }

    #[test]
    fn test_clear() {
        let mut store = store_with(&[(0.0, 1.0, "a")]);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_replace_all_clamps_and_drops() {
        let mut store = LabelStore::new(2.0);
        store.replace_all(vec![
            Label { start: -0.5, end: 1.0, text: "clamped".into() },
            Label { start: 1.5, end: 5.0, text: "clamped too".into() },
            Label { start: 3.0, end: 4.0, text: "entirely outside".into() },
        ]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).unwrap().start, 0.0);
        assert_eq!(store.get(1).unwrap().end, 2.0);
    }
}
