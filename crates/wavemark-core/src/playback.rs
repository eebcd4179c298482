//! Simulated playback clock
//!
//! Playback here is a position marker advanced by a periodic tick, not real
//! audio output. Each delivered tick advances the position by a fixed 50 ms
//! of audio time (simulated time, not measured wall clock), so late tick
//! delivery slows the marker down rather than making it jump. That keeps the
//! arithmetic exact (a 0.4 s selection is always 8 ticks) at the cost of
//! drift under scheduler pressure.
//!
//! When a selection is active at play time, its start is the launch position
//! and its end the stop bound; otherwise playback covers the whole clip.

/// Audio time advanced per tick (the tick source fires every 50 ms)
pub const TICK_SECONDS: f64 = 0.05;

/// Clock states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// Outcome of one tick while playing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Marker moved to this position
    Advanced(f64),
    /// Stop bound reached; clock stopped and marker cleared
    Finished,
}

/// Tick-driven playback position state machine
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    state: PlaybackState,
    /// Marker position; present while playing or after a stopped-state seek
    position: Option<f64>,
    /// Where playback stops: selection end, else clip duration
    stop_bound: f64,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self {
            state: PlaybackState::Stopped,
            position: None,
            stop_bound: 0.0,
        }
    }
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start playing. Only valid from `Stopped`; returns the launch position
    /// or `None` when already playing.
    pub fn play(&mut self, selection: Option<(f64, f64)>, duration: f64) -> Option<f64> {
        if self.state == PlaybackState::Playing {
            return None;
        }

        let (start, bound) = match selection {
            Some((start, end)) => (start, end.min(duration)),
            None => (0.0, duration),
        };

        self.state = PlaybackState::Playing;
        self.position = Some(start);
        self.stop_bound = bound;
        Some(start)
    }

    /// Advance by one tick of simulated time.
    ///
    /// Returns `None` while stopped (a straggler tick after `stop` is
    /// harmless). Reaching the stop bound or running past it stops the clock
    /// and clears the marker; the position never overshoots the bound by
    /// more than one tick interval.
    pub fn tick(&mut self) -> Option<Tick> {
        if self.state != PlaybackState::Playing {
            return None;
        }

        let next = self.position.unwrap_or(0.0) + TICK_SECONDS;
        if next >= self.stop_bound {
            self.state = PlaybackState::Stopped;
            self.position = None;
            Some(Tick::Finished)
        } else {
            self.position = Some(next);
            Some(Tick::Advanced(next))
        }
    }

    /// Cancel playback and clear the marker (valid from either state)
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.position = None;
    }

    /// Move the marker to `t`.
    ///
    /// While stopped this only republishes a marker (playback does not
    /// start); while playing it repositions the running clock, leaving the
    /// stop bound alone.
    pub fn seek_to(&mut self, t: f64) {
        self.position = Some(t);
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Current marker position, if one is shown
    #[inline]
    pub fn position(&self) -> Option<f64> {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_from_selection_start() {
        let mut clock = PlaybackClock::new();
        let start = clock.play(Some((0.2, 0.6)), 10.0);
        assert_eq!(start, Some(0.2));
        assert!(clock.is_playing());
        assert_eq!(clock.position(), Some(0.2));
    }

    #[test]
    fn test_selection_stops_after_exact_tick_count() {
        // 0.4s selection = exactly 8 ticks of 50ms
        let mut clock = PlaybackClock::new();
        clock.play(Some((0.2, 0.6)), 10.0);

        for i in 1..8 {
            let tick = clock.tick().unwrap();
            let expected = 0.2 + i as f64 * TICK_SECONDS;
            match tick {
                Tick::Advanced(pos) => assert!((pos - expected).abs() < 1e-9),
                Tick::Finished => panic!("finished early at tick {}", i),
            }
        }

        assert_eq!(clock.tick(), Some(Tick::Finished));
        assert!(!clock.is_playing());
        assert_eq!(clock.position(), None);
    }

    #[test]
    fn test_full_clip_playback_stops_at_duration() {
        let mut clock = PlaybackClock::new();
        clock.play(None, 0.23);
        assert_eq!(clock.position(), Some(0.0));

        let mut last_advanced = 0.0;
        let mut ticks = 0;
        loop {
            match clock.tick() {
                Some(Tick::Advanced(pos)) => {
                    last_advanced = pos;
                    ticks += 1;
                    assert!(pos < 0.23, "published position overshot the clip");
                }
                Some(Tick::Finished) => break,
                None => panic!("clock stopped without finishing"),
            }
            assert!(ticks < 100);
        }
        // Never overshoots by more than one tick interval
        assert!(0.23 - last_advanced <= TICK_SECONDS + 1e-9);
    }

    #[test]
    fn test_play_while_playing_is_ignored() {
        let mut clock = PlaybackClock::new();
        assert!(clock.play(None, 1.0).is_some());
        assert!(clock.play(Some((0.5, 0.9)), 1.0).is_none());
        // Original launch state untouched
        assert_eq!(clock.position(), Some(0.0));
    }

    #[test]
    fn test_stop_clears_marker() {
        let mut clock = PlaybackClock::new();
        clock.play(None, 1.0);
        clock.tick();
        clock.stop();
        assert!(!clock.is_playing());
        assert_eq!(clock.position(), None);
        // Straggler tick after stop does nothing
        assert_eq!(clock.tick(), None);
    }

    #[test]
    fn test_seek_while_stopped_only_moves_marker() {
        let mut clock = PlaybackClock::new();
        clock.seek_to(1.5);
        assert_eq!(clock.position(), Some(1.5));
        assert!(!clock.is_playing());
    }

    #[test]
    fn test_seek_while_playing_repositions() {
        let mut clock = PlaybackClock::new();
        clock.play(None, 10.0);
        clock.seek_to(5.0);
        assert_eq!(clock.tick(), Some(Tick::Advanced(5.05)));
        assert!(clock.is_playing());
    }

    #[test]
    fn test_selection_bound_clamped_to_duration() {
        let mut clock = PlaybackClock::new();
        clock.play(Some((0.0, 99.0)), 0.1);
        clock.tick();
        assert_eq!(clock.tick(), Some(Tick::Finished));
    }
}
