use std::time::Instant;

/// Debounced reading of one tracked signal.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DetectionState<P> {
    #[default]
    Absent,
    Present(P),
}

/// A transition between two frames' readings.
#[derive(Clone, Debug, PartialEq)]
pub enum EdgeEvent<P> {
    Appeared(P),
    Changed { previous: P, current: P },
    Disappeared(P),
}

impl<P> EdgeEvent<P> {
    /// Payload of the state after the transition, if present.
    pub fn current(&self) -> Option<&P> {
        match self {
            EdgeEvent::Appeared(p) | EdgeEvent::Changed { current: p, .. } => Some(p),
            EdgeEvent::Disappeared(_) => None,
        }
    }
}

/// Turns per-frame level readings into edge events.
///
/// `observe` returns `Some` only when the reading differs from the last
/// one: absent to present, present to absent, or a different payload.
/// Repeating the same reading is silent no matter how long the run.
#[derive(Debug)]
pub struct DetectionStateTracker<P> {
    state: DetectionState<P>,
    last_transition: Option<Instant>,
}

impl<P: Clone + PartialEq> DetectionStateTracker<P> {
    pub fn new() -> Self {
        Self {
            state: DetectionState::Absent,
            last_transition: None,
        }
    }

    pub fn observe(&mut self, reading: Option<P>) -> Option<EdgeEvent<P>> {
        self.observe_at(reading, Instant::now())
    }

    pub fn observe_at(&mut self, reading: Option<P>, now: Instant) -> Option<EdgeEvent<P>> {
        let event = match (&self.state, reading) {
            (DetectionState::Absent, None) => return None,
            (DetectionState::Present(prev), Some(cur)) if *prev == cur => return None,
            (DetectionState::Absent, Some(cur)) => {
                self.state = DetectionState::Present(cur.clone());
                EdgeEvent::Appeared(cur)
            }
            (DetectionState::Present(prev), Some(cur)) => {
                let previous = prev.clone();
                self.state = DetectionState::Present(cur.clone());
                EdgeEvent::Changed {
                    previous,
                    current: cur,
                }
            }
            (DetectionState::Present(prev), None) => {
                let previous = prev.clone();
                self.state = DetectionState::Absent;
                EdgeEvent::Disappeared(previous)
            }
        };
        self.last_transition = Some(now);
        Some(event)
    }

    /// Back to `Absent` without emitting anything.
    pub fn reset(&mut self) {
        self.state = DetectionState::Absent;
        self.last_transition = None;
    }

    pub fn state(&self) -> &DetectionState<P> {
        &self.state
    }

    pub fn is_present(&self) -> bool {
        matches!(self.state, DetectionState::Present(_))
    }

    pub fn last_transition(&self) -> Option<Instant> {
        self.last_transition
    }
}

impl<P: Clone + PartialEq> Default for DetectionStateTracker<P> {
    fn default() -> Self {
        Self::new()
    }
}
