use std::fmt;

/// One display refresh as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    pub frame: u64,
    pub timestamp_ms: f64,
    /// Time since the previous tick; zero on the first frame.
    pub delta_ms: f64,
}

/// Handle returned by [`FrameClock::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

/// Returned by a frame callback to keep or drop its registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    Continue,
    Stop,
}

type FrameCallback = Box<dyn FnMut(&FrameTick) -> FrameControl>;

struct Entry {
    id: CallbackId,
    callback: FrameCallback,
}

/// Per-frame callback registry.
///
/// Callbacks run in registration order, once per [`tick`](Self::tick). A
/// callback that is unregistered, or that returns [`FrameControl::Stop`], is
/// never invoked again.
#[derive(Default)]
pub struct FrameClock {
    entries: Vec<Entry>,
    next_id: u64,
    frame: u64,
    last_timestamp_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&FrameTick) -> FrameControl + 'static,
    {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            callback: Box::new(callback),
        });
        id
    }

    /// Removes a callback. Returns false if it was already gone.
    pub fn unregister(&mut self, id: CallbackId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        before != self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds the tick for `timestamp_ms` without running callbacks.
    ///
    /// Timestamps that go backwards produce a zero delta.
    pub fn advance(&mut self, timestamp_ms: f64) -> FrameTick {
        let delta_ms = self
            .last_timestamp_ms
            .map(|last| (timestamp_ms - last).max(0.0))
            .unwrap_or(0.0);
        self.last_timestamp_ms = Some(timestamp_ms);
        let tick = FrameTick {
            frame: self.frame,
            timestamp_ms,
            delta_ms,
        };
        self.frame += 1;
        tick
    }

    /// Runs every registered callback for an already advanced tick.
    pub fn dispatch(&mut self, tick: &FrameTick) {
        self.entries
            .retain_mut(|entry| (entry.callback)(tick) == FrameControl::Continue);
    }

    /// Advances the clock and notifies subscribers.
    pub fn tick(&mut self, timestamp_ms: f64) -> FrameTick {
        let tick = self.advance(timestamp_ms);
        self.dispatch(&tick);
        tick
    }
}

impl fmt::Debug for FrameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameClock")
            .field("callbacks", &self.entries.len())
            .field("frame", &self.frame)
            .field("last_timestamp_ms", &self.last_timestamp_ms)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    #[test]
    fn runs_callbacks_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut clock = FrameClock::new();
        for name in ["scroll", "triggers", "timelines"] {
            let log = log.clone();
            clock.register(move |_| {
                log.borrow_mut().push(name);
                FrameControl::Continue
            });
        }

        clock.tick(0.0);
        assert_eq!(*log.borrow(), vec!["scroll", "triggers", "timelines"]);
    }

    #[test]
    fn unregistered_callbacks_stop_running() {
        let hits = Rc::new(RefCell::new(0));
        let mut clock = FrameClock::new();
        let counter = hits.clone();
        let id = clock.register(move |_| {
            *counter.borrow_mut() += 1;
            FrameControl::Continue
        });

        clock.tick(0.0);
        assert!(clock.unregister(id));
        assert!(!clock.unregister(id));
        clock.tick(16.0);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn stop_drops_the_callback() {
        let hits = Rc::new(RefCell::new(0));
        let mut clock = FrameClock::new();
        let counter = hits.clone();
        clock.register(move |_| {
            *counter.borrow_mut() += 1;
            FrameControl::Stop
        });

        clock.tick(0.0);
        clock.tick(16.0);
        assert_eq!(*hits.borrow(), 1);
        assert!(clock.is_empty());
    }

    #[test]
    fn delta_is_measured_between_ticks() {
        let mut clock = FrameClock::new();
        let first = clock.tick(100.0);
        let second = clock.tick(116.5);
        let rewound = clock.tick(110.0);

        assert_eq!(first.delta_ms, 0.0);
        assert_eq!(second.delta_ms, 16.5);
        assert_eq!(second.frame, 1);
        assert_eq!(rewound.delta_ms, 0.0);
    }
}
