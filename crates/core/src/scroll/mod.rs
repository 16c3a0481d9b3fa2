//! Smoothed scroll position.
//!
//! Native scroll events only move the *raw* target. Once per frame the source
//! moves the *smoothed* offset toward that target with an eased transition of
//! fixed length, restarting from wherever it currently is whenever the target
//! moves. Every other component reads the smoothed value from the
//! [`ScrollSample`] this produces.

use serde::{Deserialize, Serialize};

use crate::ScrollConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollDirection {
    /// Offset growing, i.e. moving down the page.
    Forward,
    Backward,
    Idle,
}

/// Snapshot emitted once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollSample {
    pub raw_offset: f64,
    pub smoothed_offset: f64,
    pub timestamp_ms: f64,
    /// Signed change of the smoothed offset since the previous sample.
    pub delta: f64,
    pub direction: ScrollDirection,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: f64,
    to: f64,
    elapsed_secs: f64,
}

#[derive(Debug, Clone)]
pub struct ScrollSource {
    config: ScrollConfig,
    target: f64,
    smoothed: f64,
    max_scroll: f64,
    transition: Option<Transition>,
    last_timestamp_ms: Option<f64>,
    last_emitted: f64,
}

impl ScrollSource {
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            config,
            target: 0.0,
            smoothed: 0.0,
            max_scroll: f64::INFINITY,
            transition: None,
            last_timestamp_ms: None,
            last_emitted: 0.0,
        }
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    pub fn raw_offset(&self) -> f64 {
        self.target
    }

    pub fn smoothed_offset(&self) -> f64 {
        self.smoothed
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Upper bound for the offset (document height minus viewport height).
    pub fn set_limit(&mut self, max_scroll: f64) {
        self.max_scroll = max_scroll.max(0.0);
        let clamped = self.clamp(self.target);
        if clamped != self.target {
            self.retarget(clamped);
        }
        self.smoothed = self.clamp(self.smoothed);
    }

    /// Records the offset reported by a native scroll event.
    pub fn set_raw(&mut self, offset: f64) {
        let offset = self.clamp(offset);
        if offset != self.target {
            self.retarget(offset);
        }
    }

    /// Accumulates a wheel delta onto the current target.
    pub fn scroll_by(&mut self, delta: f64) {
        self.set_raw(self.target + delta * self.config.wheel_multiplier);
    }

    /// Moves to `offset`, skipping the transition when `immediate` is set.
    pub fn scroll_to(&mut self, offset: f64, immediate: bool) {
        if immediate {
            let offset = self.clamp(offset);
            self.target = offset;
            self.smoothed = offset;
            self.transition = None;
        } else {
            self.set_raw(offset);
        }
    }

    /// Advances the smoothed offset to `timestamp_ms` and returns the sample.
    pub fn advance(&mut self, timestamp_ms: f64) -> ScrollSample {
        let dt_secs = self
            .last_timestamp_ms
            .map(|last| ((timestamp_ms - last) / 1000.0).max(0.0))
            .unwrap_or(0.0);
        self.last_timestamp_ms = Some(timestamp_ms);

        if !self.config.smooth || self.config.duration_secs <= 0.0 {
            self.smoothed = self.target;
            self.transition = None;
        } else if let Some(transition) = self.transition.as_mut() {
            transition.elapsed_secs += dt_secs;
            let progress = (transition.elapsed_secs / self.config.duration_secs).clamp(0.0, 1.0);
            if progress >= 1.0 {
                self.smoothed = transition.to;
                self.transition = None;
            } else {
                let eased = self.config.ease.apply(progress);
                self.smoothed = transition.from + (transition.to - transition.from) * eased;
            }
        }

        let delta = self.smoothed - self.last_emitted;
        self.last_emitted = self.smoothed;
        let direction = if delta > 0.0 {
            ScrollDirection::Forward
        } else if delta < 0.0 {
            ScrollDirection::Backward
        } else {
            ScrollDirection::Idle
        };

        ScrollSample {
            raw_offset: self.target,
            smoothed_offset: self.smoothed,
            timestamp_ms,
            delta,
            direction,
        }
    }

    fn retarget(&mut self, offset: f64) {
        self.target = offset;
        self.transition = Some(Transition {
            from: self.smoothed,
            to: offset,
            elapsed_secs: 0.0,
        });
    }

    fn clamp(&self, offset: f64) -> f64 {
        offset.clamp(0.0, self.max_scroll)
    }
}
