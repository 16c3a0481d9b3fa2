//! Loading counter that gates the main entrance animation.
//!
//! `Loading` ticks the counter on a fixed interval until it saturates at 100,
//! then `Revealing` slides the overlay out, and `Revealed` is terminal. The
//! completion signal is emitted once the slide-out has fully elapsed.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{IncrementPolicy, PreloaderConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreloaderPhase {
    Loading,
    Revealing,
    Revealed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreloaderEvent {
    /// Counter moved to the given value.
    Progress(u8),
    /// Counter hit 100 and the overlay started sliding out.
    Revealing,
    /// Slide-out finished; the page may start its entrance animation.
    Revealed,
}

pub struct Preloader {
    config: PreloaderConfig,
    rng: fastrand::Rng,
    progress: u8,
    phase: PreloaderPhase,
    next_tick_ms: Option<f64>,
    revealing_at_ms: Option<f64>,
    on_complete: Option<Box<dyn FnOnce()>>,
}

impl Preloader {
    pub fn new(config: PreloaderConfig) -> Self {
        let rng = config
            .seed
            .map(fastrand::Rng::with_seed)
            .unwrap_or_else(fastrand::Rng::new);
        if stalls(&config.policy) {
            warn!(policy = ?config.policy, "preloader increment is zero, it will never finish");
        }
        Self {
            config,
            rng,
            progress: 0,
            phase: PreloaderPhase::Loading,
            next_tick_ms: None,
            revealing_at_ms: None,
            on_complete: None,
        }
    }

    /// Hook run exactly once, when the machine becomes `Revealed`.
    pub fn on_complete<F>(&mut self, hook: F)
    where
        F: FnOnce() + 'static,
    {
        self.on_complete = Some(Box::new(hook));
    }

    pub fn config(&self) -> &PreloaderConfig {
        &self.config
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn phase(&self) -> PreloaderPhase {
        self.phase
    }

    pub fn is_started(&self) -> bool {
        self.next_tick_ms.is_some()
    }

    /// Arms the tick interval. Calling it twice has no effect.
    pub fn start(&mut self, now_ms: f64) {
        if self.next_tick_ms.is_none() {
            debug!(now_ms, policy = ?self.config.policy, "preloader started");
            self.next_tick_ms = Some(now_ms + self.config.tick_interval_ms as f64);
        }
    }

    /// Runs every tick due by `now_ms` and any phase change that follows.
    pub fn update(&mut self, now_ms: f64) -> Vec<PreloaderEvent> {
        let mut events = Vec::new();
        let Some(mut next_tick) = self.next_tick_ms else {
            return events;
        };

        let interval = self.config.tick_interval_ms.max(1) as f64;
        if stalls(&self.config.policy) {
            if next_tick <= now_ms {
                let due = ((now_ms - next_tick) / interval).floor() + 1.0;
                self.next_tick_ms = Some(next_tick + due * interval);
            }
            return events;
        }
        while self.phase == PreloaderPhase::Loading && next_tick <= now_ms {
            let step = self.increment();
            self.progress = self.progress.saturating_add(step).min(100);
            events.push(PreloaderEvent::Progress(self.progress));

            if self.progress >= 100 {
                self.phase = PreloaderPhase::Revealing;
                self.revealing_at_ms = Some(next_tick);
                info!(at_ms = next_tick, "preloader complete, revealing");
                events.push(PreloaderEvent::Revealing);
            }
            next_tick += interval;
        }
        self.next_tick_ms = Some(next_tick);

        if self.phase == PreloaderPhase::Revealing && self.exit_progress(now_ms) >= 1.0 {
            self.phase = PreloaderPhase::Revealed;
            info!(now_ms, "preloader revealed");
            events.push(PreloaderEvent::Revealed);
            if let Some(hook) = self.on_complete.take() {
                hook();
            }
        }
        events
    }

    /// Normalised slide-out progress, before easing.
    pub fn exit_progress(&self, now_ms: f64) -> f64 {
        match (self.phase, self.revealing_at_ms) {
            (PreloaderPhase::Loading, _) | (_, None) => 0.0,
            (PreloaderPhase::Revealed, _) => 1.0,
            (PreloaderPhase::Revealing, Some(at)) => {
                let duration = self.config.exit_duration_ms as f64;
                if duration <= 0.0 {
                    1.0
                } else {
                    ((now_ms - at) / duration).clamp(0.0, 1.0)
                }
            }
        }
    }

    /// Overlay `yPercent`: 0 while loading, -100 once revealed.
    pub fn overlay_offset(&self, now_ms: f64) -> f64 {
        -100.0 * self.config.exit_ease.apply(self.exit_progress(now_ms))
    }

    fn increment(&mut self) -> u8 {
        match self.config.policy {
            IncrementPolicy::Fixed { step } => step,
            IncrementPolicy::Random { min, max } => self.rng.u8(min..=max.max(min)),
        }
    }
}

/// True when the policy can only ever add zero.
fn stalls(policy: &IncrementPolicy) -> bool {
    matches!(
        policy,
        IncrementPolicy::Fixed { step: 0 } | IncrementPolicy::Random { max: 0, .. }
    )
}

impl fmt::Debug for Preloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preloader")
            .field("progress", &self.progress)
            .field("phase", &self.phase)
            .field("next_tick_ms", &self.next_tick_ms)
            .field("revealing_at_ms", &self.revealing_at_ms)
            .field("has_hook", &self.on_complete.is_some())
            .finish()
    }
}
