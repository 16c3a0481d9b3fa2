//! Timeline player.
//!
//! A [`TimelineSpec`] is an ordered list of [`AnimationSpec`] entries. The
//! player turns one normalised progress value into style writes for every
//! matched node, either from wall-clock time (autoplay) or from the scroll
//! offset inside a trigger range (scrubbed).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Ease, EaseMode, Layout, Property, Result, ScrollRange, StyleWrite, TriggerRegion, Value,
};

/// Whether declared values are where the animation starts or where it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TweenDirection {
    /// Animate from the natural value to the declared one.
    #[default]
    To,
    /// Animate from the declared value back to the natural one.
    From,
}

/// One entry of a timeline.
///
/// | field        | default        |
/// |--------------|----------------|
/// | `direction`  | `to`           |
/// | `duration`   | `0.5` seconds  |
/// | `ease`       | `power1.out`   |
/// | `stagger`    | `0` seconds    |
/// | `position`   | after previous |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    pub target: String,
    #[serde(default)]
    pub direction: TweenDirection,
    pub properties: BTreeMap<Property, Value>,
    #[serde(default = "AnimationSpec::default_duration")]
    pub duration: f64,
    #[serde(default)]
    pub ease: Ease,
    /// Delay between consecutive matched nodes.
    #[serde(default)]
    pub stagger: f64,
    /// Absolute start time inside the timeline.
    #[serde(default)]
    pub position: Option<f64>,
}

impl AnimationSpec {
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            direction: TweenDirection::To,
            properties: BTreeMap::new(),
            duration: Self::default_duration(),
            ease: Ease::default(),
            stagger: 0.0,
            position: None,
        }
    }

    pub fn from(target: impl Into<String>) -> Self {
        Self {
            direction: TweenDirection::From,
            ..Self::to(target)
        }
    }

    pub fn set(mut self, property: Property, value: impl Into<Value>) -> Self {
        self.properties.insert(property, value.into());
        self
    }

    pub fn duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn stagger(mut self, stagger: f64) -> Self {
        self.stagger = stagger;
        self
    }

    pub fn at(mut self, position: f64) -> Self {
        self.position = Some(position);
        self
    }

    fn default_duration() -> f64 {
        0.5
    }

    /// Time from the first node starting to the last node settling.
    pub fn span(&self, count: usize) -> f64 {
        self.duration.max(0.0) + count.saturating_sub(1) as f64 * self.stagger.max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    #[default]
    Once,
    /// Wraps back to progress 0 on reaching the end.
    Infinite,
}

/// Binds a timeline to a scroll range instead of the clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollBinding {
    pub region: TriggerRegion,
    /// `0` tracks the scroll offset exactly; `n` lets the playhead catch up
    /// over `n` seconds.
    #[serde(default)]
    pub scrub_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSpec {
    pub name: String,
    pub entries: Vec<AnimationSpec>,
    #[serde(default)]
    pub scroll: Option<ScrollBinding>,
    #[serde(default)]
    pub repeat: Repeat,
}

impl TimelineSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            scroll: None,
            repeat: Repeat::Once,
        }
    }

    pub fn then(mut self, entry: AnimationSpec) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn scrubbed(mut self, region: TriggerRegion, scrub_secs: f64) -> Self {
        self.scroll = Some(ScrollBinding { region, scrub_secs });
        self
    }

    pub fn looping(mut self) -> Self {
        self.repeat = Repeat::Infinite;
        self
    }
}

/// How progress is driven.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayMode {
    Autoplay,
    Scrubbed { range: ScrollRange, scrub_secs: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimelineEvent {
    Started,
    Completed,
}

#[derive(Debug, Clone)]
struct ResolvedEntry {
    spec: AnimationSpec,
    count: usize,
    start: f64,
}

#[derive(Debug, Clone, Copy)]
struct CatchUp {
    from: f64,
    to: f64,
    elapsed_secs: f64,
}

const CATCH_UP_EASE: Ease = Ease::power(3, EaseMode::Out);

#[derive(Debug, Clone)]
pub struct TimelinePlayer {
    name: String,
    entries: Vec<ResolvedEntry>,
    total: f64,
    mode: PlayMode,
    repeat: Repeat,
    progress: f64,
    started_at_ms: Option<f64>,
    completed: bool,
    catch_up: Option<CatchUp>,
    last_frame_ms: Option<f64>,
}

impl TimelinePlayer {
    /// Resolves every target and the optional scroll region against `layout`.
    pub fn new(spec: &TimelineSpec, layout: &Layout) -> Result<Self> {
        let mut entries = Vec::with_capacity(spec.entries.len());
        let mut cursor = 0.0_f64;
        let mut total = 0.0_f64;
        for entry in &spec.entries {
            let count = layout.resolve(&entry.target)?.count;
            let start = entry.position.unwrap_or(cursor).max(0.0);
            let end = start + entry.span(count);
            cursor = end;
            total = total.max(end);
            entries.push(ResolvedEntry {
                spec: entry.clone(),
                count,
                start,
            });
        }

        let mode = match &spec.scroll {
            Some(binding) => PlayMode::Scrubbed {
                range: binding.region.resolve(layout)?,
                scrub_secs: binding.scrub_secs.max(0.0),
            },
            None => PlayMode::Autoplay,
        };

        Ok(Self {
            name: spec.name.clone(),
            entries,
            total,
            mode,
            repeat: spec.repeat,
            progress: 0.0,
            started_at_ms: None,
            completed: false,
            catch_up: None,
            last_frame_ms: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    /// Length of one pass in seconds.
    pub fn duration(&self) -> f64 {
        self.total
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_playing(&self) -> bool {
        self.started_at_ms.is_some() && !self.completed
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Starts an autoplay timeline. Scrubbed timelines ignore this.
    pub fn play(&mut self, now_ms: f64) -> Option<TimelineEvent> {
        if self.mode != PlayMode::Autoplay || self.started_at_ms.is_some() {
            return None;
        }
        debug!(timeline = %self.name, now_ms, "timeline started");
        self.started_at_ms = Some(now_ms);
        Some(TimelineEvent::Started)
    }

    /// Jumps to `progress` directly, cancelling any catch-up.
    pub fn seek(&mut self, progress: f64) {
        self.progress = progress.clamp(0.0, 1.0);
        self.catch_up = None;
    }

    /// Re-resolves the scroll range after a layout change.
    pub fn set_range(&mut self, range: ScrollRange) {
        if let PlayMode::Scrubbed { scrub_secs, .. } = self.mode {
            self.mode = PlayMode::Scrubbed { range, scrub_secs };
        }
    }

    /// Advances progress for this frame.
    ///
    /// Returns [`TimelineEvent::Completed`] exactly once when a
    /// non-repeating autoplay timeline reaches its end.
    pub fn advance(&mut self, now_ms: f64, scroll_offset: f64) -> Option<TimelineEvent> {
        let dt_secs = self
            .last_frame_ms
            .map(|last| ((now_ms - last) / 1000.0).max(0.0))
            .unwrap_or(0.0);
        self.last_frame_ms = Some(now_ms);

        match self.mode {
            PlayMode::Autoplay => self.advance_clock(now_ms),
            PlayMode::Scrubbed { range, scrub_secs } => {
                self.advance_scrub(range.progress(scroll_offset), scrub_secs, dt_secs);
                None
            }
        }
    }

    fn advance_clock(&mut self, now_ms: f64) -> Option<TimelineEvent> {
        let started = self.started_at_ms?;
        if self.completed {
            return None;
        }
        let elapsed = ((now_ms - started) / 1000.0).max(0.0);
        if self.total <= 0.0 {
            self.progress = 1.0;
        } else {
            match self.repeat {
                Repeat::Once => self.progress = (elapsed / self.total).min(1.0),
                Repeat::Infinite => {
                    self.progress = (elapsed % self.total) / self.total;
                    return None;
                }
            }
        }

        if self.progress >= 1.0 && self.repeat == Repeat::Once {
            self.completed = true;
            debug!(timeline = %self.name, "timeline completed");
            return Some(TimelineEvent::Completed);
        }
        None
    }

    fn advance_scrub(&mut self, target: f64, scrub_secs: f64, dt_secs: f64) {
        if scrub_secs <= 0.0 {
            self.progress = target;
            return;
        }

        // A moved target restarts the catch-up from wherever the playhead is;
        // this frame's time still counts toward it.
        let retarget = self
            .catch_up
            .map(|catch_up| catch_up.to != target)
            .unwrap_or(self.progress != target);
        if retarget {
            self.catch_up = Some(CatchUp {
                from: self.progress,
                to: target,
                elapsed_secs: 0.0,
            });
        }

        if let Some(catch_up) = self.catch_up.as_mut() {
            catch_up.elapsed_secs += dt_secs;
            let t = (catch_up.elapsed_secs / scrub_secs).clamp(0.0, 1.0);
            if t >= 1.0 {
                self.progress = catch_up.to;
                self.catch_up = None;
            } else {
                self.progress =
                    catch_up.from + (catch_up.to - catch_up.from) * CATCH_UP_EASE.apply(t);
            }
        }
    }

    /// Style writes for the current progress.
    pub fn sample(&self) -> Vec<StyleWrite> {
        let time = self.progress * self.total;
        let mut writes = Vec::new();
        for entry in &self.entries {
            let spec = &entry.spec;
            for index in 0..entry.count {
                let local_start = entry.start + index as f64 * spec.stagger.max(0.0);
                let local = if spec.duration <= 0.0 {
                    if time >= local_start {
                        1.0
                    } else {
                        0.0
                    }
                } else {
                    ((time - local_start) / spec.duration).clamp(0.0, 1.0)
                };
                let eased = spec.ease.apply(local);

                for (&property, &declared) in &spec.properties {
                    let natural = property.natural();
                    let (from, to) = match spec.direction {
                        TweenDirection::To => (natural, declared),
                        TweenDirection::From => (declared, natural),
                    };
                    writes.push(StyleWrite::new(
                        spec.target.clone(),
                        index,
                        property,
                        from.lerp(to, eased),
                    ));
                }
            }
        }
        writes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Element, MotionError, Viewport};

    fn layout() -> Layout {
        Layout::new(
            Viewport {
                width: 1000.0,
                height: 1000.0,
            },
            10_000.0,
        )
        .with_element(Element::new(".line", 0.0, 200.0).with_count(3))
        .with_element(Element::new(".scroll-zone", 1000.0, 0.0))
        .with_element(Element::new(".scrolling-text", 0.0, 100.0))
    }

    fn value_of(writes: &[StyleWrite], index: usize, property: Property) -> f64 {
        writes
            .iter()
            .find(|w| w.index == index && w.property == property)
            .and_then(|w| w.value.as_number())
            .unwrap()
    }

    fn scrub_spec(scrub_secs: f64) -> TimelineSpec {
        // "top bottom" .. "bottom top" on a zero-height element at 1000 with
        // a 1000px viewport spans offsets 0..1000.
        TimelineSpec::new("scrub")
            .then(
                AnimationSpec::to(".scrolling-text")
                    .set(Property::XPercent, -50.0)
                    .ease(Ease::Linear)
                    .duration(1.0),
            )
            .scrubbed(TriggerRegion::on_screen(".scroll-zone"), scrub_secs)
    }

    #[test]
    fn stagger_extends_settle_time() {
        let spec = TimelineSpec::new("hero").then(
            AnimationSpec::from(".line")
                .set(Property::Y, 200.0)
                .duration(1.5)
                .stagger(0.1),
        );
        let player = TimelinePlayer::new(&spec, &layout()).unwrap();
        assert!((player.duration() - 1.7).abs() < 1e-9);
    }

    #[test]
    fn from_animations_start_at_declared_value() {
        let spec = TimelineSpec::new("hero").then(
            AnimationSpec::from(".line")
                .set(Property::Opacity, 0.0)
                .ease(Ease::Linear)
                .duration(1.0)
                .stagger(0.5),
        );
        let mut player = TimelinePlayer::new(&spec, &layout()).unwrap();
        assert_eq!(value_of(&player.sample(), 0, Property::Opacity), 0.0);

        // One second into a two second timeline: node 0 done, node 1 half.
        player.play(0.0);
        player.advance(1000.0, 0.0);
        let writes = player.sample();
        assert_eq!(value_of(&writes, 0, Property::Opacity), 1.0);
        assert!((value_of(&writes, 1, Property::Opacity) - 0.5).abs() < 1e-9);
        assert_eq!(value_of(&writes, 2, Property::Opacity), 0.0);
    }

    #[test]
    fn autoplay_completes_once() {
        let spec = TimelineSpec::new("once")
            .then(AnimationSpec::to(".line").set(Property::X, 10.0).duration(1.0));
        let mut player = TimelinePlayer::new(&spec, &layout()).unwrap();

        assert_eq!(player.advance(0.0, 0.0), None);
        assert_eq!(player.play(0.0), Some(TimelineEvent::Started));
        assert_eq!(player.play(10.0), None);
        assert_eq!(player.advance(500.0, 0.0), None);
        assert_eq!(player.advance(1000.0, 0.0), Some(TimelineEvent::Completed));
        assert_eq!(player.advance(1500.0, 0.0), None);
        assert!(player.is_complete());
    }

    #[test]
    fn looping_wraps_to_start() {
        let spec = TimelineSpec::new("marquee")
            .then(
                AnimationSpec::to(".scrolling-text")
                    .set(Property::XPercent, -50.0)
                    .ease(Ease::Linear)
                    .duration(10.0),
            )
            .looping();
        let mut player = TimelinePlayer::new(&spec, &layout()).unwrap();
        player.play(0.0);

        player.advance(7_500.0, 0.0);
        assert!((player.progress() - 0.75).abs() < 1e-9);
        player.advance(12_500.0, 0.0);
        assert!((player.progress() - 0.25).abs() < 1e-9);
        assert!(!player.is_complete());
    }

    #[test]
    fn scrubbing_reverses_exactly() {
        let mut player = TimelinePlayer::new(&scrub_spec(0.0), &layout()).unwrap();
        assert_eq!(
            player.mode(),
            PlayMode::Scrubbed {
                range: ScrollRange::new(0.0, 1000.0),
                scrub_secs: 0.0
            }
        );

        let mut progress = Vec::new();
        for (frame, offset) in [0.0, 500.0, 1000.0, 500.0, 0.0].into_iter().enumerate() {
            player.advance(frame as f64 * 16.0, offset);
            progress.push(player.progress());
        }
        assert_eq!(progress, vec![0.0, 0.5, 1.0, 0.5, 0.0]);
        assert_eq!(value_of(&player.sample(), 0, Property::XPercent), 0.0);
    }

    #[test]
    fn lagged_scrub_catches_up_within_lag() {
        let mut player = TimelinePlayer::new(&scrub_spec(0.5), &layout()).unwrap();
        player.advance(0.0, 1000.0);
        assert_eq!(player.progress(), 0.0);

        player.advance(250.0, 1000.0);
        let midway = player.progress();
        assert!(midway > 0.5 && midway < 1.0);

        player.advance(500.0, 1000.0);
        assert_eq!(player.progress(), 1.0);
    }

    #[test]
    fn lagged_scrub_follows_moving_scroll() {
        let mut player = TimelinePlayer::new(&scrub_spec(0.5), &layout()).unwrap();

        let mut seen = Vec::new();
        for frame in 0..=60 {
            let offset = frame as f64 * 10.0;
            player.advance(frame as f64 * 16.0, offset);
            seen.push((player.progress(), offset / 1000.0));
        }

        for pair in seen.windows(2) {
            let (before, _) = pair[0];
            let (after, target) = pair[1];
            assert!(after > before, "stalled at {before}");
            assert!(after <= target);
        }
        assert!(seen[60].0 > 0.3);
    }

    #[test]
    fn explicit_position_overlaps_entries() {
        let spec = TimelineSpec::new("overlap")
            .then(AnimationSpec::to(".line").set(Property::X, 1.0).duration(1.0))
            .then(
                AnimationSpec::to(".scrolling-text")
                    .set(Property::X, 1.0)
                    .duration(1.0)
                    .at(0.5),
            );
        let player = TimelinePlayer::new(&spec, &layout()).unwrap();
        assert!((player.duration() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn unknown_target_fails_loudly() {
        let spec = TimelineSpec::new("broken").then(AnimationSpec::to(".ghost"));
        let err = TimelinePlayer::new(&spec, &layout()).unwrap_err();
        assert!(matches!(err, MotionError::UnresolvedTarget(ref t) if t == ".ghost"));
    }

    #[test]
    fn timeline_round_trips_json() {
        let spec = scrub_spec(1.0);
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"x_percent\":-50.0"));
        let back: TimelineSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
