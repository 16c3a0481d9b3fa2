//! The motion stage: owns every component and runs them in a fixed order.
//!
//! Per frame: clock → scroll source → preloader → triggers and reveal
//! observers → velocity effect → timelines → tweens → frame subscribers.
//! Every component reads the same [`ScrollSample`], so a frame never mixes
//! two scroll positions.
//!
//! Section themes, reveal observers and scroll-bound timelines stay dormant
//! until the preloader reports [`PreloaderEvent::Revealed`]. The cursor,
//! the velocity effect and ambient autoplay timelines run from the start.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    CallbackId, CursorFollower, Distortion, FrameClock, FrameControl, FrameTick, Layout,
    Preloader, PreloaderEvent, PreloaderPhase, Property, Result, RevealId, RevealObserver, Rgb,
    SceneSpec, ScrollRange, ScrollSample, ScrollSource, SiteConfig, StyleWrite, TimelineEvent,
    TimelinePlayer, TimelineSpec, Transition, TriggerEvent, TriggerId, TriggerRegion,
    TriggerRegistry, TweenSet, Value, VelocityEffect, Viewport,
};

/// Host events fed into the stage between frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Native scroll position report.
    Scroll { offset: f64 },
    Wheel { delta: f64 },
    Resize { width: f64, height: f64 },
    MouseMove { x: f64, y: f64 },
}

/// An input event scheduled at a point in a scripted session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedInput {
    pub at_ms: f64,
    pub event: InputEvent,
}

/// Something observable that happened during a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageEvent {
    Preloader { event: PreloaderEvent },
    ThemeChanged {
        section: String,
        background: Rgb,
        text: Rgb,
    },
    /// A trigger registered through [`MotionStage::triggers_mut`] fired.
    Trigger { event: TriggerEvent },
    Revealed { target: String },
    TimelineStarted { name: String },
    TimelineCompleted { name: String },
}

/// Everything one frame produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    pub tick: FrameTick,
    pub sample: ScrollSample,
    pub events: Vec<StageEvent>,
    pub writes: Vec<StyleWrite>,
}

#[derive(Debug)]
struct ScenePlayer {
    region: Option<TriggerRegion>,
    player: TimelinePlayer,
}

impl ScenePlayer {
    fn new(spec: &TimelineSpec, layout: &Layout) -> Result<Self> {
        Ok(Self {
            region: spec.scroll.as_ref().map(|binding| binding.region.clone()),
            player: TimelinePlayer::new(spec, layout)?,
        })
    }
}

#[derive(Debug)]
struct ThemeBinding {
    /// Registered once the page is revealed.
    trigger: Option<TriggerId>,
    section: String,
    region: TriggerRegion,
    range: ScrollRange,
    background: Rgb,
    text: Rgb,
}

#[derive(Debug)]
struct RevealBinding {
    id: RevealId,
    target: String,
    player: ScenePlayer,
}

#[derive(Debug)]
pub struct MotionStage {
    config: SiteConfig,
    layout: Layout,
    scene_name: String,
    clock: FrameClock,
    scroll: ScrollSource,
    triggers: TriggerRegistry,
    themes: Vec<ThemeBinding>,
    reveal_observer: RevealObserver,
    reveals: Vec<RevealBinding>,
    intro: Vec<ScenePlayer>,
    timelines: Vec<ScenePlayer>,
    tweens: TweenSet,
    preloader: Preloader,
    velocity: VelocityEffect,
    last_distortion: Option<Distortion>,
    glitch_targets: Vec<String>,
    cursor: Option<CursorFollower>,
    now_ms: f64,
    started: bool,
    live: bool,
}

impl MotionStage {
    /// Resolves the whole scene against `layout`.
    ///
    /// Fails with [`MotionError::UnresolvedTarget`](crate::MotionError) if any
    /// selector is missing, before anything runs.
    pub fn new(config: SiteConfig, scene: &SceneSpec, layout: Layout) -> Result<Self> {
        config.validate()?;
        for selector in scene.selectors() {
            layout.resolve(selector)?;
        }
        layout.resolve(&config.preloader.target)?;
        if !scene.themes.is_empty() {
            layout.resolve(&config.theme.target)?;
        }

        let mut themes = Vec::with_capacity(scene.themes.len());
        for theme in &scene.themes {
            themes.push(ThemeBinding {
                trigger: None,
                section: theme.region.trigger.clone(),
                region: theme.region.clone(),
                range: theme.region.resolve(&layout)?,
                background: theme.background,
                text: theme.text,
            });
        }

        let mut reveal_observer = RevealObserver::new();
        let mut reveals = Vec::with_capacity(scene.reveals.len());
        for reveal in &scene.reveals {
            let element = layout.resolve(&reveal.target)?.clone();
            reveals.push(RevealBinding {
                id: reveal_observer.observe(element, reveal.threshold, reveal.once),
                target: reveal.target.clone(),
                player: ScenePlayer::new(&reveal.timeline, &layout)?,
            });
        }

        let intro = scene
            .intro
            .iter()
            .map(|spec| ScenePlayer::new(spec, &layout))
            .collect::<Result<Vec<_>>>()?;
        let timelines = scene
            .timelines
            .iter()
            .map(|spec| ScenePlayer::new(spec, &layout))
            .collect::<Result<Vec<_>>>()?;

        let mut scroll = ScrollSource::new(config.scroll.clone());
        scroll.set_limit(layout.max_scroll());

        let cursor = scene
            .cursor
            .clone()
            .map(|targets| CursorFollower::new(config.cursor.clone(), targets));

        info!(
            scene = %scene.name,
            intro = intro.len(),
            timelines = timelines.len(),
            themes = themes.len(),
            reveals = reveals.len(),
            "stage ready"
        );

        Ok(Self {
            preloader: Preloader::new(config.preloader.clone()),
            velocity: VelocityEffect::new(config.velocity.clone()),
            config,
            layout,
            scene_name: scene.name.clone(),
            clock: FrameClock::new(),
            scroll,
            triggers: TriggerRegistry::new(),
            themes,
            reveal_observer,
            reveals,
            intro,
            timelines,
            tweens: TweenSet::new(),
            last_distortion: None,
            glitch_targets: scene.glitch_targets.clone(),
            cursor,
            now_ms: 0.0,
            started: false,
            live: false,
        })
    }

    pub fn scene_name(&self) -> &str {
        &self.scene_name
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn preloader(&self) -> &Preloader {
        &self.preloader
    }

    pub fn scroll(&self) -> &ScrollSource {
        &self.scroll
    }

    /// True once the preloader has revealed the page.
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Extra triggers; their crossings surface as [`StageEvent::Trigger`].
    pub fn triggers_mut(&mut self) -> &mut TriggerRegistry {
        &mut self.triggers
    }

    /// Name, mode and length of every timeline the stage owns.
    pub fn timelines(&self) -> impl Iterator<Item = &TimelinePlayer> {
        self.intro
            .iter()
            .chain(&self.timelines)
            .chain(self.reveals.iter().map(|reveal| &reveal.player))
            .map(|scene| &scene.player)
    }

    /// Runs `callback` at the end of every frame until it returns
    /// [`FrameControl::Stop`] or is removed.
    pub fn on_frame<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&FrameTick) -> FrameControl + 'static,
    {
        self.clock.register(callback)
    }

    pub fn remove_frame_callback(&mut self, id: CallbackId) -> bool {
        self.clock.unregister(id)
    }

    /// Starts the preloader and any autoplay timeline outside the intro.
    pub fn start(&mut self, now_ms: f64) -> Vec<StageEvent> {
        if self.started {
            return Vec::new();
        }
        self.started = true;
        self.now_ms = now_ms;
        self.preloader.start(now_ms);
        info!(now_ms, "stage started");

        let mut events = Vec::new();
        for scene in &mut self.timelines {
            if let Some(TimelineEvent::Started) = scene.player.play(now_ms) {
                events.push(StageEvent::TimelineStarted {
                    name: scene.player.name().to_string(),
                });
            }
        }
        events
    }

    pub fn handle(&mut self, event: InputEvent) -> Result<()> {
        match event {
            InputEvent::Scroll { offset } => self.scroll.set_raw(offset),
            InputEvent::Wheel { delta } => self.scroll.scroll_by(delta),
            InputEvent::Resize { width, height } => {
                self.layout.set_viewport(Viewport { width, height });
                self.refresh()?;
            }
            InputEvent::MouseMove { x, y } => {
                if let Some(cursor) = self.cursor.as_mut() {
                    cursor.on_move(x, y, self.now_ms, &mut self.tweens);
                }
            }
        }
        Ok(())
    }

    /// Re-resolves every scroll range against the current layout.
    pub fn refresh(&mut self) -> Result<()> {
        self.scroll.set_limit(self.layout.max_scroll());
        for theme in &mut self.themes {
            theme.range = theme.region.resolve(&self.layout)?;
            if let Some(id) = theme.trigger {
                self.triggers.set_range(id, theme.range);
            }
        }
        let players = self
            .intro
            .iter_mut()
            .chain(&mut self.timelines)
            .chain(self.reveals.iter_mut().map(|reveal| &mut reveal.player));
        for scene in players {
            if let Some(region) = &scene.region {
                scene.player.set_range(region.resolve(&self.layout)?);
            }
        }
        debug!(viewport = ?self.layout.viewport, "stage refreshed");
        Ok(())
    }

    /// Runs one frame.
    pub fn frame(&mut self, now_ms: f64) -> FrameOutput {
        self.now_ms = now_ms;
        let tick = self.clock.advance(now_ms);
        let sample = self.scroll.advance(now_ms);
        let offset = sample.smoothed_offset;
        let mut events = Vec::new();
        let mut writes = Vec::new();

        self.run_preloader(now_ms, &mut events, &mut writes);

        for event in self.triggers.evaluate(offset) {
            self.on_trigger(event, now_ms, &mut events);
        }

        let reveals = if self.live {
            self.reveal_observer.evaluate(offset, &self.layout.viewport)
        } else {
            Vec::new()
        };
        for event in reveals {
            if !event.visible {
                continue;
            }
            if let Some(reveal) = self.reveals.iter_mut().find(|reveal| reveal.id == event.id) {
                events.push(StageEvent::Revealed {
                    target: reveal.target.clone(),
                });
                if let Some(TimelineEvent::Started) = reveal.player.player.play(now_ms) {
                    events.push(StageEvent::TimelineStarted {
                        name: reveal.player.player.name().to_string(),
                    });
                }
            }
        }

        self.run_velocity(&sample, now_ms);

        let live = self.live;
        let players = self
            .intro
            .iter_mut()
            .chain(&mut self.timelines)
            .chain(self.reveals.iter_mut().map(|reveal| &mut reveal.player));
        for scene in players {
            if !live && scene.region.is_some() {
                continue;
            }
            if let Some(TimelineEvent::Completed) = scene.player.advance(now_ms, offset) {
                events.push(StageEvent::TimelineCompleted {
                    name: scene.player.name().to_string(),
                });
            }
            writes.extend(scene.player.sample());
        }

        writes.extend(self.tweens.sample(now_ms));
        self.clock.dispatch(&tick);

        FrameOutput {
            tick,
            sample,
            events,
            writes,
        }
    }

    fn on_trigger(&mut self, event: TriggerEvent, now_ms: f64, events: &mut Vec<StageEvent>) {
        let Some(theme) = self
            .themes
            .iter()
            .find(|theme| theme.trigger == Some(event.id))
        else {
            events.push(StageEvent::Trigger { event });
            return;
        };
        if !event.kind.is_enter() {
            return;
        }

        let transition = Transition::new(self.config.theme.duration_secs, self.config.theme.ease);
        let target = &self.config.theme.target;
        self.tweens.to(
            target,
            0,
            Property::BackgroundColor,
            theme.background,
            transition,
            now_ms,
        );
        self.tweens
            .to(target, 0, Property::Color, theme.text, transition, now_ms);
        events.push(StageEvent::ThemeChanged {
            section: theme.section.clone(),
            background: theme.background,
            text: theme.text,
        });
    }

    fn run_preloader(
        &mut self,
        now_ms: f64,
        events: &mut Vec<StageEvent>,
        writes: &mut Vec<StyleWrite>,
    ) {
        let updates = self.preloader.update(now_ms);
        let revealed_now = updates.contains(&PreloaderEvent::Revealed);
        events.extend(
            updates
                .into_iter()
                .map(|event| StageEvent::Preloader { event }),
        );

        if self.preloader.phase() == PreloaderPhase::Revealing || revealed_now {
            writes.push(StyleWrite::new(
                self.config.preloader.target.clone(),
                0,
                Property::YPercent,
                Value::Number(self.preloader.overlay_offset(now_ms)),
            ));
        }

        if revealed_now {
            self.go_live(now_ms, events);
        }
    }

    /// Starts the intro and arms every scroll effect. A section the page is
    /// already scrolled into fires its enter on this same frame.
    fn go_live(&mut self, now_ms: f64, events: &mut Vec<StageEvent>) {
        self.live = true;
        for theme in &mut self.themes {
            theme.trigger = Some(self.triggers.watch(theme.range));
        }
        for scene in &mut self.intro {
            if let Some(TimelineEvent::Started) = scene.player.play(now_ms) {
                events.push(StageEvent::TimelineStarted {
                    name: scene.player.name().to_string(),
                });
            }
        }
        info!(now_ms, themes = self.themes.len(), "stage live");
    }

    fn run_velocity(&mut self, sample: &ScrollSample, now_ms: f64) {
        let distortion = self.velocity.observe(sample);
        if self.last_distortion == Some(distortion) {
            return;
        }
        self.last_distortion = Some(distortion);

        let transition = distortion.transition();
        for target in &self.glitch_targets {
            self.tweens.to(
                target,
                0,
                Property::SkewY,
                distortion.skew_y,
                transition,
                now_ms,
            );
            self.tweens.to(
                target,
                0,
                Property::HueRotate,
                distortion.hue_rotate,
                transition,
                now_ms,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;
    use crate::{artist_layout, Element, MotionError, ScrollRange, TriggerEventKind};

    fn stage() -> MotionStage {
        let scene = SceneSpec::artist_site().unwrap();
        MotionStage::new(SiteConfig::default(), &scene, artist_layout()).unwrap()
    }

    fn write_for<'a>(
        writes: &'a [StyleWrite],
        target: &str,
        property: Property,
    ) -> Option<&'a Value> {
        writes
            .iter()
            .find(|w| w.target == target && w.index == 0 && w.property == property)
            .map(|w| &w.value)
    }

    #[test]
    fn missing_selector_fails_at_construction() {
        let scene = SceneSpec::artist_site().unwrap();
        let layout = Layout::new(Viewport::default(), 5000.0)
            .with_element(Element::new(".loader", 0.0, 900.0));
        let err = MotionStage::new(SiteConfig::default(), &scene, layout).unwrap_err();
        assert!(matches!(err, MotionError::UnresolvedTarget(_)));
    }

    #[test]
    fn hero_waits_for_preloader() {
        let mut stage = stage();
        stage.start(0.0);

        let early = stage.frame(500.0);
        assert_eq!(
            write_for(&early.writes, ".line", Property::Opacity),
            Some(&Value::Number(0.0))
        );

        let mut started_at = None;
        let mut now = 500.0;
        while now < 3000.0 {
            now += 20.0;
            let output = stage.frame(now);
            let started = output.events.iter().any(|event| {
                matches!(event, StageEvent::TimelineStarted { name } if name == "hero")
            });
            if started {
                started_at = Some(now);
            }
        }
        assert_eq!(started_at, Some(1800.0));
        assert_eq!(stage.preloader().phase(), PreloaderPhase::Revealed);
    }

    #[test]
    fn entering_a_section_recolours_the_page() {
        let mut stage = stage();
        stage.start(0.0);
        stage.frame(0.0);
        // #about is centred from 1650 to 2550.
        stage.handle(InputEvent::Scroll { offset: 2000.0 }).unwrap();

        let mut changed = Vec::new();
        let mut now = 0.0;
        for _ in 0..120 {
            now += 16.0;
            for event in stage.frame(now).events {
                if let StageEvent::ThemeChanged { section, .. } = event {
                    changed.push(section);
                }
            }
        }
        assert_eq!(changed, vec![".manifesto-section", "#about"]);
    }

    #[test]
    fn scroll_effects_wait_for_reveal() {
        let mut stage = stage();
        stage.start(0.0);
        stage.handle(InputEvent::Scroll { offset: 4000.0 }).unwrap();

        let mut revealed_at = None;
        let mut themes = Vec::new();
        let mut now = 0.0;
        while now <= 2500.0 {
            let output = stage.frame(now);
            if !stage.is_live() {
                assert!(output.writes.iter().all(|w| w.target != ".tour-card"));
                assert!(output.writes.iter().all(|w| w.target != ".scrolling-text"));
            }
            for event in output.events {
                match event {
                    StageEvent::Preloader {
                        event: PreloaderEvent::Revealed,
                    } => revealed_at = Some(now),
                    StageEvent::ThemeChanged { section, .. } => {
                        assert!(revealed_at.is_some(), "{section} recoloured while loading");
                        themes.push((now, section));
                    }
                    _ => {}
                }
            }
            now += 20.0;
        }

        // .crowd-section spans 3950..4950 once centred.
        assert_eq!(revealed_at, Some(1800.0));
        let last = themes.last().unwrap();
        assert_eq!(last, &(1800.0, ".crowd-section".to_string()));
        assert_eq!(
            stage.tweens.current("body", 0, Property::BackgroundColor),
            Value::Color(Rgb::new(0x25, 0x63, 0xeb))
        );
    }

    #[test]
    fn fast_scroll_distorts_glitch_target() {
        let mut stage = stage();
        stage.frame(0.0);
        stage.handle(InputEvent::Scroll { offset: 3000.0 }).unwrap();

        let output = stage.frame(16.0);
        assert!(output.sample.delta > 15.0);
        let skew = write_for(&output.writes, ".glitch-target", Property::SkewY);
        assert!(skew.is_some());
        assert!(stage.tweens.is_animating());
    }

    #[test]
    fn custom_triggers_surface_as_events() {
        let mut stage = stage();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let id = stage.triggers_mut().register(
            ScrollRange::new(100.0, 200.0),
            move |_| counter.set(counter.get() + 1),
            |_| {},
        );

        stage.handle(InputEvent::Scroll { offset: 150.0 }).unwrap();
        let mut seen = Vec::new();
        for frame in 0..100 {
            for event in stage.frame(frame as f64 * 16.0).events {
                if let StageEvent::Trigger { event } = event {
                    seen.push(event);
                }
            }
        }
        assert_eq!(
            seen,
            vec![TriggerEvent {
                id,
                kind: TriggerEventKind::Enter
            }]
        );
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn frame_callbacks_run_after_the_frame() {
        let mut stage = stage();
        let frames = Rc::new(Cell::new(0));
        let counter = frames.clone();
        let id = stage.on_frame(move |_| {
            counter.set(counter.get() + 1);
            FrameControl::Continue
        });

        stage.frame(0.0);
        stage.frame(16.0);
        assert!(stage.remove_frame_callback(id));
        stage.frame(32.0);
        assert_eq!(frames.get(), 2);
    }

    #[test]
    fn resize_moves_scroll_ranges() {
        let mut stage = stage();
        let before: Vec<_> = stage.timelines().map(|player| player.mode()).collect();
        stage
            .handle(InputEvent::Resize {
                width: 390.0,
                height: 844.0,
            })
            .unwrap();
        let after: Vec<_> = stage.timelines().map(|player| player.mode()).collect();
        assert_ne!(before, after);
        assert_eq!(stage.layout().max_scroll(), 7300.0 - 844.0);
    }

    #[test]
    fn mouse_moves_drive_the_cursor() {
        let mut stage = stage();
        stage.frame(0.0);
        stage
            .handle(InputEvent::MouseMove { x: 640.0, y: 360.0 })
            .unwrap();
        let output = stage.frame(400.0);
        assert_eq!(
            write_for(&output.writes, ".cursor-follower", Property::X),
            Some(&Value::Number(640.0))
        );
    }
}
