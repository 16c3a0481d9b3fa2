//! Scroll triggers.
//!
//! A trigger watches one scroll range and reports crossings of its edges.
//! Ranges are declared relative to an element and the viewport
//! (`"top 50%"` = "element top reaches 50% of the viewport") and resolved to
//! absolute offsets against a [`Layout`] before registration.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Element, Layout, MotionError, Result, Viewport};

/// A point on an element or on the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    Top,
    Center,
    Bottom,
    /// Fraction of the box height, `50%` is `Percent(50.0)`.
    Percent(f64),
    Pixels(f64),
}

impl Anchor {
    /// Distance of the anchor from the top of a box of height `size`.
    pub fn offset_in(self, size: f64) -> f64 {
        match self {
            Self::Top => 0.0,
            Self::Center => size * 0.5,
            Self::Bottom => size,
            Self::Percent(p) => size * p / 100.0,
            Self::Pixels(px) => px,
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "top" => Some(Self::Top),
            "center" => Some(Self::Center),
            "bottom" => Some(Self::Bottom),
            _ => {
                if let Some(p) = token.strip_suffix('%') {
                    p.parse().ok().map(Self::Percent)
                } else if let Some(px) = token.strip_suffix("px") {
                    px.parse().ok().map(Self::Pixels)
                } else {
                    token.parse().ok().map(Self::Pixels)
                }
            }
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => f.write_str("top"),
            Self::Center => f.write_str("center"),
            Self::Bottom => f.write_str("bottom"),
            Self::Percent(p) => write!(f, "{p}%"),
            Self::Pixels(px) => write!(f, "{px}px"),
        }
    }
}

/// `"<element anchor> <viewport anchor>"`, e.g. `"top bottom"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TriggerBound {
    pub element: Anchor,
    pub viewport: Anchor,
}

impl TriggerBound {
    pub const fn new(element: Anchor, viewport: Anchor) -> Self {
        Self { element, viewport }
    }

    /// Scroll offset at which the element anchor meets the viewport anchor.
    pub fn resolve(&self, element: &Element, viewport: &Viewport) -> f64 {
        element.top + self.element.offset_in(element.height)
            - self.viewport.offset_in(viewport.height)
    }
}

impl FromStr for TriggerBound {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || MotionError::InvalidBound(s.to_string());
        let mut tokens = s.split_whitespace();
        let (Some(element), Some(viewport), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(invalid());
        };
        Ok(Self {
            element: Anchor::parse(element).ok_or_else(invalid)?,
            viewport: Anchor::parse(viewport).ok_or_else(invalid)?,
        })
    }
}

impl TryFrom<String> for TriggerBound {
    type Error = MotionError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TriggerBound> for String {
    fn from(value: TriggerBound) -> Self {
        format!("{} {}", value.element, value.viewport)
    }
}

/// Declarative trigger region: which element, and where it starts and ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRegion {
    pub trigger: String,
    #[serde(default = "TriggerRegion::default_start")]
    pub start: TriggerBound,
    #[serde(default = "TriggerRegion::default_end")]
    pub end: TriggerBound,
}

impl TriggerRegion {
    /// Region spanning the whole time the element is on screen.
    pub fn on_screen(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            start: Self::default_start(),
            end: Self::default_end(),
        }
    }

    pub fn between(trigger: impl Into<String>, start: &str, end: &str) -> Result<Self> {
        Ok(Self {
            trigger: trigger.into(),
            start: start.parse()?,
            end: end.parse()?,
        })
    }

    pub fn resolve(&self, layout: &Layout) -> Result<ScrollRange> {
        let element = layout.resolve(&self.trigger)?;
        Ok(ScrollRange::new(
            self.start.resolve(element, &layout.viewport),
            self.end.resolve(element, &layout.viewport),
        ))
    }

    fn default_start() -> TriggerBound {
        TriggerBound::new(Anchor::Top, Anchor::Bottom)
    }

    fn default_end() -> TriggerBound {
        TriggerBound::new(Anchor::Bottom, Anchor::Top)
    }
}

/// Absolute scroll offsets bounding a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollRange {
    pub start: f64,
    pub end: f64,
}

impl ScrollRange {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Zero or negative length ranges can never be entered.
    pub fn is_satisfiable(&self) -> bool {
        self.end > self.start
    }

    /// Linear map of `offset` onto `[0, 1]`, clamped.
    pub fn progress(&self, offset: f64) -> f64 {
        if !self.is_satisfiable() {
            return if offset >= self.end { 1.0 } else { 0.0 };
        }
        ((offset - self.start) / (self.end - self.start)).clamp(0.0, 1.0)
    }

    pub fn phase(&self, offset: f64) -> TriggerPhase {
        if offset < self.start {
            TriggerPhase::Before
        } else if offset > self.end {
            TriggerPhase::After
        } else {
            TriggerPhase::Inside
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerPhase {
    Before,
    Inside,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerEventKind {
    /// Entered while scrolling forward.
    Enter,
    /// Entered while scrolling backward, i.e. from below.
    EnterBack,
    Leave,
    LeaveBack,
}

impl TriggerEventKind {
    pub fn is_enter(self) -> bool {
        matches!(self, Self::Enter | Self::EnterBack)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub id: TriggerId,
    pub kind: TriggerEventKind,
}

pub type TriggerCallback = Box<dyn FnMut(TriggerId)>;

/// Optional hooks run when a trigger fires.
#[derive(Default)]
pub struct TriggerCallbacks {
    pub on_enter: Option<TriggerCallback>,
    pub on_enter_back: Option<TriggerCallback>,
    pub on_leave: Option<TriggerCallback>,
    pub on_leave_back: Option<TriggerCallback>,
}

impl TriggerCallbacks {
    fn run(&mut self, id: TriggerId, kind: TriggerEventKind) {
        let slot = match kind {
            TriggerEventKind::Enter => &mut self.on_enter,
            TriggerEventKind::EnterBack => &mut self.on_enter_back,
            TriggerEventKind::Leave => &mut self.on_leave,
            TriggerEventKind::LeaveBack => &mut self.on_leave_back,
        };
        if let Some(callback) = slot.as_mut() {
            callback(id);
        }
    }
}

struct Trigger {
    id: TriggerId,
    range: ScrollRange,
    phase: TriggerPhase,
    callbacks: TriggerCallbacks,
}

#[derive(Default)]
pub struct TriggerRegistry {
    triggers: Vec<Trigger>,
    next_id: u64,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<E, B>(&mut self, range: ScrollRange, on_enter: E, on_enter_back: B) -> TriggerId
    where
        E: FnMut(TriggerId) + 'static,
        B: FnMut(TriggerId) + 'static,
    {
        self.register_with(
            range,
            TriggerCallbacks {
                on_enter: Some(Box::new(on_enter)),
                on_enter_back: Some(Box::new(on_enter_back)),
                ..Default::default()
            },
        )
    }

    /// Registers a trigger that only reports through [`evaluate`](Self::evaluate).
    pub fn watch(&mut self, range: ScrollRange) -> TriggerId {
        self.register_with(range, TriggerCallbacks::default())
    }

    pub fn register_with(&mut self, range: ScrollRange, callbacks: TriggerCallbacks) -> TriggerId {
        let id = TriggerId(self.next_id);
        self.next_id += 1;
        self.triggers.push(Trigger {
            id,
            range,
            phase: TriggerPhase::Before,
            callbacks,
        });
        id
    }

    pub fn remove(&mut self, id: TriggerId) -> bool {
        let before = self.triggers.len();
        self.triggers.retain(|trigger| trigger.id != id);
        before != self.triggers.len()
    }

    pub fn clear(&mut self) {
        self.triggers.clear();
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn range(&self, id: TriggerId) -> Option<ScrollRange> {
        self.find(id).map(|trigger| trigger.range)
    }

    pub fn phase(&self, id: TriggerId) -> Option<TriggerPhase> {
        self.find(id).map(|trigger| trigger.phase)
    }

    /// Replaces the range after a layout change. The current phase is kept
    /// until the next evaluation.
    pub fn set_range(&mut self, id: TriggerId, range: ScrollRange) -> bool {
        match self.triggers.iter_mut().find(|trigger| trigger.id == id) {
            Some(trigger) => {
                trigger.range = range;
                true
            }
            None => false,
        }
    }

    /// Compares every trigger against `offset`, runs callbacks for crossings
    /// and returns the fired events in registration order.
    pub fn evaluate(&mut self, offset: f64) -> Vec<TriggerEvent> {
        let mut events = Vec::new();
        for trigger in &mut self.triggers {
            let next = trigger.range.phase(offset);
            if next == trigger.phase {
                continue;
            }
            let previous = std::mem::replace(&mut trigger.phase, next);
            if !trigger.range.is_satisfiable() {
                continue;
            }

            for &kind in crossing(previous, next) {
                debug!(id = trigger.id.0, ?kind, offset, "trigger fired");
                trigger.callbacks.run(trigger.id, kind);
                events.push(TriggerEvent {
                    id: trigger.id,
                    kind,
                });
            }
        }
        events
    }

    fn find(&self, id: TriggerId) -> Option<&Trigger> {
        self.triggers.iter().find(|trigger| trigger.id == id)
    }
}

fn crossing(from: TriggerPhase, to: TriggerPhase) -> &'static [TriggerEventKind] {
    use TriggerEventKind::*;
    use TriggerPhase::*;

    match (from, to) {
        (Before, Inside) => &[Enter],
        (Before, After) => &[Enter, Leave],
        (Inside, After) => &[Leave],
        (Inside, Before) => &[LeaveBack],
        (After, Inside) => &[EnterBack],
        (After, Before) => &[EnterBack, LeaveBack],
        _ => &[],
    }
}

impl fmt::Debug for TriggerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerRegistry")
            .field("triggers", &self.triggers.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use proptest::prelude::*;

    use super::*;

    fn kinds(events: &[TriggerEvent]) -> Vec<TriggerEventKind> {
        events.iter().map(|event| event.kind).collect()
    }

    #[test]
    fn direction_decides_enter_or_enter_back() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let enter_log = log.clone();
        let back_log = log.clone();
        let mut registry = TriggerRegistry::new();
        registry.register(
            ScrollRange::new(0.0, 1.0),
            move |_| enter_log.borrow_mut().push("enter"),
            move |_| back_log.borrow_mut().push("enter_back"),
        );

        assert!(registry.evaluate(-1.0).is_empty());
        assert_eq!(
            kinds(&registry.evaluate(0.6)),
            vec![TriggerEventKind::Enter]
        );
        assert_eq!(
            kinds(&registry.evaluate(1.2)),
            vec![TriggerEventKind::Leave]
        );
        assert_eq!(
            kinds(&registry.evaluate(0.6)),
            vec![TriggerEventKind::EnterBack]
        );
        assert_eq!(*log.borrow(), vec!["enter", "enter_back"]);
    }

    #[test]
    fn staying_inside_fires_once() {
        let hits = Rc::new(RefCell::new(0));
        let counter = hits.clone();
        let mut registry = TriggerRegistry::new();
        registry.register(
            ScrollRange::new(100.0, 200.0),
            move |_| *counter.borrow_mut() += 1,
            |_| {},
        );

        for offset in [120.0, 150.0, 150.0, 199.0, 100.0] {
            registry.evaluate(offset);
        }
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn jumping_over_a_region_enters_and_leaves() {
        let mut registry = TriggerRegistry::new();
        registry.watch(ScrollRange::new(100.0, 200.0));

        assert_eq!(
            kinds(&registry.evaluate(500.0)),
            vec![TriggerEventKind::Enter, TriggerEventKind::Leave]
        );
        assert_eq!(
            kinds(&registry.evaluate(0.0)),
            vec![TriggerEventKind::EnterBack, TriggerEventKind::LeaveBack]
        );
    }

    #[test]
    fn zero_height_region_never_fires() {
        let mut registry = TriggerRegistry::new();
        registry.watch(ScrollRange::new(300.0, 300.0));
        for offset in [0.0, 300.0, 600.0, 300.0, 0.0] {
            assert!(registry.evaluate(offset).is_empty());
        }
    }

    #[test]
    fn removed_triggers_are_ignored() {
        let mut registry = TriggerRegistry::new();
        let id = registry.watch(ScrollRange::new(0.0, 10.0));
        assert!(registry.remove(id));
        assert!(registry.evaluate(5.0).is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn bounds_parse_and_resolve() {
        let layout = Layout::new(
            Viewport {
                width: 1000.0,
                height: 800.0,
            },
            6000.0,
        )
        .with_element(Element::new(".manifesto-section", 2000.0, 1000.0));

        let region = TriggerRegion::between(".manifesto-section", "top 50%", "bottom 50%").unwrap();
        let range = region.resolve(&layout).unwrap();
        assert_eq!(range, ScrollRange::new(1600.0, 2600.0));

        let on_screen = TriggerRegion::on_screen(".manifesto-section")
            .resolve(&layout)
            .unwrap();
        assert_eq!(on_screen, ScrollRange::new(1200.0, 3000.0));

        let pixels: TriggerBound = "center 120px".parse().unwrap();
        assert_eq!(pixels.viewport, Anchor::Pixels(120.0));
        assert!("top".parse::<TriggerBound>().is_err());
        assert!("top middle".parse::<TriggerBound>().is_err());
    }

    #[test]
    fn region_with_unknown_trigger_fails() {
        let layout = Layout::new(Viewport::default(), 1000.0);
        let err = TriggerRegion::on_screen(".nope").resolve(&layout).unwrap_err();
        assert!(matches!(err, MotionError::UnresolvedTarget(_)));
    }

    #[test]
    fn progress_is_clamped_linear_map() {
        let range = ScrollRange::new(0.0, 1000.0);
        let progress: Vec<f64> = [0.0, 500.0, 1000.0, 500.0, 0.0]
            .into_iter()
            .map(|offset| range.progress(offset))
            .collect();
        assert_eq!(progress, vec![0.0, 0.5, 1.0, 0.5, 0.0]);
        assert_eq!(range.progress(-50.0), 0.0);
        assert_eq!(range.progress(1500.0), 1.0);
    }

    proptest! {
        #[test]
        fn enters_and_leaves_alternate(offsets in proptest::collection::vec(-2.0f64..3.0, 1..64)) {
            let mut registry = TriggerRegistry::new();
            registry.watch(ScrollRange::new(0.0, 1.0));

            let mut inside = false;
            let mut last_phase = TriggerPhase::Before;
            for offset in offsets {
                for event in registry.evaluate(offset) {
                    prop_assert_ne!(event.kind.is_enter(), inside);
                    if event.kind == TriggerEventKind::Enter {
                        prop_assert_eq!(last_phase, TriggerPhase::Before);
                    }
                    if event.kind == TriggerEventKind::EnterBack {
                        prop_assert_eq!(last_phase, TriggerPhase::After);
                    }
                    inside = event.kind.is_enter();
                }
                last_phase = ScrollRange::new(0.0, 1.0).phase(offset);
                prop_assert_eq!(inside, last_phase == TriggerPhase::Inside);
            }
        }
    }
}
