//! Core library for the stagefx scroll motion engine.
//!
//! One [`MotionStage`] owns every moving part of a page: the frame clock, the
//! smoothed scroll source, scroll triggers, timelines, the preloader and the
//! fast-scroll distortion. Hosts feed it [`InputEvent`]s and timestamps and
//! apply the [`StyleWrite`]s each frame returns.

pub mod clock;
pub mod config;
pub mod cursor;
pub mod ease;
pub mod error;
pub mod layout;
pub mod preloader;
pub mod reveal;
pub mod scene;
pub mod scroll;
pub mod stage;
pub mod style;
pub mod timeline;
pub mod trigger;
pub mod tween;
pub mod velocity;

pub use clock::{CallbackId, FrameClock, FrameControl, FrameTick};
pub use config::{
    CursorConfig, IncrementPolicy, PreloaderConfig, ScrollConfig, SiteConfig, ThemeConfig,
    VelocityConfig,
};
pub use cursor::{CursorFollower, CursorTargets};
pub use ease::{Ease, EaseMode};
pub use error::{MotionError, Result};
pub use layout::{Element, Layout, Viewport};
pub use preloader::{Preloader, PreloaderEvent, PreloaderPhase};
pub use reveal::{RevealEvent, RevealId, RevealObserver};
pub use scene::{artist_layout, RevealSpec, SceneSpec, ThemeSection};
pub use scroll::{ScrollDirection, ScrollSample, ScrollSource};
pub use stage::{FrameOutput, InputEvent, MotionStage, StageEvent, TimedInput};
pub use style::{Property, Rgb, StyleWrite, Value};
pub use timeline::{
    AnimationSpec, PlayMode, Repeat, ScrollBinding, TimelineEvent, TimelinePlayer, TimelineSpec,
    TweenDirection,
};
pub use trigger::{
    Anchor, ScrollRange, TriggerBound, TriggerCallbacks, TriggerEvent, TriggerEventKind,
    TriggerId, TriggerPhase, TriggerRegion, TriggerRegistry,
};
pub use tween::{Transition, TweenSet};
pub use velocity::{Distortion, VelocityEffect};
