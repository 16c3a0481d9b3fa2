//! Declarative description of everything that moves on the page.
//!
//! A [`SceneSpec`] is pure data: timelines, theme sections, reveal
//! observers and effect targets, all keyed by selector. The stage resolves it
//! against a [`Layout`] once at startup.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    AnimationSpec, CursorTargets, Ease, EaseMode, Element, Layout, Property, Result, Rgb,
    TimelineSpec, TriggerRegion, Viewport,
};

/// A section that recolours the page while it is centred in the viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeSection {
    pub region: TriggerRegion,
    pub background: Rgb,
    pub text: Rgb,
}

impl ThemeSection {
    /// Active while the section covers the middle of the viewport.
    pub fn centred(section: &str, background: Rgb, text: Rgb) -> Result<Self> {
        Ok(Self {
            region: TriggerRegion::between(section, "top 50%", "bottom 50%")?,
            background,
            text,
        })
    }
}

/// Plays a timeline the first time (or every time) a target becomes visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealSpec {
    pub target: String,
    #[serde(default = "RevealSpec::default_threshold")]
    pub threshold: f64,
    #[serde(default = "RevealSpec::default_once")]
    pub once: bool,
    pub timeline: TimelineSpec,
}

impl RevealSpec {
    fn default_threshold() -> f64 {
        0.2
    }

    fn default_once() -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSpec {
    pub name: String,
    /// Autoplay timelines started once the preloader has revealed the page.
    #[serde(default)]
    pub intro: Vec<TimelineSpec>,
    /// Scroll-bound timelines, plus autoplay ones that start immediately.
    #[serde(default)]
    pub timelines: Vec<TimelineSpec>,
    #[serde(default)]
    pub themes: Vec<ThemeSection>,
    #[serde(default)]
    pub reveals: Vec<RevealSpec>,
    /// Elements that skew and hue-shift on fast scrolls.
    #[serde(default)]
    pub glitch_targets: Vec<String>,
    #[serde(default)]
    pub cursor: Option<CursorTargets>,
}

impl SceneSpec {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Every selector the scene refers to, in declaration order.
    pub fn selectors(&self) -> Vec<&str> {
        let mut selectors = Vec::new();
        let timelines = self
            .intro
            .iter()
            .chain(&self.timelines)
            .chain(self.reveals.iter().map(|reveal| &reveal.timeline));
        for timeline in timelines {
            selectors.extend(timeline.entries.iter().map(|entry| entry.target.as_str()));
            if let Some(binding) = &timeline.scroll {
                selectors.push(binding.region.trigger.as_str());
            }
        }
        selectors.extend(self.themes.iter().map(|theme| theme.region.trigger.as_str()));
        selectors.extend(self.reveals.iter().map(|reveal| reveal.target.as_str()));
        selectors.extend(self.glitch_targets.iter().map(String::as_str));
        if let Some(cursor) = &self.cursor {
            selectors.push(cursor.dot.as_str());
            selectors.push(cursor.follower.as_str());
        }
        selectors
    }

    /// The artist landing page: hero title, marquee, parallax, tour cards,
    /// crowd text, section colours and the about reveal.
    pub fn artist_site() -> Result<Self> {
        let power3_out = Ease::power(3, EaseMode::Out);

        let hero = TimelineSpec::new("hero").then(
            AnimationSpec::from(".line")
                .set(Property::Y, 200.0)
                .set(Property::SkewY, 10.0)
                .set(Property::Opacity, 0.0)
                .duration(1.5)
                .stagger(0.1)
                .ease(power3_out),
        );

        let manifesto_marquee = TimelineSpec::new("manifesto-marquee")
            .then(
                AnimationSpec::to(".scrolling-text")
                    .set(Property::XPercent, -50.0)
                    .ease(Ease::Linear),
            )
            .scrubbed(TriggerRegion::on_screen(".manifesto-section"), 0.5);

        let parallax = |name: &str, image: &str| {
            TimelineSpec::new(name)
                .then(
                    AnimationSpec::to(image)
                        .set(Property::YPercent, 20.0)
                        .ease(Ease::Linear),
                )
                .scrubbed(TriggerRegion::on_screen(image), 0.0)
        };

        let tour_cards = TimelineSpec::new("tour-cards")
            .then(
                AnimationSpec::from(".tour-card")
                    .set(Property::Y, 100.0)
                    .set(Property::Opacity, 0.0)
                    .set(Property::Rotation, 5.0)
                    .stagger(0.3),
            )
            .scrubbed(
                TriggerRegion::between(".cards-container", "top 70%", "bottom center")?,
                1.0,
            );

        let crowd_text = TimelineSpec::new("crowd-text")
            .then(
                AnimationSpec::from(".crowd-text")
                    .set(Property::Scale, 0.5)
                    .set(Property::Opacity, 0.0),
            )
            .scrubbed(
                TriggerRegion::between(".crowd-section", "top center", "center center")?,
                0.0,
            );

        let ticker = TimelineSpec::new("gallery-ticker")
            .then(
                AnimationSpec::to(".marquee-track")
                    .set(Property::XPercent, -50.0)
                    .duration(20.0)
                    .ease(Ease::Linear),
            )
            .looping();

        let about = RevealSpec {
            target: "#about".to_string(),
            threshold: 0.2,
            once: true,
            timeline: TimelineSpec::new("about-reveal").then(
                AnimationSpec::from(".about-text")
                    .set(Property::Y, 80.0)
                    .set(Property::Opacity, 0.0)
                    .duration(1.0)
                    .ease(power3_out),
            ),
        };

        let white = Rgb::WHITE;
        Ok(Self {
            name: "artist-site".to_string(),
            intro: vec![hero],
            timelines: vec![
                manifesto_marquee,
                parallax("manifesto-parallax", ".manifesto-image"),
                parallax("tour-parallax", ".tour-image"),
                tour_cards,
                crowd_text,
                ticker,
            ],
            themes: vec![
                ThemeSection::centred(".manifesto-section", Rgb::new(0x0a, 0x0a, 0x0a), white)?,
                ThemeSection::centred("#about", Rgb::new(0x05, 0x05, 0x05), white)?,
                ThemeSection::centred(".crowd-section", Rgb::new(0x25, 0x63, 0xeb), white)?,
                ThemeSection::centred("#gallery", Rgb::new(0x08, 0x08, 0x08), white)?,
                ThemeSection::centred(
                    "#contact",
                    Rgb::new(0xf5, 0xf5, 0xf5),
                    Rgb::new(0x05, 0x05, 0x05),
                )?,
            ],
            reveals: vec![about],
            glitch_targets: vec![".glitch-target".to_string()],
            cursor: Some(CursorTargets::default()),
        })
    }
}

/// Geometry matching [`SceneSpec::artist_site`] on a 1440x900 desktop.
pub fn artist_layout() -> Layout {
    let elements = [
        Element::new("body", 0.0, 7300.0),
        Element::new(".loader", 0.0, 900.0),
        Element::new(".line", 300.0, 180.0).with_count(2),
        Element::new(".glitch-target", 300.0, 360.0),
        Element::new(".manifesto-section", 900.0, 1200.0),
        Element::new(".scrolling-text", 1000.0, 200.0),
        Element::new(".manifesto-image", 1300.0, 600.0),
        Element::new("#about", 2100.0, 900.0),
        Element::new(".about-text", 2200.0, 600.0),
        Element::new(".cards-container", 3000.0, 800.0),
        Element::new(".tour-card", 3050.0, 700.0).with_count(3),
        Element::new(".tour-image", 3800.0, 600.0),
        Element::new(".crowd-section", 4400.0, 1000.0),
        Element::new(".crowd-text", 4750.0, 300.0),
        Element::new("#gallery", 5400.0, 1000.0),
        Element::new(".marquee-track", 5450.0, 160.0),
        Element::new("#contact", 6400.0, 900.0),
        Element::new(".cursor", 0.0, 32.0),
        Element::new(".cursor-follower", 0.0, 32.0),
    ];

    elements.into_iter().fold(
        Layout::new(
            Viewport {
                width: 1440.0,
                height: 900.0,
            },
            7300.0,
        ),
        Layout::with_element,
    )
}
