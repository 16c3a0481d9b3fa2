//! Fire-and-forget property tweens.
//!
//! Used for effects that re-declare their animation on every input instead
//! of owning a timeline: the cursor, theme colours, the velocity distortion
//! and the preloader slide-out. A new tween on a `(target, index, property)`
//! key supersedes the in-flight one and starts from wherever it had got to.

use std::collections::BTreeMap;

use crate::{Ease, Property, StyleWrite, Value};

/// Duration and curve of a single tween.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub duration_secs: f64,
    pub ease: Ease,
}

impl Transition {
    pub const fn new(duration_secs: f64, ease: Ease) -> Self {
        Self {
            duration_secs,
            ease,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct TweenKey {
    target: String,
    index: usize,
    property: Property,
}

#[derive(Debug, Clone, Copy)]
struct ActiveTween {
    from: Value,
    to: Value,
    start_ms: f64,
    duration_ms: f64,
    ease: Ease,
}

impl ActiveTween {
    fn value_at(&self, now_ms: f64) -> (Value, bool) {
        if self.duration_ms <= 0.0 {
            return (self.to, true);
        }
        let t = ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0);
        if t >= 1.0 {
            (self.to, true)
        } else {
            (self.from.lerp(self.to, self.ease.apply(t)), false)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TweenSet {
    active: BTreeMap<TweenKey, ActiveTween>,
    /// Last value written for every key, finished or not.
    current: BTreeMap<TweenKey, Value>,
}

impl TweenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or supersedes) a tween toward `value`.
    pub fn to(
        &mut self,
        target: &str,
        index: usize,
        property: Property,
        value: impl Into<Value>,
        transition: Transition,
        now_ms: f64,
    ) {
        let key = TweenKey {
            target: target.to_string(),
            index,
            property,
        };
        let from = self.value_at(&key, now_ms);
        self.active.insert(
            key,
            ActiveTween {
                from,
                to: value.into(),
                start_ms: now_ms,
                duration_ms: transition.duration_secs.max(0.0) * 1000.0,
                ease: transition.ease,
            },
        );
    }

    /// Current value of a property, falling back to its natural value.
    pub fn current(&self, target: &str, index: usize, property: Property) -> Value {
        let key = TweenKey {
            target: target.to_string(),
            index,
            property,
        };
        self.current
            .get(&key)
            .copied()
            .unwrap_or_else(|| property.natural())
    }

    pub fn is_animating(&self) -> bool {
        !self.active.is_empty()
    }

    /// Writes for every active tween. Finished tweens write their final value
    /// once and are then retired.
    pub fn sample(&mut self, now_ms: f64) -> Vec<StyleWrite> {
        let mut writes = Vec::with_capacity(self.active.len());
        let mut finished = Vec::new();
        for (key, tween) in &self.active {
            let (value, done) = tween.value_at(now_ms);
            self.current.insert(key.clone(), value);
            writes.push(StyleWrite::new(
                key.target.clone(),
                key.index,
                key.property,
                value,
            ));
            if done {
                finished.push(key.clone());
            }
        }
        for key in finished {
            self.active.remove(&key);
        }
        writes
    }

    fn value_at(&self, key: &TweenKey, now_ms: f64) -> Value {
        match self.active.get(key) {
            Some(tween) => tween.value_at(now_ms).0,
            None => self
                .current
                .get(key)
                .copied()
                .unwrap_or_else(|| key.property.natural()),
        }
    }
}
