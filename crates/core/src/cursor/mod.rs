use serde::{Deserialize, Serialize};

use crate::{CursorConfig, Ease, Property, Transition, TweenSet};

/// Selectors for the cursor dot and its trailing ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorTargets {
    pub dot: String,
    pub follower: String,
}

impl Default for CursorTargets {
    fn default() -> Self {
        Self {
            dot: ".cursor".to_string(),
            follower: ".cursor-follower".to_string(),
        }
    }
}

/// Custom cursor: the dot snaps quickly, the follower trails behind.
#[derive(Debug, Clone)]
pub struct CursorFollower {
    config: CursorConfig,
    targets: CursorTargets,
    pointer: Option<(f64, f64)>,
}

impl CursorFollower {
    pub fn new(config: CursorConfig, targets: CursorTargets) -> Self {
        Self {
            config,
            targets,
            pointer: None,
        }
    }

    pub fn targets(&self) -> &CursorTargets {
        &self.targets
    }

    /// Last pointer position seen.
    pub fn pointer(&self) -> Option<(f64, f64)> {
        self.pointer
    }

    /// Re-declares both cursor tweens toward the pointer.
    pub fn on_move(&mut self, x: f64, y: f64, now_ms: f64, tweens: &mut TweenSet) {
        self.pointer = Some((x, y));
        if !self.config.enabled {
            return;
        }

        let lanes = [
            (&self.targets.dot, self.config.dot_secs),
            (&self.targets.follower, self.config.follower_secs),
        ];
        for (target, secs) in lanes {
            let transition = Transition::new(secs, Ease::default());
            tweens.to(target, 0, Property::X, x, transition, now_ms);
            tweens.to(target, 0, Property::Y, y, transition, now_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn follower_lags_behind_dot() {
        let mut tweens = TweenSet::new();
        let mut cursor = CursorFollower::new(CursorConfig::default(), CursorTargets::default());
        cursor.on_move(300.0, 200.0, 0.0, &mut tweens);

        tweens.sample(100.0);
        assert_eq!(tweens.current(".cursor", 0, Property::X), Value::Number(300.0));
        let trailing = tweens
            .current(".cursor-follower", 0, Property::X)
            .as_number()
            .unwrap();
        assert!(trailing > 0.0 && trailing < 300.0);

        tweens.sample(300.0);
        assert_eq!(
            tweens.current(".cursor-follower", 0, Property::Y),
            Value::Number(200.0)
        );
    }

    #[test]
    fn disabled_cursor_only_tracks_pointer() {
        let mut tweens = TweenSet::new();
        let config = CursorConfig {
            enabled: false,
            ..Default::default()
        };
        let mut cursor = CursorFollower::new(config, CursorTargets::default());
        cursor.on_move(10.0, 20.0, 0.0, &mut tweens);
        assert_eq!(cursor.pointer(), Some((10.0, 20.0)));
        assert!(!tweens.is_animating());
    }
}
