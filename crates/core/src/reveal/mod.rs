//! Visibility observers.
//!
//! Unlike scroll triggers these care about how much of an element is on
//! screen, not where its edges are. A `once` observer disconnects after its
//! first reveal.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Element, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RevealId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealEvent {
    pub id: RevealId,
    pub visible: bool,
}

#[derive(Debug, Clone)]
struct Observer {
    id: RevealId,
    element: Element,
    threshold: f64,
    once: bool,
    visible: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RevealObserver {
    observers: Vec<Observer>,
    next_id: u64,
}

impl RevealObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watches `element`; fires once at least `threshold` of it is visible.
    pub fn observe(&mut self, element: Element, threshold: f64, once: bool) -> RevealId {
        let id = RevealId(self.next_id);
        self.next_id += 1;
        self.observers.push(Observer {
            id,
            element,
            threshold: threshold.clamp(0.0, 1.0),
            once,
            visible: false,
        });
        id
    }

    pub fn disconnect(&mut self, id: RevealId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|observer| observer.id != id);
        before != self.observers.len()
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn evaluate(&mut self, offset: f64, viewport: &Viewport) -> Vec<RevealEvent> {
        let mut events = Vec::new();
        for observer in &mut self.observers {
            let ratio = observer.element.visible_ratio(offset, viewport);
            let visible = ratio > 0.0 && ratio >= observer.threshold;
            if visible != observer.visible {
                observer.visible = visible;
                debug!(element = %observer.element.name, ratio, visible, "visibility changed");
                events.push(RevealEvent {
                    id: observer.id,
                    visible,
                });
            }
        }
        self.observers
            .retain(|observer| !(observer.once && observer.visible));
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport {
            width: 1000.0,
            height: 1000.0,
        }
    }

    #[test]
    fn once_observer_fires_a_single_time() {
        let mut reveal = RevealObserver::new();
        let id = reveal.observe(Element::new("#about", 2000.0, 1000.0), 0.2, true);

        assert!(reveal.evaluate(0.0, &viewport()).is_empty());
        assert!(reveal.evaluate(1100.0, &viewport()).is_empty());
        assert_eq!(
            reveal.evaluate(1200.0, &viewport()),
            vec![RevealEvent { id, visible: true }]
        );
        assert!(reveal.is_empty());
        assert!(reveal.evaluate(0.0, &viewport()).is_empty());
    }

    #[test]
    fn repeating_observer_reports_both_edges() {
        let mut reveal = RevealObserver::new();
        let id = reveal.observe(Element::new(".gallery", 500.0, 500.0), 0.5, false);

        assert_eq!(
            reveal.evaluate(0.0, &viewport()),
            vec![RevealEvent { id, visible: true }]
        );
        assert_eq!(
            reveal.evaluate(800.0, &viewport()),
            vec![RevealEvent { id, visible: false }]
        );
        assert_eq!(reveal.len(), 1);
    }
}
