use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{MotionError, Result};

/// Host viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1440.0,
            height: 900.0,
        }
    }
}

/// A named visual target and where it sits in document space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Selector the scene refers to, e.g. `.tour-card`.
    pub name: String,
    pub top: f64,
    pub height: f64,
    /// Number of matched nodes; staggered animations fan out over these.
    #[serde(default = "one")]
    pub count: usize,
}

fn one() -> usize {
    1
}

impl Element {
    pub fn new(name: impl Into<String>, top: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            top,
            height,
            count: 1,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Fraction of the element inside a viewport scrolled to `offset`.
    pub fn visible_ratio(&self, offset: f64, viewport: &Viewport) -> f64 {
        if self.height <= 0.0 {
            return 0.0;
        }
        let visible_top = self.top.max(offset);
        let visible_bottom = self.bottom().min(offset + viewport.height);
        ((visible_bottom - visible_top).max(0.0) / self.height).clamp(0.0, 1.0)
    }
}

/// Document geometry the stage resolves selectors and trigger bounds against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub viewport: Viewport,
    pub document_height: f64,
    #[serde(default)]
    elements: Vec<Element>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Layout {
    pub fn new(viewport: Viewport, document_height: f64) -> Self {
        Self {
            viewport,
            document_height,
            elements: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let mut layout: Self = serde_json::from_str(raw)?;
        layout.reindex();
        Ok(layout)
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.insert(element);
        self
    }

    /// Adds or replaces an element.
    pub fn insert(&mut self, element: Element) {
        match self.index.get(&element.name) {
            Some(&slot) => self.elements[slot] = element,
            None => {
                self.index.insert(element.name.clone(), self.elements.len());
                self.elements.push(element);
            }
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn resolve(&self, selector: &str) -> Result<&Element> {
        self.index
            .get(selector)
            .map(|&slot| &self.elements[slot])
            .ok_or_else(|| MotionError::UnresolvedTarget(selector.to_string()))
    }

    pub fn max_scroll(&self) -> f64 {
        (self.document_height - self.viewport.height).max(0.0)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn reindex(&mut self) {
        self.index = self
            .elements
            .iter()
            .enumerate()
            .map(|(slot, element)| (element.name.clone(), slot))
            .collect();
    }
}
