//! Key layout registry and hit testing

use crate::types::{KeyRect, Point2D, ScreenSize};
use std::collections::BTreeMap;

/// Measures the rendered keys. `None` means there is no keyboard container
/// to measure yet.
pub trait KeyGeometry: Send {
    fn measure(&self, screen: ScreenSize) -> Option<Vec<KeyRect>>;
}

/// keyId -> rectangle snapshot.
///
/// Rebuilds merge into the existing map: re-measured ids are overwritten and
/// ids that disappeared are kept (stale) until the next layout that has them.
#[derive(Debug, Default, Clone)]
pub struct KeyLayout {
    rects: BTreeMap<String, KeyRect>,
}

impl KeyLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge freshly measured rectangles. Returns `false` when the rebuild was
    /// skipped for lack of a container.
    pub fn rebuild(&mut self, measured: Option<Vec<KeyRect>>) -> bool {
        let Some(measured) = measured else {
            log::debug!("No keyboard container, layout rebuild skipped");
            return false;
        };

        let count = measured.len();
        for rect in measured {
            self.rects.insert(rect.key_id.clone(), rect);
        }
        log::debug!("Layout rebuilt: {} measured, {} known", count, self.rects.len());
        true
    }

    pub fn get(&self, key_id: &str) -> Option<&KeyRect> {
        self.rects.get(key_id)
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyRect> {
        self.rects.values()
    }

    /// First key (in key-id order) whose closed bounds contain `point`.
    pub fn hit_test(&self, point: Option<Point2D>) -> Option<&str> {
        let point = point?;
        self.rects
            .values()
            .find(|rect| rect.contains(point))
            .map(|rect| rect.key_id.as_str())
    }
}

/// Default on-screen keyboard occupying the lower part of the screen.
#[derive(Debug, Clone)]
pub struct QwertyGeometry {
    /// Fraction of the screen height above the keyboard
    pub top_fraction: f32,
    /// Gap between keys in pixels
    pub gap: f32,
}

impl Default for QwertyGeometry {
    fn default() -> Self {
        Self { top_fraction: 0.45, gap: 6.0 }
    }
}

const CHAR_ROWS: [&str; 4] = ["1234567890", "qwertyuiop", "asdfghjkl", "zxcvbnm"];
const BOTTOM_ROW: [(&str, f32); 5] = [
    ("clear", 1.5),
    ("space", 4.0),
    ("enter", 1.5),
    ("ai-fix", 1.5),
    ("ai-complete", 1.5),
];
const GRID_COLUMNS: f32 = 10.0;

impl QwertyGeometry {
    pub fn layout(&self, screen: ScreenSize) -> Vec<KeyRect> {
        let top = screen.height * self.top_fraction;
        let rows = CHAR_ROWS.len() as f32 + 1.0;
        let row_height = (screen.height - top) / rows;
        let unit = screen.width / GRID_COLUMNS;
        let key_h = (row_height - self.gap).max(1.0);
        let mut rects = Vec::new();

        let mut place = |id: &str, row: usize, left: f32, units: f32| {
            rects.push(KeyRect::new(
                id,
                top + row as f32 * row_height + self.gap / 2.0,
                left + self.gap / 2.0,
                (units * unit - self.gap).max(1.0),
                key_h,
            ));
        };

        for (row, keys) in CHAR_ROWS.iter().enumerate() {
            let count = keys.chars().count() as f32;
            // zxcvbnm is flanked by shift and backspace.
            let flanked = row == CHAR_ROWS.len() - 1;
            let span = if flanked { count + 3.0 } else { count };
            let mut left = (screen.width - span * unit) / 2.0;
            if flanked {
                place("shift", row, left, 1.5);
                left += 1.5 * unit;
            }
            for ch in keys.chars() {
                place(&ch.to_string(), row, left, 1.0);
                left += unit;
            }
            if flanked {
                place("backspace", row, left, 1.5);
            }
        }

        let bottom = CHAR_ROWS.len();
        let span: f32 = BOTTOM_ROW.iter().map(|(_, w)| w).sum();
        let mut left = (screen.width - span * unit) / 2.0;
        for (id, units) in BOTTOM_ROW {
            place(id, bottom, left, units);
            left += units * unit;
        }

        rects
    }
}

impl KeyGeometry for QwertyGeometry {
    fn measure(&self, screen: ScreenSize) -> Option<Vec<KeyRect>> {
        if screen.width <= 0.0 || screen.height <= 0.0 {
            return None;
        }
        Some(self.layout(screen))
    }
}
