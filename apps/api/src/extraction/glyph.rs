//! Glyph runs: the atomic unit of the reconstruction pipeline.
//!
//! Coordinates are PDF user space: `y` grows upward, so the top of the page
//! has the largest `y` and reading order is descending `y`, ascending `x`.

/// A positioned text item as handed over by a page source.
///
/// `origin` is `None` when the source could not resolve a usable position
/// (no transform, non-finite numbers). Such items still contribute their text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTextItem {
    pub text: String,
    pub origin: Option<(f64, f64)>,
    pub width: Option<f64>,
}

impl RawTextItem {
    pub fn placed(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            origin: Some((x, y)),
            width: None,
        }
    }

    pub fn unplaced(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: None,
            width: None,
        }
    }
}

/// Fallback per-character advance when the source gave no width.
const DEFAULT_CHAR_WIDTH: f64 = 6.0;

/// An immutable, non-empty, positioned run of text.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub estimated_width: f64,
}

/// A run whose position is unusable, kept with its encounter index so the
/// reconstructor can attach it to the line that was current at that point.
#[derive(Debug, Clone, PartialEq)]
pub struct UnplacedRun {
    pub text: String,
    pub encounter: usize,
}

/// Output of normalization: placed runs tagged with encounter order, plus
/// the degraded runs.
#[derive(Debug, Clone, Default)]
pub struct NormalizedPage {
    pub placed: Vec<(usize, GlyphRun)>,
    pub unplaced: Vec<UnplacedRun>,
}

/// Drops empty items and splits the rest into placed and unplaced runs.
///
/// Encounter indices count only the retained items.
pub fn normalize(items: &[RawTextItem]) -> NormalizedPage {
    let mut page = NormalizedPage::default();

    for item in items {
        let text = item.text.trim();
        if text.is_empty() {
            continue;
        }
        let encounter = page.placed.len() + page.unplaced.len();

        match item.origin {
            Some((x, y)) if x.is_finite() && y.is_finite() => {
                let estimated_width = item
                    .width
                    .filter(|w| w.is_finite() && *w >= 0.0)
                    .unwrap_or_else(|| text.chars().count() as f64 * DEFAULT_CHAR_WIDTH);
                page.placed.push((
                    encounter,
                    GlyphRun {
                        text: text.to_string(),
                        x,
                        y,
                        estimated_width,
                    },
                ));
            }
            _ => page.unplaced.push(UnplacedRun {
                text: text.to_string(),
                encounter,
            }),
        }
    }

    page
}
