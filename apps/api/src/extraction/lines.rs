//! Line reconstruction: groups glyph runs into reading-order lines.
//!
//! # Algorithm
//! 1. Normalize raw items (drop blanks, split placed / unplaced).
//! 2. Sort placed runs by descending `y` (stable, so ties keep encounter order).
//! 3. Greedy single pass: the first run of a cluster seeds it; a run joins the
//!    current cluster iff `|seed.y - run.y| <= tolerance`, else it seeds a new one.
//! 4. Sort each line by ascending `x`.
//! 5. Attach unplaced runs to the line of the closest preceding placed run.
//!
//! # Spacing
//! Same-line runs are separated by one space unless the next run opens with
//! closing punctuation. With a join gap configured, two placed runs whose
//! horizontal distance (next `x` minus the previous run's estimated right
//! edge) is at most the gap are glued as fragments of one word.

use std::cmp::Ordering;

use crate::extraction::glyph::{normalize, GlyphRun, RawTextItem};

/// Default vertical clustering tolerance, in user-space units.
pub const DEFAULT_LINE_TOLERANCE: f64 = 5.0;

/// A run starting with one of these is glued to the previous run.
const CLOSING_PUNCTUATION: [char; 9] = ['.', ',', '!', '?', ';', ':', ')', '}', ']'];

/// One reconstructed line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// `y` of the run that seeded the cluster; `None` for a line made only of
    /// runs without position data.
    pub baseline: Option<f64>,
    /// Placed runs, left to right.
    pub runs: Vec<GlyphRun>,
    /// Runs without usable geometry, in encounter order, rendered after `runs`.
    pub degraded: Vec<String>,
}

impl Line {
    fn seeded_by(run: GlyphRun) -> Self {
        Self {
            baseline: Some(run.y),
            runs: vec![run],
            degraded: Vec::new(),
        }
    }

    /// Renders the line applying the inter-run spacing rule.
    pub fn text(&self) -> String {
        self.render(None)
    }

    fn render(&self, join_gap: Option<f64>) -> String {
        let mut out = String::new();
        let mut previous: Option<&GlyphRun> = None;

        for run in &self.runs {
            let fragment = join_gap
                .zip(previous)
                .is_some_and(|(gap, prev)| run.x - (prev.x + prev.estimated_width) <= gap);
            if !out.is_empty() && !fragment && needs_space_before(&run.text) {
                out.push(' ');
            }
            out.push_str(&run.text);
            previous = Some(run);
        }
        for piece in &self.degraded {
            if !out.is_empty() && needs_space_before(piece) {
                out.push(' ');
            }
            out.push_str(piece);
        }
        out
    }
}

fn needs_space_before(next: &str) -> bool {
    !next.starts_with(CLOSING_PUNCTUATION)
}

/// Stateless line reconstructor, configured with a vertical tolerance and an
/// optional horizontal join gap.
#[derive(Debug, Clone, Copy)]
pub struct LineReconstructor {
    tolerance: f64,
    join_gap: Option<f64>,
}

impl Default for LineReconstructor {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_LINE_TOLERANCE,
            join_gap: None,
        }
    }
}

impl LineReconstructor {
    pub fn new(tolerance: f64) -> Self {
        let tolerance = if tolerance.is_finite() && tolerance >= 0.0 {
            tolerance
        } else {
            DEFAULT_LINE_TOLERANCE
        };
        Self {
            tolerance,
            join_gap: None,
        }
    }

    /// Invalid gaps (NaN, negative) disable joining.
    pub fn with_join_gap(self, join_gap: Option<f64>) -> Self {
        Self {
            join_gap: join_gap.filter(|g| g.is_finite() && *g >= 0.0),
            ..self
        }
    }

    /// Groups raw page items into ordered lines. Never fails.
    pub fn reconstruct(&self, items: &[RawTextItem]) -> Vec<Line> {
        let page = normalize(items);

        let mut placed = page.placed;
        // Stable: equal heights keep encounter order, so the first run seen seeds.
        placed.sort_by(|(_, a), (_, b)| b.y.total_cmp(&a.y));

        let mut lines: Vec<Line> = Vec::new();
        let mut line_of: Vec<(usize, usize)> = Vec::with_capacity(placed.len());

        for (encounter, run) in placed {
            let joins = lines
                .last()
                .and_then(|line| line.baseline)
                .is_some_and(|seed| (seed - run.y).abs() <= self.tolerance);

            if joins {
                if let Some(line) = lines.last_mut() {
                    line.runs.push(run);
                }
            } else {
                lines.push(Line::seeded_by(run));
            }
            line_of.push((encounter, lines.len() - 1));
        }

        for line in &mut lines {
            line.runs
                .sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
        }

        line_of.sort_unstable_by_key(|(encounter, _)| *encounter);
        for unplaced in page.unplaced {
            // Closest placed run encountered before this one decides the line.
            let preceding = line_of.partition_point(|(enc, _)| *enc < unplaced.encounter);
            let target = match preceding {
                0 => 0,
                n => line_of[n - 1].1,
            };
            if lines.is_empty() {
                lines.push(Line {
                    baseline: None,
                    runs: Vec::new(),
                    degraded: Vec::new(),
                });
            }
            lines[target].degraded.push(unplaced.text);
        }

        lines
    }

    /// Reconstructs and renders a page; lines are joined with single line
    /// breaks and empty lines are skipped.
    pub fn page_text(&self, items: &[RawTextItem]) -> String {
        self.reconstruct(items)
            .iter()
            .map(|line| line.render(self.join_gap))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
