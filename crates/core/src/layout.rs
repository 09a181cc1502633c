//! Split-tree inference from flat pane geometry.
//!
//! tmux only reports where each pane sits. To recreate a window we need the
//! sequence of splits that produced it. This module recovers one by greedy
//! merging:
//!
//! 1. Every pane starts as its own span (a rectangle plus the panes inside it)
//! 2. Two spans can merge when their union is a rectangle: they have the same
//!    extent on the shared side and sit next to each other, separated by at
//!    most the one-cell border tmux draws between panes
//! 3. Among all mergeable pairs, the one sharing the longest edge merges
//!    first; ties go to the pair with the lowest pane indices
//! 4. The left/top span is the split parent and the right/bottom span is the
//!    new pane, sized as its percentage of the merged extent
//! 5. Merging stops when one span covers the window, or fails when no pair
//!    can merge
//!
//! Splits come out outermost first, so replaying them in order divides each
//! region before its sub-regions.

use std::{cmp::Reverse, collections::BTreeMap};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    error::{ScribeError, ScribeResult},
    model::{Orientation, Window},
};

/// Widest separation between adjacent panes (tmux's border line)
const MAX_BORDER: u32 = 1;

// =============================================================================
// Geometry
// =============================================================================

/// A rectangle in terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Position and size of one live pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneGeometry {
    pub id: String,
    /// tmux pane index, used to break ties between equal merges
    pub index: u32,
    pub rect: Rect,
}

// =============================================================================
// Inference
// =============================================================================

/// One split recovered from geometry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub parent: String,
    pub pane: String,
    pub orientation: Orientation,
    pub size: u8,
}

/// The split tree of one window, flattened into replay order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredLayout {
    /// Pane the window starts with (top-left)
    pub root: String,
    /// Splits, outermost first
    pub splits: Vec<Split>,
}

/// A rectangle of the window that is already explained by splits
#[derive(Debug, Clone)]
struct Span {
    bounds: Rect,
    /// Top-left pane; splitting it reproduces the whole span
    anchor: usize,
    /// Lowest pane index inside the span
    lowest: u32,
    /// Splits inside the span, outermost first
    splits: Vec<Split>,
}

/// How `first` and `second` join: orientation and shared edge length
fn adjoin(first: &Rect, second: &Rect) -> Option<(Orientation, u32)> {
    let beside = first.y == second.y
        && first.height == second.height
        && second.x >= first.right()
        && second.x - first.right() <= MAX_BORDER;
    if beside {
        return Some((Orientation::Vertical, first.height));
    }

    let below = first.x == second.x
        && first.width == second.width
        && second.y >= first.bottom()
        && second.y - first.bottom() <= MAX_BORDER;
    if below {
        return Some((Orientation::Horizontal, first.width));
    }

    None
}

/// The border line between two adjoining spans, if they are not flush
fn border_strip(first: &Rect, second: &Rect, orientation: Orientation) -> Option<Rect> {
    match orientation {
        Orientation::Vertical if second.x > first.right() => Some(Rect::new(
            first.right(),
            first.y,
            second.x - first.right(),
            first.height,
        )),
        Orientation::Horizontal if second.y > first.bottom() => Some(Rect::new(
            first.x,
            first.bottom(),
            first.width,
            second.y - first.bottom(),
        )),
        _ => None,
    }
}

/// Percentage of `child` within `parent + child`, rounded, kept in 1..=99
fn share(child: u32, parent: u32) -> u8 {
    let total = u64::from(parent) + u64::from(child);
    let pct = (u64::from(child) * 200 + total) / (2 * total);
    pct.clamp(1, 99) as u8
}

fn validate(window: &str, panes: &[PaneGeometry]) -> ScribeResult<()> {
    if panes.is_empty() {
        return Err(ScribeError::layout(window, "no panes"));
    }

    for (i, pane) in panes.iter().enumerate() {
        if pane.rect.width == 0 || pane.rect.height == 0 {
            return Err(ScribeError::layout(
                window,
                format!("pane {} has an empty area ({})", pane.id, pane.rect),
            ));
        }
        for other in &panes[i + 1..] {
            if other.id == pane.id {
                return Err(ScribeError::layout(
                    window,
                    format!("pane {} is listed twice", pane.id),
                ));
            }
            if pane.rect.overlaps(&other.rect) {
                return Err(ScribeError::layout(
                    window,
                    format!(
                        "panes {} ({}) and {} ({}) overlap",
                        pane.id, pane.rect, other.id, other.rect
                    ),
                ));
            }
        }
    }

    Ok(())
}

/// Recover the splits that produced a window's pane geometry.
///
/// `window` only labels errors. Fails with [`ScribeError::LayoutInference`]
/// when rectangles overlap or leave gaps that no merge sequence can close.
pub fn infer_splits(window: &str, panes: &[PaneGeometry]) -> ScribeResult<InferredLayout> {
    validate(window, panes)?;

    let mut panes = panes.to_vec();
    panes.sort_by_key(|p| p.index);

    let mut spans: BTreeMap<usize, Span> = panes
        .iter()
        .enumerate()
        .map(|(i, pane)| {
            (
                i,
                Span {
                    bounds: pane.rect,
                    anchor: i,
                    lowest: pane.index,
                    splits: Vec::new(),
                },
            )
        })
        .collect();

    while spans.len() > 1 {
        let mut best: Option<((Reverse<u32>, u32, u32), usize, usize, Orientation)> = None;

        for (&first_id, first) in &spans {
            for (&second_id, second) in &spans {
                if first_id == second_id {
                    continue;
                }
                let Some((orientation, edge)) = adjoin(&first.bounds, &second.bounds) else {
                    continue;
                };
                // A gap is only a border when no other pane sits in it
                if let Some(strip) = border_strip(&first.bounds, &second.bounds, orientation)
                    && spans.iter().any(|(&id, span)| {
                        id != first_id && id != second_id && span.bounds.overlaps(&strip)
                    })
                {
                    continue;
                }
                let key = (Reverse(edge), first.lowest, second.lowest);
                if best.as_ref().is_none_or(|(current, ..)| key < *current) {
                    best = Some((key, first_id, second_id, orientation));
                }
            }
        }

        let Some((_, first_id, second_id, orientation)) = best else {
            let remaining: Vec<String> = spans.values().map(|s| s.bounds.to_string()).collect();
            return Err(ScribeError::layout(
                window,
                format!(
                    "panes do not tile the window; {} regions cannot be merged: {}",
                    spans.len(),
                    remaining.join(", ")
                ),
            ));
        };

        let (Some(first), Some(second)) = (spans.remove(&first_id), spans.remove(&second_id))
        else {
            return Err(ScribeError::layout(window, "merge candidate vanished"));
        };

        let (bounds, size) = match orientation {
            Orientation::Vertical => (
                Rect::new(
                    first.bounds.x,
                    first.bounds.y,
                    second.bounds.right() - first.bounds.x,
                    first.bounds.height,
                ),
                share(second.bounds.width, first.bounds.width),
            ),
            Orientation::Horizontal => (
                Rect::new(
                    first.bounds.x,
                    first.bounds.y,
                    first.bounds.width,
                    second.bounds.bottom() - first.bounds.y,
                ),
                share(second.bounds.height, first.bounds.height),
            ),
        };

        let split = Split {
            parent: panes[first.anchor].id.clone(),
            pane: panes[second.anchor].id.clone(),
            orientation,
            size,
        };
        trace!(
            window,
            parent = %split.parent,
            pane = %split.pane,
            %orientation,
            size,
            "merged spans into {}",
            bounds
        );

        let mut splits = Vec::with_capacity(1 + first.splits.len() + second.splits.len());
        splits.push(split);
        splits.extend(first.splits);
        splits.extend(second.splits);

        spans.insert(
            first_id,
            Span {
                bounds,
                anchor: first.anchor,
                lowest: first.lowest.min(second.lowest),
                splits,
            },
        );
    }

    let Some((_, span)) = spans.pop_first() else {
        return Err(ScribeError::layout(window, "no panes"));
    };

    Ok(InferredLayout {
        root: panes[span.anchor].id.clone(),
        splits: span.splits,
    })
}

// =============================================================================
// Simulation
// =============================================================================

/// Replay a window's splits onto a `width` x `height` canvas.
///
/// Each split divides the parent's current rectangle: the new pane takes
/// `size` percent of the space left after a `border`-cell separator and sits
/// to the right of (vertical) or below (horizontal) the parent.
pub fn simulate(
    window: &Window,
    width: u32,
    height: u32,
    border: u32,
) -> ScribeResult<IndexMap<String, Rect>> {
    let mut rects: IndexMap<String, Rect> = IndexMap::new();

    for pane in window.panes.values() {
        let (Some(parent), Some(orientation)) = (&pane.parent, pane.orientation) else {
            rects.insert(pane.id.clone(), Rect::new(0, 0, width, height));
            continue;
        };

        let Some(region) = rects.get(parent).copied() else {
            return Err(ScribeError::UnknownParent {
                window: window.id.clone(),
                pane: parent.clone(),
            });
        };

        let extent = match orientation {
            Orientation::Vertical => region.width,
            Orientation::Horizontal => region.height,
        };
        let available = extent.saturating_sub(border);
        let taken = (available * u32::from(pane.size) + 50) / 100;
        let kept = available.saturating_sub(taken);
        if taken == 0 || kept == 0 {
            return Err(ScribeError::layout(
                &window.id,
                format!("no room to split {} for {} ({})", parent, pane.id, region),
            ));
        }

        let (kept_rect, new_rect) = match orientation {
            Orientation::Vertical => (
                Rect::new(region.x, region.y, kept, region.height),
                Rect::new(region.x + kept + border, region.y, taken, region.height),
            ),
            Orientation::Horizontal => (
                Rect::new(region.x, region.y, region.width, kept),
                Rect::new(region.x, region.y + kept + border, region.width, taken),
            ),
        };
        rects.insert(parent.clone(), kept_rect);
        rects.insert(pane.id.clone(), new_rect);
    }

    Ok(rects)
}
