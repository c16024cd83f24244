//! # Decoration Module - Region Planning for Text Surfaces
//!
//! Translates a [`MatchState`](crate::matching::MatchState) into structured display regions
//! over the target text. Mapping regions to colors or styles is left entirely to the host.
//!
//! ```text
//! Target:   [c][o][n][s][t][ ][a][ ][=][ ][1][;]
//! Matched:   6 non-whitespace characters ("consta")
//! Split:     offset of the 7th non-whitespace character ('=') = 8
//! Regions:  [------- Confirmed -------][-Pending-]
//! ```
//!
//! `Confirmed` and `Pending` always partition `[0, text_len)` exactly. An `Error` region is an
//! overlay covering the line of an active [`ErrorSignal`] and does not take part in the
//! partition.
//!
//! The module also filters instructor [`Annotation`]s down to the ones that should be shown
//! for the current buffer.

use std::ops::Range;

use web_time::Instant;

use crate::input_handler::ErrorSignal;
use crate::metrics::{LineTable, StripIndex};
use crate::target::Target;

/// The meaning of a display region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionKind {
    /// Target text the learner has already reproduced
    Confirmed,
    /// Target text still to be typed, usually painted as faded ghost text
    Pending,
    /// The line where a keystroke was just rejected
    Error,
}

/// A half-open range of target offsets with a meaning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    pub start: usize,
    pub end: usize,
}

impl Region {
    pub fn new(kind: RegionKind, range: Range<usize>) -> Self {
        Self {
            kind,
            start: range.start,
            end: range.end,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.range().contains(&offset)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Offset in the target where confirmed text ends and pending text begins
///
/// This is the offset of the first unmatched non-whitespace character, or `text_len` once
/// every non-whitespace character is matched. Whitespace before the next expected character
/// therefore counts as confirmed.
pub fn split_offset(matched_chars: usize, strip_index: &StripIndex, text_len: usize) -> usize {
    strip_index
        .get(matched_chars)
        .unwrap_or(text_len)
        .min(text_len)
}

/// Plan the display regions for a match result
///
/// Produces, in order:
/// - `Confirmed` over `[0, split)` when `split > 0`,
/// - `Pending` over `[split, text_len)` when `split < text_len`,
/// - `Error` over the line containing the signal's offset, when a signal is active at `now`.
pub fn plan_regions(
    matched_chars: usize,
    strip_index: &StripIndex,
    lines: &LineTable,
    error_signal: Option<&ErrorSignal>,
    now: Instant,
) -> Vec<Region> {
    let text_len = lines.text_len();
    let split = split_offset(matched_chars, strip_index, text_len);
    let mut regions = Vec::with_capacity(3);

    if split > 0 {
        regions.push(Region::new(RegionKind::Confirmed, 0..split));
    }

    if split < text_len {
        regions.push(Region::new(RegionKind::Pending, split..text_len));
    }

    if let Some(signal) = error_signal.filter(|signal| signal.is_active(now)) {
        let line = lines.line_of(signal.at_offset);
        regions.push(Region::new(RegionKind::Error, lines.line_range(line)));
    }

    regions
}

impl Target {
    /// Plan display regions over this target
    pub fn plan_regions(
        &self,
        matched_chars: usize,
        error_signal: Option<&ErrorSignal>,
        now: Instant,
    ) -> Vec<Region> {
        plan_regions(
            matched_chars,
            self.strip_index(),
            self.lines(),
            error_signal,
            now,
        )
    }
}

/// An instructor comment attached to a 1-based line of the lesson
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub line: usize,
    pub text: String,
}

/// Annotations to show for a buffer with the given number of lines
///
/// An annotation appears once the learner's buffer reaches its line. Author order is kept.
pub fn visible_annotations(
    annotations: &[Annotation],
    buffer_line_count: usize,
) -> impl Iterator<Item = &Annotation> {
    annotations
        .iter()
        .filter(move |annotation| annotation.line > 0 && annotation.line <= buffer_line_count)
}

#[cfg(test)]
mod tests {
    use web_time::Duration;

    use super::*;

    fn error_at(at_offset: usize, now: Instant) -> ErrorSignal {
        ErrorSignal {
            at_offset,
            expires_at: now + Duration::from_millis(400),
        }
    }

    #[test]
    fn test_split_offset() {
        let target = Target::new("const a = 1;");
        let index = target.strip_index();

        assert_eq!(split_offset(0, index, 12), 0);
        assert_eq!(split_offset(5, index, 12), 6);
        assert_eq!(split_offset(6, index, 12), 8);
        assert_eq!(split_offset(9, index, 12), 12);
        assert_eq!(split_offset(42, index, 12), 12);
    }

    #[test]
    fn test_regions_partition_target() {
        let now = Instant::now();
        let target = Target::new("if (x) {\n  y();\n}\n");

        for matched in 0..=target.total_chars() {
            let regions = target.plan_regions(matched, None, now);

            let mut covered = 0;
            for region in &regions {
                assert!(!region.is_empty());
                assert_eq!(region.start, covered, "gap or overlap at {matched}");
                covered = region.end;
            }
            assert_eq!(covered, target.text_len());
        }
    }

    #[test]
    fn test_regions_at_boundaries() {
        let now = Instant::now();
        let target = Target::new("ab");

        assert_eq!(
            target.plan_regions(0, None, now),
            vec![Region::new(RegionKind::Pending, 0..2)]
        );
        assert_eq!(
            target.plan_regions(1, None, now),
            vec![
                Region::new(RegionKind::Confirmed, 0..1),
                Region::new(RegionKind::Pending, 1..2),
            ]
        );
        assert_eq!(
            target.plan_regions(2, None, now),
            vec![Region::new(RegionKind::Confirmed, 0..2)]
        );
    }

    #[test]
    fn test_empty_target_has_no_regions() {
        let target = Target::new("");
        assert!(target.plan_regions(0, None, Instant::now()).is_empty());
    }

    #[test]
    fn test_error_region_covers_line() {
        let now = Instant::now();
        let target = Target::new("if (x) {\n  y();\n}");
        let signal = error_at(11, now);

        let regions = target.plan_regions(6, Some(&signal), now);
        assert_eq!(regions.len(), 3);
        assert_eq!(regions[2], Region::new(RegionKind::Error, 9..15));
        assert!(regions[2].contains(11));

        // Partition is unaffected by the overlay
        assert_eq!(regions[0].range(), 0..11);
        assert_eq!(regions[1].range(), 11..17);
    }

    #[test]
    fn test_expired_error_is_not_planned() {
        let now = Instant::now();
        let target = Target::new("ab");
        let signal = error_at(0, now);

        let later = now + Duration::from_millis(400);
        let regions = target.plan_regions(0, Some(&signal), later);
        assert!(regions.iter().all(|region| region.kind != RegionKind::Error));
    }

    #[test]
    fn test_plan_is_idempotent() {
        let now = Instant::now();
        let target = Target::new("let x = 1;\nlet y = 2;");
        let signal = error_at(13, now);

        assert_eq!(
            target.plan_regions(5, Some(&signal), now),
            target.plan_regions(5, Some(&signal), now)
        );
    }

    #[test]
    fn test_visible_annotations() {
        let annotations = vec![
            Annotation {
                line: 3,
                text: "close the block".to_string(),
            },
            Annotation {
                line: 1,
                text: "declare the function".to_string(),
            },
            Annotation {
                line: 0,
                text: "ignored".to_string(),
            },
        ];

        let visible: Vec<usize> = visible_annotations(&annotations, 2)
            .map(|annotation| annotation.line)
            .collect();
        assert_eq!(visible, vec![1]);

        let visible: Vec<usize> = visible_annotations(&annotations, 3)
            .map(|annotation| annotation.line)
            .collect();
        assert_eq!(visible, vec![3, 1]);
    }
}
