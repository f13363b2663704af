//! Reading order of detected regions
//!
//! Regions are ordered in two passes that must run in sequence:
//!
//! 1. Largest first, by bounding-box diagonal.
//! 2. A refinement pass where boxes of similar width are put left to right.
//!    A pair whose widths differ by more than a third of the already placed
//!    box's width compares as equal and keeps its order from pass 1.
//!
//! The refinement comparator is not transitive, so the result depends on the
//! exact sequence of comparisons. Pass 2 therefore walks the list the way
//! browser engines sort short arrays: take the leading run, reverse it if it
//! is strictly descending, then binary-insert every remaining box. Lists of up
//! to 64 boxes come out in the same order as in a browser.

use std::cmp::Ordering;

use crate::navigation::ViewId;
use crate::vision::detection::Detection;

/// Longest list for which the run-and-insert walk is the whole sort
pub const MAX_ORDERED_REGIONS: usize = 64;

/// A detection with its place in the image's reading order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedRegion {
    pub detection: Detection,
    /// 1-based position in reading order
    pub rank: usize,
    /// `<image>.<rank>`
    pub id: ViewId,
}

/// Order one image's detections and assign ranks and identifiers
///
/// `image_index` is 0-based; identifiers use it 1-based.
pub fn order_regions(image_index: usize, detections: Vec<Detection>) -> Vec<OrderedRegion> {
    order_detections(detections)
        .into_iter()
        .enumerate()
        .map(|(i, detection)| OrderedRegion {
            detection,
            rank: i + 1,
            id: ViewId::region(image_index, i + 1),
        })
        .collect()
}

/// Apply both ordering passes
pub fn order_detections(mut detections: Vec<Detection>) -> Vec<Detection> {
    // Pass 1: wide to narrow
    detections.sort_by(|a, b| b.bbox.diagonal().total_cmp(&a.bbox.diagonal()));

    // Pass 2: similar widths left to right
    run_insertion_sort_by(&mut detections, compare_similar_widths);

    detections
}

/// `placed` is the box already in position, `candidate` the one being moved
fn compare_similar_widths(candidate: &Detection, placed: &Detection) -> Ordering {
    if (placed.bbox.width - candidate.bbox.width).abs() > placed.bbox.width / 3.0 {
        return Ordering::Equal;
    }
    let dx = candidate.bbox.x - placed.bbox.x;
    if dx < 0.0 {
        Ordering::Less
    } else if dx > 0.0 {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

fn run_insertion_sort_by<T>(items: &mut [T], compare: impl Fn(&T, &T) -> Ordering) {
    let len = items.len();
    if len < 2 {
        return;
    }

    // Leading run, strictly descending or non-descending
    let descending = compare(&items[1], &items[0]) == Ordering::Less;
    let mut run = 2;
    while run < len {
        let order = compare(&items[run], &items[run - 1]);
        let ends = if descending {
            order != Ordering::Less
        } else {
            order == Ordering::Less
        };
        if ends {
            break;
        }
        run += 1;
    }
    if descending {
        items[..run].reverse();
    }

    // Binary insertion of the rest; equal elements go after their peers
    for start in run..len {
        let (mut left, mut right) = (0, start);
        while left < right {
            let mid = left + (right - left) / 2;
            if compare(&items[start], &items[mid]) == Ordering::Less {
                right = mid;
            } else {
                left = mid + 1;
            }
        }
        items[left..=start].rotate_right(1);
    }
}
