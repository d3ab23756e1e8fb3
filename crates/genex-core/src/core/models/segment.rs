use super::ids::MoleculeId;
use crate::core::utils::geometry::Rect;
use nalgebra::{Point2, Vector2};
use slotmap::SecondaryMap;

/// Distance between consecutive shape-defining points along a strand.
pub const INTER_POINT_DISTANCE: f64 = 50.0;

/// Tolerance below which a stored length is treated as zero.
///
/// Chain algebra works on sums and differences of f64 lengths; comparing
/// against this epsilon keeps "drained" segments from lingering with a
/// residual of a few ulps.
pub const LENGTH_EPSILON: f64 = 1e-9;

/// Geometric flavor of a shape segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// A straight, height-zero run. The leading segment of a strand is always
    /// flat while negotiation, translation, or destruction is active.
    Flat,
    /// A wound-up square region whose side grows with the contained length.
    Square,
}

/// A capacity-bounded contiguous run of the modeled strand.
///
/// Segments never hold more than `capacity` length-units; every mutator
/// maintains `contained_length <= capacity` and keeps the bounds in sync with
/// the kind-specific geometry (a flat segment is as wide as its contained
/// length, a square segment keeps its area proportional to it).
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeSegment {
    kind: SegmentKind,
    /// Current footprint; `bounds.min` is the segment's anchor corner.
    pub bounds: Rect,
    capacity: f64,
    contained_length: f64,
}

impl ShapeSegment {
    pub fn flat(origin: Point2<f64>, capacity: f64) -> Self {
        Self {
            kind: SegmentKind::Flat,
            bounds: Rect::at_point(origin),
            capacity,
            contained_length: 0.0,
        }
    }

    pub fn square(origin: Point2<f64>, capacity: f64) -> Self {
        Self {
            kind: SegmentKind::Square,
            bounds: Rect::at_point(origin),
            capacity,
            contained_length: 0.0,
        }
    }

    /// A flat segment with effectively unbounded capacity, used to hold
    /// material that has already passed through a consumer's channel.
    pub fn spool(origin: Point2<f64>) -> Self {
        Self::flat(origin, f64::INFINITY)
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    pub fn is_flat(&self) -> bool {
        self.kind == SegmentKind::Flat
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Re-rates the segment, e.g. when a consumer begins active processing
    /// and the leading segment becomes its channel.
    ///
    /// # Panics
    ///
    /// Panics if the segment already contains more than the new capacity;
    /// shrinking below the contained length would silently lose material.
    pub fn set_capacity(&mut self, capacity: f64) {
        assert!(
            self.contained_length <= capacity + LENGTH_EPSILON,
            "segment capacity {} cannot hold contained length {}",
            capacity,
            self.contained_length
        );
        self.capacity = capacity;
    }

    pub fn contained_length(&self) -> f64 {
        self.contained_length
    }

    pub fn remaining_capacity(&self) -> f64 {
        (self.capacity - self.contained_length).max(0.0)
    }

    /// Sets the contained length and recomputes the bounds for the kind.
    ///
    /// # Panics
    ///
    /// Panics if `length` exceeds the capacity; callers must route overflow
    /// onward instead of forcing it into one segment.
    pub fn set_contained_length(&mut self, length: f64) {
        let length = if length.abs() <= LENGTH_EPSILON { 0.0 } else { length };
        assert!(
            length >= 0.0,
            "segment contained length must be non-negative, got {}",
            length
        );
        assert!(
            length <= self.capacity + LENGTH_EPSILON,
            "segment contained length {} exceeds capacity {}",
            length,
            self.capacity
        );
        self.contained_length = length;
        self.update_bounds();
    }

    /// Moves the segment so its anchor corner lands on `origin`, keeping size.
    pub fn set_origin(&mut self, origin: Point2<f64>) {
        let offset = origin - self.bounds.min;
        self.bounds = self.bounds.translated(&offset);
    }

    pub fn translate(&mut self, offset: &Vector2<f64>) {
        self.bounds = self.bounds.translated(offset);
    }

    fn update_bounds(&mut self) {
        let origin = self.bounds.min;
        match self.kind {
            SegmentKind::Flat => {
                self.bounds = Rect::new(origin, origin + Vector2::new(self.contained_length, 0.0));
            }
            SegmentKind::Square => {
                let side = (self.contained_length * INTER_POINT_DISTANCE).sqrt();
                self.bounds = Rect::new(origin, origin + Vector2::new(side, side));
            }
        }
    }
}

/// Inserts `segment` at `at`, shifting the consumer table entries that point
/// at or beyond the insertion position.
pub fn insert_segment(
    segments: &mut Vec<ShapeSegment>,
    consumers: &mut SecondaryMap<MoleculeId, usize>,
    at: usize,
    segment: ShapeSegment,
) {
    segments.insert(at, segment);
    for index in consumers.values_mut() {
        if *index >= at {
            *index += 1;
        }
    }
}

/// Removes the segment at `at`, shifting consumer table entries beyond it.
///
/// # Panics
///
/// Panics if a consumer still points at the removed segment; the caller must
/// migrate or release consumers first.
pub fn remove_segment(
    segments: &mut Vec<ShapeSegment>,
    consumers: &mut SecondaryMap<MoleculeId, usize>,
    at: usize,
) {
    segments.remove(at);
    for index in consumers.values_mut() {
        assert!(*index != at, "cannot remove a segment with an active consumer");
        if *index > at {
            *index -= 1;
        }
    }
}

/// Makes sure a spool segment sits immediately ahead of `index`: an existing
/// spool (flat, unbounded, claimed by nobody) is reused, anything else gets a
/// fresh spool inserted between it and the active segment. Another consumer's
/// channel is never written into.
///
/// # Return
///
/// The (possibly shifted) index of the active segment.
fn ensure_spool(
    segments: &mut Vec<ShapeSegment>,
    consumers: &mut SecondaryMap<MoleculeId, usize>,
    index: usize,
) -> usize {
    let reusable = index > 0
        && segments[index - 1].is_flat()
        && segments[index - 1].capacity().is_infinite()
        && !consumers.values().any(|&claimed| claimed == index - 1);
    if reusable {
        index
    } else {
        let origin = segments[index].bounds.min;
        insert_segment(segments, consumers, index, ShapeSegment::spool(origin));
        index + 1
    }
}

/// Pushes `length` units of strand material through the active segment at
/// `index` (translation).
///
/// Material is pulled in from the input side (the next segment in the list);
/// whatever exceeds the active segment's capacity passes straight through
/// into a flat spool segment ahead of it, so the total strand length is
/// exactly conserved. Drained input segments are removed. Once the input side
/// is exhausted the strand tail is inside the channel and the active segment
/// itself drains into the spool.
///
/// When the input side is another consumer's active channel the advance
/// stalls there: that channel is neither pulled from nor removed, and
/// material arrives only once its consumer spools it onward.
///
/// # Return
///
/// The possibly shifted index of the active segment, and `true` once the
/// active segment's contained length has reached zero with no input material
/// left behind it: the completion condition for translation through the
/// channel.
///
/// # Panics
///
/// Panics if `index` is out of range for the segment list.
pub fn advance(
    segments: &mut Vec<ShapeSegment>,
    consumers: &mut SecondaryMap<MoleculeId, usize>,
    index: usize,
    length: f64,
) -> (usize, bool) {
    assert!(
        index < segments.len(),
        "advance on segment index {} of {}",
        index,
        segments.len()
    );
    let mut index = index;
    let mut demand = length;

    while demand > LENGTH_EPSILON && index + 1 < segments.len() {
        if consumers.values().any(|&claimed| claimed == index + 1) {
            // The input side is another consumer's channel; stall until that
            // consumer spools material onward.
            break;
        }
        let take = demand.min(segments[index + 1].contained_length());
        let into_channel = take.min(segments[index].remaining_capacity());
        let passed_through = take - into_channel;

        let input = segments[index + 1].contained_length();
        segments[index + 1].set_contained_length(input - take);
        let held = segments[index].contained_length();
        segments[index].set_contained_length(held + into_channel);

        if passed_through > LENGTH_EPSILON {
            index = ensure_spool(segments, consumers, index);
            let spooled = segments[index - 1].contained_length();
            segments[index - 1].set_contained_length(spooled + passed_through);
        }
        if segments[index + 1].contained_length() <= LENGTH_EPSILON {
            remove_segment(segments, consumers, index + 1);
        }
        demand -= take;
    }

    if demand > LENGTH_EPSILON && index + 1 >= segments.len() {
        let drain = demand.min(segments[index].contained_length());
        if drain > 0.0 {
            index = ensure_spool(segments, consumers, index);
            let held = segments[index].contained_length();
            segments[index].set_contained_length(held - drain);
            let spooled = segments[index - 1].contained_length();
            segments[index - 1].set_contained_length(spooled + drain);
        }
    }

    let complete =
        index + 1 >= segments.len() && segments[index].contained_length() <= LENGTH_EPSILON;
    (index, complete)
}

/// Pushes material through the active segment at `index` and permanently
/// discards it (destruction).
///
/// The channel is repeatedly refilled from the input side and cut down, so
/// the total strand length held from `index` onward decreases by exactly the
/// requested amount, clamped to what is actually there.
///
/// # Return
///
/// The number of length-units actually removed.
///
/// # Panics
///
/// Panics if `index` is out of range for the segment list.
pub fn advance_and_remove(
    segments: &mut Vec<ShapeSegment>,
    consumers: &mut SecondaryMap<MoleculeId, usize>,
    index: usize,
    length: f64,
) -> f64 {
    assert!(
        index < segments.len(),
        "advance_and_remove on segment index {} of {}",
        index,
        segments.len()
    );
    let mut removed = 0.0;
    let mut demand = length;

    while demand > LENGTH_EPSILON {
        if segments[index].contained_length() <= LENGTH_EPSILON {
            if index + 1 >= segments.len() {
                break;
            }
            let refill = segments[index + 1]
                .contained_length()
                .min(segments[index].capacity());
            let input = segments[index + 1].contained_length();
            segments[index + 1].set_contained_length(input - refill);
            segments[index].set_contained_length(refill);
            if segments[index + 1].contained_length() <= LENGTH_EPSILON {
                remove_segment(segments, consumers, index + 1);
            }
        }

        let cut = demand.min(segments[index].contained_length());
        if cut <= LENGTH_EPSILON {
            break;
        }
        let held = segments[index].contained_length();
        segments[index].set_contained_length(held - cut);
        removed += cut;
        demand -= cut;
    }

    removed
}

/// Total strand length held by a segment list.
pub fn total_contained_length(segments: &[ShapeSegment]) -> f64 {
    segments.iter().map(|s| s.contained_length()).sum()
}
