use super::attachment_site::AttachmentSite;
use super::ids::MoleculeId;
use super::point::ShapePoint;
use super::segment::{self, INTER_POINT_DISTANCE, LENGTH_EPSILON, SegmentKind, ShapeSegment};
use crate::core::utils::geometry::Rect;
use nalgebra::Point2;
use slotmap::SecondaryMap;
use tracing::trace;

/// Strands shorter than this reject every attachment proposal.
pub const MIN_LENGTH_TO_ATTACH: f64 = 75.0;
/// Maximum distance between the front site and a ribosome's channel entrance
/// for a proposal to be accepted.
pub const RIBOSOME_CONNECTION_DISTANCE: f64 = 400.0;
/// Maximum distance between the front site and a destroyer for a proposal to
/// be accepted.
pub const MRNA_DESTROYER_CONNECT_DISTANCE: f64 = 400.0;
/// Fixed extra strand length reserved ahead of a consumer's channel.
pub const LEADER_LENGTH: f64 = 200.0;

/// A messenger-RNA strand: an ordered list of shape segments, a list of
/// shape-defining points threaded through them, and the negotiation state for
/// the mobile biomolecules competing to attach at its front.
///
/// The segment list is ordered front-first (index 0 is the leading segment,
/// flat whenever negotiation, translation, or destruction is active). The sum
/// of the segments' contained lengths always equals the sum of the points'
/// target distances; every operation here preserves that equality.
///
/// Consumer bookkeeping is index-based: the `consumers` table maps a
/// molecule handle to the index of its active segment, and the structural
/// helpers in [`segment`] shift those indices whenever segments are inserted
/// or removed.
#[derive(Debug, Clone)]
pub struct MessengerRna {
    /// Nominal anchor position; the segment structure is re-centered on this
    /// point after every mutation.
    pub position: Point2<f64>,
    /// Set while the user is dragging the strand; blocks all admission.
    pub user_controlled: bool,
    segments: Vec<ShapeSegment>,
    points: Vec<ShapePoint>,
    consumers: SecondaryMap<MoleculeId, usize>,
    destroyer: Option<MoleculeId>,
    site: AttachmentSite,
}

impl MessengerRna {
    /// Creates a near-zero-length strand anchored at `position`, as it exists
    /// at the start of transcription: an empty flat leader segment followed
    /// by an empty square reservoir that winds up the transcribed material.
    pub fn new(position: Point2<f64>) -> Self {
        let leader = ShapeSegment::flat(position, LEADER_LENGTH);
        let body = ShapeSegment::square(position, f64::INFINITY);
        Self {
            position,
            user_controlled: false,
            segments: vec![leader, body],
            points: vec![ShapePoint::first(position)],
            consumers: SecondaryMap::new(),
            destroyer: None,
            site: AttachmentSite::new(1.0),
        }
    }

    // --- accessors -------------------------------------------------------

    /// Total strand length: the sum of the points' target distances.
    pub fn total_length(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.target_distance_to_previous)
            .sum()
    }

    pub fn segments(&self) -> &[ShapeSegment] {
        &self.segments
    }

    pub fn points(&self) -> &[ShapePoint] {
        &self.points
    }

    pub fn first_point(&self) -> &ShapePoint {
        &self.points[0]
    }

    pub fn last_point(&self) -> &ShapePoint {
        self.points.last().unwrap_or(&self.points[0])
    }

    pub fn attachment_site(&self) -> &AttachmentSite {
        &self.site
    }

    pub fn destroyer(&self) -> Option<MoleculeId> {
        self.destroyer
    }

    pub fn has_consumer(&self, id: MoleculeId) -> bool {
        self.consumers.contains_key(id)
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// Live position of the front attachment site, derived from the leading
    /// segment's geometry (never stored), so it tracks a moving or growing
    /// strand automatically.
    pub fn attachment_site_position(&self) -> Point2<f64> {
        match self.segments.first() {
            Some(leading) => leading.bounds.min,
            None => self.position,
        }
    }

    /// Front corner of the segment a registered consumer is currently
    /// processing, derived from the live geometry so it tracks a moving or
    /// recentering strand. `None` for unregistered molecules.
    pub fn consumer_segment_position(&self, id: MoleculeId) -> Option<Point2<f64>> {
        let index = *self.consumers.get(id)?;
        Some(self.segments.get(index)?.bounds.min)
    }

    /// True once destruction has consumed the whole strand: the first and
    /// last shape-defining points have become identical.
    pub fn is_fully_destroyed(&self) -> bool {
        self.points.len() == 1 && self.segments.is_empty()
    }

    // --- admission & negotiation ----------------------------------------

    /// Local admission predicate shared by all proposal paths.
    ///
    /// Rejects while the strand is user-controlled, while it is still too
    /// short to process, or once a destroyer has been accepted: destruction
    /// has absolute precedence, so no new translation may start for the
    /// strand's remaining lifetime.
    pub fn attachment_allowed(&self) -> bool {
        !self.user_controlled
            && self.total_length() >= MIN_LENGTH_TO_ATTACH
            && self.destroyer.is_none()
    }

    /// Considers an attachment proposal from a ribosome.
    ///
    /// On acceptance the front site is occupied and the ribosome is recorded
    /// against the leading segment immediately, so no later proposal within
    /// the same tick can also succeed. On rejection nothing is committed.
    ///
    /// # Arguments
    ///
    /// * `ribosome` - Handle of the proposing ribosome.
    /// * `entrance_position` - The ribosome's channel-entrance point.
    ///
    /// # Return
    ///
    /// The front site when the proposal is accepted, otherwise `None`.
    ///
    /// # Panics
    ///
    /// Panics if `ribosome` is already mapped on this strand; proposing twice
    /// is a contract violation.
    pub fn consider_proposal_from_ribosome(
        &mut self,
        ribosome: MoleculeId,
        entrance_position: Point2<f64>,
    ) -> Option<&AttachmentSite> {
        assert!(
            !self.consumers.contains_key(ribosome),
            "duplicate proposal: ribosome {:?} is already mapped on this strand",
            ribosome
        );
        if !self.attachment_allowed() || !self.site.is_vacant() {
            return None;
        }
        let distance = nalgebra::distance(&self.attachment_site_position(), &entrance_position);
        if distance > RIBOSOME_CONNECTION_DISTANCE {
            return None;
        }

        self.site.occupy(ribosome);
        self.consumers.insert(ribosome, 0);
        trace!(?ribosome, distance, "ribosome proposal accepted");
        Some(&self.site)
    }

    /// Considers an attachment proposal from a messenger-RNA destroyer.
    ///
    /// Same admission shape as the ribosome path with the destroyer connect
    /// distance; acceptance records the (single, permanent) destroyer
    /// reference, which blocks all future ribosome acceptance.
    ///
    /// # Panics
    ///
    /// Panics if this destroyer has already been accepted here; a second
    /// proposal from the bound destroyer is a contract violation.
    pub fn consider_proposal_from_destroyer(
        &mut self,
        destroyer: MoleculeId,
        position: Point2<f64>,
    ) -> Option<&AttachmentSite> {
        assert!(
            self.destroyer != Some(destroyer),
            "duplicate proposal: destroyer {:?} is already bound to this strand",
            destroyer
        );
        if !self.attachment_allowed() || !self.site.is_vacant() {
            return None;
        }
        let distance = nalgebra::distance(&self.attachment_site_position(), &position);
        if distance > MRNA_DESTROYER_CONNECT_DISTANCE {
            return None;
        }

        self.site.occupy(destroyer);
        self.destroyer = Some(destroyer);
        trace!(?destroyer, distance, "destroyer proposal accepted");
        Some(&self.site)
    }

    /// Cancels an in-flight (accepted but not yet physically attached)
    /// negotiation, clearing the site and the reverse reference in the same
    /// operation so neither side is left dangling.
    ///
    /// # Return
    ///
    /// The handle of the molecule whose negotiation was cancelled, if any.
    pub fn abort_incoming_negotiation(&mut self) -> Option<MoleculeId> {
        let occupant = self.site.occupant()?;
        self.site.vacate();
        self.consumers.remove(occupant);
        if self.destroyer == Some(occupant) {
            self.destroyer = None;
        }
        Some(occupant)
    }

    // --- translation -----------------------------------------------------

    /// Marks a ribosome as physically attached and turns the leading segment
    /// into its translation channel.
    ///
    /// The segment at the ribosome's front becomes its channel with capacity
    /// `channel_length + LEADER_LENGTH`; when that segment cannot take the
    /// role (a spool, another consumer's channel, or an over-full leftover)
    /// a fresh channel segment is inserted ahead of it instead. The front
    /// site clears at this point: the ribosome's bookkeeping lives entirely
    /// in the consumer table now, so the next ribosome may be admitted.
    ///
    /// # Panics
    ///
    /// Panics if `ribosome` was never accepted on this strand.
    pub fn on_ribosome_attached(&mut self, ribosome: MoleculeId, channel_length: f64) {
        let index = *self
            .consumers
            .get(ribosome)
            .unwrap_or_else(|| panic!("ribosome {:?} attached without acceptance", ribosome));
        let capacity = channel_length + LEADER_LENGTH;
        if self.segment_is_reusable_flat_channel(index, ribosome, capacity) {
            self.segments[index].set_capacity(capacity);
        } else {
            let origin = self.segments[index].bounds.min;
            segment::insert_segment(
                &mut self.segments,
                &mut self.consumers,
                index,
                ShapeSegment::flat(origin, capacity),
            );
            self.consumers[ribosome] = index;
        }
        if self.site.is_occupied_by(ribosome) {
            self.site.vacate();
        }
        self.after_mutation(self.consumers[ribosome]);
    }

    /// Advances translation for an attached ribosome by `length` units,
    /// conserving total strand length across the channel transfer.
    ///
    /// # Return
    ///
    /// `true` once the ribosome's channel segment has drained with no input
    /// material left behind it; translation is complete and the caller
    /// should release.
    ///
    /// # Panics
    ///
    /// Panics if `ribosome` is not registered on this strand.
    pub fn advance_translation(&mut self, ribosome: MoleculeId, length: f64) -> bool {
        let index = *self
            .consumers
            .get(ribosome)
            .unwrap_or_else(|| panic!("translation advance for unregistered ribosome {:?}", ribosome));
        let (index, complete) =
            segment::advance(&mut self.segments, &mut self.consumers, index, length);
        self.consumers[ribosome] = index;
        self.after_mutation(index);
        complete
    }

    /// Releases a ribosome's bookkeeping (translation finished or aborted).
    /// Tolerant of an already-released ribosome.
    pub fn release_ribosome(&mut self, ribosome: MoleculeId) {
        self.consumers.remove(ribosome);
        if self.site.is_occupied_by(ribosome) {
            self.site.vacate();
        }
    }

    // --- destruction -----------------------------------------------------

    /// Marks the accepted destroyer as physically attached; the leading
    /// segment becomes its consumption channel, or a fresh channel is
    /// inserted at the front when the leading segment cannot take the role.
    ///
    /// # Panics
    ///
    /// Panics if `destroyer` is not the strand's accepted destroyer.
    pub fn begin_destruction(&mut self, destroyer: MoleculeId, channel_length: f64) {
        assert!(
            self.destroyer == Some(destroyer),
            "destruction begun by {:?} without an accepted destroyer",
            destroyer
        );
        let capacity = channel_length + LEADER_LENGTH;
        if self.segment_is_reusable_flat_channel(0, destroyer, capacity) {
            self.segments[0].set_capacity(capacity);
        } else {
            let origin = self.segments[0].bounds.min;
            segment::insert_segment(
                &mut self.segments,
                &mut self.consumers,
                0,
                ShapeSegment::flat(origin, capacity),
            );
        }
        self.consumers.insert(destroyer, 0);
        self.after_mutation(0);
    }

    /// Advances destruction by `length` units, permanently removing consumed
    /// material from the front of the strand.
    ///
    /// # Return
    ///
    /// `true` exactly once, at the call where the first and last
    /// shape-defining points become identical and the strand collapses to
    /// its canonical zero-length state (empty segment list).
    ///
    /// # Panics
    ///
    /// Panics if no destroyer is bound, or when called again after the
    /// strand has already fully collapsed (no active segment remains).
    pub fn advance_destruction(&mut self, length: f64) -> bool {
        let destroyer = self
            .destroyer
            .unwrap_or_else(|| panic!("destruction advanced with no bound destroyer"));
        let index = *self
            .consumers
            .get(destroyer)
            .unwrap_or_else(|| panic!("destruction advanced before begin_destruction"));
        assert!(
            !self.segments.is_empty(),
            "destruction advanced with no active segment"
        );

        let removed =
            segment::advance_and_remove(&mut self.segments, &mut self.consumers, index, length);
        self.reduce_points(removed);

        if self.points.len() == 1 {
            // Canonical zero-length state.
            self.consumers.clear();
            self.segments.clear();
            self.site.vacate();
            self.points[0].position = self.position;
            trace!("strand fully destroyed");
            return true;
        }
        self.after_mutation(index.min(self.segments.len().saturating_sub(1)));
        false
    }

    /// Aborts an in-flight or active destruction, clearing the destroyer
    /// reference, its consumer entry, and the site in one synchronous step.
    ///
    /// # Return
    ///
    /// The former destroyer's handle, if one was bound.
    pub fn abort_destruction(&mut self) -> Option<MoleculeId> {
        let destroyer = self.destroyer.take()?;
        self.consumers.remove(destroyer);
        if self.site.is_occupied_by(destroyer) {
            self.site.vacate();
        }
        Some(destroyer)
    }

    /// True when the segment at `index` can be re-rated into `claimant`'s
    /// channel of the given capacity: a finite flat segment with no other
    /// consumer processing it, holding no more material than the new
    /// capacity admits. (A released consumer's leftover channel can hold
    /// more than a smaller channel's capacity.)
    fn segment_is_reusable_flat_channel(
        &self,
        index: usize,
        claimant: MoleculeId,
        capacity: f64,
    ) -> bool {
        self.segments[index].is_flat()
            && self.segments[index].capacity().is_finite()
            && self.segments[index].contained_length() <= capacity + LENGTH_EPSILON
            && !self
                .consumers
                .iter()
                .any(|(other, &seg)| other != claimant && seg == index)
    }

    // --- growth & shrinkage ---------------------------------------------

    /// Grows the strand by `length` units of transcribed material: the flat
    /// leader fills first, the square reservoir winds up the rest, and shape
    /// points are appended every [`INTER_POINT_DISTANCE`] units.
    ///
    /// Growth is collaborator-driven (transcription machinery lives outside
    /// this model) and is only valid before any consumer attaches.
    pub fn add_length(&mut self, length: f64) {
        debug_assert!(
            self.consumers.is_empty(),
            "strand growth after consumer attachment"
        );
        let mut remaining = length;
        for seg in &mut self.segments {
            if remaining <= 0.0 {
                break;
            }
            let take = remaining.min(seg.remaining_capacity());
            seg.set_contained_length(seg.contained_length() + take);
            remaining -= take;
        }

        let mut to_add = length;
        while to_add > LENGTH_EPSILON {
            let count = self.points.len();
            let last = self.points.last_mut().unwrap();
            if count > 1 && last.target_distance_to_previous < INTER_POINT_DISTANCE {
                let delta =
                    (INTER_POINT_DISTANCE - last.target_distance_to_previous).min(to_add);
                last.target_distance_to_previous += delta;
                to_add -= delta;
            } else {
                let distance = to_add.min(INTER_POINT_DISTANCE);
                let position = last.position;
                self.points.push(ShapePoint::new(position, distance));
                to_add -= distance;
            }
        }
        self.after_mutation(0);
    }

    /// Shrinks the strand by `amount` from the tail.
    ///
    /// If `amount` covers the whole strand it collapses to the canonical
    /// zero-length state: a single point (first and last coincident) and an
    /// empty segment list. Otherwise whole tail points whose target distance
    /// fits in the remaining amount are removed and the final point is
    /// partially shrunk; the walk never underflows and never orphans points.
    pub fn reduce_length(&mut self, amount: f64) {
        if amount >= self.total_length() - LENGTH_EPSILON {
            self.points.truncate(1);
            self.points[0].target_distance_to_previous = 0.0;
            self.points[0].position = self.position;
            self.consumers.clear();
            self.segments.clear();
            return;
        }

        self.reduce_points(amount);

        // Trim the same amount off the tail of the segment list.
        let mut remaining = amount;
        while remaining > LENGTH_EPSILON {
            let last_index = self.segments.len() - 1;
            let take = remaining.min(self.segments[last_index].contained_length());
            let held = self.segments[last_index].contained_length();
            self.segments[last_index].set_contained_length(held - take);
            remaining -= take;
            if self.segments[last_index].contained_length() <= LENGTH_EPSILON {
                if last_index == 0 {
                    break;
                }
                segment::remove_segment(&mut self.segments, &mut self.consumers, last_index);
            } else if take <= LENGTH_EPSILON {
                break;
            }
        }
        self.after_mutation(0);
    }

    /// Removes `amount` from the tail of the point list only; segment
    /// bookkeeping is the caller's responsibility.
    fn reduce_points(&mut self, amount: f64) {
        let mut remaining = amount;
        while remaining > LENGTH_EPSILON && self.points.len() > 1 {
            let tail = self.points.last().unwrap().target_distance_to_previous;
            if tail <= remaining + LENGTH_EPSILON {
                self.points.pop();
                remaining -= tail;
            } else {
                self.points.last_mut().unwrap().target_distance_to_previous -= remaining;
                remaining = 0.0;
            }
        }
    }

    // --- geometry maintenance -------------------------------------------

    /// Re-establishes geometric contiguity around the segment at `index`:
    /// segments ahead of it are laid right-edge-to-left-edge toward the
    /// front, segments behind it left-edge-to-right-edge toward the tail,
    /// all bottom-aligned, so there are no gaps or overlaps.
    fn realign_segments_from(&mut self, index: usize) {
        for j in (0..index).rev() {
            let anchor = self.segments[j + 1].bounds.min;
            let width = self.segments[j].bounds.width();
            self.segments[j].set_origin(Point2::new(anchor.x - width, anchor.y));
        }
        for j in index + 1..self.segments.len() {
            let prev = self.segments[j - 1].bounds;
            self.segments[j].set_origin(Point2::new(prev.max.x, prev.min.y));
        }
    }

    /// Translates the whole segment structure so its bounding box is
    /// centered on the strand's nominal position.
    fn recenter(&mut self) {
        let Some(first) = self.segments.first() else {
            return;
        };
        let mut union = first.bounds;
        for seg in &self.segments[1..] {
            union = union.union(&seg.bounds);
        }
        let offset = self.position - union.center();
        for seg in &mut self.segments {
            seg.translate(&offset);
        }
    }

    /// Redistributes the shape-defining points along the current segment
    /// geometry: straight runs through flat segments, a serpentine fill of
    /// square segments. Winding depends only on the current geometry, so it
    /// must re-run after every mutation that changes segment shape or count.
    pub fn wind_points_through_segments(&mut self) {
        if self.segments.is_empty() {
            let anchor = self.position;
            for p in &mut self.points {
                p.position = anchor;
            }
            return;
        }
        let mut walked = 0.0;
        for i in 0..self.points.len() {
            walked += self.points[i].target_distance_to_previous;
            self.points[i].position = path_position(&self.segments, walked, self.position);
        }
    }

    fn after_mutation(&mut self, active_index: usize) {
        if self.segments.is_empty() {
            self.wind_points_through_segments();
            return;
        }
        self.realign_segments_from(active_index.min(self.segments.len() - 1));
        self.recenter();
        self.wind_points_through_segments();
    }

    /// Moves the strand's nominal anchor and re-derives the whole geometry
    /// around it; the attachment site position follows automatically.
    pub fn move_to(&mut self, position: Point2<f64>) {
        self.position = position;
        self.after_mutation(0);
    }

    /// Union of all segment bounds; the strand's current footprint.
    pub fn shape_bounds(&self) -> Rect {
        match self.segments.split_first() {
            Some((first, rest)) => rest
                .iter()
                .fold(first.bounds, |acc, seg| acc.union(&seg.bounds)),
            None => Rect::at_point(self.position),
        }
    }
}

/// Position at distance `t` along the concatenated path of the non-empty
/// segments; `t` past the end clamps to the path's endpoint.
fn path_position(segments: &[ShapeSegment], t: f64, fallback: Point2<f64>) -> Point2<f64> {
    let mut remaining = t;
    let mut last_end = fallback;
    for seg in segments {
        let len = seg.contained_length();
        if len <= LENGTH_EPSILON {
            continue;
        }
        if remaining <= len {
            return segment_path_position(seg, remaining);
        }
        remaining -= len;
        last_end = segment_path_position(seg, len);
    }
    last_end
}

/// Position at distance `t` along a single segment's internal path.
fn segment_path_position(seg: &ShapeSegment, t: f64) -> Point2<f64> {
    match seg.kind() {
        SegmentKind::Flat => Point2::new(seg.bounds.min.x + t, seg.bounds.min.y),
        SegmentKind::Square => {
            let width = seg.bounds.width();
            if width <= LENGTH_EPSILON {
                return seg.bounds.min;
            }
            let rows = (seg.contained_length() / width).ceil().max(1.0);
            let row = (t / width).floor().min(rows - 1.0);
            let offset = (t - row * width).min(width);
            let spacing = if rows > 1.0 {
                seg.bounds.height() / (rows - 1.0)
            } else {
                0.0
            };
            let x = if (row as u64) % 2 == 0 {
                seg.bounds.min.x + offset
            } else {
                seg.bounds.max.x - offset
            };
            Point2::new(x, seg.bounds.min.y + row * spacing)
        }
    }
}
