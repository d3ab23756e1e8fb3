use super::motion::MotionStrategy;
use crate::core::models::ids::StrandId;
use crate::core::utils::geometry::Rect;
use nalgebra::Point2;
use rand::Rng;

/// Attachment lifecycle of a mobile biomolecule.
///
/// Transitions are driven synchronously by the simulation model: a molecule
/// is free, or committed to a strand (in transit after an accepted
/// negotiation, then physically attached). There is no detaching
/// intermediate; release is immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentState {
    /// Free, wandering, and scanning for strands to propose to.
    UnattachedAvailable,
    /// Proposal accepted; homing on the strand's front site.
    MovingTowardAttachment { strand: StrandId },
    /// Physically attached to the strand and processing it.
    Attached { strand: StrandId },
}

/// Pairs a molecule's attachment state with the motion strategy that state
/// implies. Kept 1:1 with molecules by the simulation model.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentStateMachine {
    state: AttachmentState,
    motion: MotionStrategy,
}

impl AttachmentStateMachine {
    /// A fresh machine: unattached, with a randomly seeded wander.
    pub fn new(rng: &mut impl Rng) -> Self {
        Self {
            state: AttachmentState::UnattachedAvailable,
            motion: MotionStrategy::wander(rng),
        }
    }

    pub fn state(&self) -> AttachmentState {
        self.state
    }

    pub fn is_available(&self) -> bool {
        self.state == AttachmentState::UnattachedAvailable
    }

    /// The strand this machine is committed to, in transit or attached.
    pub fn strand(&self) -> Option<StrandId> {
        match self.state {
            AttachmentState::UnattachedAvailable => None,
            AttachmentState::MovingTowardAttachment { strand }
            | AttachmentState::Attached { strand } => Some(strand),
        }
    }

    /// Commits to an accepted proposal and starts homing on `target`.
    ///
    /// # Panics
    ///
    /// Panics unless the machine is currently unattached; accepting a
    /// proposal while committed elsewhere is a contract violation.
    pub fn begin_approach(&mut self, strand: StrandId, target: Point2<f64>, speed: f64) {
        assert!(
            self.is_available(),
            "approach begun from {:?}, expected UnattachedAvailable",
            self.state
        );
        self.state = AttachmentState::MovingTowardAttachment { strand };
        self.motion = MotionStrategy::MoveToward { target, speed };
    }

    /// Refreshes the homing target while in transit; the site of a moving
    /// or re-centering strand drifts between ticks. No-op in other states.
    pub fn retarget(&mut self, target: Point2<f64>) {
        if let MotionStrategy::MoveToward { target: current, .. } = &mut self.motion {
            *current = target;
        }
    }

    /// Marks physical arrival at the strand; the molecule stops moving.
    ///
    /// # Panics
    ///
    /// Panics unless the machine is in transit toward this strand.
    pub fn attach(&mut self, strand: StrandId) {
        assert!(
            self.state == AttachmentState::MovingTowardAttachment { strand },
            "attach to {:?} from {:?}",
            strand,
            self.state
        );
        self.state = AttachmentState::Attached { strand };
        self.motion = MotionStrategy::Still;
    }

    /// Synchronously resets the machine to unattached/available with a
    /// fresh wander, from any state.
    ///
    /// The caller must clear the strand-side bookkeeping in the same
    /// operation; this is the override path used when the user grabs a
    /// molecule or a strand is destroyed under its consumer.
    pub fn force_immediate_unattached_and_available(&mut self, rng: &mut impl Rng) {
        self.state = AttachmentState::UnattachedAvailable;
        self.motion = MotionStrategy::wander(rng);
    }

    /// Holds the molecule in place without changing its attachment state
    /// (used while the user drags it).
    pub fn hold_still(&mut self) {
        self.motion = MotionStrategy::Still;
    }

    /// One motion step for the current strategy.
    pub fn step(
        &mut self,
        position: Point2<f64>,
        dt: f64,
        bounds: &Rect,
        rng: &mut impl Rng,
    ) -> Point2<f64> {
        self.motion.step(position, dt, bounds, rng)
    }
}
