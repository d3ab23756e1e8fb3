use crate::core::utils::geometry::{Rect, rotate_vector};
use nalgebra::{Point2, Vector2};
use rand::Rng;
use std::f64::consts::{FRAC_PI_6, TAU};

/// Wander speed is resampled uniformly from this range (length-units/s).
pub const WANDER_SPEED_RANGE: (f64, f64) = (100.0, 500.0);
/// Maximum heading change per re-aim, in radians either way.
pub const WANDER_MAX_TURN: f64 = FRAC_PI_6;
/// Seconds between re-aims, resampled uniformly from this range.
pub const WANDER_COUNTDOWN_RANGE: (f64, f64) = (0.25, 1.25);

/// Random-walk parameters for a molecule drifting through the medium.
///
/// The walk holds a heading and speed until the countdown expires, then
/// turns by a bounded random angle and resamples speed and countdown. All
/// randomness comes from the injected generator, so a seeded run replays
/// the exact same trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct WanderState {
    direction: Vector2<f64>,
    speed: f64,
    countdown: f64,
}

impl WanderState {
    pub fn sample(rng: &mut impl Rng) -> Self {
        let heading = rng.gen_range(0.0..TAU);
        Self {
            direction: Vector2::new(heading.cos(), heading.sin()),
            speed: rng.gen_range(WANDER_SPEED_RANGE.0..=WANDER_SPEED_RANGE.1),
            countdown: rng.gen_range(WANDER_COUNTDOWN_RANGE.0..=WANDER_COUNTDOWN_RANGE.1),
        }
    }

    fn re_aim(&mut self, rng: &mut impl Rng) {
        let turn = rng.gen_range(-WANDER_MAX_TURN..=WANDER_MAX_TURN);
        self.direction = rotate_vector(&self.direction, turn);
        self.speed = rng.gen_range(WANDER_SPEED_RANGE.0..=WANDER_SPEED_RANGE.1);
        self.countdown = rng.gen_range(WANDER_COUNTDOWN_RANGE.0..=WANDER_COUNTDOWN_RANGE.1);
    }

    /// One integration step: advances the countdown, re-aims when it has
    /// expired, moves along the heading, and bounces off `bounds`.
    ///
    /// The bounce is deterministic: the offending velocity component is
    /// reflected and the position mirrored back inside, with the countdown
    /// reset so the molecule commits to the reflected heading for a while
    /// instead of jittering against the wall.
    pub fn step(
        &mut self,
        position: Point2<f64>,
        dt: f64,
        bounds: &Rect,
        rng: &mut impl Rng,
    ) -> Point2<f64> {
        self.countdown -= dt;
        if self.countdown <= 0.0 {
            self.re_aim(rng);
        }

        let mut next = position + self.direction * self.speed * dt;
        let mut bounced = false;

        if next.x < bounds.min.x {
            next.x = bounds.min.x + (bounds.min.x - next.x);
            self.direction.x = -self.direction.x;
            bounced = true;
        } else if next.x > bounds.max.x {
            next.x = bounds.max.x - (next.x - bounds.max.x);
            self.direction.x = -self.direction.x;
            bounced = true;
        }
        if next.y < bounds.min.y {
            next.y = bounds.min.y + (bounds.min.y - next.y);
            self.direction.y = -self.direction.y;
            bounced = true;
        } else if next.y > bounds.max.y {
            next.y = bounds.max.y - (next.y - bounds.max.y);
            self.direction.y = -self.direction.y;
            bounced = true;
        }

        if bounced {
            // A step longer than the arena could mirror back out the far
            // side; clamping covers that degenerate case.
            next.x = next.x.clamp(bounds.min.x, bounds.max.x);
            next.y = next.y.clamp(bounds.min.y, bounds.max.y);
            self.countdown = rng.gen_range(WANDER_COUNTDOWN_RANGE.0..=WANDER_COUNTDOWN_RANGE.1);
        }
        next
    }
}

/// Closed set of motion behaviors a molecule can be in.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionStrategy {
    /// Held in place (attached, or dragged by the user).
    Still,
    /// Free random walk inside the arena bounds.
    Wander(WanderState),
    /// Straight-line homing on a fixed point, without overshoot.
    MoveToward { target: Point2<f64>, speed: f64 },
}

impl MotionStrategy {
    pub fn wander(rng: &mut impl Rng) -> Self {
        Self::Wander(WanderState::sample(rng))
    }

    /// Advances `position` by one step of `dt` seconds.
    pub fn step(
        &mut self,
        position: Point2<f64>,
        dt: f64,
        bounds: &Rect,
        rng: &mut impl Rng,
    ) -> Point2<f64> {
        match self {
            Self::Still => position,
            Self::Wander(state) => state.step(position, dt, bounds, rng),
            Self::MoveToward { target, speed } => {
                let offset = *target - position;
                let distance = offset.norm();
                let step = *speed * dt;
                if distance <= step || distance == 0.0 {
                    *target
                } else {
                    position + offset * (step / distance)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn arena() -> Rect {
        Rect::from_center(Point2::origin(), 1000.0, 800.0)
    }

    #[test]
    fn wander_stays_inside_bounds_indefinitely() {
        let bounds = arena();
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = WanderState::sample(&mut rng);
        let mut position = Point2::origin();
        for _ in 0..5_000 {
            position = state.step(position, 1.0 / 60.0, &bounds, &mut rng);
            assert!(
                bounds.contains(&position),
                "wander escaped bounds at {:?}",
                position
            );
        }
    }

    #[test]
    fn wander_is_deterministic_for_a_fixed_seed() {
        let bounds = arena();
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut state = WanderState::sample(&mut rng);
            let mut position = Point2::origin();
            for _ in 0..200 {
                position = state.step(position, 1.0 / 60.0, &bounds, &mut rng);
            }
            position
        };
        assert_eq!(run(99), run(99));
    }

    #[test]
    fn wander_speed_is_within_the_sampled_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let state = WanderState::sample(&mut rng);
            assert!(state.speed >= WANDER_SPEED_RANGE.0);
            assert!(state.speed <= WANDER_SPEED_RANGE.1);
        }
    }

    #[test]
    fn bounce_reflects_the_offending_component() {
        let bounds = Rect::new(Point2::new(0.0, 0.0), Point2::new(100.0, 100.0));
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = WanderState {
            direction: Vector2::new(1.0, 0.0),
            speed: 200.0,
            countdown: 100.0,
        };
        // 200 u/s for 0.1 s from x=95 crosses the right wall by 15.
        let next = state.step(Point2::new(95.0, 50.0), 0.1, &bounds, &mut rng);
        assert!((next.x - 85.0).abs() < 1e-9);
        assert_eq!(next.y, 50.0);
        assert_eq!(state.direction.x, -1.0);
    }

    #[test]
    fn move_toward_arrives_without_overshoot() {
        let bounds = arena();
        let mut rng = StdRng::seed_from_u64(0);
        let target = Point2::new(30.0, 40.0);
        let mut strategy = MotionStrategy::MoveToward {
            target,
            speed: 100.0,
        };
        let mut position = Point2::origin();
        let mut arrived = false;
        for _ in 0..40 {
            let before = nalgebra::distance(&position, &target);
            position = strategy.step(position, 1.0 / 60.0, &bounds, &mut rng);
            let after = nalgebra::distance(&position, &target);
            assert!(after <= before + 1e-9, "moved away from the target");
            if after == 0.0 {
                arrived = true;
                break;
            }
        }
        // 50 units at 100 u/s: exact arrival (no overshoot) within ~30 steps.
        assert!(arrived);
        assert_eq!(position, target);
    }

    #[test]
    fn still_never_moves() {
        let bounds = arena();
        let mut rng = StdRng::seed_from_u64(0);
        let mut strategy = MotionStrategy::Still;
        let position = Point2::new(12.0, -3.0);
        assert_eq!(strategy.step(position, 1.0, &bounds, &mut rng), position);
    }
}
