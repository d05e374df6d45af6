//! Task variants and the episode contract they share.
//!
//! Every variant follows the same mechanics: the agent requests a velocity,
//! the request is capped to unit length and integrated over one timestep,
//! and whenever the agent comes within [`CAPTURE_RADIUS`] of the controlled
//! object the object is shoved away from it.
//!
//! # Observation layout
//!
//! Offsets are divided by [`ARENA_SIZE`] and passed through
//! [`signed_sqrt`](crate::shaping::signed_sqrt).
//!
//! | index | [`TargetTask`]           | [`BallTask`]             |
//! |-------|--------------------------|--------------------------|
//! | 0, 1  | agent − target (x, y)    | agent − ball (x, y)      |
//! | 2, 3  | agent − centre (x, y)    | ball − target (x, y)     |
//! | 4     | bias (1.0)               | touched (0.0 or 1.0)     |
//! | 5     | -                        | bias (1.0)               |
//!
//! The action is a 2D desired velocity; lengths above 1 are clamped.

use arrayvec::ArrayVec;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{Vec2, shaping::signed_sqrt};

pub use self::{ball::BallTask, target::TargetTask};

mod ball;
mod target;

/// Seconds simulated by a single [`Task::step`].
pub const TIMESTEP: f64 = 1.0 / 60.0;
/// Agent speed in arena units per second at full throttle.
pub const AGENT_SPEED: f64 = 80.0;
/// Distance below which the agent pushes the controlled object.
pub const CAPTURE_RADIUS: f64 = 27.0;
/// Speed at which a captured object is pushed away from the agent.
pub const PUSH_SPEED: f64 = 200.0;
/// Width and height of the square arena.
pub const ARENA_SIZE: f64 = 800.0;
pub const ARENA_CENTER: Vec2 = Vec2::new(400.0, 400.0);
/// Radius of the placement circles used by randomized resets.
pub const PLACEMENT_RADIUS: f64 = 200.0;
/// Distance at which score shaping has decayed to one half.
pub const DROPOFF_SCALE: f64 = 60.0;
/// Distance between ball and target below which the ball counts as centred.
pub const CENTERED_RADIUS: f64 = 30.0;

/// Largest observation produced by any task variant.
pub const MAX_OBSERVATION_LEN: usize = 8;

pub type Observation = ArrayVec<f64, MAX_OBSERVATION_LEN>;

/// Latched sub-goal flags of one episode.
///
/// Flags are only ever raised during an episode; [`Task::reset`] clears them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Milestones {
    pub touched: bool,
    pub centered: bool,
}

/// One simulation episode.
pub trait Task: Send {
    /// Starts a new episode.
    ///
    /// With `None` the fixed default layout is restored, which makes replays
    /// deterministic. With a random source the object is placed on a circle
    /// around the arena centre and the agent on a circle around the object.
    fn reset(&mut self, rng: Option<&mut dyn RngCore>);

    /// Advances the episode by one [`TIMESTEP`] with the requested velocity.
    fn step(&mut self, action: Vec2);

    /// Returns the observation vector for the current state.
    fn observe(&self) -> Observation;

    /// Returns the fitness of the current state (higher is better).
    fn score(&self) -> f64;

    fn agent(&self) -> Vec2;

    /// Position of the object the agent pushes around.
    fn object(&self) -> Vec2;

    /// Position the object should end up at.
    fn target(&self) -> Vec2;

    fn milestones(&self) -> Milestones;

    fn steps(&self) -> usize;
}

/// Selects a task variant by name.
#[derive(
    Default,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "snake_case")]
#[display(rename_all = "snake_case")]
pub enum TaskKind {
    /// Push a single target into the arena centre.
    #[default]
    Target,
    /// Touch a ball, push it onto the target, then move away.
    Ball,
}

impl TaskKind {
    #[must_use]
    pub const fn observation_len(self) -> usize {
        match self {
            Self::Target => TargetTask::OBSERVATION_LEN,
            Self::Ball => BallTask::OBSERVATION_LEN,
        }
    }

    #[must_use]
    pub fn build(self) -> Box<dyn Task> {
        match self {
            Self::Target => Box::new(TargetTask::new()),
            Self::Ball => Box::new(BallTask::new()),
        }
    }
}

/// Places `object` on the placement circle around `center` and returns a
/// point on the placement circle around `object`.
fn random_layout(rng: &mut dyn RngCore, center: Vec2) -> (Vec2, Vec2) {
    let object = center + Vec2::random_unit(rng) * PLACEMENT_RADIUS;
    let agent = object + Vec2::random_unit(rng) * PLACEMENT_RADIUS;
    (object, agent)
}

/// Displacement of the agent for one timestep of `action`.
fn agent_displacement(action: Vec2) -> Vec2 {
    action.clamp_length(1.0) * (AGENT_SPEED * TIMESTEP)
}

/// Pushes `object` away from `agent` if it is within capture range.
///
/// Returns `true` when the object was captured this step.
fn push_object(agent: Vec2, object: &mut Vec2) -> bool {
    let offset = *object - agent;
    if offset.length() >= CAPTURE_RADIUS {
        return false;
    }
    *object = *object + offset.normalize_or_zero() * (PUSH_SPEED * TIMESTEP);
    true
}

/// Scales an arena offset into observation range.
fn encode_offset(offset: Vec2, observation: &mut Observation) {
    let scaled = (offset * (1.0 / ARENA_SIZE)).map(signed_sqrt);
    observation.push(scaled.x);
    observation.push(scaled.y);
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_task_kind_from_str() {
        assert_eq!("Target".parse::<TaskKind>().unwrap(), TaskKind::Target);
        assert_eq!("ball".parse::<TaskKind>().unwrap(), TaskKind::Ball);
        assert!("maze".parse::<TaskKind>().is_err());
        assert_eq!(TaskKind::Ball.to_string(), "ball");
    }

    #[test]
    fn test_task_kind_serde() {
        let json = serde_json::to_string(&TaskKind::Ball).unwrap();
        assert_eq!(json, "\"ball\"");
        assert_eq!(
            serde_json::from_str::<TaskKind>("\"target\"").unwrap(),
            TaskKind::Target
        );
    }

    #[test]
    fn test_observation_len_matches_build() {
        let mut rng = Pcg32::seed_from_u64(1);
        for kind in [TaskKind::Target, TaskKind::Ball] {
            let mut task = kind.build();
            task.reset(Some(&mut rng));
            assert_eq!(task.observe().len(), kind.observation_len());
        }
    }

    #[test]
    fn test_agent_displacement_is_capped() {
        let max = AGENT_SPEED * TIMESTEP;
        for action in [
            Vec2::new(10.0, 0.0),
            Vec2::new(-3.0, 4.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1e9, -1e9),
        ] {
            let d = agent_displacement(action);
            assert!(d.length() <= max + 1e-12, "{action} moved {}", d.length());
            assert!((d.length() - max).abs() < 1e-9);
        }
    }

    #[test]
    fn test_agent_displacement_is_linear_below_unit() {
        let max = AGENT_SPEED * TIMESTEP;
        for magnitude in [0.0, 0.1, 0.5, 0.99, 1.0] {
            let action = Vec2::from_angle(0.7) * magnitude;
            let d = agent_displacement(action);
            assert!((d.length() - magnitude * max).abs() < 1e-12);
        }
    }

    #[test]
    fn test_push_object_outside_radius() {
        let mut object = Vec2::new(100.0, 100.0);
        assert!(!push_object(Vec2::new(100.0 + CAPTURE_RADIUS, 100.0), &mut object));
        assert_eq!(object, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_push_object_moves_away_from_agent() {
        let mut object = Vec2::new(110.0, 100.0);
        assert!(push_object(Vec2::new(100.0, 100.0), &mut object));
        assert!((object.x - (110.0 + PUSH_SPEED * TIMESTEP)).abs() < 1e-12);
        assert_eq!(object.y, 100.0);
    }
}
