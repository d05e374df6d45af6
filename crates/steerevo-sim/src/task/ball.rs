use rand::RngCore;

use crate::{Vec2, shaping::dropoff};

use super::{
    ARENA_CENTER, CENTERED_RADIUS, DROPOFF_SCALE, Milestones, Observation, Task,
    agent_displacement, encode_offset, push_object, random_layout,
};

/// Touch a ball, push it onto the target, then move away from it.
///
/// The score is staged on the episode milestones so that every later stage
/// outscores every earlier one:
///
/// | stage                   | score                              |
/// |-------------------------|------------------------------------|
/// | ball not yet touched    | `dropoff(|agent - ball|)`          |
/// | touched, not centred    | `dropoff(|ball - target|) + 1`     |
/// | centred                 | `(1 - dropoff(|agent - ball|)) + 2` |
///
/// The only tie is the degenerate state where the agent sits exactly on a
/// ball that sits exactly on the target. The ball can only become centred
/// after it has been touched.
#[derive(Debug, Clone)]
pub struct BallTask {
    agent: Vec2,
    ball: Vec2,
    target: Vec2,
    milestones: Milestones,
    steps: usize,
}

impl Default for BallTask {
    fn default() -> Self {
        Self::new()
    }
}

impl BallTask {
    pub const OBSERVATION_LEN: usize = 6;

    #[must_use]
    pub fn new() -> Self {
        Self {
            agent: Vec2::new(50.0, 50.0),
            ball: Vec2::new(250.0, 400.0),
            target: ARENA_CENTER,
            milestones: Milestones::default(),
            steps: 0,
        }
    }

    /// Builds a task with explicit positions and milestones.
    #[must_use]
    pub fn with_state(agent: Vec2, ball: Vec2, target: Vec2, milestones: Milestones) -> Self {
        Self {
            agent,
            ball,
            target,
            milestones,
            steps: 0,
        }
    }
}

impl Task for BallTask {
    fn reset(&mut self, rng: Option<&mut dyn RngCore>) {
        *self = Self::new();
        if let Some(rng) = rng {
            (self.ball, self.agent) = random_layout(rng, self.target);
        }
    }

    fn step(&mut self, action: Vec2) {
        self.agent = self.agent + agent_displacement(action);
        if push_object(self.agent, &mut self.ball) {
            self.milestones.touched = true;
        }
        if self.milestones.touched && self.ball.distance(self.target) < CENTERED_RADIUS {
            self.milestones.centered = true;
        }
        self.steps += 1;
    }

    fn observe(&self) -> Observation {
        let mut observation = Observation::new();
        encode_offset(self.agent - self.ball, &mut observation);
        encode_offset(self.ball - self.target, &mut observation);
        observation.push(if self.milestones.touched { 1.0 } else { 0.0 });
        observation.push(1.0);
        observation
    }

    fn score(&self) -> f64 {
        let Milestones { touched, centered } = self.milestones;
        let agent_to_ball = dropoff(self.agent.distance(self.ball), DROPOFF_SCALE);
        if centered {
            (1.0 - agent_to_ball) + 2.0
        } else if touched {
            dropoff(self.ball.distance(self.target), DROPOFF_SCALE) + 1.0
        } else {
            agent_to_ball
        }
    }

    fn agent(&self) -> Vec2 {
        self.agent
    }

    fn object(&self) -> Vec2 {
        self.ball
    }

    fn target(&self) -> Vec2 {
        self.target
    }

    fn milestones(&self) -> Milestones {
        self.milestones
    }

    fn steps(&self) -> usize {
        self.steps
    }
}
