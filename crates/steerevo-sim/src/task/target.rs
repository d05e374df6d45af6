use rand::RngCore;

use crate::{Vec2, shaping::dropoff};

use super::{
    ARENA_CENTER, DROPOFF_SCALE, Milestones, Observation, Task, agent_displacement,
    encode_offset, push_object, random_layout,
};

/// Push a single target into the arena centre.
///
/// The score is taken from the final state only:
///
/// ```text
/// score = 0.3 * dropoff(|agent - target|) + 0.7 * dropoff(|centre - target|)
/// ```
#[derive(Debug, Clone)]
pub struct TargetTask {
    agent: Vec2,
    target: Vec2,
    milestones: Milestones,
    steps: usize,
}

impl Default for TargetTask {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetTask {
    pub const OBSERVATION_LEN: usize = 5;

    const AGENT_WEIGHT: f64 = 0.3;
    const CENTER_WEIGHT: f64 = 0.7;

    #[must_use]
    pub fn new() -> Self {
        Self {
            agent: Vec2::new(50.0, 50.0),
            target: ARENA_CENTER,
            milestones: Milestones::default(),
            steps: 0,
        }
    }

    /// Builds a task with explicit positions.
    #[must_use]
    pub fn with_positions(agent: Vec2, target: Vec2) -> Self {
        Self {
            agent,
            target,
            ..Self::new()
        }
    }
}

impl Task for TargetTask {
    fn reset(&mut self, rng: Option<&mut dyn RngCore>) {
        *self = Self::new();
        if let Some(rng) = rng {
            (self.target, self.agent) = random_layout(rng, ARENA_CENTER);
        }
    }

    fn step(&mut self, action: Vec2) {
        self.agent = self.agent + agent_displacement(action);
        if push_object(self.agent, &mut self.target) {
            self.milestones.touched = true;
        }
        self.steps += 1;
    }

    fn observe(&self) -> Observation {
        let mut observation = Observation::new();
        encode_offset(self.agent - self.target, &mut observation);
        encode_offset(self.agent - ARENA_CENTER, &mut observation);
        observation.push(1.0);
        observation
    }

    fn score(&self) -> f64 {
        Self::AGENT_WEIGHT * dropoff(self.agent.distance(self.target), DROPOFF_SCALE)
            + Self::CENTER_WEIGHT * dropoff(ARENA_CENTER.distance(self.target), DROPOFF_SCALE)
    }

    fn agent(&self) -> Vec2 {
        self.agent
    }

    fn object(&self) -> Vec2 {
        self.target
    }

    fn target(&self) -> Vec2 {
        ARENA_CENTER
    }

    fn milestones(&self) -> Milestones {
        self.milestones
    }

    fn steps(&self) -> usize {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::task::{AGENT_SPEED, PLACEMENT_RADIUS, TIMESTEP};

    #[test]
    fn test_reset_without_rng_is_deterministic() {
        let mut task = TargetTask::new();
        task.step(Vec2::new(1.0, 1.0));
        task.reset(None);
        assert_eq!(task.agent(), Vec2::new(50.0, 50.0));
        assert_eq!(task.object(), ARENA_CENTER);
        assert_eq!(task.steps(), 0);
    }

    #[test]
    fn test_randomized_reset_keeps_separation() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut task = TargetTask::new();

        task.reset(Some(&mut rng));
        let first = (task.agent(), task.object());
        task.reset(Some(&mut rng));
        let second = (task.agent(), task.object());

        assert_ne!(first, second);
        for (agent, target) in [first, second] {
            assert!((agent.distance(target) - PLACEMENT_RADIUS).abs() < 1e-9);
            assert!((target.distance(ARENA_CENTER) - PLACEMENT_RADIUS).abs() < 1e-9);
        }
    }

    #[test]
    fn test_step_moves_agent() {
        let mut task = TargetTask::new();
        task.step(Vec2::new(2.0, 0.0));
        assert!((task.agent().x - (50.0 + AGENT_SPEED * TIMESTEP)).abs() < 1e-12);
        assert_eq!(task.agent().y, 50.0);
        assert_eq!(task.steps(), 1);
        assert!(!task.milestones().touched);
    }

    #[test]
    fn test_touch_on_first_step_when_overlapping() {
        for action in [Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(-5.0, 7.0)] {
            let mut task = TargetTask::with_positions(ARENA_CENTER, ARENA_CENTER);
            task.step(action);
            assert!(task.milestones().touched, "not touched with {action}");
        }
    }

    #[test]
    fn test_observation_layout() {
        let task = TargetTask::with_positions(Vec2::new(600.0, 400.0), Vec2::new(400.0, 200.0));
        let observation = task.observe();
        assert_eq!(observation.len(), TargetTask::OBSERVATION_LEN);
        // agent - target = (200, 200) / 800 = 0.25 -> sqrt = 0.5
        assert!((observation[0] - 0.5).abs() < 1e-12);
        assert!((observation[1] - 0.5).abs() < 1e-12);
        // agent - centre = (200, 0)
        assert!((observation[2] - 0.5).abs() < 1e-12);
        assert_eq!(observation[3], 0.0);
        assert_eq!(observation[4], 1.0);
    }

    #[test]
    fn test_score_prefers_centred_target() {
        let centred = TargetTask::with_positions(Vec2::new(100.0, 100.0), ARENA_CENTER);
        let away = TargetTask::with_positions(Vec2::new(100.0, 100.0), Vec2::new(150.0, 150.0));
        assert!(centred.score() > away.score());

        let perfect = TargetTask::with_positions(ARENA_CENTER, ARENA_CENTER);
        assert!((perfect.score() - 1.0).abs() < 1e-12);
    }
}
