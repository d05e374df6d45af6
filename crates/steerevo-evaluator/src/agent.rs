//! Interface between the harness and an evolvable controller.

use steerevo_sim::Vec2;

/// An evaluable controller: maps observations to a desired velocity.
///
/// Implementations may keep recurrent state between calls to
/// [`Policy::forward`]; [`Policy::reset_memory`] clears it.
pub trait Policy {
    /// Computes the action for one timestep.
    fn forward(&mut self, observation: &[f64]) -> Vec2;

    /// Clears any state carried over from previous timesteps.
    fn reset_memory(&mut self);
}

/// A member of the population.
pub trait Agent: Send + Sync {
    type Policy: Policy;

    /// Builds an evaluable policy from this agent.
    fn policy(&self) -> Self::Policy;

    /// Size metric used by the complexity penalty (for example the number of
    /// hidden units).
    fn structural_size(&self) -> usize;
}
