//! Fitness evaluation: scoring agents by playing simulated episodes.
//!
//! This crate sits between the training loop and the task simulator:
//!
//! ```text
//! Training (steerevo-training)
//!     ↓ asks for fitness of an agent
//! Fitness Evaluator
//!     ↓ plays episodes of
//! Task (steerevo-sim)
//! ```
//!
//! - [`agent`] - the narrow interface an evolvable controller must provide
//! - [`fitness_evaluator`] - repeated episodes, averaging and complexity penalty
//!
//! The evaluator never mutates the agent it scores. It asks the agent for a
//! fresh [`agent::Policy`] and drives that instead, so evaluation needs only
//! shared access and can run on many threads at once.

pub mod agent;
pub mod fitness_evaluator;
