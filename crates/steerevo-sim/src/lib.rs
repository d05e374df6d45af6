//! Episodic 2D steering tasks used to score evolved controllers.
//!
//! An agent moves around an 800×800 arena by requesting a velocity each
//! timestep. Touching the controlled object pushes it away, so the agent has
//! to learn to shepherd the object toward a goal.
//!
//! - [`Vec2`] - 2D vector arithmetic
//! - [`shaping`] - fitness shaping helpers ([`shaping::dropoff`], [`shaping::signed_sqrt`])
//! - [`Task`] - episode contract shared by every task variant
//! - [`TargetTask`] - push a single target into the arena centre
//! - [`BallTask`] - touch a ball, push it onto the target, then back off
//! - [`TaskKind`] - configuration-level selection of a variant
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng as _;
//! use rand_pcg::Pcg32;
//! use steerevo_sim::{TaskKind, Vec2};
//!
//! let mut rng = Pcg32::seed_from_u64(7);
//! let mut task = TaskKind::Ball.build();
//! task.reset(Some(&mut rng));
//!
//! for _ in 0..600 {
//!     let observation = task.observe();
//!     assert_eq!(observation.len(), TaskKind::Ball.observation_len());
//!     task.step(Vec2::new(1.0, 0.0));
//! }
//!
//! let score = task.score();
//! assert!(score > 0.0);
//! ```

pub use self::{task::*, vec2::Vec2};

pub mod shaping;
pub mod task;
mod vec2;
