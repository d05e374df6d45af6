//! Generational training of evolvable agents.
//!
//! # How Training Works
//!
//! 1. **Initialize** - Fill the population with copies of a common ancestor
//! 2. **Evaluate** - Each individual plays several episodes (in parallel)
//! 3. **Rank** - Stable sort of individuals by descending fitness
//! 4. **Sample** - Draw parent indices biased toward the top of the ranking
//! 5. **Reproduce** - Clone (or cross) each parent and apply mutation gates
//! 6. **Checkpoint** - Every few generations, hand the best individual to a sink
//! 7. **Repeat** - Until the generation budget is spent or a stop is requested
//!
//! # Architecture
//!
//! ```text
//! Trainer (generation loop)
//!     ├─ Population ── FitnessEvaluator (steerevo-evaluator) ── Task (steerevo-sim)
//!     ├─ ranking::rank
//!     ├─ sampling::PercentileSampler
//!     ├─ reproduction::Reproducer ── Evolvable (agent capability)
//!     └─ checkpoint::CheckpointSink (storage, injected)
//! ```
//!
//! The agent representation is not part of this crate. Anything implementing
//! [`steerevo_evaluator::agent::Agent`] and [`reproduction::Evolvable`] can be
//! trained.
//!
//! # Determinism
//!
//! All randomness flows from a single [`rand_pcg::Pcg32`] seeded when the
//! [`trainer::Trainer`] is created. Parallel evaluation derives one seed per
//! individual before spawning, so results do not depend on thread
//! scheduling.

pub mod checkpoint;
pub mod population;
pub mod ranking;
pub mod reproduction;
pub mod sampling;
pub mod stats;
pub mod trainer;
