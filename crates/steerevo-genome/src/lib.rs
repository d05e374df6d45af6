//! Graph-encoded neural controllers for the steering tasks.
//!
//! - [`Genotype`] - neurons, synapses and evaluation order; implements
//!   [`Agent`](steerevo_evaluator::agent::Agent) and
//!   [`Evolvable`](steerevo_training::reproduction::Evolvable)
//! - [`Phenotype`] - the evaluable network, with recurrent memory
//! - [`render`] - PNG topology drawings for checkpoints
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng as _;
//! use rand_pcg::Pcg32;
//! use steerevo_evaluator::agent::{Agent as _, Policy as _};
//! use steerevo_genome::{Activation, Genotype};
//! use steerevo_sim::TaskKind;
//! use steerevo_training::reproduction::Evolvable as _;
//!
//! let task = TaskKind::Target;
//! let mut genotype = Genotype::new(task.observation_len(), 2, Activation::Linear, Activation::Tanh);
//! let mut rng = Pcg32::seed_from_u64(0);
//! for _ in 0..10 {
//!     genotype.add_synapse(false, &mut rng);
//! }
//!
//! let mut policy = genotype.policy();
//! let action = policy.forward(&[0.1, -0.2, 0.3, 0.0, 1.0]);
//! assert!(action.length() <= 2.0_f64.sqrt());
//! ```

pub use self::{
    activation::Activation,
    genotype::{Genotype, GenotypeError, Neuron, NeuronKind, Synapse},
    phenotype::Phenotype,
};

mod activation;
mod genotype;
pub mod mutation;
mod phenotype;
pub mod render;
