//! Offspring production from sampled parents.
//!
//! Every offspring starts as a copy of its parent (or, with probability
//! `crossover_rate`, as a crossover of its parent with a second sampled
//! parent) and then passes through a fixed set of mutation gates. Each gate
//! is an independent Bernoulli trial evaluated once per offspring:
//!
//! | gate                | default | operation                         |
//! |---------------------|---------|-----------------------------------|
//! | `weight`            | 0.90    | perturb one existing weight       |
//! | `synapse`           | 0.10    | add a forward connection          |
//! | `recurrent_synapse` | 0.02    | add a recurrent connection (only when `recurrent_enabled`) |
//! | `neuron`            | 0.01    | add a hidden unit                 |
//! | `prune`             | 0.00    | remove a connection               |

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sampling::PercentileSampler;

/// Mutation and crossover operators of an agent representation.
///
/// Operators that cannot apply (for example perturbing a weight of an agent
/// without connections) leave the agent unchanged.
pub trait Evolvable: Clone + Send + Sync {
    /// Perturbs the weight of one existing connection.
    fn mutate_weight<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized;

    /// Adds a new connection; `recurrent` connections read the previous
    /// timestep's values.
    fn add_synapse<R>(&mut self, recurrent: bool, rng: &mut R)
    where
        R: Rng + ?Sized;

    /// Adds a hidden unit.
    fn add_neuron<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized;

    /// Removes one connection.
    fn prune_synapse<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized;

    /// Combines two parents; `self` is the fitter one and provides the
    /// structure.
    #[must_use]
    fn crossover<R>(&self, other: &Self, rng: &mut R) -> Self
    where
        R: Rng + ?Sized;
}

/// Independent mutation probabilities applied to every offspring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationGates {
    pub weight: f64,
    pub synapse: f64,
    pub recurrent_synapse: f64,
    pub neuron: f64,
    pub prune: f64,
    /// Enables the `recurrent_synapse` gate.
    pub recurrent_enabled: bool,
}

impl Default for MutationGates {
    fn default() -> Self {
        Self {
            weight: 0.9,
            synapse: 0.1,
            recurrent_synapse: 0.02,
            neuron: 0.01,
            prune: 0.0,
            recurrent_enabled: false,
        }
    }
}

impl MutationGates {
    /// Gate probabilities by name, for validation and reporting.
    #[must_use]
    pub fn probabilities(&self) -> [(&'static str, f64); 5] {
        [
            ("weight", self.weight),
            ("synapse", self.synapse),
            ("recurrent_synapse", self.recurrent_synapse),
            ("neuron", self.neuron),
            ("prune", self.prune),
        ]
    }

    /// Runs every gate once on `agent`.
    ///
    /// # Panics
    ///
    /// Panics if a probability is outside `[0, 1]`.
    pub fn apply<A, R>(&self, agent: &mut A, rng: &mut R)
    where
        A: Evolvable,
        R: Rng + ?Sized,
    {
        if rng.random_bool(self.weight) {
            agent.mutate_weight(rng);
        }
        if rng.random_bool(self.synapse) {
            agent.add_synapse(false, rng);
        }
        if self.recurrent_enabled && rng.random_bool(self.recurrent_synapse) {
            agent.add_synapse(true, rng);
        }
        if rng.random_bool(self.neuron) {
            agent.add_neuron(rng);
        }
        if rng.random_bool(self.prune) {
            agent.prune_synapse(rng);
        }
    }
}

/// Builds the next generation from sampled parent indices.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reproducer {
    pub gates: MutationGates,
    /// Probability that an offspring is a crossover of two sampled parents
    /// instead of a copy of one.
    pub crossover_rate: f64,
}

impl Reproducer {
    /// Produces one offspring per entry of `parent_indices`.
    ///
    /// `parents` must be ranked best-first; `sampler` draws the second parent
    /// for crossovers.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds or a probability is outside `[0, 1]`.
    pub fn reproduce<A, R>(
        &self,
        parents: &[A],
        parent_indices: &[usize],
        sampler: &PercentileSampler,
        rng: &mut R,
    ) -> Vec<A>
    where
        A: Evolvable,
        R: Rng + ?Sized,
    {
        parent_indices
            .iter()
            .map(|&index| {
                let mut child = if rng.random_bool(self.crossover_rate) {
                    let mate = sampler.draw(parents.len(), rng);
                    let (fitter, other) = (index.min(mate), index.max(mate));
                    parents[fitter].crossover(&parents[other], rng)
                } else {
                    parents[index].clone()
                };
                self.gates.apply(&mut child, rng);
                child
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    /// Records which operators were applied.
    #[derive(Debug, Clone, Default, PartialEq)]
    struct Tally {
        origin: usize,
        weights: usize,
        synapses: usize,
        recurrent: usize,
        neurons: usize,
        pruned: usize,
        crossed_with: Option<usize>,
    }

    impl Tally {
        fn new(origin: usize) -> Self {
            Self {
                origin,
                ..Self::default()
            }
        }
    }

    impl Evolvable for Tally {
        fn mutate_weight<R: Rng + ?Sized>(&mut self, _rng: &mut R) {
            self.weights += 1;
        }

        fn add_synapse<R: Rng + ?Sized>(&mut self, recurrent: bool, _rng: &mut R) {
            if recurrent {
                self.recurrent += 1;
            } else {
                self.synapses += 1;
            }
        }

        fn add_neuron<R: Rng + ?Sized>(&mut self, _rng: &mut R) {
            self.neurons += 1;
        }

        fn prune_synapse<R: Rng + ?Sized>(&mut self, _rng: &mut R) {
            self.pruned += 1;
        }

        fn crossover<R: Rng + ?Sized>(&self, other: &Self, _rng: &mut R) -> Self {
            Self {
                crossed_with: Some(other.origin),
                ..self.clone()
            }
        }
    }

    const ALWAYS: MutationGates = MutationGates {
        weight: 1.0,
        synapse: 1.0,
        recurrent_synapse: 1.0,
        neuron: 1.0,
        prune: 1.0,
        recurrent_enabled: true,
    };

    const NEVER: MutationGates = MutationGates {
        weight: 0.0,
        synapse: 0.0,
        recurrent_synapse: 0.0,
        neuron: 0.0,
        prune: 0.0,
        recurrent_enabled: true,
    };

    #[test]
    fn test_all_gates_open() {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut agent = Tally::new(0);
        ALWAYS.apply(&mut agent, &mut rng);
        assert_eq!(
            (agent.weights, agent.synapses, agent.recurrent, agent.neurons, agent.pruned),
            (1, 1, 1, 1, 1)
        );
    }

    #[test]
    fn test_recurrent_gate_needs_flag() {
        let mut rng = Pcg32::seed_from_u64(0);
        let gates = MutationGates {
            recurrent_enabled: false,
            ..ALWAYS
        };
        let mut agent = Tally::new(0);
        gates.apply(&mut agent, &mut rng);
        assert_eq!(agent.recurrent, 0);
        assert_eq!(agent.synapses, 1);
    }

    #[test]
    fn test_closed_gates_leave_copy() {
        let mut rng = Pcg32::seed_from_u64(0);
        let parents = (0..5).map(Tally::new).collect::<Vec<_>>();
        let reproducer = Reproducer {
            gates: NEVER,
            crossover_rate: 0.0,
        };
        let children =
            reproducer.reproduce(&parents, &[3, 0, 0, 4], &PercentileSampler::default(), &mut rng);
        assert_eq!(children, vec![
            Tally::new(3),
            Tally::new(0),
            Tally::new(0),
            Tally::new(4)
        ]);
    }

    #[test]
    #[expect(clippy::cast_precision_loss)]
    fn test_gate_frequencies() {
        let mut rng = Pcg32::seed_from_u64(1);
        let gates = MutationGates::default();
        let trials: u32 = 20_000;
        let mut total = Tally::default();
        for _ in 0..trials {
            let mut agent = Tally::default();
            gates.apply(&mut agent, &mut rng);
            total.weights += agent.weights;
            total.synapses += agent.synapses;
            total.recurrent += agent.recurrent;
            total.neurons += agent.neurons;
            total.pruned += agent.pruned;
        }
        let rate = |n: usize| n as f64 / f64::from(trials);
        assert!((rate(total.weights) - 0.9).abs() < 0.02);
        assert!((rate(total.synapses) - 0.1).abs() < 0.02);
        assert!((rate(total.neurons) - 0.01).abs() < 0.005);
        assert_eq!(total.recurrent, 0);
        assert_eq!(total.pruned, 0);
    }

    #[test]
    fn test_crossover_uses_fitter_parent_as_base() {
        let mut rng = Pcg32::seed_from_u64(2);
        let parents = (0..10).map(Tally::new).collect::<Vec<_>>();
        let reproducer = Reproducer {
            gates: NEVER,
            crossover_rate: 1.0,
        };
        let sampler = PercentileSampler::new(1.0, 0.0).unwrap();
        let indices = sampler.sample(parents.len(), 50, &mut rng);
        let children = reproducer.reproduce(&parents, &indices, &sampler, &mut rng);
        for (child, index) in children.iter().zip(&indices) {
            let mate = child.crossed_with.unwrap();
            assert!(child.origin <= mate);
            assert!(child.origin == *index || mate == *index);
        }
    }
}
