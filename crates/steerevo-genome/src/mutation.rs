//! Structural and parametric mutation of [`Genotype`]s.
//!
//! Every operator keeps the genotype valid: forward synapses always follow
//! the evaluation order and no synapse ever targets an input neuron.

use rand::{Rng, seq::IndexedRandom as _};
use rand_distr::StandardNormal;
use steerevo_training::reproduction::Evolvable;

use crate::{
    activation::Activation,
    genotype::{Genotype, Neuron, NeuronKind, Synapse},
};

/// Standard deviation of a weight perturbation.
pub const WEIGHT_MUTATION_STD: f64 = 0.2;
/// Standard deviation of the weight of a new synapse.
pub const NEW_SYNAPSE_STD: f64 = 0.3;
/// Random endpoint pairs tried before giving up on adding a synapse.
pub const ADD_SYNAPSE_ATTEMPTS: usize = 5;
/// Activation of neurons created by splitting a synapse.
pub const HIDDEN_ACTIVATION: Activation = Activation::Relu;

fn gaussian<R>(rng: &mut R, std_dev: f64) -> f64
where
    R: Rng + ?Sized,
{
    let z: f64 = rng.sample(StandardNormal);
    z * std_dev
}

impl Evolvable for Genotype {
    fn mutate_weight<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        if self.synapses.is_empty() {
            return;
        }
        let index = rng.random_range(0..self.synapses.len());
        self.synapses[index].weight += gaussian(rng, WEIGHT_MUTATION_STD);
    }

    fn add_synapse<R>(&mut self, recurrent: bool, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let targets = self
            .neurons
            .iter()
            .enumerate()
            .filter(|(_, neuron)| neuron.kind != NeuronKind::Input)
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        if targets.is_empty() {
            return;
        }
        for _ in 0..ADD_SYNAPSE_ATTEMPTS {
            let from = rng.random_range(0..self.neurons.len());
            let Some(&to) = targets.choose(rng) else {
                return;
            };
            if self.can_connect(from, to, recurrent) {
                self.synapses.push(Synapse {
                    from,
                    to,
                    weight: gaussian(rng, NEW_SYNAPSE_STD),
                    recurrent,
                });
                return;
            }
        }
    }

    fn add_neuron<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let forward = self
            .synapses
            .iter()
            .enumerate()
            .filter(|(_, synapse)| !synapse.recurrent)
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        let Some(&index) = forward.choose(rng) else {
            return;
        };

        let split = self.synapses.remove(index);
        let hidden = self.neurons.len();
        self.neurons.push(Neuron {
            kind: NeuronKind::Hidden,
            activation: HIDDEN_ACTIVATION,
        });
        // Directly before the old target keeps `from < hidden < to`.
        let at = self
            .order
            .iter()
            .position(|&neuron| neuron == split.to)
            .unwrap_or(self.order.len());
        self.order.insert(at, hidden);
        self.synapses.push(Synapse {
            from: split.from,
            to: hidden,
            weight: 1.0,
            recurrent: false,
        });
        self.synapses.push(Synapse {
            from: hidden,
            to: split.to,
            weight: split.weight,
            recurrent: false,
        });
    }

    fn prune_synapse<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        if self.synapses.is_empty() {
            return;
        }
        let index = rng.random_range(0..self.synapses.len());
        self.synapses.remove(index);
    }

    /// Keeps the topology of `self`; every synapse that also exists in
    /// `other` (same endpoints and kind) takes either parent's weight with
    /// equal probability.
    fn crossover<R>(&self, other: &Self, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut child = self.clone();
        for synapse in &mut child.synapses {
            let mate = other.synapses.iter().find(|s| {
                s.from == synapse.from && s.to == synapse.to && s.recurrent == synapse.recurrent
            });
            if let Some(mate) = mate
                && rng.random_bool(0.5)
            {
                synapse.weight = mate.weight;
            }
        }
        child
    }
}
