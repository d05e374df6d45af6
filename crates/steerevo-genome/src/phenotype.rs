//! Evaluable form of a [`Genotype`].

use steerevo_evaluator::agent::Policy;
use steerevo_sim::Vec2;

use crate::{
    activation::Activation,
    genotype::{Genotype, NeuronKind},
};

/// A compiled network with recurrent memory.
///
/// Input `k` of [`Phenotype::activate`] feeds the `k`-th input neuron (by
/// neuron index); missing inputs read as zero and extra inputs are ignored.
/// Outputs are reported in neuron-index order.
#[derive(Debug, Clone)]
pub struct Phenotype {
    activations: Vec<Activation>,
    order: Vec<usize>,
    input_slot: Vec<Option<usize>>,
    outputs: Vec<usize>,
    forward_in: Vec<Vec<(usize, f64)>>,
    recurrent_in: Vec<Vec<(usize, f64)>>,
    values: Vec<f64>,
    previous: Vec<f64>,
    output_values: Vec<f64>,
}

impl Phenotype {
    #[must_use]
    pub fn new(genotype: &Genotype) -> Self {
        let len = genotype.neurons().len();
        let mut input_slot = vec![None; len];
        for (slot, neuron) in genotype.neurons_of(NeuronKind::Input).enumerate() {
            input_slot[neuron] = Some(slot);
        }
        let outputs = genotype.neurons_of(NeuronKind::Output).collect::<Vec<_>>();

        let mut forward_in = vec![vec![]; len];
        let mut recurrent_in = vec![vec![]; len];
        for synapse in genotype.synapses() {
            let incoming = if synapse.recurrent {
                &mut recurrent_in[synapse.to]
            } else {
                &mut forward_in[synapse.to]
            };
            incoming.push((synapse.from, synapse.weight));
        }

        Self {
            activations: genotype.neurons().iter().map(|n| n.activation).collect(),
            order: genotype.order().to_vec(),
            input_slot,
            output_values: vec![0.0; outputs.len()],
            outputs,
            forward_in,
            recurrent_in,
            values: vec![0.0; len],
            previous: vec![0.0; len],
        }
    }

    /// Advances the network by one timestep and returns the output values.
    pub fn activate(&mut self, inputs: &[f64]) -> &[f64] {
        std::mem::swap(&mut self.values, &mut self.previous);
        for &neuron in &self.order {
            let sum = match self.input_slot[neuron] {
                Some(slot) => inputs.get(slot).copied().unwrap_or(0.0),
                None => {
                    let current = self.forward_in[neuron]
                        .iter()
                        .map(|&(from, weight)| weight * self.values[from])
                        .sum::<f64>();
                    let memory = self.recurrent_in[neuron]
                        .iter()
                        .map(|&(from, weight)| weight * self.previous[from])
                        .sum::<f64>();
                    current + memory
                }
            };
            self.values[neuron] = self.activations[neuron].apply(sum);
        }
        for (value, &neuron) in self.output_values.iter_mut().zip(&self.outputs) {
            *value = self.values[neuron];
        }
        &self.output_values
    }

    pub fn reset_memory(&mut self) {
        self.values.fill(0.0);
        self.previous.fill(0.0);
    }
}

impl Policy for Phenotype {
    /// The first two outputs are the requested velocity.
    fn forward(&mut self, observation: &[f64]) -> Vec2 {
        let outputs = self.activate(observation);
        let x = outputs.first().copied().unwrap_or(0.0);
        let y = outputs.get(1).copied().unwrap_or(0.0);
        Vec2::new(x, y)
    }

    fn reset_memory(&mut self) {
        Self::reset_memory(self);
    }
}
