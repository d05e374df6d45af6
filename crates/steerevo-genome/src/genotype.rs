//! Graph genotype: neurons, weighted synapses and an evaluation order.
//!
//! Neurons are identified by their index in [`Genotype::neurons`]. The
//! evaluation order lists every neuron exactly once; a phenotype computes
//! neuron values in that order each timestep.
//!
//! # Synapses
//!
//! - A **forward** synapse reads the current timestep's value of its source,
//!   so its source must come earlier in the evaluation order than its target.
//! - A **recurrent** synapse reads the source's value from the previous
//!   timestep and may connect any two neurons (including a neuron to itself).
//!
//! No synapse may target an input neuron.
//!
//! # Serialization
//!
//! Genotypes round-trip through serde. Deserialization validates the graph
//! and fails with a [`GenotypeError`] instead of producing a genotype that
//! could not be evaluated.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use steerevo_evaluator::agent::Agent;

use crate::{activation::Activation, phenotype::Phenotype};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeuronKind {
    Input,
    Hidden,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neuron {
    pub kind: NeuronKind,
    pub activation: Activation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Synapse {
    pub from: usize,
    pub to: usize,
    pub weight: f64,
    #[serde(default)]
    pub recurrent: bool,
}

/// Structural defect found while validating a genotype.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum GenotypeError {
    #[display("evaluation order is not a permutation of the {len} neurons")]
    InvalidOrder { len: usize },
    #[display("synapse {index} references missing neuron {neuron}")]
    MissingNeuron { index: usize, neuron: usize },
    #[display("synapse {index} targets input neuron {neuron}")]
    InputTarget { index: usize, neuron: usize },
    #[display("forward synapse {index} ({from} -> {to}) runs against the evaluation order")]
    AgainstOrder { index: usize, from: usize, to: usize },
    #[display("synapse {index} duplicates an earlier connection")]
    Duplicate { index: usize },
    #[display("synapse {index} has a non-finite weight")]
    NonFiniteWeight { index: usize },
}

#[derive(Deserialize)]
struct RawGenotype {
    neurons: Vec<Neuron>,
    synapses: Vec<Synapse>,
    order: Vec<usize>,
}

impl TryFrom<RawGenotype> for Genotype {
    type Error = GenotypeError;

    fn try_from(raw: RawGenotype) -> Result<Self, Self::Error> {
        let genotype = Self {
            neurons: raw.neurons,
            synapses: raw.synapses,
            order: raw.order,
        };
        genotype.validate()?;
        Ok(genotype)
    }
}

/// A directed, possibly recurrent neural network description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGenotype")]
pub struct Genotype {
    pub(crate) neurons: Vec<Neuron>,
    pub(crate) synapses: Vec<Synapse>,
    pub(crate) order: Vec<usize>,
}

impl Genotype {
    /// Creates an unconnected network: `inputs` input neurons followed by
    /// `outputs` output neurons, with no hidden neurons and no synapses.
    #[must_use]
    pub fn new(
        inputs: usize,
        outputs: usize,
        input_activation: Activation,
        output_activation: Activation,
    ) -> Self {
        let neurons = (0..inputs)
            .map(|_| Neuron {
                kind: NeuronKind::Input,
                activation: input_activation,
            })
            .chain((0..outputs).map(|_| Neuron {
                kind: NeuronKind::Output,
                activation: output_activation,
            }))
            .collect::<Vec<_>>();
        let order = (0..neurons.len()).collect();
        Self {
            neurons,
            synapses: vec![],
            order,
        }
    }

    /// Builds a genotype from its parts, validating the graph.
    pub fn from_parts(
        neurons: Vec<Neuron>,
        synapses: Vec<Synapse>,
        order: Vec<usize>,
    ) -> Result<Self, GenotypeError> {
        Self::try_from(RawGenotype {
            neurons,
            synapses,
            order,
        })
    }

    #[must_use]
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    #[must_use]
    pub fn synapses(&self) -> &[Synapse] {
        &self.synapses
    }

    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Counts of `(input, hidden, output)` neurons.
    #[must_use]
    pub fn topology(&self) -> (usize, usize, usize) {
        self.neurons
            .iter()
            .fold((0, 0, 0), |(i, h, o), neuron| match neuron.kind {
                NeuronKind::Input => (i + 1, h, o),
                NeuronKind::Hidden => (i, h + 1, o),
                NeuronKind::Output => (i, h, o + 1),
            })
    }

    /// Indices of neurons of `kind`, in neuron-index order.
    pub fn neurons_of(&self, kind: NeuronKind) -> impl Iterator<Item = usize> + '_ {
        self.neurons
            .iter()
            .enumerate()
            .filter(move |(_, neuron)| neuron.kind == kind)
            .map(|(index, _)| index)
    }

    /// Position of each neuron in the evaluation order.
    #[must_use]
    pub fn positions(&self) -> Vec<usize> {
        let mut positions = vec![0; self.order.len()];
        for (position, &neuron) in self.order.iter().enumerate() {
            positions[neuron] = position;
        }
        positions
    }

    #[must_use]
    pub fn has_synapse(&self, from: usize, to: usize, recurrent: bool) -> bool {
        self.synapses
            .iter()
            .any(|s| s.from == from && s.to == to && s.recurrent == recurrent)
    }

    /// Returns `true` if adding the synapse would keep the genotype valid.
    #[must_use]
    pub fn can_connect(&self, from: usize, to: usize, recurrent: bool) -> bool {
        let len = self.neurons.len();
        if from >= len || to >= len || self.neurons[to].kind == NeuronKind::Input {
            return false;
        }
        if !recurrent {
            let positions = self.positions();
            if positions[from] >= positions[to] {
                return false;
            }
        }
        !self.has_synapse(from, to, recurrent)
    }

    /// Checks every structural invariant.
    pub fn validate(&self) -> Result<(), GenotypeError> {
        let len = self.neurons.len();
        let mut seen = vec![false; len];
        if self.order.len() != len {
            return Err(GenotypeError::InvalidOrder { len });
        }
        for &neuron in &self.order {
            if neuron >= len || seen[neuron] {
                return Err(GenotypeError::InvalidOrder { len });
            }
            seen[neuron] = true;
        }

        let positions = self.positions();
        let mut connections = HashSet::new();
        for (index, synapse) in self.synapses.iter().enumerate() {
            for neuron in [synapse.from, synapse.to] {
                if neuron >= len {
                    return Err(GenotypeError::MissingNeuron { index, neuron });
                }
            }
            if self.neurons[synapse.to].kind == NeuronKind::Input {
                return Err(GenotypeError::InputTarget {
                    index,
                    neuron: synapse.to,
                });
            }
            if !synapse.recurrent && positions[synapse.from] >= positions[synapse.to] {
                return Err(GenotypeError::AgainstOrder {
                    index,
                    from: synapse.from,
                    to: synapse.to,
                });
            }
            if !connections.insert((synapse.from, synapse.to, synapse.recurrent)) {
                return Err(GenotypeError::Duplicate { index });
            }
            if !synapse.weight.is_finite() {
                return Err(GenotypeError::NonFiniteWeight { index });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn phenotype(&self) -> Phenotype {
        Phenotype::new(self)
    }
}

impl Agent for Genotype {
    type Policy = Phenotype;

    fn policy(&self) -> Self::Policy {
        self.phenotype()
    }

    /// Number of hidden neurons.
    fn structural_size(&self) -> usize {
        self.topology().1
    }
}
