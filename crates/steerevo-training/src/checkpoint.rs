//! Periodic persistence of the best individual.
//!
//! The trainer only decides *when* to checkpoint. *How* a checkpoint is
//! stored (file format, rendering, naming) belongs to the sink supplied by the
//! caller.

use std::convert::Infallible;

/// The best individual of one generation, handed to a [`CheckpointSink`].
#[derive(Debug)]
pub struct Checkpoint<'a, A> {
    pub generation: usize,
    pub fitness: f64,
    pub agent: &'a A,
}

impl<A> Clone for Checkpoint<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for Checkpoint<'_, A> {}

/// Destination for checkpoints.
///
/// A failing sink stops training: errors are propagated out of the trainer
/// and never retried.
pub trait CheckpointSink<A> {
    type Error;

    fn save(&mut self, checkpoint: Checkpoint<'_, A>) -> Result<(), Self::Error>;
}

/// Discards every checkpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCheckpoint;

impl<A> CheckpointSink<A> for NoCheckpoint {
    type Error = Infallible;

    fn save(&mut self, _checkpoint: Checkpoint<'_, A>) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<A, S> CheckpointSink<A> for &mut S
where
    S: CheckpointSink<A> + ?Sized,
{
    type Error = S::Error;

    fn save(&mut self, checkpoint: Checkpoint<'_, A>) -> Result<(), Self::Error> {
        (**self).save(checkpoint)
    }
}
