//! # imitator_rl
//! Imitation learning component for batch-constrained reinforcement learning.
//! The crate provides a trainer fitting a classifier network to mimic action
//! choices observed in logged data ([`ImitatorTrainer`](crate::training::ImitatorTrainer))
//! and a derived per-action validity mask
//! ([`get_valid_actions_from_imitator`](crate::masking::get_valid_actions_from_imitator))
//! used to restrict actions during downstream decision-making.
//! ## Licence: MIT


/// Neural network wrapper built on [`tch`] crate
pub mod torch_net;
/// Module with batch structures feeding the trainer
pub mod tensor_data;
/// Error types defined in this crate
pub mod error;
/// Module dedicated to training the imitator network
pub mod training;
/// Action validity masks derived from imitator confidence
pub mod masking;
/// Minimal demonstration networks and synthetic batches for examples and tests
pub mod demo;

pub use masking::{Imitator, get_valid_actions_from_imitator};
pub use training::ImitatorTrainer;

/// Reexports compatible [`tch`]
pub use tch;
