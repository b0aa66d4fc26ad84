use serde::{Deserialize, Serialize};
use tch::TchError;
use tch::nn::{self, Optimizer};
use crate::torch_net::ImitatorNet;

/// RL hyperparameters shared across the trainer family. The imitator trainer
/// stores them for parity with value-based trainers built on the same data,
/// it does not consume them in its own train step.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct RlParameters{
    pub gamma: f64,
    pub epsilon: f64,
    pub temperature: f64,
    pub softmax_policy: bool,
}

impl Default for RlParameters{
    fn default() -> Self {
        Self{
            gamma: 0.9,
            epsilon: 0.2,
            temperature: 0.01,
            softmax_policy: false,
        }
    }
}

/// Configuration of [`ImitatorTrainer`](crate::training::ImitatorTrainer).
///
/// `minibatches_per_step` counts how many backward passes are accumulated
/// before the optimizer applies an update; `0` is coerced to `1` when the
/// trainer is constructed.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct ImitatorTrainerConfig{
    pub use_gpu: bool,
    pub minibatch_size: usize,
    pub minibatches_per_step: usize,
}

impl Default for ImitatorTrainerConfig{
    fn default() -> Self {
        Self{
            use_gpu: false,
            minibatch_size: 1024,
            minibatches_per_step: 1,
        }
    }
}

/// Optimizer selection resolved against the imitator network's trainable
/// variables when the trainer is constructed.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub enum ImitatorOptimizerConfig{
    Adam{
        learning_rate: f64,
        beta1: f64,
        beta2: f64,
        weight_decay: f64,
    },
    Sgd{
        learning_rate: f64,
        momentum: f64,
        weight_decay: f64,
    },
    RmsProp{
        learning_rate: f64,
        alpha: f64,
        momentum: f64,
    },
}

impl Default for ImitatorOptimizerConfig{
    fn default() -> Self {
        Self::Adam {
            learning_rate: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            weight_decay: 0.0,
        }
    }
}

impl ImitatorOptimizerConfig{

    /// Builds concrete [`Optimizer`] bound to variables of given network.
    pub fn build(&self, network: &ImitatorNet) -> Result<Optimizer, TchError>{
        match *self{
            Self::Adam { learning_rate, beta1, beta2, weight_decay } => {
                network.build_optimizer(
                    nn::Adam{ beta1, beta2, wd: weight_decay, ..nn::Adam::default() },
                    learning_rate)
            },
            Self::Sgd { learning_rate, momentum, weight_decay } => {
                network.build_optimizer(
                    nn::Sgd{ momentum, wd: weight_decay, ..nn::Sgd::default() },
                    learning_rate)
            },
            Self::RmsProp { learning_rate, alpha, momentum } => {
                network.build_optimizer(
                    nn::RmsProp{ alpha, momentum, ..nn::RmsProp::default() },
                    learning_rate)
            },
        }
    }
}

#[cfg(test)]
mod tests{
    use super::ImitatorOptimizerConfig;

    #[test]
    fn default_optimizer_is_adam(){
        match ImitatorOptimizerConfig::default(){
            ImitatorOptimizerConfig::Adam { learning_rate, .. } => {
                assert!((learning_rate - 1e-3).abs() < f64::EPSILON);
            },
            other => panic!("expected Adam default, got {:?}", other),
        }
    }
}
