use tch::{Device, Kind, TchError, Tensor};
use crate::error::{ImitatorRlError, TensorError};
use crate::tensor_data::StateFeatures;
use crate::torch_net::ImitatorNet;

/// Imitator usable for action-validity masking. The two kinds of predictor
/// are explicit variants with a uniform [`predict`](Imitator::predict)
/// contract instead of a runtime capability check.
pub enum Imitator{
    /// Differentiable [`tch`] network producing raw per-action scores;
    /// scores are softmaxed into a probability distribution.
    Model(ImitatorNet),
    /// Non-differentiable predictor evaluated on host memory. Its output is
    /// treated as already probability-like, no softmax is applied.
    External(Box<dyn Fn(&Tensor) -> Tensor + Send>),
}

impl Imitator{

    /// Per-example action probability distribution for given features.
    pub fn predict(&self, float_features: &Tensor) -> Result<Tensor, ImitatorRlError>{
        match self{
            Self::Model(network) => {
                let outputs = tch::no_grad(|| (network.net())(float_features));
                outputs.f_softmax(1, Kind::Float)
                    .map_err(|e| TensorError::from_tch_with_context(
                        e, "Softmaxing imitator outputs into action distribution".into()).into())
            },
            Self::External(predictor) => {
                let host_features = float_features.f_to_device(Device::Cpu)
                    .map_err(|e| TensorError::from_tch_with_context(
                        e, "Moving features to host for external predictor".into()))?;
                Ok((predictor)(&host_features))
            },
        }
    }
}

impl From<ImitatorNet> for Imitator{
    fn from(network: ImitatorNet) -> Self {
        Self::Model(network)
    }
}

/// Creates mask for non-viable actions under the imitator.
///
/// Every action's probability is divided by the row maximum, so the best
/// action of each example has ratio 1; the mask is `1.0` where the ratio
/// reaches `drop_threshold` and `0.0` elsewhere. For `drop_threshold <= 1`
/// every example keeps at least one valid action.
pub fn get_valid_actions_from_imitator(
    imitator: &Imitator,
    input: &StateFeatures,
    drop_threshold: f64,
) -> Result<Tensor, ImitatorRlError>{

    let on_policy_action_probs = imitator.predict(input.float_features())?;
    valid_action_mask(&on_policy_action_probs, drop_threshold)
}

/// Mask computation on an already materialised `[batch, num_actions]`
/// probability tensor.
///
/// A row whose maximum is not positive carries no preference at all, so every
/// action in it stays valid; the NaN ratios such rows would produce never
/// reach the output.
pub fn valid_action_mask(action_probs: &Tensor, drop_threshold: f64)
    -> Result<Tensor, ImitatorRlError>{

    let mask = (|| -> Result<Tensor, TchError>{
        let (max_values, _max_idxs) = action_probs.f_max_dim(1, true)?;
        let filter_values = action_probs.f_div(&max_values)?;
        let mask = filter_values.f_ge(drop_threshold)?.f_to_kind(Kind::Float)?;
        let degenerate_rows = max_values.f_le(0.0)?.f_to_kind(Kind::Float)?;
        mask.f_maximum(&degenerate_rows)
    })().map_err(|e| TensorError::from_tch_with_context(
        e, "Computing valid action mask".into()))?;

    Ok(mask)
}
