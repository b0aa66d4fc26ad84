use getset::Getters;
use tch::Tensor;

/// Observed state features fed to the imitator.
/// `float_features` has shape `[batch, feature_dim]` (or `[feature_dim]` for a
/// single example when used with [`get_valid_actions_from_imitator`](crate::masking::get_valid_actions_from_imitator)).
#[derive(Debug, Getters)]
pub struct StateFeatures{
    #[getset(get = "pub")]
    float_features: Tensor,
}

impl StateFeatures{
    pub fn new(float_features: Tensor) -> Self{
        Self{ float_features }
    }
}

/// Single training batch for the imitator: observed state features together
/// with the actions taken in the logged data. The taken action is encoded as
/// the entry with value `1` in the `[batch, num_actions]` action tensor, so
/// argmax over the action dimension recovers the classification label.
#[derive(Debug, Getters)]
pub struct ImitationBatch{
    #[getset(get = "pub")]
    state: StateFeatures,
    #[getset(get = "pub")]
    action: Tensor,
}

impl ImitationBatch{
    pub fn new(state: StateFeatures, action: Tensor) -> Self{
        Self{ state, action }
    }

    /// Number of examples in the batch (leading dimension of the action tensor).
    pub fn batch_size(&self) -> i64{
        self.action.size()[0]
    }
}
