use rand::Rng;
use tch::{Device, Tensor, nn};
use tch::nn::VarStore;
use crate::tensor_data::{ImitationBatch, StateFeatures};
use crate::torch_net::ImitatorNet;

/// Small feed forward classifier used in examples and tests.
pub fn demo_imitator_net(device: Device, num_features: i64, num_actions: i64, hidden: i64)
    -> ImitatorNet{

    let var_store = VarStore::new(device);
    ImitatorNet::new(var_store, |path|{
        let seq = nn::seq()
            .add(nn::linear(path / "input", num_features, hidden, Default::default()))
            .add_fn(|xs| xs.relu())
            .add(nn::linear(path / "output", hidden, num_actions, Default::default()));
        move |xs: &Tensor|{ xs.apply(&seq) }
    })
}

/// Synthetic imitation batch with a learnable feature-action relation:
/// the taken action is the index of the largest among the first
/// `num_actions` features. Requires `num_features >= num_actions`.
pub fn demo_batch(batch_size: i64, num_features: i64, num_actions: i64) -> ImitationBatch{
    let mut rng = rand::rng();

    let mut features = Vec::with_capacity((batch_size * num_features) as usize);
    for _ in 0..batch_size * num_features{
        features.push(rng.random::<f32>());
    }
    let mut action = vec![0.0f32; (batch_size * num_actions) as usize];
    for row in 0..batch_size as usize{
        let row_features = &features[row * num_features as usize..][..num_actions as usize];
        let taken = row_features.iter().enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .unwrap_or(0);
        action[row * num_actions as usize + taken] = 1.0;
    }

    ImitationBatch::new(
        StateFeatures::new(
            Tensor::from_slice(&features).reshape(&[batch_size, num_features])),
        Tensor::from_slice(&action).reshape(&[batch_size, num_actions]),
    )
}

#[cfg(test)]
mod tests{
    use tch::Kind;
    use super::demo_batch;

    #[test]
    fn demo_batch_actions_are_one_hot(){
        let batch = demo_batch(32, 5, 3);

        assert_eq!(batch.state().float_features().size(), vec![32, 5]);
        assert_eq!(batch.action().size(), vec![32, 3]);

        let row_sums = batch.action().sum_dim_intlist(1, false, Kind::Float);
        let sums = Vec::<f32>::try_from(row_sums).unwrap();
        assert!(sums.iter().all(|s| (s - 1.0).abs() < f32::EPSILON));
    }
}
