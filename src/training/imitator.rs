use std::fs::File;
use tboard::EventWriter;
use tch::{Kind, TchError, Tensor};
use tch::nn::Optimizer;
use crate::error::{ImitatorRlError, TensorError};
use crate::tensor_data::ImitationBatch;
use crate::torch_net::ImitatorNet;
use crate::training::{ImitatorOptimizerConfig, ImitatorTrainerConfig, RlParameters};

/// Trainer fitting an imitator classifier to action choices observed in
/// logged data. Each [`train`](ImitatorTrainer::train) call performs one
/// forward pass and reports prediction accuracy; in training mode it also
/// backpropagates cross entropy loss and lets the optimizer update the
/// network once enough minibatches accumulated.
///
/// The trainer owns the network and the optimizer state; callers serialize
/// access to an instance, there is no internal locking.
/// # Example:
/// ```
/// use tch::{Device, nn, Tensor};
/// use tch::nn::VarStore;
/// use imitator_rl::torch_net::ImitatorNet;
/// use imitator_rl::training::{
///     ImitatorOptimizerConfig,
///     ImitatorTrainer,
///     ImitatorTrainerConfig,
///     RlParameters
/// };
/// let var_store = VarStore::new(Device::Cpu);
/// let net = ImitatorNet::new(var_store, |path|{
///     let seq = nn::seq()
///         .add(nn::linear(path / "input", 4, 3, Default::default()));
///     move |xs: &Tensor|{ xs.apply(&seq) }
/// });
/// let trainer = ImitatorTrainer::new(
///     net,
///     ImitatorTrainerConfig::default(),
///     RlParameters::default(),
///     ImitatorOptimizerConfig::default()
/// ).unwrap();
/// ```
pub struct ImitatorTrainer{
    network: ImitatorNet,
    optimizer: Optimizer,
    config: ImitatorTrainerConfig,
    rl: RlParameters,
    accumulated_minibatches: usize,
    tboard_writer: Option<EventWriter<File>>,
    global_step: i64,
}

impl ImitatorTrainer{

    /// Builds the optimizer against the network's trainable variables.
    /// `minibatches_per_step` of `0` in the config is coerced to `1`.
    pub fn new(
        network: ImitatorNet,
        config: ImitatorTrainerConfig,
        rl: RlParameters,
        optimizer: ImitatorOptimizerConfig,
    ) -> Result<Self, ImitatorRlError>{

        let optimizer = optimizer.build(&network)
            .map_err(|e| ImitatorRlError::Torch {
                source: e,
                context: "Building imitator optimizer".into(),
            })?;
        let config = ImitatorTrainerConfig{
            minibatches_per_step: config.minibatches_per_step.max(1),
            ..config
        };
        Ok(Self{
            network,
            optimizer,
            config,
            rl,
            accumulated_minibatches: 0,
            tboard_writer: None,
            global_step: 0,
        })
    }

    pub fn network(&self) -> &ImitatorNet{
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut ImitatorNet{
        &mut self.network
    }

    pub fn config(&self) -> &ImitatorTrainerConfig{
        &self.config
    }

    pub fn rl_parameters(&self) -> &RlParameters{
        &self.rl
    }

    /// Number of optimizer-visible training calls performed so far.
    pub fn global_learning_step(&self) -> i64{
        self.global_step
    }

    /// Creates [`tboard::EventWriter`]. Initially the trainer does not use a
    /// `tensorboard` directory to store step accuracy, however you can provide
    /// it with a directory to create tensorboard files.
    pub fn add_tboard_directory<P: AsRef<std::path::Path>>(&mut self, directory_path: P)
        -> Result<(), ImitatorRlError>{

        let tboard = EventWriter::create(directory_path).map_err(|e|{
            ImitatorRlError::TboardFlattened {
                context: "Creating tboard EventWriter".into(),
                error: format!("{e}"),
            }
        })?;
        self.tboard_writer = Some(tboard);
        Ok(())
    }

    fn t_write_scalar(&mut self, tag: &str, value: f32) -> Result<bool, ImitatorRlError>{
        match &mut self.tboard_writer{
            None => Ok(false),
            Some(writer) => {
                writer.write_scalar(self.global_step, tag, value)
                    .map_err(|e| ImitatorRlError::TboardFlattened {
                        context: "Tboard - writing imitator accuracy scalar".to_string(),
                        error: format!("{e}"),
                    })?;
                Ok(true)
            }
        }
    }

    /// Fraction of examples whose predicted action index matches the true one,
    /// rounded to 3 decimal places.
    fn imitator_accuracy(predictions: &Tensor, true_labels: &Tensor) -> Result<f64, ImitatorRlError>{
        let matches_t = predictions
            .f_eq_tensor(true_labels)
            .and_then(|m| m.f_sum(Kind::Int64))
            .map_err(|e| TensorError::from_tch_with_context(
                e, "Counting matching action predictions".into()))?;
        let matches = i64::try_from(&matches_t)
            .map_err(|e| TensorError::from_tch_with_context(
                e, "Extracting match count from tensor".into()))?;
        let total = predictions.size()[0];
        Ok(((matches as f64 / total as f64) * 1000.0).round() / 1000.0)
    }

    /// Applies the deferred optimizer update once `minibatches_per_step`
    /// backward passes accumulated, then zeroes gradients.
    fn maybe_run_optimizer(&mut self){
        self.accumulated_minibatches += 1;
        if self.accumulated_minibatches >= self.config.minibatches_per_step{
            #[cfg(feature = "log_trace")]
            log::trace!("Applying imitator optimizer step after {} accumulated minibatches",
                self.accumulated_minibatches);
            self.optimizer.step();
            self.optimizer.zero_grad();
            self.accumulated_minibatches = 0;
        }
    }

    /// Runs one step on `batch` and returns prediction accuracy in `[0, 1]`
    /// rounded to 3 decimal places.
    ///
    /// With `train == false` the forward pass runs inside a no-grad scope and
    /// neither network parameters nor optimizer state are touched. With
    /// `train == true` gradients are tracked only around the forward/backward
    /// section and the optimizer may apply an accumulated update.
    pub fn train(&mut self, batch: &ImitationBatch, train: bool) -> Result<f64, ImitatorRlError>{
        let batch_size = batch.batch_size();
        if batch_size == 0{
            return Err(ImitatorRlError::NoTrainingData);
        }
        #[cfg(feature = "log_trace")]
        log::trace!("Imitator step on batch of size {batch_size} (train: {train})");

        let features = batch.state().float_features();
        let action_preds = match train{
            true => (self.network.net())(features),
            false => tch::no_grad(|| (self.network.net())(features)),
        };

        // Classification label is index of action with value 1
        let (pred_action_idxs, actual_action_idxs) = tch::no_grad(
            || -> Result<(Tensor, Tensor), TchError>{
                let predicted = action_preds.f_argmax(1, false)?;
                let actual = batch.action()
                    .f_argmax(1, false)?
                    .f_to_device(self.network.device())?;
                Ok((predicted, actual))
            }
        ).map_err(|e| TensorError::from_tch_with_context(
            e, "Recovering action indices from prediction and action tensors".into()))?;

        if train{
            let loss = action_preds.cross_entropy_for_logits(&actual_action_idxs);
            #[cfg(feature = "log_debug")]
            log::debug!("Imitator cross entropy loss: {}", loss.double_value(&[]));
            loss.backward();
            self.maybe_run_optimizer();
        }

        let accuracy = Self::imitator_accuracy(&pred_action_idxs, &actual_action_idxs)?;
        if train{
            self.global_step += 1;
            self.t_write_scalar("imitator/accuracy", accuracy as f32)?;
        }
        Ok(accuracy)
    }
}

#[cfg(test)]
mod tests{
    use std::collections::HashMap;
    use tch::{Device, Kind, Tensor, nn};
    use tch::nn::VarStore;
    use crate::demo::{demo_batch, demo_imitator_net};
    use crate::error::ImitatorRlError;
    use crate::tensor_data::{ImitationBatch, StateFeatures};
    use crate::torch_net::ImitatorNet;
    use crate::training::{
        ImitatorOptimizerConfig,
        ImitatorTrainer,
        ImitatorTrainerConfig,
        RlParameters
    };

    /// Network multiplying features by a single trainable scale initialised
    /// to 1, so prediction scores start out equal to the input features.
    fn scale_net() -> ImitatorNet{
        let var_store = VarStore::new(Device::Cpu);
        ImitatorNet::new(var_store, |path|{
            let scale = path.var("scale", &[1], nn::Init::Const(1.0));
            move |xs: &Tensor| xs * &scale
        })
    }

    fn trainer_with(network: ImitatorNet, minibatches_per_step: usize) -> ImitatorTrainer{
        let config = ImitatorTrainerConfig{
            minibatches_per_step,
            ..Default::default()
        };
        ImitatorTrainer::new(
            network,
            config,
            RlParameters::default(),
            ImitatorOptimizerConfig::default()
        ).unwrap()
    }

    fn batch(features: &[f32], action: &[f32], rows: i64, actions: i64) -> ImitationBatch{
        ImitationBatch::new(
            StateFeatures::new(Tensor::from_slice(features).reshape(&[rows, actions])),
            Tensor::from_slice(action).reshape(&[rows, actions]),
        )
    }

    fn parameter_snapshot(trainer: &ImitatorTrainer) -> HashMap<String, Tensor>{
        trainer.network().var_store().variables().iter()
            .map(|(name, tensor)| (name.clone(), tensor.copy()))
            .collect()
    }

    fn parameters_unchanged(snapshot: &HashMap<String, Tensor>, trainer: &ImitatorTrainer) -> bool{
        trainer.network().var_store().variables().iter()
            .all(|(name, tensor)| snapshot[name].allclose(tensor, 1e-12, 1e-12, false))
    }

    #[test]
    fn accuracy_one_when_every_prediction_matches(){
        let mut trainer = trainer_with(scale_net(), 1);
        let b = batch(
            &[0.1f32, 0.9, 0.0, 0.8, 0.1, 0.1],
            &[0.0f32, 1.0, 0.0, 1.0, 0.0, 0.0],
            2, 3);

        let accuracy = trainer.train(&b, false).unwrap();
        assert_eq!(accuracy, 1.0);
    }

    #[test]
    fn accuracy_zero_when_no_prediction_matches(){
        let mut trainer = trainer_with(scale_net(), 1);
        let b = batch(
            &[0.9f32, 0.1, 0.0, 0.1, 0.8, 0.1],
            &[0.0f32, 1.0, 0.0, 1.0, 0.0, 0.0],
            2, 3);

        let accuracy = trainer.train(&b, false).unwrap();
        assert_eq!(accuracy, 0.0);
    }

    #[test]
    fn accuracy_is_rounded_to_three_decimals(){
        let mut trainer = trainer_with(scale_net(), 1);
        let b = batch(
            &[0.9f32, 0.1, 0.9, 0.1, 0.1, 0.9],
            &[1.0f32, 0.0, 0.0, 1.0, 0.0, 1.0],
            3, 2);

        let accuracy = trainer.train(&b, false).unwrap();
        assert!((accuracy - 0.667).abs() < 1e-9);
    }

    #[test]
    fn forward_only_leaves_parameters_untouched(){
        tch::manual_seed(7);
        let mut trainer = trainer_with(demo_imitator_net(Device::Cpu, 4, 3, 16), 1);
        let snapshot = parameter_snapshot(&trainer);
        let b = demo_batch(8, 4, 3);

        trainer.train(&b, false).unwrap();

        assert!(parameters_unchanged(&snapshot, &trainer));
        assert_eq!(trainer.global_learning_step(), 0);
    }

    #[test]
    fn optimizer_steps_only_after_accumulated_minibatches(){
        tch::manual_seed(11);
        let mut trainer = trainer_with(demo_imitator_net(Device::Cpu, 4, 3, 16), 2);
        let b = demo_batch(16, 4, 3);
        let snapshot = parameter_snapshot(&trainer);

        trainer.train(&b, true).unwrap();
        assert!(parameters_unchanged(&snapshot, &trainer));

        trainer.train(&b, true).unwrap();
        assert!(!parameters_unchanged(&snapshot, &trainer));
    }

    #[test]
    fn training_fits_learnable_batch(){
        tch::manual_seed(42);
        let network = demo_imitator_net(Device::Cpu, 3, 3, 64);
        let config = ImitatorTrainerConfig{
            minibatch_size: 128,
            ..Default::default()
        };
        let optimizer = ImitatorOptimizerConfig::Adam {
            learning_rate: 0.01,
            beta1: 0.9,
            beta2: 0.999,
            weight_decay: 0.0,
        };
        let mut trainer = ImitatorTrainer::new(
            network, config, RlParameters::default(), optimizer).unwrap();
        let b = demo_batch(128, 3, 3);

        let initial = trainer.train(&b, false).unwrap();
        for _ in 0..600{
            trainer.train(&b, true).unwrap();
        }
        let trained = trainer.train(&b, false).unwrap();

        assert!((0.0..=1.0).contains(&trained));
        assert!(trained >= initial);
        assert!(trained >= 0.9, "expected accuracy over 0.9 after training, got {trained}");
    }

    #[test]
    fn empty_batch_is_rejected(){
        let mut trainer = trainer_with(scale_net(), 1);
        let b = ImitationBatch::new(
            StateFeatures::new(Tensor::zeros(&[0i64, 3], (Kind::Float, Device::Cpu))),
            Tensor::zeros(&[0i64, 3], (Kind::Float, Device::Cpu)),
        );

        assert!(matches!(trainer.train(&b, false), Err(ImitatorRlError::NoTrainingData)));
    }

    #[test]
    fn zero_minibatches_per_step_is_coerced_to_one(){
        let trainer = trainer_with(scale_net(), 0);
        assert_eq!(trainer.config().minibatches_per_step, 1);
    }
}
