use tch::{Device, TchError, Tensor};
use tch::nn::{Optimizer, OptimizerConfig, Path, VarStore};

/// Structure wrapping [`VarStore`] and network closure used to build the
/// imitator classifier. Examples in [`tch`](https://github.com/LaurentMazare/tch-rs)
/// show how neural networks are used. This structure shortens some steps of
/// setting and provides some helpful functions - especially
/// [`build_optimizer`](ImitatorNet::build_optimizer).
pub struct ImitatorNet{
    net: Box<dyn Fn(&Tensor) -> Tensor + Send>,
    var_store: VarStore,
}

/// To construct the network you need a `VarStore` and a function (closure)
/// taking `nn::Path` as argument and constructing a function (closure) which
/// applies the model to a feature `Tensor` producing per-action scores.
/// # Example:
/// ```
/// use tch::{Device, nn, Tensor};
/// use tch::nn::{Adam, VarStore};
/// use imitator_rl::torch_net::ImitatorNet;
/// let device = Device::cuda_if_available();
/// let var_store = VarStore::new(device);
/// let number_of_actions = 7_i64;
/// let net = ImitatorNet::new(var_store, |path|{
///     let seq = nn::seq()
///         .add(nn::linear(path / "input", 16, 128, Default::default()))
///         .add_fn(|xs| xs.relu())
///         .add(nn::linear(path / "output", 128, number_of_actions, Default::default()));
///     move |xs: &Tensor|{ xs.apply(&seq) }
/// });
///
/// let optimizer = net.build_optimizer(Adam::default(), 0.01).unwrap();
/// ```
impl ImitatorNet{

    pub fn new<
        N: 'static + Send + Fn(&Tensor) -> Tensor,
        F: Fn(&Path) -> N>
    (var_store: VarStore, model_closure: F) -> Self{

        let device = var_store.root().device();
        let model = (model_closure)(&var_store.root());
        Self{
            var_store,
            net: Box::new(move |x| {(model)(&x.to_device(device))}),
        }
    }

    /// Build optimiser for network, given `OptimizerConfig`. Uses [`VarStore`]
    /// stored in [`ImitatorNet`] struct.
    pub fn build_optimizer<OptC: OptimizerConfig>
        (&self, optimiser_config: OptC, learning_rate: f64) -> Result<Optimizer, TchError>{

        optimiser_config.build(&self.var_store, learning_rate)
    }

    /// Returns reference to internal network offering `Tensor -> Tensor` application.
    pub fn net(&self) -> &(dyn Fn(&Tensor) -> Tensor + Send){&self.net}

    pub fn device(&self) -> Device{
        self.var_store.device()
    }
    pub fn var_store(&self) -> &VarStore{
        &self.var_store
    }
    pub fn var_store_mut(&mut self) -> &mut VarStore{
        &mut self.var_store
    }
}
