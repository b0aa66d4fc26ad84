mod network;

pub use network::*;
