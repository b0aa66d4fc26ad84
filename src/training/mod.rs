mod imitator;
mod params;

pub use imitator::*;
pub use params::*;
