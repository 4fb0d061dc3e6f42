pub mod logging;
pub mod rgo;

pub use logging::*;
pub use rgo::*;
