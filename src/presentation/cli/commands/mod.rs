pub mod cleanup;
pub mod setup;

pub use cleanup::*;
pub use setup::*;
