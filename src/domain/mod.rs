pub mod campaign;
pub mod donation;
pub mod money;
pub mod order;
pub mod volunteer;

pub use campaign::*;
pub use donation::*;
pub use order::*;
pub use volunteer::*;
