pub mod address;
pub mod asset;
pub mod batch;
pub mod settlement;
pub mod units;

pub use address::*;
pub use asset::*;
pub use batch::*;
pub use settlement::*;
pub use units::*;
