pub mod engine;
pub mod error;
pub mod ledger;

pub use engine::*;
pub use error::*;
pub use ledger::*;
