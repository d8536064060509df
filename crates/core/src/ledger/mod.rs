#![forbid(unsafe_code)]

mod balance;
mod cycle;
mod grouping;
mod labels;
mod types;

pub use balance::*;
pub use cycle::*;
pub use grouping::*;
pub use labels::*;
pub use types::*;
