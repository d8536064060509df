#![forbid(unsafe_code)]

mod clock;
mod compose;
mod statement;
mod usage;

pub use compose::*;
pub use statement::*;
pub use usage::*;
