pub mod common;
pub mod entry;
pub mod payment;

pub use common::*;
pub use entry::*;
pub use payment::*;
