pub mod file_intake;
pub mod logging;
pub mod messages;

pub use file_intake::*;
