pub mod navigation;
pub mod submission_flow;

pub use navigation::*;
pub use submission_flow::*;
