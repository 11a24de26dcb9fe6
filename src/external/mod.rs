pub mod contest_api;
pub mod stripe;

pub use contest_api::*;
pub use stripe::*;
