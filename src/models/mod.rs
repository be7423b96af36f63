//! Data models

pub mod assessment;
pub mod events;
pub mod user;

pub use assessment::*;
pub use events::*;
pub use user::*;
