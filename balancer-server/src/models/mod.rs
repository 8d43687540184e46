//! Request and response models

pub mod balance;
pub mod status;

pub use balance::*;
pub use status::*;
