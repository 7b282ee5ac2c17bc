pub mod catalog;
pub mod distance;
pub mod error;
