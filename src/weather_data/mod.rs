pub mod cache;
pub mod error;
pub mod fetcher;
pub(crate) mod frame;
pub mod transport;
