pub mod enriched;
pub mod incident;
pub mod location;
pub mod observation;
pub mod station;
