pub mod cancellation;
pub mod entities;
pub mod errors;
pub mod mapping;
pub mod materialize;
