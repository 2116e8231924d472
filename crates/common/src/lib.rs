pub mod error;
pub mod tolerance;
pub mod types;
