pub mod candidate;
pub mod filter;
pub mod job;
pub mod surface;
