//! VC Scout Dashboard
//!
//! Client-side core of the venture research dashboard: it mirrors search jobs
//! held by the remote research API, polls the selected job for progress and
//! candidates, and coordinates pause/resume/delete and the batched memory
//! filter so local state stays consistent with the server.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
