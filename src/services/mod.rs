pub mod api;
pub mod dashboard;
pub mod filter;
pub mod lifecycle;
pub mod notify;
pub mod poller;
pub mod registry;
