pub mod clock;
pub mod config;
pub mod constants;
pub mod facebook;
pub mod job;
pub mod models;
pub mod pager;
pub mod server;
pub mod transport;
pub mod worker;
