// Library surface shared by the binary and the integration tests.
pub mod analysis;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod scoring;
pub mod service;
pub mod session;
pub mod store;
pub mod util;
