pub mod adapter;
pub mod config;
pub mod errors;
pub mod handler;
pub mod server;
pub mod telemetry;

pub use config::EchoConfig;
pub use errors::{EchoError, Result};
pub use handler::{DemoResponse, handle};
