//! Service layer for the market simulation: configuration, logging, signal
//! handling and component wiring. The kernel stays transport-free; this crate
//! is the process around it.

pub mod config;
pub mod logging;
pub mod service;
pub mod signals;

pub use config::{load_configuration, LoggingConfig, PlayersConfig, ServiceConfig};
pub use logging::initialize_logging;
pub use service::ServiceState;
pub use signals::{graceful_shutdown, setup_signal_handlers};
