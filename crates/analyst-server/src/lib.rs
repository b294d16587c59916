#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Environment configuration.
pub mod config;
/// Route handlers and the router.
pub mod routes;
/// Shared handler state.
pub mod state;
/// Symbol list import.
pub mod symbols;

pub use config::AppConfig;
pub use routes::router;
pub use state::AppState;
pub use symbols::import_symbols;
