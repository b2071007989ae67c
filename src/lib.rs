//! Keeps a local snapshot of a Nomad cluster in sync for a terminal
//! dashboard, and tells the view on screen when its data changed.

pub mod app_state;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod scheduler;
pub mod watcher;

pub use crate::config::{Config, NomadConfig, WatcherConfig};
pub use crate::core::client::{NomadApi, NomadHttpClient, SearchOptions};
pub use crate::domain::common::model::{HandlerKind, LogSource, Topic};
pub use crate::errors::{ConfigError, NomadError};
pub use crate::scheduler::refresher::Refresher;
pub use crate::watcher::dispatcher::Dispatcher;
pub use crate::watcher::Watcher;
