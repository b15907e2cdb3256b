pub mod backend_options;
pub mod balloon;
pub mod checkpoint;
pub mod config;
pub mod dummy;
pub mod error;
pub mod latency;
pub mod plugin;
pub mod stats;
pub mod timer;
pub mod transport;

pub use backend_options::{BackendOptions, OptionValue, extract_backend_options};
pub use config::BenchmarkConfig;
pub use error::EngineError;
pub use plugin::{OpKind, PluginRegistry, PluginResult, StorageBuffer, StoragePlugin};
pub use stats::{GlobalStats, OpStat, PhaseKind, PhaseStats};
pub use timer::now;
pub use transport::{NullTransport, ReduceOp, Transport};
