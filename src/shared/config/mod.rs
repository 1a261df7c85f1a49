pub mod model;

pub use model::{DispatchConfig, LoggingConfig, MergeConfig, Settings, load_settings};
