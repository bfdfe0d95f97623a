//! Configuration Module
//!
//! Environment-driven settings for the server and the demo caller.

mod settings;

pub use settings::{
    ClientSettings, ConfigError, RpcConfig, ServerSettings, StreamSettings, TlsSettings,
};
