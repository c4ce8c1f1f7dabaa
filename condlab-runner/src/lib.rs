//! condlab runner: configuration, candle loading, replay and export.
//!
//! This crate builds on `condlab-core` to provide:
//! - TOML run configuration with a content-addressed run id
//! - Candle loading from CSV / JSON with order validation
//! - Bar-by-bar replay of a tree without lookahead
//! - Parallel batch replay of many trees (rayon)
//! - CSV / JSON export of replay reports

pub mod config;
pub mod data;
pub mod export;
pub mod replay;
pub mod runner;

pub use config::{ConfigError, LogFormat, LoggingConfig, RunConfig, RunId};
pub use data::{dataset_hash, load_candles, CandleFormat, LoadError, LoadOptions};
pub use export::{export_csv, export_json, import_json, write_report, OutputFormat};
pub use replay::{replay, replay_many, start_index, ReplayOptions, ReplayRecord, ReplayReport, SCHEMA_VERSION};
pub use runner::{load_inputs, replay_options, run_replay, RunError, RunOutput};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
    }

    #[test]
    fn replay_types_are_send_sync() {
        assert_send::<ReplayOptions>();
        assert_sync::<ReplayOptions>();
        assert_send::<ReplayReport>();
        assert_sync::<ReplayReport>();
        assert_send::<RunOutput>();
        assert_sync::<RunOutput>();
    }

    #[test]
    fn error_types_are_send_sync() {
        assert_send::<ConfigError>();
        assert_sync::<ConfigError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
