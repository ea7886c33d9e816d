#![allow(dead_code)]
use std::sync::OnceLock;

use factstream_common::observability::{LogConfig, LogFormat};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "factstream-tests",
            emit_stderr: true,
            format: std::env::var("FACTSTREAM_LOG_FORMAT")
                .ok()
                .and_then(|raw| LogFormat::parse(&raw))
                .unwrap_or_default(),
            default_filter: "debug".to_string(),
            ..LogConfig::default()
        };

        factstream_common::observability::init_logging(config).unwrap_or_default()
    });
}
