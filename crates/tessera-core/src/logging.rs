use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor an explicit filter is given.
pub const DEFAULT_FILTER: &str = "info,tessera_core=debug,tessera_winit=debug,winit=info";

#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `"warn,tessera_core=trace"`.
    pub filter: Option<String>,
    /// Include the emitting module path in each line.
    pub with_target: bool,
    /// Write through the test harness so output is captured per test.
    pub test_writer: bool,
}

impl LoggingConfig {
    /// Settings for test binaries.
    pub fn for_tests() -> Self {
        Self {
            filter: Some("warn,tessera_core=debug".to_string()),
            with_target: true,
            test_writer: true,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(self.filter.as_deref().unwrap_or(DEFAULT_FILTER))
        })
    }
}

static INIT: Once = Once::new();

pub fn init() {
    init_with(LoggingConfig {
        with_target: true,
        ..Default::default()
    });
}

/// Installs the global subscriber. Later calls are ignored.
///
/// `RUST_LOG` takes precedence over `config.filter`.
pub fn init_with(config: LoggingConfig) {
    INIT.call_once(|| {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(config.env_filter())
            .with_target(config.with_target);

        let result = if config.test_writer {
            builder.with_test_writer().try_init()
        } else {
            builder.try_init()
        };

        if result.is_ok() {
            tracing::debug!("logging initialized");
        }
    });
}

/// Whether [`init`] or [`init_with`] has run in this process.
pub fn is_initialized() -> bool {
    INIT.is_completed()
}
