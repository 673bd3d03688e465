use super::CliError;
use raygrid_core::common::config::InstrumentConfig;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub(super) const LOG_ENV_VAR: &str = "RAYGRID_LOG";

/// Installs the stderr subscriber. A subscriber that is already installed
/// (as in unit tests calling `run` repeatedly) is left in place.
pub(super) fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(super) fn load_instrument_config(path: &Path) -> Result<InstrumentConfig, CliError> {
    let config = InstrumentConfig::from_path(path)?;
    debug!(
        path = %path.display(),
        apertures = config.apertures.len(),
        orders = config.orders.len(),
        "instrument config loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::load_instrument_config;
    use crate::cli::CliError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn unreadable_config_keeps_core_io_placeholder() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = load_instrument_config(&temp.path().join("absent.json"))
            .expect_err("missing config should fail");
        let CliError::Compute(error) = error else {
            panic!("expected a compute error");
        };
        assert_eq!(error.placeholder(), "IO.CONFIG_READ");
        assert_eq!(error.exit_code(), 5);
        assert!(error.message().contains("absent.json"));
    }

    #[test]
    fn malformed_config_keeps_core_placeholder() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("config.json");
        fs::write(&path, "{ not json").expect("fixture should be written");

        let error = load_instrument_config(&path).expect_err("bad json should fail");
        let CliError::Compute(error) = error else {
            panic!("expected a compute error");
        };
        assert_eq!(error.placeholder(), "INPUT.CONFIG_PARSE");
    }
}
