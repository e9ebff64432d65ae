use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use tracing::Subscriber;
use tracing_subscriber::{Layer, filter::LevelFilter, fmt, prelude::*, registry::LookupSpan};

/// `-q` silences everything; each `-v` lowers the threshold by one level.
pub fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Plain-text records for `--log-file`, keeping the module path and thread of each event.
fn log_file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_target(true)
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let terminal = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let file_layer = log_file
        .map(|path| File::create(path).map(log_file_layer).map_err(CliError::Io))
        .transpose()?;

    tracing_subscriber::registry()
        .with(level_filter(verbosity, quiet))
        .with(terminal)
        .with(file_layer)
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Once;
    use tracing::{debug, info, info_span, trace, warn};

    static INIT: Once = Once::new();

    fn ensure_global_logger_is_set() {
        INIT.call_once(|| {
            setup_logging(3, false, None).expect("Failed to set up global logger for tests");
        });
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_filter(0, false), LevelFilter::WARN);
        assert_eq!(level_filter(1, false), LevelFilter::INFO);
        assert_eq!(level_filter(2, false), LevelFilter::DEBUG);
        assert_eq!(level_filter(7, false), LevelFilter::TRACE);
        assert_eq!(level_filter(2, true), LevelFilter::OFF);
    }

    #[test]
    #[serial]
    fn global_logger_accepts_workflow_events() {
        ensure_global_logger_is_set();

        let span = info_span!("internal_projection", modes = 3);
        let _entered = span.enter();
        warn!(mode = 0, "Dropping zero-frequency mode.");
        info!(parsed = 9, retained = 3, "Parsed vibrational modes.");
        debug!(geometries = 21, "Decoded Molden trajectory.");
        trace!("Projected mode 6.");
    }

    #[test]
    #[serial]
    fn log_file_records_fields_target_and_thread() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("vibzmat.log");
        let file = File::create(&log_path).unwrap();
        let subscriber = tracing_subscriber::registry().with(log_file_layer(file));

        tracing::subscriber::with_default(subscriber, || {
            debug!(parsed = 9, retained = 3, "Parsed vibrational modes.");
        });

        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("Parsed vibrational modes."));
        assert!(content.contains("retained=3"));
        assert!(content.contains("DEBUG"));
        assert!(content.contains("logging::tests"));
        assert!(content.contains("ThreadId"));
    }

    #[test]
    #[serial]
    fn unwritable_log_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = setup_logging(0, false, Some(dir.path()));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
