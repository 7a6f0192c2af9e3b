use std::path::PathBuf;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Initialise logging. Without `debug` the level is pinned to `info` and
/// `RUST_LOG` is ignored; with it `RUST_LOG` may override the `debug` default.
/// When `log_file` is given, output goes to that file as well as stderr.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    let level = if debug { "debug" } else { "info" };
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let file_writer = log_file.and_then(|path| {
        let file_name = path.file_name()?.to_owned();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Some(tracing_appender::rolling::never(dir, file_name))
    });

    let result = match file_writer {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::io::stderr.and(file))
            .try_init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("logging already initialised");
    }
}
