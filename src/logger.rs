use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;

pub fn log_path() -> PathBuf {
    std::env::temp_dir().join("clipboard-demo-debug.log")
}

/// Send `tracing` output to the debug log in the temp directory.
/// Falls back to stderr if the file cannot be opened.
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = tracing_subscriber::fmt().with_max_level(level).with_target(false);

    let result = match OpenOptions::new().create(true).append(true).open(log_path()) {
        Ok(file) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init(),
        Err(e) => {
            eprintln!("Could not open {}: {}", log_path().display(), e);
            builder.with_writer(std::io::stderr).try_init()
        }
    };

    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }
}
