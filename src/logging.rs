use env_logger::{Builder, Env, Target};

/// Initializes `env_logger` for the binaries: `info` unless `RUST_LOG` says
/// otherwise, written to stdout next to the progress messages.
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stdout)
        .format_timestamp(None)
        .try_init();
}
