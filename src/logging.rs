use env_logger::{Builder, Env};

/// `info` by default, overridable through `RUST_LOG`.
pub fn init_logging() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
