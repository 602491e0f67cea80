use tracing_subscriber::EnvFilter;

/// Default directives when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "desk_copilot=info,desk_copilot_core=info";

/// Install the stderr subscriber. `RUST_LOG` overrides the defaults;
/// `verbose` raises both crates to `debug`.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("desk_copilot=debug,desk_copilot_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    // a second init (tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
