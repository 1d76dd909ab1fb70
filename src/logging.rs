use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a stderr tracing subscriber.
///
/// With no `-v` flags the filter comes from `RUST_LOG`, falling back to
/// `warn`. One `-v` selects `info`, two or more select `debug`.
pub fn init(verbosity: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact();

    let filter_layer = match verbosity {
        0 => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?,
        1 => EnvFilter::try_new("info")?,
        _ => EnvFilter::try_new("debug")?,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
