use anyhow::Context as _;

/// Filter used when `RUST_LOG` is unset, by `-v` count.
pub fn default_directives(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "shelfscan=info,warn",
        1 => "shelfscan=debug,info",
        _ => "trace",
    }
}

/// Structured logs on stderr; stdout carries command output only.
/// `RUST_LOG` wins over `-v`.
pub fn init(verbosity: u8) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_directives(verbosity)))
        .context("build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    tracing::debug!(verbosity, "logging ready");
    Ok(())
}
