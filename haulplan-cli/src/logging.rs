//! Log output for the binary.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info";

/// Install a stderr formatter honouring `RUST_LOG`.
///
/// Library crates log through the `log` facade; the subscriber bridges those
/// records. Stdout stays reserved for command output.
pub(crate) fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("haulplan: logging unavailable: {err}");
    }
}
