use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

/// This function configures the logging format. The loglevel is also processed
/// here i.e `RUST_LOG=zfs_json=debug` will print the summaries of all the
/// decoded command output to stderr.
pub fn init(level: &str) {
    let builder = tracing_subscriber::fmt::Subscriber::builder()
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    let subscriber = match EnvFilter::try_from_default_env() {
        Ok(filter) => builder.with_env_filter(filter).finish(),
        Err(_) => builder.with_env_filter(level).finish(),
    };

    if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set the default subscriber: {error}");
    }
}
