use mailmind::assistant::Assistant;
use mailmind::config::Config;
use mailmind::llm::create_provider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    eprintln!("Mailmind v{} — initializing", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    let llm = create_provider(&config.model);

    let mut assistant = Assistant::new(config, llm)?;
    if let Err(e) = assistant.run().await {
        eprintln!("Fatal: {e}");
        std::process::exit(1);
    }

    eprintln!("All done. Assistant is idle.");
    Ok(())
}
