//! Courier — WhatsApp webhook gateway for agent runtimes.

use std::sync::Arc;

use {
    anyhow::{Context, Result},
    clap::Parser,
    tokio::net::TcpListener,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    courier_agent::AgentClient,
    courier_config::Config,
    courier_gateway::{MediaNormalizer, TwilioWhatsApp, build_app},
    courier_twilio::{MediaClient, Messenger, SignatureValidator},
    courier_voice::WhisperStt,
};

#[derive(Parser)]
#[command(name = "courier", about = "Courier — WhatsApp webhook gateway for agent runtimes")]
struct Cli {
    /// Address to bind to.
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8081, env = "PORT")]
    port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli);

    // All credentials are checked here, once; a misconfigured environment
    // never reaches the first webhook.
    let config = Config::from_env().context("invalid configuration")?;

    let validator = SignatureValidator::new(config.twilio_auth_token.clone());
    let media = MediaClient::new(&config.twilio_account_sid, config.twilio_auth_token.clone())
        .context("failed to build media client")?;
    let stt = WhisperStt::new(config.openai_api_key.clone());
    let normalizer = MediaNormalizer::new(Arc::new(media), Arc::new(stt), config.image_mime_policy);
    let agent = AgentClient::new(
        &config.agent_url,
        &config.assistant_id,
        config.run_config.clone(),
    );
    let messenger = Messenger::new(&config.twilio_account_sid, config.twilio_auth_token.clone())
        .context("failed to build outbound messenger")?;

    let channel = TwilioWhatsApp::new(
        validator,
        normalizer,
        Arc::new(agent),
        Arc::new(messenger),
        config.twilio_whatsapp_number.clone(),
    );
    let app = build_app(Arc::new(channel));

    let listener = TcpListener::bind((cli.bind.as_str(), cli.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", cli.bind, cli.port))?;
    info!(bind = %cli.bind, port = cli.port, agent_url = %config.agent_url, "courier listening");
    axum::serve(listener, app)
        .await
        .context("server terminated")?;

    Ok(())
}
