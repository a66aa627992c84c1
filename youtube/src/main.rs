use clap::Parser;
use eyre::Context;
use jiff::Timestamp;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_live_broadcast::credentials::{ClientSecrets, TokenStorage};
use youtube_live_broadcast::oauth::AuthFlowOptions;
use youtube_live_broadcast::workflow::{self, BroadcastOptions};
use youtube_live_broadcast::youtube_api::{BroadcastPrivacyStatus, IngestionType};

/// Schedule a YouTube live broadcast, create an ingestion stream, and bind them together.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Broadcast title
    #[arg(long, default_value = "New Broadcast")]
    broadcast_title: String,

    /// Broadcast privacy status (public, unlisted, or private)
    #[arg(long, default_value = "private")]
    privacy_status: BroadcastPrivacyStatus,

    /// Scheduled start time
    #[arg(long, default_value = "2014-01-30T00:00:00.000Z")]
    start_time: Timestamp,

    /// Scheduled end time
    #[arg(long, default_value = "2014-01-31T00:00:00.000Z")]
    end_time: Timestamp,

    /// Stream title
    #[arg(long, default_value = "New Stream")]
    stream_title: String,

    /// Stream video format
    #[arg(long, default_value = "1080p")]
    stream_format: String,

    /// Stream ingestion protocol (rtmp, dash, webrtc, or hls)
    #[arg(long, default_value = "rtmp")]
    ingestion_type: IngestionType,

    /// OAuth client secrets downloaded from the Google Cloud console
    #[arg(long, default_value = "client_secrets.json")]
    client_secrets: PathBuf,

    /// Where to cache the user's OAuth token [default: <program>-oauth2.json]
    #[arg(long)]
    credentials_file: Option<PathBuf>,

    /// Host name for the local OAuth redirect server
    #[arg(long, default_value = "127.0.0.1")]
    auth_host_name: String,

    /// Port for the local OAuth redirect server (0 picks a free port)
    #[arg(long, default_value_t = 0)]
    auth_host_port: u16,

    /// Print the authorization URL instead of opening a browser
    #[arg(long)]
    no_browser: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    logging_level: LevelFilter,
}

fn default_credentials_file() -> PathBuf {
    let mut path = std::env::args_os()
        .next()
        .unwrap_or_else(|| "youtube-live-broadcast".into());
    path.push("-oauth2.json");
    PathBuf::from(path)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(args.logging_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let secrets = ClientSecrets::load(&args.client_secrets).await?;
    let storage = TokenStorage::new(
        args.credentials_file
            .clone()
            .unwrap_or_else(default_credentials_file),
    );
    let flow = AuthFlowOptions {
        host: args.auth_host_name.clone(),
        port: args.auth_host_port,
        open_browser: !args.no_browser,
    };
    let yt = youtube_live_broadcast::setup_youtube_client(secrets, &storage, &flow).await?;

    let options = BroadcastOptions {
        broadcast_title: args.broadcast_title,
        privacy_status: args.privacy_status,
        start_time: args.start_time,
        end_time: args.end_time,
        stream_title: args.stream_title,
        stream_format: args.stream_format,
        ingestion_type: args.ingestion_type,
    };

    let mut stdout = std::io::stdout().lock();
    let result = workflow::run(&yt, &options, &mut stdout).await;

    // the access token may have been refreshed along the way
    if let Err(e) = youtube_live_broadcast::store_token(&yt, &storage).await {
        tracing::warn!(error = %e, "could not store credentials");
    }

    let err = match result {
        Ok(binding) => {
            tracing::info!(
                broadcast_id = binding.broadcast_id,
                stream_id = binding.stream_id,
                "broadcast scheduled"
            );
            return Ok(());
        }
        Err(e) => e,
    };

    // API-level failures are reported, not treated as a crash
    if workflow::report_api_error(&err, &mut stdout).context("write error report")? {
        return Ok(());
    }
    Err(err)
}
