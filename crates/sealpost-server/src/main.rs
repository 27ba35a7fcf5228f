//! Sealpost command-line driver.
//!
//! # Usage
//!
//! ```bash
//! # Describe a multi-recipient payload without revealing key material
//! sealpost-server inspect --payload message.bin
//!
//! # Fan a payload out against a directory fixture
//! sealpost-server deliver --fixture accounts.toml --payload message.bin \
//!     --access-key AAECAwQFBgcICQoLDA0ODw==
//!
//! # Single-recipient send as an authenticated device
//! sealpost-server send --fixture accounts.toml --destination <uuid> \
//!     --messages messages.json --sender-aci <uuid> --sender-device 1
//! ```

use std::{
    io::Write,
    path::{Path, PathBuf},
    process::ExitCode,
};

use bytes::Bytes;
use clap::{Parser, Subcommand};
use sealpost_core::{AuthenticatedSender, MultiRecipientRequest, SingleRecipientRequest};
use sealpost_proto::{IncomingMessageList, MultiRecipientMessage, ServiceIdentifier};
use sealpost_server::{
    DirectoryFixture, PayloadSummary, Report, Runtime, ServerConfig, ServerError, parse_access_key,
};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Sealpost message-delivery driver
#[derive(Parser, Debug)]
#[command(name = "sealpost-server")]
#[command(about = "Sealed-sender fan-out dispatch")]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a multi-recipient payload and print a summary
    Inspect {
        /// Binary payload file
        #[arg(short, long)]
        payload: PathBuf,
    },

    /// Deliver a multi-recipient payload
    Deliver {
        /// Account directory fixture (TOML)
        #[arg(short, long)]
        fixture: PathBuf,

        /// Binary payload file
        #[arg(short, long)]
        payload: PathBuf,

        /// Base64 combined access key
        #[arg(short = 'k', long)]
        access_key: Option<String>,

        /// Client timestamp (ms)
        #[arg(long, default_value_t = 0)]
        timestamp: u64,

        /// Story broadcast
        #[arg(long)]
        story: bool,

        /// Deliver only to connected devices
        #[arg(long)]
        online: bool,

        /// Mark pushes as non-urgent
        #[arg(long)]
        not_urgent: bool,
    },

    /// Deliver a single-recipient message list
    Send {
        /// Account directory fixture (TOML)
        #[arg(short, long)]
        fixture: PathBuf,

        /// Destination identifier (`<uuid>` or `PNI:<uuid>`)
        #[arg(short, long)]
        destination: ServiceIdentifier,

        /// JSON message list
        #[arg(short, long)]
        messages: PathBuf,

        /// Base64 access key of the destination
        #[arg(short = 'k', long)]
        access_key: Option<String>,

        /// Authenticated sender account
        #[arg(long, requires = "sender_device")]
        sender_aci: Option<Uuid>,

        /// Authenticated sender device
        #[arg(long, requires = "sender_aci")]
        sender_device: Option<u64>,

        /// Story broadcast
        #[arg(long)]
        story: bool,
    },
}

#[derive(Serialize)]
struct DeliverOutput {
    #[serde(flatten)]
    report: Report,
    deliveries: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match args.config.as_deref().map(ServerConfig::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => return fail(&err),
    };

    let log_level = args.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    match run(args.command, &config).await {
        Ok(status) if status == 200 => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => fail(&err),
    }
}

fn fail(err: &ServerError) -> ExitCode {
    let _ = writeln!(std::io::stderr(), "error: {err}");
    ExitCode::from(err.exit_code())
}

async fn run(command: Command, config: &ServerConfig) -> Result<u16, ServerError> {
    match command {
        Command::Inspect { payload } => {
            let body = read_payload(&payload)?;
            let message = MultiRecipientMessage::decode(body, &config.dispatch.decode_limits())?;
            print_json(&PayloadSummary::new(&message))?;
            Ok(200)
        },
        Command::Deliver { fixture, payload, access_key, timestamp, story, online, not_urgent } => {
            let runtime = Runtime::new(config, DirectoryFixture::load(fixture)?.into_directory()?);
            let request = MultiRecipientRequest {
                body: read_payload(&payload)?,
                combined_access_key: access_key.as_deref().map(parse_access_key).transpose()?,
                timestamp,
                online,
                urgent: !not_urgent,
                story,
            };

            tracing::info!(story, online, "delivering multi-recipient payload");
            let report = Report::multi(runtime.engine.send_multi_recipient(request).await);
            runtime.shutdown();

            let status = report.status;
            print_json(&DeliverOutput { report, deliveries: runtime.sender.sent_count() })?;
            Ok(status)
        },
        Command::Send {
            fixture,
            destination,
            messages,
            access_key,
            sender_aci,
            sender_device,
            story,
        } => {
            let runtime = Runtime::new(config, DirectoryFixture::load(fixture)?.into_directory()?);
            let body: IncomingMessageList = serde_json::from_slice(&std::fs::read(messages)?)?;

            let sender = match (sender_aci, sender_device) {
                (Some(aci), Some(device_id)) => {
                    let account = runtime
                        .directory
                        .get(&ServiceIdentifier::Aci(aci))
                        .ok_or_else(|| ServerError::Fixture(format!("sender {aci} not in fixture")))?;
                    Some(AuthenticatedSender { account, device_id })
                },
                _ => None,
            };

            let request = SingleRecipientRequest {
                destination,
                sender,
                access_key: access_key.as_deref().map(parse_access_key).transpose()?,
                story,
                body,
            };

            tracing::info!(%destination, story, "delivering message list");
            let report = Report::single(runtime.engine.send_message(request).await);
            runtime.shutdown();

            let status = report.status;
            print_json(&DeliverOutput { report, deliveries: runtime.sender.sent_count() })?;
            Ok(status)
        },
    }
}

fn read_payload(path: &Path) -> Result<Bytes, ServerError> {
    Ok(Bytes::from(std::fs::read(path)?))
}

fn print_json(value: &impl Serialize) -> Result<(), ServerError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
