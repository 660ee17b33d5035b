//! Sends a message to one or more recipients through the simulated radio
//! and prints each send's outcome.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use smsgate_core::{SubscriptionId, Ucs2Segmenter};
use smsgate_sender::recipients::{check_recipient_limit, parse_recipients};
use smsgate_sender::sim::{RadioProfile, SimulatedRadio};
use smsgate_sender::traits::{LogNotifier, SmsTransport};
use smsgate_sender::{SendRequest, SenderConfig, SmsSender};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// SMS send simulator
///
/// Drives the sender against an in-process radio with configurable latency,
/// failures and dropped segments.
#[derive(Parser, Debug)]
#[command(name = "sms-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Recipients (comma-separated numbers, email addresses or aliases)
    #[arg(short, long, env = "SMS_SIM_TO")]
    to: String,

    /// Message body
    #[arg(short, long, env = "SMS_SIM_BODY", default_value = "")]
    body: String,

    /// Subscription to send on
    #[arg(long, env = "SMS_SIM_SUBSCRIPTION", default_value_t = SubscriptionId::DEFAULT.0, allow_negative_numbers = true)]
    subscription: i32,

    /// Sender configuration file (JSON)
    #[arg(short, long, env = "SMS_SIM_CONFIG")]
    config: Option<PathBuf>,

    /// Radio profile file (JSON)
    #[arg(long, env = "SMS_SIM_RADIO")]
    radio: Option<PathBuf>,

    /// Send timeout in milliseconds, overriding the config file
    #[arg(long, env = "SMS_SIM_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Share of segments the radio never answers, overriding the profile
    #[arg(long)]
    drop_rate: Option<f64>,

    /// Share of answered segments that fail, overriding the profile
    #[arg(long)]
    failure_rate: Option<f64>,

    /// Request a delivery report for each message
    #[arg(long)]
    delivery_report: bool,

    /// Service center address
    #[arg(long)]
    service_center: Option<String>,

    /// Print outcomes as JSON lines
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SMS_SIM_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (plain, json)
    #[arg(long, env = "SMS_SIM_LOG_FORMAT", default_value = "plain")]
    log_format: String,
}

fn setup_logging(log_level: &str, log_format: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    match log_format.to_lowercase().as_str() {
        "json" => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .flatten_event(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set subscriber")?;
        }
        _ => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set subscriber")?;
        }
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<SenderConfig> {
    let mut config = match &args.config {
        Some(path) => SenderConfig::from_json_file(path)
            .with_context(|| format!("Failed to load sender config {}", path.display()))?,
        None => SenderConfig::default(),
    };
    if let Some(timeout_ms) = args.timeout_ms {
        config.send_timeout_ms = timeout_ms;
        config.validate()?;
    }
    Ok(config)
}

fn load_profile(args: &Args) -> Result<RadioProfile> {
    let mut profile = match args.radio.as_deref() {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read radio profile {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse radio profile {}", path.display()))?
        }
        None => RadioProfile::default(),
    };
    if let Some(rate) = args.drop_rate {
        profile.drop_rate = rate;
    }
    if let Some(rate) = args.failure_rate {
        profile.failure_rate = rate;
    }
    anyhow::ensure!(
        profile.drop_rate.is_finite() && profile.failure_rate.is_finite(),
        "Radio rates must be finite numbers"
    );
    Ok(profile)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level, &args.log_format)?;

    let config = load_config(&args)?;
    let profile = load_profile(&args)?;
    let subscription_id = SubscriptionId(args.subscription);

    let recipients = parse_recipients(&args.to)?;
    check_recipient_limit(config.subscription(subscription_id), &recipients)?;

    let sender = Arc::new(SmsSender::new(
        config,
        Arc::new(Ucs2Segmenter),
        Arc::new(LogNotifier),
        |handler| -> Arc<dyn SmsTransport> {
            Arc::new(SimulatedRadio::new(handler, profile))
        },
    ));
    info!(
        recipients = recipients.len(),
        %subscription_id,
        "starting simulated send"
    );

    let total = recipients.len();
    let tasks: Vec<_> = recipients
        .into_iter()
        .map(|recipient| {
            let sender = Arc::clone(&sender);
            let mut request =
                SendRequest::new(subscription_id, recipient.clone(), args.body.clone())
                    .with_delivery_report(args.delivery_report);
            if let Some(service_center) = &args.service_center {
                request = request.with_service_center(service_center.clone());
            }
            tokio::spawn(async move {
                let outcome = sender.send_async(&request).await;
                (recipient, request, outcome)
            })
        })
        .collect();

    let mut unsuccessful = 0usize;
    for task in tasks {
        let (recipient, request, outcome) = task.await.context("Send task panicked")?;
        let line = match &outcome {
            Ok(result) => {
                if !result.is_success() {
                    unsuccessful += 1;
                }
                if args.json {
                    serde_json::json!({
                        "recipient": recipient,
                        "requestId": request.request_id.as_str(),
                        "result": result,
                    })
                    .to_string()
                } else {
                    format!("{recipient}: {result}")
                }
            }
            Err(e) => {
                unsuccessful += 1;
                warn!(%recipient, error = %e, "send failed");
                if args.json {
                    serde_json::json!({
                        "recipient": recipient,
                        "requestId": request.request_id.as_str(),
                        "error": e.to_string(),
                    })
                    .to_string()
                } else {
                    format!("{recipient}: error: {e}")
                }
            }
        };
        println!("{line}");
    }

    if unsuccessful > 0 {
        anyhow::bail!("{unsuccessful} of {total} sends did not succeed");
    }
    Ok(())
}
