//! CLI for feedsync
//!
//! Subcommands:
//! - `watch`: follow one topic and print its collection on every change
//! - `send`: post a single command and print the response
//! - `ping`: ask the backend for its status, or keep monitoring it with `--watch`

use clap::Parser;
use feedsync::client::{FeedClient, FeedSpec};
use feedsync::config::{Settings, load_config};
use feedsync::dispatch::{CommandDispatcher, SessionContext};
use feedsync::sync::{DeltaPolicy, KeyFn, MergePolicy};
use feedsync::utils::logging;
use tracing::{error, info};
use url::Url;

#[derive(Parser)]
#[command(name = "feedsync")]
enum Command {
    /// Follow a topic's live feed
    Watch {
        /// Topic to subscribe to, e.g. `datapoint`
        #[arg(long)]
        topic: String,
        /// Delta message kind, e.g. `tagupdatemsg`
        #[arg(long)]
        delta: String,
        /// Record field used as the key, e.g. `datapoint_identifier`
        #[arg(long)]
        key: String,
        /// Merge delta fields into the previous record instead of replacing it
        #[arg(long)]
        shallow_merge: bool,
        /// Treat every delta as the complete list
        #[arg(long)]
        authoritative: bool,
    },
    /// Send one command
    Send {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        action: String,
        /// JSON payload
        #[arg(long, default_value = "{}")]
        payload: String,
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Check that the backend answers
    Ping {
        /// Keep pinging and report every connectivity change
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() {
    let settings = match load_config() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };
    logging::init(&settings.logging.level);

    let result = match Command::parse() {
        Command::Watch {
            topic,
            delta,
            key,
            shallow_merge,
            authoritative,
        } => {
            let merge = if shallow_merge {
                MergePolicy::ShallowMerge
            } else {
                MergePolicy::Replace
            };
            let delta_policy = if authoritative {
                DeltaPolicy::Authoritative
            } else {
                DeltaPolicy::Upsert
            };
            let spec = FeedSpec::new(topic, delta, KeyFn::field(key))
                .with_merge_policy(merge)
                .with_delta_policy(delta_policy);
            run_watch(&settings, spec).await
        }
        Command::Send {
            topic,
            action,
            payload,
            token,
            user,
        } => run_send(&settings, &topic, &action, &payload, token, user).await,
        Command::Ping { watch: false } => run_ping(&settings).await,
        Command::Ping { watch: true } => run_ping_watch(&settings).await,
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

async fn run_watch(settings: &Settings, spec: FeedSpec) -> Result<(), Box<dyn std::error::Error>> {
    let client = FeedClient::from_settings(settings, SessionContext::new())?;
    let mut view = client.view();
    let feed = view.open(spec);
    let mut changes = feed.subscribe();

    info!(topic = feed.topic(), url = %settings.server.ws_url, "watching live feed");
    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let items = changes.borrow_and_update().clone();
                println!("{}", serde_json::to_string_pretty(&*items)?);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received. Exiting gracefully.");
                break;
            }
        }
    }

    view.close().await;
    Ok(())
}

fn dispatcher(settings: &Settings, session: SessionContext) -> Result<CommandDispatcher, url::ParseError> {
    let base_url = Url::parse(&settings.server.http_base_url)?;
    Ok(CommandDispatcher::from_settings(
        base_url,
        &settings.dispatch,
        session,
    ))
}

async fn run_send(
    settings: &Settings,
    topic: &str,
    action: &str,
    payload: &str,
    token: Option<String>,
    user: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = SessionContext::new();
    if let Some(token) = token {
        session.set_token(token);
    }
    if let Some(user) = user {
        session.set_username(user);
    }

    let payload: serde_json::Value = serde_json::from_str(payload)?;
    let response = dispatcher(settings, session)?
        .send(topic, action, &payload)
        .await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn run_ping(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let status = dispatcher(settings, SessionContext::new())?.ping().await?;
    match status.parsed_timestamp() {
        Some(ts) => println!("{} (server time {})", status.status, ts),
        None => println!("{}", status.status),
    }
    Ok(())
}

async fn run_ping_watch(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let client = FeedClient::from_settings(settings, SessionContext::new())?;
    let monitor = client.connectivity();
    let mut changes = monitor.subscribe();

    info!(every_ms = client.ping_interval().as_millis() as u64, "monitoring backend");
    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let now = changes.borrow_and_update().clone();
                match (now.is_connected, now.server_timestamp) {
                    (true, Some(ts)) => println!("connected (server time {ts})"),
                    (true, None) => println!("connected"),
                    (false, _) => println!("disconnected"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received. Exiting gracefully.");
                break;
            }
        }
    }
    Ok(())
}
