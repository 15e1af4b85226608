//! River stream reader (`riverctl`)
//!
//! Loads one stream from a node, scrolls back through its history and
//! prints the timeline.

use anyhow::Context;
use clap::Parser;
use river_kernel::{StreamHandle, StreamTimelineEvent, TimelineEventState};
use river_model::{Clock, StreamId, SystemClock};
use river_rpc::{RetryParams, StreamRpcClient, TransportConfig, WireFormat};
use river_sync::{RpcMiniblockSource, ScrollbackCoordinator, StreamReader};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "riverctl", version, about = "Read River stream history")]
struct Args {
    /// Comma-separated node URLs; one is picked at random
    #[arg(long, env = "RIVER_NODE_URLS")]
    nodes: String,

    /// Stream id, hex encoded
    #[arg(long)]
    stream: StreamId,

    /// Scroll back until events are at least this old (epoch ms)
    #[arg(long, conflicts_with = "hours")]
    to_date: Option<i64>,

    /// Scroll back this many hours
    #[arg(long, default_value_t = 24)]
    hours: i64,

    /// Total attempts per RPC
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// Per-attempt timeout in milliseconds
    #[arg(long)]
    attempt_timeout_ms: Option<u64>,

    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let retry = RetryParams { max_attempts: args.max_attempts, ..RetryParams::default() };
    let mut config = TransportConfig::new(args.nodes.clone())
        .with_retry(retry)
        .with_wire_format(WireFormat::from_env());
    if let Some(ms) = args.attempt_timeout_ms {
        config = config.with_attempt_timeout(Duration::from_millis(ms));
    }

    let client = Arc::new(StreamRpcClient::connect(&config).context("failed to create rpc client")?);
    let cancel = CancellationToken::new();
    let source = Arc::new(RpcMiniblockSource::new(Arc::clone(&client), cancel.child_token()));
    let reader = Arc::new(StreamReader::new(source, "riverctl"));

    let handle = tokio::select! {
        handle = reader.get_stream(&args.stream) => handle.context("failed to load stream")?,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            return Ok(());
        }
    };

    let hours = Duration::from_secs(args.hours.max(0) as u64 * 3_600);
    let to_date = args.to_date.unwrap_or_else(|| SystemClock.ms_before(hours));
    let coordinator = ScrollbackCoordinator::new(Arc::clone(&reader));
    tokio::select! {
        result = coordinator.scrollback_to_date(&handle, to_date) => result.context("scrollback failed")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, printing what is loaded");
            cancel.cancel();
        }
    }

    print_timeline(&handle).await?;
    handle.shutdown();
    Ok(())
}

async fn print_timeline(handle: &StreamHandle) -> anyhow::Result<()> {
    let (info, events) = handle
        .read(|v| (v.miniblock_info().copied(), v.timeline().iter().cloned().collect::<Vec<_>>()))
        .await?;
    if let Some(info) = info {
        println!(
            "stream {} blocks {}..={}{}",
            handle.stream_id(),
            info.min,
            info.max,
            if info.terminus_reached { " (complete)" } else { "" }
        );
    }
    for event in &events {
        println!("{}", format_event(event));
    }
    println!("{} events", events.len());
    Ok(())
}

fn format_event(event: &StreamTimelineEvent) -> String {
    let case = event.payload().map_or("none", |p| p.case_name());
    let state = match &event.state {
        TimelineEventState::Local(_) => "local",
        TimelineEventState::Remote(_) => "remote",
        TimelineEventState::Confirmed { .. } => "confirmed",
    };
    format!(
        "{:>6} {:>14} {} {:<10} {:<18} {}",
        event.event_num,
        event.created_at_epoch_ms,
        &event.hash_str[..event.hash_str.len().min(8)],
        state,
        case,
        event.creator_user_id,
    )
}

fn init_tracing(verbosity: u8) {
    let mut filter = EnvFilter::from_default_env();

    if std::env::var("RUST_LOG").is_err() {
        let level = match verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        if let Ok(directive) = level.parse() {
            filter = filter.add_directive(directive);
        }
    }

    const SILENCE: &[&str] = &["h2=warn", "hyper=warn", "tower=warn"];
    for d in SILENCE {
        if let Ok(directive) = d.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
