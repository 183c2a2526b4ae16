use anyhow::Result;
use clap::Parser;
use scoutkit::watch::{
    compare_since, take_snapshot, watch_for, watch_stream, WatchCancellation, WatchOptions,
    WatchResult,
};
use scoutkit::ExtensionFilter;
use scoutkit_cli::{emit_json, emit_json_line, exclude_dirs, CommonArgs};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Detect created, modified and deleted files by polling snapshots
#[derive(Parser)]
#[command(name = "scout-watch", author, version, about, long_about = None)]
struct Cli {
    /// Directory to watch
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// File extensions to include (e.g. py,go)
    #[arg(short, long)]
    ext: Option<String>,

    /// Directories to exclude (comma-separated)
    #[arg(long)]
    exclude: Option<String>,

    /// Print a snapshot of the tree and exit
    #[arg(long)]
    snapshot: bool,

    /// Compare the tree against a snapshot file written earlier
    #[arg(long)]
    since: Option<PathBuf>,

    /// Watch for this many seconds and report every change (0 streams until interrupted)
    #[arg(long, default_value_t = 0)]
    duration: u64,

    /// Milliseconds between two polls
    #[arg(long)]
    interval_ms: Option<u64>,

    #[command(flatten)]
    common: CommonArgs,
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Cancels `token` on SIGINT or SIGTERM from a helper thread
fn cancel_on_signal(token: WatchCancellation) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    std::thread::spawn(move || {
        runtime.block_on(wait_for_shutdown());
        token.cancel();
    });
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.common.setup()?;

    let mut options = WatchOptions::new(&cli.dir);
    options.extensions = cli.ext.as_deref().map(ExtensionFilter::parse).unwrap_or_default();
    options.exclude_dirs = exclude_dirs(cli.exclude.as_deref(), &config);
    options.poll_interval =
        Duration::from_millis(cli.interval_ms.unwrap_or(config.poll_interval_ms).max(1));

    if cli.snapshot {
        return match take_snapshot(&options) {
            Ok(snapshot) => emit_json(&snapshot),
            Err(e) => emit_json(&WatchResult {
                error: Some(e.to_string()),
                ..Default::default()
            }),
        };
    }

    if let Some(since) = &cli.since {
        return emit_json(&compare_since(&options, since));
    }

    let token = WatchCancellation::new();
    cancel_on_signal(token.clone())?;

    if cli.duration > 0 {
        return emit_json(&watch_for(&options, Duration::from_secs(cli.duration), &token));
    }

    eprintln!("Watching {} (Ctrl+C to stop)...", cli.dir.display());
    if let Err(e) = watch_stream(&options, &token, |event| {
        emit_json_line(event).map_err(|e| std::io::Error::other(e.to_string()).into())
    }) {
        emit_json_line(&WatchResult {
            error: Some(e.to_string()),
            ..Default::default()
        })?;
    }
    Ok(())
}
