use anyhow::Context as _;
use clap::Parser;
use std::path::PathBuf;
use strand_app::{RenderOptions, ViewerConfig, present};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "strand", about = "Render an agent conversation snapshot as a timeline")]
struct Args {
    /// Conversation snapshot JSON file.
    snapshot: PathBuf,
    /// Scroll offset in px. Defaults to following the tail.
    #[arg(long)]
    scroll_top: Option<u64>,
    /// Viewport height in px. Overrides STRAND_VIEWPORT_PX.
    #[arg(long)]
    viewport: Option<u64>,
    /// Expand the collapsed event run starting at this message index.
    #[arg(long = "expand")]
    expand: Vec<usize>,
    /// Use compact turn cards instead of assistant bubbles.
    #[arg(long)]
    turns: bool,
    /// Print the timeline messages as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = ViewerConfig::from_env();
    if let Some(viewport) = args.viewport {
        config.viewport_px = viewport;
    }

    let snapshot = strand_app::load_snapshot_file(&args.snapshot).await?;
    tracing::info!(
        workspace_id = snapshot.workspace_id.0,
        thread_id = snapshot.thread_id.0,
        entries = snapshot.entries.len(),
        "snapshot loaded"
    );

    let options = RenderOptions {
        scroll_top: args.scroll_top,
        expand: args.expand,
        layout_turns: args.turns,
    };
    let (messages, plan) = strand_app::render_snapshot(&snapshot, &options, &config);

    if args.json {
        let json = serde_json::to_string_pretty(&messages).context("failed to encode timeline")?;
        println!("{json}");
        return Ok(());
    }

    print!("{}", present::render_text(&messages, &plan));
    print!("{}", present::render_pending_prompts(&snapshot.pending_prompts));
    Ok(())
}
