mod config;
mod logging;

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use extension_logging::{ext_debug, ext_info, APP};
use summarizer_core::{PanelMsg, PanelStatus, PanelView, TabId};
use summarizer_engine::{Extension, FileClipboard, PageDocument, PanelHandle};

use crate::logging::LogDestination;

const TAB: TabId = TabId(1);

#[derive(Parser, Debug)]
#[command(name = "summarizer")]
#[command(about = "Runs the video summarizer extension headlessly against a saved page")]
#[command(version)]
struct Cli {
    /// HTML of the page to load into the tab
    #[arg(long)]
    page: Option<PathBuf>,

    /// URL the page was loaded from
    #[arg(long, default_value = "https://www.youtube.com/")]
    page_url: String,

    /// Summarize this URL instead of detecting one on the page
    #[arg(long)]
    video_url: Option<String>,

    /// Runtime config (RON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// File that receives the exported result URL
    #[arg(long, default_value = "summarizer-clipboard.txt")]
    export_to: PathBuf,

    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    log: LogDestination,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log, cli.verbose);

    let config = config::load_config(cli.config.as_deref())?;
    let html = match &cli.page {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read page {}", path.display()))?,
        None => String::new(),
    };

    let mut extension = Extension::launch(config).context("failed to start the extension")?;
    extension.open_tab(TAB, PageDocument::new(cli.page_url.clone(), html));
    extension.activate_tab(TAB);
    extension.click_action(TAB, &cli.page_url);

    let mut panel = extension.open_panel(Box::new(FileClipboard::new(&cli.export_to)));
    let outcome = drive_panel(&mut panel, cli.video_url.as_deref()).await;
    panel.close().await;
    extension.shutdown().await;

    let view = outcome?;
    if let Some(summary) = &view.summary_output {
        println!("{summary}");
    }
    println!("{} ({})", view.status_text, cli.export_to.display());
    Ok(())
}

/// Detect (unless a URL was given), summarize, then export, the way a user
/// would click through the panel.
async fn drive_panel(panel: &mut PanelHandle, video_url: Option<&str>) -> Result<PanelView> {
    match video_url {
        Some(url) => {
            panel.send(PanelMsg::VideoUrlEdited(url.to_string()));
        }
        None => {
            panel.send(PanelMsg::DetectClicked);
            let view = settle(panel, |status| matches!(status, PanelStatus::Detected)).await?;
            ext_info!(APP, "detected {}", view.video_url);
        }
    }

    panel.send(PanelMsg::SummarizeClicked);
    let mut last_progress = 0;
    let summarized = loop {
        let Some(view) = panel.changed().await else {
            bail!("panel closed before the summary finished");
        };
        if view.progress != last_progress {
            last_progress = view.progress;
            ext_info!(APP, "{} {}%", view.status_text, view.progress);
        }
        match &view.status {
            PanelStatus::Summarized => break view,
            PanelStatus::Failed(_) => bail!("{}", view.status_text),
            _ => ext_debug!(APP, "status: {:?}", view.status),
        }
    };
    ext_info!(APP, "result {:?}", summarized.result_url);

    panel.send(PanelMsg::ExportClicked);
    let exported = settle(panel, |status| matches!(status, PanelStatus::Exported)).await?;
    Ok(PanelView {
        status_text: exported.status_text,
        ..summarized
    })
}

/// Waits for `done` or any failure status. Failures become errors carrying
/// the panel's status text.
async fn settle(
    panel: &mut PanelHandle,
    done: impl Fn(&PanelStatus) -> bool,
) -> Result<PanelView> {
    loop {
        let Some(view) = panel.changed().await else {
            bail!("panel closed unexpectedly");
        };
        if done(&view.status) {
            return Ok(view);
        }
        if matches!(view.status, PanelStatus::Failed(_)) {
            bail!("{}", view.status_text);
        }
    }
}
