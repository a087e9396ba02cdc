use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use summarizer_core::{PanelError, PanelMsg, PanelStatus, PanelView, TabId};
use summarizer_engine::{
    Endpoint, Extension, ExtensionConfig, MemoryClipboard, MessageBus, PageDocument,
    PanelController, PanelHandle, SimulationSettings,
};

static INIT: Once = Once::new();

const WAIT: Duration = Duration::from_secs(3);

fn init_logging() {
    INIT.call_once(extension_logging::initialize_for_tests);
}

fn fast_config() -> ExtensionConfig {
    ExtensionConfig {
        request_timeout_ms: 500,
        progress_idle_timeout_ms: 1_000,
        summarizer: SimulationSettings {
            tick_interval_ms: 2,
            ..SimulationSettings::default()
        },
        ..ExtensionConfig::default()
    }
}

fn watch_page() -> PageDocument {
    PageDocument::new(
        "https://www.youtube.com/watch?v=abc",
        r#"<video src="blob:https://www.youtube.com/0a1b"></video>"#,
    )
}

async fn wait_status(panel: &mut PanelHandle, status: PanelStatus) -> PanelView {
    let expected = status.clone();
    match panel.wait_for(WAIT, move |view| view.status == expected).await {
        Some(view) => view,
        None => panic!("status {status:?} never shown; last view {:?}", panel.view()),
    }
}

#[tokio::test]
async fn detect_summarize_export_end_to_end() {
    init_logging();
    let mut extension = Extension::launch(fast_config()).unwrap();
    extension.open_tab(TabId(1), watch_page());
    extension.activate_tab(TabId(1));
    let clipboard = MemoryClipboard::new();
    let mut panel = extension.open_panel(Box::new(clipboard.clone()));

    panel.send(PanelMsg::DetectClicked);
    let view = wait_status(&mut panel, PanelStatus::Detected).await;
    assert_eq!(view.video_url, "https://www.youtube.com/watch?v=abc");
    assert_eq!(view.status_text, "Video detected successfully!");

    panel.send(PanelMsg::SummarizeClicked);
    let mut seen = Vec::new();
    let done = tokio::time::timeout(WAIT, async {
        while let Some(view) = panel.changed().await {
            seen.push(view.progress);
            if view.status == PanelStatus::Summarized {
                return view;
            }
        }
        panic!("panel closed early");
    })
    .await
    .unwrap();

    assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]), "{seen:?}");
    assert_eq!(done.progress, 100);
    assert!(!done.summarizing);
    assert_eq!(
        done.result_url.as_deref(),
        Some("https://example.com/processed/1.mp4")
    );
    assert_eq!(
        done.summary_output.as_deref(),
        Some(
            "Original video: https://www.youtube.com/watch?v=abc\n\
             Summarized video: https://example.com/processed/1.mp4"
        )
    );

    panel.send(PanelMsg::ExportClicked);
    let view = wait_status(&mut panel, PanelStatus::Exported).await;
    assert!(view.confirmation_visible);
    assert_eq!(
        clipboard.contents().as_deref(),
        Some("https://example.com/processed/1.mp4")
    );

    panel.close().await;
    assert!(!extension.bus().is_registered(Endpoint::Panel));
    extension.shutdown().await;
}

#[tokio::test]
async fn empty_input_never_reaches_the_background() {
    init_logging();
    let bus = MessageBus::new();
    let mut background = bus.register(Endpoint::Background);
    let mut panel = PanelController::spawn(
        bus.clone(),
        Box::new(MemoryClipboard::new()),
        &fast_config(),
    );

    panel.send(PanelMsg::VideoUrlEdited("   ".into()));
    panel.send(PanelMsg::SummarizeClicked);
    let view = wait_status(&mut panel, PanelStatus::Failed(PanelError::MissingInput)).await;
    assert_eq!(
        view.status_text,
        "Please enter a video URL or detect a video first."
    );
    assert!(!view.summarizing);
    assert!(background.try_recv().is_none());
    panel.close().await;
}

#[tokio::test]
async fn export_before_a_result_is_refused() {
    init_logging();
    let bus = MessageBus::new();
    let mut background = bus.register(Endpoint::Background);
    let clipboard = MemoryClipboard::new();
    let mut panel = PanelController::spawn(bus.clone(), Box::new(clipboard.clone()), &fast_config());

    panel.send(PanelMsg::ExportClicked);
    let view = wait_status(&mut panel, PanelStatus::Failed(PanelError::NothingToExport)).await;
    assert_eq!(view.status_text, "Please summarize a video first.");
    assert_eq!(clipboard.contents(), None);
    assert!(background.try_recv().is_none());
    panel.close().await;
}

#[tokio::test]
async fn detect_without_active_tab_reports_transport_failure() {
    init_logging();
    let extension = Extension::launch(fast_config()).unwrap();
    let mut panel = extension.open_panel(Box::new(MemoryClipboard::new()));

    panel.send(PanelMsg::DetectClicked);
    let view = panel
        .wait_for(WAIT, |view| matches!(view.status, PanelStatus::Failed(_)))
        .await
        .unwrap();
    assert_eq!(
        view.status,
        PanelStatus::Failed(PanelError::TransportFailure {
            detail: "no active tab".into(),
        })
    );
    assert!(!view.detecting);
    panel.close().await;
    extension.shutdown().await;
}

#[tokio::test]
async fn detect_on_tab_without_video() {
    init_logging();
    let mut extension = Extension::launch(fast_config()).unwrap();
    extension.open_tab(
        TabId(2),
        PageDocument::new("https://www.youtube.com/feed", "<p>feed</p>"),
    );
    extension.activate_tab(TabId(2));
    let mut panel = extension.open_panel(Box::new(MemoryClipboard::new()));

    panel.send(PanelMsg::DetectClicked);
    let view = wait_status(&mut panel, PanelStatus::Failed(PanelError::NoVideoDetected)).await;
    assert_eq!(view.status_text, "No video detected on the page.");
    assert_eq!(view.video_url, "");
    panel.close().await;
    extension.shutdown().await;
}

#[tokio::test]
async fn background_gone_fails_the_summary_and_finalizes() {
    init_logging();
    let bus = MessageBus::new();
    let mut panel = PanelController::spawn(
        bus.clone(),
        Box::new(MemoryClipboard::new()),
        &fast_config(),
    );

    panel.send(PanelMsg::VideoUrlEdited("https://youtu.be/x".into()));
    panel.send(PanelMsg::SummarizeClicked);
    let view = panel
        .wait_for(WAIT, |view| matches!(view.status, PanelStatus::Failed(_)))
        .await
        .unwrap();
    assert!(matches!(
        view.status,
        PanelStatus::Failed(PanelError::TransportFailure { .. })
    ));
    assert!(!view.summarizing);
    assert_eq!(view.result_url, None);
    panel.close().await;
}

#[tokio::test]
async fn silent_background_hits_the_idle_timeout() {
    init_logging();
    let bus = MessageBus::new();
    let mut background = bus.register(Endpoint::Background);
    let config = ExtensionConfig {
        progress_idle_timeout_ms: 50,
        ..fast_config()
    };
    let mut panel = PanelController::spawn(bus.clone(), Box::new(MemoryClipboard::new()), &config);

    panel.send(PanelMsg::VideoUrlEdited("https://youtu.be/x".into()));
    panel.send(PanelMsg::SummarizeClicked);
    // Hold the request open without answering or pushing progress.
    let held = tokio::time::timeout(WAIT, background.recv()).await.unwrap().unwrap();

    let view = panel
        .wait_for(WAIT, |view| matches!(view.status, PanelStatus::Failed(_)))
        .await
        .unwrap();
    match view.status {
        PanelStatus::Failed(PanelError::TransportFailure { detail }) => {
            assert!(detail.contains("no response from background"), "{detail}");
        }
        other => panic!("unexpected status {other:?}"),
    }
    drop(held);
    panel.close().await;
}

#[tokio::test]
async fn second_summarize_is_refused_while_running() {
    init_logging();
    let config = ExtensionConfig {
        summarizer: SimulationSettings {
            tick_interval_ms: 20,
            ..SimulationSettings::default()
        },
        ..fast_config()
    };
    let extension = Extension::launch(config).unwrap();
    let mut first = extension.open_panel(Box::new(MemoryClipboard::new()));
    first.send(PanelMsg::VideoUrlEdited("https://youtu.be/x".into()));
    first.send(PanelMsg::SummarizeClicked);
    first
        .wait_for(WAIT, |view| view.progress >= 10)
        .await
        .unwrap();

    // A bus-level request stands in for a second caller.
    let reply = extension
        .bus()
        .round_trip(
            Endpoint::Content(TabId(9)),
            Endpoint::Background,
            summarizer_core::Message::SummarizeVideo {
                video_url: "https://youtu.be/y".into(),
            },
            WAIT,
        )
        .await
        .unwrap();
    assert_eq!(
        reply,
        summarizer_core::Reply::Summary(summarizer_core::SummaryOutcome::Failed {
            reason: summarizer_core::JobFailureReason::AlreadyRunning,
        })
    );

    let view = wait_status(&mut first, PanelStatus::Summarized).await;
    assert_eq!(view.progress, 100);
    first.close().await;
    extension.shutdown().await;
}

#[tokio::test]
async fn cancel_from_the_panel_stops_the_job() {
    init_logging();
    let config = ExtensionConfig {
        summarizer: SimulationSettings {
            tick_interval_ms: 20,
            ..SimulationSettings::default()
        },
        ..fast_config()
    };
    let extension = Extension::launch(config).unwrap();
    let mut panel = extension.open_panel(Box::new(MemoryClipboard::new()));

    panel.send(PanelMsg::VideoUrlEdited("https://youtu.be/x".into()));
    panel.send(PanelMsg::SummarizeClicked);
    panel.wait_for(WAIT, |view| view.progress >= 10).await.unwrap();

    panel.send(PanelMsg::CancelClicked);
    let view = panel
        .wait_for(WAIT, |view| matches!(view.status, PanelStatus::Failed(_)))
        .await
        .unwrap();
    assert_eq!(view.status_text, "Summarization failed: the job was cancelled");
    assert!(!view.summarizing);
    assert!(view.progress < 100);
    panel.close().await;
    extension.shutdown().await;
}

#[tokio::test]
async fn denied_clipboard_shows_failure() {
    init_logging();
    let extension = Extension::launch(fast_config()).unwrap();
    let mut panel = extension.open_panel(Box::new(MemoryClipboard::denied()));

    panel.send(PanelMsg::VideoUrlEdited("https://youtu.be/x".into()));
    panel.send(PanelMsg::SummarizeClicked);
    wait_status(&mut panel, PanelStatus::Summarized).await;

    panel.send(PanelMsg::ExportClicked);
    let view = wait_status(&mut panel, PanelStatus::Failed(PanelError::ClipboardFailure)).await;
    assert_eq!(view.status_text, "Failed to copy URL. Please try again.");
    assert!(view.result_url.is_some());
    panel.close().await;
    extension.shutdown().await;
}

#[tokio::test]
async fn reopening_the_panel_closes_the_old_one() {
    init_logging();
    let extension = Extension::launch(fast_config()).unwrap();
    let mut old = extension.open_panel(Box::new(MemoryClipboard::new()));
    let new = extension.open_panel(Box::new(MemoryClipboard::new()));

    let closed = old.wait_for(WAIT, |view| view.closed).await;
    assert!(closed.is_some() || old.view().closed);
    assert!(extension.bus().is_registered(Endpoint::Panel));

    old.close().await;
    assert!(extension.bus().is_registered(Endpoint::Panel));
    new.close().await;
    assert!(!extension.bus().is_registered(Endpoint::Panel));
    extension.shutdown().await;
}

#[tokio::test]
async fn action_click_shows_and_hides_the_sidebar() {
    init_logging();
    let mut extension = Extension::launch(fast_config()).unwrap();
    extension.open_tab(TabId(1), watch_page());

    extension.click_action(TabId(1), "https://www.youtube.com/watch?v=abc");
    assert!(extension
        .relay(TabId(1))
        .unwrap()
        .wait_for_visibility(true, WAIT)
        .await);

    extension.click_action(TabId(1), "https://www.youtube.com/watch?v=abc");
    assert!(extension
        .relay(TabId(1))
        .unwrap()
        .wait_for_visibility(false, WAIT)
        .await);

    // A reloaded page picks up the recorded state.
    extension.click_action(TabId(1), "https://www.youtube.com/watch?v=abc");
    assert!(extension
        .relay(TabId(1))
        .unwrap()
        .wait_for_visibility(true, WAIT)
        .await);
    let reloaded = extension.open_tab(TabId(1), watch_page());
    assert!(reloaded.wait_for_visibility(true, WAIT).await);

    extension.close_tab(TabId(1));
    assert!(extension.relay(TabId(1)).is_none());
    assert!(!extension.bus().is_registered(Endpoint::Content(TabId(1))));
    extension.shutdown().await;
}

#[tokio::test]
async fn idle_timeout_cancels_the_background_job() {
    init_logging();
    let bus = MessageBus::new();
    let mut background = bus.register(Endpoint::Background);
    let config = ExtensionConfig {
        progress_idle_timeout_ms: 50,
        ..fast_config()
    };
    let mut panel = PanelController::spawn(bus.clone(), Box::new(MemoryClipboard::new()), &config);

    panel.send(PanelMsg::VideoUrlEdited("https://youtu.be/x".into()));
    panel.send(PanelMsg::SummarizeClicked);
    let summarize = tokio::time::timeout(WAIT, background.recv()).await.unwrap().unwrap();
    assert!(matches!(
        summarize.message,
        summarizer_core::Message::SummarizeVideo { .. }
    ));

    let cancel = tokio::time::timeout(WAIT, background.recv()).await.unwrap().unwrap();
    assert_eq!(cancel.message, summarizer_core::Message::CancelSummary);
    assert_eq!(cancel.from, Endpoint::Panel);
    cancel
        .responder
        .expect("cancel is a request")
        .respond(summarizer_core::Reply::Ack);

    let view = panel
        .wait_for(WAIT, |view| matches!(view.status, PanelStatus::Failed(_)))
        .await
        .unwrap();
    assert!(matches!(
        view.status,
        PanelStatus::Failed(PanelError::TransportFailure { .. })
    ));
    drop(summarize);
    panel.close().await;
}

#[tokio::test]
async fn retry_after_idle_timeout_is_not_refused() {
    init_logging();
    let config = ExtensionConfig {
        progress_idle_timeout_ms: 100,
        summarizer: SimulationSettings {
            tick_interval_ms: 300,
            ..SimulationSettings::default()
        },
        ..fast_config()
    };
    let extension = Extension::launch(config).unwrap();
    let mut panel = extension.open_panel(Box::new(MemoryClipboard::new()));

    panel.send(PanelMsg::VideoUrlEdited("https://youtu.be/x".into()));
    panel.send(PanelMsg::SummarizeClicked);
    let view = panel
        .wait_for(WAIT, |view| matches!(view.status, PanelStatus::Failed(_)))
        .await
        .unwrap();
    assert!(matches!(
        view.status,
        PanelStatus::Failed(PanelError::TransportFailure { .. })
    ));

    // The timed-out job was cancelled, so a second attempt starts a new job
    // instead of being told one is already running.
    panel.send(PanelMsg::SummarizeClicked);
    panel
        .wait_for(WAIT, |view| view.status == PanelStatus::Processing)
        .await
        .unwrap();
    let view = panel
        .wait_for(WAIT, |view| matches!(view.status, PanelStatus::Failed(_)))
        .await
        .unwrap();
    assert_ne!(view.status, PanelStatus::Failed(PanelError::AlreadyRunning));
    assert!(matches!(
        view.status,
        PanelStatus::Failed(PanelError::TransportFailure { .. })
    ));
    panel.close().await;
    extension.shutdown().await;
}

#[tokio::test]
async fn steady_progress_keeps_a_long_job_alive() {
    init_logging();
    // Each tick lands well inside the idle window, but the whole job takes
    // several windows.
    let config = ExtensionConfig {
        progress_idle_timeout_ms: 150,
        summarizer: SimulationSettings {
            tick_interval_ms: 60,
            ..SimulationSettings::default()
        },
        ..fast_config()
    };
    let extension = Extension::launch(config).unwrap();
    let mut panel = extension.open_panel(Box::new(MemoryClipboard::new()));

    panel.send(PanelMsg::VideoUrlEdited("https://youtu.be/x".into()));
    panel.send(PanelMsg::SummarizeClicked);
    let view = panel
        .wait_for(WAIT, |view| {
            matches!(view.status, PanelStatus::Summarized | PanelStatus::Failed(_))
        })
        .await
        .unwrap();
    assert_eq!(view.status, PanelStatus::Summarized, "{}", view.status_text);
    assert_eq!(view.progress, 100);
    panel.close().await;
    extension.shutdown().await;
}
