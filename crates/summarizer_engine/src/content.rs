use std::time::Duration;

use extension_logging::{ext_debug, ext_info, ext_warn, CONTENT};
use summarizer_core::{Detection, Message, Reply, TabId};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::bus::{Endpoint, Envelope, Inbox, MessageBus};
use crate::detect::{DomVideoDetector, PageDocument, VideoDetector};

pub const SIDEBAR_ELEMENT_ID: &str = "video-summarizer-sidebar";
pub const SIDEBAR_TITLE: &str = "Video Summarizer";

/// What the page currently renders for the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceView {
    pub created: bool,
    pub visible: bool,
}

/// Per-page bridge: shows or hides the sidebar surface and answers
/// `detectVideo` from the page DOM.
pub struct ContentRelay {
    tab_id: TabId,
    page: PageDocument,
    bus: MessageBus,
    detector: Box<dyn VideoDetector>,
    request_timeout: Duration,
    surface: watch::Sender<SurfaceView>,
}

pub struct ContentRelayHandle {
    tab_id: TabId,
    page_url: String,
    surface: watch::Receiver<SurfaceView>,
    task: JoinHandle<()>,
}

impl ContentRelayHandle {
    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn surface(&self) -> SurfaceView {
        *self.surface.borrow()
    }

    pub fn watch_surface(&self) -> watch::Receiver<SurfaceView> {
        self.surface.clone()
    }

    /// Waits until the sidebar visibility equals `visible`, up to `timeout`.
    pub async fn wait_for_visibility(&self, visible: bool, timeout: Duration) -> bool {
        let mut surface = self.surface.clone();
        tokio::time::timeout(timeout, surface.wait_for(|view| view.visible == visible))
            .await
            .is_ok_and(|result| result.is_ok())
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl ContentRelay {
    pub fn new(tab_id: TabId, page: PageDocument, bus: MessageBus, request_timeout: Duration) -> Self {
        let (surface, _) = watch::channel(SurfaceView::default());
        Self {
            tab_id,
            page,
            bus,
            detector: Box::new(DomVideoDetector),
            request_timeout,
            surface,
        }
    }

    pub fn with_detector(mut self, detector: Box<dyn VideoDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Registers the tab's endpoint, then runs the page-load sync and the
    /// message loop on a new task. The loop ends when the endpoint is
    /// unregistered or replaced by a reloaded page.
    pub fn spawn(self) -> ContentRelayHandle {
        let inbox = self.bus.register(Endpoint::Content(self.tab_id));
        let handle_surface = self.surface.subscribe();
        let tab_id = self.tab_id;
        let page_url = self.page.url.clone();
        let task = tokio::spawn(self.run(inbox));
        ContentRelayHandle {
            tab_id,
            page_url,
            surface: handle_surface,
            task,
        }
    }

    async fn run(mut self, mut inbox: Inbox) {
        self.sync_with_background().await;
        while let Some(envelope) = inbox.recv().await {
            self.handle_envelope(envelope);
        }
        ext_debug!(CONTENT, "relay for {} stopped", self.tab_id);
    }

    /// Page load: adopt whatever the background last recorded for this tab.
    async fn sync_with_background(&mut self) {
        let reply = self
            .bus
            .round_trip(
                Endpoint::Content(self.tab_id),
                Endpoint::Background,
                Message::GetSidebarState,
                self.request_timeout,
            )
            .await;
        match reply {
            Ok(Reply::SidebarState(state)) => self.set_visible(state.open),
            Ok(other) => ext_warn!(CONTENT, "unexpected getSidebarState reply: {:?}", other),
            Err(err) => ext_warn!(CONTENT, "{} could not read sidebar state: {}", self.tab_id, err),
        }
    }

    fn handle_envelope(&mut self, envelope: Envelope) {
        let Envelope {
            message, responder, ..
        } = envelope;
        match message {
            Message::ToggleSidebar { open } => self.set_visible(open),
            Message::DetectVideo => {
                let detection = self.detect();
                ext_info!(
                    CONTENT,
                    "{} detectVideo -> {}",
                    self.tab_id,
                    detection.video_url.as_deref().unwrap_or("none")
                );
                if let Some(responder) = responder {
                    responder.respond(Reply::Detection(detection));
                }
            }
            Message::GetSidebarState
            | Message::SummarizeVideo { .. }
            | Message::UpdateProgress { .. }
            | Message::CancelSummary
            | Message::Unknown => {
                ext_debug!(CONTENT, "{} ignoring {}", self.tab_id, message.action());
            }
        }
    }

    /// Creates the surface on first use and sets its visibility. Idempotent.
    fn set_visible(&mut self, open: bool) {
        self.surface.send_if_modified(|surface| {
            let next = SurfaceView {
                created: true,
                visible: open,
            };
            if *surface == next {
                return false;
            }
            if !surface.created {
                ext_debug!(CONTENT, "{} created #{}", self.tab_id, SIDEBAR_ELEMENT_ID);
            }
            *surface = next;
            true
        });
    }

    pub fn detect(&self) -> Detection {
        Detection {
            video_url: self.detector.detect(&self.page),
        }
    }
}
