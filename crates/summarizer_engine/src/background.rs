use std::collections::BTreeMap;

use extension_logging::{ext_debug, ext_info, ext_warn, BACKGROUND};
use summarizer_core::{JobId, Message, Reply, SidebarState, SummaryOutcome, TabId, TabRegistry};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bus::{Endpoint, Envelope, Inbox, MessageBus, Responder};
use crate::config::ExtensionConfig;
use crate::job_engine::{JobEngine, JobUpdate};

/// Events the host browser raises outside the message protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Toolbar action clicked while `tab_id` showed `url`.
    ActionClicked { tab_id: TabId, url: String },
    TabClosed { tab_id: TabId },
}

/// A `summarizeVideo` whose reply is held open until the job ends.
struct PendingSummary {
    responder: Responder,
    subscriber: Endpoint,
}

/// Process-wide authority for sidebar visibility and the single job.
///
/// Runs as one task; every mutation of tab or job state happens inside it.
pub struct BackgroundController {
    bus: MessageBus,
    tabs: TabRegistry,
    engine: JobEngine,
    pending: BTreeMap<JobId, PendingSummary>,
    config: ExtensionConfig,
}

pub struct BackgroundHandle {
    host_tx: mpsc::UnboundedSender<HostEvent>,
    task: JoinHandle<()>,
}

impl BackgroundHandle {
    pub fn action_clicked(&self, tab_id: TabId, url: impl Into<String>) {
        let _ = self.host_tx.send(HostEvent::ActionClicked {
            tab_id,
            url: url.into(),
        });
    }

    pub fn tab_closed(&self, tab_id: TabId) {
        let _ = self.host_tx.send(HostEvent::TabClosed { tab_id });
    }

    /// Stops the controller and waits for it to exit. Pending summaries are
    /// dropped, which their callers observe as a missing response.
    pub async fn shutdown(self) {
        drop(self.host_tx);
        let _ = self.task.await;
    }
}

impl BackgroundController {
    pub fn new(bus: MessageBus, engine: JobEngine, config: ExtensionConfig) -> Self {
        Self {
            bus,
            tabs: TabRegistry::new(),
            engine,
            pending: BTreeMap::new(),
            config,
        }
    }

    /// Registers the background endpoint and starts the controller task.
    pub fn spawn(self) -> BackgroundHandle {
        let inbox = self.bus.register(Endpoint::Background);
        let (host_tx, host_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(inbox, host_rx));
        BackgroundHandle { host_tx, task }
    }

    async fn run(mut self, mut inbox: Inbox, mut host_rx: mpsc::UnboundedReceiver<HostEvent>) {
        ext_info!(BACKGROUND, "background controller started");
        loop {
            tokio::select! {
                envelope = inbox.recv() => match envelope {
                    Some(envelope) => self.handle_envelope(envelope),
                    None => break,
                },
                event = host_rx.recv() => match event {
                    Some(event) => self.handle_host_event(event),
                    None => break,
                },
                Some(update) = self.engine.next_update() => self.handle_job_update(update),
            }
        }
        self.engine.cancel();
        self.bus.unregister(Endpoint::Background);
        ext_info!(BACKGROUND, "background controller stopped");
    }

    fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::ActionClicked { tab_id, url } => {
                if !self.config.activates_on(&url) {
                    ext_debug!(BACKGROUND, "action ignored on {} ({})", tab_id, url);
                    return;
                }
                let open = self.tabs.toggle(tab_id);
                ext_info!(BACKGROUND, "sidebar for {} -> open={}", tab_id, open);
                // Best effort: the page may not have a relay yet.
                if let Err(err) = self.bus.push(
                    Endpoint::Background,
                    Endpoint::Content(tab_id),
                    Message::ToggleSidebar { open },
                ) {
                    ext_debug!(BACKGROUND, "toggleSidebar not delivered: {}", err);
                }
            }
            HostEvent::TabClosed { tab_id } => {
                if self.tabs.forget(tab_id) {
                    ext_debug!(BACKGROUND, "forgot {}", tab_id);
                }
            }
        }
    }

    fn handle_envelope(&mut self, envelope: Envelope) {
        let Envelope {
            message,
            from,
            responder,
        } = envelope;

        match message {
            Message::GetSidebarState => {
                let open = match from {
                    Endpoint::Content(tab_id) => self.tabs.is_open(tab_id),
                    _ => false,
                };
                reply(responder, Reply::SidebarState(SidebarState { open }));
            }
            Message::SummarizeVideo { video_url } => {
                let Some(responder) = responder else {
                    ext_warn!(BACKGROUND, "summarizeVideo from {} sent as a push; ignored", from);
                    return;
                };
                self.start_summary(video_url, from, responder);
            }
            Message::CancelSummary => {
                if let Some(update) = self.engine.cancel() {
                    self.handle_job_update(update);
                }
                reply(responder, Reply::Ack);
            }
            Message::ToggleSidebar { .. }
            | Message::DetectVideo
            | Message::UpdateProgress { .. }
            | Message::Unknown => {
                // Dropping the responder tells the caller nobody handled it.
                ext_debug!(
                    BACKGROUND,
                    "ignoring {} from {}",
                    message.action(),
                    from
                );
            }
        }
    }

    fn start_summary(&mut self, video_url: String, from: Endpoint, responder: Responder) {
        match self.engine.start(&video_url) {
            Ok(handle) => {
                self.pending.insert(
                    handle.job_id(),
                    PendingSummary {
                        responder,
                        subscriber: from,
                    },
                );
            }
            Err(reason) => {
                ext_info!(BACKGROUND, "summarizeVideo from {} rejected: {}", from, reason);
                responder.respond(Reply::Summary(SummaryOutcome::Failed { reason }));
            }
        }
    }

    fn handle_job_update(&mut self, update: JobUpdate) {
        match update {
            JobUpdate::Progress { job_id, progress } => {
                let Some(pending) = self.pending.get(&job_id) else {
                    return;
                };
                if let Err(err) = self.bus.push(
                    Endpoint::Background,
                    pending.subscriber,
                    Message::UpdateProgress { progress, job_id },
                ) {
                    ext_debug!(BACKGROUND, "progress for job {} not delivered: {}", job_id, err);
                }
            }
            JobUpdate::Completed { job_id, result_url } => {
                self.finish(job_id, SummaryOutcome::Completed { result_url });
            }
            JobUpdate::Failed { job_id, reason } => {
                self.finish(job_id, SummaryOutcome::Failed { reason });
            }
        }
    }

    fn finish(&mut self, job_id: JobId, outcome: SummaryOutcome) {
        match self.pending.remove(&job_id) {
            Some(pending) => pending.responder.respond(Reply::Summary(outcome)),
            None => ext_debug!(BACKGROUND, "job {} finished with nobody waiting", job_id),
        }
    }
}

fn reply(responder: Option<Responder>, reply: Reply) {
    if let Some(responder) = responder {
        responder.respond(reply);
    }
}
