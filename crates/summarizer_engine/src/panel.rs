use std::collections::VecDeque;
use std::time::Duration;

use extension_logging::{ext_debug, ext_info, ext_warn, PANEL};
use summarizer_core::{update, Message, PanelEffect, PanelMsg, PanelState, PanelView, Reply};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::bus::{Endpoint, Envelope, Inbox, MessageBus, TransportError};
use crate::clipboard::Clipboard;
use crate::config::ExtensionConfig;

/// Runs the panel: feeds user messages and background pushes through the pure
/// [`update`] and executes the resulting effects over the bus.
pub struct PanelController {
    state: PanelState,
    bus: MessageBus,
    inbox: Inbox,
    input_rx: mpsc::UnboundedReceiver<PanelMsg>,
    clipboard: Box<dyn Clipboard>,
    view_tx: watch::Sender<PanelView>,
    request_timeout: Duration,
    idle_timeout: Duration,
    replaced: bool,
}

pub struct PanelHandle {
    input_tx: mpsc::UnboundedSender<PanelMsg>,
    view_rx: watch::Receiver<PanelView>,
    task: JoinHandle<()>,
}

impl PanelHandle {
    pub fn send(&self, msg: PanelMsg) -> bool {
        self.input_tx.send(msg).is_ok()
    }

    pub fn view(&self) -> PanelView {
        self.view_rx.borrow().clone()
    }

    /// Waits for the next published view. `None` once the panel is gone.
    pub async fn changed(&mut self) -> Option<PanelView> {
        self.view_rx.changed().await.ok()?;
        Some(self.view_rx.borrow_and_update().clone())
    }

    /// Waits until a published view satisfies `pred`, up to `timeout`.
    pub async fn wait_for(
        &mut self,
        timeout: Duration,
        mut pred: impl FnMut(&PanelView) -> bool,
    ) -> Option<PanelView> {
        let view = tokio::time::timeout(timeout, self.view_rx.wait_for(|view| pred(view)))
            .await
            .ok()?
            .ok()?
            .clone();
        Some(view)
    }

    /// Closes the panel and waits for its task to end.
    pub async fn close(self) {
        let _ = self.input_tx.send(PanelMsg::Closed);
        let _ = self.task.await;
    }
}

impl PanelController {
    /// Registers the panel endpoint and starts the panel task. A previously
    /// open panel loses its inbox and closes itself.
    pub fn spawn(bus: MessageBus, clipboard: Box<dyn Clipboard>, config: &ExtensionConfig) -> PanelHandle {
        let inbox = bus.register(Endpoint::Panel);
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let state = PanelState::new();
        let (view_tx, view_rx) = watch::channel(state.view());
        let controller = Self {
            state,
            bus,
            inbox,
            input_rx,
            clipboard,
            view_tx,
            request_timeout: config.request_timeout(),
            idle_timeout: config.progress_idle_timeout(),
            replaced: false,
        };
        let task = tokio::spawn(controller.run());
        PanelHandle {
            input_tx,
            view_rx,
            task,
        }
    }

    async fn run(mut self) {
        while !self.state.is_closed() {
            tokio::select! {
                msg = self.input_rx.recv() => match msg {
                    Some(msg) => self.dispatch(msg).await,
                    None => self.apply(PanelMsg::Closed),
                },
                envelope = self.inbox.recv() => match envelope {
                    Some(envelope) => self.handle_push(envelope),
                    None => self.endpoint_lost(),
                },
            }
        }
        if !self.replaced {
            self.bus.unregister(Endpoint::Panel);
        }
        ext_info!(PANEL, "panel closed");
    }

    fn endpoint_lost(&mut self) {
        ext_debug!(PANEL, "panel endpoint replaced or removed; closing");
        self.replaced = true;
        self.apply(PanelMsg::Closed);
    }

    async fn dispatch(&mut self, msg: PanelMsg) {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            for effect in self.apply_with_effects(msg) {
                let next = match effect {
                    PanelEffect::SendSummarizeVideo { video_url } => {
                        Some(self.await_summary(video_url).await)
                    }
                    other => self.run_effect(other).await,
                };
                queue.extend(next);
            }
        }
    }

    fn apply(&mut self, msg: PanelMsg) {
        for effect in self.apply_with_effects(msg) {
            ext_warn!(PANEL, "dropping effect {:?} raised outside dispatch", effect);
        }
    }

    fn apply_with_effects(&mut self, msg: PanelMsg) -> Vec<PanelEffect> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.view_tx.send_replace(state.view());
        }
        self.state = state;
        effects
    }

    fn handle_push(&mut self, envelope: Envelope) {
        match envelope.message {
            Message::UpdateProgress { progress, job_id } => {
                self.apply(PanelMsg::ProgressPushed { job_id, progress });
            }
            other => ext_debug!(PANEL, "ignoring {} from {}", other.action(), envelope.from),
        }
    }

    /// Sends `summarizeVideo` and keeps serving pushes and user input until
    /// the deferred reply arrives. Gives up when no progress is seen for the
    /// idle timeout.
    async fn await_summary(&mut self, video_url: String) -> PanelMsg {
        ext_info!(PANEL, "summarizeVideo {}", video_url);
        let pending = match self.bus.request(
            Endpoint::Panel,
            Endpoint::Background,
            Message::SummarizeVideo { video_url },
        ) {
            Ok(pending) => pending,
            Err(err) => return summarize_failed(err),
        };
        let reply = pending.wait();
        tokio::pin!(reply);
        let idle = tokio::time::sleep(self.idle_timeout);
        tokio::pin!(idle);

        loop {
            tokio::select! {
                result = &mut reply => {
                    return match result {
                        Ok(Reply::Summary(outcome)) => PanelMsg::SummarizeReplied(outcome),
                        Ok(other) => PanelMsg::SummarizeFailed {
                            detail: format!("unexpected reply {other:?}"),
                        },
                        Err(err) => summarize_failed(err),
                    };
                }
                envelope = self.inbox.recv() => match envelope {
                    Some(envelope) => {
                        let before = self.state.progress();
                        self.handle_push(envelope);
                        if self.state.progress() != before {
                            idle.as_mut().reset(Instant::now() + self.idle_timeout);
                        }
                    }
                    None => {
                        self.endpoint_lost();
                        return PanelMsg::NoOp;
                    }
                },
                msg = self.input_rx.recv() => {
                    self.run_inline(msg.unwrap_or(PanelMsg::Closed)).await;
                    if self.state.is_closed() {
                        return PanelMsg::NoOp;
                    }
                }
                () = &mut idle => {
                    // The job may still be running; stop it so a retry is not refused.
                    self.cancel_remote().await;
                    return summarize_failed(TransportError::TimedOut {
                        endpoint: Endpoint::Background,
                        timeout: self.idle_timeout,
                    });
                }
            }
        }
    }

    /// Handles user input that arrives while a summary is outstanding.
    async fn run_inline(&mut self, msg: PanelMsg) {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            for effect in self.apply_with_effects(msg) {
                queue.extend(self.run_effect(effect).await);
            }
        }
    }

    async fn run_effect(&mut self, effect: PanelEffect) -> Option<PanelMsg> {
        match effect {
            PanelEffect::SendDetectVideo => Some(self.detect().await),
            PanelEffect::SendCancelSummary => {
                self.cancel_remote().await;
                None
            }
            PanelEffect::WriteClipboard { text } => {
                let result = self.clipboard.write_text(&text).map_err(|err| {
                    ext_warn!(PANEL, "clipboard write failed: {}", err);
                    err.to_string()
                });
                Some(PanelMsg::ClipboardWritten(result))
            }
            PanelEffect::SendSummarizeVideo { .. } => {
                ext_warn!(PANEL, "summarize already outstanding; not resending");
                None
            }
        }
    }

    async fn cancel_remote(&mut self) {
        let result = self
            .bus
            .round_trip(
                Endpoint::Panel,
                Endpoint::Background,
                Message::CancelSummary,
                self.request_timeout,
            )
            .await;
        if let Err(err) = result {
            ext_warn!(PANEL, "cancelSummary failed: {}", err);
        }
    }

    async fn detect(&mut self) -> PanelMsg {
        let Some(tab_id) = self.bus.active_tab() else {
            return PanelMsg::DetectFailed {
                detail: TransportError::NoActiveTab.to_string(),
            };
        };
        let reply = self
            .bus
            .round_trip(
                Endpoint::Panel,
                Endpoint::Content(tab_id),
                Message::DetectVideo,
                self.request_timeout,
            )
            .await;
        match reply {
            Ok(Reply::Detection(detection)) => PanelMsg::DetectReplied(detection),
            Ok(other) => PanelMsg::DetectFailed {
                detail: format!("unexpected reply {other:?}"),
            },
            Err(err) => PanelMsg::DetectFailed {
                detail: err.to_string(),
            },
        }
    }
}

fn summarize_failed(err: TransportError) -> PanelMsg {
    ext_warn!(PANEL, "summarizeVideo failed: {}", err);
    PanelMsg::SummarizeFailed {
        detail: err.to_string(),
    }
}
