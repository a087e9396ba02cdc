//! In-process stand-in for the browser's extension messaging runtime.
//!
//! Each context registers an [`Endpoint`] and drains its [`Inbox`]. A push is
//! fire-and-forget; a request carries a one-shot [`Responder`] that can be
//! answered at most once, and only by the receiving context. If the receiver
//! drops the responder (context torn down, action not handled) the caller sees
//! [`TransportError::NoResponse`] instead of waiting forever.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use extension_logging::{ext_debug, ext_trace, BUS};
use summarizer_core::{Message, Reply, TabId};
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Background,
    Content(TabId),
    Panel,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Background => write!(f, "background"),
            Endpoint::Content(tab_id) => write!(f, "content({tab_id})"),
            Endpoint::Panel => write!(f, "panel"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("no receiver registered for {0}")]
    NoReceiver(Endpoint),
    #[error("{0} closed without responding")]
    NoResponse(Endpoint),
    #[error("no response from {endpoint} within {timeout:?}")]
    TimedOut {
        endpoint: Endpoint,
        timeout: Duration,
    },
    #[error("no active tab")]
    NoActiveTab,
}

#[derive(Debug)]
pub struct Envelope {
    pub message: Message,
    pub from: Endpoint,
    pub responder: Option<Responder>,
}

/// One-shot reply slot for a request. Consumed by [`Responder::respond`].
#[derive(Debug)]
pub struct Responder {
    tx: oneshot::Sender<Reply>,
    action: &'static str,
}

impl Responder {
    pub fn respond(self, reply: Reply) {
        if self.tx.send(reply).is_err() {
            ext_debug!(BUS, "caller of {} went away before the reply", self.action);
        }
    }
}

#[derive(Debug)]
pub struct Inbox {
    endpoint: Endpoint,
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl Inbox {
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Next envelope, or `None` once the endpoint was unregistered or replaced.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }
}

/// Reply future for an in-flight request.
#[derive(Debug)]
pub struct PendingReply {
    endpoint: Endpoint,
    rx: oneshot::Receiver<Reply>,
}

impl PendingReply {
    pub async fn wait(self) -> Result<Reply, TransportError> {
        self.rx
            .await
            .map_err(|_| TransportError::NoResponse(self.endpoint))
    }

    pub async fn wait_timeout(self, timeout: Duration) -> Result<Reply, TransportError> {
        let endpoint = self.endpoint;
        match tokio::time::timeout(timeout, self.wait()).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::TimedOut { endpoint, timeout }),
        }
    }
}

#[derive(Default)]
struct Routes {
    inboxes: HashMap<Endpoint, mpsc::UnboundedSender<Envelope>>,
    active_tab: Option<TabId>,
}

#[derive(Clone, Default)]
pub struct MessageBus {
    routes: Arc<Mutex<Routes>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn routes(&self) -> MutexGuard<'_, Routes> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `endpoint`, replacing (and closing) any previous inbox for it.
    pub fn register(&self, endpoint: Endpoint) -> Inbox {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.routes().inboxes.insert(endpoint, tx).is_some() {
            ext_debug!(BUS, "{} re-registered; previous inbox closed", endpoint);
        }
        Inbox { endpoint, rx }
    }

    pub fn unregister(&self, endpoint: Endpoint) {
        if self.routes().inboxes.remove(&endpoint).is_some() {
            ext_debug!(BUS, "{} unregistered", endpoint);
        }
    }

    pub fn is_registered(&self, endpoint: Endpoint) -> bool {
        self.routes().inboxes.contains_key(&endpoint)
    }

    pub fn set_active_tab(&self, tab_id: Option<TabId>) {
        self.routes().active_tab = tab_id;
    }

    pub fn active_tab(&self) -> Option<TabId> {
        self.routes().active_tab
    }

    pub fn push(&self, from: Endpoint, to: Endpoint, message: Message) -> Result<(), TransportError> {
        ext_trace!(BUS, "push {} {} -> {}", message.action(), from, to);
        self.deliver(
            to,
            Envelope {
                message,
                from,
                responder: None,
            },
        )
    }

    pub fn request(
        &self,
        from: Endpoint,
        to: Endpoint,
        message: Message,
    ) -> Result<PendingReply, TransportError> {
        ext_trace!(BUS, "request {} {} -> {}", message.action(), from, to);
        let (tx, rx) = oneshot::channel();
        let responder = Responder {
            tx,
            action: message.action(),
        };
        self.deliver(
            to,
            Envelope {
                message,
                from,
                responder: Some(responder),
            },
        )?;
        Ok(PendingReply { endpoint: to, rx })
    }

    pub async fn round_trip(
        &self,
        from: Endpoint,
        to: Endpoint,
        message: Message,
        timeout: Duration,
    ) -> Result<Reply, TransportError> {
        self.request(from, to, message)?.wait_timeout(timeout).await
    }

    fn deliver(&self, to: Endpoint, envelope: Envelope) -> Result<(), TransportError> {
        let tx = self
            .routes()
            .inboxes
            .get(&to)
            .cloned()
            .ok_or(TransportError::NoReceiver(to))?;
        if tx.send(envelope).is_err() {
            // The context dropped its inbox without unregistering.
            let mut routes = self.routes();
            if routes.inboxes.get(&to).is_some_and(|current| current.same_channel(&tx)) {
                routes.inboxes.remove(&to);
            }
            return Err(TransportError::NoReceiver(to));
        }
        Ok(())
    }
}
