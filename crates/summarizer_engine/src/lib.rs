//! Summarizer engine: message bus, job execution and the three extension contexts.
mod background;
mod bus;
mod clipboard;
mod config;
mod content;
mod detect;
mod extension;
mod http;
mod job_engine;
mod panel;
mod summarizer;

pub use background::{BackgroundController, BackgroundHandle, HostEvent};
pub use bus::{Endpoint, Envelope, Inbox, MessageBus, PendingReply, Responder, TransportError};
pub use clipboard::{Clipboard, ClipboardError, FileClipboard, MemoryClipboard};
pub use config::{ConfigError, ExtensionConfig};
pub use content::{ContentRelay, ContentRelayHandle, SurfaceView, SIDEBAR_ELEMENT_ID, SIDEBAR_TITLE};
pub use detect::{DomVideoDetector, PageDocument, VideoDetector};
pub use extension::Extension;
pub use http::{HttpBackendSettings, HttpSummarizer};
pub use job_engine::{EngineEvent, JobEngine, JobHandle, JobUpdate};
pub use panel::{PanelController, PanelHandle};
pub use summarizer::{ProgressSink, SimulatedSummarizer, SimulationSettings, Summarizer};
