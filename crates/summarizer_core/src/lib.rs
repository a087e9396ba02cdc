//! Summarizer core: protocol vocabulary, job state machine and the pure panel update.
mod effect;
mod error;
mod job;
mod msg;
mod protocol;
mod state;
mod tabs;
mod update;
mod view_model;

pub use effect::PanelEffect;
pub use error::{JobFailureReason, PanelError};
pub use job::{Job, JobStatus, PROGRESS_MAX};
pub use msg::PanelMsg;
pub use protocol::{Detection, JobId, Message, Reply, SidebarState, SummaryOutcome, TabId};
pub use state::{PanelState, CONFIRMATION_TICKS};
pub use tabs::{TabRegistry, TabState};
pub use update::update;
pub use view_model::{PanelStatus, PanelView};
