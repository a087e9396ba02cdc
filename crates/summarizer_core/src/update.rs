use crate::view_model::PanelStatus;
use crate::{PanelEffect, PanelError, PanelMsg, PanelState, SummaryOutcome};

/// Pure update function: applies a message to panel state and returns the
/// protocol calls the panel has to make.
///
/// Local validation failures (`MissingInput`, `NothingToExport`) are settled
/// here and never produce an effect.
pub fn update(mut state: PanelState, msg: PanelMsg) -> (PanelState, Vec<PanelEffect>) {
    if state.is_closed() {
        return (state, Vec::new());
    }

    let effects = match msg {
        PanelMsg::VideoUrlEdited(url) => {
            state.set_video_url_input(url);
            Vec::new()
        }
        PanelMsg::DetectClicked => {
            if state.is_detecting() {
                return (state, Vec::new());
            }
            state.begin_detection();
            vec![PanelEffect::SendDetectVideo]
        }
        PanelMsg::DetectReplied(detection) => {
            if state.is_detecting() {
                let url = detection.video_url.filter(|url| !url.trim().is_empty());
                state.finish_detection(url);
            }
            Vec::new()
        }
        PanelMsg::DetectFailed { detail } => {
            if state.is_detecting() {
                state.abort_detection(detail);
            }
            Vec::new()
        }
        PanelMsg::SummarizeClicked => {
            if state.is_summarizing() {
                return (state, Vec::new());
            }
            match state.summarize_target() {
                Some(video_url) => {
                    state.begin_summary(video_url.clone());
                    vec![PanelEffect::SendSummarizeVideo { video_url }]
                }
                None => {
                    state.fail(PanelError::MissingInput);
                    Vec::new()
                }
            }
        }
        PanelMsg::ProgressPushed { job_id, progress } => {
            state.accept_progress(job_id, progress);
            Vec::new()
        }
        PanelMsg::SummarizeReplied(outcome) => {
            if state.is_summarizing() {
                match outcome {
                    SummaryOutcome::Completed { result_url } => state.complete_summary(result_url),
                    SummaryOutcome::Failed { reason } => state.abort_summary(reason.into()),
                }
            }
            Vec::new()
        }
        PanelMsg::SummarizeFailed { detail } => {
            if state.is_summarizing() {
                state.abort_summary(PanelError::TransportFailure { detail });
            }
            Vec::new()
        }
        PanelMsg::CancelClicked => {
            if state.is_summarizing() {
                state.set_status(PanelStatus::Cancelling);
                vec![PanelEffect::SendCancelSummary]
            } else {
                Vec::new()
            }
        }
        PanelMsg::ExportClicked => match state.result_url() {
            Some(url) => vec![PanelEffect::WriteClipboard {
                text: url.to_string(),
            }],
            None => {
                state.fail(PanelError::NothingToExport);
                Vec::new()
            }
        },
        PanelMsg::ClipboardWritten(result) => {
            match result {
                Ok(()) => state.confirm_export(),
                Err(_) => state.fail(PanelError::ClipboardFailure),
            }
            Vec::new()
        }
        PanelMsg::Tick => {
            state.tick();
            Vec::new()
        }
        PanelMsg::Closed => {
            state.close();
            Vec::new()
        }
        PanelMsg::NoOp => Vec::new(),
    };

    (state, effects)
}
