//! Chrome around the active step: title, progress, navigation buttons.

use serde::Serialize;

/// Position of a step relative to the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Current,
    Upcoming,
}

/// One marker of the progress bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressMarker {
    pub id: u32,
    pub title: String,
    pub status: StepStatus,
}

/// Primary button of the footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "label", rename_all = "lowercase")]
pub enum PrimaryAction {
    Next,
    Submit(String),
}

/// Everything the wizard frame shows, derived from controller state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellView {
    pub title: String,
    /// "Step n of m"
    pub progress_label: String,
    pub markers: Vec<ProgressMarker>,
    pub step_title: String,
    pub step_description: String,
    pub back_enabled: bool,
    pub primary: PrimaryAction,
    pub primary_enabled: bool,
    pub cancel_enabled: bool,
}

impl ShellView {
    pub fn current_marker(&self) -> Option<&ProgressMarker> {
        self.markers.iter().find(|m| m.status == StepStatus::Current)
    }
}

pub(crate) fn status_of(index: usize, current: usize) -> StepStatus {
    match index.cmp(&current) {
        std::cmp::Ordering::Less => StepStatus::Completed,
        std::cmp::Ordering::Equal => StepStatus::Current,
        std::cmp::Ordering::Greater => StepStatus::Upcoming,
    }
}
