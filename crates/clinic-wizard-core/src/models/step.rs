//! Wizard step descriptors.

use serde::{Deserialize, Serialize};

/// One screen of a wizard.
///
/// `kind` selects the renderer variant and the validation rule set, so a
/// flavor can reorder or drop steps without touching its rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WizardStep<K> {
    /// Display ordinal (1-based)
    pub id: u32,
    /// Short title shown in the progress bar
    pub title: String,
    /// One-line description shown above the step content
    pub description: String,
    /// Renderer / rule-set variant
    pub kind: K,
}

impl<K> WizardStep<K> {
    pub fn new(id: u32, title: &str, description: &str, kind: K) -> Self {
        Self {
            id,
            title: title.to_string(),
            description: description.to_string(),
            kind,
        }
    }
}

/// Whether the wizard creates a new entity or edits an existing one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WizardMode {
    #[default]
    Create,
    Edit,
}

impl WizardMode {
    pub fn as_str(self) -> &'static str {
        match self {
            WizardMode::Create => "create",
            WizardMode::Edit => "edit",
        }
    }
}
