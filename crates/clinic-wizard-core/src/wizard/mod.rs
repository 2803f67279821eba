//! Multi-step wizard engine.
//!
//! A [`WizardController`] owns an ordered list of steps and one draft record.
//! Navigation forward is gated by the current step's validation rules,
//! navigation back is free, and submission hands the finished entity to
//! the caller's [`WizardCallbacks`].
//!
//! The patient and appointment flows are two [`WizardFlavor`]s of the same
//! engine; a flavor supplies its steps, rules, field ownership and layouts.

mod appointment;
mod callbacks;
mod controller;
mod patient;
mod renderer;
mod shell;
mod validation;

pub use appointment::*;
pub use callbacks::*;
pub use controller::*;
pub use patient::*;
pub use renderer::*;
pub use shell::*;
pub use validation::*;

use std::fmt::Debug;

use thiserror::Error;

use crate::models::{Draft, WizardMode, WizardStep};

/// Programmer errors raised by the engine.
///
/// Invalid user input never surfaces here; it lands in
/// [`ValidationErrors`] instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WizardError {
    #[error("Wizard has no steps")]
    EmptySteps,

    #[error("Step index {index} out of range (wizard has {len} steps)")]
    StepOutOfRange { index: usize, len: usize },

    #[error("Field {field} expects a {expected} value, got {found}")]
    FieldType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field {field} does not belong to step {step:?}")]
    FieldNotOwned { field: &'static str, step: String },

    #[error("Unknown field: {0}")]
    UnknownField(String),
}

pub type WizardResult<T> = Result<T, WizardError>;

/// Field key type of a flavor's draft.
pub type FieldOf<F> = <<F as WizardFlavor>::Draft as Draft>::Field;

/// Everything that distinguishes one wizard from another.
pub trait WizardFlavor: 'static {
    /// Step variant; selects rules, owned fields and layout.
    type Step: Copy + Eq + Debug + Send + 'static;
    /// Record accumulated across the steps.
    type Draft: Draft;
    /// Validated entity handed to `on_success`.
    type Entity: Clone + Debug + Send + 'static;

    /// Short name used in logs.
    const KIND: &'static str;

    /// Canonical step sequence.
    fn default_steps() -> Vec<WizardStep<Self::Step>>;

    /// Rule set of one step. Pure; never fails.
    fn validate(step: Self::Step, draft: &Self::Draft) -> ValidationErrors<FieldOf<Self>>;

    /// Fields a step is allowed to write.
    fn owned_fields(step: Self::Step) -> &'static [FieldOf<Self>];

    /// Inputs a step shows for the current draft, conditional sub-fields
    /// included.
    fn layout(step: Self::Step, draft: &Self::Draft) -> StepLayout<FieldOf<Self>>;

    /// Convert a fully validated draft into the target entity.
    fn finalize(draft: &Self::Draft) -> WizardResult<Self::Entity>;

    /// Dialog title.
    fn title(mode: WizardMode) -> &'static str;

    /// Label of the primary action on the last step.
    fn submit_label(mode: WizardMode) -> &'static str;
}
