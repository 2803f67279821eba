//! Wizard controller: owns the steps, the draft and the error map.

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::shell::status_of;
use super::{
    ChangeSink, FieldOf, PrimaryAction, ProgressMarker, ShellView, StepRenderer, StepView,
    ValidationErrors, WizardCallbacks, WizardError, WizardFlavor, WizardResult,
};
use crate::fingerprint::fingerprint;
use crate::models::{Draft, FieldKey, FieldValue, WizardMode, WizardStep};

/// Mutable state of a running wizard.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardState<D: Draft> {
    /// Index of the active step, always within the step list
    pub current_step: usize,
    pub draft: D,
    pub errors: ValidationErrors<D::Field>,
}

/// Result of [`WizardController::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The entity was handed to `on_success`.
    Submitted,
    /// Validation failed; `step` is the first step with errors.
    Invalid { step: usize },
}

/// Drives one wizard instance of flavor `F`, reporting to callbacks `C`.
pub struct WizardController<F: WizardFlavor, C> {
    id: Uuid,
    mode: WizardMode,
    steps: Vec<WizardStep<F::Step>>,
    state: WizardState<F::Draft>,
    /// Fingerprint of the draft as opened (or last submitted)
    baseline: Option<String>,
    callbacks: C,
}

impl<F, C> WizardController<F, C>
where
    F: WizardFlavor,
    C: WizardCallbacks<F::Entity>,
{
    /// Start a wizard over `steps`. An empty step list is rejected.
    pub fn new(
        steps: Vec<WizardStep<F::Step>>,
        mode: WizardMode,
        initial: Option<F::Draft>,
        callbacks: C,
    ) -> WizardResult<Self> {
        if steps.is_empty() {
            return Err(WizardError::EmptySteps);
        }
        Ok(Self::build(steps, mode, initial, callbacks))
    }

    /// Start a wizard over the flavor's canonical steps.
    pub fn with_default_steps(mode: WizardMode, initial: Option<F::Draft>, callbacks: C) -> Self {
        Self::build(F::default_steps(), mode, initial, callbacks)
    }

    fn build(
        steps: Vec<WizardStep<F::Step>>,
        mode: WizardMode,
        initial: Option<F::Draft>,
        callbacks: C,
    ) -> Self {
        let draft = initial.unwrap_or_default();
        let baseline = fingerprint(&draft).ok();
        let id = Uuid::new_v4();
        debug!(
            wizard_id = %id,
            flavor = F::KIND,
            mode = mode.as_str(),
            steps = steps.len(),
            "Wizard opened"
        );
        Self {
            id,
            mode,
            steps,
            state: WizardState {
                current_step: 0,
                draft,
                errors: ValidationErrors::new(),
            },
            baseline,
            callbacks,
        }
    }

    // -- accessors --

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> WizardMode {
        self.mode
    }

    pub fn steps(&self) -> &[WizardStep<F::Step>] {
        &self.steps
    }

    pub fn current_step(&self) -> usize {
        self.state.current_step
    }

    /// The active step.
    pub fn current(&self) -> &WizardStep<F::Step> {
        &self.steps[self.state.current_step]
    }

    pub fn is_last_step(&self) -> bool {
        self.state.current_step + 1 == self.steps.len()
    }

    /// True while no validation message is outstanding.
    pub fn is_valid(&self) -> bool {
        self.state.errors.is_empty()
    }

    pub fn draft(&self) -> &F::Draft {
        &self.state.draft
    }

    pub fn errors(&self) -> &ValidationErrors<FieldOf<F>> {
        &self.state.errors
    }

    pub fn state(&self) -> &WizardState<F::Draft> {
        &self.state
    }

    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut C {
        &mut self.callbacks
    }

    /// True when the draft differs from the one the wizard was opened with.
    pub fn is_dirty(&self) -> bool {
        fingerprint(&self.state.draft).ok() != self.baseline
    }

    // -- mutation --

    /// Write one field and drop its pending error, if any.
    ///
    /// Other errors are left alone; nothing is re-validated until the user
    /// tries to advance.
    pub fn update_field(&mut self, field: FieldOf<F>, value: FieldValue) -> WizardResult<()> {
        self.state.draft.set(field, value)?;
        if self.state.errors.remove(field).is_some() {
            debug!(wizard_id = %self.id, field = field.name(), "Cleared field error");
        }
        Ok(())
    }

    /// [`update_field`](Self::update_field) addressed by wire name.
    pub fn update_field_by_name(&mut self, name: &str, value: FieldValue) -> WizardResult<()> {
        let field = <FieldOf<F> as FieldKey>::from_name(name)
            .ok_or_else(|| WizardError::UnknownField(name.to_string()))?;
        self.update_field(field, value)
    }

    /// Apply edits queued by a renderer. Every edit must target a field
    /// owned by the active step; otherwise nothing is applied.
    pub fn apply_changes(&mut self, sink: ChangeSink<FieldOf<F>>) -> WizardResult<()> {
        let changes = sink.into_changes();
        let owned = F::owned_fields(self.current().kind);
        if let Some((field, _)) = changes.iter().find(|(field, _)| !owned.contains(field)) {
            return Err(WizardError::FieldNotOwned {
                field: field.name(),
                step: self.current().title.clone(),
            });
        }
        for (field, value) in changes {
            self.update_field(field, value)?;
        }
        Ok(())
    }

    /// Render the active step, then apply whatever edits it queued.
    pub fn render_active<R>(&mut self, renderer: &R) -> WizardResult<R::Output>
    where
        R: StepRenderer<F::Step, F::Draft>,
    {
        let mut sink = ChangeSink::new();
        let output = {
            let view = StepView {
                step: self.current(),
                data: &self.state.draft,
                errors: &self.state.errors,
            };
            renderer.render(&view, &mut sink)
        };
        self.apply_changes(sink)?;
        Ok(output)
    }

    // -- validation & navigation --

    /// Run the rules of step `index` and replace the error map with the
    /// result. Returns true when the step is clean.
    pub fn validate_step(&mut self, index: usize) -> WizardResult<bool> {
        let step = self.steps.get(index).ok_or(WizardError::StepOutOfRange {
            index,
            len: self.steps.len(),
        })?;
        self.state.errors = F::validate(step.kind, &self.state.draft);
        Ok(self.state.errors.is_empty())
    }

    fn validate_current(&mut self) -> bool {
        let kind = self.current().kind;
        self.state.errors = F::validate(kind, &self.state.draft);
        self.state.errors.is_empty()
    }

    /// Advance one step if the active step validates.
    ///
    /// Returns whether the active step was valid. On the last step a valid
    /// call stays put; use [`submit`](Self::submit) there.
    pub fn next(&mut self) -> bool {
        let from = self.state.current_step;
        if !self.validate_current() {
            debug!(
                wizard_id = %self.id,
                flavor = F::KIND,
                step = from,
                errors = self.state.errors.len(),
                "Step blocked by validation"
            );
            return false;
        }
        if self.is_last_step() {
            warn!(wizard_id = %self.id, flavor = F::KIND, "next() called on the last step");
            return true;
        }
        self.state.current_step = from + 1;
        debug!(wizard_id = %self.id, flavor = F::KIND, from, to = from + 1, "Advanced");
        true
    }

    /// Go back one step without validating. Errors stay as they are.
    /// Returns whether the index moved.
    pub fn prev(&mut self) -> bool {
        if self.state.current_step == 0 {
            return false;
        }
        self.state.current_step -= 1;
        debug!(wizard_id = %self.id, flavor = F::KIND, to = self.state.current_step, "Went back");
        true
    }

    /// Validate the active step and then the whole record; when both are
    /// clean, hand the finished entity to `on_success`.
    ///
    /// The step index never changes. On failure the error map holds every
    /// outstanding message and the outcome names the first failing step.
    pub fn submit(&mut self) -> WizardResult<SubmitOutcome> {
        let current = self.state.current_step;
        if !self.validate_current() {
            debug!(
                wizard_id = %self.id,
                flavor = F::KIND,
                step = current,
                "Submit blocked by active step"
            );
            return Ok(SubmitOutcome::Invalid { step: current });
        }

        let mut all = ValidationErrors::new();
        let mut first_failing = None;
        for (index, step) in self.steps.iter().enumerate() {
            let errors = F::validate(step.kind, &self.state.draft);
            if !errors.is_empty() {
                first_failing.get_or_insert(index);
                all.merge(errors);
            }
        }
        if let Some(step) = first_failing {
            warn!(
                wizard_id = %self.id,
                flavor = F::KIND,
                step,
                errors = all.len(),
                "Submit blocked by an earlier step"
            );
            self.state.errors = all;
            return Ok(SubmitOutcome::Invalid { step });
        }

        let entity = F::finalize(&self.state.draft)?;
        info!(
            wizard_id = %self.id,
            flavor = F::KIND,
            mode = self.mode.as_str(),
            "Wizard submitted"
        );
        self.callbacks.on_success(entity, self.mode);
        self.baseline = fingerprint(&self.state.draft).ok();
        Ok(SubmitOutcome::Submitted)
    }

    /// Cancel the wizard. The draft is left as it is.
    pub fn close(&mut self) {
        info!(wizard_id = %self.id, flavor = F::KIND, dirty = self.is_dirty(), "Wizard closed");
        self.callbacks.on_close();
    }

    /// Frame around the active step.
    pub fn shell(&self) -> ShellView {
        let current = self.state.current_step;
        let step = self.current();
        let primary = if self.is_last_step() {
            PrimaryAction::Submit(F::submit_label(self.mode).to_string())
        } else {
            PrimaryAction::Next
        };
        ShellView {
            title: F::title(self.mode).to_string(),
            progress_label: format!("Step {} of {}", current + 1, self.steps.len()),
            markers: self
                .steps
                .iter()
                .enumerate()
                .map(|(index, s)| ProgressMarker {
                    id: s.id,
                    title: s.title.clone(),
                    status: status_of(index, current),
                })
                .collect(),
            step_title: step.title.clone(),
            step_description: step.description.clone(),
            back_enabled: current > 0,
            primary,
            primary_enabled: self.is_valid(),
            cancel_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PatientDraft, PatientField, PatientForm};
    use crate::wizard::{CapturedCallbacks, PatientStep, PatientWizard};

    type Controller = WizardController<PatientWizard, CapturedCallbacks<PatientForm>>;

    fn controller() -> Controller {
        WizardController::with_default_steps(WizardMode::Create, None, CapturedCallbacks::new())
    }

    #[test]
    fn test_new_rejects_empty_steps() {
        let result: WizardResult<Controller> =
            WizardController::new(vec![], WizardMode::Create, None, CapturedCallbacks::new());
        assert!(matches!(result, Err(WizardError::EmptySteps)));
    }

    #[test]
    fn test_initial_state() {
        let wizard = controller();
        assert_eq!(wizard.current_step(), 0);
        assert_eq!(wizard.steps().len(), 5);
        assert!(wizard.is_valid());
        assert!(!wizard.is_dirty());
        assert_eq!(wizard.draft(), &PatientDraft::default());
    }

    #[test]
    fn test_validate_step_out_of_range() {
        let mut wizard = controller();
        assert_eq!(
            wizard.validate_step(9),
            Err(WizardError::StepOutOfRange { index: 9, len: 5 })
        );
    }

    #[test]
    fn test_update_field_type_mismatch_leaves_state() {
        let mut wizard = controller();
        let err = wizard.update_field(PatientField::HasInsurance, "yes".into());
        assert!(matches!(err, Err(WizardError::FieldType { .. })));
        assert!(!wizard.is_dirty());
    }

    #[test]
    fn test_update_field_by_name() {
        let mut wizard = controller();
        wizard.update_field_by_name("parentA_firstName", "María".into()).unwrap();
        assert_eq!(wizard.draft().parent_a_first_name.as_deref(), Some("María"));
        assert_eq!(
            wizard.update_field_by_name("nickname", "x".into()),
            Err(WizardError::UnknownField("nickname".into()))
        );
    }

    #[test]
    fn test_apply_changes_rejects_foreign_field() {
        let mut wizard = controller();
        let mut sink = ChangeSink::new();
        sink.on_change(PatientField::FirstName, "Juan");
        sink.on_change(PatientField::InsuranceName, "OSDE");
        let err = wizard.apply_changes(sink).unwrap_err();
        assert_eq!(
            err,
            WizardError::FieldNotOwned {
                field: "insuranceName",
                step: "Personal Data".into()
            }
        );
        assert_eq!(wizard.draft().first_name, None);
    }

    #[test]
    fn test_custom_step_order() {
        let steps = vec![
            WizardStep::new(1, "Guardians", "", PatientStep::Guardians),
            WizardStep::new(2, "Personal Data", "", PatientStep::PersonalData),
        ];
        let mut wizard: Controller =
            WizardController::new(steps, WizardMode::Create, None, CapturedCallbacks::new())
                .unwrap();
        assert!(!wizard.next());
        assert!(wizard.errors().contains(PatientField::ParentAFirstName));
        assert!(!wizard.errors().contains(PatientField::DocumentId));
    }

    #[test]
    fn test_shell_view() {
        let mut wizard = controller();
        let shell = wizard.shell();
        assert_eq!(shell.title, "New Patient");
        assert_eq!(shell.progress_label, "Step 1 of 5");
        assert!(!shell.back_enabled);
        assert_eq!(shell.primary, PrimaryAction::Next);
        assert!(shell.primary_enabled);

        assert!(!wizard.next());
        assert!(!wizard.shell().primary_enabled);
    }

    #[test]
    fn test_close_keeps_draft() {
        let mut wizard = controller();
        wizard.update_field(PatientField::FirstName, "Juan".into()).unwrap();
        wizard.close();
        assert_eq!(wizard.callbacks().closed, 1);
        assert!(wizard.is_dirty());
        assert_eq!(wizard.draft().first_name.as_deref(), Some("Juan"));
    }
}
