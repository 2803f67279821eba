//! End-to-end wizard scenarios.

use std::cell::RefCell;
use std::rc::Rc;

use clinic_wizard_core::models::{
    AppointmentDraft, AppointmentField, AppointmentForm, FieldValue, LegalGuardian, PatientDraft,
    PatientField, PatientForm, PaymentType, WizardMode,
};
use clinic_wizard_core::wizard::{
    AppointmentWizard, CapturedCallbacks, ChangeSink, FnCallbacks, FormRenderer, PatientWizard,
    StepRenderer, StepView, SubmitOutcome, WizardController, WizardError,
};
use clinic_wizard_core::{AppointmentStep, PatientStep};

type PatientController = WizardController<PatientWizard, CapturedCallbacks<PatientForm>>;
type AppointmentController =
    WizardController<AppointmentWizard, CapturedCallbacks<AppointmentForm>>;

fn valid_patient() -> PatientDraft {
    PatientDraft {
        document_id: Some("40123456".into()),
        first_name: Some("Juan".into()),
        last_name: Some("Pérez".into()),
        birth_date: Some("2015-03-21".into()),
        address: Some("Av. Siempre Viva 742".into()),
        parent_a_first_name: Some("María".into()),
        parent_a_last_name: Some("Gómez".into()),
        ..PatientDraft::default()
    }
}

fn scheduled_appointment() -> AppointmentDraft {
    AppointmentDraft {
        patient_id: Some("p-1".into()),
        date: Some("2025-06-02".into()),
        start_time: Some("09:00".into()),
        end_time: Some("10:00".into()),
        ..AppointmentDraft::default()
    }
}

fn patient_wizard(initial: Option<PatientDraft>) -> PatientController {
    WizardController::with_default_steps(WizardMode::Create, initial, CapturedCallbacks::new())
}

fn appointment_wizard(initial: Option<AppointmentDraft>) -> AppointmentController {
    WizardController::with_default_steps(WizardMode::Create, initial, CapturedCallbacks::new())
}

#[test]
fn test_personal_data_blocks_with_missing_fields() {
    let mut wizard = patient_wizard(None);
    wizard.update_field(PatientField::DocumentId, "".into()).unwrap();
    wizard.update_field(PatientField::FirstName, "Juan".into()).unwrap();

    assert!(!wizard.validate_step(0).unwrap());
    let failing: Vec<_> = wizard.errors().fields().collect();
    assert_eq!(
        failing,
        vec![
            PatientField::DocumentId,
            PatientField::LastName,
            PatientField::BirthDate,
            PatientField::Address,
        ]
    );
    assert!(!wizard.next());
    assert_eq!(wizard.current_step(), 0);
}

#[test]
fn test_recurring_appointment_needs_pattern_days_and_end() {
    let mut wizard = appointment_wizard(Some(scheduled_appointment()));
    assert!(wizard.next());
    assert!(wizard.next());
    assert_eq!(wizard.current().kind, AppointmentStep::Recurrence);

    wizard.update_field(AppointmentField::Type, "recurring".into()).unwrap();
    assert!(!wizard.next());
    assert_eq!(wizard.current_step(), 2);
    assert!(wizard.errors().contains(AppointmentField::RecurrencePattern));
    assert!(wizard.errors().contains(AppointmentField::DaysOfWeek));

    wizard
        .update_field(AppointmentField::RecurrencePattern, "weekly".into())
        .unwrap();
    wizard
        .update_field(AppointmentField::DaysOfWeek, vec![1u8, 3].into())
        .unwrap();
    wizard
        .update_field(AppointmentField::RecurrenceOccurrences, 10u32.into())
        .unwrap();
    assert!(wizard.next());
    assert_eq!(wizard.current_step(), 3);
}

#[test]
fn test_billing_required_only_when_invoicing() {
    let mut wizard = patient_wizard(Some(valid_patient()));
    assert!(wizard.validate_step(4).unwrap());

    wizard.update_field(PatientField::RequiresInvoice, true.into()).unwrap();
    wizard.update_field(PatientField::BillingTaxId, "20-12345678-9".into()).unwrap();
    wizard
        .update_field(PatientField::BillingFiscalCondition, "CONSUMIDOR_FINAL".into())
        .unwrap();
    wizard
        .update_field(PatientField::BillingFiscalAddress, "Calle 1 123".into())
        .unwrap();

    assert!(!wizard.validate_step(4).unwrap());
    let failing: Vec<_> = wizard.errors().fields().collect();
    assert_eq!(failing, vec![PatientField::BillingBusinessName]);
}

#[test]
fn test_submit_on_last_step_calls_on_success_once() {
    let mut wizard = patient_wizard(Some(valid_patient()));
    for _ in 0..4 {
        assert!(wizard.next());
    }
    assert!(wizard.is_last_step());

    assert_eq!(wizard.submit().unwrap(), SubmitOutcome::Submitted);
    assert_eq!(wizard.current_step(), 4);

    let submissions = &wizard.callbacks().submissions;
    assert_eq!(submissions.len(), 1);
    let (form, mode) = &submissions[0];
    assert_eq!(*mode, WizardMode::Create);
    assert_eq!(form.full_name(), "Juan Pérez");
    assert!(!wizard.is_dirty());
}

#[test]
fn test_submit_with_closure_callbacks() {
    let received = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&received);
    let callbacks = FnCallbacks::new(
        move |form: PatientForm, mode: WizardMode| sink.borrow_mut().push((form.document_id, mode)),
        || {},
    );
    let mut wizard: WizardController<PatientWizard, _> =
        WizardController::with_default_steps(WizardMode::Edit, Some(valid_patient()), callbacks);
    for _ in 0..4 {
        wizard.next();
    }
    wizard.submit().unwrap();

    assert_eq!(
        *received.borrow(),
        vec![("40123456".to_string(), WizardMode::Edit)]
    );
}

#[test]
fn test_submit_revalidates_earlier_steps() {
    let mut wizard = patient_wizard(Some(valid_patient()));
    for _ in 0..4 {
        assert!(wizard.next());
    }
    wizard.update_field(PatientField::Address, "".into()).unwrap();

    assert_eq!(wizard.submit().unwrap(), SubmitOutcome::Invalid { step: 0 });
    assert_eq!(wizard.current_step(), 4);
    assert!(wizard.errors().contains(PatientField::Address));
    assert!(!wizard.is_valid());
    assert!(wizard.callbacks().submissions.is_empty());
}

#[test]
fn test_submit_from_first_step_checks_later_steps() {
    let mut draft = valid_patient();
    draft.parent_a_last_name = None;
    let mut wizard = patient_wizard(Some(draft));
    // personal data is clean, so the first step can submit directly
    let outcome = wizard.submit().unwrap();
    assert_eq!(outcome, SubmitOutcome::Invalid { step: 2 });
    assert_eq!(wizard.current_step(), 0);
    assert!(wizard.errors().contains(PatientField::ParentALastName));
    assert!(wizard.callbacks().submissions.is_empty());
}

#[test]
fn test_insurance_requirement_follows_the_flag() {
    let mut wizard = patient_wizard(Some(valid_patient()));
    assert!(wizard.next());

    wizard.update_field(PatientField::HasInsurance, true.into()).unwrap();
    assert!(!wizard.validate_step(1).unwrap());
    assert!(wizard.errors().contains(PatientField::InsuranceName));

    wizard.update_field(PatientField::HasInsurance, false.into()).unwrap();
    assert!(wizard.validate_step(1).unwrap());
    assert!(wizard.is_valid());
}

#[test]
fn test_payment_insurance_requirement_follows_the_flag() {
    let mut draft = scheduled_appointment();
    draft.price = Some("4500".into());
    draft.insurance_name = Some("IOMA".into());
    let mut wizard = appointment_wizard(Some(draft));

    wizard.update_field(AppointmentField::PaymentType, "insurance".into()).unwrap();
    assert!(wizard.validate_step(3).unwrap());

    wizard.update_field(AppointmentField::InsuranceName, FieldValue::Unset).unwrap();
    assert!(!wizard.validate_step(3).unwrap());

    wizard.update_field(AppointmentField::PaymentType, "private".into()).unwrap();
    assert_eq!(wizard.draft().payment_type, PaymentType::Private);
    assert!(wizard.validate_step(3).unwrap());
}

#[test]
fn test_full_appointment_submission() {
    let mut draft = scheduled_appointment();
    draft.price = Some("4500.50".into());
    let mut wizard = appointment_wizard(Some(draft));
    for _ in 0..3 {
        assert!(wizard.next());
    }
    assert_eq!(wizard.submit().unwrap(), SubmitOutcome::Submitted);
    let form = wizard.callbacks().last().unwrap();
    assert_eq!(form.duration_minutes, 60);
    assert_eq!(form.price, 4500.5);
    assert!(form.recurrence.is_none());
}

#[test]
fn test_next_on_last_step_stays() {
    let mut draft = scheduled_appointment();
    draft.price = Some("0".into());
    let mut wizard = appointment_wizard(Some(draft));
    for _ in 0..3 {
        wizard.next();
    }
    assert!(wizard.next());
    assert_eq!(wizard.current_step(), 3);
    assert!(wizard.callbacks().submissions.is_empty());
}

/// Types a value into the first field of whatever step it is shown.
struct TypingRenderer {
    field: PatientField,
    value: &'static str,
}

impl StepRenderer<PatientStep, PatientDraft> for TypingRenderer {
    type Output = String;

    fn render(
        &self,
        view: &StepView<'_, PatientStep, PatientDraft>,
        sink: &mut ChangeSink<PatientField>,
    ) -> String {
        sink.on_change(self.field, self.value);
        view.step.title.clone()
    }
}

#[test]
fn test_renderer_edits_are_applied_after_render() {
    let mut wizard = patient_wizard(None);
    assert!(!wizard.next());
    assert!(wizard.errors().contains(PatientField::LastName));

    let renderer = TypingRenderer {
        field: PatientField::LastName,
        value: "Pérez",
    };
    let title = wizard.render_active(&renderer).unwrap();
    assert_eq!(title, "Personal Data");
    assert_eq!(wizard.draft().last_name.as_deref(), Some("Pérez"));
    assert!(!wizard.errors().contains(PatientField::LastName));
}

#[test]
fn test_renderer_cannot_write_another_steps_field() {
    let mut wizard = patient_wizard(None);
    let renderer = TypingRenderer {
        field: PatientField::SchoolName,
        value: "Escuela N° 1",
    };
    let err = wizard.render_active(&renderer).unwrap_err();
    assert!(matches!(err, WizardError::FieldNotOwned { field: "schoolName", .. }));
    assert_eq!(wizard.draft().school_name, None);
}

#[test]
fn test_form_renderer_marks_errors_and_conditionals() {
    let mut wizard = patient_wizard(Some(valid_patient()));
    assert!(wizard.next());
    assert!(wizard.next());
    wizard
        .update_field(PatientField::LegalGuardian, LegalGuardian::Both.as_ref().into())
        .unwrap();
    assert!(!wizard.next());

    let rendered = wizard.render_active(&FormRenderer::<PatientWizard>::new()).unwrap();
    assert_eq!(rendered.title, "Guardians");
    assert!(rendered.field("parentB_firstName").is_none());
    assert!(rendered.field("legalGuardian").unwrap().error.is_some());

    wizard.update_field(PatientField::HasParentB, true.into()).unwrap();
    let rendered = wizard.render_active(&FormRenderer::<PatientWizard>::new()).unwrap();
    let parent_b = rendered.field("parentB_firstName").unwrap();
    assert!(!parent_b.required);
    assert_eq!(parent_b.error, None);
    assert_eq!(
        rendered.field("legalGuardian").unwrap().value,
        FieldValue::Text("both".into())
    );
}

#[test]
fn test_blank_second_guardian_does_not_block_guardians_step() {
    let mut wizard = patient_wizard(Some(PatientDraft {
        has_parent_b: true,
        ..valid_patient()
    }));
    assert!(wizard.next());
    assert!(wizard.next());
    assert!(wizard.next());
    assert_eq!(wizard.current_step(), 3);
    assert!(wizard.errors().is_empty());

    assert_eq!(wizard.submit().unwrap(), SubmitOutcome::Submitted);
    let form = wizard.callbacks().last().unwrap();
    assert!(form.guardian_b.is_none());
}

#[test]
fn test_shell_tracks_progress() {
    let mut wizard = patient_wizard(Some(valid_patient()));
    wizard.next();
    wizard.next();
    let shell = wizard.shell();
    assert_eq!(shell.progress_label, "Step 3 of 5");
    assert!(shell.back_enabled);
    assert_eq!(shell.current_marker().map(|m| m.title.as_str()), Some("Guardians"));

    wizard.next();
    wizard.next();
    let shell = wizard.shell();
    assert_eq!(
        shell.primary,
        clinic_wizard_core::wizard::PrimaryAction::Submit("Create Patient".into())
    );
}
