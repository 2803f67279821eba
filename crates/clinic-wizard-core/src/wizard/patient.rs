//! Patient registration wizard: steps, rules and layouts.

use serde::{Deserialize, Serialize};

use super::{
    ChoiceOption, FieldSpec, InputKind, StepLayout, ValidationErrors, WizardFlavor, WizardResult,
};
use crate::models::{
    parse_date, FiscalCondition, LegalGuardian, PatientDraft, PatientField, PatientForm,
    WizardMode, WizardStep,
};

/// Steps of the patient wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatientStep {
    PersonalData,
    HealthInsurance,
    Guardians,
    School,
    Billing,
}

/// The patient create/edit flow.
pub struct PatientWizard;

const PERSONAL_FIELDS: &[PatientField] = &[
    PatientField::DocumentId,
    PatientField::Cut,
    PatientField::FirstName,
    PatientField::LastName,
    PatientField::BirthDate,
    PatientField::Address,
    PatientField::Phone,
    PatientField::Email,
];

const INSURANCE_FIELDS: &[PatientField] = &[
    PatientField::HasInsurance,
    PatientField::InsuranceName,
    PatientField::MemberNumber,
];

const GUARDIAN_FIELDS: &[PatientField] = &[
    PatientField::ParentAFirstName,
    PatientField::ParentALastName,
    PatientField::ParentADocumentId,
    PatientField::ParentAPhone,
    PatientField::ParentAEmail,
    PatientField::ParentAOccupation,
    PatientField::HasParentB,
    PatientField::ParentBFirstName,
    PatientField::ParentBLastName,
    PatientField::ParentBDocumentId,
    PatientField::ParentBPhone,
    PatientField::ParentBEmail,
    PatientField::ParentBOccupation,
    PatientField::LegalGuardian,
];

const SCHOOL_FIELDS: &[PatientField] = &[
    PatientField::HasSchool,
    PatientField::SchoolName,
    PatientField::SchoolLocation,
    PatientField::Grade,
    PatientField::Observations,
];

const BILLING_FIELDS: &[PatientField] = &[
    PatientField::RequiresInvoice,
    PatientField::BillingBusinessName,
    PatientField::BillingTaxId,
    PatientField::BillingFiscalAddress,
    PatientField::BillingFiscalCondition,
    PatientField::BillingEmail,
];

impl WizardFlavor for PatientWizard {
    type Step = PatientStep;
    type Draft = PatientDraft;
    type Entity = PatientForm;

    const KIND: &'static str = "patient";

    fn default_steps() -> Vec<WizardStep<PatientStep>> {
        vec![
            WizardStep::new(
                1,
                "Personal Data",
                "Basic patient information",
                PatientStep::PersonalData,
            ),
            WizardStep::new(
                2,
                "Health Insurance",
                "Medical coverage information",
                PatientStep::HealthInsurance,
            ),
            WizardStep::new(
                3,
                "Guardians",
                "Details of the responsible adults",
                PatientStep::Guardians,
            ),
            WizardStep::new(
                4,
                "School Data",
                "Educational information (optional)",
                PatientStep::School,
            ),
            WizardStep::new(
                5,
                "Billing",
                "Tax details (optional)",
                PatientStep::Billing,
            ),
        ]
    }

    fn validate(step: PatientStep, d: &PatientDraft) -> ValidationErrors<PatientField> {
        use PatientField as P;

        let mut errors = ValidationErrors::new();
        match step {
            PatientStep::PersonalData => {
                errors.require_text(P::DocumentId, &d.document_id, "Document ID is required");
                errors.require_text(P::FirstName, &d.first_name, "First name is required");
                errors.require_text(P::LastName, &d.last_name, "Last name is required");
                errors.require_text(P::BirthDate, &d.birth_date, "Birth date is required");
                if let Some(raw) = d.birth_date.as_deref().filter(|s| !s.trim().is_empty()) {
                    if parse_date(raw).is_none() {
                        errors.insert(P::BirthDate, "Birth date must be a valid date");
                    }
                }
                errors.require_text(P::Address, &d.address, "Address is required");
            }
            PatientStep::HealthInsurance => {
                if d.has_insurance {
                    errors.require_text(
                        P::InsuranceName,
                        &d.insurance_name,
                        "Insurance name is required",
                    );
                }
            }
            PatientStep::Guardians => {
                errors.require_text(P::ParentAFirstName, &d.parent_a_first_name, "Required");
                errors.require_text(P::ParentALastName, &d.parent_a_last_name, "Required");
                if !d.has_parent_b && d.legal_guardian.includes_b() {
                    errors.insert(
                        P::LegalGuardian,
                        "Add the second guardian before assigning them legal guardianship",
                    );
                }
            }
            PatientStep::School => {}
            PatientStep::Billing => {
                if d.requires_invoice {
                    errors.require_text(
                        P::BillingBusinessName,
                        &d.billing_business_name,
                        "Business name is required",
                    );
                    errors.require_text(P::BillingTaxId, &d.billing_tax_id, "Tax ID is required");
                    errors.require(
                        P::BillingFiscalCondition,
                        &d.billing_fiscal_condition,
                        "Fiscal condition is required",
                    );
                    errors.require_text(
                        P::BillingFiscalAddress,
                        &d.billing_fiscal_address,
                        "Fiscal address is required",
                    );
                }
            }
        }
        errors
    }

    fn owned_fields(step: PatientStep) -> &'static [PatientField] {
        match step {
            PatientStep::PersonalData => PERSONAL_FIELDS,
            PatientStep::HealthInsurance => INSURANCE_FIELDS,
            PatientStep::Guardians => GUARDIAN_FIELDS,
            PatientStep::School => SCHOOL_FIELDS,
            PatientStep::Billing => BILLING_FIELDS,
        }
    }

    fn layout(step: PatientStep, d: &PatientDraft) -> StepLayout<PatientField> {
        use PatientField as P;

        let mut layout = StepLayout::new();
        match step {
            PatientStep::PersonalData => {
                layout.push(
                    FieldSpec::text(P::DocumentId, "Document ID")
                        .required()
                        .placeholder("12345678"),
                );
                layout.push(FieldSpec::text(P::Cut, "Disability certificate (CUT)"));
                layout.push(FieldSpec::text(P::FirstName, "First name").required());
                layout.push(FieldSpec::text(P::LastName, "Last name").required());
                layout.push(FieldSpec::new(P::BirthDate, "Birth date", InputKind::Date).required());
                layout.push(FieldSpec::text(P::Address, "Address").required());
                layout.push(FieldSpec::new(P::Phone, "Phone", InputKind::Phone));
                layout.push(FieldSpec::new(P::Email, "Email", InputKind::Email));
            }
            PatientStep::HealthInsurance => {
                layout.push(FieldSpec::new(
                    P::HasInsurance,
                    "The patient has health insurance",
                    InputKind::Checkbox,
                ));
                if d.has_insurance {
                    layout.push(
                        FieldSpec::text(P::InsuranceName, "Insurance name")
                            .required()
                            .placeholder("e.g. OSDE, Swiss Medical"),
                    );
                    layout.push(
                        FieldSpec::text(P::MemberNumber, "Member number").placeholder("123456789"),
                    );
                } else {
                    layout.note("The patient has no registered health insurance.");
                }
            }
            PatientStep::Guardians => {
                layout.push(FieldSpec::text(P::ParentAFirstName, "First name").required());
                layout.push(FieldSpec::text(P::ParentALastName, "Last name").required());
                layout.push(FieldSpec::text(P::ParentADocumentId, "Document ID"));
                layout.push(FieldSpec::new(P::ParentAPhone, "Phone", InputKind::Phone));
                layout.push(FieldSpec::new(P::ParentAEmail, "Email", InputKind::Email));
                layout.push(FieldSpec::text(P::ParentAOccupation, "Occupation"));
                layout.push(FieldSpec::new(
                    P::HasParentB,
                    "Add a second guardian",
                    InputKind::Checkbox,
                ));
                if d.has_parent_b {
                    layout.push(FieldSpec::text(P::ParentBFirstName, "First name"));
                    layout.push(FieldSpec::text(P::ParentBLastName, "Last name"));
                    layout.push(FieldSpec::text(P::ParentBDocumentId, "Document ID"));
                    layout.push(FieldSpec::new(P::ParentBPhone, "Phone", InputKind::Phone));
                    layout.push(FieldSpec::new(P::ParentBEmail, "Email", InputKind::Email));
                    layout.push(FieldSpec::text(P::ParentBOccupation, "Occupation"));
                }
                layout.push(
                    FieldSpec::new(
                        P::LegalGuardian,
                        "Legal guardian",
                        InputKind::Select {
                            options: guardian_options(d.has_parent_b),
                        },
                    )
                    .required(),
                );
            }
            PatientStep::School => {
                layout.push(FieldSpec::new(
                    P::HasSchool,
                    "The patient attends school",
                    InputKind::Checkbox,
                ));
                if d.has_school {
                    layout.push(
                        FieldSpec::text(P::SchoolName, "School name")
                            .placeholder("e.g. Primary School No. 1"),
                    );
                    layout.push(
                        FieldSpec::text(P::SchoolLocation, "Location")
                            .placeholder("School address"),
                    );
                    layout.push(FieldSpec::text(P::Grade, "Grade").placeholder("e.g. 3rd grade"));
                    layout.push(FieldSpec::new(
                        P::Observations,
                        "Observations",
                        InputKind::TextArea,
                    ));
                } else {
                    layout.note("The patient does not attend a registered school.");
                }
            }
            PatientStep::Billing => {
                layout.push(FieldSpec::new(
                    P::RequiresInvoice,
                    "Requires invoicing",
                    InputKind::Checkbox,
                ));
                if d.requires_invoice {
                    layout.push(
                        FieldSpec::text(P::BillingBusinessName, "Business name")
                            .required()
                            .placeholder("Name of the person responsible for billing"),
                    );
                    layout.push(
                        FieldSpec::text(P::BillingTaxId, "Tax ID")
                            .required()
                            .placeholder("20-12345678-9"),
                    );
                    layout.push(
                        FieldSpec::new(
                            P::BillingFiscalCondition,
                            "Fiscal condition",
                            InputKind::Select {
                                options: FiscalCondition::ALL
                                    .into_iter()
                                    .map(|c| ChoiceOption::new(c.as_ref(), c.label()))
                                    .collect(),
                            },
                        )
                        .required(),
                    );
                    layout.push(
                        FieldSpec::text(P::BillingFiscalAddress, "Fiscal address").required(),
                    );
                    layout.push(
                        FieldSpec::new(P::BillingEmail, "Billing email", InputKind::Email)
                            .placeholder("billing@example.com"),
                    );
                    layout.note("Billing details must match the taxpayer registry.");
                } else {
                    layout.note("The patient does not require invoices.");
                }
            }
        }
        layout
    }

    fn finalize(draft: &PatientDraft) -> WizardResult<PatientForm> {
        PatientForm::try_from(draft)
    }

    fn title(mode: WizardMode) -> &'static str {
        match mode {
            WizardMode::Create => "New Patient",
            WizardMode::Edit => "Edit Patient",
        }
    }

    fn submit_label(mode: WizardMode) -> &'static str {
        match mode {
            WizardMode::Create => "Create Patient",
            WizardMode::Edit => "Save Changes",
        }
    }
}

fn guardian_options(has_parent_b: bool) -> Vec<ChoiceOption> {
    let mut options = vec![ChoiceOption::new(LegalGuardian::A.as_ref(), "Guardian A")];
    if has_parent_b {
        options.push(ChoiceOption::new(LegalGuardian::B.as_ref(), "Guardian B"));
        options.push(ChoiceOption::new(LegalGuardian::Both.as_ref(), "Both"));
    }
    options
}
