//! Patient draft and the completed patient form.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::field::{
    choice_value, optional_text, parse_date, required_text, Draft, FieldKey, FieldValue,
};
use crate::wizard::{WizardError, WizardResult};

/// Which guardian(s) hold legal responsibility.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum LegalGuardian {
    #[default]
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "both")]
    Both,
}

impl LegalGuardian {
    pub fn includes_a(self) -> bool {
        matches!(self, LegalGuardian::A | LegalGuardian::Both)
    }

    pub fn includes_b(self) -> bool {
        matches!(self, LegalGuardian::B | LegalGuardian::Both)
    }
}

impl AsRef<str> for LegalGuardian {
    fn as_ref(&self) -> &str {
        match self {
            LegalGuardian::A => "A",
            LegalGuardian::B => "B",
            LegalGuardian::Both => "both",
        }
    }
}

impl FromStr for LegalGuardian {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(LegalGuardian::A),
            "B" => Ok(LegalGuardian::B),
            "both" => Ok(LegalGuardian::Both),
            _ => Err(()),
        }
    }
}

/// Tax status used on invoices.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FiscalCondition {
    ResponsableInscripto,
    Monotributista,
    ConsumidorFinal,
    Exento,
}

impl FiscalCondition {
    pub const ALL: [FiscalCondition; 4] = [
        FiscalCondition::ResponsableInscripto,
        FiscalCondition::Monotributista,
        FiscalCondition::ConsumidorFinal,
        FiscalCondition::Exento,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FiscalCondition::ResponsableInscripto => "Registered taxpayer",
            FiscalCondition::Monotributista => "Simplified regime",
            FiscalCondition::ConsumidorFinal => "Final consumer",
            FiscalCondition::Exento => "Exempt",
        }
    }
}

impl AsRef<str> for FiscalCondition {
    fn as_ref(&self) -> &str {
        match self {
            FiscalCondition::ResponsableInscripto => "RESPONSABLE_INSCRIPTO",
            FiscalCondition::Monotributista => "MONOTRIBUTISTA",
            FiscalCondition::ConsumidorFinal => "CONSUMIDOR_FINAL",
            FiscalCondition::Exento => "EXENTO",
        }
    }
}

impl FromStr for FiscalCondition {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|c| c.as_ref() == s).ok_or(())
    }
}

/// Fields of [`PatientDraft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PatientField {
    // Personal data
    DocumentId,
    Cut,
    FirstName,
    LastName,
    BirthDate,
    Address,
    Phone,
    Email,
    // Health insurance
    HasInsurance,
    InsuranceName,
    MemberNumber,
    // Guardians
    ParentAFirstName,
    ParentALastName,
    ParentADocumentId,
    ParentAPhone,
    ParentAEmail,
    ParentAOccupation,
    HasParentB,
    ParentBFirstName,
    ParentBLastName,
    ParentBDocumentId,
    ParentBPhone,
    ParentBEmail,
    ParentBOccupation,
    LegalGuardian,
    // School
    HasSchool,
    SchoolName,
    SchoolLocation,
    Grade,
    Observations,
    // Billing
    RequiresInvoice,
    BillingBusinessName,
    BillingTaxId,
    BillingFiscalAddress,
    BillingFiscalCondition,
    BillingEmail,
}

impl FieldKey for PatientField {
    const ALL: &'static [Self] = &[
        PatientField::DocumentId,
        PatientField::Cut,
        PatientField::FirstName,
        PatientField::LastName,
        PatientField::BirthDate,
        PatientField::Address,
        PatientField::Phone,
        PatientField::Email,
        PatientField::HasInsurance,
        PatientField::InsuranceName,
        PatientField::MemberNumber,
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
        PatientField::HasSchool,
        PatientField::SchoolName,
        PatientField::SchoolLocation,
        PatientField::Grade,
        PatientField::Observations,
        PatientField::RequiresInvoice,
        PatientField::BillingBusinessName,
        PatientField::BillingTaxId,
        PatientField::BillingFiscalAddress,
        PatientField::BillingFiscalCondition,
        PatientField::BillingEmail,
    ];

    fn name(self) -> &'static str {
        match self {
            PatientField::DocumentId => "documentId",
            PatientField::Cut => "cut",
            PatientField::FirstName => "firstName",
            PatientField::LastName => "lastName",
            PatientField::BirthDate => "birthDate",
            PatientField::Address => "address",
            PatientField::Phone => "phone",
            PatientField::Email => "email",
            PatientField::HasInsurance => "hasInsurance",
            PatientField::InsuranceName => "insuranceName",
            PatientField::MemberNumber => "memberNumber",
            PatientField::ParentAFirstName => "parentA_firstName",
            PatientField::ParentALastName => "parentA_lastName",
            PatientField::ParentADocumentId => "parentA_documentId",
            PatientField::ParentAPhone => "parentA_phone",
            PatientField::ParentAEmail => "parentA_email",
            PatientField::ParentAOccupation => "parentA_occupation",
            PatientField::HasParentB => "hasParentB",
            PatientField::ParentBFirstName => "parentB_firstName",
            PatientField::ParentBLastName => "parentB_lastName",
            PatientField::ParentBDocumentId => "parentB_documentId",
            PatientField::ParentBPhone => "parentB_phone",
            PatientField::ParentBEmail => "parentB_email",
            PatientField::ParentBOccupation => "parentB_occupation",
            PatientField::LegalGuardian => "legalGuardian",
            PatientField::HasSchool => "hasSchool",
            PatientField::SchoolName => "schoolName",
            PatientField::SchoolLocation => "schoolLocation",
            PatientField::Grade => "grade",
            PatientField::Observations => "observations",
            PatientField::RequiresInvoice => "requiresInvoice",
            PatientField::BillingBusinessName => "billingBusinessName",
            PatientField::BillingTaxId => "billingTaxId",
            PatientField::BillingFiscalAddress => "billingFiscalAddress",
            PatientField::BillingFiscalCondition => "billingFiscalCondition",
            PatientField::BillingEmail => "billingEmail",
        }
    }
}

/// In-progress patient record accumulated across the patient wizard.
///
/// Text fields hold exactly what the user typed; trimming happens when the
/// draft is converted into a [`PatientForm`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientDraft {
    pub document_id: Option<String>,
    /// Unique disability certificate number
    pub cut: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `YYYY-MM-DD`
    pub birth_date: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,

    pub has_insurance: bool,
    pub insurance_name: Option<String>,
    pub member_number: Option<String>,

    #[serde(rename = "parentA_firstName")]
    pub parent_a_first_name: Option<String>,
    #[serde(rename = "parentA_lastName")]
    pub parent_a_last_name: Option<String>,
    #[serde(rename = "parentA_documentId")]
    pub parent_a_document_id: Option<String>,
    #[serde(rename = "parentA_phone")]
    pub parent_a_phone: Option<String>,
    #[serde(rename = "parentA_email")]
    pub parent_a_email: Option<String>,
    #[serde(rename = "parentA_occupation")]
    pub parent_a_occupation: Option<String>,

    pub has_parent_b: bool,
    #[serde(rename = "parentB_firstName")]
    pub parent_b_first_name: Option<String>,
    #[serde(rename = "parentB_lastName")]
    pub parent_b_last_name: Option<String>,
    #[serde(rename = "parentB_documentId")]
    pub parent_b_document_id: Option<String>,
    #[serde(rename = "parentB_phone")]
    pub parent_b_phone: Option<String>,
    #[serde(rename = "parentB_email")]
    pub parent_b_email: Option<String>,
    #[serde(rename = "parentB_occupation")]
    pub parent_b_occupation: Option<String>,

    pub legal_guardian: LegalGuardian,

    pub has_school: bool,
    pub school_name: Option<String>,
    pub school_location: Option<String>,
    pub grade: Option<String>,
    pub observations: Option<String>,

    pub requires_invoice: bool,
    pub billing_business_name: Option<String>,
    pub billing_tax_id: Option<String>,
    pub billing_fiscal_address: Option<String>,
    pub billing_fiscal_condition: Option<FiscalCondition>,
    pub billing_email: Option<String>,
}

/// Generates the shared and mutable accessors over the free-text fields.
macro_rules! text_slots {
    ($($variant:ident => $slot:ident,)*) => {
        /// Free-text slot of a field, `None` for flags and choices.
        fn text_ref(&self, field: PatientField) -> Option<&Option<String>> {
            match field {
                $(PatientField::$variant => Some(&self.$slot),)*
                _ => None,
            }
        }

        fn text_slot(&mut self, field: PatientField) -> Option<&mut Option<String>> {
            match field {
                $(PatientField::$variant => Some(&mut self.$slot),)*
                _ => None,
            }
        }
    };
}

impl PatientDraft {
    text_slots! {
        DocumentId => document_id,
        Cut => cut,
        FirstName => first_name,
        LastName => last_name,
        BirthDate => birth_date,
        Address => address,
        Phone => phone,
        Email => email,
        InsuranceName => insurance_name,
        MemberNumber => member_number,
        ParentAFirstName => parent_a_first_name,
        ParentALastName => parent_a_last_name,
        ParentADocumentId => parent_a_document_id,
        ParentAPhone => parent_a_phone,
        ParentAEmail => parent_a_email,
        ParentAOccupation => parent_a_occupation,
        ParentBFirstName => parent_b_first_name,
        ParentBLastName => parent_b_last_name,
        ParentBDocumentId => parent_b_document_id,
        ParentBPhone => parent_b_phone,
        ParentBEmail => parent_b_email,
        ParentBOccupation => parent_b_occupation,
        SchoolName => school_name,
        SchoolLocation => school_location,
        Grade => grade,
        Observations => observations,
        BillingBusinessName => billing_business_name,
        BillingTaxId => billing_tax_id,
        BillingFiscalAddress => billing_fiscal_address,
        BillingEmail => billing_email,
    }

    fn flag(&self, field: PatientField) -> Option<bool> {
        match field {
            PatientField::HasInsurance => Some(self.has_insurance),
            PatientField::HasParentB => Some(self.has_parent_b),
            PatientField::HasSchool => Some(self.has_school),
            PatientField::RequiresInvoice => Some(self.requires_invoice),
            _ => None,
        }
    }

    fn flag_slot(&mut self, field: PatientField) -> Option<&mut bool> {
        match field {
            PatientField::HasInsurance => Some(&mut self.has_insurance),
            PatientField::HasParentB => Some(&mut self.has_parent_b),
            PatientField::HasSchool => Some(&mut self.has_school),
            PatientField::RequiresInvoice => Some(&mut self.requires_invoice),
            _ => None,
        }
    }
}

impl Draft for PatientDraft {
    type Field = PatientField;

    fn get(&self, field: PatientField) -> FieldValue {
        match field {
            PatientField::LegalGuardian => FieldValue::Text(self.legal_guardian.as_ref().into()),
            PatientField::BillingFiscalCondition => choice_value(&self.billing_fiscal_condition),
            _ => match self.flag(field) {
                Some(flag) => FieldValue::Flag(flag),
                None => self.text_ref(field).cloned().flatten().into(),
            },
        }
    }

    fn set(&mut self, field: PatientField, value: FieldValue) -> WizardResult<()> {
        let name = field.name();
        match field {
            PatientField::LegalGuardian => {
                self.legal_guardian = value.into_choice(name)?.unwrap_or_default();
            }
            PatientField::BillingFiscalCondition => {
                self.billing_fiscal_condition = value.into_choice(name)?;
            }
            _ => {
                if let Some(flag) = self.flag_slot(field) {
                    *flag = value.into_flag(name)?;
                } else if let Some(slot) = self.text_slot(field) {
                    *slot = value.into_text(name)?;
                }
            }
        }
        Ok(())
    }
}

/// Health insurance coverage on a completed form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthInsurance {
    pub name: String,
    pub member_number: Option<String>,
}

/// A responsible party attached to a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Guardian {
    pub first_name: String,
    pub last_name: String,
    pub document_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub occupation: Option<String>,
}

/// School attended by the patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchoolData {
    pub school_name: Option<String>,
    pub location: Option<String>,
    pub grade: Option<String>,
    pub observations: Option<String>,
}

/// Invoice recipient details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BillingData {
    pub business_name: String,
    pub tax_id: String,
    pub fiscal_condition: FiscalCondition,
    pub fiscal_address: String,
    pub email: Option<String>,
}

/// A validated patient record, handed to the wizard's success callback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientForm {
    pub document_id: String,
    pub cut: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Present iff the patient has coverage
    pub health_insurance: Option<HealthInsurance>,
    pub guardian_a: Guardian,
    pub guardian_b: Option<Guardian>,
    pub legal_guardian: LegalGuardian,
    /// Present iff the patient attends school
    pub school: Option<SchoolData>,
    /// Present iff invoices are required
    pub billing: Option<BillingData>,
}

impl PatientForm {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl TryFrom<&PatientDraft> for PatientForm {
    type Error = WizardError;

    fn try_from(d: &PatientDraft) -> Result<Self, Self::Error> {
        let birth_date = required_text(&d.birth_date, "birthDate")?;
        let birth_date = parse_date(&birth_date).ok_or(WizardError::InvalidValue {
            field: "birthDate",
            value: birth_date,
        })?;

        let health_insurance = if d.has_insurance {
            Some(HealthInsurance {
                name: required_text(&d.insurance_name, "insuranceName")?,
                member_number: optional_text(&d.member_number),
            })
        } else {
            None
        };

        // a second guardian without a first name is dropped
        let guardian_b = optional_text(&d.parent_b_first_name)
            .filter(|_| d.has_parent_b)
            .map(|first_name| Guardian {
                first_name,
                last_name: optional_text(&d.parent_b_last_name).unwrap_or_default(),
                document_id: optional_text(&d.parent_b_document_id),
                phone: optional_text(&d.parent_b_phone),
                email: optional_text(&d.parent_b_email),
                occupation: optional_text(&d.parent_b_occupation),
            });

        let school = d.has_school.then(|| SchoolData {
            school_name: optional_text(&d.school_name),
            location: optional_text(&d.school_location),
            grade: optional_text(&d.grade),
            observations: optional_text(&d.observations),
        });

        let billing = if d.requires_invoice {
            Some(BillingData {
                business_name: required_text(&d.billing_business_name, "billingBusinessName")?,
                tax_id: required_text(&d.billing_tax_id, "billingTaxId")?,
                fiscal_condition: d
                    .billing_fiscal_condition
                    .ok_or(WizardError::MissingField("billingFiscalCondition"))?,
                fiscal_address: required_text(&d.billing_fiscal_address, "billingFiscalAddress")?,
                email: optional_text(&d.billing_email),
            })
        } else {
            None
        };

        Ok(Self {
            document_id: required_text(&d.document_id, "documentId")?,
            cut: optional_text(&d.cut),
            first_name: required_text(&d.first_name, "firstName")?,
            last_name: required_text(&d.last_name, "lastName")?,
            birth_date,
            address: required_text(&d.address, "address")?,
            phone: optional_text(&d.phone),
            email: optional_text(&d.email),
            health_insurance,
            guardian_a: Guardian {
                first_name: required_text(&d.parent_a_first_name, "parentA_firstName")?,
                last_name: required_text(&d.parent_a_last_name, "parentA_lastName")?,
                document_id: optional_text(&d.parent_a_document_id),
                phone: optional_text(&d.parent_a_phone),
                email: optional_text(&d.parent_a_email),
                occupation: optional_text(&d.parent_a_occupation),
            },
            guardian_b,
            legal_guardian: d.legal_guardian,
            school,
            billing,
        })
    }
}
