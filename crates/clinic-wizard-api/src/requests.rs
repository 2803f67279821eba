//! Wire shapes of the REST backend and their mapping to wizard types.
//!
//! Outbound: [`PatientForm`] → [`CreatePatientRequest`] and
//! [`AppointmentForm`] → [`CreateAppointmentRequest`].
//! Inbound: [`PatientRecord`] → [`PatientDraft`] for seeding the edit wizard.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use clinic_wizard_core::models::{
    AppointmentForm, AppointmentType, FiscalCondition, Guardian, LegalGuardian, PatientDraft,
    PatientForm, PaymentType, RecurrencePattern,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

// ============================================================================
// Patients
// ============================================================================

/// Guardian slot on the backend: `A` is the primary parent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GuardianSlot {
    A,
    B,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthInsuranceInfo {
    pub has_insurance: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GuardianInfo {
    #[serde(rename = "type")]
    pub slot: GuardianSlot,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub dni: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default)]
    pub is_legal_guardian: bool,
}

impl GuardianInfo {
    fn from_guardian(slot: GuardianSlot, g: &Guardian, is_legal_guardian: bool) -> Self {
        Self {
            slot,
            first_name: g.first_name.clone(),
            last_name: g.last_name.clone(),
            dni: g.document_id.clone().unwrap_or_default(),
            phone_number: g.phone.clone().unwrap_or_default(),
            email: g.email.clone(),
            occupation: g.occupation.clone(),
            is_legal_guardian,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchoolInfo {
    pub attends_school: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BillingInfo {
    pub requires_billing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_condition: Option<FiscalCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiscal_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_email: Option<String>,
}

/// Body of `POST /patients` and `PUT /patients/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    pub dni: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut: Option<String>,
    pub first_name: String,
    pub last_name: String,
    /// `YYYY-MM-DD`
    pub date_of_birth: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub health_insurance: HealthInsuranceInfo,
    pub guardians: Vec<GuardianInfo>,
    pub legal_guardian_type: LegalGuardian,
    pub school_info: SchoolInfo,
    pub billing_info: BillingInfo,
}

impl From<&PatientForm> for CreatePatientRequest {
    fn from(form: &PatientForm) -> Self {
        let mut guardians = vec![GuardianInfo::from_guardian(
            GuardianSlot::A,
            &form.guardian_a,
            form.legal_guardian.includes_a(),
        )];
        if let Some(b) = form.guardian_b.as_ref().filter(|b| !b.first_name.trim().is_empty()) {
            guardians.push(GuardianInfo::from_guardian(
                GuardianSlot::B,
                b,
                form.legal_guardian.includes_b(),
            ));
        }

        let health_insurance = match &form.health_insurance {
            Some(hi) => HealthInsuranceInfo {
                has_insurance: true,
                insurance_name: Some(hi.name.clone()),
                affiliate_number: hi.member_number.clone(),
            },
            None => HealthInsuranceInfo {
                has_insurance: false,
                insurance_name: None,
                affiliate_number: None,
            },
        };

        let school_info = match &form.school {
            Some(s) => SchoolInfo {
                attends_school: true,
                school_name: s.school_name.clone(),
                school_address: s.location.clone(),
                grade: s.grade.clone(),
                observations: s.observations.clone(),
            },
            None => SchoolInfo {
                attends_school: false,
                school_name: None,
                school_address: None,
                grade: None,
                observations: None,
            },
        };

        let billing_info = match &form.billing {
            Some(b) => BillingInfo {
                requires_billing: true,
                business_name: Some(b.business_name.clone()),
                tax_id: Some(b.tax_id.clone()),
                tax_condition: Some(b.fiscal_condition),
                fiscal_address: Some(b.fiscal_address.clone()),
                billing_email: b.email.clone(),
            },
            None => BillingInfo {
                requires_billing: false,
                business_name: None,
                tax_id: None,
                tax_condition: None,
                fiscal_address: None,
                billing_email: None,
            },
        };

        Self {
            dni: form.document_id.clone(),
            cut: form.cut.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            date_of_birth: form.birth_date.format(DATE_FORMAT).to_string(),
            address: form.address.clone(),
            phone_number: form.phone.clone(),
            email: form.email.clone(),
            health_insurance,
            guardians,
            legal_guardian_type: form.legal_guardian,
            school_info,
            billing_info,
        }
    }
}

/// A patient as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub id: String,
    pub dni: String,
    #[serde(default)]
    pub cut: Option<String>,
    pub first_name: String,
    pub last_name: String,
    /// Date or full timestamp; only the date part is used
    pub date_of_birth: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub health_insurance: Option<HealthInsuranceInfo>,
    #[serde(default)]
    pub guardians: Vec<GuardianInfo>,
    #[serde(default)]
    pub school_info: Option<SchoolInfo>,
    #[serde(default)]
    pub billing_info: Option<BillingInfo>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl PatientRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn guardian(&self, slot: GuardianSlot) -> Option<&GuardianInfo> {
        self.guardians.iter().find(|g| g.slot == slot)
    }

    /// Legal guardian derived from the per-guardian flags; `A` when neither
    /// guardian is flagged.
    pub fn legal_guardian(&self) -> LegalGuardian {
        let a = self.guardian(GuardianSlot::A).is_some_and(|g| g.is_legal_guardian);
        let b = self.guardian(GuardianSlot::B).is_some_and(|g| g.is_legal_guardian);
        match (a, b) {
            (true, true) => LegalGuardian::Both,
            (false, true) => LegalGuardian::B,
            _ => LegalGuardian::A,
        }
    }

    /// Draft that seeds the patient wizard in edit mode.
    pub fn to_draft(&self) -> PatientDraft {
        let mut draft = PatientDraft {
            document_id: Some(self.dni.clone()),
            cut: self.cut.clone(),
            first_name: Some(self.first_name.clone()),
            last_name: Some(self.last_name.clone()),
            birth_date: Some(self.date_of_birth.chars().take(10).collect()),
            address: Some(self.address.clone()),
            phone: self.phone_number.clone(),
            email: self.email.clone(),
            legal_guardian: self.legal_guardian(),
            ..PatientDraft::default()
        };

        if let Some(hi) = &self.health_insurance {
            draft.has_insurance = hi.has_insurance;
            draft.insurance_name = hi.insurance_name.clone();
            draft.member_number = hi.affiliate_number.clone();
        }

        if let Some(a) = self.guardian(GuardianSlot::A) {
            draft.parent_a_first_name = Some(a.first_name.clone());
            draft.parent_a_last_name = Some(a.last_name.clone());
            draft.parent_a_document_id = non_empty(&a.dni);
            draft.parent_a_phone = non_empty(&a.phone_number);
            draft.parent_a_email = a.email.clone();
            draft.parent_a_occupation = a.occupation.clone();
        }
        if let Some(b) = self.guardian(GuardianSlot::B) {
            draft.has_parent_b = true;
            draft.parent_b_first_name = Some(b.first_name.clone());
            draft.parent_b_last_name = Some(b.last_name.clone());
            draft.parent_b_document_id = non_empty(&b.dni);
            draft.parent_b_phone = non_empty(&b.phone_number);
            draft.parent_b_email = b.email.clone();
            draft.parent_b_occupation = b.occupation.clone();
        }

        if let Some(s) = &self.school_info {
            draft.has_school = s.attends_school;
            draft.school_name = s.school_name.clone();
            draft.school_location = s.school_address.clone();
            draft.grade = s.grade.clone();
            draft.observations = s.observations.clone();
        }

        if let Some(b) = &self.billing_info {
            draft.requires_invoice = b.requires_billing;
            draft.billing_business_name = b.business_name.clone();
            draft.billing_tax_id = b.tax_id.clone();
            draft.billing_fiscal_condition = b.tax_condition;
            draft.billing_fiscal_address = b.fiscal_address.clone();
            draft.billing_email = b.billing_email.clone();
        }

        draft
    }
}

/// Review status of a patient record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatientStatus {
    Pending,
    Approved,
    Rejected,
}

impl AsRef<str> for PatientStatus {
    fn as_ref(&self) -> &str {
        match self {
            PatientStatus::Pending => "PENDING",
            PatientStatus::Approved => "APPROVED",
            PatientStatus::Rejected => "REJECTED",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Query of `GET /patients`. Unset filters are omitted from the URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientFilters {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub has_insurance: Option<bool>,
    pub is_active: Option<bool>,
    pub status: Option<PatientStatus>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl PatientFilters {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(flag) = self.has_insurance {
            pairs.push(("hasInsurance", flag.to_string()));
        }
        if let Some(flag) = self.is_active {
            pairs.push(("isActive", flag.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_ref().to_string()));
        }
        if let Some(sort_by) = self.sort_by.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("sortBy", sort_by.to_string()));
        }
        if let Some(order) = self.sort_order {
            let order = match order {
                SortOrder::Asc => "asc",
                SortOrder::Desc => "desc",
            };
            pairs.push(("sortOrder", order.to_string()));
        }
        pairs
    }
}

/// Pagination block of a list response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl Default for PageMeta {
    fn default() -> Self {
        Self {
            total: 0,
            page: 1,
            limit: 10,
            total_pages: 0,
        }
    }
}

/// One page of patients.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientPage {
    pub patients: Vec<PatientRecord>,
    pub meta: PageMeta,
}

/// Counters as the backend reports them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientStatsResponse {
    pub total_patients: u64,
    pub active_patients: u64,
    pub patients_with_insurance: u64,
    pub pending_patients: u64,
}

/// Counters shown on the patients dashboard.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PatientStats {
    pub total: u64,
    pub active: u64,
    pub with_insurance: u64,
    pub pending: u64,
    pub approved: u64,
}

impl From<PatientStatsResponse> for PatientStats {
    fn from(r: PatientStatsResponse) -> Self {
        Self {
            total: r.total_patients,
            active: r.active_patients,
            with_insurance: r.patients_with_insurance,
            pending: r.pending_patients,
            approved: r.total_patients.saturating_sub(r.pending_patients),
        }
    }
}

// ============================================================================
// Appointments
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceInfo {
    pub pattern: RecurrencePattern,
    /// 0 = Sunday
    pub days_of_week: Vec<u8>,
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrences: Option<u32>,
}

/// Body of `POST /appointments`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub patient_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    /// Minutes
    pub duration: i64,
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceInfo>,
    pub payment_type: PaymentType,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

impl From<&AppointmentForm> for CreateAppointmentRequest {
    fn from(form: &AppointmentForm) -> Self {
        let recurrence = form.recurrence.as_ref().map(|r| RecurrenceInfo {
            pattern: r.pattern,
            days_of_week: r.days_of_week.clone(),
            start_date: format_date(form.date),
            end_date: r.end_date.map(format_date),
            occurrences: r.occurrences,
        });

        Self {
            patient_id: form.patient_id.clone(),
            date: format_date(form.date),
            start_time: form.start_time.format(TIME_FORMAT).to_string(),
            end_time: form.end_time.format(TIME_FORMAT).to_string(),
            duration: form.duration_minutes,
            kind: if recurrence.is_some() {
                AppointmentType::Recurring
            } else {
                AppointmentType::Single
            },
            recurrence,
            payment_type: form.payment_type,
            price: form.price,
            insurance_name: match form.payment_type {
                PaymentType::Insurance => form.insurance_name.clone(),
                PaymentType::Private => None,
            },
            observations: form.observations.clone(),
        }
    }
}

/// An appointment as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRecord {
    pub id: String,
    pub patient_id: String,
    #[serde(default)]
    pub patient_name: Option<String>,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub duration: i64,
    #[serde(rename = "type", default)]
    pub kind: AppointmentType,
    #[serde(default)]
    pub parent_appointment_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use clinic_wizard_core::models::{BillingData, HealthInsurance, Recurrence, SchoolData};
    use serde_json::json;

    fn guardian(first: &str, last: &str) -> Guardian {
        Guardian {
            first_name: first.into(),
            last_name: last.into(),
            document_id: Some("30111222".into()),
            phone: None,
            email: None,
            occupation: Some("Docente".into()),
        }
    }

    fn form() -> PatientForm {
        PatientForm {
            document_id: "40123456".into(),
            cut: None,
            first_name: "Juan".into(),
            last_name: "Pérez".into(),
            birth_date: NaiveDate::from_ymd_opt(2015, 3, 21).unwrap(),
            address: "Av. Siempre Viva 742".into(),
            phone: None,
            email: None,
            health_insurance: None,
            guardian_a: guardian("María", "Gómez"),
            guardian_b: None,
            legal_guardian: LegalGuardian::A,
            school: None,
            billing: None,
        }
    }

    #[test]
    fn test_minimal_patient_request() {
        let request = CreatePatientRequest::from(&form());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["dni"], "40123456");
        assert_eq!(json["dateOfBirth"], "2015-03-21");
        assert_eq!(json["healthInsurance"], json!({ "hasInsurance": false }));
        assert_eq!(json["schoolInfo"], json!({ "attendsSchool": false }));
        assert_eq!(json["billingInfo"], json!({ "requiresBilling": false }));
        assert_eq!(json["legalGuardianType"], "A");

        let guardians = json["guardians"].as_array().unwrap();
        assert_eq!(guardians.len(), 1);
        assert_eq!(guardians[0]["type"], "A");
        assert_eq!(guardians[0]["isLegalGuardian"], true);
        assert_eq!(guardians[0]["phoneNumber"], "");
        assert!(json.get("phoneNumber").is_none());
    }

    #[test]
    fn test_nameless_second_guardian_is_left_out() {
        let mut form = form();
        form.guardian_b = Some(guardian("", "Ruiz"));
        form.legal_guardian = LegalGuardian::Both;
        let json = serde_json::to_value(CreatePatientRequest::from(&form)).unwrap();
        assert_eq!(json["guardians"].as_array().unwrap().len(), 1);
        assert_eq!(json["guardians"][0]["isLegalGuardian"], true);
    }

    #[test]
    fn test_full_patient_request() {
        let mut form = form();
        form.health_insurance = Some(HealthInsurance {
            name: "OSDE".into(),
            member_number: Some("123".into()),
        });
        form.guardian_b = Some(guardian("Pedro", "Pérez"));
        form.legal_guardian = LegalGuardian::B;
        form.school = Some(SchoolData {
            school_name: Some("Escuela N° 1".into()),
            location: None,
            grade: Some("3°".into()),
            observations: None,
        });
        form.billing = Some(BillingData {
            business_name: "Pérez SRL".into(),
            tax_id: "30-12345678-9".into(),
            fiscal_condition: FiscalCondition::ResponsableInscripto,
            fiscal_address: "Calle 1 123".into(),
            email: None,
        });

        let request = CreatePatientRequest::from(&form);
        assert_eq!(request.health_insurance.insurance_name.as_deref(), Some("OSDE"));
        assert_eq!(request.health_insurance.affiliate_number.as_deref(), Some("123"));
        assert_eq!(request.guardians.len(), 2);
        assert!(!request.guardians[0].is_legal_guardian);
        assert!(request.guardians[1].is_legal_guardian);
        assert_eq!(request.guardians[1].slot, GuardianSlot::B);
        assert_eq!(request.school_info.grade.as_deref(), Some("3°"));
        assert_eq!(
            request.billing_info.tax_condition,
            Some(FiscalCondition::ResponsableInscripto)
        );
    }

    fn record_json() -> serde_json::Value {
        json!({
            "id": "p-7",
            "dni": "40123456",
            "firstName": "Juan",
            "lastName": "Pérez",
            "dateOfBirth": "2015-03-21T00:00:00.000Z",
            "address": "Av. Siempre Viva 742",
            "healthInsurance": { "hasInsurance": true, "insuranceName": "OSDE" },
            "guardians": [
                { "type": "B", "firstName": "Pedro", "lastName": "Pérez",
                  "dni": "", "phoneNumber": "", "isLegalGuardian": true },
                { "type": "A", "firstName": "María", "lastName": "Gómez",
                  "dni": "30111222", "phoneNumber": "221555", "isLegalGuardian": true }
            ],
            "schoolInfo": { "attendsSchool": true, "schoolName": "Escuela N° 1" },
            "createdAt": "2025-01-02T10:00:00Z"
        })
    }

    #[test]
    fn test_record_to_draft() {
        let record: PatientRecord = serde_json::from_value(record_json()).unwrap();
        assert!(record.is_active);
        assert_eq!(record.legal_guardian(), LegalGuardian::Both);

        let draft = record.to_draft();
        assert_eq!(draft.birth_date.as_deref(), Some("2015-03-21"));
        assert!(draft.has_insurance);
        assert_eq!(draft.insurance_name.as_deref(), Some("OSDE"));
        assert_eq!(draft.parent_a_first_name.as_deref(), Some("María"));
        assert_eq!(draft.parent_a_phone.as_deref(), Some("221555"));
        assert!(draft.has_parent_b);
        assert_eq!(draft.parent_b_document_id, None);
        assert!(draft.has_school);
        assert!(!draft.requires_invoice);
        assert_eq!(draft.legal_guardian, LegalGuardian::Both);
    }

    #[test]
    fn test_record_to_draft_round_trips_through_the_form() {
        let record: PatientRecord = serde_json::from_value(record_json()).unwrap();
        let form = PatientForm::try_from(&record.to_draft()).unwrap();
        assert_eq!(form.full_name(), record.full_name());
        assert!(form.guardian_b.is_some());
    }

    #[test]
    fn test_legal_guardian_defaults_to_a() {
        let mut record: PatientRecord = serde_json::from_value(record_json()).unwrap();
        for g in &mut record.guardians {
            g.is_legal_guardian = false;
        }
        assert_eq!(record.legal_guardian(), LegalGuardian::A);
        record.guardians[0].is_legal_guardian = true;
        assert_eq!(record.legal_guardian(), LegalGuardian::B);
    }

    #[test]
    fn test_filters_skip_unset_values() {
        assert!(PatientFilters::default().query_pairs().is_empty());

        let filters = PatientFilters {
            page: Some(2),
            search: Some(String::new()),
            has_insurance: Some(false),
            status: Some(PatientStatus::Approved),
            sort_order: Some(SortOrder::Desc),
            ..PatientFilters::default()
        };
        assert_eq!(
            filters.query_pairs(),
            vec![
                ("page", "2".to_string()),
                ("hasInsurance", "false".to_string()),
                ("status", "APPROVED".to_string()),
                ("sortOrder", "desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_page_meta_defaults() {
        let meta: PageMeta = serde_json::from_value(json!({ "total": 3 })).unwrap();
        assert_eq!(meta.total, 3);
        assert_eq!(meta.page, 1);
        assert_eq!(meta.limit, 10);
    }

    #[test]
    fn test_stats_derive_approved_count() {
        let wire: PatientStatsResponse = serde_json::from_value(
            json!({ "totalPatients": 12, "activePatients": 10, "pendingPatients": 3 }),
        )
        .unwrap();
        let stats = PatientStats::from(wire);
        assert_eq!(stats.with_insurance, 0);
        assert_eq!(stats.approved, 9);
    }

    #[test]
    fn test_recurring_appointment_request() {
        let form = AppointmentForm {
            patient_id: "p-7".into(),
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(9, 45, 0).unwrap(),
            duration_minutes: 45,
            observations: None,
            recurrence: Some(Recurrence {
                pattern: RecurrencePattern::Weekly,
                days_of_week: vec![1, 3],
                end_date: None,
                occurrences: Some(8),
            }),
            payment_type: PaymentType::Private,
            price: 4500.0,
            insurance_name: Some("ignored".into()),
        };

        let json = serde_json::to_value(CreateAppointmentRequest::from(&form)).unwrap();
        assert_eq!(json["type"], "recurring");
        assert_eq!(json["startTime"], "09:00");
        assert_eq!(json["duration"], 45);
        assert_eq!(json["price"], 4500.0);
        assert_eq!(json["paymentType"], "private");
        assert!(json.get("insuranceName").is_none());
        assert_eq!(
            json["recurrence"],
            json!({
                "pattern": "weekly",
                "daysOfWeek": [1, 3],
                "startDate": "2025-06-02",
                "occurrences": 8
            })
        );
    }
}
