//! Client behavior against a recording transport and the in-memory backend.

use std::cell::RefCell;
use std::collections::VecDeque;

use serde_json::{json, Value};

use clinic_wizard_api::{
    ApiClient, ApiConfig, ApiError, ApiRequest, ApiResponse, ApiResult, AppointmentSubmitter,
    MemorySessionStore, Method, MockTransport, PatientFilters, PatientSubmitter, Session,
    SessionStore, SessionUser, SqliteSessionStore, Transport,
};
use clinic_wizard_core::models::{
    AppointmentDraft, PatientDraft, PatientField, PatientForm, WizardMode,
};
use clinic_wizard_core::wizard::{
    AppointmentWizard, PatientWizard, SubmitOutcome, WizardController,
};

/// Answers with queued responses and remembers every request.
#[derive(Default)]
struct Recorder {
    requests: RefCell<Vec<ApiRequest>>,
    responses: RefCell<VecDeque<ApiResponse>>,
}

impl Recorder {
    fn replying(responses: Vec<ApiResponse>) -> Self {
        Self {
            requests: RefCell::new(Vec::new()),
            responses: RefCell::new(responses.into()),
        }
    }

    fn last(&self) -> ApiRequest {
        self.requests.borrow().last().cloned().unwrap()
    }
}

impl Transport for Recorder {
    fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ApiError::Transport("no response queued".into()))
    }
}

fn user() -> SessionUser {
    SessionUser {
        id: "u-1".into(),
        email: "ana@clinic.example".into(),
        first_name: "Ana".into(),
        last_name: "López".into(),
        organization_name: None,
        roles: vec![],
    }
}

fn signed_in() -> MemorySessionStore {
    MemorySessionStore::with_session(Session::new("tok-1", user()))
}

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

fn patient_record(id: &str) -> Value {
    json!({
        "id": id,
        "dni": "40123456",
        "firstName": "Juan",
        "lastName": "Pérez",
        "dateOfBirth": "2015-03-21",
        "address": "Av. Siempre Viva 742",
        "healthInsurance": { "hasInsurance": false },
        "guardians": [{ "type": "A", "firstName": "María", "lastName": "Gómez",
                        "dni": "", "phoneNumber": "", "isLegalGuardian": true }]
    })
}

#[test]
fn test_get_sends_bearer_and_unwraps_data() {
    let transport = Recorder::replying(vec![ApiResponse::new(
        200,
        json!({ "data": patient_record("p-1") }),
    )]);
    let api = ApiClient::new(ApiConfig::default(), &transport, signed_in());

    let record = api.patients().get("p-1").unwrap();
    assert_eq!(record.full_name(), "Juan Pérez");

    let request = transport.last();
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.url, "http://localhost:3001/api/patients/p-1");
    assert_eq!(request.bearer.as_deref(), Some("tok-1"));
}

#[test]
fn test_requests_need_a_session() {
    let transport = Recorder::default();
    let api = ApiClient::new(ApiConfig::default(), &transport, MemorySessionStore::new());

    let err = api.patients().get("p-1").unwrap_err();
    assert!(matches!(err, ApiError::Unauthenticated));
    assert!(transport.requests.borrow().is_empty());
}

#[test]
fn test_error_status_uses_backend_message() {
    let transport = Recorder::replying(vec![
        ApiResponse::new(409, json!({ "error": { "es": "El DNI ya existe" } })),
        ApiResponse::new(500, json!({})),
    ]);
    let api = ApiClient::new(ApiConfig::default(), &transport, signed_in());
    let form = PatientForm::try_from(&valid_patient()).unwrap();

    match api.patients().create(&form).unwrap_err() {
        ApiError::Status { status, message } => {
            assert_eq!(status, 409);
            assert_eq!(message, "El DNI ya existe");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        api.patients().delete("p-1").unwrap_err().user_message(),
        "Error deleting patient"
    );
}

#[test]
fn test_list_builds_query_and_reads_meta() {
    let transport = Recorder::replying(vec![
        ApiResponse::new(
            200,
            json!({
                "data": [patient_record("p-1")],
                "meta": { "total": 11, "page": 2, "limit": 10, "totalPages": 2 }
            }),
        ),
        ApiResponse::new(200, json!({})),
    ]);
    let api = ApiClient::new(ApiConfig::default(), &transport, signed_in());

    let filters = PatientFilters {
        page: Some(2),
        search: Some("juan p".into()),
        is_active: Some(true),
        ..PatientFilters::default()
    };
    let page = api.patients().list(&filters).unwrap();
    assert_eq!(page.patients.len(), 1);
    assert_eq!(page.meta.total_pages, 2);
    assert_eq!(
        transport.last().url,
        "http://localhost:3001/api/patients?page=2&search=juan%20p&isActive=true"
    );

    let empty = api.patients().list(&PatientFilters::default()).unwrap();
    assert!(empty.patients.is_empty());
    assert_eq!(empty.meta.page, 1);
}

#[test]
fn test_token_follows_the_session_store() {
    let transport = Recorder::replying(vec![
        ApiResponse::new(200, json!({ "data": patient_record("p-1") })),
        ApiResponse::new(200, json!({ "data": patient_record("p-1") })),
    ]);
    let store = SqliteSessionStore::open_in_memory().unwrap();
    let mut api = ApiClient::new(ApiConfig::default(), &transport, store);
    assert!(matches!(api.patients().get("p-1"), Err(ApiError::Unauthenticated)));

    api.session_mut().set(&Session::new("fresh", user())).unwrap();
    api.patients().get("p-1").unwrap();
    assert_eq!(transport.last().bearer.as_deref(), Some("fresh"));

    api.session_mut().set(&Session::new("rotated", user())).unwrap();
    api.patients().get("p-1").unwrap();
    assert_eq!(transport.last().bearer.as_deref(), Some("rotated"));

    api.session_mut().clear().unwrap();
    assert!(matches!(api.patients().get("p-1"), Err(ApiError::Unauthenticated)));
    assert_eq!(transport.requests.borrow().len(), 2);
}

#[test]
fn test_patient_wizard_create_then_edit() {
    let config = ApiConfig::default();
    let backend = MockTransport::new(&config);

    // create
    let api = ApiClient::new(config.clone(), &backend, signed_in());
    let mut wizard: WizardController<PatientWizard, _> = WizardController::with_default_steps(
        WizardMode::Create,
        Some(valid_patient()),
        PatientSubmitter::new(api),
    );
    assert_eq!(wizard.submit().unwrap(), SubmitOutcome::Submitted);
    let created = wizard.callbacks_mut().take_result().unwrap().unwrap();
    assert_eq!(backend.patient_count(), 1);

    // edit the stored record
    let api = ApiClient::new(config, &backend, signed_in());
    let seed = api.patients().get(&created.id).unwrap().to_draft();
    assert_eq!(seed, valid_patient());

    let mut wizard: WizardController<PatientWizard, _> = WizardController::with_default_steps(
        WizardMode::Edit,
        Some(seed),
        PatientSubmitter::editing(api, created.id.clone()),
    );
    wizard
        .update_field(PatientField::Address, "Calle 2 456".into())
        .unwrap();
    assert!(wizard.is_dirty());
    assert_eq!(wizard.submit().unwrap(), SubmitOutcome::Submitted);

    let updated = wizard.callbacks().last_result().unwrap().as_ref().unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.address, "Calle 2 456");
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(backend.patient_count(), 1);
}

#[test]
fn test_edit_without_id_reports_error() {
    let backend = MockTransport::new(&ApiConfig::default());
    let api = ApiClient::new(ApiConfig::default(), &backend, signed_in());
    let mut wizard: WizardController<PatientWizard, _> = WizardController::with_default_steps(
        WizardMode::Edit,
        Some(valid_patient()),
        PatientSubmitter::new(api),
    );

    wizard.submit().unwrap();
    let result = wizard.callbacks().last_result().unwrap();
    assert!(matches!(result, Err(ApiError::MissingRecordId)));
    assert_eq!(backend.patient_count(), 0);
}

#[test]
fn test_appointment_wizard_posts_to_backend() {
    let config = ApiConfig::default();
    let backend = MockTransport::new(&config);
    let api = ApiClient::new(config, &backend, signed_in());
    let patient = api
        .patients()
        .create(&PatientForm::try_from(&valid_patient()).unwrap())
        .unwrap();

    let draft = AppointmentDraft {
        patient_id: Some(patient.id.clone()),
        date: Some("2025-06-02".into()),
        start_time: Some("09:00".into()),
        end_time: Some("09:45".into()),
        price: Some("4500".into()),
        ..AppointmentDraft::default()
    };
    let mut wizard: WizardController<AppointmentWizard, _> = WizardController::with_default_steps(
        WizardMode::Create,
        Some(draft),
        AppointmentSubmitter::new(api),
    );
    assert_eq!(wizard.submit().unwrap(), SubmitOutcome::Submitted);

    let record = wizard.callbacks().last_result().unwrap().as_ref().unwrap();
    assert_eq!(record.patient_id, patient.id);
    assert_eq!(record.patient_name.as_deref(), Some("Juan Pérez"));
    assert_eq!(record.duration, 45);
    assert_eq!(record.status.as_deref(), Some("scheduled"));

    wizard.close();
    assert!(wizard.callbacks().is_closed());
}

#[test]
fn test_stats_and_status_toggle_against_mock() {
    let config = ApiConfig::default();
    let backend = MockTransport::new(&config);
    let api = ApiClient::new(config, &backend, signed_in());
    let created = api
        .patients()
        .create(&PatientForm::try_from(&valid_patient()).unwrap())
        .unwrap();

    let toggled = api.patients().toggle_status(&created.id).unwrap();
    assert!(!toggled.is_active);

    let stats = api.patients().stats().unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.active, 0);
    assert_eq!(stats.approved, 1);

    api.patients().delete(&created.id).unwrap();
    assert!(matches!(
        api.patients().get(&created.id),
        Err(ApiError::Status { status: 404, .. })
    ));
}

#[test]
fn test_unauthorized_request_is_a_status_error() {
    let transport = Recorder::replying(vec![ApiResponse::new(
        401,
        json!({ "message": "Unauthorized" }),
    )]);
    let api = ApiClient::new(ApiConfig::default(), &transport, signed_in());
    let err = api.patients().stats().unwrap_err();
    assert_eq!(err.user_message(), "Unauthorized");
    assert_eq!(transport.last().method, Method::Get);
}

#[test]
fn test_blank_second_guardian_is_not_posted() {
    let config = ApiConfig::default();
    let backend = MockTransport::new(&config);
    let api = ApiClient::new(config, &backend, signed_in());
    let mut wizard: WizardController<PatientWizard, _> = WizardController::with_default_steps(
        WizardMode::Create,
        Some(PatientDraft {
            has_parent_b: true,
            ..valid_patient()
        }),
        PatientSubmitter::new(api),
    );

    assert_eq!(wizard.submit().unwrap(), SubmitOutcome::Submitted);
    let created = wizard.callbacks_mut().take_result().unwrap().unwrap();
    assert_eq!(created.guardians.len(), 1);
    assert!(!created.to_draft().has_parent_b);
}
