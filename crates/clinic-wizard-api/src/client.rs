//! REST client for the clinic backend.
//!
//! HTTP itself sits behind [`Transport`] so the embedding app brings its own
//! stack. Every call reads the bearer token from the [`SessionStore`] and
//! unwraps the backend's `{ "data": ... }` envelope.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use clinic_wizard_core::models::{AppointmentForm, PatientForm, WizardMode};
use clinic_wizard_core::wizard::WizardCallbacks;

use crate::config::ApiConfig;
use crate::requests::{
    AppointmentRecord, CreateAppointmentRequest, CreatePatientRequest, PageMeta, PatientFilters,
    PatientPage, PatientRecord, PatientStats, PatientStatsResponse,
};
use crate::session::{SessionError, SessionStore};

/// API errors.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("Not signed in")]
    Unauthenticated,

    #[error("Response has no {0:?} field")]
    MissingData(&'static str),

    #[error("Editing requires the id of the existing record")]
    MissingRecordId,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Text suitable for a toast: the backend's message for status errors.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Message of a failed response: `error.es`, then `message`, then `default`.
pub fn error_message(body: &Value, default: &str) -> String {
    let text = |pointer: &str| {
        body.pointer(pointer)
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
    };
    text("/error/es")
        .or_else(|| text("/message"))
        .unwrap_or(default)
        .to_string()
}

// ============================================================================
// Transport
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// A fully resolved request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![("Content-Type", "application/json".to_string())];
        if let Some(token) = &self.bearer {
            headers.push(("Authorization", format!("Bearer {}", token)));
        }
        headers
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a request and returns whatever the server answered, including
/// error statuses. Only connection-level failures are `Err`.
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        (**self).send(request)
    }
}

// ============================================================================
// Client
// ============================================================================

/// Configuration, transport and session bundled together.
pub struct ApiClient<T, S> {
    config: ApiConfig,
    transport: T,
    session: S,
}

impl<T: Transport, S: SessionStore> ApiClient<T, S> {
    pub fn new(config: ApiConfig, transport: T, session: S) -> Self {
        Self {
            config,
            transport,
            session,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// The caller's sign-in flow stores and clears sessions through this.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn patients(&self) -> PatientClient<'_, T, S> {
        PatientClient { api: self }
    }

    pub fn appointments(&self) -> AppointmentClient<'_, T, S> {
        AppointmentClient { api: self }
    }

    fn authed(&self, method: Method, url: String, body: Option<Value>) -> ApiResult<ApiRequest> {
        let token = self.session.token()?.ok_or(ApiError::Unauthenticated)?;
        Ok(ApiRequest {
            method,
            url,
            bearer: Some(token),
            body,
        })
    }

    /// Send and return the raw success body.
    fn send_checked(&self, request: &ApiRequest, default_error: &str) -> ApiResult<Value> {
        debug!(method = request.method.as_str(), url = %request.url, "Sending request");
        let response = self.transport.send(request)?;
        if !response.is_success() {
            let message = error_message(&response.body, default_error);
            warn!(status = response.status, url = %request.url, %message, "Request failed");
            return Err(ApiError::Status {
                status: response.status,
                message,
            });
        }
        Ok(response.body)
    }

    /// Send and decode the `data` member of the success body.
    fn exchange<R: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        default_error: &str,
    ) -> ApiResult<R> {
        let mut body = self.send_checked(request, default_error)?;
        let data = body
            .get_mut("data")
            .map(Value::take)
            .ok_or(ApiError::MissingData("data"))?;
        Ok(serde_json::from_value(data)?)
    }
}

/// Append `pairs` to `url` as an encoded query string.
fn with_query(url: String, pairs: &[(&str, String)]) -> String {
    if pairs.is_empty() {
        return url;
    }
    let query = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", url, query)
}

// ============================================================================
// Patients
// ============================================================================

pub struct PatientClient<'a, T, S> {
    api: &'a ApiClient<T, S>,
}

impl<T: Transport, S: SessionStore> PatientClient<'_, T, S> {
    fn url(&self, path: &str) -> String {
        self.api.config.endpoint(path)
    }

    pub fn create(&self, form: &PatientForm) -> ApiResult<PatientRecord> {
        let body = serde_json::to_value(CreatePatientRequest::from(form))?;
        let request = self.api.authed(Method::Post, self.url("/patients"), Some(body))?;
        self.api.exchange(&request, "Error creating patient")
    }

    pub fn update(&self, id: &str, form: &PatientForm) -> ApiResult<PatientRecord> {
        let body = serde_json::to_value(CreatePatientRequest::from(form))?;
        let url = self.url(&format!("/patients/{}", id));
        let request = self.api.authed(Method::Put, url, Some(body))?;
        self.api.exchange(&request, "Error updating patient")
    }

    pub fn get(&self, id: &str) -> ApiResult<PatientRecord> {
        let url = self.url(&format!("/patients/{}", id));
        let request = self.api.authed(Method::Get, url, None)?;
        self.api.exchange(&request, "Error fetching patient")
    }

    pub fn list(&self, filters: &PatientFilters) -> ApiResult<PatientPage> {
        let url = with_query(self.url("/patients"), &filters.query_pairs());
        let request = self.api.authed(Method::Get, url, None)?;
        let body = self.api.send_checked(&request, "Error fetching patients")?;

        let patients = match body.get("data") {
            Some(data) => serde_json::from_value(data.clone())?,
            None => Vec::new(),
        };
        let meta = match body.get("meta") {
            Some(meta) => serde_json::from_value(meta.clone())?,
            None => PageMeta::default(),
        };
        Ok(PatientPage { patients, meta })
    }

    pub fn delete(&self, id: &str) -> ApiResult<()> {
        let url = self.url(&format!("/patients/{}", id));
        let request = self.api.authed(Method::Delete, url, None)?;
        self.api.send_checked(&request, "Error deleting patient")?;
        Ok(())
    }

    pub fn stats(&self) -> ApiResult<PatientStats> {
        let request = self.api.authed(Method::Get, self.url("/patients/stats"), None)?;
        let wire: PatientStatsResponse = self.api.exchange(&request, "Error fetching statistics")?;
        Ok(wire.into())
    }

    pub fn approve(&self, id: &str) -> ApiResult<PatientRecord> {
        let url = self.url(&format!("/patients/{}/approve", id));
        let request = self.api.authed(Method::Patch, url, None)?;
        self.api.exchange(&request, "Error approving patient")
    }

    pub fn toggle_status(&self, id: &str) -> ApiResult<PatientRecord> {
        let url = self.url(&format!("/patients/{}/toggle-status", id));
        let request = self.api.authed(Method::Patch, url, None)?;
        self.api.exchange(&request, "Error changing patient status")
    }
}

// ============================================================================
// Appointments
// ============================================================================

pub struct AppointmentClient<'a, T, S> {
    api: &'a ApiClient<T, S>,
}

impl<T: Transport, S: SessionStore> AppointmentClient<'_, T, S> {
    pub fn create(&self, form: &AppointmentForm) -> ApiResult<AppointmentRecord> {
        let body = serde_json::to_value(CreateAppointmentRequest::from(form))?;
        let url = self.api.config.endpoint("/appointments");
        let request = self.api.authed(Method::Post, url, Some(body))?;
        self.api.exchange(&request, "Error creating appointment")
    }
}

// ============================================================================
// Wizard submitters
// ============================================================================

/// Persists submitted patients: POST in create mode, PUT in edit mode.
pub struct PatientSubmitter<T, S> {
    api: ApiClient<T, S>,
    record_id: Option<String>,
    last_result: Option<ApiResult<PatientRecord>>,
    closed: bool,
}

impl<T: Transport, S: SessionStore> PatientSubmitter<T, S> {
    pub fn new(api: ApiClient<T, S>) -> Self {
        Self {
            api,
            record_id: None,
            last_result: None,
            closed: false,
        }
    }

    /// Submitter for editing the record with `id`.
    pub fn editing(api: ApiClient<T, S>, id: impl Into<String>) -> Self {
        Self {
            record_id: Some(id.into()),
            ..Self::new(api)
        }
    }

    pub fn api(&self) -> &ApiClient<T, S> {
        &self.api
    }

    pub fn last_result(&self) -> Option<&ApiResult<PatientRecord>> {
        self.last_result.as_ref()
    }

    pub fn take_result(&mut self) -> Option<ApiResult<PatientRecord>> {
        self.last_result.take()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<T: Transport, S: SessionStore> WizardCallbacks<PatientForm> for PatientSubmitter<T, S> {
    fn on_success(&mut self, form: PatientForm, mode: WizardMode) {
        let patients = self.api.patients();
        let result = match (mode, &self.record_id) {
            (WizardMode::Create, _) => patients.create(&form),
            (WizardMode::Edit, Some(id)) => patients.update(id, &form),
            (WizardMode::Edit, None) => Err(ApiError::MissingRecordId),
        };

        match &result {
            Ok(record) => {
                info!(patient_id = %record.id, mode = mode.as_str(), "Patient saved");
                self.record_id = Some(record.id.clone());
            }
            Err(e) => warn!(error = %e, mode = mode.as_str(), "Saving patient failed"),
        }
        self.last_result = Some(result);
    }

    fn on_close(&mut self) {
        self.closed = true;
    }
}

/// Persists submitted appointments.
pub struct AppointmentSubmitter<T, S> {
    api: ApiClient<T, S>,
    last_result: Option<ApiResult<AppointmentRecord>>,
    closed: bool,
}

impl<T: Transport, S: SessionStore> AppointmentSubmitter<T, S> {
    pub fn new(api: ApiClient<T, S>) -> Self {
        Self {
            api,
            last_result: None,
            closed: false,
        }
    }

    pub fn api(&self) -> &ApiClient<T, S> {
        &self.api
    }

    pub fn last_result(&self) -> Option<&ApiResult<AppointmentRecord>> {
        self.last_result.as_ref()
    }

    pub fn take_result(&mut self) -> Option<ApiResult<AppointmentRecord>> {
        self.last_result.take()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<T: Transport, S: SessionStore> WizardCallbacks<AppointmentForm>
    for AppointmentSubmitter<T, S>
{
    fn on_success(&mut self, form: AppointmentForm, mode: WizardMode) {
        let result = self.api.appointments().create(&form);
        match &result {
            Ok(record) => {
                info!(appointment_id = %record.id, mode = mode.as_str(), "Appointment saved")
            }
            Err(e) => warn!(error = %e, "Saving appointment failed"),
        }
        self.last_result = Some(result);
    }

    fn on_close(&mut self) {
        self.closed = true;
    }
}
