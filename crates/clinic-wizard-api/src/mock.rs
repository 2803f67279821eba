//! In-memory backend for running without a server (`enable_mock_data`).

use std::cell::RefCell;
use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::client::{ApiRequest, ApiResponse, ApiResult, Method, Transport};
use crate::config::ApiConfig;

#[derive(Debug, Default)]
struct MockState {
    next_id: u64,
    patients: BTreeMap<String, Value>,
    appointments: BTreeMap<String, Value>,
}

/// Serves patients and appointments from memory, mimicking the backend's
/// envelopes and error bodies. Any token is accepted.
#[derive(Debug)]
pub struct MockTransport {
    base_url: String,
    state: RefCell<MockState>,
}

fn not_found(what: &str, es: &str) -> ApiResponse {
    ApiResponse::new(
        404,
        json!({
            "message": format!("{} not found", what),
            "error": { "es": format!("{} no encontrado", es) },
        }),
    )
}

fn data(status: u16, value: Value) -> ApiResponse {
    ApiResponse::new(status, json!({ "data": value }))
}

impl MockTransport {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            state: RefCell::new(MockState::default()),
        }
    }

    pub fn patient_count(&self) -> usize {
        self.state.borrow().patients.len()
    }

    /// Path segments and decoded query of a request URL under the base URL.
    fn route(&self, url: &str) -> Option<(Vec<String>, BTreeMap<String, String>)> {
        let rest = url.strip_prefix(&self.base_url)?;
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let query = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .filter_map(|(k, v)| Some((k.to_string(), urlencoding::decode(v).ok()?.into_owned())))
            .collect();
        Some((segments, query))
    }

    fn new_id(&self, prefix: &str) -> String {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        format!("{}-{}", prefix, state.next_id)
    }

    fn store_patient(&self, id: String, body: &Value, created_at: Option<Value>) -> Value {
        let now = Value::String(Utc::now().to_rfc3339());
        let mut record = body.as_object().cloned().unwrap_or_else(Map::new);
        record.insert("id".into(), Value::String(id.clone()));
        record.entry("isActive").or_insert(Value::Bool(true));
        record.insert("createdAt".into(), created_at.unwrap_or_else(|| now.clone()));
        record.insert("updatedAt".into(), now);
        let record = Value::Object(record);
        self.state.borrow_mut().patients.insert(id, record.clone());
        record
    }

    fn list_patients(&self, query: &BTreeMap<String, String>) -> ApiResponse {
        let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1).max(1);
        let limit: usize = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10).max(1);
        let search = query.get("search").map(|s| s.to_lowercase());

        let state = self.state.borrow();
        let matching: Vec<&Value> = state
            .patients
            .values()
            .filter(|p| match &search {
                Some(needle) => ["firstName", "lastName", "dni"].iter().any(|key| {
                    p[*key]
                        .as_str()
                        .is_some_and(|v| v.to_lowercase().contains(needle.as_str()))
                }),
                None => true,
            })
            .collect();

        let total = matching.len();
        let items: Vec<Value> = matching
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .cloned()
            .collect();
        ApiResponse::new(
            200,
            json!({
                "data": items,
                "meta": {
                    "total": total,
                    "page": page,
                    "limit": limit,
                    "totalPages": total.div_ceil(limit),
                }
            }),
        )
    }

    fn stats(&self) -> ApiResponse {
        let state = self.state.borrow();
        let count =
            |pred: fn(&Value) -> bool| state.patients.values().filter(|p| pred(p)).count();
        data(
            200,
            json!({
                "totalPatients": state.patients.len(),
                "activePatients": count(|p| p["isActive"].as_bool().unwrap_or(true)),
                "patientsWithInsurance": count(|p| {
                    p["healthInsurance"]["hasInsurance"].as_bool().unwrap_or(false)
                }),
                "pendingPatients": 0,
            }),
        )
    }

    fn patients(
        &self,
        request: &ApiRequest,
        id: Option<&str>,
        action: Option<&str>,
        query: &BTreeMap<String, String>,
    ) -> ApiResponse {
        let existing = id.and_then(|id| self.state.borrow().patients.get(id).cloned());
        match (request.method, id, action) {
            (Method::Get, None, None) => self.list_patients(query),
            (Method::Get, Some("stats"), None) => self.stats(),
            (Method::Post, None, None) => {
                let body = request.body.clone().unwrap_or(Value::Null);
                if body["dni"].as_str().map_or(true, str::is_empty) {
                    return ApiResponse::new(400, json!({ "message": "dni is required" }));
                }
                let id = self.new_id("patient");
                data(201, self.store_patient(id, &body, None))
            }
            (_, Some(_), _) if existing.is_none() => not_found("Patient", "Paciente"),
            (Method::Get, Some(_), None) => data(200, existing.unwrap_or(Value::Null)),
            (Method::Put, Some(id), None) => {
                let body = request.body.clone().unwrap_or(Value::Null);
                let created_at = existing.map(|p| p["createdAt"].clone());
                data(200, self.store_patient(id.to_string(), &body, created_at))
            }
            (Method::Delete, Some(id), None) => {
                self.state.borrow_mut().patients.remove(id);
                ApiResponse::new(200, json!({ "message": "Patient deleted" }))
            }
            (Method::Patch, Some(id), Some(action @ ("approve" | "toggle-status"))) => {
                let mut state = self.state.borrow_mut();
                let Some(record) = state.patients.get_mut(id) else {
                    return not_found("Patient", "Paciente");
                };
                if action == "approve" {
                    record["status"] = Value::String("APPROVED".into());
                } else {
                    let active = record["isActive"].as_bool().unwrap_or(true);
                    record["isActive"] = Value::Bool(!active);
                }
                data(200, record.clone())
            }
            _ => not_found("Route", "Recurso"),
        }
    }

    fn create_appointment(&self, request: &ApiRequest) -> ApiResponse {
        let body = request.body.clone().unwrap_or(Value::Null);
        let Some(patient_id) = body["patientId"].as_str() else {
            return ApiResponse::new(400, json!({ "message": "patientId is required" }));
        };
        let patient_name = match self.state.borrow().patients.get(patient_id) {
            Some(p) => format!(
                "{} {}",
                p["firstName"].as_str().unwrap_or_default(),
                p["lastName"].as_str().unwrap_or_default()
            ),
            None => return not_found("Patient", "Paciente"),
        };

        let id = self.new_id("appointment");
        let mut record = body.as_object().cloned().unwrap_or_else(Map::new);
        record.insert("id".into(), Value::String(id.clone()));
        record.insert("patientName".into(), Value::String(patient_name));
        record.insert("status".into(), Value::String("scheduled".into()));
        let record = Value::Object(record);
        self.state.borrow_mut().appointments.insert(id, record.clone());
        data(201, record)
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        let Some((segments, query)) = self.route(&request.url) else {
            return Ok(not_found("Route", "Recurso"));
        };
        if request.bearer.is_none() {
            return Ok(ApiResponse::new(401, json!({ "message": "Unauthorized" })));
        }

        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let response = match (request.method, segments.as_slice()) {
            (_, ["patients"]) => self.patients(request, None, None, &query),
            (_, ["patients", id]) => self.patients(request, Some(*id), None, &query),
            (_, ["patients", id, action]) => {
                self.patients(request, Some(*id), Some(*action), &query)
            }
            (Method::Post, ["appointments"]) => self.create_appointment(request),
            _ => not_found("Route", "Recurso"),
        };
        Ok(response)
    }
}

/// The mock backend when `enable_mock_data` is set, otherwise `live`.
pub fn transport_for(config: &ApiConfig, live: Box<dyn Transport>) -> Box<dyn Transport> {
    if config.enable_mock_data {
        Box::new(MockTransport::new(config))
    } else {
        live
    }
}
