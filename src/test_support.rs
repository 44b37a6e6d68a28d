//! In-process fake of the DocSpot backend for store tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::config::PanelConfig;
use crate::error::{PanelError, PanelResult};
use crate::images::ImageHost;
use crate::models::{Address, Appointment, Doctor, DoctorImage, DoctorSummary, PatientSummary};

pub const ADMIN_TOKEN: &str = "admin-token";
pub const ADMIN_EMAIL: &str = "admin@docspot.test";
pub const DOCTOR_EMAIL: &str = "rao@docspot.test";
pub const PASSWORD: &str = "secret";

#[derive(Serialize)]
struct Claims {
    id: String,
}

pub fn doctor_token(id: &str) -> String {
    encode(
        &Header::default(),
        &Claims { id: id.to_string() },
        &EncodingKey::from_secret(b"docspot_test_secret"),
    )
    .expect("encode test token")
}

pub fn doctor(id: &str, availability: bool) -> Doctor {
    Doctor {
        id: id.to_string(),
        name: format!("Dr. {id}"),
        email: format!("{id}@docspot.test"),
        speciality: "General physician".to_string(),
        fees: 300.0,
        address: Address { line1: "12 MG Road".to_string(), line2: String::new() },
        availability,
        ..Default::default()
    }
}

pub fn appointment(id: &str, patient: &str) -> Appointment {
    Appointment {
        id: id.to_string(),
        user_data: PatientSummary { name: patient.to_string(), dob: "1990-04-02".to_string(), ..Default::default() },
        doc_data: DoctorSummary { name: "Dr. d1".to_string(), ..Default::default() },
        slot_date: "14_10_2026".to_string(),
        slot_time: "10:30".to_string(),
        amount: 300.0,
        ..Default::default()
    }
}

pub struct FakeBackend {
    pub doctors: Vec<Doctor>,
    pub admin_appointments: Vec<Appointment>,
    pub doctor_appointments: Vec<Appointment>,
    pub profile: Doctor,
    pub doctor_token: String,
    /// Every authenticated route answers with this status.
    pub fail_status: Option<StatusCode>,
    /// Cancel/complete answer `success: false`.
    pub reject_transitions: bool,
    pub fail_upload: bool,
    /// Delay before answering GET appointment lists.
    pub list_delay: Option<Duration>,
    /// Delay before answering the asset upload.
    pub upload_delay: Option<Duration>,
    pub requests: Vec<String>,
    pub created: Vec<Value>,
    pub uploads: usize,
    pub completed_by: Vec<String>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            doctors: vec![],
            admin_appointments: vec![],
            doctor_appointments: vec![],
            profile: doctor("d1", true),
            doctor_token: doctor_token("d1"),
            fail_status: None,
            reject_transitions: false,
            fail_upload: false,
            list_delay: None,
            upload_delay: None,
            requests: vec![],
            created: vec![],
            uploads: 0,
            completed_by: vec![],
        }
    }
}

pub type Shared = Arc<Mutex<FakeBackend>>;

type Reply = (StatusCode, Json<Value>);

fn reply(status: StatusCode, body: Value) -> Reply {
    (status, Json(body))
}

fn ok(body: Value) -> Reply {
    reply(StatusCode::OK, body)
}

/// Serves `backend` on an ephemeral port; returns the base URL and the shared state.
pub async fn spawn(backend: FakeBackend) -> (String, Shared) {
    let shared: Shared = Arc::new(Mutex::new(backend));
    let app = Router::new()
        .route("/api/admin/login", post(admin_login))
        .route("/api/doctor/login", post(doctor_login))
        .route("/api/admin/all-doctors", get(all_doctors))
        .route("/api/admin/change-availability", post(change_availability))
        .route("/api/admin/appointments", get(admin_appointments))
        .route("/api/admin/appointment-cancel", post(admin_cancel))
        .route("/api/admin/appointment-complete", post(admin_complete))
        .route("/api/admin/dashboard", get(admin_dashboard))
        .route("/api/admin/add-doctor", post(add_doctor))
        .route("/api/doctor/appointments", get(doctor_appointments))
        .route("/api/doctor/appointment-cancel", post(doctor_cancel))
        .route("/api/doctor/appointment-complete", post(doctor_complete))
        .route("/api/doctor/dashboard", get(doctor_dashboard))
        .route("/api/doctor/doctor-profile", get(doctor_profile))
        .route("/api/doctor/update-doctor-profile", post(update_profile))
        .route("/upload", post(upload_image))
        .with_state(shared.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.expect("fake backend");
    });
    (format!("http://{addr}"), shared)
}

pub fn config_for(base_url: &str) -> PanelConfig {
    PanelConfig {
        backend_url: base_url.to_string(),
        asset_upload_url: format!("{base_url}/upload"),
        request_timeout: Duration::from_secs(5),
        ..PanelConfig::default()
    }
}

enum Who {
    Admin,
    Doctor,
}

/// Records the request and checks credentials.
fn guard(state: &mut FakeBackend, path: &str, headers: &HeaderMap, who: Who) -> Result<(), Reply> {
    state.requests.push(path.to_string());
    if let Some(status) = state.fail_status {
        return Err(reply(status, json!({"success": false, "message": "forced failure"})));
    }
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let authorized = match who {
        Who::Admin => bearer == Some(ADMIN_TOKEN),
        Who::Doctor => {
            let dtoken = headers.get("dtoken").and_then(|v| v.to_str().ok());
            bearer == Some(state.doctor_token.as_str()) || dtoken == Some(state.doctor_token.as_str())
        }
    };
    if authorized {
        Ok(())
    } else {
        Err(reply(StatusCode::UNAUTHORIZED, json!({"success": false, "message": "Not Authorized Login Again"})))
    }
}

fn lock(shared: &Shared) -> std::sync::MutexGuard<'_, FakeBackend> {
    shared.lock().expect("fake backend lock")
}

async fn admin_login(State(shared): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut state = lock(&shared);
    state.requests.push("/api/admin/login".to_string());
    if body["email"] == ADMIN_EMAIL && body["password"] == PASSWORD {
        ok(json!({"success": true, "token": ADMIN_TOKEN}))
    } else {
        ok(json!({"success": false, "message": "Invalid credentials"}))
    }
}

async fn doctor_login(State(shared): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut state = lock(&shared);
    state.requests.push("/api/doctor/login".to_string());
    if body["email"] == DOCTOR_EMAIL && body["password"] == PASSWORD {
        let profile = state.profile.clone();
        ok(json!({
            "success": true,
            "message": "Welcome back",
            "token": state.doctor_token,
            "user": {
                "id": profile.id,
                "name": profile.name,
                "email": profile.email,
                "speciality": profile.speciality,
                "image": profile.image
            }
        }))
    } else {
        reply(StatusCode::UNAUTHORIZED, json!({"success": false, "message": "Invalid credentials"}))
    }
}

async fn all_doctors(State(shared): State<Shared>, headers: HeaderMap) -> Reply {
    let mut state = lock(&shared);
    if let Err(r) = guard(&mut state, "/api/admin/all-doctors", &headers, Who::Admin) {
        return r;
    }
    ok(json!({"success": true, "doctors": state.doctors}))
}

async fn change_availability(State(shared): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut state = lock(&shared);
    if let Err(r) = guard(&mut state, "/api/admin/change-availability", &headers, Who::Admin) {
        return r;
    }
    let doc_id = body["docId"].as_str().unwrap_or_default().to_string();
    match state.doctors.iter_mut().find(|d| d.id == doc_id) {
        Some(doctor) => {
            doctor.availability = !doctor.availability;
            ok(json!({"success": true, "message": "Availability Changed"}))
        }
        None => ok(json!({"success": false, "message": "Doctor not found"})),
    }
}

async fn list_delay(shared: &Shared) {
    let delay = lock(shared).list_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

async fn admin_appointments(State(shared): State<Shared>, headers: HeaderMap) -> Reply {
    list_delay(&shared).await;
    let mut state = lock(&shared);
    if let Err(r) = guard(&mut state, "/api/admin/appointments", &headers, Who::Admin) {
        return r;
    }
    ok(json!({"success": true, "appointments": state.admin_appointments}))
}

fn transition(list: &mut [Appointment], id: &str, cancel: bool) -> Reply {
    match list.iter_mut().find(|a| a.id == id) {
        Some(appt) if !appt.cancelled && !appt.is_completed => {
            appt.cancelled = cancel;
            appt.is_completed = !cancel;
            let msg = if cancel { "Appointment Cancelled" } else { "Appointment Completed" };
            ok(json!({"success": true, "message": msg}))
        }
        Some(_) => ok(json!({"success": false, "message": "Appointment already settled"})),
        None => ok(json!({"success": false, "message": "Appointment not found"})),
    }
}

async fn admin_cancel(State(shared): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut state = lock(&shared);
    if let Err(r) = guard(&mut state, "/api/admin/appointment-cancel", &headers, Who::Admin) {
        return r;
    }
    if state.reject_transitions {
        return ok(json!({"success": false, "message": "Cancellation rejected"}));
    }
    let id = body["appointmentId"].as_str().unwrap_or_default().to_string();
    transition(&mut state.admin_appointments, &id, true)
}

async fn admin_complete(State(shared): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut state = lock(&shared);
    if let Err(r) = guard(&mut state, "/api/admin/appointment-complete", &headers, Who::Admin) {
        return r;
    }
    if state.reject_transitions {
        return ok(json!({"success": false, "message": "Completion rejected"}));
    }
    let id = body["appointmentId"].as_str().unwrap_or_default().to_string();
    transition(&mut state.admin_appointments, &id, false)
}

fn latest(list: &[Appointment]) -> Vec<Appointment> {
    list.iter().rev().take(5).cloned().collect()
}

fn patient_count(list: &[Appointment]) -> usize {
    list.iter().map(|a| a.user_data.name.as_str()).collect::<HashSet<_>>().len()
}

async fn admin_dashboard(State(shared): State<Shared>, headers: HeaderMap) -> Reply {
    let mut state = lock(&shared);
    if let Err(r) = guard(&mut state, "/api/admin/dashboard", &headers, Who::Admin) {
        return r;
    }
    ok(json!({
        "success": true,
        "dashData": {
            "doctors": state.doctors.len(),
            "appointments": state.admin_appointments.len(),
            "patients": patient_count(&state.admin_appointments),
            "latestAppointments": latest(&state.admin_appointments)
        }
    }))
}

async fn add_doctor(State(shared): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut state = lock(&shared);
    if let Err(r) = guard(&mut state, "/api/admin/add-doctor", &headers, Who::Admin) {
        return r;
    }
    if body["degree"].as_str().unwrap_or_default().is_empty() {
        return reply(StatusCode::BAD_REQUEST, json!({"success": false, "missing": ["degree"]}));
    }
    state.created.push(body);
    ok(json!({"success": true, "message": "Doctor Added"}))
}

async fn doctor_appointments(State(shared): State<Shared>, headers: HeaderMap) -> Reply {
    list_delay(&shared).await;
    let mut state = lock(&shared);
    if let Err(r) = guard(&mut state, "/api/doctor/appointments", &headers, Who::Doctor) {
        return r;
    }
    ok(json!({"success": true, "appointments": state.doctor_appointments}))
}

async fn doctor_cancel(State(shared): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut state = lock(&shared);
    if let Err(r) = guard(&mut state, "/api/doctor/appointment-cancel", &headers, Who::Doctor) {
        return r;
    }
    if state.reject_transitions {
        return ok(json!({"success": false, "message": "Cancellation rejected"}));
    }
    let id = body["appointmentId"].as_str().unwrap_or_default().to_string();
    transition(&mut state.doctor_appointments, &id, true)
}

async fn doctor_complete(State(shared): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut state = lock(&shared);
    if let Err(r) = guard(&mut state, "/api/doctor/appointment-complete", &headers, Who::Doctor) {
        return r;
    }
    if let Some(doc_id) = body["docId"].as_str() {
        state.completed_by.push(doc_id.to_string());
    }
    if state.reject_transitions {
        return ok(json!({"success": false, "message": "Completion rejected"}));
    }
    let id = body["appointmentId"].as_str().unwrap_or_default().to_string();
    transition(&mut state.doctor_appointments, &id, false)
}

async fn doctor_dashboard(State(shared): State<Shared>, headers: HeaderMap) -> Reply {
    let mut state = lock(&shared);
    if let Err(r) = guard(&mut state, "/api/doctor/dashboard", &headers, Who::Doctor) {
        return r;
    }
    let earnings: f64 = state
        .doctor_appointments
        .iter()
        .filter(|a| a.is_completed)
        .map(|a| a.amount)
        .sum();
    ok(json!({
        "success": true,
        "dashData": {
            "earnings": earnings,
            "appointments": state.doctor_appointments.len(),
            "patients": patient_count(&state.doctor_appointments),
            "latestAppointments": latest(&state.doctor_appointments)
        }
    }))
}

async fn doctor_profile(State(shared): State<Shared>, headers: HeaderMap) -> Reply {
    let mut state = lock(&shared);
    if let Err(r) = guard(&mut state, "/api/doctor/doctor-profile", &headers, Who::Doctor) {
        return r;
    }
    ok(json!({"success": true, "profileData": state.profile}))
}

async fn update_profile(State(shared): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut state = lock(&shared);
    if let Err(r) = guard(&mut state, "/api/doctor/update-doctor-profile", &headers, Who::Doctor) {
        return r;
    }
    let Some(fees) = body["fees"].as_f64() else {
        return ok(json!({"success": false, "message": "fees must be numeric"}));
    };
    state.profile.fees = fees;
    if let Ok(address) = serde_json::from_value::<Address>(body["address"].clone()) {
        state.profile.address = address;
    }
    if let Some(availability) = body["availability"].as_bool() {
        state.profile.availability = availability;
    }
    ok(json!({"success": true, "message": "Profile Updated"}))
}

async fn upload_image(State(shared): State<Shared>, headers: HeaderMap, body: Bytes) -> Reply {
    let delay = lock(&shared).upload_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let mut state = lock(&shared);
    state.requests.push("/upload".to_string());
    let multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));
    let has_preset = String::from_utf8_lossy(&body).contains("upload_preset");
    if state.fail_upload || !multipart || !has_preset {
        return reply(StatusCode::BAD_REQUEST, json!({"error": {"message": "upload rejected"}}));
    }
    state.uploads += 1;
    let n = state.uploads;
    ok(json!({"secure_url": format!("https://assets.docspot.test/doctors/{n}.png")}))
}

/// Image host double that never touches the network.
#[derive(Default)]
pub struct StubImageHost {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StubImageHost {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageHost for StubImageHost {
    async fn upload(&self, image: &DoctorImage) -> PanelResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(PanelError::Upload("stub failure".to_string()))
        } else {
            Ok(format!("https://assets.docspot.test/{}", image.file_name))
        }
    }
}
