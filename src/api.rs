//! HTTP layer over the DocSpot backend.
//!
//! Every endpoint answers with the envelope `{success, message?, ...payload}`.
//! [`ApiClient`] turns that shape (plus status codes and transport failures)
//! into `PanelResult<Envelope>`, so stores only deal with typed payloads.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::PanelConfig;
use crate::error::{PanelError, PanelResult};
use crate::models::Role;

pub mod endpoints {
    pub const ADMIN_ALL_DOCTORS: &str = "/api/admin/all-doctors";
    pub const ADMIN_CHANGE_AVAILABILITY: &str = "/api/admin/change-availability";
    pub const ADMIN_APPOINTMENTS: &str = "/api/admin/appointments";
    pub const ADMIN_APPOINTMENT_CANCEL: &str = "/api/admin/appointment-cancel";
    pub const ADMIN_APPOINTMENT_COMPLETE: &str = "/api/admin/appointment-complete";
    pub const ADMIN_DASHBOARD: &str = "/api/admin/dashboard";
    pub const ADMIN_ADD_DOCTOR: &str = "/api/admin/add-doctor";
    pub const DOCTOR_APPOINTMENTS: &str = "/api/doctor/appointments";
    pub const DOCTOR_APPOINTMENT_CANCEL: &str = "/api/doctor/appointment-cancel";
    pub const DOCTOR_APPOINTMENT_COMPLETE: &str = "/api/doctor/appointment-complete";
    pub const DOCTOR_DASHBOARD: &str = "/api/doctor/dashboard";
    pub const DOCTOR_PROFILE: &str = "/api/doctor/doctor-profile";
    pub const DOCTOR_UPDATE_PROFILE: &str = "/api/doctor/update-doctor-profile";
}

/// How a request authenticates.
#[derive(Clone, Copy)]
pub enum Credentials<'a> {
    Anonymous,
    Session { role: Role, token: &'a str },
}

// Tokens never reach logs.
impl fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Anonymous => f.write_str("Anonymous"),
            Credentials::Session { role, .. } => f
                .debug_struct("Session")
                .field("role", role)
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

impl Credentials<'_> {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match *self {
            Credentials::Anonymous => request,
            Credentials::Session { role: Role::Admin, token } => request.bearer_auth(token),
            // Doctor routes read either the bearer credential or the dtoken header.
            Credentials::Session { role: Role::Doctor, token } => {
                request.bearer_auth(token).header("dtoken", token)
            }
        }
    }
}

/// Successful (`success: true`) response body.
#[derive(Debug, Clone)]
pub struct Envelope {
    body: Value,
}

impl Envelope {
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str).filter(|m| !m.is_empty())
    }

    pub fn message_or(&self, fallback: &str) -> String {
        self.message().unwrap_or(fallback).to_string()
    }

    /// Typed payload stored under `key`.
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> PanelResult<T> {
        match self.body.get(key) {
            Some(value) if !value.is_null() => Ok(serde_json::from_value(value.clone())?),
            _ => Err(PanelError::Unexpected(format!("response is missing '{key}'"))),
        }
    }

    /// Like [`Envelope::field`], but absent or null is `None`.
    pub fn optional_field<T: DeserializeOwned>(&self, key: &str) -> PanelResult<Option<T>> {
        match self.body.get(key) {
            Some(value) if !value.is_null() => Ok(Some(serde_json::from_value(value.clone())?)),
            _ => Ok(None),
        }
    }
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    upload_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: &PanelConfig) -> PanelResult<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            upload_timeout: config.upload_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn upload_timeout(&self) -> Duration {
        self.upload_timeout
    }

    pub async fn get(&self, path: &str, credentials: Credentials<'_>) -> PanelResult<Envelope> {
        debug!(method = "GET", path, "backend request");
        let request = credentials.apply(self.http.get(self.url(path)));
        read_envelope(request.send().await?).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        credentials: Credentials<'_>,
        body: &B,
    ) -> PanelResult<Envelope> {
        self.post_with_timeout(path, credentials, body, None).await
    }

    /// POST with a per-request timeout overriding the client default.
    pub async fn post_with_timeout<B: Serialize + ?Sized>(
        &self,
        path: &str,
        credentials: Credentials<'_>,
        body: &B,
        timeout: Option<Duration>,
    ) -> PanelResult<Envelope> {
        debug!(method = "POST", path, "backend request");
        let mut request = credentials.apply(self.http.post(self.url(path))).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        read_envelope(request.send().await?).await
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn read_envelope(response: Response) -> PanelResult<Envelope> {
    let status = response.status();
    let text = response.text().await?;
    let body: Option<Value> = serde_json::from_str(&text).ok();
    interpret(status, body)
}

/// Maps status + body onto the error taxonomy.
fn interpret(status: StatusCode, body: Option<Value>) -> PanelResult<Envelope> {
    let message = body
        .as_ref()
        .and_then(|b| b.get("message"))
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(PanelError::Unauthorized { status: status.as_u16(), message });
    }

    if !status.is_success() {
        if status == StatusCode::BAD_REQUEST {
            let missing: Option<Vec<String>> = body
                .as_ref()
                .and_then(|b| b.get("missing"))
                .and_then(|m| serde_json::from_value(m.clone()).ok());
            if let Some(missing) = missing.filter(|m| !m.is_empty()) {
                return Err(PanelError::Application(format!(
                    "Missing required fields: {}",
                    missing.join(", ")
                )));
            }
        }
        return Err(match message {
            Some(msg) => PanelError::Application(msg),
            None => PanelError::Unexpected(format!("Error: {}", status.as_u16())),
        });
    }

    let Some(body) = body else {
        return Err(PanelError::Unexpected("response body is not JSON".to_string()));
    };
    if body.get("success").and_then(Value::as_bool) == Some(true) {
        Ok(Envelope { body })
    } else {
        Err(match message {
            Some(msg) => PanelError::Application(msg),
            None => PanelError::Unexpected("request was not successful".to_string()),
        })
    }
}
