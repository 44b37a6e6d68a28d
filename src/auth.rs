use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::api::{ApiClient, Credentials};
use crate::error::{PanelError, PanelResult};
use crate::models::{LoggedInDoctor, Role};
use crate::notify::Notifier;
use crate::session::SessionStore;

#[derive(Deserialize)]
struct DoctorClaims {
    id: String,
}

/// Reads the doctor id claim from the session token.
///
/// Only the payload is read; the signature is left to the backend.
pub fn doctor_id_from_token(token: &str) -> PanelResult<String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<DoctorClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| PanelError::InvalidToken(e.to_string()))?;
    if data.claims.id.is_empty() {
        return Err(PanelError::InvalidToken("empty id claim".to_string()));
    }
    Ok(data.claims.id)
}

/// Authenticates `session`'s role and stores the issued token.
pub async fn login(
    api: &ApiClient,
    session: &SessionStore,
    notifier: &dyn Notifier,
    email: &str,
    password: &str,
) -> PanelResult<()> {
    let result = request_login(api, session, email, password).await;
    match &result {
        Ok(message) => notifier.success(message),
        Err(err) => {
            let message = match err {
                PanelError::Unauthorized { message, .. } => {
                    message.clone().unwrap_or_else(|| "Invalid credentials".to_string())
                }
                other => other.user_message("Login failed"),
            };
            notifier.error(&message);
        }
    }
    result.map(|_| ())
}

async fn request_login(
    api: &ApiClient,
    session: &SessionStore,
    email: &str,
    password: &str,
) -> PanelResult<String> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(PanelError::Validation("Please enter both email and password".to_string()));
    }

    let role = session.role();
    let envelope = api
        .post(role.login_path(), Credentials::Anonymous, &json!({ "email": email, "password": password }))
        .await?;
    let token = envelope
        .optional_field::<String>("token")?
        .filter(|t| !t.is_empty())
        .ok_or_else(|| PanelError::Application(envelope.message_or("Login failed")))?;

    session.set_token(&token)?;
    let storage = session.storage();
    storage.set_active_role(Some(role))?;
    if role == Role::Doctor {
        let user = envelope.optional_field::<LoggedInDoctor>("user")?;
        storage.set_logged_in_doctor(user.as_ref())?;
    }

    info!(role = role.as_str(), "logged in");
    Ok(envelope.message_or("Login successful"))
}

/// Clears every session passed in along with the persisted role data.
pub fn logout(sessions: &[&SessionStore]) -> PanelResult<()> {
    for session in sessions {
        if session.is_authenticated() {
            session.clear()?;
            info!(role = session.role().as_str(), "logged out");
        }
        let storage = session.storage();
        storage.set_active_role(None)?;
        storage.set_logged_in_doctor(None)?;
    }
    Ok(())
}
