//! Doctor domain store, scoped to the logged-in doctor.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::api::{endpoints, ApiClient, Credentials, Envelope};
use crate::appointments::{apply_tentative, restore, snapshot, Transition};
use crate::auth::doctor_id_from_token;
use crate::error::{PanelError, PanelResult};
use crate::models::{Address, Appointment, Doctor, DoctorDashboard, ProfileUpdate, Role};
use crate::notify::{report_failure, Notifier};
use crate::session::SessionStore;

#[derive(Debug, Clone, Default)]
pub struct DoctorState {
    pub appointments: Vec<Appointment>,
    pub dashboard: Option<DoctorDashboard>,
    pub profile: Option<Doctor>,
}

/// Edit buffer for the mutable part of the profile. Discarded or committed
/// through [`DoctorStore::update_profile`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDraft {
    pub fees: String,
    pub address: Address,
    pub availability: bool,
}

impl ProfileDraft {
    pub fn from_profile(profile: &Doctor) -> Self {
        Self {
            fees: profile.fees.to_string(),
            address: profile.address.clone(),
            availability: profile.availability,
        }
    }

    pub fn into_update(self) -> PanelResult<ProfileUpdate> {
        let fees = self
            .fees
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .ok_or_else(|| PanelError::Validation("Fees must be a number".to_string()))?;
        Ok(ProfileUpdate { fees, address: self.address, availability: self.availability })
    }
}

pub struct DoctorStore {
    api: Arc<ApiClient>,
    session: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
    state: RwLock<DoctorState>,
}

impl DoctorStore {
    pub fn new(api: Arc<ApiClient>, session: Arc<SessionStore>, notifier: Arc<dyn Notifier>) -> Self {
        debug_assert_eq!(session.role(), Role::Doctor);
        Self { api, session, notifier, state: RwLock::new(DoctorState::default()) }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn snapshot(&self) -> DoctorState {
        self.state.read().await.clone()
    }

    pub async fn appointments(&self) -> Vec<Appointment> {
        self.state.read().await.appointments.clone()
    }

    pub async fn dashboard(&self) -> Option<DoctorDashboard> {
        self.state.read().await.dashboard.clone()
    }

    pub async fn profile(&self) -> Option<Doctor> {
        self.state.read().await.profile.clone()
    }

    /// Draft seeded from the held profile.
    pub async fn edit_profile(&self) -> Option<ProfileDraft> {
        self.state.read().await.profile.as_ref().map(ProfileDraft::from_profile)
    }

    #[instrument(skip(self))]
    pub async fn fetch_appointments(&self) -> PanelResult<Vec<Appointment>> {
        match self.request_field::<Vec<Appointment>>(endpoints::DOCTOR_APPOINTMENTS, "appointments").await {
            Ok(appointments) => {
                info!(count = appointments.len(), "appointments fetched");
                self.state.write().await.appointments = appointments.clone();
                Ok(appointments)
            }
            Err(err) => {
                self.fail("fetch_appointments", &err, "Failed to fetch appointments");
                Err(err)
            }
        }
    }

    pub async fn cancel_appointment(&self, appointment_id: &str) -> PanelResult<()> {
        self.transition_appointment(appointment_id, Transition::Cancel).await
    }

    pub async fn complete_appointment(&self, appointment_id: &str) -> PanelResult<()> {
        self.transition_appointment(appointment_id, Transition::Complete).await
    }

    /// Same two-phase operation as the admin store: tentative local
    /// transition, POST, then refetch (list, and dashboard when held) on
    /// either outcome. Completion also carries the doctor id from the token.
    #[instrument(skip(self))]
    pub async fn transition_appointment(&self, appointment_id: &str, transition: Transition) -> PanelResult<()> {
        let (token, body) = match self.transition_body(appointment_id, transition) {
            Ok(prepared) => prepared,
            Err(err) => {
                self.fail(transition.verb(), &err, transition.fallback_message());
                return Err(err);
            }
        };

        let (saved, saved_latest) = {
            let mut state = self.state.write().await;
            let saved = snapshot(&state.appointments, appointment_id);
            apply_tentative(&mut state.appointments, appointment_id, transition);
            let saved_latest = state.dashboard.as_mut().map(|dashboard| {
                let saved = snapshot(&dashboard.latest_appointments, appointment_id);
                apply_tentative(&mut dashboard.latest_appointments, appointment_id, transition);
                saved
            });
            (saved, saved_latest)
        };

        let path = match transition {
            Transition::Cancel => endpoints::DOCTOR_APPOINTMENT_CANCEL,
            Transition::Complete => endpoints::DOCTOR_APPOINTMENT_COMPLETE,
        };
        let outcome = match self.api.post(path, self.credentials(&token), &body).await {
            Ok(envelope) => {
                self.notifier.success(&envelope.message_or("Appointment updated"));
                Ok(())
            }
            Err(err) => {
                self.fail(transition.verb(), &err, transition.fallback_message());
                Err(err)
            }
        };

        let mut list_synced = false;
        let mut dashboard_synced = false;
        if self.session.is_authenticated() {
            list_synced = self.fetch_appointments().await.is_ok();
            if saved_latest.is_some() {
                dashboard_synced = self.fetch_dashboard().await.is_ok();
            }
        }
        // Rejected and not re-synchronized: put the held entries back.
        if outcome.is_err() {
            let mut state = self.state.write().await;
            if !list_synced {
                restore(&mut state.appointments, &saved);
            }
            if let (false, Some(saved_latest), Some(dashboard)) =
                (dashboard_synced, saved_latest.as_ref(), state.dashboard.as_mut())
            {
                restore(&mut dashboard.latest_appointments, saved_latest);
            }
        }
        outcome
    }

    fn transition_body(&self, appointment_id: &str, transition: Transition) -> PanelResult<(String, serde_json::Value)> {
        let token = self.session.require_token()?;
        let body = match transition {
            Transition::Cancel => json!({ "appointmentId": appointment_id }),
            Transition::Complete => {
                let doc_id = doctor_id_from_token(&token)?;
                json!({ "docId": doc_id, "appointmentId": appointment_id })
            }
        };
        Ok((token, body))
    }

    #[instrument(skip(self))]
    pub async fn fetch_dashboard(&self) -> PanelResult<DoctorDashboard> {
        match self.request_field::<DoctorDashboard>(endpoints::DOCTOR_DASHBOARD, "dashData").await {
            Ok(dashboard) => {
                self.state.write().await.dashboard = Some(dashboard.clone());
                Ok(dashboard)
            }
            Err(err) => {
                self.fail("fetch_dashboard", &err, "Failed to fetch dashboard data");
                Err(err)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> PanelResult<Doctor> {
        match self.request_field::<Doctor>(endpoints::DOCTOR_PROFILE, "profileData").await {
            Ok(profile) => {
                self.state.write().await.profile = Some(profile.clone());
                Ok(profile)
            }
            Err(err) => {
                self.fail("fetch_profile", &err, "Failed to fetch profile data");
                Err(err)
            }
        }
    }

    /// Posts the mutable subset, then refetches the full profile. The caller
    /// leaves edit mode only on `Ok`.
    #[instrument(skip(self, update), fields(fees = update.fees))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> PanelResult<()> {
        match self.request_update(update).await {
            Ok(envelope) => {
                self.notifier.success(&envelope.message_or("Profile updated successfully"));
                let _ = self.fetch_profile().await;
                Ok(())
            }
            Err(err) => {
                self.fail("update_profile", &err, "Failed to update profile data");
                Err(err)
            }
        }
    }

    /// Validates and commits a draft.
    pub async fn commit_draft(&self, draft: ProfileDraft) -> PanelResult<()> {
        match draft.into_update() {
            Ok(update) => self.update_profile(&update).await,
            Err(err) => {
                self.fail("update_profile", &err, "Failed to update profile data");
                Err(err)
            }
        }
    }

    async fn request_update(&self, update: &ProfileUpdate) -> PanelResult<Envelope> {
        let token = self.session.require_token()?;
        self.api
            .post(endpoints::DOCTOR_UPDATE_PROFILE, self.credentials(&token), update)
            .await
    }

    async fn request_field<T: serde::de::DeserializeOwned>(&self, path: &str, key: &str) -> PanelResult<T> {
        let token = self.session.require_token()?;
        let envelope = self.api.get(path, self.credentials(&token)).await?;
        envelope.field(key)
    }

    fn credentials<'a>(&self, token: &'a str) -> Credentials<'a> {
        Credentials::Session { role: Role::Doctor, token }
    }

    fn fail(&self, operation: &str, err: &PanelError, fallback: &str) {
        report_failure(&self.session, self.notifier.as_ref(), operation, err, fallback);
    }
}
