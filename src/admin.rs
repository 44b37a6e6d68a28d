//! Admin domain store: doctor roster, all appointments, dashboard and doctor
//! onboarding.

use std::sync::Arc;

use chrono::{Local, Utc};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::api::{endpoints, ApiClient, Credentials, Envelope};
use crate::appointments::{apply_tentative, restore, snapshot, Transition};
use crate::error::{PanelError, PanelResult};
use crate::format::empty_slot_map;
use crate::images::ImageHost;
use crate::models::{
    Address, AdminDashboard, Appointment, Doctor, DoctorImage, NewDoctorForm, NewDoctorRecord, Role,
};
use crate::notify::{report_failure, Notifier};
use crate::session::SessionStore;

/// Days of empty slots a new doctor starts with.
pub const INITIAL_SLOT_DAYS: u32 = 7;

#[derive(Debug, Clone, Default)]
pub struct AdminState {
    pub doctors: Vec<Doctor>,
    pub appointments: Vec<Appointment>,
    pub dashboard: Option<AdminDashboard>,
    /// Roster request in flight.
    pub is_loading: bool,
}

pub struct AdminStore {
    api: Arc<ApiClient>,
    session: Arc<SessionStore>,
    images: Arc<dyn ImageHost>,
    notifier: Arc<dyn Notifier>,
    state: RwLock<AdminState>,
}

impl AdminStore {
    pub fn new(
        api: Arc<ApiClient>,
        session: Arc<SessionStore>,
        images: Arc<dyn ImageHost>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        debug_assert_eq!(session.role(), Role::Admin);
        Self { api, session, images, notifier, state: RwLock::new(AdminState::default()) }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn snapshot(&self) -> AdminState {
        self.state.read().await.clone()
    }

    pub async fn doctors(&self) -> Vec<Doctor> {
        self.state.read().await.doctors.clone()
    }

    pub async fn appointments(&self) -> Vec<Appointment> {
        self.state.read().await.appointments.clone()
    }

    pub async fn dashboard(&self) -> Option<AdminDashboard> {
        self.state.read().await.dashboard.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    /// Replaces the held roster.
    #[instrument(skip(self))]
    pub async fn fetch_doctors(&self) -> PanelResult<Vec<Doctor>> {
        self.state.write().await.is_loading = true;
        let result = self.request_doctors().await;
        let mut state = self.state.write().await;
        state.is_loading = false;
        match result {
            Ok(doctors) => {
                info!(count = doctors.len(), "roster fetched");
                state.doctors = doctors.clone();
                Ok(doctors)
            }
            Err(err) => {
                drop(state);
                self.fail("fetch_doctors", &err, "Failed to fetch doctors. Please try again.");
                Err(err)
            }
        }
    }

    async fn request_doctors(&self) -> PanelResult<Vec<Doctor>> {
        let token = self.session.require_token()?;
        let envelope = self.api.get(endpoints::ADMIN_ALL_DOCTORS, self.credentials(&token)).await?;
        envelope.field("doctors")
    }

    /// Flips availability server-side, then refetches the roster. No local
    /// mutation happens before the backend confirms.
    #[instrument(skip(self))]
    pub async fn toggle_availability(&self, doctor_id: &str) -> PanelResult<()> {
        match self.request_toggle(doctor_id).await {
            Ok(envelope) => {
                self.notifier.success(&envelope.message_or("Availability changed"));
                // Failures are reported by the refetch itself.
                let _ = self.fetch_doctors().await;
                Ok(())
            }
            Err(err) => {
                self.fail(
                    "toggle_availability",
                    &err,
                    "Failed to change availability. Please try again.",
                );
                Err(err)
            }
        }
    }

    /// Replaces the held appointment list wholesale.
    #[instrument(skip(self))]
    pub async fn fetch_appointments(&self) -> PanelResult<Vec<Appointment>> {
        match self.request_appointments().await {
            Ok(appointments) => {
                info!(count = appointments.len(), "appointments fetched");
                self.state.write().await.appointments = appointments.clone();
                Ok(appointments)
            }
            Err(err) => {
                self.fail("fetch_appointments", &err, "Failed to fetch appointments. Please try again.");
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

    /// Two-phase transition:
    /// 1. apply it to the held appointment list and dashboard entries;
    /// 2. POST it;
    /// 3. on either outcome refetch the list (and the dashboard when one is
    ///    held) so the backend's state replaces the tentative one. A rejected
    ///    transition whose refetch was skipped or failed is undone locally.
    ///
    /// Returns the outcome of step 2.
    #[instrument(skip(self))]
    pub async fn transition_appointment(&self, appointment_id: &str, transition: Transition) -> PanelResult<()> {
        let token = match self.session.require_token() {
            Ok(token) => token,
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
            Transition::Cancel => endpoints::ADMIN_APPOINTMENT_CANCEL,
            Transition::Complete => endpoints::ADMIN_APPOINTMENT_COMPLETE,
        };
        let result = self
            .api
            .post(path, self.credentials(&token), &json!({ "appointmentId": appointment_id }))
            .await;

        let outcome = match result {
            Ok(envelope) => {
                self.notifier.success(&envelope.message_or("Appointment updated"));
                Ok(())
            }
            Err(err) => {
                self.fail(transition.verb(), &err, transition.fallback_message());
                Err(err)
            }
        };

        // Re-synchronize regardless of outcome; skipped when the session was just cleared.
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

    /// Replaces the held dashboard summary.
    #[instrument(skip(self))]
    pub async fn fetch_dashboard(&self) -> PanelResult<AdminDashboard> {
        match self.request_dashboard().await {
            Ok(dashboard) => {
                self.state.write().await.dashboard = Some(dashboard.clone());
                Ok(dashboard)
            }
            Err(err) => {
                self.fail("fetch_dashboard", &err, "Failed to fetch dashboard data. Please try again.");
                Err(err)
            }
        }
    }

    /// Onboards a doctor: validates locally, uploads the portrait to the
    /// image host, then posts the full record. Nothing reaches the network
    /// when validation fails, and the record is never posted when the upload
    /// fails.
    #[instrument(skip(self, form, image), fields(email = %form.email))]
    pub async fn add_doctor(&self, form: &NewDoctorForm, image: Option<&DoctorImage>) -> PanelResult<()> {
        match self.submit_doctor(form, image).await {
            Ok(message) => {
                info!("doctor added");
                self.notifier.success(&message);
                Ok(())
            }
            Err(err) => {
                self.fail("add_doctor", &err, "Failed to add doctor");
                Err(err)
            }
        }
    }

    async fn submit_doctor(&self, form: &NewDoctorForm, image: Option<&DoctorImage>) -> PanelResult<String> {
        let token = self.session.require_token()?;
        let image = image
            .filter(|img| !img.bytes.is_empty())
            .ok_or_else(|| PanelError::Validation("Please upload doctor image".to_string()))?;
        let fees = validate_form(form)?;

        let image_url = self.images.upload(image).await?;
        let record = build_record(form, fees, image_url);

        let envelope = self
            .api
            .post_with_timeout(
                endpoints::ADMIN_ADD_DOCTOR,
                self.credentials(&token),
                &record,
                Some(self.api.upload_timeout()),
            )
            .await?;
        Ok(envelope.message_or("Doctor added successfully!"))
    }

    async fn request_toggle(&self, doctor_id: &str) -> PanelResult<Envelope> {
        let token = self.session.require_token()?;
        self.api
            .post(
                endpoints::ADMIN_CHANGE_AVAILABILITY,
                self.credentials(&token),
                &json!({ "docId": doctor_id }),
            )
            .await
    }

    async fn request_appointments(&self) -> PanelResult<Vec<Appointment>> {
        let token = self.session.require_token()?;
        let envelope = self.api.get(endpoints::ADMIN_APPOINTMENTS, self.credentials(&token)).await?;
        envelope.field("appointments")
    }

    async fn request_dashboard(&self) -> PanelResult<AdminDashboard> {
        let token = self.session.require_token()?;
        let envelope = self.api.get(endpoints::ADMIN_DASHBOARD, self.credentials(&token)).await?;
        envelope.field("dashData")
    }

    fn credentials<'a>(&self, token: &'a str) -> Credentials<'a> {
        Credentials::Session { role: Role::Admin, token }
    }

    fn fail(&self, operation: &str, err: &PanelError, fallback: &str) {
        report_failure(&self.session, self.notifier.as_ref(), operation, err, fallback);
    }
}

/// Checks the required fields; returns the parsed fees.
pub fn validate_form(form: &NewDoctorForm) -> PanelResult<f64> {
    let required = [
        &form.name,
        &form.email,
        &form.password,
        &form.experience,
        &form.fees,
        &form.about,
        &form.speciality,
        &form.degree,
        &form.address1,
    ];
    if required.iter().any(|field| field.trim().is_empty()) {
        return Err(PanelError::Validation("Please fill in all required fields".to_string()));
    }
    match form.fees.trim().parse::<f64>() {
        Ok(fees) if fees.is_finite() && fees >= 0.0 => Ok(fees),
        _ => Err(PanelError::Validation("Fees must be a number".to_string())),
    }
}

fn build_record(form: &NewDoctorForm, fees: f64, image_url: String) -> NewDoctorRecord {
    NewDoctorRecord {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_lowercase(),
        password: form.password.clone(),
        image: image_url,
        speciality: form.speciality.clone(),
        degree: form.degree.trim().to_string(),
        experience: form.experience.clone(),
        about: form.about.trim().to_string(),
        availability: true,
        fees,
        address: Address {
            line1: form.address1.trim().to_string(),
            line2: form.address2.trim().to_string(),
        },
        date: Utc::now().timestamp_millis(),
        slots_booked: empty_slot_map(Local::now().date_naive(), INITIAL_SLOT_DAYS),
    }
}
