//! Application wiring: one storage handle, both sessions, both stores.
//!
//! Created once at start-up and passed to whatever renders the panel; nothing
//! here is global.

use std::sync::Arc;

use tracing::info;

use crate::admin::AdminStore;
use crate::api::ApiClient;
use crate::auth;
use crate::config::PanelConfig;
use crate::doctor::DoctorStore;
use crate::error::PanelResult;
use crate::images::{HttpImageHost, ImageHost};
use crate::models::{LoggedInDoctor, Role};
use crate::notify::Notifier;
use crate::session::SessionStore;
use crate::storage::TokenStorage;

pub struct Panel {
    config: PanelConfig,
    api: Arc<ApiClient>,
    storage: TokenStorage,
    admin_session: Arc<SessionStore>,
    doctor_session: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
    pub admin: AdminStore,
    pub doctor: DoctorStore,
}

impl Panel {
    /// Opens the token database under `config.state_dir`.
    pub fn open(config: PanelConfig, notifier: Arc<dyn Notifier>) -> PanelResult<Self> {
        let storage = TokenStorage::open(&config.state_dir)?;
        Self::with_storage(config, storage, notifier)
    }

    pub fn with_storage(
        config: PanelConfig,
        storage: TokenStorage,
        notifier: Arc<dyn Notifier>,
    ) -> PanelResult<Self> {
        let api = Arc::new(ApiClient::new(&config)?);
        let images: Arc<dyn ImageHost> = Arc::new(HttpImageHost::new(
            &api,
            config.asset_upload_url.clone(),
            config.upload_preset.clone(),
        ));
        Self::assemble(config, api, storage, images, notifier)
    }

    /// Full control over the image host.
    pub fn assemble(
        config: PanelConfig,
        api: Arc<ApiClient>,
        storage: TokenStorage,
        images: Arc<dyn ImageHost>,
        notifier: Arc<dyn Notifier>,
    ) -> PanelResult<Self> {
        let admin_session = Arc::new(SessionStore::load(Role::Admin, storage.clone())?);
        let doctor_session = Arc::new(SessionStore::load(Role::Doctor, storage.clone())?);
        let admin = AdminStore::new(api.clone(), admin_session.clone(), images, notifier.clone());
        let doctor = DoctorStore::new(api.clone(), doctor_session.clone(), notifier.clone());
        info!(backend = %config.backend_url, "panel ready");
        Ok(Self { config, api, storage, admin_session, doctor_session, notifier, admin, doctor })
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn session(&self, role: Role) -> &SessionStore {
        match role {
            Role::Admin => &self.admin_session,
            Role::Doctor => &self.doctor_session,
        }
    }

    /// Role last logged in, if its session is still held.
    pub fn active_role(&self) -> PanelResult<Option<Role>> {
        Ok(self.storage.active_role()?.filter(|role| self.session(*role).is_authenticated()))
    }

    pub fn logged_in_doctor(&self) -> PanelResult<Option<LoggedInDoctor>> {
        self.storage.logged_in_doctor()
    }

    pub async fn login(&self, role: Role, email: &str, password: &str) -> PanelResult<()> {
        auth::login(&self.api, self.session(role), self.notifier.as_ref(), email, password).await
    }

    pub fn logout(&self) -> PanelResult<()> {
        auth::logout(&[&self.admin_session, &self.doctor_session])?;
        self.notifier.success("Logged out");
        Ok(())
    }
}
