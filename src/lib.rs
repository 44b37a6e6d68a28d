//! DocSpot panel: admin and doctor front office for the DocSpot booking backend.
//!
//! Client-side state orchestration over the backend's REST API:
//! - Sessions: one opaque token per role, written through to Sled
//! - Stores: admin (roster, appointments, dashboard, onboarding) and doctor
//!   (own appointments, dashboard, profile)
//! - Formatting: slot dates, times, ages and amounts for display

pub mod admin;
pub mod api;
pub mod appointments;
pub mod auth;
pub mod config;
pub mod doctor;
pub mod error;
pub mod format;
pub mod images;
pub mod logging;
pub mod models;
pub mod notify;
pub mod panel;
pub mod session;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ErrorKind, PanelError, PanelResult};
pub use panel::Panel;
