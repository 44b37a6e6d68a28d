//! Tentative appointment transitions.
//!
//! Cancel and complete run in two phases: the transition is applied to the
//! locally held entries first, then the request is issued, and on either
//! outcome the store re-synchronizes from the backend. This module owns the
//! first phase.

use crate::models::Appointment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Cancel,
    Complete,
}

impl Transition {
    pub fn verb(self) -> &'static str {
        match self {
            Transition::Cancel => "cancel",
            Transition::Complete => "complete",
        }
    }

    pub(crate) fn fallback_message(self) -> &'static str {
        match self {
            Transition::Cancel => "Failed to cancel appointment. Please try again.",
            Transition::Complete => "Failed to complete appointment. Please try again.",
        }
    }

    /// Sets the flags for this transition. Leaves both flags mutually exclusive.
    pub fn apply(self, appointment: &mut Appointment) {
        match self {
            Transition::Cancel => {
                appointment.cancelled = true;
                appointment.is_completed = false;
            }
            Transition::Complete => {
                appointment.is_completed = true;
                appointment.cancelled = false;
            }
        }
    }
}

/// Applies `transition` to the pending entry with `id`. Settled entries are
/// left alone; the backend decides what happens to them. Returns whether an
/// entry changed.
pub fn apply_tentative(appointments: &mut [Appointment], id: &str, transition: Transition) -> bool {
    let mut changed = false;
    for appointment in appointments.iter_mut().filter(|a| a.id == id && a.is_pending()) {
        transition.apply(appointment);
        changed = true;
    }
    changed
}

/// Copies of the entries with `id`, taken before a tentative transition.
pub fn snapshot(appointments: &[Appointment], id: &str) -> Vec<Appointment> {
    appointments.iter().filter(|a| a.id == id).cloned().collect()
}

/// Puts snapshotted entries back in place of their tentative versions.
pub fn restore(appointments: &mut [Appointment], saved: &[Appointment]) {
    for appointment in appointments.iter_mut() {
        if let Some(original) = saved.iter().find(|s| s.id == appointment.id) {
            *appointment = original.clone();
        }
    }
}
