use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Day key (`day_month_year`) → ordered booked time slots.
pub type SlotMap = BTreeMap<String, Vec<String>>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
}

impl Role {
    /// Key under which the role's token is persisted.
    pub fn storage_key(self) -> &'static str {
        match self {
            Role::Admin => "aToken",
            Role::Doctor => "dToken",
        }
    }

    pub fn login_path(self) -> &'static str {
        match self {
            Role::Admin => "/api/admin/login",
            Role::Doctor => "/api/doctor/login",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Admin => "Admin",
            Role::Doctor => "Doctor",
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Address {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Doctor {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub speciality: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub fees: f64,
    #[serde(default)]
    pub address: Address,
    #[serde(alias = "available", default)]
    pub availability: bool,
    #[serde(rename = "slots_booked", alias = "slotsBooked", default)]
    pub slots_booked: SlotMap,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PatientSummary {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub dob: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DoctorSummary {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub speciality: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentStatus {
    Pending,
    Cancelled,
    Completed,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub user_data: PatientSummary,
    #[serde(default)]
    pub doc_data: DoctorSummary,
    #[serde(default)]
    pub slot_date: String,
    #[serde(default)]
    pub slot_time: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub is_completed: bool,
}

impl Appointment {
    pub fn status(&self) -> AppointmentStatus {
        if self.cancelled {
            AppointmentStatus::Cancelled
        } else if self.is_completed {
            AppointmentStatus::Completed
        } else {
            AppointmentStatus::Pending
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status() == AppointmentStatus::Pending
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    #[serde(default)]
    pub doctors: u64,
    #[serde(default)]
    pub appointments: u64,
    #[serde(default)]
    pub patients: u64,
    #[serde(default)]
    pub latest_appointments: Vec<Appointment>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDashboard {
    #[serde(default)]
    pub earnings: f64,
    #[serde(default)]
    pub appointments: u64,
    #[serde(default)]
    pub patients: u64,
    #[serde(default)]
    pub latest_appointments: Vec<Appointment>,
}

/// The mutable subset of a doctor's profile.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub fees: f64,
    pub address: Address,
    pub availability: bool,
}

/// Summary returned by the doctor login, persisted as `userData`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LoggedInDoctor {
    #[serde(alias = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub speciality: String,
    #[serde(default)]
    pub image: String,
}

/// Add-doctor form fields as typed by the admin.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDoctorForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub experience: String,
    pub fees: String,
    pub about: String,
    pub speciality: String,
    pub degree: String,
    pub address1: String,
    pub address2: String,
}

impl Default for NewDoctorForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            password: String::new(),
            experience: "1 Year".to_string(),
            fees: String::new(),
            about: String::new(),
            speciality: "General physician".to_string(),
            degree: String::new(),
            address1: String::new(),
            address2: String::new(),
        }
    }
}

/// Record posted to `/api/admin/add-doctor`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewDoctorRecord {
    pub name: String,
    pub email: String,
    pub password: String,
    pub image: String,
    pub speciality: String,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub availability: bool,
    pub fees: f64,
    pub address: Address,
    /// Creation time, epoch milliseconds.
    pub date: i64,
    pub slots_booked: SlotMap,
}

/// Image picked for a new doctor.
#[derive(Debug, Clone, PartialEq)]
pub struct DoctorImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl DoctorImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_string();
        Self { file_name, bytes, content_type }
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
