//! DocSpot panel CLI
//!
//! Usage:
//!   docspot-panel login --role admin -e admin@docspot.test -p secret
//!   docspot-panel doctors
//!   docspot-panel appointments --role doctor
//!   docspot-panel complete --role doctor --id <appointment>
//!
//! Backend URL, state directory and timeouts come from `DOCSPOT_*` variables
//! (or `.env`); `--url` and `--state-dir` override them.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};

use docspot_panel::config::PanelConfig;
use docspot_panel::format::{calculate_age, format_amount, format_slot_date, format_time, normalize_image_url};
use docspot_panel::logging::init_tracing;
use docspot_panel::models::{Appointment, AppointmentStatus, DoctorImage, NewDoctorForm, Role};
use docspot_panel::notify::ConsoleNotifier;
use docspot_panel::{Panel, PanelResult};

#[derive(Parser)]
#[command(name = "docspot-panel")]
#[command(about = "Admin and doctor panel for DocSpot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// Directory holding the session tokens
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Admin,
    Doctor,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => Role::Admin,
            RoleArg::Doctor => Role::Doctor,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    Login {
        #[arg(short, long, value_enum, default_value = "doctor")]
        role: RoleArg,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    Logout,
    /// Doctor roster (admin)
    Doctors,
    ToggleAvailability {
        #[arg(short, long)]
        id: String,
    },
    Appointments {
        #[arg(short, long, value_enum, default_value = "admin")]
        role: RoleArg,
    },
    Cancel {
        #[arg(short, long, value_enum, default_value = "admin")]
        role: RoleArg,
        #[arg(short, long)]
        id: String,
    },
    Complete {
        #[arg(short, long, value_enum, default_value = "admin")]
        role: RoleArg,
        #[arg(short, long)]
        id: String,
    },
    Dashboard {
        #[arg(short, long, value_enum, default_value = "admin")]
        role: RoleArg,
    },
    /// Onboard a doctor (admin)
    AddDoctor {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "1 Year")]
        experience: String,
        #[arg(long)]
        fees: String,
        #[arg(long)]
        about: String,
        #[arg(long, default_value = "General physician")]
        speciality: String,
        #[arg(long)]
        degree: String,
        #[arg(long)]
        address1: String,
        #[arg(long, default_value = "")]
        address2: String,
        /// Portrait uploaded to the asset host
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Own profile (doctor)
    Profile,
    UpdateProfile {
        #[arg(long)]
        fees: Option<String>,
        #[arg(long)]
        line1: Option<String>,
        #[arg(long)]
        line2: Option<String>,
        #[arg(long)]
        available: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = PanelConfig::from_env()?;
    if let Some(url) = cli.url {
        config.backend_url = url.trim_end_matches('/').to_string();
    }
    if let Some(dir) = cli.state_dir {
        config.state_dir = dir;
    }
    config.validate()?;
    let _log_guard = init_tracing(&config);

    let panel = Panel::open(config, Arc::new(ConsoleNotifier))?;
    // Failures were already shown by the notifier.
    Ok(match run(&panel, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    })
}

async fn run(panel: &Panel, command: Commands) -> PanelResult<()> {
    let currency = panel.config().currency.clone();
    match command {
        Commands::Login { role, email, password } => {
            panel.login(role.into(), &email, &password).await?;
            if let Some(doctor) = panel.logged_in_doctor()? {
                println!("👤 {} ({})", doctor.name, doctor.speciality);
            }
        }
        Commands::Logout => panel.logout()?,
        Commands::Doctors => {
            let doctors = panel.admin.fetch_doctors().await?;
            println!("🩺 {} doctors", doctors.len());
            for doctor in doctors {
                let image = normalize_image_url(&doctor.image, &panel.config().backend_url)
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {:<26} {:<28} {:<20} {:<10} {}",
                    doctor.id,
                    doctor.name,
                    doctor.speciality,
                    if doctor.availability { "available" } else { "away" },
                    image
                );
            }
        }
        Commands::ToggleAvailability { id } => {
            panel.admin.toggle_availability(&id).await?;
            if let Some(doctor) = panel.admin.doctors().await.into_iter().find(|d| d.id == id) {
                println!("  {} is now {}", doctor.name, if doctor.availability { "available" } else { "away" });
            }
        }
        Commands::Appointments { role } => {
            let appointments = match Role::from(role) {
                Role::Admin => panel.admin.fetch_appointments().await?,
                Role::Doctor => panel.doctor.fetch_appointments().await?,
            };
            println!("📅 {} appointments", appointments.len());
            print_appointments(&appointments, &currency);
        }
        Commands::Cancel { role, id } => match Role::from(role) {
            Role::Admin => panel.admin.cancel_appointment(&id).await?,
            Role::Doctor => panel.doctor.cancel_appointment(&id).await?,
        },
        Commands::Complete { role, id } => match Role::from(role) {
            Role::Admin => panel.admin.complete_appointment(&id).await?,
            Role::Doctor => panel.doctor.complete_appointment(&id).await?,
        },
        Commands::Dashboard { role } => match Role::from(role) {
            Role::Admin => {
                let dash = panel.admin.fetch_dashboard().await?;
                println!("📊 Doctors: {} | Appointments: {} | Patients: {}", dash.doctors, dash.appointments, dash.patients);
                println!("Latest bookings:");
                print_appointments(&dash.latest_appointments, &currency);
            }
            Role::Doctor => {
                let dash = panel.doctor.fetch_dashboard().await?;
                println!(
                    "📊 Earnings: {} | Appointments: {} | Patients: {}",
                    format_amount(&currency, dash.earnings),
                    dash.appointments,
                    dash.patients
                );
                println!("Latest bookings:");
                print_appointments(&dash.latest_appointments, &currency);
            }
        },
        Commands::AddDoctor {
            name,
            email,
            password,
            experience,
            fees,
            about,
            speciality,
            degree,
            address1,
            address2,
            image,
        } => {
            let image = match image {
                Some(path) => {
                    let bytes = fs::read(&path).map_err(|e| {
                        docspot_panel::PanelError::Validation(format!("Cannot read {}: {e}", path.display()))
                    })?;
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "doctor.png".to_string());
                    Some(DoctorImage::new(file_name, bytes))
                }
                None => None,
            };
            let form = NewDoctorForm {
                name,
                email,
                password,
                experience,
                fees,
                about,
                speciality,
                degree,
                address1,
                address2,
            };
            panel.admin.add_doctor(&form, image.as_ref()).await?;
        }
        Commands::Profile => {
            let profile = panel.doctor.fetch_profile().await?;
            println!("👤 {}", profile.name);
            let credentials: Vec<&str> =
                [profile.degree.as_str(), profile.speciality.as_str()].into_iter().filter(|s| !s.is_empty()).collect();
            println!("   {} | {}", credentials.join(" - "), profile.experience);
            println!("   About: {}", profile.about);
            println!("   Appointment fee: {}", format_amount(&currency, profile.fees));
            println!("   Address: {}, {}", profile.address.line1, profile.address.line2);
            println!("   Available: {}", if profile.availability { "yes" } else { "no" });
        }
        Commands::UpdateProfile { fees, line1, line2, available } => {
            panel.doctor.fetch_profile().await?;
            let Some(mut draft) = panel.doctor.edit_profile().await else {
                return Ok(());
            };
            if let Some(fees) = fees {
                draft.fees = fees;
            }
            if let Some(line1) = line1 {
                draft.address.line1 = line1;
            }
            if let Some(line2) = line2 {
                draft.address.line2 = line2;
            }
            if let Some(available) = available {
                draft.availability = available;
            }
            panel.doctor.commit_draft(draft).await?;
        }
    }
    Ok(())
}

fn print_appointments(appointments: &[Appointment], currency: &str) {
    let today = Local::now().date_naive();
    for (index, appt) in appointments.iter().enumerate() {
        let age = calculate_age(&appt.user_data.dob, today)
            .map(|a| a.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let status = match appt.status() {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        };
        println!(
            "  {:>2}. {:<24} {:<20} age {:<4} {}, {:<9} {:<20} {:<8} {}",
            index + 1,
            appt.id,
            appt.user_data.name,
            age,
            format_slot_date(&appt.slot_date),
            format_time(&appt.slot_time),
            appt.doc_data.name,
            format_amount(currency, appt.amount),
            status
        );
    }
}
