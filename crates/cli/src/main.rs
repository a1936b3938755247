use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use ips_core::models::cancer_screening::ScreeningType;
use ips_core::models::patient::Patient;
use ips_core::repositories::chronic::{ChronicFilter, ChronicService};
use ips_core::repositories::early_childhood::EarlyChildhoodService;
use ips_core::repositories::encounters::EncounterFilter;
use ips_core::repositories::records::RecordService;
use ips_core::repositories::screening::ScreeningService;
use ips_core::repositories::Page;
use ips_core::store::{self, Filter, PostgresStore};
use ips_core::CoreConfig;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "ips")]
#[command(about = "IPS clinical record operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the embedded database migrations
    Migrate,
    /// Patient registry
    Patients {
        #[command(subcommand)]
        command: PatientCommands,
    },
    /// Print aggregate figures as JSON
    Stats {
        #[command(subcommand)]
        command: StatsCommands,
    },
}

#[derive(Subcommand)]
enum PatientCommands {
    /// List registered patients
    List {
        /// Exact document number
        #[arg(long)]
        document_number: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
}

#[derive(clap::Args)]
struct Window {
    /// Restrict to one patient
    #[arg(long)]
    patient_id: Option<Uuid>,
    /// First encounter date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last encounter date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl Window {
    fn encounter_filter(&self) -> EncounterFilter {
        EncounterFilter {
            patient_id: self.patient_id,
            date_from: self.from,
            date_to: self.to,
            ..EncounterFilter::default()
        }
    }
}

#[derive(Subcommand)]
enum StatsCommands {
    /// Chronic-disease control figures
    Chronic {
        #[command(flatten)]
        window: Window,
    },
    /// Cancer screening figures
    Screening {
        #[command(flatten)]
        window: Window,
        #[arg(long, value_enum)]
        screening_type: Option<ScreeningArg>,
    },
    /// Early-childhood development figures
    EarlyChildhood {
        #[command(flatten)]
        window: Window,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ScreeningArg {
    Cervical,
    Breast,
    Prostate,
    Colorectal,
}

impl From<ScreeningArg> for ScreeningType {
    fn from(arg: ScreeningArg) -> Self {
        match arg {
            ScreeningArg::Cervical => ScreeningType::Cervical,
            ScreeningArg::Breast => ScreeningType::Breast,
            ScreeningArg::Prostate => ScreeningType::Prostate,
            ScreeningArg::Colorectal => ScreeningType::Colorectal,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'ips --help' for commands");
        return Ok(());
    };

    let cfg = CoreConfig::from_lookup(|name| std::env::var(name).ok())?;

    match command {
        Commands::Migrate => {
            let url = cfg
                .database_url()
                .context("DATABASE_URL must be set to run migrations")?;
            let store = PostgresStore::connect(url, cfg.max_connections()).await?;
            store.migrate().await?;
            println!("Migrations applied");
        }
        Commands::Patients {
            command:
                PatientCommands::List {
                    document_number,
                    limit,
                    offset,
                },
        } => {
            let cfg = Arc::new(cfg);
            let store = store::connect(&cfg).await?;
            let patients = RecordService::<Patient>::new(store, cfg);
            let filters = document_number
                .map(|number| vec![Filter::eq("document_number", number)])
                .unwrap_or_default();
            let found = patients.list(filters, Page::new(limit, offset)).await?;
            if found.is_empty() {
                println!("No patients found.");
            }
            let today = chrono::Utc::now().date_naive();
            for patient in found {
                println!(
                    "ID: {}, Document: {:?} {}, Name: {} {}, Born: {} (age {})",
                    patient.meta.id.map(|id| id.to_string()).unwrap_or_default(),
                    patient.document_type,
                    patient.document_number,
                    patient.first_name,
                    patient.first_surname,
                    patient.birth_date,
                    patient.age_on(today)
                );
            }
        }
        Commands::Stats { command } => {
            let cfg = Arc::new(cfg);
            let store = store::connect(&cfg).await?;
            let figures = match command {
                StatsCommands::Chronic { window } => {
                    let filter = ChronicFilter {
                        patient_id: window.patient_id,
                        date_from: window.from,
                        date_to: window.to,
                        ..ChronicFilter::default()
                    };
                    let stats = ChronicService::new(store, cfg).stats(&filter).await?;
                    serde_json::to_string_pretty(&stats)?
                }
                StatsCommands::Screening {
                    window,
                    screening_type,
                } => {
                    let stats = ScreeningService::new(store, cfg)
                        .stats(&window.encounter_filter(), screening_type.map(Into::into))
                        .await?;
                    serde_json::to_string_pretty(&stats)?
                }
                StatsCommands::EarlyChildhood { window } => {
                    let stats = EarlyChildhoodService::new(store, cfg)
                        .stats(&window.encounter_filter())
                        .await?;
                    serde_json::to_string_pretty(&stats)?
                }
            };
            println!("{figures}");
        }
    }

    Ok(())
}
