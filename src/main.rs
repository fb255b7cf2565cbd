use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, warn, LevelFilter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use rollsync::api::{AttendanceApi, HttpApi};
use rollsync::capture::{AttendanceRecorder, CaptureRequest};
use rollsync::config::Config;
use rollsync::connectivity::{ConnectivityMonitor, HttpProbe, NetworkProbe};
use rollsync::constants::{
    SUCCESS_CAPTURED, SUCCESS_LOGIN, SUCCESS_LOGOUT, SUCCESS_NOTHING_PENDING, SUCCESS_REFRESH, SUCCESS_SYNC,
    SUCCESS_UNDONE,
};
use rollsync::error::AppError;
use rollsync::logger::Logger;
use rollsync::repositories::{
    ActivityRepository, ClassAssignmentRepository, PeriodRepository, StudentRepository,
};
use rollsync::session::SessionGate;
use rollsync::storage::{LocalStorage, StoreHandle, StoreLocation};
use rollsync::sync::{RetentionSweep, SyncService, UploadSummary};
use rollsync::utils::datetime;

/// Offline-first attendance capture and sync
#[derive(Parser)]
#[command(name = "rollsync", version = env!("CARGO_PKG_VERSION"), long_about = None)]
struct Cli {
    /// Use this configuration file instead of the default lookup
    #[arg(global = true, long)]
    config: Option<PathBuf>,

    /// Override the database path
    #[arg(global = true, long)]
    db: Option<PathBuf>,

    /// Log at debug level
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download roster and calendar for an identity and open a session
    Login { identity: String },

    /// Re-download reference data for the current session
    Refresh,

    /// Show session and pending-upload status
    Status,

    /// List periods and their activities
    Periods,

    /// List the students of a class
    Roster {
        #[arg(long)]
        center: String,
        #[arg(long)]
        grade: String,
        /// Mark students that already signed for this activity today
        #[arg(long)]
        activity: Option<i64>,
    },

    /// Show records waiting for upload
    Pending {
        /// Per-activity counts for one period
        #[arg(long)]
        period: Option<i64>,
    },

    /// Upload pending records
    Sync {
        /// Only this activity
        #[arg(long)]
        activity: Option<i64>,
    },

    /// Record a signature for today
    Capture {
        #[arg(long)]
        student: String,
        #[arg(long)]
        activity: i64,
        #[arg(long = "period-label")]
        period_label: Option<String>,
        /// File holding the signature (base64 or data URI)
        #[arg(long)]
        signature: PathBuf,
    },

    /// Remove a signature recorded today
    Undo {
        #[arg(long)]
        student: String,
        #[arg(long)]
        activity: i64,
    },

    /// Close the session and wipe local data
    Logout,

    /// Delete uploaded records past the retention window
    Sweep,

    /// Watch connectivity and upload automatically on reconnection
    Watch,

    /// Write a default configuration file
    InitConfig {
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Everything a command needs, wired once.
struct Services {
    config: Config,
    storage: LocalStorage,
    probe: Arc<dyn NetworkProbe>,
    gate: SessionGate,
    sync: SyncService,
    recorder: AttendanceRecorder,
}

impl Services {
    async fn build(config: Config, handle: &StoreHandle) -> Result<Self> {
        let storage = handle.open().await?;
        let api: Arc<dyn AttendanceApi> = Arc::new(HttpApi::from_config(&config.server)?);
        let probe: Arc<dyn NetworkProbe> = Arc::new(HttpProbe::new(&config.server.endpoint)?);

        let gate = SessionGate::new(storage.clone(), api.clone(), probe.clone());
        let sync = SyncService::new(storage.clone(), api, probe.clone(), &config.sync);
        let recorder = AttendanceRecorder::new(storage.clone()).with_location_timeout(config.capture.location_timeout());

        Ok(Self {
            config,
            storage,
            probe,
            gate,
            sync,
            recorder,
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<AppError>() {
                Some(app_error) => eprintln!("{}", app_error.user_message()),
                None => eprintln!("❌ Error: {e:#}"),
            }
            debug!("command failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::InitConfig { path, force } = &cli.command {
        return init_config(path.clone(), *force);
    }

    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };

    let logger = Logger::from_config(config.logging.enabled)?;
    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    logger.install(level)?;

    let db_path = match cli.db {
        Some(path) => path,
        None => config.database_path()?,
    };
    let handle = StoreHandle::new(StoreLocation::File(db_path));
    let services = Services::build(config, &handle).await?;

    if let Err(e) = RetentionSweep::run(
        services.storage.connection(),
        datetime::today(),
        services.config.sync.retention_days,
    )
    .await
    {
        warn!("⚠️ Startup retention sweep failed: {}", e);
    }

    match cli.command {
        Commands::Login { identity } => {
            let report = services.gate.login(&identity).await?;
            println!("{SUCCESS_LOGIN}");
            println!(
                "👤 {}: {} classes, {} students, {} periods, {} activities",
                report.display_name, report.assignments, report.students, report.periods, report.activities
            );
        }
        Commands::Refresh => {
            let report = services.gate.refresh().await?;
            println!(
                "{SUCCESS_REFRESH}: {} students, {} activities",
                report.students, report.activities
            );
        }
        Commands::Status => status(&services).await?,
        Commands::Periods => periods(&services).await?,
        Commands::Roster {
            center,
            grade,
            activity,
        } => roster(&services, &center, &grade, activity).await?,
        Commands::Pending { period } => pending(&services, period).await?,
        Commands::Sync { activity } => {
            let summary = match activity {
                Some(activity_id) => services.sync.sync_activity(activity_id).await?,
                None => services.sync.sync_all().await?,
            };
            print_summary(&summary);
        }
        Commands::Capture {
            student,
            activity,
            period_label,
            signature,
        } => {
            let raw = std::fs::read_to_string(&signature)
                .with_context(|| format!("Failed to read signature file: {}", signature.display()))?;
            let event = services
                .recorder
                .record(CaptureRequest::now(student, activity, period_label, raw))
                .await?;
            println!("{SUCCESS_CAPTURED} ({})", event.coordinates);

            if services.config.sync.auto_sync {
                if let Some(summary) = services.sync.upload_now(vec![event]).await {
                    println!("☁️ {summary}");
                }
            }
        }
        Commands::Undo { student, activity } => {
            if services.recorder.undo(&student, activity).await? {
                println!("{SUCCESS_UNDONE}");
            } else {
                println!("ℹ️ No attendance recorded today for {student} in activity {activity}");
            }
        }
        Commands::Logout => {
            services.gate.logout().await?;
            println!("{SUCCESS_LOGOUT}");
        }
        Commands::Sweep => {
            let deleted = RetentionSweep::run(
                services.storage.connection(),
                datetime::today(),
                services.config.sync.retention_days,
            )
            .await?;
            println!("🧹 {deleted} uploaded records removed");
        }
        Commands::Watch => watch(&services).await?,
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => Config::get_default_config_path()?,
    };
    if path.exists() && !force {
        anyhow::bail!("{} already exists, use --force to overwrite", path.display());
    }
    Config::generate_default_config(&path)
}

async fn status(services: &Services) -> Result<()> {
    let Some(session) = services.gate.current().await? else {
        println!("🔒 Not logged in");
        return Ok(());
    };
    let conn = services.storage.connection();
    let students = StudentRepository::count(conn).await?;
    let pending = services.sync.pending().count_pending().await?;
    let online = services.probe.check().await.is_online();

    println!("👤 {} ({})", session.display_name, session.identity);
    println!("🔄 Last sync: {}", datetime::format_relative(&session.last_sync_at));
    println!("🎒 Students: {students}");
    println!("📤 Pending uploads: {pending}");
    println!("📶 {}", if online { "Online" } else { "Offline" });
    Ok(())
}

async fn periods(services: &Services) -> Result<()> {
    services.gate.require().await?;
    let conn = services.storage.connection();
    let periods = PeriodRepository::get_all(conn).await?;
    if periods.is_empty() {
        println!("ℹ️ No periods downloaded yet");
    }
    for period in periods {
        println!("📅 [{}] {} ({} to {})", period.id, period.name, period.start_date, period.end_date);
        for activity in ActivityRepository::get_for_period(conn, period.id).await? {
            println!("   [{}] {} - {}", activity.id, activity.name, activity.activity_type);
        }
    }
    Ok(())
}

async fn roster(services: &Services, center: &str, grade: &str, activity: Option<i64>) -> Result<()> {
    services.gate.require().await?;
    let conn = services.storage.connection();
    let students = StudentRepository::get_for_class(conn, center, grade).await?;
    if students.is_empty() {
        let classes = ClassAssignmentRepository::get_all(conn).await?;
        println!("ℹ️ No students for {center} / {grade}. Your classes:");
        for class in classes {
            println!("   {} / {} / {}", class.municipality, class.center, class.grade);
        }
        return Ok(());
    }

    let signed = match activity {
        Some(activity_id) => services.recorder.attended_on(activity_id, &datetime::format_today()).await?,
        None => Default::default(),
    };
    for student in students {
        let mark = if signed.contains(&student.student_id) { "✅" } else { "  " };
        println!("{mark} {} {}", student.student_id, student.full_name);
    }
    Ok(())
}

async fn pending(services: &Services, period: Option<i64>) -> Result<()> {
    services.gate.require().await?;
    let tracker = services.sync.pending();
    match period {
        Some(period_id) => {
            for row in tracker.count_pending_by_activity(period_id).await? {
                println!("[{}] {}: {} pending", row.activity_id, row.name, row.pending);
            }
        }
        None => {
            let events = tracker.list_all_pending().await?;
            if events.is_empty() {
                println!("{SUCCESS_NOTHING_PENDING}");
            }
            for event in events {
                println!(
                    "{} activity {} student {} ({})",
                    event.event_date, event.activity_id, event.student_id, event.period_label
                );
            }
        }
    }
    Ok(())
}

async fn watch(services: &Services) -> Result<()> {
    services.gate.require().await?;
    let monitor = ConnectivityMonitor::new(services.sync.clone()).with_auto_sync(services.config.sync.auto_sync);
    println!("📡 Watching connectivity, press Ctrl-C to stop");
    tokio::select! {
        _ = monitor.watch(services.probe.clone(), services.config.sync.probe_interval()) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
        }
    }
    Ok(())
}

fn print_summary(summary: &UploadSummary) {
    if summary.is_empty() {
        println!("{SUCCESS_NOTHING_PENDING}");
    } else {
        println!("{SUCCESS_SYNC}: {summary}");
    }
}
