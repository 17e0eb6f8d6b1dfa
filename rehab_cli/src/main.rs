use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use rehab_core::catalog::{get_exercise, list_exercises, seed_default_catalog};
use rehab_core::export::export_schedule_csv;
use rehab_core::history::{add_history, delete_history, list_history};
use rehab_core::identity::{register, reset_password};
use rehab_core::questionnaire::{get_questionnaire, submit_questionnaire};
use rehab_core::schedules::{agenda, delete_schedule, list_schedules, set_schedule_active};
use rehab_core::sessions::{
    add_session, list_sessions, mark_completed, remove_session, replace_session_fields,
};
use rehab_core::*;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "rehab")]
#[command(about = "Rehabilitation exercise schedule tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Username to act as
    #[arg(long, global = true, env = "REHAB_USER")]
    user: Option<String>,

    /// Password for --user
    #[arg(long, global = true, env = "REHAB_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account for --user with --password
    Register,

    /// Check --user/--password and show the account
    Login,

    /// Set a new password for --user
    ResetPassword {
        #[arg(long)]
        new_password: String,
    },

    /// Intake questionnaire
    #[command(subcommand)]
    Questionnaire(QuestionnaireCommand),

    /// Exercise catalog
    #[command(subcommand)]
    Exercises(ExercisesCommand),

    /// Generated schedules
    #[command(subcommand)]
    Schedule(ScheduleCommand),

    /// Training sessions within a schedule
    #[command(subcommand)]
    Training(TrainingCommand),

    /// Free-form exercise history
    #[command(subcommand)]
    History(HistoryCommand),
}

#[derive(Subcommand)]
enum QuestionnaireCommand {
    /// Submit (or resubmit) your questionnaire
    Submit(QuestionnaireArgs),
    /// Show your questionnaire
    Show,
}

#[derive(Args)]
struct QuestionnaireArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    gender: String,
    /// Weight in kg
    #[arg(long)]
    weight: f64,
    /// Height in cm
    #[arg(long)]
    height: f64,
    /// Broad injury category (e.g. Neurology, Trauma)
    #[arg(long)]
    injury_type: String,
    /// Specific injury, matched against exercise labels
    #[arg(long)]
    specific_injury: String,
    /// Pain level, 0-10
    #[arg(long)]
    pain_level: u8,
    /// Preferred time of day
    #[arg(long, default_value = "morning")]
    training_time: String,
}

#[derive(Subcommand)]
enum ExercisesCommand {
    /// List exercises
    List {
        /// Only exercises listing this injury (case-insensitive)
        #[arg(long)]
        injury: Option<String>,
    },
    /// Show one exercise
    Show { id: String },
}

#[derive(Subcommand)]
enum ScheduleCommand {
    /// Generate a schedule from a questionnaire (yours by default)
    Generate {
        #[arg(long)]
        questionnaire_id: Option<Uuid>,
    },
    /// List active schedules
    List {
        #[arg(long)]
        user_id: Option<Uuid>,
    },
    /// Mark a schedule active
    Activate { schedule_id: Uuid },
    /// Mark a schedule inactive
    Deactivate { schedule_id: Uuid },
    /// Delete a schedule and its trainings
    Delete { schedule_id: Uuid },
    /// Write a schedule's trainings to a CSV file
    Export {
        schedule_id: Uuid,
        #[arg(long)]
        output: PathBuf,
    },
    /// Upcoming trainings across active schedules
    Agenda {
        /// First day (YYYY-MM-DD), today by default
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
}

#[derive(Subcommand)]
enum TrainingCommand {
    /// List the trainings of a schedule
    List { schedule_id: Uuid },
    /// Mark a training completed
    Complete {
        schedule_id: Uuid,
        training_id: Uuid,
        /// Clear the completion instead
        #[arg(long)]
        undo: bool,
    },
    /// Add a training to a schedule
    Add {
        schedule_id: Uuid,
        #[arg(long)]
        exercise: String,
        #[arg(long)]
        date: NaiveDate,
        /// HH:MM
        #[arg(long)]
        time: String,
        #[arg(long)]
        completed: bool,
    },
    /// Change fields of a training
    Update {
        schedule_id: Uuid,
        training_id: Uuid,
        #[arg(long)]
        exercise: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Remove a training
    Remove { schedule_id: Uuid, training_id: Uuid },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// Log an exercise
    Add {
        #[arg(long)]
        exercise_name: String,
        #[arg(long)]
        duration_seconds: u32,
        /// RFC 3339 timestamp, now by default
        #[arg(long)]
        performed_at: Option<DateTime<Utc>>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, default_value_t = 1)]
        sets: u32,
        #[arg(long, default_value_t = 0)]
        pain_level: u8,
    },
    /// List your history, newest first
    List,
    /// Delete a history entry
    Remove { id: Uuid },
}

fn main() -> ExitCode {
    rehab_core::logging::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(e.kind()))
        }
    }
}

fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Unauthorized => 2,
        ErrorKind::Forbidden => 3,
        ErrorKind::NotFound => 4,
        ErrorKind::Invalid => 5,
    }
}

/// Resolved configuration, store and caller for one invocation
struct App {
    config: Config,
    store: FileStore,
    json: bool,
    credentials: Option<Credentials>,
}

impl App {
    fn open(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        if let Some(dir) = &cli.data_dir {
            config.data.data_dir = dir.clone();
        }

        let store = FileStore::new(config.store_path());
        let seeded = seed_default_catalog(&store)?;
        if seeded > 0 {
            tracing::info!("Initialized catalog in {:?}", store.path());
        }

        let credentials = match (&cli.user, &cli.password) {
            (Some(user), Some(password)) => Some(Credentials::new(user, password)),
            _ => None,
        };

        Ok(Self {
            config,
            store,
            json: cli.json,
            credentials,
        })
    }

    fn credentials(&self) -> Result<&Credentials> {
        self.credentials
            .as_ref()
            .ok_or_else(|| Error::Unauthorized("pass --user and --password".into()))
    }

    /// Authenticate the caller
    fn requester(&self) -> Result<UserProfile> {
        StoreIdentity::new(&self.store).authenticate(self.credentials()?)
    }

    /// Print `value` as JSON, or run `human` for plain output
    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human(value);
        }
        Ok(())
    }
}

fn run(cli: Cli) -> Result<()> {
    let app = App::open(&cli)?;

    match cli.command {
        Commands::Register => {
            let creds = app.credentials()?;
            let profile = register(
                &app.store,
                &creds.username,
                &creds.password,
                app.config.auth.bcrypt_cost,
            )?;
            app.emit(&profile, |p| println!("✓ Registered {} ({})", p.username, p.id))
        }
        Commands::Login => {
            let profile = app.requester()?;
            app.emit(&profile, |p| println!("✓ Logged in as {} ({})", p.username, p.id))
        }
        Commands::ResetPassword { new_password } => {
            // No authentication: the old password is what was forgotten
            let username = cli
                .user
                .ok_or_else(|| Error::Validation("pass --user".into()))?;
            reset_password(
                &app.store,
                &username,
                &new_password,
                app.config.auth.bcrypt_cost,
            )?;
            app.emit(&serde_json::json!({ "ok": true }), |_| {
                println!("✓ If the account exists, its password was changed")
            })
        }
        Commands::Questionnaire(cmd) => cmd_questionnaire(&app, cmd),
        Commands::Exercises(cmd) => cmd_exercises(&app, cmd),
        Commands::Schedule(cmd) => cmd_schedule(&app, cmd),
        Commands::Training(cmd) => cmd_training(&app, cmd),
        Commands::History(cmd) => cmd_history(&app, cmd),
    }
}

fn cmd_questionnaire(app: &App, cmd: QuestionnaireCommand) -> Result<()> {
    let me = app.requester()?;

    match cmd {
        QuestionnaireCommand::Submit(args) => {
            let input = QuestionnaireInput {
                name: args.name,
                gender: args.gender,
                weight: args.weight,
                height: args.height,
                main_injury_type: args.injury_type,
                specific_injury: args.specific_injury,
                pain_level: args.pain_level,
                training_time: args.training_time,
            };
            let q = submit_questionnaire(&app.store, me.id, input)?;
            app.emit(&q, |q| println!("✓ Questionnaire saved ({})", q.id))
        }
        QuestionnaireCommand::Show => {
            let q = get_questionnaire(&app.store, me.id, me.id)?;
            app.emit(&q, display_questionnaire)
        }
    }
}

fn cmd_exercises(app: &App, cmd: ExercisesCommand) -> Result<()> {
    match cmd {
        ExercisesCommand::List { injury } => {
            let exercises = list_exercises(&app.store, injury.as_deref())?;
            app.emit(&exercises, |list| {
                for ex in list {
                    println!("{:<28} {}", ex.id, ex.title);
                }
            })
        }
        ExercisesCommand::Show { id } => {
            let ex = get_exercise(&app.store, &id)?;
            app.emit(&ex, display_exercise)
        }
    }
}

fn cmd_schedule(app: &App, cmd: ScheduleCommand) -> Result<()> {
    let me = app.requester()?;

    match cmd {
        ScheduleCommand::Generate { questionnaire_id } => {
            let questionnaire_id = match questionnaire_id {
                Some(id) => id,
                None => get_questionnaire(&app.store, me.id, me.id)?.id,
            };

            let table = RecurrenceTable::with_overrides(&app.config.schedule.frequency_overrides);
            let ctx = ScheduleContext {
                now: Utc::now(),
                today: chrono::Local::now().date_naive(),
                recurrence: &table,
                settings: &app.config.schedule,
            };

            let generated = generate_schedule(&app.store, &ctx, questionnaire_id, me.id)?;
            app.emit(&generated, |s| {
                println!(
                    "✓ Generated schedule {} with {} trainings",
                    s.schedule.id,
                    s.trainings.len()
                )
            })
        }
        ScheduleCommand::List { user_id } => {
            let schedules = list_schedules(&app.store, user_id.unwrap_or(me.id), me.id)?;
            app.emit(&schedules, |list| {
                if list.is_empty() {
                    println!("No active schedules.");
                }
                for s in list {
                    let done = s.trainings.iter().filter(|t| t.is_completed).count();
                    println!(
                        "{}  {} / {}  {}/{} done  (generated {})",
                        s.schedule.id,
                        s.schedule.injury_type,
                        s.schedule.specific_injury,
                        done,
                        s.trainings.len(),
                        s.schedule.generated_at.format("%Y-%m-%d %H:%M")
                    );
                }
            })
        }
        ScheduleCommand::Activate { schedule_id } => {
            let s = set_schedule_active(&app.store, schedule_id, true, me.id)?;
            app.emit(&s, |s| println!("✓ Schedule {} activated", s.id))
        }
        ScheduleCommand::Deactivate { schedule_id } => {
            let s = set_schedule_active(&app.store, schedule_id, false, me.id)?;
            app.emit(&s, |s| println!("✓ Schedule {} deactivated", s.id))
        }
        ScheduleCommand::Delete { schedule_id } => {
            let removed = delete_schedule(&app.store, schedule_id, me.id)?;
            app.emit(&serde_json::json!({ "trainings_removed": removed }), |_| {
                println!("✓ Deleted schedule {} ({} trainings)", schedule_id, removed)
            })
        }
        ScheduleCommand::Export {
            schedule_id,
            output,
        } => {
            let rows = export_schedule_csv(&app.store, schedule_id, me.id, &output)?;
            app.emit(&serde_json::json!({ "rows": rows }), |_| {
                println!("✓ Exported {} trainings", rows);
                println!("  CSV: {}", output.display());
            })
        }
        ScheduleCommand::Agenda { from, days } => {
            let from = from.unwrap_or_else(|| chrono::Local::now().date_naive());
            let trainings = agenda(&app.store, me.id, from, days)?;
            app.emit(&trainings, |list| display_trainings(list))
        }
    }
}

fn cmd_training(app: &App, cmd: TrainingCommand) -> Result<()> {
    let me = app.requester()?;
    let now = Utc::now();

    match cmd {
        TrainingCommand::List { schedule_id } => {
            let trainings = list_sessions(&app.store, schedule_id, me.id)?;
            app.emit(&trainings, |list| display_trainings(list))
        }
        TrainingCommand::Complete {
            schedule_id,
            training_id,
            undo,
        } => {
            let t = mark_completed(&app.store, schedule_id, training_id, !undo, me.id, now)?;
            app.emit(&t, |t| {
                if t.is_completed {
                    println!("✓ Training {} completed", t.id);
                } else {
                    println!("✓ Training {} marked not completed", t.id);
                }
            })
        }
        TrainingCommand::Add {
            schedule_id,
            exercise,
            date,
            time,
            completed,
        } => {
            let new = NewTraining {
                exercise_id: exercise,
                date,
                time,
                is_completed: completed,
            };
            let t = add_session(&app.store, schedule_id, new, me.id, now)?;
            app.emit(&t, |t| println!("✓ Added training {}", t.id))
        }
        TrainingCommand::Update {
            schedule_id,
            training_id,
            exercise,
            date,
            time,
            completed,
        } => {
            let update = TrainingUpdate {
                exercise_id: exercise,
                date,
                time,
                is_completed: completed,
            };
            let t = replace_session_fields(&app.store, schedule_id, training_id, update, me.id, now)?;
            app.emit(&t, |t| println!("✓ Updated training {}", t.id))
        }
        TrainingCommand::Remove {
            schedule_id,
            training_id,
        } => {
            let t = remove_session(&app.store, schedule_id, training_id, me.id)?;
            app.emit(&t, |t| println!("✓ Removed training {}", t.id))
        }
    }
}

fn cmd_history(app: &App, cmd: HistoryCommand) -> Result<()> {
    let me = app.requester()?;

    match cmd {
        HistoryCommand::Add {
            exercise_name,
            duration_seconds,
            performed_at,
            notes,
            sets,
            pain_level,
        } => {
            let entry = NewHistoryEntry {
                user_id: me.id,
                exercise_name,
                performed_at: performed_at.unwrap_or_else(Utc::now),
                duration_seconds,
                notes,
                sets,
                pain_level,
            };
            let stored = add_history(&app.store, entry, me.id)?;
            app.emit(&stored, |h| println!("✓ Logged {} ({})", h.entry.exercise_name, h.id))
        }
        HistoryCommand::List => {
            let entries = list_history(&app.store, me.id, me.id)?;
            app.emit(&entries, |list| {
                for h in list {
                    println!(
                        "{}  {:<28} {:>5}s  x{}  pain {}",
                        h.entry.performed_at.format("%Y-%m-%d %H:%M"),
                        h.entry.exercise_name,
                        h.entry.duration_seconds,
                        h.entry.sets,
                        h.entry.pain_level
                    );
                }
            })
        }
        HistoryCommand::Remove { id } => {
            delete_history(&app.store, id, me.id)?;
            app.emit(&serde_json::json!({ "deleted": id }), |_| {
                println!("✓ Deleted history entry {}", id)
            })
        }
    }
}

fn display_questionnaire(q: &Questionnaire) {
    let a = &q.answers;
    println!("Questionnaire {}", q.id);
    println!("  Name:            {}", a.name);
    println!("  Gender:          {}", a.gender);
    println!("  Weight / height: {} kg / {} cm", a.weight, a.height);
    println!("  Injury:          {} / {}", a.main_injury_type, a.specific_injury);
    println!("  Pain level:      {}", a.pain_level);
    println!("  Training time:   {}", a.training_time);
}

fn display_exercise(ex: &Exercise) {
    println!("\n  {} ({})", ex.title, ex.id);
    println!("  {}", ex.description);
    println!();
    println!("  Suitable for: {}", ex.suitable_for.join(", "));
    println!("  Max discomfort: {}/10", ex.max_discomfort_level);
    for (i, step) in ex.steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
    for (injury, guidance) in &ex.injury_guidance {
        println!("\n  [{}] {}", injury, guidance);
    }
    if let Some(ref url) = ex.image_url {
        println!();
        println!("  ℹ Image: {}", url);
    }
    println!();
}

fn display_trainings(trainings: &[Training]) {
    if trainings.is_empty() {
        println!("No trainings.");
    }
    for t in trainings {
        println!(
            "{} {} {}  {:<28} {}",
            if t.is_completed { "✓" } else { " " },
            t.date,
            t.time,
            t.exercise_id,
            t.id
        );
    }
}
