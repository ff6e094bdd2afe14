use clap::{Parser, Subcommand};
use std::{
    error::Error,
    fs,
    io::{self, Read},
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};
use tracing::{debug, warn};
use typesight::{
    config::{ConfigStore, FileConfigStore},
    error::ApiError,
    scoring::{score, FinishedTest},
    service::{ApiResponse, Caller, Role, SessionService},
    session::{NewSession, TestDuration, TextType},
    store::SqliteSessionStore,
};

/// record typing sessions and inspect their error patterns and insights
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Stores completed typing tests and reports word-level error patterns together with heuristic insights about speed, accuracy and time pressure."
)]
pub struct Cli {
    /// session database to use instead of the configured one
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    /// config file to use instead of the platform default
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// log at debug level regardless of config
    #[clap(short = 'v', long, global = true)]
    verbose: bool,

    /// id of the user issuing the command
    #[clap(short = 'u', long, global = true, default_value = "local")]
    user: String,

    /// role of the user issuing the command
    #[clap(long, value_enum, global = true, default_value_t = Role::User)]
    role: Role,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// score a finished test and store it
    Record {
        /// text that was shown
        #[clap(long)]
        raw_text: String,

        /// text that was typed
        #[clap(long)]
        typed_text: String,

        /// test length in seconds (15 or 30)
        #[clap(short = 'd', long, default_value_t = TestDuration::Thirty, value_parser = parse_duration)]
        duration: TestDuration,

        /// seconds actually spent typing; defaults to the test length
        #[clap(long)]
        elapsed_secs: Option<f64>,

        #[clap(long, value_enum, default_value_t = TextType::Words)]
        text_type: TextType,

        /// comma separated keystroke times in ms since the test started
        #[clap(long, value_delimiter = ',')]
        timings: Vec<f64>,
    },

    /// store a session given as JSON (reads stdin when no file is given)
    Import { file: Option<PathBuf> },

    /// list sessions, newest first
    History {
        /// whose sessions to list; defaults to the calling user
        #[clap(long)]
        of: Option<String>,
    },

    /// show a stored session with its analysis
    Analyze { session_id: i64 },
}

fn parse_duration(s: &str) -> Result<TestDuration, String> {
    let secs: u32 = s.parse().map_err(|e| format!("{e}"))?;
    TestDuration::try_from(secs).map_err(|e| e.to_string())
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();

    let config_store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    // Config problems are held until the subscriber exists, then logged.
    let mut problems = Vec::new();
    let config = config_store.load().unwrap_or_else(|e| {
        problems.push(e);
        Default::default()
    });
    let level = config.level().unwrap_or_else(|e| {
        problems.push(e);
        tracing::Level::WARN
    });

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            level
        })
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    for problem in problems {
        warn!("{problem}");
    }

    let db_path = config.resolve_db_path(cli.db.as_deref());
    debug!(path = %db_path.display(), "using session database");
    let service = SessionService::new(SqliteSessionStore::open(&db_path)?);
    let caller = Caller::new(cli.user.clone(), cli.role);

    let response = run(&service, &caller, cli.command)?;

    println!("{}", serde_json::to_string_pretty(&response.body)?);
    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run(
    service: &SessionService<SqliteSessionStore>,
    caller: &Caller,
    command: Command,
) -> Result<ApiResponse, Box<dyn Error>> {
    let response: ApiResponse = match command {
        Command::Record {
            raw_text,
            typed_text,
            duration,
            elapsed_secs,
            text_type,
            timings,
        } => {
            let elapsed = elapsed_secs.unwrap_or(duration.secs() as f64);
            let new = score(FinishedTest {
                duration,
                text_type,
                raw_text,
                typed_text,
                elapsed: Duration::try_from_secs_f64(elapsed).unwrap_or_default(),
                typing_durations: timings,
            });
            service.create_session(caller, new).into()
        }
        Command::Import { file } => {
            let raw = match file {
                Some(path) => fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            match serde_json::from_str::<NewSession>(&raw) {
                Ok(new) => service.create_session(caller, new).into(),
                Err(e) => ApiResponse::failure(&ApiError::from(e)),
            }
        }
        Command::History { of } => {
            let owner = of.unwrap_or_else(|| caller.user_id.clone());
            service.user_sessions(caller, &owner).into()
        }
        Command::Analyze { session_id } => service.session_analysis(caller, session_id).into(),
    };

    Ok(response)
}
