use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use orarun::config::{Config, Overrides, Settings};
use orarun::db::oracle::OracleDatabase;
use orarun::logging;
use orarun::runner::{QueryRunner, SYSDATE_QUERY};
use secrecy::SecretString;
use std::io;
use tracing::info;

#[derive(Parser)]
#[command(name = "orarun")]
#[command(about = "Run queries against an Oracle database and print the rows", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, env = "ORARUN_CONFIG")]
    config: Option<String>,

    /// Log progress to stderr
    #[arg(
        short,
        long,
        global = true,
        env = "ORARUN_VERBOSE",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    verbose: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the query sequence (system date, then employees) and print each result set
    Run {
        #[command(flatten)]
        conn: ConnArgs,

        /// SQL text or SQL file path; repeat to run several. Replaces the default sequence.
        #[arg(short, long = "query")]
        queries: Vec<String>,
    },
    /// Connect and print the database system date only
    Check {
        #[command(flatten)]
        conn: ConnArgs,
    },
}

#[derive(Args)]
struct ConnArgs {
    /// Full connect string: user/password@//host:port/service_name
    #[arg(long, env = "ORARUN_CONNECT")]
    connect: Option<String>,

    /// Username
    #[arg(short, long, env = "ORARUN_USERNAME")]
    username: Option<String>,

    /// Password
    #[arg(short, long, env = "ORARUN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Database host
    #[arg(long, env = "ORARUN_HOST")]
    host: Option<String>,

    /// Listener port
    #[arg(long, env = "ORARUN_PORT")]
    port: Option<u16>,

    /// Service name
    #[arg(long, env = "ORARUN_SERVICE")]
    service: Option<String>,

    /// Rows fetched per round trip
    #[arg(long)]
    fetch_size: Option<u32>,
}

impl ConnArgs {
    fn into_overrides(self, cli: &CliGlobals) -> Overrides {
        Overrides {
            connect: self.connect,
            username: self.username,
            password: self.password.map(SecretString::from),
            host: self.host,
            port: self.port,
            service_name: self.service,
            fetch_size: self.fetch_size,
            queries: Vec::new(),
            verbose: cli.verbose,
            log_file: cli.log_file.clone(),
        }
    }
}

struct CliGlobals {
    config: Option<String>,
    verbose: bool,
    log_file: Option<String>,
}

impl From<&Cli> for CliGlobals {
    fn from(cli: &Cli) -> Self {
        Self {
            config: cli.config.clone(),
            verbose: cli.verbose,
            log_file: cli.log_file.clone(),
        }
    }
}

fn overrides_for(command: Commands, globals: &CliGlobals) -> Overrides {
    match command {
        Commands::Run { conn, queries } => Overrides {
            queries,
            ..conn.into_overrides(globals)
        },
        Commands::Check { conn } => Overrides {
            queries: vec![SYSDATE_QUERY.to_string()],
            ..conn.into_overrides(globals)
        },
    }
}

fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(config_path) => Config::from_file(config_path)
            .with_context(|| format!("Failed to load configuration from {}", config_path)),
        None => Ok(Config::default()),
    }
}

fn execute(settings: Settings) -> Result<()> {
    logging::init_logging(&settings.logging)?;
    info!(
        "Connecting to {} ({} queries)",
        settings.params.connect_string(false),
        settings.queries.len()
    );

    let runner = QueryRunner::new(settings.queries);
    let mut db = OracleDatabase::new(settings.params, settings.fetch_size);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let stats = runner.run(&mut db, &mut out).context("Query run failed")?;
    stats.log_summary();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let globals = CliGlobals::from(&cli);
    let config = load_config(globals.config.as_deref())?;

    let overrides = overrides_for(cli.command, &globals);

    let settings = Settings::resolve(config, overrides)?;
    execute(settings)
}
