use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use chronos_client::{Client, ClientConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "chronosctl",
    about = "Chronos — manage scheduler jobs across a cluster of endpoints",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Cluster URL, e.g. http://chronos-1:4400,chronos-2:4400
    #[arg(long, env = "CHRONOS_URL", global = true)]
    url: Option<String>,
    /// TOML config file (url, request_timeout_secs, basic auth)
    #[arg(short, long, env = "CHRONOS_CONFIG", global = true)]
    config: Option<PathBuf>,
    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
    /// HTTP basic auth user
    #[arg(long, env = "CHRONOS_USER", global = true)]
    user: Option<String>,
    /// HTTP basic auth password
    #[arg(long, env = "CHRONOS_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,
    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List all jobs
    Jobs,
    /// Show a single job
    Job { name: String },
    /// Create a job from a JSON definition
    Create {
        /// Path to the job JSON file
        file: PathBuf,
    },
    /// Update a job from a JSON definition
    Update {
        /// Path to the job JSON file
        file: PathBuf,
    },
    /// Trigger an immediate run of a job
    Run { name: String },
    /// Delete a job
    Delete { name: String },
    /// Kill all running tasks of a job
    Kill { name: String },
    /// Show run-time statistics of a job
    Stat { name: String },
    /// Show cluster members and the current endpoint
    Members,
}

impl Cli {
    fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        if let Some(user) = &self.user {
            config.http_basic_auth_user = Some(user.clone());
        }
        if let Some(password) = &self.password {
            config.http_basic_password = Some(password.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chronos=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = Client::new(cli.client_config()?)?;
    let format = cli.format;

    let result = match cli.command {
        Commands::Jobs => commands::jobs::list(&client, format).await,
        Commands::Job { name } => commands::jobs::show(&client, &name, format).await,
        Commands::Create { file } => commands::jobs::create(&client, &file).await,
        Commands::Update { file } => commands::jobs::update(&client, &file).await,
        Commands::Run { name } => commands::jobs::run(&client, &name).await,
        Commands::Delete { name } => commands::jobs::delete(&client, &name).await,
        Commands::Kill { name } => commands::jobs::kill(&client, &name).await,
        Commands::Stat { name } => commands::stats::show(&client, &name, format).await,
        Commands::Members => commands::stats::members(&client, format),
    };

    client.cluster().shutdown();
    result
}
