use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use fsfacade_core::{FacadeConfig, Filesystem};
use fsfacade_platform::{
    with_allow_creation_of_directory_structure, with_allow_overwrite, with_content_operation,
    with_directory_structure_mode, with_mode, Argument, ContentOperation, Mode,
};

#[derive(Parser, Debug)]
#[command(name = "fsfacade")]
#[command(about = "Read, write and create files through the filesystem facade")]
#[command(version)]
struct Cli {
    /// Path to config file with default modes and flags
    #[arg(long, env = "FSFACADE_CONFIG_PATH", global = true)]
    config_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "FSFACADE_LOG_LEVEL", global = true)]
    log_level: String,

    /// Abort the operation after this many seconds
    #[arg(long, env = "FSFACADE_TIMEOUT_SECS", global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Decode {
    Json,
    Yaml,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the content of a file
    Read {
        path: PathBuf,
        /// Decode the content and pretty-print it
        #[arg(long, value_enum)]
        decode: Option<Decode>,
    },
    /// Stream the content of a file to stdout
    Stream { path: PathBuf },
    /// Print whether a file or directory exists
    Exists { path: PathBuf },
    /// Create an empty file
    CreateFile {
        path: PathBuf,
        /// File mode in octal (e.g. 644)
        #[arg(long)]
        mode: Option<Mode>,
        /// Mode for missing parent directories
        #[arg(long)]
        dir_mode: Option<Mode>,
        /// Create missing parent directories
        #[arg(long)]
        parents: bool,
        /// Truncate the file if it already exists
        #[arg(long)]
        overwrite: bool,
    },
    /// Write to an existing file, from --data or stdin
    Write {
        path: PathBuf,
        #[arg(long)]
        data: Option<String>,
        /// append or overwrite
        #[arg(long)]
        operation: Option<ContentOperation>,
    },
    /// Create a single directory
    Mkdir {
        path: PathBuf,
        /// Directory mode in octal (e.g. 755)
        #[arg(long)]
        mode: Option<Mode>,
        /// Mode for missing parent directories
        #[arg(long)]
        dir_mode: Option<Mode>,
        /// Create missing parent directories
        #[arg(long)]
        parents: bool,
    },
    /// Write the default config to the config path
    InitConfig {
        /// Replace an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config_path = cli
        .config_path
        .clone()
        .unwrap_or_else(FacadeConfig::default_path);

    if let Commands::InitConfig { force } = cli.command {
        if config_path.exists() && !force {
            anyhow::bail!(
                "config already exists at {} (use --force to replace)",
                config_path.display()
            );
        }
        FacadeConfig::default().save(&config_path)?;
        info!("wrote default config to {}", config_path.display());
        return Ok(());
    }

    let config = FacadeConfig::load_or_default(&config_path)?;
    debug!("effective config: {:?}", config);

    let fs = Filesystem::new();
    let timeout = cli.timeout_secs.map(Duration::from_secs);
    let command = cli.command;

    run_blocking(timeout, move || execute(&fs, &config, command)).await
}

/// Run a blocking facade call, optionally bounded by `timeout`.
///
/// The facade has no cancellation of its own; on timeout the blocking task is
/// abandoned and the error is returned immediately.
async fn run_blocking<F>(timeout: Option<Duration>, f: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(f);
    let joined = match timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .with_context(|| format!("operation timed out after {:?}", limit))?,
        None => task.await,
    };
    joined.context("filesystem task panicked")?
}

fn execute(fs: &Filesystem, config: &FacadeConfig, command: Commands) -> Result<()> {
    match command {
        Commands::Read { path, decode } => {
            let content = fs.read_content_of(&path)?;
            match decode {
                None => io::stdout().write_all(content.as_bytes())?,
                Some(Decode::Json) => {
                    let value: serde_json::Value = content
                        .decode_json()
                        .with_context(|| format!("{} is not valid JSON", path.display()))?;
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
                Some(Decode::Yaml) => {
                    let value: serde_yaml::Value = content
                        .decode_yaml()
                        .with_context(|| format!("{} is not valid YAML", path.display()))?;
                    print!("{}", serde_yaml::to_string(&value)?);
                }
            }
        }
        Commands::Stream { path } => {
            let mut reader = fs.stream_content_of(&path)?;
            let copied = io::copy(&mut reader, &mut io::stdout().lock());
            let closed = reader.close();
            let copied = copied.context("failed to copy stream to stdout")?;
            closed.with_context(|| format!("failed to close {}", path.display()))?;
            debug!("streamed {} bytes from {}", copied, path.display());
        }
        Commands::Exists { path } => {
            println!("{}", fs.check_if_exists(&path)?);
        }
        Commands::CreateFile {
            path,
            mode,
            dir_mode,
            parents,
            overwrite,
        } => {
            let mut args = config.file_arguments();
            push_overrides(&mut args, mode, dir_mode, parents);
            if overwrite {
                args.push(with_allow_overwrite(true));
            }
            fs.create_file(&path, &args)?;
            info!("created file {}", path.display());
        }
        Commands::Write {
            path,
            data,
            operation,
        } => {
            let mut args = config.write_arguments();
            if let Some(op) = operation {
                args.push(with_content_operation(op));
            }
            match data {
                Some(data) => fs.write_content_to(&path, data, &args)?,
                None => {
                    let stdin = io::stdin();
                    let mut input = stdin.lock();
                    fs.stream_content_to(&path, &mut input as &mut dyn Read, &args)?;
                }
            }
        }
        Commands::Mkdir {
            path,
            mode,
            dir_mode,
            parents,
        } => {
            let mut args = config.directory_arguments();
            push_overrides(&mut args, mode, dir_mode, parents);
            fs.create_directory(&path, &args)?;
            info!("created directory {}", path.display());
        }
        Commands::InitConfig { .. } => unreachable!("handled before dispatch"),
    }
    Ok(())
}

/// CLI flags go after config-derived arguments so they take precedence
fn push_overrides(
    args: &mut Vec<Argument>,
    mode: Option<Mode>,
    dir_mode: Option<Mode>,
    parents: bool,
) {
    if let Some(mode) = mode {
        args.push(with_mode(mode));
    }
    if let Some(dir_mode) = dir_mode {
        args.push(with_directory_structure_mode(dir_mode));
    }
    if parents {
        args.push(with_allow_creation_of_directory_structure(true));
    }
}
