//! `pc`: clean error-report payloads and URLs from the command line.

use clap::{Args, Parser, Subcommand};
use pc_cli::{
    init_logging, run_clean, run_config_show, run_config_validate, run_url, CliError, ExitCode,
    LogConfig, LogFormat, LogLevel,
};
use pc_config::{load_config, LoadOptions, LoadedConfig, PresetName};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::debug;

/// Scrub sensitive data from error-report payloads
#[derive(Parser)]
#[command(name = "pc")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Cleaner config file (JSON or TOML)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Built-in preset: default, strict, none
    #[arg(long, global = true, value_name = "NAME")]
    preset: Option<PresetName>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a JSON payload read from FILE or stdin
    Clean(CleanArgs),

    /// Filter sensitive query parameters out of URLs
    Url(UrlArgs),

    /// Inspect or validate configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct CleanArgs {
    /// Input file; reads stdin when omitted or "-"
    file: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args, Debug)]
struct UrlArgs {
    /// URLs to clean
    #[arg(required = true)]
    urls: Vec<String>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration and its source
    Show,

    /// Validate a config file
    Validate {
        /// Config file to check
        file: PathBuf,
    },
}

fn main() -> std::process::ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // Help and version requests are not failures.
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            return code.into();
        }
    };

    let log_config = LogConfig::from_env(cli.global.log_level, cli.global.log_format);
    init_logging(&log_config);

    let exit_code = match run(&cli) {
        Ok(()) => ExitCode::Clean,
        Err(err) => {
            let code = err.exit_code();
            debug!(code = code.code_name(), "command failed");
            eprintln!("pc: {err}");
            code
        }
    };
    exit_code.into()
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match &cli.command {
        Commands::Clean(args) => {
            let cleaner = load(&cli.global)?.config.build_cleaner()?;
            match args.file.as_deref().filter(|p| p.as_os_str() != "-") {
                Some(path) => {
                    let file = File::open(path).map_err(CliError::Read)?;
                    run_clean(&cleaner, BufReader::new(file), &mut out, args.pretty)?;
                }
                None => run_clean(&cleaner, io::stdin().lock(), &mut out, args.pretty)?,
            }
        }
        Commands::Url(args) => {
            let cleaner = load(&cli.global)?.config.build_cleaner()?;
            run_url(&cleaner, &args.urls, &mut out)?;
        }
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => run_config_show(&load(&cli.global)?, &mut out)?,
            ConfigCommands::Validate { file } => run_config_validate(file, &mut out)?,
        },
    }

    out.flush()?;
    Ok(())
}

fn load(global: &GlobalOpts) -> Result<LoadedConfig, CliError> {
    let options = LoadOptions {
        config_path: global.config.clone(),
        preset: global.preset,
    };
    Ok(load_config(&options)?)
}
