use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use bap_ida_bridge::config::{Config, FileBackend, DEFAULT_SECTION};
use bap_ida_bridge::discovery::SystemProbe;
use bap_ida_bridge::exec::ProcessExecutor;
use bap_ida_bridge::terminal::TerminalHost;
use bap_ida_bridge::{logging, normalize_input_path, resolver, RunMode, RunOutcome, Runner};

#[derive(Parser, Debug)]
#[command(name = "bap-ida-bridge", version, about = "Run BAP on a binary with the settings of the IDA plugin")]
struct Cli {
    /// Enable debug output
    #[arg(short = 'd', long = "debug", global = true, default_value_t = false)]
    debug: bool,

    /// Configuration file [default: $IDAUSR/cfg/bap.cfg or ~/.idapro/cfg/bap.cfg]
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run bap against a binary and print the report
    Run(RunArgs),
    /// Find bap and store its path, asking where needed
    Configure,
    /// Read or change stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Binary to analyse (path or file:// URI)
    input: String,

    /// Extra arguments for bap, as a single string
    #[arg(short = 'a', long = "args", default_value = "", allow_hyphen_values = true)]
    args: String,

    /// Skip symbol and header export, run `bap <input> <args>` only
    #[arg(long = "minimal", default_value_t = false)]
    minimal: bool,

    /// C header to register through bap's API [default: an empty header]
    #[arg(long = "header")]
    header: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long = "json", default_value_t = false)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print a stored value
    Get {
        key: String,
        #[arg(long = "section", default_value = DEFAULT_SECTION)]
        section: String,
    },
    /// Store a value
    Set {
        key: String,
        value: String,
        #[arg(long = "section", default_value = DEFAULT_SECTION)]
        section: String,
    },
    /// Remove a stored value
    Unset {
        key: String,
        #[arg(long = "section", default_value = DEFAULT_SECTION)]
        section: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _logger = match logging::init(cli.debug) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Warning: {:#}", e);
            None
        }
    };

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if logging::is_debug() {
                eprintln!("Error: {:?}", e);
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config)?;
    match cli.command {
        Commands::Run(args) => run(&mut config, args),
        Commands::Configure => configure(&mut config),
        Commands::Config { action } => edit_config(&mut config, action),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let path = match path {
        Some(path) => path,
        None => FileBackend::default_location()
            .ok_or_else(|| anyhow!("Cannot find a home directory for the config; pass --config"))?,
    };
    log::debug!("Using config {}", path.display());
    Config::load(Box::new(FileBackend::new(path)))
}

fn run(config: &mut Config, args: RunArgs) -> Result<()> {
    let mode = if args.minimal {
        RunMode::Minimal
    } else {
        RunMode::Full
    };
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut host = TerminalHost::new(stdin.lock(), stdout.lock(), normalize_input_path(&args.input))
        .header_source(args.header)
        .json(args.json)
        .prompt_to(Box::new(io::stderr()));
    let mut executor = ProcessExecutor;
    let probe = SystemProbe;

    match Runner::new(config, &mut host, &mut executor, &probe).run(&args.args, mode)? {
        RunOutcome::NotConfigured => log::info!("bap executable is not configured, nothing was run"),
        RunOutcome::Completed(report) => {
            log::debug!("bap produced {} bytes of output", report.output.len())
        }
    }
    Ok(())
}

fn configure(config: &mut Config) -> Result<()> {
    {
        let stdin = io::stdin();
        let mut dialogs = TerminalHost::new(stdin.lock(), io::stderr(), PathBuf::new());
        resolver::ensure_configured(config, &mut dialogs, &SystemProbe)?;
    }
    match config.executable_path() {
        Some(path) => println!("bap_executable_path = {}", path.display()),
        None => println!("bap_executable_path is not set"),
    }
    println!("[bap_api] enabled = {}", config.api_enabled());
    Ok(())
}

fn edit_config(config: &mut Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Get { key, section } => match config.get(&key, &section) {
            Some(value) => println!("{}", value),
            None => bail!("{} is not set in section {}", key, section),
        },
        ConfigAction::Set {
            key,
            value,
            section,
        } => config.set(&key, &value, &section)?,
        ConfigAction::Unset { key, section } => {
            if !config.unset(&key, &section)? {
                log::info!("{} was not set in section {}", key, section);
            }
        }
    }
    Ok(())
}
