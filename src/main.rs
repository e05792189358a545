use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use lexifix::app::{Controller, Submission, Update};
use lexifix::cli::output::{self, OutputFormat};
use lexifix::provider::{CorrectionProvider, GeminiProvider};
use lexifix::{logging, Config, Strategy};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const EXIT_CHANGES: i32 = 1;
const EXIT_REFUSED: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "lexifix")]
#[command(version, about = "AI spell and grammar checker", long_about = None)]
struct Cli {
    /// Text to check (reads --file or stdin when omitted)
    #[arg(value_name = "TEXT", conflicts_with = "file")]
    text: Vec<String>,

    /// Read the text from a file ("-" for stdin)
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Prompt for text repeatedly until ":q"
    #[arg(short, long, conflicts_with_all = ["text", "file"])]
    interactive: bool,

    /// How changed words are located (positional, pairs)
    #[arg(short, long)]
    strategy: Option<Strategy>,

    /// Gemini model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Output format (text, json)
    #[arg(short = 'o', long, default_value = "text")]
    format: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Exit with code 0 even if words were changed
    #[arg(long)]
    no_fail: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration (API key masked)
    Show,
    /// Print the global config file path
    Path,
    /// Write a default global config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// How a single check ended, for the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckStatus {
    Clean,
    Changed,
    Informational,
    Refused,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Handle shell completion generation
    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "lexifix", &mut io::stdout());
        return Ok(());
    }

    // GEMINI_API_KEY and RUST_LOG may live in a .env file
    let dotenv = dotenvy::dotenv();

    let colored = !cli.no_color && console::colors_enabled();
    colored::control::set_override(colored);
    logging::init_tracing(cli.verbose, !cli.no_color && console::colors_enabled_stderr());

    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "loaded .env");
    }

    // Handle subcommands
    if let Some(command) = cli.command.take() {
        return handle_command(command);
    }

    let config = Config::load(cli.model.clone(), cli.strategy)?;
    let provider = GeminiProvider::from_config(&config)
        .map(|p| p.map(|p| Arc::new(p) as Arc<dyn CorrectionProvider>));

    let mut controller = Controller::connect(provider, config.strategy);
    flush_notices(&mut controller, colored);

    if cli.interactive {
        return run_interactive(&mut controller, colored, &cli.format).await;
    }

    let text = read_input(&cli)?;
    let status = check_once(&mut controller, &text, colored, &cli.format).await?;

    // Exit with appropriate code
    match status {
        CheckStatus::Refused => std::process::exit(EXIT_REFUSED),
        CheckStatus::Changed if !cli.no_fail => std::process::exit(EXIT_CHANGES),
        _ => Ok(()),
    }
}

fn read_input(cli: &Cli) -> Result<String> {
    if !cli.text.is_empty() {
        return Ok(cli.text.join(" "));
    }

    match &cli.file {
        Some(path) if path.as_os_str() == "-" => read_stdin(),
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display())),
        None if !io::stdin().is_terminal() => read_stdin(),
        None => anyhow::bail!("No text specified. Use --help for usage information."),
    }
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read stdin")?;
    Ok(text)
}

async fn check_once(
    controller: &mut Controller,
    text: &str,
    colored: bool,
    format: &OutputFormat,
) -> Result<CheckStatus> {
    let status = match controller.submit(text) {
        Submission::Started(request) => {
            let spinner = spinner(controller.state().trigger_label())?;

            let update = loop {
                tokio::select! {
                    update = controller.next_event() => match update {
                        Some(Update::Stale) => continue,
                        Some(update) => break update,
                        None => anyhow::bail!("Check task channel closed"),
                    },
                    _ = tokio::signal::ctrl_c() => {
                        debug!(request, "interrupt received");
                        controller.cancel();
                        break Update::Cancelled;
                    }
                }
            };
            spinner.finish_and_clear();

            match update {
                Update::Completed => {
                    let outcome = controller.state().outcome();
                    output::print_outcome(&outcome, controller.strategy(), colored, format)?;
                    if outcome.is_clean() {
                        CheckStatus::Clean
                    } else {
                        CheckStatus::Changed
                    }
                }
                Update::Failed => CheckStatus::Refused,
                Update::Cancelled | Update::Stale => CheckStatus::Informational,
            }
        }
        Submission::Offline => CheckStatus::Refused,
        Submission::Empty | Submission::Busy => CheckStatus::Informational,
    };

    flush_notices(controller, colored);
    Ok(status)
}

async fn run_interactive(
    controller: &mut Controller,
    colored: bool,
    format: &OutputFormat,
) -> Result<()> {
    println!("Enter text to check, or :q to quit.");

    loop {
        let line = tokio::task::spawn_blocking(|| {
            Input::<String>::new()
                .with_prompt("Text")
                .allow_empty(true)
                .interact_text()
        })
        .await
        .context("Input task failed")?;

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                debug!("input closed: {}", e);
                break;
            }
        };

        if matches!(line.trim(), ":q" | ":quit") {
            break;
        }

        check_once(controller, &line, colored, format).await?;
        println!();
    }

    Ok(())
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}

fn flush_notices(controller: &mut Controller, colored: bool) {
    for notice in controller.take_notices() {
        output::print_notice(&notice, colored);
    }
}

fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Config { action } => match action {
            ConfigCommands::Show => {
                let config = Config::load(None, None)?;
                print!("{}", config.redacted().to_toml()?);
            }
            ConfigCommands::Path => {
                let path = Config::global_config_path()
                    .context("Failed to determine config directory")?;
                println!("{}", path.display());
            }
            ConfigCommands::Init { force } => {
                let path = Config::global_config_path()
                    .context("Failed to determine config directory")?;
                Config::write_default(&path, force)?;
                println!("✓ Wrote {}", path.display());
            }
        },
    }
    Ok(())
}
