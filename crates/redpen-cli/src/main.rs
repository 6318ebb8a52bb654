mod render;
mod review;

use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use redpen_common::telemetry::{self, TelemetryConfig};
use redpen_common::{
    AnalyzeOutcome, Analyzer, ConnectionConfig, CorrectionOracle, FileStore, OllamaClient,
    OracleError, RedpenError, RetryPolicy, connect, default_config_path, first_model,
};
use redpen_core::{AnnotatedDocument, DiffOptions, ReviewDocument, annotate_with, to_html, to_json_pretty};

use crate::review::{ReviewSession, Step};

#[derive(Parser)]
#[command(
    version,
    about = "Redpen - grammar review with accept/reject suggestions",
    long_about = None
)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to config file (.toml or .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server URL, overrides REDPEN_BASE_URL and the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Bearer token for the server
    #[arg(long, global = true)]
    token: Option<String>,

    /// Model to use for corrections
    #[arg(long, short, global = true)]
    model: Option<String>,

    /// More logging (-v debug, -vv trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Correct a text and print the suggestions
    Check {
        /// Text file to check; stdin when omitted or "-"
        input: Option<PathBuf>,

        #[arg(long, short, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Write the result here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Annotate the difference between two files without a server
    Diff {
        original: PathBuf,
        corrected: PathBuf,

        #[arg(long, short, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Keep leading whitespace the corrected text adds
        #[arg(long)]
        keep_leading_whitespace: bool,
    },
    /// Step through suggestions interactively and write the result
    Review {
        /// Text file to review
        input: PathBuf,

        /// Use this file as the correction instead of asking the server
        #[arg(long)]
        corrected: Option<PathBuf>,

        /// Where to write the reviewed text; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Check the connection and list the server's models
    Models,
    /// Show or change the stored configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Store values in the config file. Global flags (--base-url, --token,
    /// --model) are saved too.
    Set {
        /// Total connection attempts
        #[arg(long)]
        retries: Option<u32>,

        /// Delay between attempts in milliseconds
        #[arg(long)]
        retry_delay_ms: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Inline [-removed-]{+added+} markers
    Text,
    /// Node tree with diffHighlight marks
    Json,
    /// Paragraph with data-diff-type spans
    Html,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.clone().or_else(default_config_path);

    match &cli.command {
        Commands::Check {
            input,
            format,
            output,
        } => {
            let config = effective_config(&cli, config_path.as_deref())?;
            let text = read_input(input.as_deref())?;
            check(config, &text, *format, output.as_deref()).await?;
        }
        Commands::Diff {
            original,
            corrected,
            format,
            keep_leading_whitespace,
        } => {
            let original = read_file(original)?;
            let corrected = read_file(corrected)?;
            let options = DiffOptions {
                strip_leading_whitespace: !keep_leading_whitespace,
                ..Default::default()
            };
            let doc = annotate_with(&original, &corrected, options);
            write_output(&format_document(&doc, *format)?, None)?;
            eprintln!("{}", render::summary(&doc));
        }
        Commands::Review {
            input,
            corrected,
            output,
        } => {
            let config = effective_config(&cli, config_path.as_deref())?;
            let text = read_file(input)?;
            review(config, &text, corrected.as_deref(), output.as_deref()).await?;
        }
        Commands::Models => {
            let config = effective_config(&cli, config_path.as_deref())?;
            list_models(config).await?;
        }
        Commands::Config { action } => {
            config_command(&cli, action, config_path.as_deref())?;
        }
    }

    Ok(())
}

/// Defaults, file, environment, then command-line flags.
fn effective_config(cli: &Cli, path: Option<&Path>) -> Result<ConnectionConfig, RedpenError> {
    let config = ConnectionConfig::load(path)?;
    Ok(apply_flags(cli, config)?)
}

fn apply_flags(
    cli: &Cli,
    mut config: ConnectionConfig,
) -> Result<ConnectionConfig, redpen_common::ConfigError> {
    if let Some(url) = &cli.base_url {
        config.base_url = ConnectionConfig::parse_url(url)?;
    }
    if let Some(token) = &cli.token {
        config.token = Some(token.clone());
    }
    if let Some(model) = &cli.model {
        config.model = Some(model.clone());
    }
    Ok(config)
}

/// The configured model, or the first one the server offers.
async fn resolve_model(client: &OllamaClient) -> Result<String, OracleError> {
    if let Some(model) = &client.config().model {
        return Ok(model.clone());
    }
    let model = first_model(client, client.config().retry).await?;
    tracing::info!(%model, "no model configured, using the first available");
    Ok(model)
}

async fn correct_text<O: CorrectionOracle + Sync>(
    analyzer: &Analyzer<O>,
    text: &str,
    model: &str,
) -> Result<Option<AnnotatedDocument>, OracleError> {
    match analyzer.analyze(text, model).await? {
        AnalyzeOutcome::Annotated(doc) => Ok(Some(doc)),
        AnalyzeOutcome::NoCorrection => {
            eprintln!("The model returned no correction.");
            Ok(None)
        }
        AnalyzeOutcome::Busy => Ok(None),
    }
}

async fn check(
    config: ConnectionConfig,
    text: &str,
    format: Format,
    output: Option<&Path>,
) -> Result<()> {
    let client = OllamaClient::new(config);
    let model = resolve_model(&client).await?;
    let analyzer = Analyzer::new(client);

    let Some(doc) = correct_text(&analyzer, text, &model).await? else {
        return Ok(());
    };
    write_output(&format_document(&doc, format)?, output)?;
    eprintln!("{}", render::summary(&doc));
    Ok(())
}

async fn review(
    config: ConnectionConfig,
    text: &str,
    corrected: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let client = OllamaClient::new(config);
    let analyzer = Analyzer::new(client);
    let mut model = None;

    let doc = match corrected {
        Some(path) => redpen_core::annotate(text, &read_file(path)?),
        None => {
            let chosen = resolve_model(analyzer.oracle()).await?;
            let doc = correct_text(&analyzer, text, &chosen).await?;
            model = Some(chosen);
            match doc {
                Some(doc) => doc,
                None => return Ok(()),
            }
        }
    };

    let mut session = ReviewSession::new(doc);
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    eprintln!("{}", review::HELP);
    loop {
        eprintln!("\n{}", session.display());
        if session.is_done() {
            break;
        }
        eprint!("> ");
        std::io::stderr().flush().into_diagnostic()?;

        let Some(line) = lines.next() else {
            break;
        };
        match session.apply(&line.into_diagnostic()?) {
            Step::Continue => {}
            Step::Quit => break,
            Step::Help => eprintln!("{}", review::HELP),
            Step::Unknown(input) => eprintln!("unknown command '{input}', ? for help"),
            Step::Analyze => {
                let chosen = match &model {
                    Some(chosen) => chosen.clone(),
                    None => resolve_model(analyzer.oracle()).await?,
                };
                let current = session.text();
                match analyzer.analyze(&current, &chosen).await {
                    Ok(AnalyzeOutcome::Annotated(doc)) => session.load(doc),
                    Ok(AnalyzeOutcome::NoCorrection) => {
                        eprintln!("The model returned no correction.")
                    }
                    Ok(AnalyzeOutcome::Busy) => {}
                    Err(e) => eprintln!("{}", e.user_message()),
                }
                model = Some(chosen);
            }
        }
    }

    let pending = session.reviewer().document().pending_count();
    if pending > 0 {
        tracing::warn!(pending, "unresolved suggestions keep their original wording");
    }
    let mut document = session.reviewer().document().clone();
    document.reject_all();
    write_output(&document.rendered_text(), output)?;
    Ok(())
}

async fn list_models(config: ConnectionConfig) -> Result<()> {
    let retry = config.retry;
    let url = config.base_url.to_string();
    let client = OllamaClient::new(config);
    let status = connect(&client, retry).await;

    if let Some(error) = &status.error {
        return Err(miette::miette!(help = "is the server running?", "{url}: {error}"));
    }
    if status.models.is_empty() {
        println!("Connected to {url}, but no models are installed.");
    } else {
        println!("✓ Connected to {url}");
        for model in &status.models {
            println!("  {model}");
        }
    }
    Ok(())
}

fn config_command(cli: &Cli, action: &ConfigCommand, path: Option<&Path>) -> Result<()> {
    match action {
        ConfigCommand::Show => {
            let mut shown = effective_config(cli, path)?;
            if shown.token.is_some() {
                shown.token = Some("********".into());
            }
            println!("base_url = {}", shown.base_url);
            println!("token    = {}", shown.token.as_deref().unwrap_or("(none)"));
            println!("model    = {}", shown.model.as_deref().unwrap_or("(first available)"));
            println!(
                "retry    = {} attempts, {} ms apart",
                shown.retry.attempts(),
                shown.retry.delay.as_millis()
            );
        }
        ConfigCommand::Path => match path {
            Some(path) => println!("{}", path.display()),
            None => return Err(miette::miette!("could not determine config directory")),
        },
        ConfigCommand::Set {
            retries,
            retry_delay_ms,
        } => {
            let path =
                path.ok_or_else(|| miette::miette!("could not determine config directory"))?;
            let store = FileStore::new(path);
            // Environment values are not persisted.
            let stored = if path.exists() {
                store.load()?
            } else {
                ConnectionConfig::default()
            };
            let mut config = apply_flags(cli, stored)?;
            if let Some(retries) = retries {
                config.retry.max_attempts = *retries;
            }
            if let Some(ms) = retry_delay_ms {
                config.retry = RetryPolicy {
                    delay: Duration::from_millis(*ms),
                    ..config.retry
                };
            }
            store.save(&config)?;
            println!("✓ Saved {}", store.path().display());
        }
    }
    Ok(())
}

fn format_document(doc: &AnnotatedDocument, format: Format) -> Result<String, RedpenError> {
    Ok(match format {
        Format::Text => render::markup(doc, None),
        Format::Json => to_json_pretty(doc)?,
        Format::Html => to_html(doc),
    })
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => read_file(path),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .into_diagnostic()?;
            Ok(text)
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("failed to read {}: {e}", path.display()))
}

fn write_output(contents: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, contents).map_err(RedpenError::from)?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => println!("{contents}"),
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let mut config = TelemetryConfig::from_env("redpen");
    match verbose {
        0 => {}
        1 => config = config.with_level(tracing::Level::DEBUG),
        _ => config = config.with_level(tracing::Level::TRACE),
    }
    telemetry::init(config);
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
