//! The app module wires the bot together and runs the question loop.
//!
//! It contains the `init()` function that parses the command line, sets up logging, loads the game
//! table and builds the clients, as well as the code that prints answers and errors to the terminal.

use std::path::PathBuf;
use std::{env, io};
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use console::{style, Term};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ureq::Agent;

use crate::catalog::OperationCatalog;
use crate::dispatch::{Dispatcher, HttpTransport};
use crate::input::{exit, take_query};
use crate::lookup::NameLookupTable;
use crate::oracle::OpenRouter;
use crate::pipeline::{Answer, Pipeline, QueryError};

/// The model used when none is given.
const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";
/// The log directive used when `RUST_LOG` is unset: warnings from this crate and nothing else.
const DEFAULT_LOG_DIRECTIVE: &str = "esportsbot=warn";
/// The OpenRouter endpoint listing every available model.
const MODELS_URL: &str = "https://openrouter.ai/api/v1/models";

/// This struct holds the command-line interface of the bot. Every option that carries a secret or
/// an address can also be set through an environment variable.
#[derive(Parser)]
#[command(name = "esportsbot", version, about)]
#[command(next_line_help = true)]
struct Cli {
    /// The OpenRouter API key used for both routing and summarizing.
    #[arg(long)]
    #[arg(env = "OPENROUTER_API_KEY", value_name = "YOUR_API_KEY")]
    api_key: String,
    /// The esports earnings API key, sent along with every statistics request.
    #[arg(long)]
    #[arg(env = "ESPORTS_API_KEY", value_name = "YOUR_API_KEY")]
    esports_api_key: String,
    /// The root of the esports earnings API; method names are appended to it.
    #[arg(long, default_value = "http://api.esportsearnings.com/v0/")]
    #[arg(env = "ESPORTS_API_URL", value_name = "URL")]
    esports_url: String,
    /// The output format to request from the esports earnings API, if any.
    #[arg(long)]
    #[arg(env = "ESPORTS_API_FORMAT", value_name = "FORMAT")]
    format: Option<String>,
    /// A CSV file mapping game names to their esports earnings identifiers.
    ///
    /// The first header ending in "id" is read as the identifier and the first header containing
    /// "name" as the game's name. A missing file only means game names cannot be looked up.
    #[arg(long, default_value = "games.csv")]
    #[arg(env = "ESPORTS_GAMES_FILE", value_name = "PATH")]
    games: PathBuf,
    /// The model name to produce the answers; DeepSeek's V3 by default.
    ///
    /// Models are processed by the string right below their public brand name in their respective
    /// OpenRouter model page. If you want to set it to anything other than the default free model,
    /// you will have to use that name.
    #[arg(short, long, value_parser = verify_model)]
    #[arg(env = "OPENROUTER_MODEL", value_name = "MODEL_NAME")]
    model: Option<String>,
    /// The chat completions endpoint to send prompts to.
    #[arg(long, default_value = "https://openrouter.ai/api/v1/chat/completions")]
    #[arg(env = "OPENROUTER_URL", value_name = "URL")]
    oracle_url: String,
    /// Answer this single question and exit instead of prompting for questions.
    #[arg(short, long, value_name = "QUESTION")]
    query: Option<String>,
    /// How long any single request may take, in seconds.
    #[arg(long, default_value_t = 60)]
    #[arg(env = "ESPORTSBOT_TIMEOUT", value_name = "SECONDS")]
    timeout: u64,
}

/// It makes up one of the fields the request to fetch models from the OpenRouter API requires. This
/// structure doesn't support all of the mandatory and optional fields because the request is only
/// interested in the model id.
#[derive(Deserialize)]
struct Data {
    /// This field contains the name to be used on post requests in the model field for OpenRouter
    /// POST API requests.
    id: String,
}

/// This structure contains the main form of the response returned by an OpenRouter API request for
/// the list of all models available for use in the API.
#[derive(Deserialize)]
struct ModelResponse {
    /// This field contains the list of models, each abstracted as another struct to deserialize.
    data: Vec<Data>,
}

/// Starts the bot and handles everything up to the last answer. This is a `main()` function of
/// sorts though it is still called from main.rs.
///
/// With `--query` a single question is answered and the function returns; otherwise the user is
/// prompted for questions until they decline to ask another one. A failed question is reported
/// and does not end the loop.
///
/// # Errors
///
/// The function may return any one of the following errors:
///
/// - io::Error, when the terminal cannot be written to
/// - dialoguer::Error, when input cannot be read
/// - csv::Error, when the game table exists but cannot be read
/// - the failure of the question given with `--query`
pub fn init() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let term = Term::stdout();
    let catalog = OperationCatalog::esports_earnings();
    let table = NameLookupTable::load(&cli.games)?;
    let agent: Agent = Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(cli.timeout)))
        .build()
        .into();
    let model = cli.model.as_deref().unwrap_or(DEFAULT_MODEL);
    let oracle = OpenRouter::new(agent.clone(), &cli.oracle_url, &cli.api_key, model);
    let dispatcher = Dispatcher::new(
        Box::new(HttpTransport::new(agent)),
        &cli.esports_url,
        &cli.esports_api_key,
        cli.format.as_deref(),
    );
    let pipeline = Pipeline::new(&catalog, &table, &oracle, &dispatcher);
    info!(model, games = table.len(), "esportsbot ready");

    if let Some(query) = cli.query.as_deref().map(str::trim) {
        if query.is_empty() {
            return Ok(());
        }

        return match pipeline.answer(query) {
            Ok(answer) => show_answer(&term, &answer),
            Err(err) => {
                show_error(&term, &err)?;
                Err(anyhow!("the question could not be answered"))
            }
        };
    }

    // show the init message
    init_message(&term, &table)?;

    // question loop
    loop {
        let query = take_query(&term)?;

        match pipeline.answer(&query) {
            Ok(answer) => show_answer(&term, &answer)?,
            Err(err) => show_error(&term, &err)?,
        }

        if !exit(&term)? {
            break Ok(());
        }

        term.clear_screen()?;
    }
}

/// This function sets up logging to stderr, so log lines never mix with answers. The level is
/// taken from `RUST_LOG` and defaults to this crate's warnings only.
fn init_logging() -> Result<()> {
    let directives = env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(log_filter(&directives)?)
        .try_init()
        .map_err(|err| anyhow!(err))
}

/// This function builds the log filter out of `RUST_LOG`-style directives, falling back to
/// `DEFAULT_LOG_DIRECTIVE` when there are none. Directives that do not parse are skipped.
fn log_filter(directives: &str) -> Result<EnvFilter> {
    Ok(EnvFilter::builder()
        .with_default_directive(DEFAULT_LOG_DIRECTIVE.parse()?)
        .parse_lossy(directives))
}

/// This function initializes the message to be used at the start of the program. The screen is
/// cleared and the title of the console window is set to the name of the bot.
fn init_message(term: &Term, table: &NameLookupTable) -> Result<()> {
    const MSG: &str = "Welcome to EsportsBot";

    term.clear_screen()?;
    term.set_title("esportsbot");
    term.write_line(&format!("{}", style(MSG).bold()))?;

    if table.is_empty() {
        term.write_line(&format!(
            "{}",
            style("No game table loaded; refer to games by their numeric id.").yellow()
        ))?;
    }

    Ok(())
}

/// This function prints the summary, followed by the image links found in it, if any.
fn show_answer(term: &Term, answer: &Answer) -> Result<()> {
    let summary = answer.summary();

    term.write_line(&format!("{}", style(summary.text()).bold()))?;

    if !summary.media_links().is_empty() {
        term.write_line("")?;
        term.write_line(&format!("{}", style("Images").bold().underlined()))?;
        for link in summary.media_links() {
            term.write_line(&format!("  {}", style(link).cyan()))?;
        }
    }

    term.write_line(&format!(
        "{}",
        style(format!("source: {}", answer.source())).dim()
    ))?;

    Ok(())
}

/// This function prints why a question could not be answered.
fn show_error(term: &Term, err: &QueryError) -> Result<()> {
    term.write_line(&format!("{} {err}", style("error:").red().bold()))?;

    Ok(())
}

/// This function serves as a value parser for the command line argument parser in the `model`
/// field. It basically makes a request to the OpenRouter API to retrieve the list of available
/// models to use through their API and checks if the string passed by clap matches any one of the
/// strings retrieved in the request.
fn verify_model(string: &str) -> Result<String, String> {
    let response: ModelResponse = ureq::get(MODELS_URL)
        .call()
        .and_then(|response| response.into_body().read_json())
        .map_err(|err| {
            format!(
                "There's been an error checking the requested model with the OpenRouter API: {err}"
            )
        })?;

    if response.data.iter().any(|data| data.id == string) {
        Ok(string.to_owned())
    } else {
        Err("The requested model could not be found with the OpenRouter API.".to_owned())
    }
}
