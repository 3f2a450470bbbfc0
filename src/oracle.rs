//! This module holds everything needed to get a completion out of a language model. The bot talks to
//! the model twice per question: once to pick an API method and once to turn the data into prose.
//!
//! The model is hidden behind the `CompletionOracle` trait. The only implementation shipped is the
//! OpenRouter chat completions client, which keeps to the small slice of the platform's API this
//! project needs.

use std::time::Duration;

use console::style;
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ureq::Agent;

/// The system message sent ahead of every prompt.
const SYSTEM_PROMPT: &str = "You are EsportsBot, an assistant that answers questions about esports \
tournament earnings. Follow the instructions in each request exactly and never invent figures that \
are not present in the data you are given.";

/// This enum holds the ways a completion request can fail. The status-based variants follow the
/// error codes listed in the OpenRouter documentation.
#[expect(
    clippy::arbitrary_source_item_ordering,
    reason = "It's easier to maintain if the errors are in the same order as the ones specified in the OpenRouter docs."
)]
#[derive(thiserror::Error, Debug)]
pub(crate) enum CompletionError {
    #[error("{}", style("bad request").bold().underlined())]
    BadRequest,
    #[error("{}", style("invalid credentials").bold().underlined())]
    InvalidCredentials,
    #[error("{}", style("insufficient credits").bold().underlined())]
    InsufficientCredits,
    #[error("{}", style("flagged input").bold().underlined())]
    FlaggedInput,
    #[error("{}", style("timed out").bold().underlined())]
    TimedOut,
    #[error("{}", style("rate limited").bold().underlined())]
    RateLimited,
    #[error("{}", style("model down or invalid response").bold().underlined())]
    DownOrInvalid,
    #[error("{}", style("no available providers").bold().underlined())]
    NoProviders,
    #[error("{}", style("the model returned an empty answer").bold().underlined())]
    Empty,
    #[error("{}: {}", style("could not reach the model").bold().underlined(), .0)]
    Transport(String),
    #[error("{}", style("unknown error").bold().underlined())]
    Unknown,
}

impl From<ureq::Error> for CompletionError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => match code {
                400 => Self::BadRequest,
                401 => Self::InvalidCredentials,
                402 => Self::InsufficientCredits,
                403 => Self::FlaggedInput,
                408 => Self::TimedOut,
                429 => Self::RateLimited,
                502 => Self::DownOrInvalid,
                503 => Self::NoProviders,
                _ => Self::Unknown,
            },
            ureq::Error::Timeout(_) => Self::TimedOut,
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Anything that turns one free-text prompt into one free-text completion.
pub(crate) trait CompletionOracle {
    /// This function sends `prompt` to the model and returns its answer.
    fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[expect(
    clippy::arbitrary_source_item_ordering,
    reason = "The JSON schema needs the fields to be in this order."
)]
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
struct Message {
    role: Role,
    content: String,
}

impl Message {
    fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_owned(),
        }
    }
}

#[derive(Serialize)]
struct Request {
    messages: Vec<Message>,
    model: String,
}

impl Request {
    fn new(prompt: &str, model: &str) -> Self {
        Self {
            messages: vec![
                Message::new(Role::System, SYSTEM_PROMPT),
                Message::new(Role::User, prompt),
            ],
            model: model.to_owned(),
        }
    }
}

/// Only the part of the chat completion response the bot reads. Every other field is ignored.
#[derive(Deserialize)]
struct Response {
    choices: Vec<ResponseChoice>,
}

#[derive(Deserialize)]
struct ResponseChoice {
    message: Message,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Role {
    Assistant,
    System,
    User,
}

/// This struct is a client for an OpenRouter-compatible chat completions endpoint.
pub(crate) struct OpenRouter {
    /// This field contains the HTTP agent, already configured with the per-call timeout.
    agent: Agent,
    /// This field contains the key sent as a bearer token.
    api_key: String,
    /// This field contains the full URL of the chat completions endpoint.
    endpoint: String,
    /// This field contains the model identifier as listed by OpenRouter.
    model: String,
}

impl OpenRouter {
    /// This function creates a new client. Nothing is sent until the first completion.
    pub(crate) fn new(agent: Agent, endpoint: &str, api_key: &str, model: &str) -> Self {
        Self {
            agent,
            api_key: api_key.to_owned(),
            endpoint: endpoint.to_owned(),
            model: model.to_owned(),
        }
    }

    /// This function performs the actual round trip, without any terminal feedback.
    fn send(&self, prompt: &str) -> Result<String, CompletionError> {
        let request_body = Request::new(prompt, &self.model);
        let response = self
            .agent
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send_json(&request_body)?;
        let response: Response = response.into_body().read_json()?;

        first_completion(response)
    }
}

impl CompletionOracle for OpenRouter {
    fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_message("Thinking...");
        spinner.enable_steady_tick(Duration::from_millis(50));

        debug!(model = %self.model, prompt_len = prompt.len(), "requesting completion");
        let result = self.send(prompt);
        spinner.finish_and_clear();

        result
    }
}

/// This function pulls the text out of the first choice. A blank answer is reported as an error
/// rather than waited out.
fn first_completion(response: Response) -> Result<String, CompletionError> {
    let output = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .unwrap_or_default();

    if output.trim().is_empty() {
        return Err(CompletionError::Empty);
    }

    Ok(output)
}
