//! The dispatch module sends a normalized request to the esports earnings API and decodes what comes
//! back.
//!
//! Every call is a single GET with the credential appended to the query. There is no retry and no
//! caching, even when the same request is made twice in a row.

use std::time::Duration;

use console::style;
use indicatif::ProgressBar;
use serde_json::Value;
use tracing::debug;
use ureq::Agent;

use crate::normalizer::DispatchRequest;

/// The query parameter that carries the service credential.
const API_KEY_PARAM: &str = "apikey";
/// The query parameter that selects the output format.
const FORMAT_PARAM: &str = "format";

/// This enum holds the ways a call to the statistics service can fail.
#[derive(thiserror::Error, Debug)]
pub(crate) enum DispatchError {
    #[error(
        "{}: {}",
        style("the statistics service sent something other than JSON").bold().underlined(),
        .0
    )]
    Decode(#[source] serde_json::Error),
    #[error(
        "{}",
        style("empty response from the statistics service, possibly invalid parameters")
            .bold()
            .underlined()
    )]
    EmptyResponse,
    #[error(
        "{}: {}",
        style("could not reach the statistics service").bold().underlined(),
        .0
    )]
    Transport(String),
}

/// The network seam of the dispatcher: one GET, returning the raw body.
pub(crate) trait StatsTransport {
    /// This function requests `url` with the given query parameters and returns the response body
    /// as text.
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<String, DispatchError>;
}

/// This struct is the real transport, backed by a `ureq` agent.
pub(crate) struct HttpTransport {
    /// This field contains the HTTP agent, already configured with the per-call timeout.
    agent: Agent,
}

impl HttpTransport {
    /// This function wraps an agent into a transport.
    pub(crate) const fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

impl StatsTransport for HttpTransport {
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<String, DispatchError> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_message("Fetching...");
        spinner.enable_steady_tick(Duration::from_millis(50));

        let mut request = self.agent.get(url);
        for pair in query {
            request = request.query(&pair.0, &pair.1);
        }
        let result = request
            .call()
            .and_then(|response| response.into_body().read_to_string())
            .map_err(|err| DispatchError::Transport(err.to_string()));
        spinner.finish_and_clear();

        result
    }
}

/// This struct turns normalized requests into calls against the statistics service.
pub(crate) struct Dispatcher {
    /// This field contains the service credential added to every call.
    api_key: String,
    /// This field contains the service root; always ends with a slash.
    base_url: String,
    /// This field contains the output format to ask for, when one was configured.
    format: Option<String>,
    /// This field contains the transport the calls go through.
    transport: Box<dyn StatsTransport>,
}

impl Dispatcher {
    /// This function creates a dispatcher for the service rooted at `base_url`.
    pub(crate) fn new(
        transport: Box<dyn StatsTransport>,
        base_url: &str,
        api_key: &str,
        format: Option<&str>,
    ) -> Self {
        let mut base_url = base_url.to_owned();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            api_key: api_key.to_owned(),
            base_url,
            format: format.map(ToOwned::to_owned),
            transport,
        }
    }

    /// This function makes exactly one call for `request` and decodes the body as JSON. A body with
    /// nothing but whitespace is reported as an empty response rather than decoded.
    pub(crate) fn dispatch(&self, request: &DispatchRequest<'_>) -> Result<Value, DispatchError> {
        let url = format!("{}{}", self.base_url, request.operation().name());
        let mut query: Vec<(String, String)> = request
            .params()
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();
        query.push((API_KEY_PARAM.to_owned(), self.api_key.clone()));
        if let Some(format) = self.format.as_deref() {
            query.push((FORMAT_PARAM.to_owned(), format.to_owned()));
        }

        debug!(%url, params = request.params().len(), "calling statistics service");
        let body = self
            .transport
            .get(&url, &query)
            .inspect_err(|err| debug!(%err, %url, "statistics call failed"))?;

        if body.trim().is_empty() {
            debug!(%url, "statistics service returned an empty body");
            return Err(DispatchError::EmptyResponse);
        }

        let value: Value = serde_json::from_str(&body).map_err(DispatchError::Decode)?;
        debug!(bytes = body.len(), "statistics response decoded");

        Ok(value)
    }
}
