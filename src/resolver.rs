//! The resolver asks the model which API method answers the user's question, and with which
//! parameters.
//!
//! The model gives no guarantee about the shape of its reply, so the JSON object is cut out of the
//! surrounding text by `parse_reply()` and everything else is discarded. Whether the method exists
//! and has its parameters is checked later, by the normalizer.

use std::collections::BTreeMap;
use std::fmt;

use console::style;
use serde::Deserialize;
use tracing::debug;

use crate::catalog::OperationCatalog;
use crate::oracle::{CompletionError, CompletionOracle};

/// This enum holds the reasons the model's routing reply could not be turned into a decision.
#[derive(thiserror::Error, Debug)]
pub(crate) enum RoutingError {
    #[error(
        "{}: {}",
        style("the model could not route the question").bold().underlined(),
        .0
    )]
    Completion(#[from] CompletionError),
    #[error(
        "{}: {}",
        style("could not read the model's routing answer").bold().underlined(),
        .0
    )]
    Decode(#[source] serde_json::Error),
    #[error(
        "{}",
        style("the model's routing answer did not contain a JSON object").bold().underlined()
    )]
    Format,
}

/// A single parameter value as chosen by the model. The API only deals in strings and integers.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub(crate) enum ParamValue {
    /// This variant is used when the model wrote a JSON number.
    Integer(i64),
    /// This variant is used when the model wrote a JSON string.
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Integer(value) => write!(formatter, "{value}"),
            Self::Text(ref value) => formatter.write_str(value),
        }
    }
}

/// The model's pick: which method to call and what to pass it.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub(crate) struct RoutingDecision {
    /// This field contains the method name exactly as the model wrote it.
    endpoint: String,
    /// This field contains the parameters by name. A reply without a `params` object gets an empty
    /// map.
    #[serde(default)]
    params: BTreeMap<String, ParamValue>,
}

impl RoutingDecision {
    /// This function creates a decision by hand, the way a reply would have been decoded.
    #[cfg(test)]
    pub(crate) fn new(endpoint: &str, params: &[(&str, ParamValue)]) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
            params: params
                .iter()
                .map(|pair| (pair.0.to_owned(), pair.1.clone()))
                .collect(),
        }
    }

    /// This function returns the method name the model picked.
    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// This function splits the decision into its method name and parameters.
    pub(crate) fn into_parts(self) -> (String, BTreeMap<String, ParamValue>) {
        (self.endpoint, self.params)
    }
}

/// This function writes the routing prompt: the user's question, every method in the catalog and
/// the exact reply format the model has to use.
pub(crate) fn build_prompt(query: &str, catalog: &OperationCatalog) -> String {
    format!(
        "You route questions about esports earnings to the esports earnings API.\n\
         \n\
         User query: {query}\n\
         \n\
         Available endpoints:\n\
         {endpoints}\n\
         \n\
         Rules:\n\
         - Pick exactly one endpoint from the list above.\n\
         - Only use parameters listed for that endpoint, and always include the required ones.\n\
         - If you do not know a game's numeric id, set \"gameid\" to the game's name.\n\
         - If you do not know a player's numeric id, set \"playerid\" to the player's name.\n\
         - Only set \"offset\" when the user asks to go further down a ranking.\n\
         \n\
         Reply with exactly one JSON object and nothing else, in this shape:\n\
         {{\"endpoint\": \"<endpoint name>\", \"params\": {{\"<parameter>\": <value>}}}}\n",
        endpoints = catalog.describe(),
    )
}

/// This function cuts the JSON object out of the model's reply and decodes it. The object is taken
/// to span from the first opening brace to the last closing one, so prose around it is ignored.
pub(crate) fn parse_reply(reply: &str) -> Result<RoutingDecision, RoutingError> {
    let candidate = reply
        .find('{')
        .zip(reply.rfind('}'))
        .and_then(|(start, end)| reply.get(start..=end))
        .ok_or(RoutingError::Format)?;

    serde_json::from_str(candidate).map_err(RoutingError::Decode)
}

/// This function asks the model for a routing decision. There is exactly one attempt; a reply that
/// cannot be read ends the request.
pub(crate) fn resolve(
    query: &str,
    catalog: &OperationCatalog,
    oracle: &dyn CompletionOracle,
) -> Result<RoutingDecision, RoutingError> {
    let reply = oracle.complete(&build_prompt(query, catalog))?;

    parse_reply(&reply)
        .inspect(|decision| debug!(endpoint = decision.endpoint(), "routing decided"))
        .inspect_err(|err| debug!(%err, reply = %reply, "unusable routing reply"))
}
