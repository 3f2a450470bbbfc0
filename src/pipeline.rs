//! The pipeline chains the four steps of answering a question: route, normalize, fetch and
//! summarize. Each step runs only once the previous one has succeeded, and the first failure ends
//! the request.

use std::collections::BTreeMap;

use console::style;
use tracing::{debug, info_span};

use crate::catalog::OperationCatalog;
use crate::dispatch::{DispatchError, Dispatcher};
use crate::lookup::NameLookupTable;
use crate::normalizer::{normalize, NormalizeError};
use crate::oracle::{CompletionError, CompletionOracle};
use crate::resolver::{resolve, ParamValue, RoutingError};
use crate::summarizer::{summarize, Summary};

/// This enum holds every reason a question can go unanswered. Each variant is shown to the user as
/// is.
#[derive(thiserror::Error, Debug)]
pub(crate) enum QueryError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error(
        "{}: {}",
        style("the model could not summarize the data").bold().underlined(),
        .0
    )]
    Summary(#[from] CompletionError),
}

/// The outcome of a question that made it through every step.
#[derive(Debug)]
pub(crate) struct Answer {
    /// This field contains the method the question was routed to.
    endpoint: &'static str,
    /// This field contains the parameters the method was called with, game names resolved.
    params: BTreeMap<String, ParamValue>,
    /// This field contains the model's summary of the data.
    summary: Summary,
}

impl Answer {
    /// This function returns the name of the method that produced the data.
    pub(crate) const fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    /// This function returns the parameters sent along with the call.
    pub(crate) const fn params(&self) -> &BTreeMap<String, ParamValue> {
        &self.params
    }

    /// This function describes where the data came from, e.g. `LookupGameById(gameid=25)`.
    pub(crate) fn source(&self) -> String {
        let params = self
            .params()
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(", ");

        format!("{}({params})", self.endpoint())
    }

    /// This function returns the summary and its image links.
    pub(crate) const fn summary(&self) -> &Summary {
        &self.summary
    }
}

/// This struct borrows everything a question needs. The catalog and the lookup table are shared and
/// never written to.
pub(crate) struct Pipeline<'deps> {
    /// This field contains the methods a question can be routed to.
    catalog: &'deps OperationCatalog,
    /// This field contains the client for the statistics service.
    dispatcher: &'deps Dispatcher,
    /// This field contains the model used both to route and to summarize.
    oracle: &'deps dyn CompletionOracle,
    /// This field contains the game name table.
    table: &'deps NameLookupTable,
}

impl<'deps> Pipeline<'deps> {
    /// This function puts the pipeline together.
    pub(crate) const fn new(
        catalog: &'deps OperationCatalog,
        table: &'deps NameLookupTable,
        oracle: &'deps dyn CompletionOracle,
        dispatcher: &'deps Dispatcher,
    ) -> Self {
        Self {
            catalog,
            dispatcher,
            oracle,
            table,
        }
    }

    /// This function answers one question. The model is called twice and the statistics service
    /// once, strictly in that order; nothing is retried.
    pub(crate) fn answer(&self, query: &str) -> Result<Answer, QueryError> {
        let span = info_span!("query", query);
        let _entered = span.enter();

        let decision = resolve(query, self.catalog, self.oracle)?;
        let request = normalize(decision, self.catalog, self.table)
            .inspect_err(|err| debug!(%err, "routing decision rejected"))?;
        let result = self.dispatcher.dispatch(&request)?;
        let summary = summarize(query, &result, self.oracle)?;

        Ok(Answer {
            endpoint: request.operation().name(),
            params: request.into_params(),
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::{assert_eq, assert_ne};

    use super::*;
    use crate::testing::{RecordingTransport, ScriptedOracle};

    const TENZ: &str = r#"{"NameFirst": "Tyson", "NameLast": "Ngo", "CurrentHandle": "TenZ",
        "CountryCode": "ca", "WorldRanking": 150, "CountryRanking": 3,
        "TotalUSDPrize": "1234567.89", "TotalTournaments": 40}"#;

    #[test]
    fn answers_a_player_question() {
        let catalog = OperationCatalog::esports_earnings();
        let table = NameLookupTable::default();
        let oracle = ScriptedOracle::new(&[
            "Let me check.\n{\"endpoint\": \"LookupPlayerById\", \"params\": {\"playerid\": \"TenZ\"}}",
            "TenZ has earned $1,234,567.89 in prize money across 40 tournaments.",
        ]);
        let transport = RecordingTransport::new(&[Ok(TENZ)]);
        let calls = transport.calls();
        let dispatcher =
            Dispatcher::new(Box::new(transport), "http://localhost/v0/", "secret", None);
        let pipeline = Pipeline::new(&catalog, &table, &oracle, &dispatcher);

        let answer = pipeline.answer("How much has TenZ earned?").unwrap();

        assert_eq!(answer.endpoint(), "LookupPlayerById", "the player method should be used");
        assert_eq!(
            answer.params(),
            &BTreeMap::from([("playerid".to_owned(), ParamValue::Text("TenZ".to_owned()))]),
            "the dispatched parameters should be kept"
        );
        assert_eq!(
            answer.source(),
            "LookupPlayerById(playerid=TenZ)",
            "the source should name the call"
        );
        assert!(
            answer.summary().text().contains("1,234,567.89"),
            "the summary should mention the prize figure"
        );
        assert!(answer.summary().media_links().is_empty(), "no image was mentioned");
        assert_eq!(
            calls.borrow().first().map(|call| call.1.first().cloned()),
            Some(Some(("playerid".to_owned(), "TenZ".to_owned()))),
            "the player name should be sent as given"
        );

        let prompts = oracle.prompts();
        assert_eq!(prompts.len(), 2, "the model should be asked twice");
        assert!(
            prompts.last().unwrap().contains("\"TotalUSDPrize\": \"1234567.89\""),
            "the summary prompt should carry the fetched data"
        );
    }

    #[test]
    fn unreadable_routing_stops_before_dispatch() {
        let catalog = OperationCatalog::esports_earnings();
        let table = NameLookupTable::default();
        let oracle = ScriptedOracle::new(&["I cannot help with that."]);
        let transport = RecordingTransport::new(&[]);
        let calls = transport.calls();
        let dispatcher = Dispatcher::new(Box::new(transport), "http://localhost/", "secret", None);
        let pipeline = Pipeline::new(&catalog, &table, &oracle, &dispatcher);

        assert!(
            matches!(
                pipeline.answer("asdf"),
                Err(QueryError::Routing(RoutingError::Format))
            ),
            "the routing failure should be reported"
        );
        assert!(calls.borrow().is_empty(), "nothing should be dispatched");
        assert_eq!(oracle.prompts().len(), 1, "no summary should be requested");
    }

    #[test]
    fn unknown_game_stops_before_dispatch() {
        let catalog = OperationCatalog::esports_earnings();
        let table: NameLookupTable = [("valorant", "25")].into_iter().collect();
        let oracle = ScriptedOracle::new(&[
            r#"{"endpoint": "LookupGameById", "params": {"gameid": "unknownshooter"}}"#,
        ]);
        let transport = RecordingTransport::new(&[]);
        let calls = transport.calls();
        let dispatcher = Dispatcher::new(Box::new(transport), "http://localhost/", "secret", None);
        let pipeline = Pipeline::new(&catalog, &table, &oracle, &dispatcher);

        assert!(
            matches!(
                pipeline.answer("How big is unknownshooter?"),
                Err(QueryError::Normalize(NormalizeError::UnknownGame { known: 1, .. }))
            ),
            "the unresolved game should be reported"
        );
        assert!(calls.borrow().is_empty(), "nothing should be dispatched");
    }

    #[test]
    fn empty_response_stops_before_summary() {
        let catalog = OperationCatalog::esports_earnings();
        let table: NameLookupTable = [("valorant", "25")].into_iter().collect();
        let oracle = ScriptedOracle::new(&[
            r#"{"endpoint": "LookupGameById", "params": {"gameid": "Valorant"}}"#,
        ]);
        let transport = RecordingTransport::new(&[Ok("")]);
        let calls = transport.calls();
        let dispatcher = Dispatcher::new(Box::new(transport), "http://localhost/", "secret", None);
        let pipeline = Pipeline::new(&catalog, &table, &oracle, &dispatcher);

        assert!(
            matches!(
                pipeline.answer("How much has been won at Valorant?"),
                Err(QueryError::Dispatch(DispatchError::EmptyResponse))
            ),
            "the empty response should be reported"
        );
        assert_eq!(
            calls.borrow().first().map(|call| call.1.first().cloned()),
            Some(Some(("gameid".to_owned(), "25".to_owned()))),
            "the resolved identifier should have been sent"
        );
        assert_eq!(oracle.prompts().len(), 1, "no summary should be requested");
    }

    #[test]
    fn summary_failure_is_reported() {
        let catalog = OperationCatalog::esports_earnings();
        let table = NameLookupTable::default();
        let oracle = ScriptedOracle::new(&[r#"{"endpoint": "LookupHighestEarningTeams"}"#]);
        let dispatcher = Dispatcher::new(
            Box::new(RecordingTransport::new(&[Ok("[]")])),
            "http://localhost/",
            "secret",
            None,
        );
        let pipeline = Pipeline::new(&catalog, &table, &oracle, &dispatcher);

        let err = pipeline.answer("Which team has earned the most?").unwrap_err();

        assert!(
            matches!(err, QueryError::Summary(CompletionError::Empty)),
            "a missing summary should be reported"
        );
        assert!(
            err.to_string().contains("could not summarize the data"),
            "the message should say summarizing failed: {err}"
        );
    }

    #[test]
    fn routing_and_summary_failures_read_differently() {
        let catalog = OperationCatalog::esports_earnings();
        let table = NameLookupTable::default();
        let oracle = ScriptedOracle::new(&[]);
        let dispatcher = Dispatcher::new(
            Box::new(RecordingTransport::new(&[])),
            "http://localhost/",
            "secret",
            None,
        );
        let pipeline = Pipeline::new(&catalog, &table, &oracle, &dispatcher);

        let routing = pipeline.answer("Which team has earned the most?").unwrap_err();
        let summary = QueryError::from(CompletionError::Empty);

        assert!(
            matches!(
                routing,
                QueryError::Routing(RoutingError::Completion(CompletionError::Empty))
            ),
            "an oracle failure while routing belongs to routing"
        );
        assert_ne!(
            routing.to_string(),
            summary.to_string(),
            "the two stages should be told apart"
        );
    }
}
