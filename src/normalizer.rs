//! The normalizer turns the model's routing decision into a request that can be sent as is.
//!
//! Game names are swapped for their identifiers, and the method is checked against the catalog
//! together with its required parameters. Everything else is passed through untouched.

use std::collections::BTreeMap;

use console::style;
use tracing::debug;

use crate::catalog::{Operation, OperationCatalog};
use crate::lookup::NameLookupTable;
use crate::resolver::{ParamValue, RoutingDecision};

/// The parameter that carries a game identifier, and may arrive holding a game's name instead.
pub(crate) const GAME_PARAM: &str = "gameid";

/// This enum holds the reasons a routing decision cannot be dispatched.
#[derive(thiserror::Error, Debug)]
pub(crate) enum NormalizeError {
    #[error(
        "{}: {} needs \"{}\"",
        style("missing parameter").bold().underlined(),
        .operation,
        .parameter
    )]
    MissingParameter {
        operation: &'static str,
        parameter: &'static str,
    },
    #[error(
        "{}: no game called \"{}\" among the {} known games",
        style("unknown game").bold().underlined(),
        .name,
        .known
    )]
    UnknownGame { known: usize, name: String },
    #[error("{}: \"{}\"", style("unknown endpoint").bold().underlined(), .0)]
    UnknownOperation(String),
}

/// A request that passed normalization and only needs the credential added before it is sent.
#[derive(Debug)]
pub(crate) struct DispatchRequest<'catalog> {
    /// This field contains the catalog entry of the method to call.
    operation: &'catalog Operation,
    /// This field contains the query parameters, with game names already resolved.
    params: BTreeMap<String, ParamValue>,
}

impl<'catalog> DispatchRequest<'catalog> {
    /// This function returns the catalog entry of the method to call.
    pub(crate) const fn operation(&self) -> &'catalog Operation {
        self.operation
    }

    /// This function returns the query parameters.
    pub(crate) const fn params(&self) -> &BTreeMap<String, ParamValue> {
        &self.params
    }

    /// This function gives up the request, keeping only its parameters.
    pub(crate) fn into_params(self) -> BTreeMap<String, ParamValue> {
        self.params
    }
}

/// This function validates a routing decision and resolves the game name it may carry.
pub(crate) fn normalize<'catalog>(
    decision: RoutingDecision,
    catalog: &'catalog OperationCatalog,
    table: &NameLookupTable,
) -> Result<DispatchRequest<'catalog>, NormalizeError> {
    let (endpoint, mut params) = decision.into_parts();
    let operation = catalog
        .get(&endpoint)
        .ok_or(NormalizeError::UnknownOperation(endpoint))?;

    if let Some(value) = params.remove(GAME_PARAM) {
        let resolved = resolve_game(value, table)?;
        let _previous = params.insert(GAME_PARAM.to_owned(), resolved);
    }

    if let Some(parameter) = operation
        .required()
        .iter()
        .copied()
        .find(|parameter| !params.contains_key(*parameter))
    {
        return Err(NormalizeError::MissingParameter {
            operation: operation.name(),
            parameter,
        });
    }

    debug!(operation = operation.name(), ?params, "request normalized");
    Ok(DispatchRequest { operation, params })
}

/// This function swaps a game name for its identifier. Integers and digit-only strings are taken to
/// be identifiers already.
// TODO: games whose canonical identifier is not numeric always go through the lookup; allow such
// identifiers to bypass it once the API is known to issue them.
fn resolve_game(value: ParamValue, table: &NameLookupTable) -> Result<ParamValue, NormalizeError> {
    match value {
        ParamValue::Text(name) if !is_identifier(&name) => table
            .get(&name)
            .map(|id| ParamValue::Text(id.to_owned()))
            .ok_or_else(|| NormalizeError::UnknownGame {
                known: table.len(),
                name,
            }),
        other => Ok(other),
    }
}

/// This function tells whether a value already looks like an identifier, i.e. is made out of digits
/// only. Surrounding whitespace makes it a name, which the lookup trims.
fn is_identifier(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn text(value: &str) -> ParamValue {
        ParamValue::Text(value.to_owned())
    }

    fn table() -> NameLookupTable {
        [("valorant", "25"), ("Dota 2", "231")].into_iter().collect()
    }

    #[test]
    fn game_name_is_replaced_by_identifier() {
        let catalog = OperationCatalog::esports_earnings();
        let decision = RoutingDecision::new("LookupGameById", &[("gameid", text("valorant"))]);

        let request = normalize(decision, &catalog, &table()).unwrap();

        assert_eq!(
            request.params(),
            &BTreeMap::from([("gameid".to_owned(), text("25"))]),
            "the name should be swapped for its identifier"
        );
        assert_eq!(
            request.operation().name(),
            "LookupGameById",
            "the catalog entry should be attached"
        );
    }

    #[test]
    fn lookup_ignores_case() {
        let catalog = OperationCatalog::esports_earnings();
        let decision = RoutingDecision::new(
            "LookupHighestEarningTeamsByGame",
            &[("gameid", text("DOTA 2")), ("offset", ParamValue::Integer(100))],
        );

        let request = normalize(decision, &catalog, &table()).unwrap();

        assert_eq!(
            request.params(),
            &BTreeMap::from([
                ("gameid".to_owned(), text("231")),
                ("offset".to_owned(), ParamValue::Integer(100)),
            ]),
            "names are matched case-insensitively and other parameters are kept"
        );
    }

    #[test]
    fn identifiers_pass_through() {
        let catalog = OperationCatalog::esports_earnings();

        let request = normalize(
            RoutingDecision::new("LookupGameById", &[("gameid", text("144"))]),
            &catalog,
            &table(),
        )
        .unwrap();
        assert_eq!(
            request.params(),
            &BTreeMap::from([("gameid".to_owned(), text("144"))]),
            "digit-only strings are left alone"
        );

        let request = normalize(
            RoutingDecision::new("LookupGameById", &[("gameid", ParamValue::Integer(144))]),
            &catalog,
            &table(),
        )
        .unwrap();
        assert_eq!(
            request.params(),
            &BTreeMap::from([("gameid".to_owned(), ParamValue::Integer(144))]),
            "integers are left alone"
        );
    }

    #[test]
    fn unknown_game_reports_table_size() {
        let catalog = OperationCatalog::esports_earnings();
        let decision =
            RoutingDecision::new("LookupGameById", &[("gameid", text("unknownshooter"))]);

        let err = normalize(decision, &catalog, &table()).unwrap_err();

        assert!(
            matches!(
                err,
                NormalizeError::UnknownGame { known: 2, ref name } if name == "unknownshooter"
            ),
            "the unresolved name and table size should be reported"
        );
    }

    #[test]
    fn player_names_are_not_resolved() {
        let catalog = OperationCatalog::esports_earnings();
        let decision = RoutingDecision::new("LookupPlayerById", &[("playerid", text("TenZ"))]);

        let request = normalize(decision, &catalog, &table()).unwrap();

        assert_eq!(
            request.params(),
            &BTreeMap::from([("playerid".to_owned(), text("TenZ"))]),
            "only game names go through the lookup table"
        );
    }

    #[test]
    fn unknown_endpoint_is_rejected() {
        let catalog = OperationCatalog::esports_earnings();
        let decision = RoutingDecision::new("LookupPlayerByName", &[("name", text("TenZ"))]);

        assert!(
            matches!(
                normalize(decision, &catalog, &table()),
                Err(NormalizeError::UnknownOperation(ref name)) if name == "LookupPlayerByName"
            ),
            "methods outside the catalog cannot be dispatched"
        );
    }

    #[test]
    fn missing_required_parameter_is_rejected() {
        let catalog = OperationCatalog::esports_earnings();
        let decision = RoutingDecision::new("LookupTournamentById", &[]);

        assert!(
            matches!(
                normalize(decision, &catalog, &table()),
                Err(NormalizeError::MissingParameter {
                    operation: "LookupTournamentById",
                    parameter: "tournamentid",
                })
            ),
            "required parameters must be present"
        );
    }

    #[test]
    fn identifier_check() {
        assert!(is_identifier("144"), "digits are an identifier");
        assert!(!is_identifier("cs2"), "mixed text is a name");
        assert!(!is_identifier(""), "an empty value is not an identifier");
        assert!(!is_identifier(" 144 "), "padded digits are not an identifier");
    }

    #[test]
    fn padded_digits_go_through_lookup() {
        let catalog = OperationCatalog::esports_earnings();
        let padded = RoutingDecision::new("LookupGameById", &[("gameid", text(" 144 "))]);

        assert!(
            matches!(
                normalize(padded, &catalog, &table()),
                Err(NormalizeError::UnknownGame { ref name, .. }) if name == " 144 "
            ),
            "padded digits should never be sent as they are"
        );

        let listed: NameLookupTable = [("144", "144")].into_iter().collect();
        let request = normalize(
            RoutingDecision::new("LookupGameById", &[("gameid", text(" 144 "))]),
            &catalog,
            &listed,
        )
        .unwrap();
        assert_eq!(
            request.params(),
            &BTreeMap::from([("gameid".to_owned(), text("144"))]),
            "a padded value found in the table is sent trimmed"
        );
    }
}
