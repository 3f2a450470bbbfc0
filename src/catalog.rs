//! The catalog module holds the fixed list of esports earnings API methods the bot is able to call.
//!
//! The list is plain data. The routing prompt, the parameter checks and the request path are all
//! derived from it, so adding another method means adding another entry to `OPERATIONS` and nothing
//! else.

use std::fmt;

/// Every method of the esports earnings API that a query can be routed to.
const OPERATIONS: &[Operation] = &[
    Operation {
        description: "A single player's profile and lifetime earnings.",
        name: "LookupPlayerById",
        optional: &[],
        outputs: &[
            "NameFirst",
            "NameLast",
            "CurrentHandle",
            "CountryCode",
            "WorldRanking",
            "CountryRanking",
            "TotalUSDPrize",
            "TotalTournaments",
        ],
        required: &["playerid"],
    },
    Operation {
        description: "The tournaments a player placed in, with the prize won at each.",
        name: "LookupPlayerTournaments",
        optional: &["offset"],
        outputs: &[
            "GameId",
            "TournamentId",
            "TournamentName",
            "EndDate",
            "Place",
            "PrizeUSD",
            "Teamplay",
        ],
        required: &["playerid"],
    },
    Operation {
        description: "The highest earning players across every game, 100 per page.",
        name: "LookupHighestEarningPlayers",
        optional: &["offset"],
        outputs: &[
            "PlayerId",
            "NameFirst",
            "NameLast",
            "CurrentHandle",
            "CountryCode",
            "TotalUSDPrize",
        ],
        required: &[],
    },
    Operation {
        description: "Totals for one game: prize pool, tournaments held and players paid.",
        name: "LookupGameById",
        optional: &[],
        outputs: &["GameName", "TotalUSDPrize", "TotalTournaments", "TotalPlayers"],
        required: &["gameid"],
    },
    Operation {
        description: "The highest earning players of one game, 100 per page.",
        name: "LookupHighestEarningPlayersByGame",
        optional: &["offset"],
        outputs: &[
            "PlayerId",
            "NameFirst",
            "NameLast",
            "CurrentHandle",
            "CountryCode",
            "TotalUSDPrize",
        ],
        required: &["gameid"],
    },
    Operation {
        description: "The most recently finished tournaments, 100 per page.",
        name: "LookupRecentTournaments",
        optional: &["offset"],
        outputs: &[
            "TournamentId",
            "GameId",
            "TournamentName",
            "StartDate",
            "EndDate",
            "Location",
            "Teamplay",
            "TotalUSDPrize",
        ],
        required: &[],
    },
    Operation {
        description: "Details of a single tournament.",
        name: "LookupTournamentById",
        optional: &[],
        outputs: &[
            "GameId",
            "TournamentName",
            "StartDate",
            "EndDate",
            "Location",
            "Teamplay",
            "TotalUSDPrize",
        ],
        required: &["tournamentid"],
    },
    Operation {
        description: "Individual placings and prizes of a tournament.",
        name: "LookupTournamentResultsByTournamentId",
        optional: &[],
        outputs: &[
            "Ranking",
            "PlayerId",
            "NameFirst",
            "NameLast",
            "CurrentHandle",
            "CountryCode",
            "PrizeUSD",
        ],
        required: &["tournamentid"],
    },
    Operation {
        description: "Team placings and prizes of a tournament.",
        name: "LookupTournamentTeamResultsByTournamentId",
        optional: &[],
        outputs: &["Ranking", "TeamId", "TeamName", "PrizeUSD"],
        required: &["tournamentid"],
    },
    Operation {
        description: "The players that made up each team at a tournament.",
        name: "LookupTournamentTeamPlayersByTournamentId",
        optional: &[],
        outputs: &["TeamId", "PlayerId", "CurrentHandle", "CountryCode"],
        required: &["tournamentid"],
    },
    Operation {
        description: "The highest earning teams across every game, 100 per page.",
        name: "LookupHighestEarningTeams",
        optional: &["offset"],
        outputs: &["TeamId", "TeamName", "TotalUSDPrize", "TotalTournaments"],
        required: &[],
    },
    Operation {
        description: "The highest earning teams of one game, 100 per page.",
        name: "LookupHighestEarningTeamsByGame",
        optional: &["offset"],
        outputs: &["TeamId", "TeamName", "TotalUSDPrize", "TotalTournaments"],
        required: &["gameid"],
    },
];

/// This struct describes one remote method: its name, what it returns and which query parameters it
/// takes.
#[derive(Debug)]
pub(crate) struct Operation {
    /// This field contains a one-line summary shown to the model when it picks a method.
    description: &'static str,
    /// This field contains the exact method name, which is also the last segment of the request
    /// path.
    name: &'static str,
    /// This field contains the parameters the method accepts but does not need.
    optional: &'static [&'static str],
    /// This field contains the names of the fields found in the method's JSON output.
    outputs: &'static [&'static str],
    /// This field contains the parameters that must be present for the call to make sense.
    required: &'static [&'static str],
}

impl Operation {
    /// This function returns the method name as used in the request path.
    pub(crate) const fn name(&self) -> &'static str {
        self.name
    }

    /// This function returns the parameters the method cannot be called without.
    pub(crate) const fn required(&self) -> &'static [&'static str] {
        self.required
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        /// Joins a parameter list, spelling out the empty case.
        fn list(items: &[&str]) -> String {
            if items.is_empty() {
                "none".to_owned()
            } else {
                items.join(", ")
            }
        }

        writeln!(formatter, "{}: {}", self.name, self.description)?;
        writeln!(formatter, "  required parameters: {}", list(self.required))?;
        writeln!(formatter, "  optional parameters: {}", list(self.optional))?;
        write!(formatter, "  output fields: {}", list(self.outputs))
    }
}

/// This struct is the read-only view over the supported methods that gets handed to the resolver
/// and the normalizer.
pub(crate) struct OperationCatalog {
    /// This field contains the catalog entries in the order they are presented to the model.
    operations: &'static [Operation],
}

impl OperationCatalog {
    /// This function returns the catalog of the esports earnings API.
    pub(crate) const fn esports_earnings() -> Self {
        Self {
            operations: OPERATIONS,
        }
    }

    /// This function renders every entry, one block per method, for embedding in a prompt.
    pub(crate) fn describe(&self) -> String {
        self.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// This function finds the entry whose name matches `name` exactly.
    pub(crate) fn get(&self, name: &str) -> Option<&Operation> {
        self.operations
            .iter()
            .find(|operation| operation.name == name)
    }

    /// This function iterates over the entries in presentation order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }
}
