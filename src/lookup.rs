//! This module loads the table used to turn a game's name into the numeric identifier the esports
//! earnings API expects.
//!
//! The table comes from a CSV file with a header row. The identifier column is the first header
//! ending in "id" and the name column the first header containing "name", so both `GameId,GameName`
//! and `id,name` exports work as they are.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context as _, Result};
use csv::{ReaderBuilder, Trim};
use tracing::{info, warn};

/// This struct maps case-folded game names to their identifiers. It is built once at startup and
/// only read afterwards.
#[derive(Default, Debug)]
pub(crate) struct NameLookupTable {
    /// This field contains the entries, keyed by the lowercase name.
    entries: BTreeMap<String, String>,
}

impl NameLookupTable {
    /// This function loads the table from a CSV file. A file that does not exist results in an
    /// empty table; a file that exists but cannot be parsed is an error.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "game lookup file not found; game names will not resolve");
            return Ok(Self::default());
        }

        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open game lookup file: {}", path.display()))?;
        let table = Self::from_csv(file)
            .with_context(|| format!("Failed to read game lookup file: {}", path.display()))?;
        info!(path = %path.display(), games = table.len(), "loaded game lookup table");

        Ok(table)
    }

    /// This function reads the table from any CSV source. Rows with an empty name or identifier are
    /// skipped, and when a name appears twice the later row wins.
    pub(crate) fn from_csv<R: Read>(source: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(source);
        let headers = reader.headers()?.clone();
        let id_column = headers
            .iter()
            .position(|header| header.to_lowercase().ends_with("id"))
            .context("no identifier column (a header ending in \"id\")")?;
        let name_column = headers
            .iter()
            .position(|header| header.to_lowercase().contains("name"))
            .context("no name column (a header containing \"name\")")?;

        let mut entries = BTreeMap::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read row {}", idx + 1))?;

            match (record.get(id_column), record.get(name_column)) {
                (Some(id), Some(name)) if !id.is_empty() && !name.is_empty() => {
                    let _previous = entries.insert(name.to_lowercase(), id.to_owned());
                }
                _ => warn!(row = idx + 1, "skipping incomplete game lookup row"),
            }
        }

        Ok(Self { entries })
    }

    /// This function returns the identifier for `name`, ignoring case and surrounding whitespace.
    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.trim().to_lowercase())
            .map(String::as_str)
    }

    /// This function returns whether the table holds no entries at all.
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// This function returns the number of names the table can resolve.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<'pair> FromIterator<(&'pair str, &'pair str)> for NameLookupTable {
    fn from_iter<I: IntoIterator<Item = (&'pair str, &'pair str)>>(pairs: I) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(name, id)| (name.trim().to_lowercase(), id.to_owned()))
                .collect(),
        }
    }
}
