//! The summarizer hands the statistics back to the model to be put into words, and picks out any
//! image links the model wrote into its answer.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::oracle::{CompletionError, CompletionOracle};

/// An absolute http(s) link whose path ends in a common image extension.
static MEDIA_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://\S+\.(?:jpg|jpeg|png|gif)").expect("media link pattern is valid")
});

/// The model's answer together with the image links found in it.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Summary {
    /// This field contains the links in order of appearance, duplicates included.
    media_links: Vec<String>,
    /// This field contains the answer exactly as the model wrote it.
    text: String,
}

impl Summary {
    /// This function builds a summary out of the model's text, extracting its links.
    pub(crate) fn from_text(text: String) -> Self {
        Self {
            media_links: extract_media_links(&text),
            text,
        }
    }

    /// This function returns the image links found in the answer.
    pub(crate) fn media_links(&self) -> &[String] {
        &self.media_links
    }

    /// This function returns the answer text.
    pub(crate) fn text(&self) -> &str {
        &self.text
    }
}

/// This function writes the summary prompt: the question, the data and how to talk about it.
pub(crate) fn build_prompt(query: &str, result: &Value) -> String {
    let data = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());

    format!(
        "User query: {query}\n\
         \n\
         API data:\n\
         {data}\n\
         \n\
         Answer the user's query using only the API data above. Write a clear, plain-language \
         summary that includes the relevant figures. If the data does not fully cover what was \
         asked, say so and explain what is missing.\n"
    )
}

/// This function returns every image link in `text`, in order of appearance. It only scans the text
/// and never makes anything up.
pub(crate) fn extract_media_links(text: &str) -> Vec<String> {
    MEDIA_LINK
        .find_iter(text)
        .map(|found| found.as_str().to_owned())
        .collect()
}

/// This function asks the model to summarize `result` as an answer to `query`.
pub(crate) fn summarize(
    query: &str,
    result: &Value,
    oracle: &dyn CompletionOracle,
) -> Result<Summary, CompletionError> {
    let text = oracle.complete(&build_prompt(query, result))?;
    let summary = Summary::from_text(text);
    debug!(links = summary.media_links().len(), "summary received");

    Ok(summary)
}
