//! This module contains all functions related to taking input from the user. They all use the
//! `dialoguer` crate to process the input, and they all check for input validation.
//!
//! Specifically, the two available functions take the user's question and ask whether they want to
//! ask another one.

use anyhow::Result;
use console::{style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};

/// This function is in charge of taking the user's question. Blank input is rejected on the spot,
/// and the returned question is trimmed.
pub(crate) fn take_query(term: &Term) -> Result<String> {
    let input: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "{}",
            style("Ask anything about esports earnings").bold()
        ))
        .validate_with(|input: &String| -> Result<(), &str> { validate_query(input) })
        .interact_text_on(term)?;

    Ok(input.trim().to_owned())
}

/// This function asks whether the user wants to ask another question. Pressing enter means yes.
pub(crate) fn exit(term: &Term) -> Result<bool> {
    let again = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("{}", style("Ask another question?").bold()))
        .default(true)
        .interact_on(term)?;

    Ok(again)
}

/// This function checks that a question has something in it besides whitespace.
fn validate_query(input: &str) -> Result<(), &'static str> {
    if input.trim().is_empty() {
        Err("The question cannot be empty")
    } else {
        Ok(())
    }
}
