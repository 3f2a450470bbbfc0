//! # esportsbot
//!
//! This crate is a terminal assistant that answers questions about esports earnings: who earned the
//! most at a game, how much a player has won, which teams placed at a tournament.
//!
//! A question is first handed to a language model, which picks the method of the esports earnings
//! API that can answer it. The data that method returns is then handed back to the model to be
//! summarized in plain words, and any image links in the summary are listed below it.
//!
//! The model is reached through the OpenRouter API by means of request calls and simple
//! deserialization and serialization code. Only the handful of calls this project needs are
//! covered, so there's no full coverage of either platform's API.

#![expect(
    unused_crate_dependencies,
    reason = "The dependencies are used in the library crate."
)]

use anyhow::Result;
use esportsbot::init;

fn main() -> Result<()> {
    init()
}
