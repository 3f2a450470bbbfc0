//! The library components of the bot. They allow taking a question, routing it to the right method
//! of the esports earnings API with the help of a language model, fetching the data and having the
//! model put it into words.
//!
//! The starting point of the library is the app.rs file, which contains the question loop. The
//! steps of a single question are chained together in pipeline.rs.

#![expect(
    clippy::cargo_common_metadata,
    reason = "The package has not yet been published, so there is no readme to point at."
)]

mod app;
mod catalog;
mod dispatch;
mod input;
mod lookup;
mod normalizer;
mod oracle;
mod pipeline;
mod resolver;
mod summarizer;
#[cfg(test)]
mod testing;

pub use app::init;
