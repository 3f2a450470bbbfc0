//! In-memory stand-ins for the model and the statistics service.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::dispatch::{DispatchError, StatsTransport};
use crate::oracle::{CompletionError, CompletionOracle};

/// One recorded statistics call: the URL and its query parameters.
pub(crate) type Call = (String, Vec<(String, String)>);

/// A model that answers with canned replies, in order, and remembers every prompt. Once the replies
/// run out it answers with `CompletionError::Empty`.
pub(crate) struct ScriptedOracle {
    prompts: RefCell<Vec<String>>,
    replies: RefCell<VecDeque<String>>,
}

impl ScriptedOracle {
    pub(crate) fn new(replies: &[&str]) -> Self {
        Self {
            prompts: RefCell::new(Vec::new()),
            replies: RefCell::new(replies.iter().map(|&reply| reply.to_owned()).collect()),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl CompletionOracle for ScriptedOracle {
    fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.prompts.borrow_mut().push(prompt.to_owned());
        self.replies
            .borrow_mut()
            .pop_front()
            .ok_or(CompletionError::Empty)
    }
}

/// A statistics service that answers with canned bodies or transport failures, in order, and
/// records every call in a log the test keeps a handle to.
pub(crate) struct RecordingTransport {
    calls: Rc<RefCell<Vec<Call>>>,
    responses: RefCell<VecDeque<Result<String, String>>>,
}

impl RecordingTransport {
    pub(crate) fn new(responses: &[Result<&str, &str>]) -> Self {
        Self {
            calls: Rc::default(),
            responses: RefCell::new(
                responses
                    .iter()
                    .map(|response| {
                        response
                            .map(ToOwned::to_owned)
                            .map_err(ToOwned::to_owned)
                    })
                    .collect(),
            ),
        }
    }

    pub(crate) fn calls(&self) -> Rc<RefCell<Vec<Call>>> {
        Rc::clone(&self.calls)
    }
}

impl StatsTransport for RecordingTransport {
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<String, DispatchError> {
        self.calls.borrow_mut().push((url.to_owned(), query.to_vec()));
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err("no response scripted".to_owned()))
            .map_err(DispatchError::Transport)
    }
}
