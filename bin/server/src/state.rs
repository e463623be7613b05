//! Shared application state.

use std::sync::Arc;
use tributary_engine::{
    DefaultExecutor, ExecutionDispatcher, InMemoryWorkflowStore, StatusPublisher,
};

/// The dispatcher type the server wires together: in-memory workflow storage,
/// the built-in node executors, and whatever status publisher was configured.
pub type AppDispatcher =
    ExecutionDispatcher<InMemoryWorkflowStore, DefaultExecutor, dyn StatusPublisher>;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The execution dispatcher.
    pub dispatcher: Arc<AppDispatcher>,
}

impl AppState {
    /// Creates state around the given status publisher.
    #[must_use]
    pub fn new(publisher: Arc<dyn StatusPublisher>) -> Self {
        let dispatcher = ExecutionDispatcher::new(
            Arc::new(InMemoryWorkflowStore::new()),
            Arc::new(DefaultExecutor::new()),
            publisher,
        );
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }
}
