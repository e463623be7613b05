//! The execution-engine ingress boundary.
//!
//! `trigger_execution` is the hand-off point between trigger ingress (webhook
//! handlers, the editor's execute button) and the engine: it loads the
//! workflow, rejects anything that cannot run, and spawns the run as a
//! background task so ingress never blocks on execution.

use crate::error::GraphError;
use crate::executor::NodeExecutor;
use crate::run::RunState;
use crate::runner::Runner;
use crate::status::StatusPublisher;
use crate::store::{StoreError, WorkflowStore};
use crate::trigger::TriggerEvent;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tributary_core::{WorkflowId, WorkflowRunId};

/// Errors from dispatching a workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The workflow could not be loaded.
    Store(StoreError),
    /// The workflow is disabled and refuses triggers.
    Disabled { workflow_id: WorkflowId },
    /// The workflow graph failed validation.
    InvalidGraph(GraphError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "{e}"),
            Self::Disabled { workflow_id } => {
                write!(f, "workflow {workflow_id} is disabled")
            }
            Self::InvalidGraph(e) => write!(f, "invalid workflow graph: {e}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::InvalidGraph(e) => Some(e),
            Self::Disabled { .. } => None,
        }
    }
}

impl From<StoreError> for DispatchError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<GraphError> for DispatchError {
    fn from(e: GraphError) -> Self {
        Self::InvalidGraph(e)
    }
}

/// Accepts trigger events and spawns workflow runs.
pub struct ExecutionDispatcher<S: ?Sized, E: ?Sized, P: ?Sized> {
    store: Arc<S>,
    executor: Arc<E>,
    publisher: Arc<P>,
    cancel: CancellationToken,
}

impl<S, E, P> ExecutionDispatcher<S, E, P>
where
    S: WorkflowStore + ?Sized,
    E: NodeExecutor + ?Sized + 'static,
    P: StatusPublisher + ?Sized + 'static,
{
    /// Creates a dispatcher over the given collaborators.
    #[must_use]
    pub fn new(store: Arc<S>, executor: Arc<E>, publisher: Arc<P>) -> Self {
        Self {
            store,
            executor,
            publisher,
            cancel: CancellationToken::new(),
        }
    }

    /// Returns the store this dispatcher loads workflows from.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Cancels all in-flight runs and refuses further scheduling in them.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Validates the workflow and spawns a run for the trigger event.
    ///
    /// Returns the run ID immediately; execution proceeds in the background
    /// and reports through the status publisher.
    ///
    /// # Errors
    ///
    /// Returns an error if the workflow cannot be loaded, is disabled, or
    /// fails graph validation. In all error cases no node executes.
    pub async fn trigger_execution(
        &self,
        workflow_id: WorkflowId,
        event: TriggerEvent,
    ) -> Result<WorkflowRunId, DispatchError> {
        let workflow = self.store.load(workflow_id).await?;

        if !workflow.is_enabled() {
            return Err(DispatchError::Disabled { workflow_id });
        }
        workflow.validate()?;

        let run_id = WorkflowRunId::new();
        let seed = event.seed_context();
        tracing::info!(
            workflow_id = %workflow_id,
            run_id = %run_id,
            provider = event.provider(),
            state = ?RunState::Queued,
            "queued workflow run"
        );

        let executor = Arc::clone(&self.executor);
        let publisher = Arc::clone(&self.publisher);
        let cancel = self.cancel.child_token();
        tokio::spawn(async move {
            let runner = Runner::with_cancellation(executor, publisher, cancel);
            match runner.execute(&workflow, run_id, seed).await {
                Ok(outcome) => {
                    tracing::info!(
                        workflow_id = %workflow_id,
                        run_id = %run_id,
                        state = ?outcome.state,
                        failed_nodes = outcome.has_failures(),
                        "workflow run settled"
                    );
                }
                Err(error) => {
                    tracing::error!(
                        workflow_id = %workflow_id,
                        run_id = %run_id,
                        error = %error,
                        "workflow run rejected"
                    );
                }
            }
        });

        Ok(run_id)
    }
}
