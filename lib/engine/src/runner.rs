//! The workflow graph walker.
//!
//! One runner executes one run to a terminal state:
//! 1. Validate the graph (cyclic graphs fail before any node runs)
//! 2. Schedule every ready node onto a task set; independent branches run
//!    concurrently, dependents strictly serialize behind their dependencies
//! 3. Fold each completion back into the run state, publishing status events
//!    in scheduler order so subscribers observe execution order
//! 4. Settle blocked nodes as `not_run` once nothing remains schedulable
//!
//! Failure handling is per-branch: a failed node blocks only its own
//! downstream nodes, and the run as a whole fails only when every trigger
//! root fails.

use crate::context::ExecutionContext;
use crate::definition::Workflow;
use crate::error::{ExecutionError, ExecutorError};
use crate::executor::NodeExecutor;
use crate::node::NodeId;
use crate::ready::ReadyTracker;
use crate::run::{NodeRunRecord, NodeRunState, RunOutcome, RunState};
use crate::status::{NodeStatus, StatusEvent, StatusPublisher};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tributary_core::{WorkflowId, WorkflowRunId};

/// Executes workflow runs.
///
/// The runner owns a cancellation token: once cancelled, in-flight nodes are
/// allowed to complete but nothing further is scheduled and no further status
/// events are published.
pub struct Runner<E: ?Sized, P: ?Sized> {
    executor: Arc<E>,
    publisher: Arc<P>,
    cancel: CancellationToken,
}

impl<E, P> Runner<E, P>
where
    E: NodeExecutor + ?Sized + 'static,
    P: StatusPublisher + ?Sized,
{
    /// Creates a runner with a fresh cancellation token.
    #[must_use]
    pub fn new(executor: Arc<E>, publisher: Arc<P>) -> Self {
        Self::with_cancellation(executor, publisher, CancellationToken::new())
    }

    /// Creates a runner observing an externally owned cancellation token.
    #[must_use]
    pub fn with_cancellation(
        executor: Arc<E>,
        publisher: Arc<P>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            executor,
            publisher,
            cancel,
        }
    }

    /// Returns a handle to this runner's cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Executes the workflow to a terminal state.
    ///
    /// Trigger roots receive `seed` as their input context; every other node
    /// receives its dependencies' outputs merged in edge declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph fails validation; in that case no node
    /// executor is ever invoked.
    pub async fn execute(
        &self,
        workflow: &Workflow,
        run_id: WorkflowRunId,
        seed: ExecutionContext,
    ) -> Result<RunOutcome, ExecutionError> {
        workflow.validate()?;

        let workflow_id = workflow.id;
        let started_at = Utc::now();
        tracing::info!(
            workflow_id = %workflow_id,
            run_id = %run_id,
            state = ?RunState::Running,
            node_count = workflow.graph.node_count(),
            "starting workflow run"
        );

        let mut tracker = ReadyTracker::from_graph(&workflow.graph);
        let mut records: HashMap<NodeId, NodeRunRecord> = workflow
            .graph
            .nodes()
            .map(|node| (node.id, NodeRunRecord::new(node.id)))
            .collect();
        let mut outputs: HashMap<NodeId, ExecutionContext> = HashMap::new();
        let mut tasks: JoinSet<(NodeId, Result<ExecutionContext, ExecutorError>)> =
            JoinSet::new();

        loop {
            if !self.cancel.is_cancelled() {
                // ready_nodes excludes executing nodes, so each (run, node)
                // pair is spawned at most once.
                for node_id in tracker.ready_nodes() {
                    let Some(node) = workflow.graph.get_node(node_id) else {
                        continue;
                    };

                    let input = collect_input(workflow, node_id, &seed, &outputs);

                    self.publish(workflow_id, run_id, node_id, NodeStatus::Loading)
                        .await;
                    tracker.mark_executing(node_id);
                    if let Some(record) = records.get_mut(&node_id) {
                        record.start();
                    }

                    let executor = Arc::clone(&self.executor);
                    let node = node.clone();
                    tasks.spawn(async move {
                        let result = executor.execute(&node, input).await;
                        (node.id, result)
                    });
                }
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };

            let (node_id, result) = match joined {
                Ok(completion) => completion,
                Err(join_error) => {
                    tracing::error!(
                        run_id = %run_id,
                        error = %join_error,
                        "node task aborted"
                    );
                    continue;
                }
            };

            match result {
                Ok(output) => {
                    tracker.mark_completed(node_id);
                    if let Some(record) = records.get_mut(&node_id) {
                        record.succeed();
                    }
                    outputs.insert(node_id, output);
                    self.publish(workflow_id, run_id, node_id, NodeStatus::Success)
                        .await;
                }
                Err(error) => {
                    tracker.mark_failed(node_id);
                    tracing::warn!(
                        run_id = %run_id,
                        node_id = %node_id,
                        error = %error,
                        "node failed"
                    );
                    if let Some(record) = records.get_mut(&node_id) {
                        record.fail(error.to_string());
                    }
                    self.publish(workflow_id, run_id, node_id, NodeStatus::Error)
                        .await;
                }
            }
        }

        let cancelled = self.cancel.is_cancelled();

        // Settle everything that never got to run: nodes blocked behind a
        // failure, or unscheduled when the run was cancelled.
        let unstarted: Vec<NodeId> = records
            .values()
            .filter(|record| record.state == NodeRunState::Pending)
            .map(|record| record.node_id)
            .collect();
        for node_id in unstarted {
            if let Some(record) = records.get_mut(&node_id) {
                record.skip();
            }
            if !cancelled {
                self.publish(workflow_id, run_id, node_id, NodeStatus::NotRun)
                    .await;
            }
        }

        // A record still marked running means its task aborted without a
        // result.
        for record in records.values_mut() {
            if record.state == NodeRunState::Running {
                record.fail("node execution did not complete".to_string());
            }
        }

        let state = terminal_state(workflow, &records, cancelled);
        let context = final_context(workflow, &outputs);
        let finished_at = Utc::now();

        tracing::info!(
            workflow_id = %workflow_id,
            run_id = %run_id,
            state = ?state,
            duration_ms = (finished_at - started_at).num_milliseconds(),
            "workflow run finished"
        );

        Ok(RunOutcome {
            run_id,
            workflow_id,
            state,
            started_at,
            finished_at,
            nodes: records,
            context,
        })
    }

    /// Publishes a status event, awaiting delivery before the scheduler
    /// proceeds. Publish failures are logged, not fatal to the run.
    async fn publish(
        &self,
        workflow_id: WorkflowId,
        run_id: WorkflowRunId,
        node_id: NodeId,
        status: NodeStatus,
    ) {
        if self.cancel.is_cancelled() {
            return;
        }

        let event = StatusEvent::new(workflow_id, run_id, node_id, status);
        if let Err(error) = self.publisher.publish(&event).await {
            tracing::warn!(
                run_id = %run_id,
                node_id = %node_id,
                error = %error,
                "failed to publish status event"
            );
        }
    }
}

/// Builds a node's input context.
///
/// Trigger roots receive the seed; everything else receives its dependency
/// outputs merged in edge declaration order, later-declared wins.
fn collect_input(
    workflow: &Workflow,
    node_id: NodeId,
    seed: &ExecutionContext,
    outputs: &HashMap<NodeId, ExecutionContext>,
) -> ExecutionContext {
    let dependencies = workflow.graph.dependencies(node_id);
    if dependencies.is_empty() {
        return seed.clone();
    }

    let mut input = ExecutionContext::new();
    for dependency in dependencies {
        if let Some(output) = outputs.get(&dependency.id) {
            input = input.merged_with(output);
        }
    }
    input
}

/// Decides the run's terminal state.
fn terminal_state(
    workflow: &Workflow,
    records: &HashMap<NodeId, NodeRunRecord>,
    cancelled: bool,
) -> RunState {
    if cancelled {
        return RunState::Cancelled;
    }

    let entries = workflow.graph.entry_nodes();
    let every_root_failed = !entries.is_empty()
        && entries.iter().all(|node| {
            records
                .get(&node.id)
                .is_some_and(|record| record.state == NodeRunState::Failed)
        });

    if every_root_failed {
        RunState::Failed
    } else {
        RunState::Completed
    }
}

/// Merges terminal-node outputs in node insertion order into the final
/// context.
fn final_context(
    workflow: &Workflow,
    outputs: &HashMap<NodeId, ExecutionContext>,
) -> ExecutionContext {
    let mut context = ExecutionContext::new();
    for node in workflow.graph.terminal_nodes() {
        if let Some(output) = outputs.get(&node.id) {
            context = context.merged_with(output);
        }
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Edge;
    use crate::error::GraphError;
    use crate::node::{Node, NodeConfig};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Records invocations and inputs; fails the configured nodes.
    #[derive(Default)]
    struct ScriptedExecutor {
        fail: HashSet<NodeId>,
        invocations: Mutex<Vec<NodeId>>,
        inputs: Mutex<HashMap<NodeId, ExecutionContext>>,
    }

    impl ScriptedExecutor {
        fn new() -> Self {
            Self::default()
        }

        fn failing(fail: impl IntoIterator<Item = NodeId>) -> Self {
            Self {
                fail: fail.into_iter().collect(),
                ..Self::default()
            }
        }

        fn invocations(&self) -> Vec<NodeId> {
            self.invocations.lock().unwrap().clone()
        }

        fn input_for(&self, node_id: NodeId) -> Option<ExecutionContext> {
            self.inputs.lock().unwrap().get(&node_id).cloned()
        }
    }

    #[async_trait]
    impl NodeExecutor for ScriptedExecutor {
        async fn execute(
            &self,
            node: &Node,
            context: ExecutionContext,
        ) -> Result<ExecutionContext, ExecutorError> {
            self.invocations.lock().unwrap().push(node.id);
            self.inputs
                .lock()
                .unwrap()
                .insert(node.id, context.clone());

            if self.fail.contains(&node.id) {
                return Err(ExecutorError::configuration("scripted failure"));
            }

            Ok(context
                .with_value(node.name.clone(), json!("done"))
                .with_value("last", json!(node.name.clone())))
        }
    }

    /// Collects every published event in order.
    #[derive(Default)]
    struct CollectingPublisher {
        events: Mutex<Vec<StatusEvent>>,
    }

    impl CollectingPublisher {
        fn events(&self) -> Vec<StatusEvent> {
            self.events.lock().unwrap().clone()
        }

        fn statuses_for(&self, node_id: NodeId) -> Vec<NodeStatus> {
            self.events()
                .into_iter()
                .filter(|e| e.node_id == node_id)
                .map(|e| e.status)
                .collect()
        }
    }

    #[async_trait]
    impl StatusPublisher for CollectingPublisher {
        async fn publish(&self, event: &StatusEvent) -> Result<(), crate::status::PublishError> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    fn trigger(name: &str) -> Node {
        Node::new(name, NodeConfig::ManualTrigger)
    }

    fn action(name: &str) -> Node {
        // The scripted executor ignores node configuration; an action-kind
        // config keeps the graph valid (non-trigger nodes carry dependencies).
        Node::new(
            name,
            NodeConfig::HttpRequest(crate::http_request::HttpRequestConfig {
                variable_name: None,
                endpoint: None,
                method: crate::http_request::HttpMethod::Get,
                body: None,
            }),
        )
    }

    fn runner(
        executor: Arc<ScriptedExecutor>,
        publisher: Arc<CollectingPublisher>,
    ) -> Runner<ScriptedExecutor, CollectingPublisher> {
        Runner::new(executor, publisher)
    }

    fn seed() -> ExecutionContext {
        ExecutionContext::new().with_value("stripe", json!({"eventType": "invoice.paid"}))
    }

    #[tokio::test]
    async fn linear_chain_runs_in_dependency_order() {
        let mut workflow = Workflow::new("Linear");
        let t = workflow.graph.add_node(trigger("T"));
        let a = workflow.graph.add_node(action("A"));
        let b = workflow.graph.add_node(action("B"));
        workflow.graph.add_edge(t, a, Edge::new()).unwrap();
        workflow.graph.add_edge(a, b, Edge::new()).unwrap();

        let executor = Arc::new(ScriptedExecutor::new());
        let publisher = Arc::new(CollectingPublisher::default());
        let outcome = runner(executor.clone(), publisher.clone())
            .execute(&workflow, WorkflowRunId::new(), seed())
            .await
            .expect("run should complete");

        assert_eq!(outcome.state, RunState::Completed);
        assert_eq!(executor.invocations(), vec![t, a, b]);
        assert!(!outcome.has_failures());

        // For every edge, the source's success precedes the target's loading.
        let events = publisher.events();
        let position = |node_id, status| {
            events
                .iter()
                .position(|e| e.node_id == node_id && e.status == status)
                .expect("event should exist")
        };
        assert!(position(t, NodeStatus::Success) < position(a, NodeStatus::Loading));
        assert!(position(a, NodeStatus::Success) < position(b, NodeStatus::Loading));
        assert!(position(b, NodeStatus::Loading) < position(b, NodeStatus::Success));
    }

    #[tokio::test]
    async fn cyclic_graph_fails_without_invoking_executors() {
        let mut workflow = Workflow::new("Cyclic");
        let t = workflow.graph.add_node(trigger("T"));
        let a = workflow.graph.add_node(action("A"));
        let b = workflow.graph.add_node(action("B"));
        workflow.graph.add_edge(t, a, Edge::new()).unwrap();
        workflow.graph.add_edge(a, b, Edge::new()).unwrap();
        workflow.graph.add_edge(b, a, Edge::new()).unwrap();

        let executor = Arc::new(ScriptedExecutor::new());
        let publisher = Arc::new(CollectingPublisher::default());
        let result = runner(executor.clone(), publisher.clone())
            .execute(&workflow, WorkflowRunId::new(), seed())
            .await;

        assert_eq!(
            result.unwrap_err(),
            ExecutionError::InvalidGraph(GraphError::CycleDetected)
        );
        assert!(executor.invocations().is_empty());
        assert!(publisher.events().is_empty());
    }

    #[tokio::test]
    async fn sibling_branch_survives_failure() {
        let mut workflow = Workflow::new("Siblings");
        let t = workflow.graph.add_node(trigger("T"));
        let a = workflow.graph.add_node(action("A"));
        let b = workflow.graph.add_node(action("B"));
        workflow.graph.add_edge(t, a, Edge::new()).unwrap();
        workflow.graph.add_edge(t, b, Edge::new()).unwrap();

        let executor = Arc::new(ScriptedExecutor::failing([a]));
        let publisher = Arc::new(CollectingPublisher::default());
        let outcome = runner(executor.clone(), publisher.clone())
            .execute(&workflow, WorkflowRunId::new(), seed())
            .await
            .expect("run should complete");

        // A's failure does not abort B, and the run itself completes.
        assert_eq!(outcome.state, RunState::Completed);
        assert!(outcome.has_failures());
        assert_eq!(outcome.node_state(a), Some(NodeRunState::Failed));
        assert_eq!(outcome.node_state(b), Some(NodeRunState::Succeeded));
        assert_eq!(
            publisher.statuses_for(a),
            vec![NodeStatus::Loading, NodeStatus::Error]
        );
        assert_eq!(
            publisher.statuses_for(b),
            vec![NodeStatus::Loading, NodeStatus::Success]
        );
    }

    #[tokio::test]
    async fn downstream_of_failure_is_reported_not_run() {
        let mut workflow = Workflow::new("Blocked");
        let t = workflow.graph.add_node(trigger("T"));
        let a = workflow.graph.add_node(action("A"));
        let c = workflow.graph.add_node(action("C"));
        workflow.graph.add_edge(t, a, Edge::new()).unwrap();
        workflow.graph.add_edge(a, c, Edge::new()).unwrap();

        let executor = Arc::new(ScriptedExecutor::failing([a]));
        let publisher = Arc::new(CollectingPublisher::default());
        let outcome = runner(executor.clone(), publisher.clone())
            .execute(&workflow, WorkflowRunId::new(), seed())
            .await
            .expect("run should complete");

        // C never executed and its status is distinct from error.
        assert!(!executor.invocations().contains(&c));
        assert_eq!(outcome.node_state(c), Some(NodeRunState::NotRun));
        assert_eq!(publisher.statuses_for(c), vec![NodeStatus::NotRun]);
    }

    #[tokio::test]
    async fn run_fails_when_every_trigger_root_fails() {
        let mut workflow = Workflow::new("Root failure");
        let t = workflow.graph.add_node(trigger("T"));
        let a = workflow.graph.add_node(action("A"));
        workflow.graph.add_edge(t, a, Edge::new()).unwrap();

        let executor = Arc::new(ScriptedExecutor::failing([t]));
        let publisher = Arc::new(CollectingPublisher::default());
        let outcome = runner(executor, publisher)
            .execute(&workflow, WorkflowRunId::new(), seed())
            .await
            .expect("run should settle");

        assert_eq!(outcome.state, RunState::Failed);
        assert_eq!(outcome.node_state(a), Some(NodeRunState::NotRun));
    }

    #[tokio::test]
    async fn dependency_outputs_merge_in_declaration_order() {
        let mut workflow = Workflow::new("Fan-in");
        let t = workflow.graph.add_node(trigger("T"));
        let b = workflow.graph.add_node(action("B"));
        let c = workflow.graph.add_node(action("C"));
        let d = workflow.graph.add_node(action("D"));
        workflow.graph.add_edge(t, b, Edge::new()).unwrap();
        workflow.graph.add_edge(t, c, Edge::new()).unwrap();
        workflow.graph.add_edge(b, d, Edge::new()).unwrap();
        workflow.graph.add_edge(c, d, Edge::new()).unwrap();

        let executor = Arc::new(ScriptedExecutor::new());
        let publisher = Arc::new(CollectingPublisher::default());
        let outcome = runner(executor.clone(), publisher)
            .execute(&workflow, WorkflowRunId::new(), seed())
            .await
            .expect("run should complete");

        assert_eq!(outcome.state, RunState::Completed);
        // Both B and C wrote "last"; the later-declared dependency (C) wins
        // regardless of which branch finished first.
        let input = executor.input_for(d).expect("D should have been invoked");
        assert_eq!(input.get("last"), Some(&json!("C")));
        assert!(input.get("B").is_some());
        assert!(input.get("C").is_some());
    }

    #[tokio::test]
    async fn trigger_roots_receive_the_seed_context() {
        let mut workflow = Workflow::new("Seeded");
        let t = workflow.graph.add_node(trigger("T"));
        let a = workflow.graph.add_node(action("A"));
        workflow.graph.add_edge(t, a, Edge::new()).unwrap();

        let executor = Arc::new(ScriptedExecutor::new());
        let publisher = Arc::new(CollectingPublisher::default());
        let outcome = runner(executor.clone(), publisher)
            .execute(&workflow, WorkflowRunId::new(), seed())
            .await
            .expect("run should complete");

        assert_eq!(executor.input_for(t), Some(seed()));
        // A sees the trigger's output, which includes the seed.
        let a_input = executor.input_for(a).expect("A should run");
        assert!(a_input.get("stripe").is_some());
        // The final context includes the terminal node's output.
        assert_eq!(outcome.context.get("last"), Some(&json!("A")));
    }

    #[tokio::test]
    async fn cancelled_run_schedules_nothing_and_stays_silent() {
        let mut workflow = Workflow::new("Cancelled");
        let t = workflow.graph.add_node(trigger("T"));
        let a = workflow.graph.add_node(action("A"));
        workflow.graph.add_edge(t, a, Edge::new()).unwrap();

        let executor = Arc::new(ScriptedExecutor::new());
        let publisher = Arc::new(CollectingPublisher::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = Runner::with_cancellation(executor.clone(), publisher.clone(), cancel)
            .execute(&workflow, WorkflowRunId::new(), seed())
            .await
            .expect("cancelled runs still settle");

        assert_eq!(outcome.state, RunState::Cancelled);
        assert!(executor.invocations().is_empty());
        assert!(publisher.events().is_empty());
        assert_eq!(outcome.node_state(t), Some(NodeRunState::NotRun));
    }
}
