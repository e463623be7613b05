//! Workflow execution engine for the tributary platform.
//!
//! This crate provides the core workflow execution engine, including:
//!
//! - **Graph Model**: Directed dependency graphs using petgraph with typed nodes
//! - **Node Types**: Manual, Stripe, and Google Form triggers plus the HTTP
//!   request action
//! - **Execution Context**: Snapshot-semantics key/value state threaded between
//!   nodes
//! - **Templates**: `{{path.to.value}}` resolution against the context
//! - **Scheduling**: Dependency-ordered, partially-concurrent graph walking
//!   with partial-failure semantics
//! - **Status**: Live per-node status events published over NATS

pub mod context;
pub mod definition;
pub mod dispatch;
pub mod edge;
pub mod error;
pub mod executor;
pub mod graph;
pub mod http_request;
pub mod nats;
pub mod node;
pub mod ready;
pub mod run;
pub mod runner;
pub mod status;
pub mod step;
pub mod store;
pub mod template;
pub mod trigger;

pub use context::ExecutionContext;
pub use definition::{Workflow, WorkflowMetadata};
pub use dispatch::{DispatchError, ExecutionDispatcher};
pub use edge::Edge;
pub use error::{ExecutionError, ExecutorError, GraphError};
pub use executor::{DefaultExecutor, NodeExecutor, PassthroughExecutor};
pub use graph::WorkflowGraph;
pub use http_request::{HttpMethod, HttpRequestConfig, HttpRequestExecutor};
pub use nats::NatsStatusPublisher;
pub use node::{Node, NodeConfig, NodeId, NodeKind};
pub use run::{NodeRunRecord, NodeRunState, RunOutcome, RunState};
pub use runner::Runner;
pub use status::{
    ChannelPublisher, NodeStatus, NoopPublisher, PublishError, StatusEvent, StatusPublisher,
};
pub use step::{RetryPolicy, StepRunner};
pub use store::{InMemoryWorkflowStore, StoreError, WorkflowStore};
pub use trigger::{GoogleFormEvent, StripeEvent, TriggerEvent};
