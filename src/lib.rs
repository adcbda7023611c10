//! Chat client for retrieval-augmented-generation backends.
//!
//! [`controller::ConversationController`] owns the conversation and talks to
//! the backend through [`client::RagClient`]; [`view::render_state`] turns its
//! state into something a front end can draw. The `ui` module is the
//! terminal front end.

pub mod client;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod logging;
pub mod message;
pub mod metrics;
pub mod ui;
pub mod view;

pub use client::RagClient;
pub use config::Config;
pub use controller::{ConversationController, ReconcilePolicy};
pub use message::{Message, Role};
pub use metrics::Metric;
