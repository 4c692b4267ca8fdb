//! Concrete [`AutomationProvider`](crate::AutomationProvider) implementations.
//!
//! Platform accessibility glue (UIA, AT-SPI) is supplied by the embedding
//! harness behind the provider trait; the scripted provider here replays an
//! in-memory tree for tests and dry runs.

pub mod scripted;

pub use scripted::{ScriptedNode, ScriptedProvider};
