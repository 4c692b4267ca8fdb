//! Unit tests for the retry poller, selectors, script handling and the
//! declarative workflow table.

mod script_tests;
mod selector_tests;
