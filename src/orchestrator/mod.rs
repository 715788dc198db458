//! Application-level orchestration.
//!
//! This module owns the animation lifecycle (start, cancel-then-restart, quit). UI/CLI
//! layers send commands here and only mirror state from the events it forwards.

mod controller;

pub(crate) use controller::{run_controller, UiCommand};
