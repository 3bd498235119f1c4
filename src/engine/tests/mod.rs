//! Unit tests for the task graph engine.

mod reset_tests;
mod support;
mod task_group_tests;
