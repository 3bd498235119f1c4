//! Unit tests for commit queue ordering rules.
