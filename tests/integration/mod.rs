//! Integration tests for the Roster contact directory

mod cascade;
mod cli_commands;
mod concurrency;
mod config_integration;
mod reconcile_scenarios;
pub mod test_utils;
