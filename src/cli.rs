//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to the engine.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::{command_name, map_error};
pub use parse::{Cli, Commands, ConfigCommands, ContactArgs, ContactCommands, GroupCommands, OutputFormat};
pub use route::RunContext;
