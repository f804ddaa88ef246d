//! Roster: Contact and Group Membership Engine
//!
//! A contact directory where contacts belong to any number of groups. Every
//! mutation runs as one sled transaction, so entity rows, unique indexes and
//! membership pairs always change together.

pub mod cli;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod reconcile;
pub mod response;
pub mod store;
pub mod transaction;
pub mod types;

pub use command::{Command, CommandOutcome};
pub use engine::Engine;
pub use error::{EngineError, ErrorKind};
pub use response::ApiResponse;
pub use transaction::CancelToken;
pub use types::{ContactId, ContactIdSet, GroupId, GroupIdSet};
