//! Chat commands.
//!
//! [`CommandDispatcher`] owns the API clients and the settings store; each
//! submodule adds the handlers for one group of commands to it.

pub mod context;
pub mod dispatcher;
pub mod ebird;
pub mod help;
pub mod inat;
pub mod last;
pub mod links;
pub mod map;
pub mod places;
pub mod preferences;
pub mod search;

pub use context::{CommandContext, Reply};
pub use dispatcher::{CommandDispatcher, BUILTIN_COMMANDS, DEFAULT_PREFIX};
pub use links::expand_link;
pub use preferences::Switch;
