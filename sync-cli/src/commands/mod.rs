//! CLI command implementations.

pub mod feed;
pub mod fetch;
pub mod list;
pub mod pref;
pub mod probe;
pub mod watch;

use clap::ValueEnum;

/// Resource kinds the CLI knows how to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    /// Groups (addressable by id, slug or name).
    Group,
    /// Feed items (addressable by id).
    Feed,
}
