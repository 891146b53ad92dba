//! CLI subcommands.

pub mod purge;
pub mod schedule;
pub mod serve;
pub mod status;
pub mod sync;
