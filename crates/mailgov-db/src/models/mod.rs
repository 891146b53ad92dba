//! Database models.

pub mod account;
pub mod audit_log;
pub mod purge_queue;
pub mod setting;
pub mod sync_run;
