//! Directory client
//!
//! Authenticated SOAP client for the remote mail directory's admin service,
//! plus the [`Directory`] trait the reconciliation and lifecycle layers
//! consume.
//!
//! The protocol is XML-over-HTTP: every call wraps one admin operation in a
//! SOAP 1.2 envelope whose header optionally carries an auth token. Business
//! errors arrive as in-band fault elements inside an HTTP 200 response, so
//! callers must distinguish three failure kinds that this crate never
//! collapses: transport failures ([`DirectoryError::Connection`]), HTTP-level
//! failures and protocol faults ([`DirectoryError::Api`]), and the "no such
//! account" fault ([`DirectoryError::NotFound`]).

pub mod client;
pub mod constants;
pub mod error;
pub mod soap;
pub mod traits;
pub mod types;

pub use client::SoapClient;
pub use constants::{map_remote_status, remote_status_for};
pub use error::{DirectoryError, DirectoryResult};
pub use traits::Directory;
pub use types::{parse_directory_timestamp, AccountBy, AccountPage, RemoteAccount};
