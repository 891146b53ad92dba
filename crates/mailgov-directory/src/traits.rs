//! The `Directory` seam.
//!
//! Reconciliation and lifecycle code consume this trait rather than the SOAP
//! client directly, so their tests can run against in-memory fakes.

use async_trait::async_trait;
use mailgov_core::{AccountStatus, DirectoryId};

use crate::error::DirectoryResult;
use crate::types::{AccountBy, AccountPage, RemoteAccount};

/// Domain operations against the remote mail directory.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Fetch one page of the account listing.
    ///
    /// `query` is a directory-side filter expression and may be empty;
    /// `domain` restricts to one mail domain when non-empty. The returned
    /// page's `more` flag drives pagination: callers advance `offset` by
    /// their page size while it is set.
    async fn search_accounts(
        &self,
        query: &str,
        domain: &str,
        limit: u32,
        offset: u32,
    ) -> DirectoryResult<AccountPage>;

    /// Fetch a single account by id or name.
    async fn get_account(&self, by: AccountBy, key: &str) -> DirectoryResult<RemoteAccount>;

    /// Modify arbitrary account attributes.
    async fn modify_account(
        &self,
        id: &DirectoryId,
        attrs: &[(String, String)],
    ) -> DirectoryResult<()>;

    /// Push a local status to the directory.
    ///
    /// Only statuses with a remote counterpart may be pushed; asking for a
    /// local-only status is a caller bug and reported as an API error.
    async fn set_account_status(
        &self,
        id: &DirectoryId,
        status: AccountStatus,
    ) -> DirectoryResult<()>;

    /// Fetch the mailbox size in bytes. Best-effort telemetry: an in-band
    /// fault reads as 0 rather than an error.
    async fn get_mailbox_size(&self, id: &DirectoryId) -> DirectoryResult<u64>;

    /// Permanently delete an account from the directory.
    async fn delete_account(&self, id: &DirectoryId) -> DirectoryResult<()>;

    /// Verify connectivity and credentials by (re)authenticating.
    async fn test_connection(&self) -> DirectoryResult<()>;
}
