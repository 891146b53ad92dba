//! Authenticated SOAP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use tokio::sync::Mutex;
use tracing::{debug, info};

use mailgov_core::config::DirectoryConfig;
use mailgov_core::{AccountStatus, DirectoryId};

use crate::constants::{remote_status_for, A_ACCOUNT_STATUS, CODE_NO_SUCH_ACCOUNT, NOT_FOUND_SENTINEL};
use crate::error::{DirectoryError, DirectoryResult};
use crate::soap::{self, SoapFault, SoapOutcome};
use crate::traits::Directory;
use crate::types::{AccountBy, AccountPage, RemoteAccount};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// SOAP client for the directory's admin service.
///
/// One instance is shared process-wide. The auth token lives behind a mutex;
/// the locked section both checks and re-authenticates, so concurrent callers
/// that find no token block on a single authentication call instead of each
/// issuing their own.
pub struct SoapClient {
    http: Client,
    config: DirectoryConfig,
    auth_token: Mutex<Option<String>>,
}

impl std::fmt::Debug for SoapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoapClient")
            .field("url", &self.config.url)
            .field("admin_user", &self.config.admin_user)
            .finish()
    }
}

impl SoapClient {
    /// Create a client with bounded request timeouts.
    pub fn new(config: DirectoryConfig) -> DirectoryResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| DirectoryError::api(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            auth_token: Mutex::new(None),
        })
    }

    /// POST one envelope and return the raw response body.
    ///
    /// Transport failures and timeouts are `Connection`; non-2xx responses
    /// are `Api`. In-band faults are the caller's to parse.
    async fn post(&self, envelope: String) -> DirectoryResult<String> {
        let response = self
            .http
            .post(&self.config.url)
            .header(header::CONTENT_TYPE, "application/soap+xml; charset=UTF-8")
            .body(envelope)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DirectoryError::connection(format!("directory request timed out: {e}"))
                } else {
                    DirectoryError::connection(format!("cannot connect to directory: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DirectoryError::connection(format!("reading directory response: {e}")))?;

        if !status.is_success() {
            return Err(DirectoryError::Api {
                message: format!("HTTP error: {status}"),
                code: None,
            });
        }
        Ok(body)
    }

    /// Authenticate and return a fresh token. Does not touch the cache.
    async fn authenticate_inner(&self) -> DirectoryResult<String> {
        let envelope =
            soap::build_auth_request(&self.config.admin_user, &self.config.admin_password);
        let body = self.post(envelope).await?;
        match soap::parse_auth_response(&body).map_err(|e| DirectoryError::api(e.to_string()))? {
            SoapOutcome::Value(token) => {
                info!(user = %self.config.admin_user, "authenticated with directory");
                Ok(token)
            }
            SoapOutcome::Fault(fault) => Err(DirectoryError::Auth {
                message: fault.message,
            }),
        }
    }

    /// Get the cached token, authenticating under the lock if absent.
    async fn token(&self) -> DirectoryResult<String> {
        let mut guard = self.auth_token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }
        let token = self.authenticate_inner().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    /// Force re-authentication, replacing any cached token.
    pub async fn authenticate(&self) -> DirectoryResult<()> {
        let mut guard = self.auth_token.lock().await;
        let token = self.authenticate_inner().await?;
        *guard = Some(token);
        Ok(())
    }

    fn fault_to_error(fault: SoapFault) -> DirectoryError {
        let not_found = fault.message.to_lowercase().contains(NOT_FOUND_SENTINEL)
            || fault.code.as_deref() == Some(CODE_NO_SUCH_ACCOUNT);
        if not_found {
            DirectoryError::NotFound(fault.message)
        } else {
            DirectoryError::Api {
                message: fault.message,
                code: fault.code,
            }
        }
    }

    fn malformed(err: soap::MalformedResponse) -> DirectoryError {
        DirectoryError::api(err.to_string())
    }
}

#[async_trait]
impl Directory for SoapClient {
    async fn search_accounts(
        &self,
        query: &str,
        domain: &str,
        limit: u32,
        offset: u32,
    ) -> DirectoryResult<AccountPage> {
        let token = self.token().await?;
        let envelope = soap::build_search_request(&token, query, domain, limit, offset);
        let body = self.post(envelope).await?;
        match soap::parse_search_response(&body).map_err(Self::malformed)? {
            SoapOutcome::Value(page) => {
                debug!(
                    offset,
                    returned = page.accounts.len(),
                    more = page.more,
                    "directory search page"
                );
                Ok(page)
            }
            SoapOutcome::Fault(fault) => Err(Self::fault_to_error(fault)),
        }
    }

    async fn get_account(&self, by: AccountBy, key: &str) -> DirectoryResult<RemoteAccount> {
        let token = self.token().await?;
        let envelope = soap::build_get_account_request(&token, by, key);
        let body = self.post(envelope).await?;
        match soap::parse_get_account_response(&body).map_err(Self::malformed)? {
            SoapOutcome::Value(account) => Ok(account),
            SoapOutcome::Fault(fault) => Err(Self::fault_to_error(fault)),
        }
    }

    async fn modify_account(
        &self,
        id: &DirectoryId,
        attrs: &[(String, String)],
    ) -> DirectoryResult<()> {
        let token = self.token().await?;
        let envelope = soap::build_modify_request(&token, id.as_str(), attrs);
        let body = self.post(envelope).await?;
        match soap::parse_ack_response(&body).map_err(Self::malformed)? {
            SoapOutcome::Value(()) => {
                let names: Vec<&str> = attrs.iter().map(|(n, _)| n.as_str()).collect();
                info!(account = %id, attrs = ?names, "modified directory account");
                Ok(())
            }
            SoapOutcome::Fault(fault) => Err(Self::fault_to_error(fault)),
        }
    }

    async fn set_account_status(
        &self,
        id: &DirectoryId,
        status: AccountStatus,
    ) -> DirectoryResult<()> {
        let Some(remote_status) = remote_status_for(status) else {
            return Err(DirectoryError::api(format!(
                "status '{status}' has no remote counterpart"
            )));
        };
        self.modify_account(
            id,
            &[(A_ACCOUNT_STATUS.to_string(), remote_status.to_string())],
        )
        .await
    }

    async fn get_mailbox_size(&self, id: &DirectoryId) -> DirectoryResult<u64> {
        let token = self.token().await?;
        let envelope = soap::build_get_mailbox_request(&token, id.as_str());
        let body = self.post(envelope).await?;
        match soap::parse_mailbox_response(&body).map_err(Self::malformed)? {
            SoapOutcome::Value(size) => Ok(size),
            SoapOutcome::Fault(fault) => {
                // Mailbox size is telemetry; a fault here must not fail the
                // caller's sync of the account.
                debug!(account = %id, fault = %fault.message, "mailbox size lookup faulted");
                Ok(0)
            }
        }
    }

    async fn delete_account(&self, id: &DirectoryId) -> DirectoryResult<()> {
        let token = self.token().await?;
        let envelope = soap::build_delete_request(&token, id.as_str());
        let body = self.post(envelope).await?;
        match soap::parse_ack_response(&body).map_err(Self::malformed)? {
            SoapOutcome::Value(()) => {
                info!(account = %id, "deleted directory account");
                Ok(())
            }
            SoapOutcome::Fault(fault) => Err(Self::fault_to_error(fault)),
        }
    }

    async fn test_connection(&self) -> DirectoryResult<()> {
        self.authenticate().await
    }
}
