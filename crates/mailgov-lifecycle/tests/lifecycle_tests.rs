//! Lifecycle state machine and purge processor tests.
//!
//! In-memory fakes stand in for the Postgres store and the directory so the
//! full rule set is exercised: transition-table completeness, remote-first
//! ordering with all-or-nothing local commits, close/reactivate side
//! effects, purge protection and eligibility, and bulk operations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use mailgov_core::{
    AccountStatus, ActorId, AuditEvent, AuditSink, DirectoryId, PurgeEntryStatus, StoreResult,
};
use mailgov_db::{Account, PurgeQueueEntry};
use mailgov_directory::{
    AccountBy, AccountPage, Directory, DirectoryError, DirectoryResult, RemoteAccount,
};
use mailgov_lifecycle::{
    BulkOperationKind, LifecycleConfig, LifecycleService, LifecycleStore, PurgeProcessor,
    TransitionRecord,
};

// =============================================================================
// Fakes
// =============================================================================

#[derive(Default)]
struct FakeStore {
    accounts: Mutex<HashMap<Uuid, Account>>,
    entries: Mutex<Vec<PurgeQueueEntry>>,
    transition_calls: AtomicUsize,
}

impl FakeStore {
    fn seed_account(&self, account: Account) {
        self.accounts.lock().unwrap().insert(account.id, account);
    }

    fn seed_entry(&self, account_id: Uuid, eligible_date: NaiveDate, status: PurgeEntryStatus) {
        let now = Utc::now();
        self.entries.lock().unwrap().push(PurgeQueueEntry {
            id: Uuid::new_v4(),
            account_id,
            eligible_date,
            status: status.to_string(),
            approved_by: None,
            approved_at: None,
            skipped_reason: String::new(),
            created_at: now,
            updated_at: now,
        });
    }

    fn account(&self, id: Uuid) -> Account {
        self.accounts.lock().unwrap().get(&id).cloned().unwrap()
    }

    fn entries_for(&self, account_id: Uuid) -> Vec<PurgeQueueEntry> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LifecycleStore for FakeStore {
    async fn find_account(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.accounts.lock().unwrap().get(&id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_accounts_by_emails(&self, emails: &[String]) -> StoreResult<Vec<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .filter(|a| emails.contains(&a.email))
            .cloned()
            .collect())
    }

    async fn apply_transition(
        &self,
        account_id: Uuid,
        record: TransitionRecord,
    ) -> StoreResult<()> {
        self.transition_calls.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts.get_mut(&account_id).unwrap();

        account.status = record.new_status.to_string();
        account.status_changed_at = Some(record.changed_at);
        account.status_changed_by = record.changed_by.map(|a| a.as_uuid());
        if let Some(remote) = record.remote_status {
            account.remote_status = remote.to_string();
        }

        let mut entries = self.entries.lock().unwrap();
        if let Some(close) = record.close {
            account.closed_at = Some(close.closed_at);
            account.purge_eligible_date = Some(close.purge_eligible_date);
            for entry in entries
                .iter_mut()
                .filter(|e| e.account_id == account_id && e.status().is_open())
            {
                entry.status = PurgeEntryStatus::Cancelled.to_string();
            }
            let now = Utc::now();
            entries.push(PurgeQueueEntry {
                id: Uuid::new_v4(),
                account_id,
                eligible_date: close.purge_eligible_date,
                status: PurgeEntryStatus::Waiting.to_string(),
                approved_by: None,
                approved_at: None,
                skipped_reason: String::new(),
                created_at: now,
                updated_at: now,
            });
        }
        if record.reactivate {
            account.closed_at = None;
            account.purge_eligible_date = None;
            for entry in entries
                .iter_mut()
                .filter(|e| e.account_id == account_id && e.status().is_open())
            {
                entry.status = PurgeEntryStatus::Cancelled.to_string();
            }
        }
        Ok(())
    }

    async fn due_purge_entries(&self, today: NaiveDate) -> StoreResult<Vec<PurgeQueueEntry>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.status() == PurgeEntryStatus::Waiting && e.eligible_date <= today)
            .cloned()
            .collect())
    }

    async fn mark_entry(
        &self,
        entry_id: Uuid,
        status: PurgeEntryStatus,
        reason: Option<&str>,
    ) -> StoreResult<()> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.iter_mut().find(|e| e.id == entry_id).unwrap();
        entry.status = status.to_string();
        if let Some(reason) = reason {
            entry.skipped_reason = reason.to_string();
        }
        Ok(())
    }

    async fn mark_purged(
        &self,
        account_id: Uuid,
        entry_id: Uuid,
        purged_at: chrono::DateTime<Utc>,
    ) -> StoreResult<()> {
        {
            let mut accounts = self.accounts.lock().unwrap();
            let account = accounts.get_mut(&account_id).unwrap();
            account.status = AccountStatus::Purged.to_string();
            account.purged_at = Some(purged_at);
        }
        self.mark_entry(entry_id, PurgeEntryStatus::Executed, None)
            .await
    }
}

/// Directory fake recording status pushes and deletions.
#[derive(Default)]
struct FakeDirectory {
    fail_status_push: bool,
    fail_delete: bool,
    status_pushes: Mutex<Vec<(String, AccountStatus)>>,
    deletions: Mutex<Vec<String>>,
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn search_accounts(
        &self,
        _query: &str,
        _domain: &str,
        _limit: u32,
        _offset: u32,
    ) -> DirectoryResult<AccountPage> {
        Ok(AccountPage::default())
    }

    async fn get_account(&self, _by: AccountBy, key: &str) -> DirectoryResult<RemoteAccount> {
        Err(DirectoryError::NotFound(key.to_string()))
    }

    async fn modify_account(
        &self,
        _id: &DirectoryId,
        _attrs: &[(String, String)],
    ) -> DirectoryResult<()> {
        Ok(())
    }

    async fn set_account_status(
        &self,
        id: &DirectoryId,
        status: AccountStatus,
    ) -> DirectoryResult<()> {
        if self.fail_status_push {
            return Err(DirectoryError::connection("directory unreachable"));
        }
        self.status_pushes
            .lock()
            .unwrap()
            .push((id.as_str().to_string(), status));
        Ok(())
    }

    async fn get_mailbox_size(&self, _id: &DirectoryId) -> DirectoryResult<u64> {
        Ok(0)
    }

    async fn delete_account(&self, id: &DirectoryId) -> DirectoryResult<()> {
        if self.fail_delete {
            return Err(DirectoryError::api("permission denied"));
        }
        self.deletions.lock().unwrap().push(id.as_str().to_string());
        Ok(())
    }

    async fn test_connection(&self) -> DirectoryResult<()> {
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingSink {
    fn actions(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.action.to_string())
            .collect()
    }
}

#[async_trait]
impl AuditSink for RecordingSink {
    async fn record(&self, event: AuditEvent) -> StoreResult<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn account(email: &str, status: AccountStatus) -> Account {
    let now = Utc::now();
    Account {
        id: Uuid::new_v4(),
        directory_id: format!("dir-{email}"),
        email: email.to_string(),
        display_name: email.to_string(),
        domain: "example.com".to_string(),
        status: status.to_string(),
        remote_status: "active".to_string(),
        forwarding_address: String::new(),
        mailbox_size: 0,
        last_login_at: None,
        cos_id: String::new(),
        closed_at: None,
        purge_eligible_date: None,
        purged_at: None,
        status_changed_at: None,
        status_changed_by: None,
        sync_hash: String::new(),
        created_at: now,
        updated_at: now,
    }
}

struct Harness {
    store: Arc<FakeStore>,
    directory: Arc<FakeDirectory>,
    audit: Arc<RecordingSink>,
    service: LifecycleService,
}

fn harness_with_directory(directory: FakeDirectory, purge_delay_days: u32) -> Harness {
    let store = Arc::new(FakeStore::default());
    let directory = Arc::new(directory);
    let audit = Arc::new(RecordingSink::default());
    let service = LifecycleService::new(
        store.clone(),
        directory.clone(),
        audit.clone(),
        LifecycleConfig { purge_delay_days },
    );
    Harness {
        store,
        directory,
        audit,
        service,
    }
}

fn harness() -> Harness {
    harness_with_directory(FakeDirectory::default(), 60)
}

// =============================================================================
// State machine
// =============================================================================

#[tokio::test]
async fn allowed_transition_updates_status_timestamp_and_actor() {
    let h = harness();
    let acct = account("alice@example.com", AccountStatus::Active);
    h.store.seed_account(acct.clone());
    let actor = ActorId::new();

    let outcome = h
        .service
        .change_status(&acct, AccountStatus::Locked, Some(actor), "abuse report")
        .await
        .unwrap();
    assert!(outcome.ok, "{}", outcome.message);

    let stored = h.store.account(acct.id);
    assert_eq!(stored.status(), AccountStatus::Locked);
    assert_eq!(stored.remote_status(), AccountStatus::Locked);
    assert!(stored.status_changed_at.is_some());
    assert_eq!(stored.status_changed_by, Some(actor.as_uuid()));

    // The push reached the directory, once.
    let pushes = h.directory.status_pushes.lock().unwrap().clone();
    assert_eq!(pushes, vec![(acct.directory_id.clone(), AccountStatus::Locked)]);

    assert_eq!(h.audit.actions(), vec!["status_change"]);
}

#[tokio::test]
async fn every_off_table_pair_is_rejected_without_mutation() {
    let h = harness();
    for from in AccountStatus::ALL {
        for to in AccountStatus::ALL {
            if mailgov_lifecycle::check_transition(from, to).is_ok() {
                continue;
            }
            let acct = account(&format!("{from}-{to}@example.com"), from);
            h.store.seed_account(acct.clone());

            let outcome = h
                .service
                .change_status(&acct, to, None, "")
                .await
                .unwrap();
            assert!(!outcome.ok, "{from} -> {to} should be rejected");
            assert_eq!(h.store.account(acct.id).status(), from);
        }
    }
    assert_eq!(h.store.transition_calls.load(Ordering::SeqCst), 0);
    assert!(h.audit.actions().is_empty());
}

#[tokio::test]
async fn remote_failure_aborts_with_no_local_mutation() {
    let h = harness_with_directory(
        FakeDirectory {
            fail_status_push: true,
            ..FakeDirectory::default()
        },
        60,
    );
    let acct = account("alice@example.com", AccountStatus::Active);
    h.store.seed_account(acct.clone());

    let outcome = h
        .service
        .change_status(&acct, AccountStatus::Closed, None, "")
        .await
        .unwrap();
    assert!(!outcome.ok);
    assert!(outcome.message.contains("directory unreachable"));

    let stored = h.store.account(acct.id);
    assert_eq!(stored.status(), AccountStatus::Active);
    assert!(stored.closed_at.is_none());
    assert!(h.store.entries_for(acct.id).is_empty());
    assert_eq!(h.store.transition_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn closing_sets_purge_date_and_queues_one_entry() {
    let h = harness();
    let acct = account("bob@example.com", AccountStatus::Active);
    h.store.seed_account(acct.clone());

    let outcome = h
        .service
        .change_status(&acct, AccountStatus::Closed, None, "departed")
        .await
        .unwrap();
    assert!(outcome.ok);

    let stored = h.store.account(acct.id);
    let expected_date = (Utc::now() + Duration::days(60)).date_naive();
    assert!(stored.closed_at.is_some());
    assert_eq!(stored.purge_eligible_date, Some(expected_date));

    let entries = h.store.entries_for(acct.id);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status(), PurgeEntryStatus::Waiting);
    assert_eq!(entries[0].eligible_date, expected_date);
}

#[tokio::test]
async fn closing_cancels_leftover_open_entries_first() {
    let h = harness();
    let acct = account("bob@example.com", AccountStatus::Locked);
    h.store.seed_account(acct.clone());
    // A stale open entry from an earlier close that was never cleaned up.
    h.store
        .seed_entry(acct.id, Utc::now().date_naive(), PurgeEntryStatus::Waiting);

    h.service
        .change_status(&acct, AccountStatus::Closed, None, "")
        .await
        .unwrap();

    let entries = h.store.entries_for(acct.id);
    let open: Vec<_> = entries.iter().filter(|e| e.status().is_open()).collect();
    assert_eq!(open.len(), 1, "exactly one open entry after closing");
    assert_eq!(
        entries
            .iter()
            .filter(|e| e.status() == PurgeEntryStatus::Cancelled)
            .count(),
        1
    );
}

#[tokio::test]
async fn reactivation_clears_purge_fields_and_cancels_entries() {
    let h = harness();
    let mut acct = account("bob@example.com", AccountStatus::Closed);
    acct.closed_at = Some(Utc::now());
    acct.purge_eligible_date = Some(Utc::now().date_naive());
    h.store.seed_account(acct.clone());
    h.store
        .seed_entry(acct.id, Utc::now().date_naive(), PurgeEntryStatus::Waiting);
    h.store
        .seed_entry(acct.id, Utc::now().date_naive(), PurgeEntryStatus::Approved);

    let outcome = h
        .service
        .change_status(&acct, AccountStatus::Active, None, "returned")
        .await
        .unwrap();
    assert!(outcome.ok);

    let stored = h.store.account(acct.id);
    assert!(stored.closed_at.is_none());
    assert!(stored.purge_eligible_date.is_none());
    assert!(h
        .store
        .entries_for(acct.id)
        .iter()
        .all(|e| e.status() == PurgeEntryStatus::Cancelled));
}

// =============================================================================
// Purge processor
// =============================================================================

#[tokio::test]
async fn due_entry_is_purged_and_recorded() {
    let h = harness();
    let acct = account("gone@example.com", AccountStatus::Closed);
    h.store.seed_account(acct.clone());
    h.store.seed_entry(
        acct.id,
        Utc::now().date_naive() - Duration::days(1),
        PurgeEntryStatus::Waiting,
    );

    let results = PurgeProcessor::new(&h.service).process(false).await.unwrap();
    assert_eq!(results.processed, 1);
    assert_eq!(results.purged, 1);
    assert_eq!(results.errors, 0);

    let stored = h.store.account(acct.id);
    assert_eq!(stored.status(), AccountStatus::Purged);
    assert!(stored.purged_at.is_some());
    assert_eq!(
        h.store.entries_for(acct.id)[0].status(),
        PurgeEntryStatus::Executed
    );
    assert_eq!(
        *h.directory.deletions.lock().unwrap(),
        vec![acct.directory_id.clone()]
    );
    assert_eq!(h.audit.actions(), vec!["purge"]);
}

#[tokio::test]
async fn eligibility_boundary_today_runs_tomorrow_waits() {
    let h = harness();
    let today = Utc::now().date_naive();

    let due = account("due@example.com", AccountStatus::Closed);
    h.store.seed_account(due.clone());
    h.store.seed_entry(due.id, today, PurgeEntryStatus::Waiting);

    let not_due = account("notdue@example.com", AccountStatus::Closed);
    h.store.seed_account(not_due.clone());
    h.store
        .seed_entry(not_due.id, today + Duration::days(1), PurgeEntryStatus::Waiting);

    let results = PurgeProcessor::new(&h.service).process(false).await.unwrap();
    assert_eq!(results.processed, 1);
    assert_eq!(results.purged, 1);

    assert_eq!(h.store.account(due.id).status(), AccountStatus::Purged);
    assert_eq!(h.store.account(not_due.id).status(), AccountStatus::Closed);
    assert_eq!(
        h.store.entries_for(not_due.id)[0].status(),
        PurgeEntryStatus::Waiting
    );
}

#[tokio::test]
async fn protected_account_is_skipped_not_purged() {
    let h = harness();
    let mut acct = account("carol@example.com", AccountStatus::Closed);
    acct.forwarding_address = "carol@elsewhere.net".to_string();
    h.store.seed_account(acct.clone());
    h.store.seed_entry(
        acct.id,
        Utc::now().date_naive() - Duration::days(5),
        PurgeEntryStatus::Waiting,
    );

    let results = PurgeProcessor::new(&h.service).process(false).await.unwrap();
    assert_eq!(results.skipped, 1);
    assert_eq!(results.purged, 0);

    // Carol stays closed; the entry records why it was skipped.
    assert_eq!(h.store.account(acct.id).status(), AccountStatus::Closed);
    let entry = &h.store.entries_for(acct.id)[0];
    assert_eq!(entry.status(), PurgeEntryStatus::Skipped);
    assert!(entry.skipped_reason.contains("carol@elsewhere.net"));
    assert!(h.directory.deletions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn reactivated_account_cancels_stale_entry() {
    let h = harness();
    let acct = account("back@example.com", AccountStatus::Active);
    h.store.seed_account(acct.clone());
    h.store.seed_entry(
        acct.id,
        Utc::now().date_naive() - Duration::days(1),
        PurgeEntryStatus::Waiting,
    );

    let results = PurgeProcessor::new(&h.service).process(false).await.unwrap();
    assert_eq!(results.skipped, 1);
    assert_eq!(results.purged, 0);
    assert_eq!(
        h.store.entries_for(acct.id)[0].status(),
        PurgeEntryStatus::Cancelled
    );
    assert!(h.directory.deletions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn dry_run_counts_would_purge_without_deleting() {
    let h = harness();
    let acct = account("gone@example.com", AccountStatus::Closed);
    h.store.seed_account(acct.clone());
    h.store.seed_entry(
        acct.id,
        Utc::now().date_naive(),
        PurgeEntryStatus::Waiting,
    );

    let results = PurgeProcessor::new(&h.service).process(true).await.unwrap();
    assert_eq!(results.purged, 1);
    assert_eq!(results.details[0].action, "would_purge");

    assert_eq!(h.store.account(acct.id).status(), AccountStatus::Closed);
    assert_eq!(
        h.store.entries_for(acct.id)[0].status(),
        PurgeEntryStatus::Waiting
    );
    assert!(h.directory.deletions.lock().unwrap().is_empty());
    assert!(h.audit.actions().is_empty());
}

#[tokio::test]
async fn remote_delete_failure_leaves_entry_waiting_for_retry() {
    let h = harness_with_directory(
        FakeDirectory {
            fail_delete: true,
            ..FakeDirectory::default()
        },
        60,
    );
    let acct = account("gone@example.com", AccountStatus::Closed);
    h.store.seed_account(acct.clone());
    h.store.seed_entry(
        acct.id,
        Utc::now().date_naive(),
        PurgeEntryStatus::Waiting,
    );

    let results = PurgeProcessor::new(&h.service).process(false).await.unwrap();
    assert_eq!(results.errors, 1);
    assert_eq!(results.purged, 0);
    assert_eq!(results.details[0].action, "error");

    assert_eq!(h.store.account(acct.id).status(), AccountStatus::Closed);
    assert_eq!(
        h.store.entries_for(acct.id)[0].status(),
        PurgeEntryStatus::Waiting
    );
}

#[tokio::test]
async fn entry_for_vanished_account_is_silently_skipped() {
    let h = harness();
    // Entry referencing an account id that no longer exists.
    h.store.seed_entry(
        Uuid::new_v4(),
        Utc::now().date_naive(),
        PurgeEntryStatus::Waiting,
    );

    let results = PurgeProcessor::new(&h.service).process(false).await.unwrap();
    assert_eq!(results.processed, 0);
    assert_eq!(results.errors, 0);
    assert!(results.details.is_empty());
}

// =============================================================================
// Bulk operations
// =============================================================================

#[tokio::test]
async fn bulk_lock_reports_per_account_results() {
    let h = harness();
    let alice = account("alice@example.com", AccountStatus::Active);
    let bob = account("bob@example.com", AccountStatus::Closed);
    h.store.seed_account(alice.clone());
    h.store.seed_account(bob.clone());

    let emails = vec![
        "alice@example.com".to_string(),
        "bob@example.com".to_string(),
        "ghost@example.com".to_string(),
    ];
    let report = h
        .service
        .bulk_change_status(BulkOperationKind::Lock, &emails, None, "audit sweep")
        .await
        .unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.processed, 2);
    // closed -> locked is off the table.
    assert_eq!(report.errors, 1);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.not_found, vec!["ghost@example.com".to_string()]);

    assert_eq!(h.store.account(alice.id).status(), AccountStatus::Locked);
    assert_eq!(h.store.account(bob.id).status(), AccountStatus::Closed);

    // One status_change event for alice plus the bulk summary.
    let actions = h.audit.actions();
    assert!(actions.contains(&"bulk_op".to_string()));
    assert_eq!(
        actions.iter().filter(|a| *a == "status_change").count(),
        1
    );
}

#[tokio::test]
async fn bulk_reactivate_clears_queue_entries() {
    let h = harness();
    let mut acct = account("bob@example.com", AccountStatus::Closed);
    acct.closed_at = Some(Utc::now());
    acct.purge_eligible_date = Some(Utc::now().date_naive());
    h.store.seed_account(acct.clone());
    h.store
        .seed_entry(acct.id, Utc::now().date_naive(), PurgeEntryStatus::Waiting);

    let report = h
        .service
        .bulk_change_status(
            BulkOperationKind::Reactivate,
            &["bob@example.com".to_string()],
            None,
            "",
        )
        .await
        .unwrap();
    assert_eq!(report.succeeded(), 1);
    assert!(h
        .store
        .entries_for(acct.id)
        .iter()
        .all(|e| e.status() == PurgeEntryStatus::Cancelled));
}
