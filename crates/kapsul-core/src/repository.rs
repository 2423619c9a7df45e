//! The repository facade.
//!
//! [`Repository`] owns the in-memory record collection for a running process
//! and mediates every mutation against an [`ExtinguisherStore`]. The
//! collection changes only on [`Repository::load`], on a change signal
//! received by [`Repository::watch`], or after the store confirms a mutation.
//! A failed storage call leaves it untouched.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
  clock::{Clock, SystemClock},
  date::add_interval,
  error::{Error, Result},
  extinguisher::{
    DEFAULT_CAPACITY, Extinguisher, ExtinguisherPatch, ImportCandidate, NewExtinguisher,
    format_code, max_code_number, next_code,
  },
  form::{ValidatedRecord, ValidationError},
  status::{Status, derive_status, resolve_status},
  store::{ExtinguisherStore, TableChange},
};

pub struct Repository<S, C = SystemClock> {
  store:   Arc<S>,
  clock:   C,
  records: RwLock<Vec<Extinguisher>>,
  /// Held across every read-modify-write: code checks and allocation with
  /// their insert, and the read behind a patch with its update.
  writes:  Mutex<()>,
}

impl<S, C> Repository<S, C>
where
  S: ExtinguisherStore,
  C: Clock,
{
  /// An empty repository. Call [`load`](Self::load) before serving reads.
  pub fn new(store: Arc<S>, clock: C) -> Self {
    Self {
      store,
      clock,
      records: RwLock::new(Vec::new()),
      writes: Mutex::new(()),
    }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn clock(&self) -> &C { &self.clock }

  fn persistence(op: &'static str, err: S::Error) -> Error {
    error!(op, error = %err, "storage call failed");
    Error::persistence(err)
  }

  fn resolved(&self, mut record: Extinguisher) -> Extinguisher {
    record.status = resolve_status(record.status, &record.next_recharge_date, &self.clock);
    record
  }

  // ─── Reads ─────────────────────────────────────────────────────────────

  /// Replace the collection with the store's contents, newest first, with
  /// every status recomputed. Returns the record count.
  pub async fn load(&self) -> Result<usize> {
    let fetched = self
      .store
      .list_all()
      .await
      .map_err(|e| Self::persistence("list_all", e))?;
    let fetched: Vec<_> = fetched.into_iter().map(|r| self.resolved(r)).collect();
    let count = fetched.len();
    *self.records.write().await = fetched;
    debug!(count, "collection loaded");
    Ok(count)
  }

  /// A copy of the collection with statuses evaluated against the clock now.
  pub async fn snapshot(&self) -> Vec<Extinguisher> {
    let records = self.records.read().await;
    records.iter().cloned().map(|r| self.resolved(r)).collect()
  }

  pub async fn get(&self, id: Uuid) -> Result<Extinguisher> {
    let records = self.records.read().await;
    records
      .iter()
      .find(|r| r.id == id)
      .cloned()
      .map(|r| self.resolved(r))
      .ok_or(Error::NotFound(id))
  }

  pub async fn existing_codes(&self) -> Vec<String> {
    let records = self.records.read().await;
    records.iter().map(|r| r.code.clone()).collect()
  }

  /// The next `FE-NNN` code after the highest one in the collection.
  pub async fn generate_code(&self) -> String {
    let records = self.records.read().await;
    next_code(records.iter().map(|r| r.code.as_str()))
  }

  // ─── Writes ────────────────────────────────────────────────────────────

  /// Initial status of a record: an explicit override, else derived.
  fn initial_status(&self, requested: Option<Status>, next: &str) -> Status {
    match requested {
      Some(status) if status.is_manual() => status,
      _ => derive_status(next, &self.clock),
    }
  }

  /// Insert a validated record, generating a code if none was given.
  ///
  /// An explicit code is checked against the collection again under the
  /// writes lock, so a concurrent insert of the same code is refused.
  pub async fn add(&self, record: ValidatedRecord) -> Result<Extinguisher> {
    let _guard = self.writes.lock().await;

    let next_recharge_date = add_interval(&record.last_recharge_date, record.kind)?;
    let code = match record.code {
      Some(code) => {
        if self.records.read().await.iter().any(|r| r.code == code) {
          warn!(code = %code, "duplicate code refused");
          return Err(ValidationError::DuplicateCode(code).into());
        }
        code
      }
      None => self.generate_code().await,
    };
    let input = NewExtinguisher {
      status: self.initial_status(record.status, &next_recharge_date),
      code,
      location: record.location,
      kind: record.kind,
      capacity: record.capacity,
      last_recharge_date: record.last_recharge_date,
      next_recharge_date,
      notes: record.notes,
    };

    let created = self
      .store
      .insert_one(input)
      .await
      .map_err(|e| Self::persistence("insert_one", e))?;
    info!(id = %created.id, code = %created.code, "extinguisher added");

    self.records.write().await.insert(0, created.clone());
    Ok(self.resolved(created))
  }

  /// Apply a patch. When the date or type changes, the next recharge date is
  /// recomputed; the status is always re-resolved.
  pub async fn update(&self, id: Uuid, mut patch: ExtinguisherPatch) -> Result<Extinguisher> {
    let _guard = self.writes.lock().await;

    let existing = self
      .store
      .get(id)
      .await
      .map_err(|e| Self::persistence("get", e))?
      .ok_or(Error::NotFound(id))?;

    let next = if patch.affects_schedule() {
      let last = patch
        .last_recharge_date
        .as_deref()
        .unwrap_or(&existing.last_recharge_date);
      let kind = patch.kind.unwrap_or(existing.kind);
      let next = add_interval(last, kind)?;
      patch.next_recharge_date = Some(next.clone());
      next
    } else {
      patch.next_recharge_date = None;
      existing.next_recharge_date.clone()
    };

    patch.status = Some(match patch.status {
      Some(status) if status.is_manual() => status,
      Some(_) => derive_status(&next, &self.clock),
      None => resolve_status(existing.status, &next, &self.clock),
    });

    let updated = self
      .store
      .update(id, patch)
      .await
      .map_err(|e| Self::persistence("update", e))?
      .ok_or(Error::NotFound(id))?;
    info!(id = %id, code = %updated.code, "extinguisher updated");

    let mut records = self.records.write().await;
    match records.iter_mut().find(|r| r.id == id) {
      Some(slot) => *slot = updated.clone(),
      None => records.insert(0, updated.clone()),
    }
    drop(records);
    Ok(self.resolved(updated))
  }

  /// Delete a record. Confirmation is the caller's concern.
  pub async fn remove(&self, id: Uuid) -> Result<()> {
    let deleted = self
      .store
      .delete(id)
      .await
      .map_err(|e| Self::persistence("delete", e))?;
    if !deleted {
      return Err(Error::NotFound(id));
    }
    info!(id = %id, "extinguisher removed");
    self.records.write().await.retain(|r| r.id != id);
    Ok(())
  }

  /// Bulk-insert pre-validated rows with sequential generated codes.
  /// Returns the number of rows submitted.
  pub async fn import_batch(&self, rows: Vec<ImportCandidate>) -> Result<usize> {
    if rows.is_empty() {
      return Ok(0);
    }
    let _guard = self.writes.lock().await;

    let first = {
      let records = self.records.read().await;
      max_code_number(records.iter().map(|r| r.code.as_str())) + 1
    };

    let inputs = rows
      .into_iter()
      .zip(first..)
      .map(|(row, n)| -> Result<NewExtinguisher> {
        let next_recharge_date = add_interval(&row.last_recharge_date, row.kind)?;
        Ok(NewExtinguisher {
          code: format_code(n),
          location: row.location,
          kind: row.kind,
          capacity: DEFAULT_CAPACITY.to_owned(),
          last_recharge_date: row.last_recharge_date,
          status: derive_status(&next_recharge_date, &self.clock),
          next_recharge_date,
          notes: String::new(),
        })
      })
      .collect::<Result<Vec<_>>>()?;
    let submitted = inputs.len();

    let created = self
      .store
      .insert_many(inputs)
      .await
      .map_err(|e| Self::persistence("insert_many", e))?;
    info!(count = submitted, "import batch inserted");

    self.records.write().await.splice(0..0, created.into_iter().rev());
    Ok(submitted)
  }

  // ─── Change feed ───────────────────────────────────────────────────────

  /// Reload on every change signal until the feed closes.
  ///
  /// Reload failures are logged and the previous collection is kept.
  pub async fn watch(self: Arc<Self>, mut changes: broadcast::Receiver<TableChange>) {
    loop {
      match changes.recv().await {
        Ok(change) => debug!(?change, "table changed"),
        Err(broadcast::error::RecvError::Lagged(missed)) => {
          debug!(missed, "change feed lagged");
        }
        Err(broadcast::error::RecvError::Closed) => break,
      }
      if let Err(err) = self.load().await {
        warn!(error = %err, "reload after change failed");
      }
    }
    debug!("change feed closed");
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex as StdMutex;

  use chrono::{NaiveDate, Utc};

  use super::*;
  use crate::{clock::FixedClock, extinguisher::ExtinguisherType};

  #[derive(Debug, thiserror::Error)]
  #[error("store offline")]
  struct Offline;

  /// An in-memory store whose writes can be switched off.
  #[derive(Default)]
  struct MemoryStore {
    rows:    StdMutex<Vec<Extinguisher>>,
    offline: StdMutex<bool>,
  }

  impl MemoryStore {
    fn check(&self) -> std::result::Result<(), Offline> {
      if *self.offline.lock().unwrap() { Err(Offline) } else { Ok(()) }
    }

    fn materialise(input: NewExtinguisher) -> Extinguisher {
      let now = Utc::now();
      Extinguisher {
        id: Uuid::new_v4(),
        code: input.code,
        location: input.location,
        kind: input.kind,
        capacity: input.capacity,
        last_recharge_date: input.last_recharge_date,
        next_recharge_date: input.next_recharge_date,
        status: input.status,
        notes: input.notes,
        created_at: now,
        updated_at: now,
      }
    }
  }

  impl ExtinguisherStore for MemoryStore {
    type Error = Offline;

    async fn list_all(&self) -> std::result::Result<Vec<Extinguisher>, Offline> {
      self.check()?;
      Ok(self.rows.lock().unwrap().iter().rev().cloned().collect())
    }

    async fn get(&self, id: Uuid) -> std::result::Result<Option<Extinguisher>, Offline> {
      self.check()?;
      let row = self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned();
      // Give concurrent callers a chance to run between a read and a write.
      tokio::task::yield_now().await;
      Ok(row)
    }

    async fn insert_one(
      &self,
      input: NewExtinguisher,
    ) -> std::result::Result<Extinguisher, Offline> {
      self.check()?;
      let record = Self::materialise(input);
      self.rows.lock().unwrap().push(record.clone());
      Ok(record)
    }

    async fn insert_many(
      &self,
      inputs: Vec<NewExtinguisher>,
    ) -> std::result::Result<Vec<Extinguisher>, Offline> {
      self.check()?;
      let records: Vec<_> = inputs.into_iter().map(Self::materialise).collect();
      self.rows.lock().unwrap().extend(records.iter().cloned());
      Ok(records)
    }

    async fn update(
      &self,
      id: Uuid,
      patch: ExtinguisherPatch,
    ) -> std::result::Result<Option<Extinguisher>, Offline> {
      self.check()?;
      let mut rows = self.rows.lock().unwrap();
      let Some(row) = rows.iter_mut().find(|r| r.id == id) else {
        return Ok(None);
      };
      if let Some(v) = patch.code { row.code = v; }
      if let Some(v) = patch.location { row.location = v; }
      if let Some(v) = patch.kind { row.kind = v; }
      if let Some(v) = patch.capacity { row.capacity = v; }
      if let Some(v) = patch.last_recharge_date { row.last_recharge_date = v; }
      if let Some(v) = patch.next_recharge_date { row.next_recharge_date = v; }
      if let Some(v) = patch.status { row.status = v; }
      if let Some(v) = patch.notes { row.notes = v; }
      Ok(Some(row.clone()))
    }

    async fn delete(&self, id: Uuid) -> std::result::Result<bool, Offline> {
      self.check()?;
      let mut rows = self.rows.lock().unwrap();
      let before = rows.len();
      rows.retain(|r| r.id != id);
      Ok(rows.len() != before)
    }
  }

  fn clock() -> FixedClock {
    FixedClock(
      NaiveDate::from_ymd_opt(1405, 7, 26)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap(),
    )
  }

  fn repo() -> Repository<MemoryStore, FixedClock> {
    Repository::new(Arc::new(MemoryStore::default()), clock())
  }

  fn draft(location: &str, date: &str, kind: ExtinguisherType) -> ValidatedRecord {
    ValidatedRecord {
      code: None,
      location: location.into(),
      kind,
      capacity: "6".into(),
      last_recharge_date: date.into(),
      notes: String::new(),
      status: None,
    }
  }

  fn candidate(location: &str, date: &str) -> ImportCandidate {
    ImportCandidate {
      location:           location.into(),
      last_recharge_date: date.into(),
      kind:               ExtinguisherType::Powder,
    }
  }

  #[tokio::test]
  async fn add_generates_codes_and_derives_fields() {
    let repo = repo();
    let first = repo.add(draft("Lobby", "1403/06/20", ExtinguisherType::Co2)).await.unwrap();
    assert_eq!(first.code, "FE-001");
    assert_eq!(first.next_recharge_date, "1408/06/20");
    assert_eq!(first.status, Status::Active);

    let second = repo.add(draft("Kitchen", "1404/07/01", ExtinguisherType::Powder)).await.unwrap();
    assert_eq!(second.code, "FE-002");
    assert_eq!(second.next_recharge_date, "1405/07/01");
    assert_eq!(second.status, Status::Expired);

    let snapshot = repo.snapshot().await;
    assert_eq!(snapshot[0].code, "FE-002");
    assert_eq!(snapshot.len(), 2);
  }

  #[tokio::test]
  async fn explicit_code_is_kept() {
    let repo = repo();
    let mut record = draft("Lobby", "1403/06/20", ExtinguisherType::Powder);
    record.code = Some("FE-010".into());
    repo.add(record).await.unwrap();
    assert_eq!(repo.generate_code().await, "FE-011");
  }

  #[tokio::test]
  async fn failed_write_leaves_collection_untouched() {
    let repo = repo();
    repo.add(draft("Lobby", "1403/06/20", ExtinguisherType::Powder)).await.unwrap();
    *repo.store().offline.lock().unwrap() = true;

    let err = repo
      .add(draft("Kitchen", "1403/06/20", ExtinguisherType::Powder))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Persistence(_)));
    assert_eq!(repo.snapshot().await.len(), 1);

    let err = repo.load().await.unwrap_err();
    assert!(matches!(err, Error::Persistence(_)));
    assert_eq!(repo.snapshot().await.len(), 1);
  }

  #[tokio::test]
  async fn update_recomputes_next_date_on_type_change() {
    let repo = repo();
    let record = repo.add(draft("Lobby", "1405/01/10", ExtinguisherType::Powder)).await.unwrap();
    assert_eq!(record.status, Status::Active);

    let patch = ExtinguisherPatch { kind: Some(ExtinguisherType::Co2), ..Default::default() };
    let updated = repo.update(record.id, patch).await.unwrap();
    assert_eq!(updated.next_recharge_date, "1410/01/10");

    let patch = ExtinguisherPatch {
      last_recharge_date: Some("1400/07/01".into()),
      ..Default::default()
    };
    let updated = repo.update(record.id, patch).await.unwrap();
    assert_eq!(updated.next_recharge_date, "1405/07/01");
    assert_eq!(updated.status, Status::Expired);
    assert_eq!(repo.get(record.id).await.unwrap().status, Status::Expired);
  }

  #[tokio::test]
  async fn concurrent_patches_keep_the_schedule_consistent() {
    let repo = repo();
    let record = repo.add(draft("Lobby", "1405/01/10", ExtinguisherType::Powder)).await.unwrap();

    let to_co2 = ExtinguisherPatch { kind: Some(ExtinguisherType::Co2), ..Default::default() };
    let backdate = ExtinguisherPatch {
      last_recharge_date: Some("1400/01/01".into()),
      ..Default::default()
    };
    let (a, b) = tokio::join!(repo.update(record.id, to_co2), repo.update(record.id, backdate));
    a.unwrap();
    b.unwrap();

    let stored = repo.store().get(record.id).await.unwrap().unwrap();
    assert_eq!(stored.kind, ExtinguisherType::Co2);
    assert_eq!(stored.last_recharge_date, "1400/01/01");
    assert_eq!(stored.next_recharge_date, "1405/01/01");
  }

  #[tokio::test]
  async fn explicit_code_is_rechecked_under_the_write_lock() {
    let repo = repo();
    let coded = |location: &str, code: &str| {
      let mut record = draft(location, "1403/06/20", ExtinguisherType::Powder);
      record.code = Some(code.into());
      record
    };

    let (a, b) = tokio::join!(
      repo.add(coded("Lobby", "FE-005")),
      repo.add(coded("Kitchen", "FE-005"))
    );
    let errors: Vec<_> = [a, b].into_iter().filter_map(Result::err).collect();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
      &errors[0],
      Error::Validation(ValidationError::DuplicateCode(code)) if code == "FE-005"
    ));

    // A code handed out by an import is refused for a later explicit insert.
    repo.import_batch(vec![candidate("Roof", "1403/06/20")]).await.unwrap();
    let err = repo.add(coded("Yard", "FE-006")).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::DuplicateCode(_))));
    assert_eq!(repo.store().rows.lock().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn notes_only_update_keeps_schedule() {
    let repo = repo();
    let record = repo.add(draft("Lobby", "1405/01/10", ExtinguisherType::Powder)).await.unwrap();
    let patch = ExtinguisherPatch { notes: Some("checked".into()), ..Default::default() };
    let updated = repo.update(record.id, patch).await.unwrap();
    assert_eq!(updated.notes, "checked");
    assert_eq!(updated.next_recharge_date, record.next_recharge_date);
  }

  #[tokio::test]
  async fn manual_override_survives_reload_until_cleared() {
    let repo = repo();
    let record = repo.add(draft("Lobby", "1405/01/10", ExtinguisherType::Powder)).await.unwrap();

    let patch = ExtinguisherPatch { status: Some(Status::OutOfOrder), ..Default::default() };
    repo.update(record.id, patch).await.unwrap();
    repo.load().await.unwrap();
    assert_eq!(repo.get(record.id).await.unwrap().status, Status::OutOfOrder);

    let patch = ExtinguisherPatch { notes: Some("x".into()), ..Default::default() };
    assert_eq!(repo.update(record.id, patch).await.unwrap().status, Status::OutOfOrder);

    let patch = ExtinguisherPatch { status: Some(Status::Active), ..Default::default() };
    assert_eq!(repo.update(record.id, patch).await.unwrap().status, Status::Active);
  }

  #[tokio::test]
  async fn out_of_range_date_is_rejected_before_storage() {
    let repo = repo();
    let err = repo
      .add(draft("Lobby", "1403/13/01", ExtinguisherType::Powder))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Date(_)));
    assert!(repo.store().rows.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn update_and_remove_unknown_ids() {
    let repo = repo();
    let id = Uuid::new_v4();
    assert!(matches!(
      repo.update(id, ExtinguisherPatch::default()).await,
      Err(Error::NotFound(_))
    ));
    assert!(matches!(repo.remove(id).await, Err(Error::NotFound(_))));
  }

  #[tokio::test]
  async fn remove_drops_record() {
    let repo = repo();
    let record = repo.add(draft("Lobby", "1403/06/20", ExtinguisherType::Powder)).await.unwrap();
    repo.remove(record.id).await.unwrap();
    assert!(repo.snapshot().await.is_empty());
    assert!(matches!(repo.get(record.id).await, Err(Error::NotFound(_))));
  }

  #[tokio::test]
  async fn import_assigns_sequential_codes_after_the_maximum() {
    let repo = repo();
    let mut record = draft("Lobby", "1403/06/20", ExtinguisherType::Powder);
    record.code = Some("FE-007".into());
    repo.add(record).await.unwrap();

    let count = repo
      .import_batch(vec![candidate("A", "1403/06/20"), candidate("B", "1403/06/21")])
      .await
      .unwrap();
    assert_eq!(count, 2);

    let mut codes = repo.existing_codes().await;
    codes.sort();
    assert_eq!(codes, ["FE-007", "FE-008", "FE-009"]);
    assert_eq!(repo.get_by_code("FE-009").await.location, "B");
  }

  #[tokio::test]
  async fn empty_import_makes_no_storage_call() {
    let repo = repo();
    *repo.store().offline.lock().unwrap() = true;
    assert_eq!(repo.import_batch(Vec::new()).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn watch_reloads_on_change_and_stops_when_closed() {
    let repo = Arc::new(repo());
    let (tx, rx) = broadcast::channel(8);
    let task = tokio::spawn(Arc::clone(&repo).watch(rx));

    // A write made behind the repository's back.
    repo
      .store()
      .insert_one(NewExtinguisher {
        code:               "FE-100".into(),
        location:           "Roof".into(),
        kind:               ExtinguisherType::Water,
        capacity:           "9".into(),
        last_recharge_date: "1405/01/01".into(),
        next_recharge_date: "1406/01/01".into(),
        status:             Status::Active,
        notes:              String::new(),
      })
      .await
      .unwrap();
    tx.send(TableChange::Inserted).unwrap();
    drop(tx);
    task.await.unwrap();

    let snapshot = repo.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].code, "FE-100");
  }

  impl Repository<MemoryStore, FixedClock> {
    async fn get_by_code(&self, code: &str) -> Extinguisher {
      self
        .snapshot()
        .await
        .into_iter()
        .find(|r| r.code == code)
        .unwrap()
    }
  }
}
