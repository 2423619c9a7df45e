//! [`SqliteStore`]: the SQLite implementation of [`ExtinguisherStore`],
//! [`ChangeFeed`] and [`UserStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use kapsul_core::{
  extinguisher::{Extinguisher, ExtinguisherPatch, NewExtinguisher},
  identity::{NewUser, Session, User, UserRecord, UserStore},
  store::{ChangeFeed, ExtinguisherStore, TableChange},
};

use crate::{
  Result,
  encode::{EXTINGUISHER_COLUMNS, RawExtinguisher, RawSession, RawUser, encode_dt, encode_uuid},
  schema::SCHEMA,
};

/// Buffered change signals per subscriber before it starts lagging.
const CHANGE_BUFFER: usize = 64;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Kapsul store backed by a single SQLite file.
///
/// Cloning is cheap; clones share the connection and the change feed.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  changes: broadcast::Sender<TableChange>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    let (changes, _) = broadcast::channel(CHANGE_BUFFER);
    Ok(Self { conn, changes })
  }

  /// Signal subscribers. Having none is not an error.
  fn notify(&self, change: TableChange) {
    let receivers = self.changes.send(change).unwrap_or(0);
    debug!(?change, receivers, "change published");
  }

  async fn select_one(&self, id: Uuid) -> Result<Option<Extinguisher>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawExtinguisher> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {EXTINGUISHER_COLUMNS} FROM extinguishers WHERE id = ?1"),
            rusqlite::params![id_str],
            RawExtinguisher::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawExtinguisher::into_extinguisher).transpose()
  }
}

/// A fully-built row ready for INSERT.
struct InsertRow {
  record: Extinguisher,
}

impl InsertRow {
  fn new(input: NewExtinguisher) -> Self {
    let now = Utc::now();
    Self {
      record: Extinguisher {
        id:                 Uuid::new_v4(),
        code:               input.code,
        location:           input.location,
        kind:               input.kind,
        capacity:           input.capacity,
        last_recharge_date: input.last_recharge_date,
        next_recharge_date: input.next_recharge_date,
        status:             input.status,
        notes:              input.notes,
        created_at:         now,
        updated_at:         now,
      },
    }
  }

  fn execute(&self, conn: &rusqlite::Connection) -> rusqlite::Result<usize> {
    let r = &self.record;
    conn.execute(
      &format!(
        "INSERT INTO extinguishers ({EXTINGUISHER_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
      ),
      rusqlite::params![
        encode_uuid(r.id),
        r.code,
        r.location,
        r.kind.as_str(),
        r.capacity,
        r.last_recharge_date,
        r.next_recharge_date,
        r.status.as_str(),
        r.notes,
        encode_dt(r.created_at),
        encode_dt(r.updated_at),
      ],
    )
  }
}

// ─── ExtinguisherStore impl ──────────────────────────────────────────────────

impl ExtinguisherStore for SqliteStore {
  type Error = crate::Error;

  async fn list_all(&self) -> Result<Vec<Extinguisher>> {
    let raws: Vec<RawExtinguisher> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EXTINGUISHER_COLUMNS} FROM extinguishers
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawExtinguisher::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawExtinguisher::into_extinguisher).collect()
  }

  async fn get(&self, id: Uuid) -> Result<Option<Extinguisher>> { self.select_one(id).await }

  async fn insert_one(&self, input: NewExtinguisher) -> Result<Extinguisher> {
    let row = InsertRow::new(input);

    let row = self
      .conn
      .call(move |conn| {
        row.execute(conn)?;
        Ok(row)
      })
      .await?;

    self.notify(TableChange::Inserted);
    Ok(row.record)
  }

  async fn insert_many(&self, inputs: Vec<NewExtinguisher>) -> Result<Vec<Extinguisher>> {
    if inputs.is_empty() {
      return Ok(Vec::new());
    }
    let rows: Vec<InsertRow> = inputs.into_iter().map(InsertRow::new).collect();

    let rows = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for row in &rows {
          row.execute(&tx)?;
        }
        tx.commit()?;
        Ok(rows)
      })
      .await?;

    self.notify(TableChange::Inserted);
    Ok(rows.into_iter().map(|r| r.record).collect())
  }

  async fn update(&self, id: Uuid, patch: ExtinguisherPatch) -> Result<Option<Extinguisher>> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        // One statement, so the patch applies entirely or not at all.
        let changed = conn.execute(
          "UPDATE extinguishers SET
             code               = COALESCE(?2, code),
             location           = COALESCE(?3, location),
             type               = COALESCE(?4, type),
             capacity           = COALESCE(?5, capacity),
             last_recharge_date = COALESCE(?6, last_recharge_date),
             next_recharge_date = COALESCE(?7, next_recharge_date),
             status             = COALESCE(?8, status),
             notes              = COALESCE(?9, notes),
             updated_at         = ?10
           WHERE id = ?1",
          rusqlite::params![
            id_str,
            patch.code,
            patch.location,
            patch.kind.map(|k| k.as_str()),
            patch.capacity,
            patch.last_recharge_date,
            patch.next_recharge_date,
            patch.status.map(|s| s.as_str()),
            patch.notes,
            at_str,
          ],
        )?;
        Ok(changed)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.notify(TableChange::Updated);
    self.select_one(id).await
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM extinguishers WHERE id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    if changed > 0 {
      self.notify(TableChange::Deleted);
    }
    Ok(changed > 0)
  }
}

impl ChangeFeed for SqliteStore {
  fn subscribe(&self) -> broadcast::Receiver<TableChange> { self.changes.subscribe() }
}

// ─── UserStore impl ──────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  type Error = crate::Error;

  async fn create_user(&self, input: NewUser) -> Result<Option<User>> {
    let user = User {
      user_id:    Uuid::new_v4(),
      email:      input.email,
      full_name:  input.full_name,
      role:       input.role,
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(user.user_id);
    let email     = user.email.clone();
    let full_name = user.full_name.clone();
    let role      = user.role.as_str();
    let at_str    = encode_dt(user.created_at);
    let hash      = input.password_hash;

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO users (user_id, email, full_name, password_hash, role, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT(email) DO NOTHING",
          rusqlite::params![id_str, email, full_name, hash, role, at_str],
        )?)
      })
      .await?;

    Ok((inserted > 0).then_some(user))
  }

  async fn find_credentials(&self, email: &str) -> Result<Option<UserRecord>> {
    let email = email.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, email, full_name, password_hash, role, created_at
             FROM users WHERE email = ?1",
            rusqlite::params![email],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|raw| -> Result<UserRecord> {
        let (user, password_hash) = raw.into_parts()?;
        Ok(UserRecord { user, password_hash })
      })
      .transpose()
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, email, full_name, password_hash, role, created_at
             FROM users WHERE user_id = ?1",
            rusqlite::params![id_str],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(|raw| raw.into_parts().map(|(user, _)| user)).transpose()
  }

  async fn create_session(&self, session: Session) -> Result<()> {
    let user_id = encode_uuid(session.user_id);
    let created = encode_dt(session.created_at);
    let expires = encode_dt(session.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![session.token_hash, user_id, created, expires],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_session(&self, token_hash: &str) -> Result<Option<Session>> {
    let token_hash = token_hash.to_owned();

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT token_hash, user_id, created_at, expires_at
             FROM sessions WHERE token_hash = ?1",
            rusqlite::params![token_hash],
            |row| {
              Ok(RawSession {
                token_hash: row.get(0)?,
                user_id:    row.get(1)?,
                created_at: row.get(2)?,
                expires_at: row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn delete_session(&self, token_hash: &str) -> Result<()> {
    let token_hash = token_hash.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![token_hash],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
