use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::{
    Entry, EntryLookup, EntryPatch, Journal, JournalEntries, JournalEntry, JournalPatch,
    JournalType, User, UserJournal,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Opens the store and creates its tables.
///
/// An in-memory SQLite database only lives as long as its connection, so the
/// pool is pinned to a single connection that is never recycled. Every request
/// is therefore served against the same store, one at a time.
pub async fn connect(db_url: &str) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_tables(&pool).await?;
    Ok(pool)
}

pub async fn create_tables(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT UNIQUE NOT NULL,
            email TEXT,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS journals (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            type TEXT NOT NULL,
            user_id TEXT NOT NULL REFERENCES users(id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            journal_id TEXT NOT NULL REFERENCES journals(id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

// Millisecond precision keeps the values stable across a store round trip.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
    email: Option<&str>,
) -> Result<User, StoreError> {
    let user = User {
        id: new_id(),
        username: username.to_string(),
        email: email.map(str::to_string),
        created_at: now(),
    };

    let inserted = sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(password_hash)
    .bind(user.created_at)
    .execute(pool)
    .await;

    match inserted {
        Ok(_) => Ok(user),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => Err(
            StoreError::Conflict(format!("username {username} is already taken")),
        ),
        Err(err) => Err(err.into()),
    }
}

pub async fn get_user(pool: &SqlitePool, user_id: &str) -> Result<Option<User>, StoreError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, created_at FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Returns the user together with its stored password hash.
pub async fn find_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<(User, String)>, StoreError> {
    #[derive(sqlx::FromRow)]
    struct Row {
        #[sqlx(flatten)]
        user: User,
        password_hash: String,
    }

    let row = sqlx::query_as::<_, Row>(
        "SELECT id, username, email, created_at, password_hash FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| (row.user, row.password_hash)))
}

pub async fn create_journal(
    pool: &SqlitePool,
    user_id: &str,
    title: &str,
) -> Result<UserJournal, StoreError> {
    let user = get_user(pool, user_id)
        .await?
        .ok_or(StoreError::NotFound("user"))?;

    let created = now();
    let journal = Journal {
        id: new_id(),
        title: title.to_string(),
        kind: JournalType::Public,
        user_id: user.id.clone(),
        created_at: created,
        updated_at: created,
    };

    sqlx::query(
        r#"
        INSERT INTO journals (id, title, type, user_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&journal.id)
    .bind(&journal.title)
    .bind(journal.kind)
    .bind(&journal.user_id)
    .bind(journal.created_at)
    .bind(journal.updated_at)
    .execute(pool)
    .await?;

    Ok(UserJournal { user, journal })
}

pub async fn get_journal(
    pool: &SqlitePool,
    journal_id: &str,
) -> Result<Option<Journal>, StoreError> {
    let journal = sqlx::query_as::<_, Journal>(
        "SELECT id, title, type, user_id, created_at, updated_at FROM journals WHERE id = ?",
    )
    .bind(journal_id)
    .fetch_optional(pool)
    .await?;

    Ok(journal)
}

/// Stores a new entry and stamps the parent journal with the entry's
/// creation time, in one transaction.
pub async fn add_entry(
    pool: &SqlitePool,
    journal_id: &str,
    title: &str,
    content: &str,
) -> Result<JournalEntry, StoreError> {
    let mut tx = pool.begin().await?;

    let mut journal = sqlx::query_as::<_, Journal>(
        "SELECT id, title, type, user_id, created_at, updated_at FROM journals WHERE id = ?",
    )
    .bind(journal_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(StoreError::NotFound("journal"))?;

    let created = now();
    let entry = Entry {
        id: new_id(),
        title: title.to_string(),
        content: content.to_string(),
        journal_id: journal.id.clone(),
        created_at: created,
        updated_at: created,
    };

    sqlx::query(
        r#"
        INSERT INTO entries (id, title, content, journal_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.title)
    .bind(&entry.content)
    .bind(&entry.journal_id)
    .bind(entry.created_at)
    .bind(entry.updated_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE journals SET updated_at = ? WHERE id = ?")
        .bind(created)
        .bind(&journal.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    journal.updated_at = created;
    Ok(JournalEntry { journal, entry })
}

pub async fn journals_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<Journal>, StoreError> {
    if get_user(pool, user_id).await?.is_none() {
        return Err(StoreError::NotFound("user"));
    }

    let journals = sqlx::query_as::<_, Journal>(
        r#"
        SELECT id, title, type, user_id, created_at, updated_at
        FROM journals
        WHERE user_id = ?
        ORDER BY rowid
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(journals)
}

pub async fn journal(pool: &SqlitePool, journal_id: &str) -> Result<Journal, StoreError> {
    get_journal(pool, journal_id)
        .await?
        .ok_or(StoreError::NotFound("journal"))
}

pub async fn entries(pool: &SqlitePool, journal_id: &str) -> Result<JournalEntries, StoreError> {
    let journal = journal(pool, journal_id).await?;

    let entries = sqlx::query_as::<_, Entry>(
        r#"
        SELECT id, title, content, journal_id, created_at, updated_at
        FROM entries
        WHERE journal_id = ?
        ORDER BY rowid
        "#,
    )
    .bind(&journal.id)
    .fetch_all(pool)
    .await?;

    Ok(JournalEntries {
        entries,
        journal_title: journal.title,
    })
}

pub async fn entry(
    pool: &SqlitePool,
    journal_id: &str,
    entry_id: &str,
) -> Result<EntryLookup, StoreError> {
    if get_journal(pool, journal_id).await?.is_none() {
        return Ok(EntryLookup::JournalMissing);
    }

    let entry = sqlx::query_as::<_, Entry>(
        r#"
        SELECT id, title, content, journal_id, created_at, updated_at
        FROM entries
        WHERE id = ? AND journal_id = ?
        "#,
    )
    .bind(entry_id)
    .bind(journal_id)
    .fetch_optional(pool)
    .await?;

    Ok(entry.map_or(EntryLookup::EntryMissing, EntryLookup::Found))
}

pub async fn update_journal(
    pool: &SqlitePool,
    journal_id: &str,
    patch: &JournalPatch,
) -> Result<Journal, StoreError> {
    let updated = sqlx::query_as::<_, Journal>(
        r#"
        UPDATE journals
        SET title = COALESCE(?, title),
            type = COALESCE(?, type),
            updated_at = ?
        WHERE id = ?
        RETURNING id, title, type, user_id, created_at, updated_at
        "#,
    )
    .bind(patch.title.as_deref())
    .bind(patch.kind)
    .bind(now())
    .bind(journal_id)
    .fetch_optional(pool)
    .await?;

    updated.ok_or(StoreError::NotFound("journal"))
}

pub async fn update_entry(
    pool: &SqlitePool,
    entry_id: &str,
    patch: &EntryPatch,
) -> Result<Entry, StoreError> {
    let updated = sqlx::query_as::<_, Entry>(
        r#"
        UPDATE entries
        SET title = COALESCE(?, title),
            content = COALESCE(?, content),
            updated_at = ?
        WHERE id = ?
        RETURNING id, title, content, journal_id, created_at, updated_at
        "#,
    )
    .bind(patch.title.as_deref())
    .bind(patch.content.as_deref())
    .bind(now())
    .bind(entry_id)
    .fetch_optional(pool)
    .await?;

    updated.ok_or(StoreError::NotFound("entry"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn store_with_user(username: &str) -> (SqlitePool, User) {
        let pool = connect("sqlite::memory:").await.unwrap();
        let user = create_user(&pool, username, "hash", None).await.unwrap();
        (pool, user)
    }

    #[tokio::test]
    async fn test_create_journal_defaults() {
        let (pool, alice) = store_with_user("alice").await;

        let created = create_journal(&pool, &alice.id, "My Diary").await.unwrap();

        assert_eq!(created.user, alice);
        assert_eq!(created.journal.title, "My Diary");
        assert_eq!(created.journal.kind, JournalType::Public);
        assert_eq!(created.journal.user_id, alice.id);
        assert_eq!(created.journal.created_at, created.journal.updated_at);
    }

    #[tokio::test]
    async fn test_create_journal_unknown_user() {
        let (pool, _) = store_with_user("alice").await;

        let err = create_journal(&pool, "nobody", "My Diary").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound("user")));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let (pool, _) = store_with_user("alice").await;

        let err = create_user(&pool, "alice", "other", None).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_find_user_by_username_returns_hash() {
        let (pool, alice) = store_with_user("alice").await;

        let (found, hash) = find_user_by_username(&pool, "alice").await.unwrap().unwrap();
        assert_eq!(found, alice);
        assert_eq!(hash, "hash");
        assert!(find_user_by_username(&pool, "bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_entry_advances_journal() {
        let (pool, alice) = store_with_user("alice").await;
        let journal = create_journal(&pool, &alice.id, "My Diary").await.unwrap().journal;
        tokio::time::sleep(Duration::from_millis(5)).await;

        let added = add_entry(&pool, &journal.id, "Day 1", "content").await.unwrap();

        assert_eq!(added.journal.updated_at, added.entry.created_at);
        assert_ne!(added.journal.updated_at, journal.updated_at);
        assert_eq!(added.entry.journal_id, journal.id);

        let stored = super::journal(&pool, &journal.id).await.unwrap();
        assert_eq!(stored.updated_at, added.entry.created_at);

        let listed = entries(&pool, &journal.id).await.unwrap();
        assert_eq!(listed.entries, vec![added.entry]);
        assert_eq!(listed.journal_title, "My Diary");
    }

    #[tokio::test]
    async fn test_add_entry_unknown_journal() {
        let (pool, _) = store_with_user("alice").await;

        let err = add_entry(&pool, "missing", "Day 1", "content").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound("journal")));
    }

    #[tokio::test]
    async fn test_journals_for_user() {
        let (pool, alice) = store_with_user("alice").await;
        let bob = create_user(&pool, "bob", "hash", None).await.unwrap();
        let first = create_journal(&pool, &alice.id, "One").await.unwrap().journal;
        let second = create_journal(&pool, &alice.id, "Two").await.unwrap().journal;
        create_journal(&pool, &bob.id, "Bob's").await.unwrap();

        let journals = journals_for_user(&pool, &alice.id).await.unwrap();
        assert_eq!(journals, vec![first, second]);

        let err = journals_for_user(&pool, "nobody").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound("user")));
    }

    #[tokio::test]
    async fn test_entry_lookup() {
        let (pool, alice) = store_with_user("alice").await;
        let journal = create_journal(&pool, &alice.id, "My Diary").await.unwrap().journal;
        let other = create_journal(&pool, &alice.id, "Other").await.unwrap().journal;
        let entry = add_entry(&pool, &journal.id, "Day 1", "content").await.unwrap().entry;

        assert_eq!(
            super::entry(&pool, "missing", &entry.id).await.unwrap(),
            EntryLookup::JournalMissing
        );
        assert_eq!(
            super::entry(&pool, &other.id, &entry.id).await.unwrap(),
            EntryLookup::EntryMissing
        );
        assert_eq!(
            super::entry(&pool, &journal.id, &entry.id).await.unwrap(),
            EntryLookup::Found(entry)
        );
    }

    #[tokio::test]
    async fn test_update_journal_merges_and_keeps_id() {
        let (pool, alice) = store_with_user("alice").await;
        let journal = create_journal(&pool, &alice.id, "My Diary").await.unwrap().journal;
        tokio::time::sleep(Duration::from_millis(5)).await;

        let patch = JournalPatch {
            title: None,
            kind: Some(JournalType::Private),
        };
        let updated = update_journal(&pool, &journal.id, &patch).await.unwrap();

        assert_eq!(updated.id, journal.id);
        assert_eq!(updated.title, "My Diary");
        assert_eq!(updated.kind, JournalType::Private);
        assert_eq!(updated.created_at, journal.created_at);
        assert!(updated.updated_at > journal.updated_at);

        let err = update_journal(&pool, "missing", &patch).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound("journal")));
    }

    #[tokio::test]
    async fn test_update_entry_merges_and_keeps_id() {
        let (pool, alice) = store_with_user("alice").await;
        let journal = create_journal(&pool, &alice.id, "My Diary").await.unwrap().journal;
        let entry = add_entry(&pool, &journal.id, "Day 1", "content").await.unwrap().entry;
        tokio::time::sleep(Duration::from_millis(5)).await;

        let patch = EntryPatch {
            title: None,
            content: Some("rewritten".to_string()),
        };
        let updated = update_entry(&pool, &entry.id, &patch).await.unwrap();

        assert_eq!(updated.id, entry.id);
        assert_eq!(updated.journal_id, journal.id);
        assert_eq!(updated.title, "Day 1");
        assert_eq!(updated.content, "rewritten");
        assert!(updated.updated_at > entry.updated_at);

        let err = update_entry(&pool, "missing", &patch).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound("entry")));
    }
}
