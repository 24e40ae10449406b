use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Visibility of a journal. New journals are always `Public`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum JournalType {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: JournalType,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub journal_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a journal that a partial update may touch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JournalPatch {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<JournalType>,
}

/// Fields of an entry that a partial update may touch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryPatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserJournal {
    pub user: User,
    pub journal: Journal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub journal: Journal,
    pub entry: Entry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntries {
    pub entries: Vec<Entry>,
    pub journal_title: String,
}

/// Outcome of looking up one entry inside one journal.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryLookup {
    JournalMissing,
    EntryMissing,
    Found(Entry),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_pairs_decode_from_wire_shape() {
        let journal = json!({
            "id": "j1",
            "title": "My Diary",
            "type": "public",
            "userId": "u1",
            "createdAt": "2026-10-18T10:00:00.000Z",
            "updatedAt": "2026-10-18T10:00:00.000Z",
        });
        let entry = json!({
            "id": "e1",
            "title": "Day 1",
            "content": "content",
            "journalId": "j1",
            "createdAt": "2026-10-18T10:00:00.000Z",
            "updatedAt": "2026-10-18T10:00:00.000Z",
        });

        let listed: JournalEntries =
            serde_json::from_value(json!({ "entries": [entry], "journalTitle": "My Diary" }))
                .unwrap();
        assert_eq!(listed.journal_title, "My Diary");
        assert_eq!(listed.entries.len(), 1);

        let added: JournalEntry =
            serde_json::from_value(json!({ "journal": journal, "entry": entry })).unwrap();
        assert_eq!(added.entry.journal_id, added.journal.id);

        let created: UserJournal = serde_json::from_value(json!({
            "user": { "id": "u1", "username": "alice", "createdAt": "2026-10-18T10:00:00.000Z" },
            "journal": journal,
        }))
        .unwrap();
        assert_eq!(created.journal.kind, JournalType::Public);
        assert_eq!(created.user.email, None);
    }
}
