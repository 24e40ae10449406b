use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, OrApiError};
use crate::api::server::AppState;
use crate::db::models::{
    Entry, EntryLookup, EntryPatch, Journal, JournalEntries, JournalEntry, JournalPatch,
    UserJournal,
};
use crate::db::repo::{self, StoreError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJournalPayload {
    pub title: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddEntryPayload {
    pub title: String,
    pub content: String,
}

/// Body of the single-entry lookup.
///
/// `None` leaves the field out entirely, `Some(None)` renders it as `null`.
#[derive(Debug, Serialize)]
pub struct EntryBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrie: Option<Option<Entry>>,
}

impl From<EntryLookup> for EntryBody {
    fn from(lookup: EntryLookup) -> Self {
        let entrie = match lookup {
            EntryLookup::JournalMissing => Some(None),
            EntryLookup::EntryMissing => None,
            EntryLookup::Found(entry) => Some(Some(entry)),
        };
        Self { entrie }
    }
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateJournalPayload>, JsonRejection>,
) -> Result<Json<UserJournal>, ApiError> {
    const FAILED: &str = "Failed to create Journal.";
    const NO_USER: &str = "No such user exists.";

    let Json(payload) = payload.or_api_error(FAILED)?;
    let Some(user_id) = payload.user_id else {
        return Err(ApiError::NotFound(NO_USER.to_string()));
    };

    let created = match repo::create_journal(&state.db, &user_id, &payload.title).await {
        Err(StoreError::NotFound(_)) => return Err(ApiError::NotFound(NO_USER.to_string())),
        other => other.or_api_error(FAILED)?,
    };

    tracing::info!(
        journal_id = %created.journal.id,
        user_id = %created.user.id,
        "journal created"
    );
    Ok(Json(created))
}

pub async fn add_entry(
    State(state): State<Arc<AppState>>,
    Path(journal_id): Path<String>,
    payload: Result<Json<AddEntryPayload>, JsonRejection>,
) -> Result<Json<JournalEntry>, ApiError> {
    const FAILED: &str = "Failed to save entry.";

    let Json(payload) = payload.or_api_error(FAILED)?;
    let added = repo::add_entry(&state.db, &journal_id, &payload.title, &payload.content)
        .await
        .or_api_error(FAILED)?;

    tracing::info!(journal_id = %added.journal.id, entry_id = %added.entry.id, "entry added");
    Ok(Json(added))
}

pub async fn journals_for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Journal>>, ApiError> {
    let journals = repo::journals_for_user(&state.db, &user_id)
        .await
        .or_api_error("Could not get user journals.")?;
    Ok(Json(journals))
}

pub async fn journal(
    State(state): State<Arc<AppState>>,
    Path(journal_id): Path<String>,
) -> Result<Json<Journal>, ApiError> {
    let journal = repo::journal(&state.db, &journal_id)
        .await
        .or_api_error("Journal not found.")?;
    Ok(Json(journal))
}

pub async fn entries(
    State(state): State<Arc<AppState>>,
    Path(journal_id): Path<String>,
) -> Result<Json<JournalEntries>, ApiError> {
    let entries = repo::entries(&state.db, &journal_id)
        .await
        .or_api_error("Failed to get Journal entries.")?;
    Ok(Json(entries))
}

pub async fn entry(
    State(state): State<Arc<AppState>>,
    Path((journal_id, entry_id)): Path<(String, String)>,
) -> Result<Json<EntryBody>, ApiError> {
    let lookup = repo::entry(&state.db, &journal_id, &entry_id)
        .await
        .or_api_error("Failed to get entrie.")?;
    Ok(Json(lookup.into()))
}

pub async fn update_journal(
    State(state): State<Arc<AppState>>,
    Path(journal_id): Path<String>,
    patch: Result<Json<JournalPatch>, JsonRejection>,
) -> Result<Json<Journal>, ApiError> {
    const FAILED: &str = "Failed to update Journal.";

    let Json(patch) = patch.or_api_error(FAILED)?;
    let journal = repo::update_journal(&state.db, &journal_id, &patch)
        .await
        .or_api_error(FAILED)?;

    tracing::debug!(journal_id = %journal.id, "journal updated");
    Ok(Json(journal))
}

pub async fn update_entry(
    State(state): State<Arc<AppState>>,
    Path(entry_id): Path<String>,
    patch: Result<Json<EntryPatch>, JsonRejection>,
) -> Result<Json<Entry>, ApiError> {
    const FAILED: &str = "Failed to update entry.";

    let Json(patch) = patch.or_api_error(FAILED)?;
    let entry = repo::update_entry(&state.db, &entry_id, &patch)
        .await
        .or_api_error(FAILED)?;

    tracing::debug!(entry_id = %entry.id, "entry updated");
    Ok(Json(entry))
}
