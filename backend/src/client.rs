//! Typed client for the journal API.
//!
//! Every call is made relative to one base URL. Error responses are decoded
//! from the server's `{"message": ...}` body into [`ClientError::Api`].

use reqwest::{Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use thiserror::Error;

use crate::api::auth::AuthResponse;
use crate::api::error::ErrorBody;
use crate::db::models::{Entry, Journal, JournalEntries, JournalEntry, JournalType, UserJournal};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Api { status: StatusCode, message: String },
}

/// Result of fetching one entry, mirroring the three shapes the server answers with.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedEntry {
    JournalMissing,
    EntryMissing,
    Found(Entry),
}

#[derive(Debug, Clone)]
pub struct JournalClient {
    http: reqwest::Client,
    base_url: String,
}

impl JournalClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> Result<T, ClientError> {
        let mut request = self.http.request(method, format!("{}{path}", self.base_url));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };
        tracing::debug!(%status, %message, path, "api call failed");
        Err(ClientError::Api { status, message })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(Method::GET, path, None::<&Value>).await
    }

    pub async fn signup(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<AuthResponse, ClientError> {
        let body = json!({ "username": username, "password": password, "email": email });
        self.send(Method::POST, "/auth/signup", Some(&body)).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = json!({ "username": username, "password": password });
        self.send(Method::POST, "/auth/login", Some(&body)).await
    }

    pub async fn create_journal(
        &self,
        user_id: &str,
        title: &str,
    ) -> Result<UserJournal, ClientError> {
        let body = json!({ "title": title, "userId": user_id });
        self.send(Method::POST, "/journal", Some(&body)).await
    }

    pub async fn add_entry(
        &self,
        journal_id: &str,
        title: &str,
        content: &str,
    ) -> Result<JournalEntry, ClientError> {
        let body = json!({ "title": title, "content": content });
        self.send(Method::POST, &format!("/journal/{journal_id}/entry"), Some(&body))
            .await
    }

    pub async fn journals_for_user(&self, user_id: &str) -> Result<Vec<Journal>, ClientError> {
        self.get(&format!("/journal/user/{user_id}")).await
    }

    pub async fn journal(&self, journal_id: &str) -> Result<Journal, ClientError> {
        self.get(&format!("/journal/{journal_id}")).await
    }

    pub async fn entries(&self, journal_id: &str) -> Result<JournalEntries, ClientError> {
        self.get(&format!("/journal/{journal_id}/entries")).await
    }

    pub async fn entry(
        &self,
        journal_id: &str,
        entry_id: &str,
    ) -> Result<FetchedEntry, ClientError> {
        let body: Value = self
            .get(&format!("/journal/{journal_id}/entry/{entry_id}"))
            .await?;

        Ok(match body.get("entrie") {
            None => FetchedEntry::EntryMissing,
            Some(Value::Null) => FetchedEntry::JournalMissing,
            Some(entry) => FetchedEntry::Found(
                serde_json::from_value(entry.clone()).map_err(|err| ClientError::Api {
                    status: StatusCode::OK,
                    message: format!("malformed entry: {err}"),
                })?,
            ),
        })
    }

    pub async fn update_journal(
        &self,
        journal_id: &str,
        title: Option<&str>,
        kind: Option<JournalType>,
    ) -> Result<Journal, ClientError> {
        let mut body = serde_json::Map::new();
        if let Some(title) = title {
            body.insert("title".to_string(), json!(title));
        }
        if let Some(kind) = kind {
            body.insert("type".to_string(), json!(kind));
        }
        self.send(Method::PATCH, &format!("/journal/{journal_id}"), Some(&body))
            .await
    }

    pub async fn update_entry(
        &self,
        entry_id: &str,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Entry, ClientError> {
        let mut body = serde_json::Map::new();
        if let Some(title) = title {
            body.insert("title".to_string(), json!(title));
        }
        if let Some(content) = content {
            body.insert("content".to_string(), json!(content));
        }
        self.send(Method::PATCH, &format!("/entry/{entry_id}"), Some(&body))
            .await
    }
}
