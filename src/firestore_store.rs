//! Firestore-backed remote store
//!
//! Appends documents through the Firestore REST API using a blocking
//! `reqwest` client. Each append is one `POST` to the collection URL, which
//! lets Firestore assign the document id.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Map, Value};

use crate::errors::RemoteStoreError;
use crate::log_record::Document;
use crate::remote_store::RemoteStore;

pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";

/// Token the Firestore emulator accepts in place of real credentials
const EMULATOR_TOKEN: &str = "owner";

pub struct FirestoreStore {
    client: Client,
    base_url: String,
    project_id: String,
    bearer_token: String,
}

impl fmt::Debug for FirestoreStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirestoreStore")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl FirestoreStore {
    /// Store targeting the production Firestore endpoint
    pub fn new(
        project_id: &str,
        access_token: &str,
        timeout: Duration,
    ) -> Result<Self, RemoteStoreError> {
        Self::with_base_url(FIRESTORE_BASE_URL, project_id, access_token, timeout)
    }

    /// Store targeting a Firestore emulator at `host` (e.g. `localhost:8080`)
    pub fn with_emulator(
        host: &str,
        project_id: &str,
        timeout: Duration,
    ) -> Result<Self, RemoteStoreError> {
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{host}")
        };
        Self::with_base_url(&base_url, project_id, EMULATOR_TOKEN, timeout)
    }

    pub fn with_base_url(
        base_url: &str,
        project_id: &str,
        access_token: &str,
        timeout: Duration,
    ) -> Result<Self, RemoteStoreError> {
        if project_id.trim().is_empty() {
            return Err(RemoteStoreError::rejected("project id must not be empty"));
        }
        if access_token.trim().is_empty() {
            return Err(RemoteStoreError::rejected("access token must not be empty"));
        }

        let mut builder = Client::builder().timeout(timeout);
        // plain-http endpoints are local emulators
        if base_url.starts_with("http://") {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            bearer_token: access_token.to_string(),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}",
            self.base_url, self.project_id, collection
        )
    }
}

impl RemoteStore for FirestoreStore {
    fn append(&self, collection: &str, document: &Document) -> Result<(), RemoteStoreError> {
        let body = json!({ "fields": encode_fields(document) });

        let res = self
            .client
            .post(self.collection_url(collection))
            .bearer_auth(&self.bearer_token)
            .json(&body)
            .send()?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().unwrap_or_default();
            return Err(RemoteStoreError::status(status.as_u16(), text));
        }

        tracing::debug!("Appended document to Firestore collection {}", collection);
        Ok(())
    }
}

/// Encode a flat document as Firestore typed fields
pub fn encode_fields(document: &Document) -> Value {
    let fields: Map<String, Value> = document
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect();
    Value::Object(fields)
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}
