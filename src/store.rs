use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::auth::IdentityProvider;
use crate::config::ClientConfig;

/// Entity collections kept by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    UserProfile,
    WeightLog,
    MealLog,
    WorkoutLog,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::UserProfile => "UserProfile",
            Collection::WeightLog => "WeightLog",
            Collection::MealLog => "MealLog",
            Collection::WorkoutLog => "WorkoutLog",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equality filter plus optional ordering and page size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Map<String, Value>,
    /// Field to sort by; a leading `-` sorts descending
    pub sort: Option<String>,
    pub limit: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filter.insert(field.to_string(), value.into());
        self
    }

    pub fn sort(mut self, field: &str) -> Self {
        self.sort = Some(field.to_string());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, record: &Value) -> bool {
        self.filter
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }
}

/// The backend's record store. Records are JSON objects carrying an `id`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(&self, collection: Collection, query: &Query) -> Result<Vec<Value>>;

    /// Store a new record and return it with its assigned `id`.
    async fn create(&self, collection: Collection, record: Value) -> Result<Value>;

    /// Overwrite the given fields of an existing record.
    async fn update(&self, collection: Collection, id: &str, fields: Value) -> Result<Value>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<()>;
}

/// REST client for the hosted entities API.
#[derive(Clone)]
pub struct HttpRecordStore {
    client: Client,
    entities_url: String,
    identity: Arc<dyn IdentityProvider>,
}

impl HttpRecordStore {
    pub fn new(config: &ClientConfig, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            client: Client::new(),
            entities_url: config.entities_url(),
            identity,
        }
    }

    fn url(&self, collection: Collection, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("{}/{}/{}", self.entities_url, collection, id),
            None => format!("{}/{}", self.entities_url, collection),
        }
    }

    async fn authorize(&self, req: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        Ok(match self.identity.bearer_token().await? {
            Some(token) => req.bearer_auth(token),
            None => req,
        })
    }

    async fn send(
        &self,
        method: &str,
        path: String,
        req: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        let resp = self.authorize(req).await?.send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("{} {} failed: {} - {}", method, path, status, body));
        }
        Ok(resp)
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn list(&self, collection: Collection, query: &Query) -> Result<Vec<Value>> {
        let url = self.url(collection, None);
        debug!(%collection, filter = ?query.filter, "listing records");

        let mut req = self.client.get(&url);
        if !query.filter.is_empty() {
            req = req.query(&[("q", Value::Object(query.filter.clone()).to_string())]);
        }
        if let Some(ref sort) = query.sort {
            req = req.query(&[("sort", sort)]);
        }
        if let Some(limit) = query.limit {
            req = req.query(&[("limit", limit.to_string())]);
        }

        let resp = self.send("LIST", collection.to_string(), req).await?;
        Ok(resp.json().await?)
    }

    async fn create(&self, collection: Collection, record: Value) -> Result<Value> {
        let url = self.url(collection, None);
        let req = self.client.post(&url).json(&record);
        let resp = self.send("POST", collection.to_string(), req).await?;
        Ok(resp.json().await?)
    }

    async fn update(&self, collection: Collection, id: &str, fields: Value) -> Result<Value> {
        let url = self.url(collection, Some(id));
        let req = self.client.put(&url).json(&fields);
        let resp = self
            .send("PUT", format!("{}/{}", collection, id), req)
            .await?;
        Ok(resp.json().await?)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        let url = self.url(collection, Some(id));
        let req = self.client.delete(&url);
        self.send("DELETE", format!("{}/{}", collection, id), req)
            .await?;
        Ok(())
    }
}

/// Process-local store with the same query semantics as the backend.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<Collection, Vec<Value>>>>,
    next_id: Arc<Mutex<u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, collection: Collection, query: &Query) -> Result<Vec<Value>> {
        let records = self.records.lock().await;
        let mut found: Vec<Value> = records
            .get(&collection)
            .map(|rs| rs.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();

        if let Some(ref sort) = query.sort {
            let (field, descending) = match sort.strip_prefix('-') {
                Some(field) => (field, true),
                None => (sort.as_str(), false),
            };
            found.sort_by(|a, b| {
                let ord = compare_fields(a.get(field), b.get(field));
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }
        if let Some(limit) = query.limit {
            found.truncate(limit as usize);
        }
        Ok(found)
    }

    async fn create(&self, collection: Collection, record: Value) -> Result<Value> {
        let Value::Object(mut fields) = record else {
            return Err(anyhow!("{} record must be a JSON object", collection));
        };

        let id = {
            let mut next_id = self.next_id.lock().await;
            *next_id += 1;
            next_id.to_string()
        };
        fields.insert("id".to_string(), Value::String(id));
        let record = Value::Object(fields);

        self.records
            .lock()
            .await
            .entry(collection)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(&self, collection: Collection, id: &str, fields: Value) -> Result<Value> {
        let Value::Object(fields) = fields else {
            return Err(anyhow!("{} update must be a JSON object", collection));
        };

        let mut records = self.records.lock().await;
        let record = records
            .get_mut(&collection)
            .and_then(|rs| rs.iter_mut().find(|r| r["id"] == id))
            .ok_or_else(|| anyhow!("PUT {}/{} failed: 404 Not Found", collection, id))?;

        if let Some(existing) = record.as_object_mut() {
            for (k, v) in fields {
                if k != "id" {
                    existing.insert(k, v);
                }
            }
        }
        Ok(record.clone())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        let mut records = self.records.lock().await;
        let rs = records.entry(collection).or_default();
        let before = rs.len();
        rs.retain(|r| r["id"] != id);
        if rs.len() == before {
            return Err(anyhow!("DELETE {}/{} failed: 404 Not Found", collection, id));
        }
        Ok(())
    }
}

/// Order JSON scalars the way the backend sorts: strings lexically (ISO
/// dates sort chronologically), numbers numerically, missing values first.
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
