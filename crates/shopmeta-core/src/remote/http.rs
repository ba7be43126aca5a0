//! HTTP client for a Medusa-style admin REST API.

use async_trait::async_trait;
use reqwest::{header, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{EntityApi, EntityPage, ListQuery};
use crate::config::ClientConfig;
use crate::models::{Entity, EntityId, EntityKind, EntityVersion, Metadata};
use crate::util::compact_text;
use crate::{Error, Result};

/// Admin API client authenticated with a bearer token.
#[derive(Clone)]
pub struct HttpEntityApi {
    base_url: String,
    api_token: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpEntityApi {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpEntityApi")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl HttpEntityApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            base_url: config.base_url().to_string(),
            api_token: config.api_token().map(str::to_string),
            client,
        })
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn entity_url(&self, kind: EntityKind, id: &EntityId) -> String {
        format!("{}/admin/{}/{}", self.base_url, kind.plural(), id.as_str())
    }

    fn retrieve_request(&self, kind: EntityKind, id: &EntityId) -> RequestBuilder {
        self.authorized(self.client.get(self.entity_url(kind, id)))
    }

    /// Metadata write; `If-Match` carries the version the write was based on.
    fn update_request(
        &self,
        kind: EntityKind,
        id: &EntityId,
        metadata: &Metadata,
        expected: Option<&EntityVersion>,
    ) -> RequestBuilder {
        let request = self
            .authorized(self.client.post(self.entity_url(kind, id)))
            .json(&serde_json::json!({ "metadata": metadata }));
        match expected {
            Some(version) => request.header(header::IF_MATCH, format!("\"{version}\"")),
            None => request,
        }
    }

    fn list_request(&self, kind: EntityKind, query: &ListQuery) -> RequestBuilder {
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        if let Some(term) = &query.q {
            params.push(("q", term.clone()));
        }
        self.authorized(
            self.client
                .get(format!("{}/admin/{}", self.base_url, kind.plural()))
                .query(&params),
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(header::ACCEPT, "application/json");
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl EntityApi for HttpEntityApi {
    async fn retrieve(&self, kind: EntityKind, id: &EntityId) -> Result<Entity> {
        let response = self.retrieve_request(kind, id).send().await?;
        let body = read_success(response, kind, id).await?;
        parse_single_entity(&body, kind).ok_or_else(|| {
            Error::Api(format!(
                "response for {kind} {id} did not include a '{}' object",
                kind.singular()
            ))
        })
    }

    async fn update_metadata(
        &self,
        kind: EntityKind,
        id: &EntityId,
        metadata: Metadata,
        expected: Option<&EntityVersion>,
    ) -> Result<Entity> {
        let response = self
            .update_request(kind, id, &metadata, expected)
            .send()
            .await?;
        let body = read_success(response, kind, id).await?;
        parse_single_entity(&body, kind).ok_or_else(|| Error::MissingEntity {
            kind,
            id: id.clone(),
        })
    }

    async fn list(&self, kind: EntityKind, query: &ListQuery) -> Result<EntityPage> {
        let response = self.list_request(kind, query).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(parse_api_error(status, &body)));
        }

        let body = response.json::<Value>().await?;
        parse_entity_page(&body, kind)
    }
}

async fn read_success(response: Response, kind: EntityKind, id: &EntityId) -> Result<Value> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<Value>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body, kind, id))
}

/// Error for a failed single-entity request.
fn status_error(status: StatusCode, body: &str, kind: EntityKind, id: &EntityId) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound {
            kind,
            id: id.clone(),
        },
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => Error::Conflict {
            kind,
            id: id.clone(),
            reason: parse_api_error(status, body),
        },
        _ => Error::Api(parse_api_error(status, body)),
    }
}

#[derive(Debug, Deserialize)]
struct RemoteEntity {
    id: String,
    #[serde(default)]
    metadata: Option<Metadata>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    handle: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl RemoteEntity {
    fn into_entity(self, kind: EntityKind) -> Option<Entity> {
        let id = EntityId::new(self.id).ok()?;
        Some(Entity {
            kind,
            id,
            metadata: self.metadata.unwrap_or_default(),
            version: self.updated_at.map(EntityVersion::new),
            title: self.title,
            handle: self.handle,
            email: self.email,
        })
    }
}

fn parse_single_entity(body: &Value, kind: EntityKind) -> Option<Entity> {
    let raw = body.get(kind.singular())?;
    if raw.is_null() {
        return None;
    }
    RemoteEntity::deserialize(raw).ok()?.into_entity(kind)
}

fn parse_entity_page(body: &Value, kind: EntityKind) -> Result<EntityPage> {
    let raw_items = body
        .get(kind.plural())
        .and_then(Value::as_array)
        .ok_or_else(|| {
            Error::Api(format!(
                "list response did not include a '{}' array",
                kind.plural()
            ))
        })?;

    let items = raw_items
        .iter()
        .map(|raw| {
            RemoteEntity::deserialize(raw)
                .map_err(Error::from)
                .and_then(|remote| {
                    remote.into_entity(kind).ok_or_else(|| {
                        Error::Api(format!("list response contained a {kind} without id"))
                    })
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let count = body
        .get("count")
        .and_then(Value::as_u64)
        .and_then(|count| usize::try_from(count).ok())
        .unwrap_or(items.len());

    Ok(EntityPage { items, count })
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error).or(payload.kind) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
