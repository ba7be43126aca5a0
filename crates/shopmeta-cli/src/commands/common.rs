use std::env;
use std::future::Future;
use std::io::{self, IsTerminal, Read};

use chrono::Utc;
use serde::Serialize;
use shopmeta_core::config::{ClientConfig, ENV_API_TOKEN, ENV_API_URL};
use shopmeta_core::models::{EntityId, EntityKind, Note, Quicklink};
use shopmeta_core::navigation::entity_id_for_kind;
use shopmeta_core::remote::HttpEntityApi;
use shopmeta_core::widgets::WidgetError;

use crate::auth::TokenStore;
use crate::cli::{CustomerTarget, ProductTarget};
use crate::config_profiles::{normalize_text_option, CliProfile, CliProfilesConfig};
use crate::error::CliError;

/// Extra attempts after a write loses an optimistic-concurrency race.
pub const CONFLICT_RETRIES: usize = 1;

/// Resolved API client plus the profile it came from.
pub struct Session {
    pub api: HttpEntityApi,
    pub profile: CliProfile,
}

pub fn open_session(
    global_profile: Option<&str>,
    api_url: Option<&str>,
) -> Result<Session, CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let profile = config.profile(&profile_name).cloned().unwrap_or_default();

    let base_url = resolve_api_base_url(
        api_url.map(str::to_string),
        env::var(ENV_API_URL).ok(),
        profile.api_base_url(),
    )
    .ok_or(CliError::ApiNotConfigured)?;

    let token = match normalize_text_option(env::var(ENV_API_TOKEN).ok()) {
        Some(token) => Some(token),
        None => TokenStore::new(&profile_name).load()?,
    };
    if token.is_none() {
        tracing::warn!(
            "No admin API token for profile '{}'; requests are sent unauthenticated",
            profile_name
        );
    }

    let mut client_config = ClientConfig::new(base_url, token)?;
    if let Some(timeout) = profile.timeout() {
        client_config = client_config.with_timeout(timeout);
    }
    tracing::debug!(?client_config, profile = %profile_name, "Opening admin API session");
    Ok(Session {
        api: HttpEntityApi::new(&client_config)?,
        profile,
    })
}

/// First configured base URL: flag, then environment, then profile.
pub fn resolve_api_base_url(
    explicit: Option<String>,
    from_env: Option<String>,
    from_profile: Option<String>,
) -> Option<String> {
    normalize_text_option(explicit)
        .or_else(|| normalize_text_option(from_env))
        .or_else(|| normalize_text_option(from_profile))
}

pub fn resolve_customer(target: &CustomerTarget) -> Result<EntityId, CliError> {
    resolve_target(
        target.customer.as_deref(),
        target.path.as_deref(),
        EntityKind::Customer,
    )
}

pub fn resolve_product(target: &ProductTarget) -> Result<EntityId, CliError> {
    resolve_target(
        target.product.as_deref(),
        target.path.as_deref(),
        EntityKind::Product,
    )
}

pub fn resolve_target(
    id: Option<&str>,
    path: Option<&str>,
    kind: EntityKind,
) -> Result<EntityId, CliError> {
    if let Some(id) = id {
        return parse_entity_id(id, kind.singular());
    }
    let path = path.unwrap_or_default();
    entity_id_for_kind(path, kind).ok_or_else(|| CliError::NoEntityInPath {
        kind: kind.singular(),
        path: path.to_string(),
    })
}

pub fn parse_entity_id(raw: &str, kind: &'static str) -> Result<EntityId, CliError> {
    EntityId::new(raw).map_err(|_| CliError::InvalidId {
        kind,
        value: raw.to_string(),
    })
}

/// Run `attempt` again from a fresh read when it loses a write race.
pub async fn retry_on_conflict<T, F, Fut>(mut attempt: F) -> Result<T, CliError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, WidgetError>>,
{
    let mut remaining = CONFLICT_RETRIES;
    loop {
        match attempt().await {
            Err(error) if error.is_conflict() && remaining > 0 => {
                remaining -= 1;
                tracing::warn!("{error}; reloading and retrying");
            }
            result => return result.map_err(CliError::from),
        }
    }
}

pub fn resolve_text(parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&parts.join(" ")) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub preview: String,
    pub content: String,
    pub author: Option<String>,
    pub created_at: String,
    pub edited_at: Option<String>,
    pub relative_time: String,
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    NoteListItem {
        id: note.id.to_string(),
        preview: note_preview(&note.content, 80),
        content: note.content.clone(),
        author: note.author.clone(),
        created_at: note.created_at.to_rfc3339(),
        edited_at: note.edited_at.map(|edited_at| edited_at.to_rfc3339()),
        relative_time: format_relative_time(note.last_changed().timestamp_millis(), now_ms),
    }
}

pub fn format_note_lines(notes: &[Note], now_ms: i64) -> Vec<String> {
    notes
        .iter()
        .map(|note| {
            let id = note.id.to_string();
            let preview = note_preview(&note.content, 50);
            let relative_time = format_relative_time(note.last_changed().timestamp_millis(), now_ms);
            let edited = if note.edited_at.is_some() {
                " (edited)"
            } else {
                ""
            };
            match &note.author {
                Some(author) => {
                    format!("{id:<13}  {preview:<50}  {relative_time}{edited}  by {author}")
                }
                None => format!("{id:<13}  {preview:<50}  {relative_time}{edited}"),
            }
        })
        .collect()
}

pub fn format_quicklink_lines(links: &[Quicklink]) -> Vec<String> {
    links
        .iter()
        .map(|link| {
            format!(
                "{}  {:<10}  {:<30}  {}",
                link.id,
                link.kind.to_string(),
                note_preview(&link.title, 30),
                link.link
            )
        })
        .collect()
}

pub fn note_preview(content: &str, max_chars: usize) -> String {
    let first_line = content.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}
