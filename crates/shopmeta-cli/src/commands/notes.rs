use chrono::Utc;
use shopmeta_core::models::{EntityId, NoteKey};
use shopmeta_core::remote::HttpEntityApi;
use shopmeta_core::widgets::NotesWidget;

use crate::cli::NotesCommands;
use crate::commands::common::{
    format_note_lines, note_to_list_item, open_session, resolve_customer, resolve_text,
    retry_on_conflict, NoteListItem, Session,
};
use crate::error::CliError;

pub async fn run_notes(
    command: NotesCommands,
    global_profile: Option<&str>,
    api_url: Option<&str>,
) -> Result<(), CliError> {
    let session = open_session(global_profile, api_url)?;
    match command {
        NotesCommands::List { target, json } => {
            run_list(&session, &resolve_customer(&target)?, json).await
        }
        NotesCommands::Add {
            target,
            author,
            content,
        } => {
            let content = resolve_text(&content)?;
            let author = author.or_else(|| session.profile.author());
            run_add(&session, &resolve_customer(&target)?, &content, author).await
        }
        NotesCommands::Edit {
            target,
            id,
            content,
        } => {
            let key = parse_note_key(&id)?;
            let content = resolve_text(&content)?;
            run_edit(&session, &resolve_customer(&target)?, key, &content).await
        }
        NotesCommands::Delete { target, id } => {
            let key = parse_note_key(&id)?;
            run_delete(&session, &resolve_customer(&target)?, key).await
        }
    }
}

async fn mount(
    session: &Session,
    customer_id: &EntityId,
) -> Result<NotesWidget<HttpEntityApi>, CliError> {
    let widget = NotesWidget::mount(session.api.clone(), customer_id).await?;
    if let Some(problem) = widget.recovered() {
        eprintln!(
            "Warning: stored notes for {} were unreadable ({problem}); they will be backed up on the next change",
            widget.customer().display_name()
        );
    }
    Ok(widget)
}

async fn run_list(session: &Session, customer_id: &EntityId, as_json: bool) -> Result<(), CliError> {
    let widget = mount(session, customer_id).await?;
    let notes = widget.notes().await;

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if notes.is_empty() {
        println!("No notes for {}", widget.customer().display_name());
    } else {
        for line in format_note_lines(&notes, Utc::now().timestamp_millis()) {
            println!("{line}");
        }
    }

    Ok(())
}

async fn run_add(
    session: &Session,
    customer_id: &EntityId,
    content: &str,
    author: Option<String>,
) -> Result<(), CliError> {
    let note = retry_on_conflict(|| {
        let author = author.clone();
        async move {
            let widget = NotesWidget::mount(session.api.clone(), customer_id).await?;
            widget.add(content, author).await
        }
    })
    .await?;
    println!("Added note {}", note.id);
    Ok(())
}

async fn run_edit(
    session: &Session,
    customer_id: &EntityId,
    key: NoteKey,
    content: &str,
) -> Result<(), CliError> {
    let note = retry_on_conflict(|| async move {
        let widget = NotesWidget::mount(session.api.clone(), customer_id).await?;
        widget.edit(key, content).await
    })
    .await?;
    println!("Updated note {}", note.id);
    Ok(())
}

async fn run_delete(session: &Session, customer_id: &EntityId, key: NoteKey) -> Result<(), CliError> {
    let note = retry_on_conflict(|| async move {
        let widget = NotesWidget::mount(session.api.clone(), customer_id).await?;
        widget.delete(key).await
    })
    .await?;
    println!("Deleted note {}", note.id);
    Ok(())
}

pub fn parse_note_key(raw: &str) -> Result<NoteKey, CliError> {
    raw.trim().parse::<NoteKey>().map_err(|_| CliError::InvalidId {
        kind: "note",
        value: raw.to_string(),
    })
}
