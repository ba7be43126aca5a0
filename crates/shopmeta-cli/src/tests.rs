use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{TimeZone, Utc};
use clap::Parser;
use pretty_assertions::assert_eq;
use shopmeta_core::codec::encode_list;
use shopmeta_core::models::{Entity, EntityId, EntityKind, Note, NoteKey, Quicklink};
use shopmeta_core::remote::{Fault, InMemoryEntityApi};
use shopmeta_core::widgets::{NotesWidget, WidgetError, NOTES_FIELD};

use crate::cli::{Cli, Commands, CompletionShell, NotesCommands, PickerKind};
use crate::commands::common::{
    format_note_lines, format_quicklink_lines, format_relative_time, normalize_content,
    note_preview, resolve_api_base_url, resolve_target, retry_on_conflict,
};
use crate::commands::completions::render_completions;
use crate::commands::config::normalize_api_url;
use crate::commands::notes::parse_note_key;
use crate::commands::password::password_status_label;
use crate::commands::quicklinks::{parse_quicklink_id, picker_entity_kind};
use crate::error::CliError;

fn customer_id() -> EntityId {
    EntityId::new("cus_01").unwrap()
}

fn seeded_api() -> InMemoryEntityApi {
    let api = InMemoryEntityApi::new();
    api.insert(Entity::new(EntityKind::Customer, customer_id()).with_title("Ada Lovelace"));
    api
}

fn note_at(id: i64, content: &str, author: Option<&str>) -> Note {
    Note {
        id: NoteKey::from_millis(id),
        content: content.to_string(),
        created_at: Utc.timestamp_millis_opt(id).unwrap(),
        edited_at: None,
        author: author.map(str::to_string),
    }
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn normalize_content_keeps_multiline_text() {
    assert_eq!(
        normalize_content("line 1\nline 2\n"),
        Some("line 1\nline 2".to_string())
    );
}

#[test]
fn api_base_url_prefers_flag_then_env_then_profile() {
    assert_eq!(
        resolve_api_base_url(
            Some("https://flag.test".to_string()),
            Some("https://env.test".to_string()),
            Some("https://profile.test".to_string()),
        )
        .as_deref(),
        Some("https://flag.test")
    );
    assert_eq!(
        resolve_api_base_url(
            Some("  ".to_string()),
            Some("https://env.test".to_string()),
            Some("https://profile.test".to_string()),
        )
        .as_deref(),
        Some("https://env.test")
    );
    assert_eq!(
        resolve_api_base_url(None, None, Some("https://profile.test".to_string())).as_deref(),
        Some("https://profile.test")
    );
    assert_eq!(resolve_api_base_url(None, None, None), None);
}

#[test]
fn resolve_target_accepts_id_or_admin_path() {
    let by_id = resolve_target(Some("cus_01"), None, EntityKind::Customer).unwrap();
    assert_eq!(by_id, customer_id());

    let by_path = resolve_target(
        None,
        Some("/a/customers/cus_01?tab=notes"),
        EntityKind::Customer,
    )
    .unwrap();
    assert_eq!(by_path, customer_id());
}

#[test]
fn resolve_target_reports_path_without_entity() {
    let error = resolve_target(None, Some("/a/orders/order_1"), EntityKind::Customer).unwrap_err();
    assert!(matches!(
        error,
        CliError::NoEntityInPath { kind: "customer", .. }
    ));
}

#[test]
fn resolve_target_rejects_blank_id() {
    let error = resolve_target(Some("   "), None, EntityKind::Product).unwrap_err();
    assert!(matches!(error, CliError::InvalidId { kind: "product", .. }));
}

#[test]
fn note_and_quicklink_ids_are_validated() {
    assert_eq!(
        parse_note_key(" 1700000000000 ").unwrap(),
        NoteKey::from_millis(1_700_000_000_000)
    );
    assert!(matches!(
        parse_note_key("abc"),
        Err(CliError::InvalidId { kind: "note", .. })
    ));

    let link = Quicklink::custom("Docs", "https://docs.test");
    assert_eq!(parse_quicklink_id(&link.id.to_string()).unwrap(), link.id);
    assert!(matches!(
        parse_quicklink_id("not-a-uuid"),
        Err(CliError::InvalidId {
            kind: "quicklink",
            ..
        })
    ));
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
}

#[test]
fn note_preview_truncates_with_ellipsis() {
    let preview = note_preview("This is a very long sentence that should be shortened", 20);
    assert_eq!(preview, "This is a very lo...");
}

#[test]
fn note_preview_uses_first_line_only() {
    assert_eq!(note_preview("  first   line \nsecond", 40), "first line");
}

#[test]
fn format_note_lines_include_author_and_edit_marker() {
    let created = 1_700_000_000_000;
    let plain = note_at(created, "Called about shipping", None);
    let edited = note_at(created + 1, "Prefers email", Some("sam")).edited(
        "Prefers email, not phone",
        Utc.timestamp_millis_opt(created + 60_000).unwrap(),
    );

    let lines = format_note_lines(&[plain, edited], created + 3 * 60_000);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("1700000000000"));
    assert!(lines[0].contains("Called about shipping"));
    assert!(lines[0].ends_with("3m ago"));
    assert!(lines[1].contains("2m ago (edited)"));
    assert!(lines[1].ends_with("by sam"));
}

#[test]
fn format_quicklink_lines_show_kind_and_target() {
    let link = Quicklink::custom("Size guide", "https://shop.test/sizes");
    let lines = format_quicklink_lines(std::slice::from_ref(&link));
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with(&link.id.to_string()));
    assert!(lines[0].contains("custom"));
    assert!(lines[0].ends_with("https://shop.test/sizes"));
}

#[test]
fn normalize_api_url_requires_http_scheme() {
    assert_eq!(
        normalize_api_url("https://admin.shop.test/".to_string()).unwrap(),
        "https://admin.shop.test"
    );
    assert!(normalize_api_url("admin.shop.test".to_string()).is_err());
    assert!(normalize_api_url("  ".to_string()).is_err());
}

#[test]
fn password_status_label_reads_naturally() {
    assert_eq!(password_status_label(true), "may change password");
    assert_eq!(password_status_label(false), "may not change password");
}

#[test]
fn picker_kinds_map_to_entities() {
    assert_eq!(picker_entity_kind(PickerKind::Products), EntityKind::Product);
    assert_eq!(
        picker_entity_kind(PickerKind::Collections),
        EntityKind::Collection
    );
}

#[test]
fn completions_use_binary_name() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("shopmeta"));
    assert!(script.contains("quicklinks"));
}

#[test]
fn notes_add_parses_customer_and_content() {
    let cli = Cli::try_parse_from([
        "shopmeta",
        "notes",
        "add",
        "--customer",
        "cus_01",
        "--author",
        "sam",
        "Prefers",
        "email",
    ])
    .unwrap();

    let Commands::Notes {
        command:
            NotesCommands::Add {
                target,
                author,
                content,
            },
    } = cli.command
    else {
        panic!("expected notes add");
    };
    assert_eq!(target.customer.as_deref(), Some("cus_01"));
    assert_eq!(target.path, None);
    assert_eq!(author.as_deref(), Some("sam"));
    assert_eq!(content, vec!["Prefers".to_string(), "email".to_string()]);
}

#[test]
fn targets_require_exactly_one_of_id_or_path() {
    assert!(Cli::try_parse_from(["shopmeta", "notes", "list"]).is_err());
    assert!(Cli::try_parse_from([
        "shopmeta",
        "notes",
        "list",
        "--customer",
        "cus_01",
        "--path",
        "/a/customers/cus_01",
    ])
    .is_err());
    assert!(Cli::try_parse_from([
        "shopmeta",
        "password",
        "status",
        "--path",
        "/a/customers/cus_01",
    ])
    .is_ok());
}

#[tokio::test]
async fn retry_on_conflict_reloads_after_concurrent_write() {
    let api = seeded_api();
    let concurrent = note_at(1_000, "Added in another tab", None);
    api.inject(Fault::ConcurrentWrite {
        key: NOTES_FIELD.to_string(),
        value: encode_list(&[concurrent]).unwrap(),
    });

    let attempts = AtomicUsize::new(0);
    let note = retry_on_conflict(|| {
        attempts.fetch_add(1, Ordering::SeqCst);
        let api = api.clone();
        async move {
            let widget = NotesWidget::mount(api, &customer_id()).await?;
            widget.add("Follow up on refund", None).await
        }
    })
    .await
    .unwrap();

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(note.content, "Follow up on refund");

    let widget = NotesWidget::mount(api.clone(), &customer_id()).await.unwrap();
    let contents = widget
        .notes()
        .await
        .into_iter()
        .map(|note| note.content)
        .collect::<Vec<_>>();
    assert_eq!(
        contents,
        vec![
            "Added in another tab".to_string(),
            "Follow up on refund".to_string()
        ]
    );
}

#[tokio::test]
async fn retry_on_conflict_gives_up_after_one_retry() {
    let attempts = AtomicUsize::new(0);
    let result: Result<(), CliError> = retry_on_conflict(|| {
        attempts.fetch_add(1, Ordering::SeqCst);
        async {
            Err(WidgetError::Sync(shopmeta_core::Error::Conflict {
                kind: EntityKind::Customer,
                id: customer_id(),
                reason: "version changed".to_string(),
            }))
        }
    })
    .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert!(matches!(result, Err(CliError::Widget(error)) if error.is_conflict()));
}

#[tokio::test]
async fn retry_on_conflict_does_not_retry_other_errors() {
    let api = seeded_api();
    api.inject(Fault::UpdateFails);

    let attempts = AtomicUsize::new(0);
    let result = retry_on_conflict(|| {
        attempts.fetch_add(1, Ordering::SeqCst);
        let api = api.clone();
        async move {
            let widget = NotesWidget::mount(api, &customer_id()).await?;
            widget.add("Never stored", None).await
        }
    })
    .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(result.is_err());
    assert_eq!(api.update_calls().len(), 1);
    assert_eq!(
        api.get(EntityKind::Customer, &customer_id())
            .unwrap()
            .metadata
            .get(NOTES_FIELD),
        None
    );
}
