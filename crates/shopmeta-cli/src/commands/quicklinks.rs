use serde::Serialize;
use shopmeta_core::models::{Entity, EntityId, EntityKind, QuicklinkId};
use shopmeta_core::remote::{EntityApi, HttpEntityApi, ListQuery};
use shopmeta_core::widgets::QuicklinksWidget;

use crate::cli::{PickerKind, QuicklinksCommands};
use crate::commands::common::{
    format_quicklink_lines, open_session, parse_entity_id, resolve_product, retry_on_conflict,
    Session,
};
use crate::error::CliError;

pub async fn run_quicklinks(
    command: QuicklinksCommands,
    global_profile: Option<&str>,
    api_url: Option<&str>,
) -> Result<(), CliError> {
    let session = open_session(global_profile, api_url)?;
    match command {
        QuicklinksCommands::List { target, json } => {
            run_list(&session, &resolve_product(&target)?, json).await
        }
        QuicklinksCommands::Add {
            target,
            title,
            link,
        } => {
            let product_id = resolve_product(&target)?;
            let added = retry_on_conflict(|| {
                let (title, link) = (title.as_str(), link.as_str());
                let product_id = &product_id;
                let session = &session;
                async move { mount(session, product_id).await?.add_custom(title, link).await }
            })
            .await?;
            println!("Added quicklink {} -> {}", added.id, added.link);
            Ok(())
        }
        QuicklinksCommands::AddProduct { target, product_id } => {
            let target_id = parse_entity_id(&product_id, EntityKind::Product.singular())?;
            run_add_entity(&session, &resolve_product(&target)?, EntityKind::Product, &target_id)
                .await
        }
        QuicklinksCommands::AddCollection {
            target,
            collection_id,
        } => {
            let target_id = parse_entity_id(&collection_id, EntityKind::Collection.singular())?;
            run_add_entity(
                &session,
                &resolve_product(&target)?,
                EntityKind::Collection,
                &target_id,
            )
            .await
        }
        QuicklinksCommands::Edit {
            target,
            id,
            title,
            link,
        } => {
            let link_id = parse_quicklink_id(&id)?;
            if title.is_none() && link.is_none() {
                return Err(CliError::NothingToChange);
            }
            let product_id = resolve_product(&target)?;
            let updated = retry_on_conflict(|| {
                let (title, link) = (title.as_deref(), link.as_deref());
                let product_id = &product_id;
                let session = &session;
                async move {
                    mount(session, product_id)
                        .await?
                        .edit(link_id, title, link)
                        .await
                }
            })
            .await?;
            println!("Updated quicklink {}", updated.id);
            Ok(())
        }
        QuicklinksCommands::Delete { target, id } => {
            let link_id = parse_quicklink_id(&id)?;
            let product_id = resolve_product(&target)?;
            let removed = retry_on_conflict(|| {
                let product_id = &product_id;
                let session = &session;
                async move { mount(session, product_id).await?.delete(link_id).await }
            })
            .await?;
            println!("Deleted quicklink {}", removed.id);
            Ok(())
        }
        QuicklinksCommands::Search {
            kind,
            query,
            limit,
            offset,
            json,
        } => {
            let query = ListQuery::search(query.join(" "))
                .with_limit(limit)
                .with_offset(offset);
            run_search(&session, picker_entity_kind(kind), &query, json).await
        }
    }
}

async fn mount(
    session: &Session,
    product_id: &EntityId,
) -> Result<QuicklinksWidget<HttpEntityApi>, shopmeta_core::widgets::WidgetError> {
    QuicklinksWidget::mount(session.api.clone(), product_id).await
}

async fn run_list(session: &Session, product_id: &EntityId, as_json: bool) -> Result<(), CliError> {
    let widget = mount(session, product_id).await?;
    if let Some(problem) = widget.recovered() {
        eprintln!(
            "Warning: stored quicklinks for {} were unreadable ({problem}); they will be backed up on the next change",
            widget.product().display_name()
        );
    }
    let links = widget.links().await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&links)?);
    } else if links.is_empty() {
        println!("No quicklinks for {}", widget.product().display_name());
    } else {
        for line in format_quicklink_lines(&links) {
            println!("{line}");
        }
    }

    Ok(())
}

async fn run_add_entity(
    session: &Session,
    product_id: &EntityId,
    kind: EntityKind,
    target_id: &EntityId,
) -> Result<(), CliError> {
    let added = retry_on_conflict(|| async move {
        let widget = mount(session, product_id).await?;
        match kind {
            EntityKind::Collection => widget.add_collection(target_id).await,
            _ => widget.add_product(target_id).await,
        }
    })
    .await?;
    println!("Added quicklink {} -> {}", added.id, added.link);
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct PickerItem {
    pub id: String,
    pub title: String,
    pub handle: Option<String>,
}

impl From<&Entity> for PickerItem {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id.to_string(),
            title: entity.display_name().to_string(),
            handle: entity.handle.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PickerPage {
    items: Vec<PickerItem>,
    count: usize,
}

async fn run_search(
    session: &Session,
    kind: EntityKind,
    query: &ListQuery,
    as_json: bool,
) -> Result<(), CliError> {
    let page = session.api.list(kind, query).await?;
    let items = page.items.iter().map(PickerItem::from).collect::<Vec<_>>();

    if as_json {
        let page = PickerPage {
            items,
            count: page.count,
        };
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No {} found", kind.plural());
        return Ok(());
    }
    for item in &items {
        match &item.handle {
            Some(handle) => println!("{:<30}  {}  ({handle})", item.id, item.title),
            None => println!("{:<30}  {}", item.id, item.title),
        }
    }
    let shown_until = query.offset + items.len();
    if shown_until < page.count {
        println!(
            "Showing {}-{} of {}; use --offset {shown_until} for more",
            query.offset + 1,
            shown_until,
            page.count
        );
    }
    Ok(())
}

pub const fn picker_entity_kind(kind: PickerKind) -> EntityKind {
    match kind {
        PickerKind::Products => EntityKind::Product,
        PickerKind::Collections => EntityKind::Collection,
    }
}

pub fn parse_quicklink_id(raw: &str) -> Result<QuicklinkId, CliError> {
    raw.parse::<QuicklinkId>().map_err(|_| CliError::InvalidId {
        kind: "quicklink",
        value: raw.to_string(),
    })
}
