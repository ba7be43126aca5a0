//! Product quicklinks widget.

use super::{non_blank, subject_from_path, WidgetError, WidgetResult};
use crate::codec::DecodeError;
use crate::models::{Entity, EntityId, EntityKind, Quicklink, QuicklinkId};
use crate::remote::{EntityApi, EntityPage, ListQuery};
use crate::sync::MetadataList;

/// Metadata key holding a product's quicklinks.
pub const QUICKLINKS_FIELD: &str = "quicklinks";

/// Quicklinks attached to one product.
pub struct QuicklinksWidget<A> {
    list: MetadataList<A, Quicklink>,
    product: Entity,
    recovered: Option<DecodeError>,
}

impl<A: EntityApi> QuicklinksWidget<A> {
    pub async fn mount(api: A, product_id: &EntityId) -> WidgetResult<Self> {
        let list = MetadataList::new(api, EntityKind::Product, QUICKLINKS_FIELD);
        let outcome = list.load(product_id).await?;
        Ok(Self {
            list,
            product: outcome.entity,
            recovered: outcome.recovered,
        })
    }

    pub async fn mount_from_path(api: A, path: &str) -> WidgetResult<Self> {
        let product_id = subject_from_path(path, EntityKind::Product.plural())?;
        Self::mount(api, &product_id).await
    }

    pub const fn product(&self) -> &Entity {
        &self.product
    }

    pub const fn recovered(&self) -> Option<&DecodeError> {
        self.recovered.as_ref()
    }

    pub async fn links(&self) -> Vec<Quicklink> {
        self.list.items().await
    }

    /// Add a free-form link.
    pub async fn add_custom(&self, title: &str, link: &str) -> WidgetResult<Quicklink> {
        let title = non_blank(title).ok_or(WidgetError::EmptyField("title"))?;
        let link = non_blank(link).ok_or(WidgetError::EmptyField("link"))?;
        self.push(Quicklink::custom(title, link)).await
    }

    /// Add a link to another product.
    pub async fn add_product(&self, product_id: &EntityId) -> WidgetResult<Quicklink> {
        self.add_entity(EntityKind::Product, product_id).await
    }

    /// Add a link to a collection.
    pub async fn add_collection(&self, collection_id: &EntityId) -> WidgetResult<Quicklink> {
        self.add_entity(EntityKind::Collection, collection_id).await
    }

    async fn add_entity(&self, kind: EntityKind, id: &EntityId) -> WidgetResult<Quicklink> {
        let target = self.list.api().retrieve(kind, id).await?;
        let link = Quicklink::to_entity(&target)
            .ok_or_else(|| WidgetError::InvalidTarget(target.kind.to_string()))?;
        self.push(link).await
    }

    async fn push(&self, link: Quicklink) -> WidgetResult<Quicklink> {
        self.list.append(link.clone()).await?;
        Ok(link)
    }

    /// Change a link's title and/or target; omitted values are kept.
    pub async fn edit(
        &self,
        id: QuicklinkId,
        title: Option<&str>,
        link: Option<&str>,
    ) -> WidgetResult<Quicklink> {
        let title = title
            .map(|title| non_blank(title).ok_or(WidgetError::EmptyField("title")))
            .transpose()?;
        let link = link
            .map(|link| non_blank(link).ok_or(WidgetError::EmptyField("link")))
            .transpose()?;
        self.require(id).await?;

        let items = self
            .list
            .update_by_key(&id, |current| Quicklink {
                title: title.clone().unwrap_or_else(|| current.title.clone()),
                link: link.clone().unwrap_or_else(|| current.link.clone()),
                ..current.clone()
            })
            .await?;
        find(&items, id)
    }

    /// Delete a link. Unknown ids fail with `WidgetError::UnknownItem`
    /// before any remote call; the underlying list would write back anyway.
    pub async fn delete(&self, id: QuicklinkId) -> WidgetResult<Quicklink> {
        let existing = self.require(id).await?;
        self.list.remove_by_key(&id).await?;
        Ok(existing)
    }

    /// Search products or collections for the link picker.
    pub async fn search(&self, kind: EntityKind, query: &ListQuery) -> WidgetResult<EntityPage> {
        if kind == EntityKind::Customer {
            return Err(WidgetError::InvalidTarget(kind.to_string()));
        }
        Ok(self.list.api().list(kind, query).await?)
    }

    pub async fn search_products(&self, query: &ListQuery) -> WidgetResult<EntityPage> {
        self.search(EntityKind::Product, query).await
    }

    pub async fn search_collections(&self, query: &ListQuery) -> WidgetResult<EntityPage> {
        self.search(EntityKind::Collection, query).await
    }

    async fn require(&self, id: QuicklinkId) -> WidgetResult<Quicklink> {
        find(&self.list.items().await, id)
    }
}

fn find(links: &[Quicklink], id: QuicklinkId) -> WidgetResult<Quicklink> {
    links
        .iter()
        .find(|link| link.id == id)
        .cloned()
        .ok_or_else(|| WidgetError::UnknownItem(id.to_string()))
}
