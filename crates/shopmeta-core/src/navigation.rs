//! Subject entity lookup from an admin console path.

use crate::models::{EntityId, EntityKind};

/// Segment following the first `marker` segment of `path`.
///
/// Query strings, fragments and empty segments are ignored, so
/// `/a/customers/cus_1/?tab=notes` yields `cus_1` for marker `customers`.
pub fn entity_id_from_path(path: &str, marker: &str) -> Option<EntityId> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    segments.by_ref().find(|segment| *segment == marker)?;
    segments.next().and_then(|segment| EntityId::new(segment).ok())
}

/// Entity id for `kind`, using its plural resource name as the marker.
pub fn entity_id_for_kind(path: &str, kind: EntityKind) -> Option<EntityId> {
    entity_id_from_path(path, kind.plural())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(path: &str, marker: &str) -> Option<String> {
        entity_id_from_path(path, marker).map(|id| id.as_str().to_string())
    }

    #[test]
    fn takes_segment_after_marker() {
        assert_eq!(id("/a/customers/cus_123", "customers").as_deref(), Some("cus_123"));
        assert_eq!(
            id("/app/products/prod_9/variants", "products").as_deref(),
            Some("prod_9")
        );
    }

    #[test]
    fn ignores_query_fragment_and_slashes() {
        assert_eq!(
            id("//a//customers//cus_1/?tab=notes#top", "customers").as_deref(),
            Some("cus_1")
        );
    }

    #[test]
    fn missing_marker_or_id_is_none() {
        assert_eq!(id("/a/orders/order_1", "customers"), None);
        assert_eq!(id("/a/customers", "customers"), None);
        assert_eq!(id("/a/customers/", "customers"), None);
        assert_eq!(id("", "customers"), None);
    }

    #[test]
    fn first_marker_wins() {
        assert_eq!(
            id("/products/prod_1/products/prod_2", "products").as_deref(),
            Some("prod_1")
        );
    }

    #[test]
    fn kind_marker() {
        let found = entity_id_for_kind("/a/products/prod_7", EntityKind::Product).unwrap();
        assert_eq!(found.as_str(), "prod_7");
        assert!(entity_id_for_kind("/a/products/prod_7", EntityKind::Customer).is_none());
    }
}
