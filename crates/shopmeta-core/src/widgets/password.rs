//! Password-change restriction widget.

use super::{subject_from_path, WidgetResult};
use crate::models::{EntityId, EntityKind};
use crate::remote::EntityApi;
use crate::sync::MetadataFlag;

/// Metadata key for the restriction; absent means changes are allowed.
pub const CAN_CHANGE_PASSWORD_FIELD: &str = "can_change_password";

/// Outcome of a toggle.
#[derive(Debug)]
pub enum FlagChange {
    /// The store confirmed the new value.
    Committed(bool),
    /// The write failed; the widget kept `value`.
    Reverted { value: bool, error: crate::Error },
}

impl FlagChange {
    /// Value shown after the toggle.
    pub const fn value(&self) -> bool {
        match self {
            Self::Committed(value) | Self::Reverted { value, .. } => *value,
        }
    }
}

/// Whether one customer may change their password.
pub struct PasswordRestrictionWidget<A> {
    flag: MetadataFlag<A>,
    customer_id: EntityId,
    allowed: bool,
}

impl<A: EntityApi> PasswordRestrictionWidget<A> {
    pub async fn mount(api: A, customer_id: &EntityId) -> WidgetResult<Self> {
        let flag = MetadataFlag::new(api, EntityKind::Customer, CAN_CHANGE_PASSWORD_FIELD, true);
        let allowed = flag.load(customer_id).await?;
        Ok(Self {
            flag,
            customer_id: customer_id.clone(),
            allowed,
        })
    }

    pub async fn mount_from_path(api: A, path: &str) -> WidgetResult<Self> {
        let customer_id = subject_from_path(path, EntityKind::Customer.plural())?;
        Self::mount(api, &customer_id).await
    }

    pub const fn customer_id(&self) -> &EntityId {
        &self.customer_id
    }

    pub const fn allowed(&self) -> bool {
        self.allowed
    }

    /// Persist the restriction. Failures are logged and leave the widget at
    /// its last confirmed value.
    pub async fn set_allowed(&mut self, allowed: bool) -> FlagChange {
        match self.flag.set(allowed).await {
            Ok(value) => {
                self.allowed = value;
                FlagChange::Committed(value)
            }
            Err(error) => {
                tracing::warn!(
                    customer = %self.customer_id,
                    %error,
                    "Password restriction not saved; keeping previous value"
                );
                FlagChange::Reverted {
                    value: self.allowed,
                    error,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::Entity;
    use crate::remote::{Fault, InMemoryEntityApi};

    fn seeded() -> (InMemoryEntityApi, EntityId) {
        let api = InMemoryEntityApi::new();
        let id = EntityId::new("cus_01").unwrap();
        api.insert(Entity::new(EntityKind::Customer, id.clone()));
        (api, id)
    }

    #[tokio::test]
    async fn defaults_to_allowed() {
        let (api, _) = seeded();
        let widget = PasswordRestrictionWidget::mount_from_path(api, "/a/customers/cus_01/edit")
            .await
            .unwrap();
        assert!(widget.allowed());
    }

    #[tokio::test]
    async fn toggle_commits() {
        let (api, id) = seeded();
        let mut widget = PasswordRestrictionWidget::mount(api.clone(), &id)
            .await
            .unwrap();

        let change = widget.set_allowed(false).await;
        assert!(matches!(change, FlagChange::Committed(false)));
        assert!(!widget.allowed());
        let stored = api.get(EntityKind::Customer, &id).unwrap();
        assert_eq!(
            stored.metadata.get(CAN_CHANGE_PASSWORD_FIELD),
            Some(&json!(false))
        );
    }

    #[tokio::test]
    async fn failed_toggle_reverts_silently() {
        let (api, id) = seeded();
        let mut widget = PasswordRestrictionWidget::mount(api.clone(), &id)
            .await
            .unwrap();

        api.inject(Fault::UpdateFails);
        let change = widget.set_allowed(false).await;
        assert!(matches!(change, FlagChange::Reverted { value: true, .. }));
        assert!(change.value());
        assert!(widget.allowed());
    }
}
