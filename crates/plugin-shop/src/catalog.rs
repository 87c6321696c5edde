//! Index of products created while the shop is active.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde_json::Value;
use uuid::Uuid;

use cmsdash_plugin_sdk::prelude::*;

use crate::PRODUCT_TYPE;

/// Tracks product content as it is created, updated and deleted.
#[derive(Debug, Default)]
pub struct ProductIndex {
    /// Content id → SKU.
    products: Mutex<BTreeMap<Uuid, String>>,
}

impl ProductIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed products.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// SKU recorded for `content_id`.
    pub fn sku(&self, content_id: &Uuid) -> Option<String> {
        self.lock().get(content_id).cloned()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Applies a content event. Non-product content is ignored.
    pub fn apply(&self, event: &CmsEvent) -> ListenerResult {
        match event {
            CmsEvent::Content(ContentEvent::AfterCreate {
                content_id,
                content_type,
                data,
            })
            | CmsEvent::Content(ContentEvent::AfterUpdate {
                content_id,
                content_type,
                data,
            }) if content_type == PRODUCT_TYPE => {
                let sku = data
                    .get("sku")
                    .and_then(Value::as_str)
                    .ok_or_else(|| format!("product {content_id} has no sku"))?;
                self.lock().insert(*content_id, sku.to_string());
                Ok(())
            }
            CmsEvent::Content(ContentEvent::AfterDelete {
                content_id,
                content_type,
            }) if content_type == PRODUCT_TYPE => {
                self.lock().remove(content_id);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<Uuid, String>> {
        self.products.lock().unwrap_or_else(|e| e.into_inner())
    }
}
