//! Last submitted record, kept to seed the dashboard feed.
//!
//! Single slot, last write wins. Concurrent writers may race; readers always
//! see one complete record.

use crate::features::{FeatureRecord, FeatureSchema};
use arc_swap::ArcSwapOption;
use std::sync::Arc;

#[derive(Default)]
pub struct LastInputCache {
    slot: ArcSwapOption<FeatureRecord>,
}

impl LastInputCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached record, returning the previous one.
    pub fn store(&self, record: FeatureRecord) -> Option<Arc<FeatureRecord>> {
        self.slot.swap(Some(Arc::new(record)))
    }

    pub fn latest(&self) -> Option<Arc<FeatureRecord>> {
        self.slot.load_full()
    }

    pub fn clear(&self) {
        self.slot.store(None);
    }

    /// The latest record, or the schema's reference campaign when nothing
    /// has been submitted yet.
    pub fn seed(&self, schema: &FeatureSchema) -> Arc<FeatureRecord> {
        self.latest()
            .unwrap_or_else(|| Arc::new(schema.default_record()))
    }
}
