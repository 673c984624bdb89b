use anyhow::Result;

use crate::db::{Store, User};

/// Append-only audit writer. Every mutating operation in the API goes
/// through here with a machine-readable type tag and a human-readable
/// description.
#[derive(Clone)]
pub struct ActivityLogger {
    store: Store,
}

impl ActivityLogger {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn log(
        &self,
        event_type: &str,
        description: &str,
        actor: Option<&User>,
        metadata: Option<serde_json::Value>,
    ) -> Result<()> {
        let metadata = metadata.map(|m| m.to_string());
        self.store
            .add_activity(event_type, description, actor.map(|u| u.id), metadata)
            .await
    }
}
