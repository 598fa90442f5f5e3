use chrono::Utc;
use std::{sync::Arc, time::Duration};

use crate::types::Context;

/// Deletes expired sessions and access tokens every `every`, forever.
pub async fn purge_expired_credentials(ctx: Arc<Context>, every: Duration) {
    let mut interval = tokio::time::interval(every);

    loop {
        interval.tick().await;

        match ctx.db.purge_expired_credentials(Utc::now()).await {
            Ok(0) => tracing::debug!("No expired credentials to purge"),
            Ok(purged) => tracing::info!("Purged {purged} expired credentials"),
            Err(err) => tracing::error!("Failed to purge expired credentials: {err}"),
        }
    }
}
