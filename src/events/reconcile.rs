use serenity::http::Http;

use crate::{
    database::Database,
    suggestion::presentation::{locate_summary, sync_summary},
};

async fn resync(http: &Http, db: &Database, suggestion_id: &str) -> Result<(), anyhow::Error> {
    let suggestion = db
        .get_suggestion(suggestion_id)?
        .ok_or_else(|| anyhow::anyhow!("suggestion {} vanished", suggestion_id))?;
    let mut message = locate_summary(http, db, &suggestion).await?;
    let tally = db.tally_votes(suggestion_id)?;
    sync_summary(http, &mut message, &suggestion, tally, None).await
}

/// Brings every pending summary back in line with the stored votes and
/// re-binds its buttons. Runs after each (re)connect.
pub async fn reconcile_pending(http: &Http, db: &Database) {
    let pending = match db.pending_suggestion_ids() {
        Ok(ids) => ids,
        Err(e) => {
            error!("Could not list pending suggestions: {:#}", e);
            return;
        }
    };

    let mut synced = 0;
    for suggestion_id in &pending {
        match resync(http, db, suggestion_id).await {
            Ok(()) => synced += 1,
            Err(e) => warn!("Skipping summary of {}: {:#}", suggestion_id, e),
        }
    }
    info!("Reconciled {}/{} pending suggestion(s)", synced, pending.len());
}
