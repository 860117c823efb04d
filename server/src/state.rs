// server/src/state.rs

use market::{AuditEntry, AuditSink, ListingPolicy, MarketStore, Marketplace};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct AppState {
  pub market: Arc<Marketplace>,
  pub audit: Arc<dyn AuditSink>,
}

impl AppState {
  pub fn new(store: Arc<dyn MarketStore>, audit: Arc<dyn AuditSink>) -> Self {
    Self {
      market: Arc::new(Marketplace::new(store, ListingPolicy::default())),
      audit,
    }
  }

  /// Hands `entry` to the audit sink on a detached task. A failed write is
  /// logged and otherwise ignored.
  pub fn record_audit(&self, entry: AuditEntry) {
    let sink = Arc::clone(&self.audit);
    actix_web::rt::spawn(async move {
      let action = entry.action;
      match sink.record(entry).await {
        Ok(()) => debug!(%action, "Audit entry recorded."),
        Err(e) => warn!(%action, error = %e, "Failed to record audit entry."),
      }
    });
  }
}
