use std::sync::{Arc, RwLock};

use crate::entry::{AuditAction, AuditEntry};

/// Best-effort destination for audit entries.
///
/// `record` is infallible on the caller side: implementations deal with
/// their own failures (log and drop). A lost audit row must never fail
/// or roll back the mutation it describes.
#[async_trait::async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditEntry);
}

#[async_trait::async_trait]
impl<S> AuditSink for Arc<S>
where
    S: AuditSink + ?Sized,
{
    async fn record(&self, entry: AuditEntry) {
        (**self).record(entry).await;
    }
}

/// In-memory sink for tests and dry runs. Keeps entries in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().expect("audit sink lock poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.entries.read().expect("audit sink lock poisoned").len()
    }

    /// Entries for one action, in arrival order.
    pub fn recorded(&self, action: AuditAction) -> Vec<AuditEntry> {
        self.entries
            .read()
            .expect("audit sink lock poisoned")
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl AuditSink for MemorySink {
    async fn record(&self, entry: AuditEntry) {
        self.entries.write().expect("audit sink lock poisoned").push(entry);
    }
}

/// Sink that drops everything. Useful where a trail is not wanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait::async_trait]
impl AuditSink for NullSink {
    async fn record(&self, _entry: AuditEntry) {}
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::entry::{EntityKind, RequestOrigin};

    fn entry(action: AuditAction) -> AuditEntry {
        AuditEntry::new(
            None,
            None,
            action,
            EntityKind::User,
            Uuid::now_v7(),
            &RequestOrigin::default(),
        )
    }

    #[tokio::test]
    async fn memory_sink_keeps_arrival_order() {
        let sink = MemorySink::new();
        sink.record(entry(AuditAction::Login)).await;
        sink.record(entry(AuditAction::CreateUser)).await;
        sink.record(entry(AuditAction::Login)).await;

        let all = sink.entries();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].action, AuditAction::Login);
        assert_eq!(all[1].action, AuditAction::CreateUser);
        assert_eq!(sink.recorded(AuditAction::Login).len(), 2);
    }

    #[tokio::test]
    async fn sink_works_through_arc() {
        let sink = Arc::new(MemorySink::new());
        let as_trait: Arc<dyn AuditSink> = sink.clone();
        as_trait.record(entry(AuditAction::Logout)).await;
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test]
    async fn null_sink_drops_entries() {
        NullSink.record(entry(AuditAction::DeleteUser)).await;
    }
}
