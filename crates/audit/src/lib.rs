//! Audit trail for workspace mutations.
//!
//! Every state-changing operation emits one [`AuditEntry`] describing who
//! did what to which row, recorded after the mutation commits. Sinks are
//! fire-and-forget: auditing never blocks or fails the request it
//! describes.

mod entry;
mod sink;

pub use entry::{AuditAction, AuditEntry, EntityKind, RequestOrigin};
pub use sink::{AuditSink, MemorySink, NullSink};
