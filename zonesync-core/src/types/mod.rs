//! Core type definitions.

mod account;
mod config;
mod conflict;
mod domain;
mod history;
mod records;
mod sync;

pub use account::{Account, AccountStatus};
pub use config::SyncConfig;
pub use conflict::{ConflictItem, ConflictPolicy, ConflictState};
pub use domain::{DomainEntry, HostingClass};
pub use history::{ChangeSource, ChangeType, RecordChange};
pub use records::{RecordSet, RecordValue};
pub use sync::{
    DomainSyncOutcome, SyncCounters, SyncDisposition, SyncLogEntry, SyncRunStatus, SyncTrigger,
};
