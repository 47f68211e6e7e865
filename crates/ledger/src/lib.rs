pub mod entry;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod record;
pub mod store;

pub use common::{BoxId, ProductId};
pub use entry::{AuditDraft, AuditEntry, MutationKind, SequenceId};
pub use error::{LedgerError, Result};
pub use memory::InMemoryLedger;
pub use postgres::PostgresLedger;
pub use query::AuditQuery;
pub use record::StockRecord;
pub use store::{AuditStream, LedgerStore, MutationOutcome};
