//! Record source seam.
//!
//! Each guard resolves its principals against one [`RecordSource`]. The
//! orchestrator only ever asks for the first record matching a conjunctive
//! field filter; what backs the lookup (Postgres, an in-process map, or a
//! host-provided implementation) is the host's choice, registered per guard
//! at construction time.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::AuthResult;
use crate::record::{FieldMap, UserRecord};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRecordSource;
pub use postgres::PgRecordSource;

/// Lookup-by-fields backend behind every guard
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// First record matching every entry in `filters` (AND), or `None`
    async fn find_by(&self, filters: &FieldMap) -> AuthResult<Option<UserRecord>>;
}

/// Guard name -> record source, injected at configuration-load time
pub type SourceRegistry = HashMap<String, Arc<dyn RecordSource>>;
