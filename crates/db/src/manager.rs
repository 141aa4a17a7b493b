//! Per-request transaction factory.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::accessor::{ClubAccessor, PgClubAccessor, RecordingAccessor};
use crate::error::StorageError;
use crate::DbPool;

#[derive(Clone)]
enum Backend {
    Postgres(DbPool),
    Recording(Arc<Mutex<VecDeque<RecordingAccessor>>>),
}

/// Hands every request its own [`ClubAccessor`].
///
/// Cloning is cheap; clones share the pool (or the remaining scripts).
#[derive(Clone)]
pub struct AccessorManager {
    backend: Backend,
}

impl AccessorManager {
    pub fn postgres(pool: DbPool) -> Self {
        Self {
            backend: Backend::Postgres(pool),
        }
    }

    /// Manager that hands out the given scripted accessors in order.
    pub fn recording(scripts: Vec<RecordingAccessor>) -> Self {
        Self {
            backend: Backend::Recording(Arc::new(Mutex::new(scripts.into()))),
        }
    }

    /// The pool behind a Postgres manager.
    pub fn pool(&self) -> Option<&DbPool> {
        match &self.backend {
            Backend::Postgres(pool) => Some(pool),
            Backend::Recording(_) => None,
        }
    }

    /// Open a fresh transaction bound to a new accessor.
    ///
    /// # Panics
    ///
    /// A recording manager panics when no scripted accessor is left: the
    /// test did not expect another transaction.
    pub async fn begin_tx(&self) -> Result<Box<dyn ClubAccessor>, StorageError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let accessor = PgClubAccessor::begin(pool).await?;
                Ok(Box::new(accessor))
            }
            Backend::Recording(scripts) => {
                let next = scripts
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front();
                match next {
                    Some(accessor) => {
                        accessor.log().record_begin();
                        Ok(Box::new(accessor))
                    }
                    None => panic!("unexpected BeginTx: no scripted accessor left"),
                }
            }
        }
    }
}
