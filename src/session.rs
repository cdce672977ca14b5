use std::path::Path;

use log::info;
use thiserror::Error;

use crate::data::{LedgerCache, LoadError};
use crate::reporting::ledger::ContractLedger;

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("wrong password")]
    WrongPassword,
}

/// Password check guarding the reporting session.
pub struct AccessGate {
    secret: String,
}

impl AccessGate {
    pub fn new(secret: impl Into<String>) -> AccessGate {
        AccessGate { secret: secret.into() }
    }

    /// Check `password` and hand out a session on success. Everything that
    /// reads a ledger hangs off the session, so there is no way to reach
    /// the data without passing the gate.
    pub fn open(&self, password: &str) -> Result<Session, AuthError> {
        if password == self.secret {
            info!("session opened");
            Ok(Session { cache: LedgerCache::new() })
        } else {
            Err(AuthError::WrongPassword)
        }
    }
}

/// An authenticated reporting session with its own ledger cache. Dropping
/// the session ends it and discards everything cached.
pub struct Session {
    cache: LedgerCache,
}

impl Session {
    pub fn ledger(&mut self, path: impl AsRef<Path>) -> Result<&ContractLedger, LoadError> {
        self.cache.load(path)
    }

    /// Force the next load of `path` to re-read the source.
    pub fn refresh(&mut self, path: impl AsRef<Path>) {
        self.cache.invalidate(path);
    }

    pub fn source_reads(&self) -> u64 {
        self.cache.source_reads()
    }
}
