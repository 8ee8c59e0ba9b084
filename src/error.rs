use std::io;

use thiserror::Error as DeriveError;

#[derive(DeriveError, Debug)]
pub enum SyncError {
    #[error("failed to spawn queue worker: {0}")]
    Spawn(#[from] io::Error),

    #[error("queued operation was dropped before it could run")]
    Abandoned,

    #[error("write submitted from inside a concurrent read on the same queue")]
    WriteInsideRead,

    #[error("guarded value is already borrowed")]
    AlreadyBorrowed,
}
