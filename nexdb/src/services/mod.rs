//! Services sitting between a transport and the database.
//!
//! Each service holds a shared handle to the [`Database`](nexdb_core::database::Database)
//! and returns [`DatabaseError`]s a caller can map straight onto a response with
//! [`DatabaseError::code`] and [`DatabaseError::public_message`]. System errors are
//! logged here, before their details are collapsed.

pub mod auth;
pub mod reader;
pub mod writer;

pub use auth::{API_KEYS_COLLECTION, AuthService};
pub use reader::Reader;
pub use writer::Writer;

use nexdb_core::error::{DatabaseError, ErrorKind};
use tracing::error;

fn report(operation: &'static str, err: DatabaseError) -> DatabaseError {
    if err.kind() == ErrorKind::System {
        error!(operation, error = %err, "request failed");
    }
    err
}
