// Helpers for generating the two id shapes the auth core needs.
//
// Session/token ids are credentials-adjacent: they must be unguessable and
// must not be derivable from user or time data, so they are random v4.
// Store row ids only need to be unique and time-sortable, so they are v7.

use uuid::Uuid;

/// Generate an unguessable opaque id (UUIDv4) for token/session ids.
pub fn opaque_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a time-sortable row id (UUIDv7).
pub fn row_id() -> String {
    Uuid::now_v7().to_string()
}
