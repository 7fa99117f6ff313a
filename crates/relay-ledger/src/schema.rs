//! Ledger database schema.

/// SQL to create the chain log table.
pub const CREATE_CHAIN_LOG_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS chain_log (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    sender_id      INTEGER NOT NULL,
    sender_label   TEXT NOT NULL,
    receiver_id    INTEGER NOT NULL,
    receiver_label TEXT NOT NULL,
    artifact_ref   TEXT NOT NULL,
    artist         TEXT NOT NULL,
    title          TEXT NOT NULL,
    recorded_at    TEXT NOT NULL
);
";

/// SQL to append one completed hop.
pub const INSERT_HOP: &str = r"
INSERT INTO chain_log (
    sender_id, sender_label, receiver_id, receiver_label,
    artifact_ref, artist, title, recorded_at
) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

/// SQL to load every hop in insertion order.
pub const SELECT_ALL_HOPS: &str = r"
SELECT sender_id, sender_label, receiver_id, receiver_label,
       artifact_ref, artist, title, recorded_at
FROM chain_log
ORDER BY id ASC
";

/// SQL to discard every hop.
pub const DELETE_ALL_HOPS: &str = "DELETE FROM chain_log";
