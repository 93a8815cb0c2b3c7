//! Identity and drift hashing for registry entries.
//!
//! Two different hashes with two different jobs:
//!
//! - [`hash_connection_url`] is the registry's natural key, so it must be
//!   collision-resistant and stable across equivalent spellings of the
//!   same connection URL — a SHA-256 digest over the normalized URL.
//! - [`hash_schema_structure`] only needs to answer "did the structure
//!   change since last sync"; it is a fast 32-bit rolling hash over a
//!   canonical projection that deliberately excludes descriptions and
//!   semantic types.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::model::{ForeignKeyRef, RegisteredTable};

/// Hash a connection URL into the registry's natural key.
///
/// Normalizes by stripping a single trailing slash and lower-casing, so
/// `https://x.co/` and `HTTPS://X.CO` collide to the same key. Returns a
/// 64-character lowercase hex string.
pub fn hash_connection_url(url: &str) -> String {
    let normalized = url.strip_suffix('/').unwrap_or(url).to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Canonical structural projection of one column.
#[derive(Serialize)]
struct ColumnShape<'a> {
    n: &'a str,
    t: &'a str,
    p: bool,
    f: Option<&'a ForeignKeyRef>,
}

/// Canonical structural projection of one table.
#[derive(Serialize)]
struct TableShape<'a> {
    n: &'a str,
    c: Vec<ColumnShape<'a>>,
}

/// Structural fingerprint of a table collection for drift detection.
///
/// Projects each table to name plus per-column name/type/primary-flag/FK
/// reference, sorts tables by name for order-independence, serializes
/// deterministically, and folds the bytes with `h = h*31 + b` truncated
/// to 32 bits. Description and semantic-type edits do not change the
/// hash; any rename, type change, key change, or FK change does. A
/// column rename is indistinguishable from a drop-plus-add here; callers
/// only learn *that* the structure drifted, not how.
pub fn hash_schema_structure(tables: &[RegisteredTable]) -> String {
    let mut shapes: Vec<TableShape<'_>> = tables
        .iter()
        .map(|table| TableShape {
            n: &table.name,
            c: table
                .columns
                .iter()
                .map(|col| ColumnShape {
                    n: &col.name,
                    t: &col.data_type,
                    p: col.is_primary,
                    f: col.foreign_key.as_ref(),
                })
                .collect(),
        })
        .collect();
    shapes.sort_by(|a, b| a.n.cmp(b.n));

    // Canonical projection serializes infallibly: only strings, bools,
    // and options of the above.
    let canonical = serde_json::to_string(&shapes).unwrap_or_default();

    let mut hash: u32 = 0;
    for byte in canonical.bytes() {
        hash = hash.wrapping_mul(31).wrapping_add(byte as u32);
    }
    format!("{:x}", hash)
}
