//! Append-only, hash-chained audit trail with query and regulator-export
//! operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{sha256_hex, ZERO_HASH};
use crate::time::to_iso_millis;
use crate::value::{canonical_details_bytes, Details};
use crate::HexHash;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub entry_id: HexHash,
    pub sequence_number: u64,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub actor_id: String,
    pub actor_role: String,
    pub resource_type: String,
    pub resource_id: String,
    pub details: Details,
    pub previous_hash: HexHash,
    pub entry_hash: HexHash,
}

/// Fields supplied by a caller of [`AuditLog::log`]; `entry_id`,
/// `sequence_number`, `previous_hash` and `entry_hash` are computed.
#[derive(Debug, Clone)]
pub struct LogParams {
    pub action: String,
    pub actor_id: String,
    pub actor_role: String,
    pub resource_type: String,
    pub resource_id: String,
    pub details: Details,
    pub timestamp: DateTime<Utc>,
}

/// The outcome of [`AuditLog::verify_chain`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChainVerification {
    pub valid: bool,
    pub total_entries: usize,
    /// Index (0-based) of the first entry that failed verification, if any.
    pub first_invalid_index: Option<usize>,
}

/// An optional-predicate filter applied by [`AuditLog::query`].
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub action: Option<String>,
    pub actor_id: Option<String>,
    pub resource_id: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

fn canonical_entry_bytes(
    sequence_number: u64,
    timestamp: &DateTime<Utc>,
    action: &str,
    actor_id: &str,
    actor_role: &str,
    resource_type: &str,
    resource_id: &str,
    details: &Details,
    previous_hash: &str,
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(sequence_number.to_string().as_bytes());
    out.push(0x1f);
    out.extend_from_slice(to_iso_millis(timestamp).as_bytes());
    out.push(0x1f);
    out.extend_from_slice(action.as_bytes());
    out.push(0x1f);
    out.extend_from_slice(actor_id.as_bytes());
    out.push(0x1f);
    out.extend_from_slice(actor_role.as_bytes());
    out.push(0x1f);
    out.extend_from_slice(resource_type.as_bytes());
    out.push(0x1f);
    out.extend_from_slice(resource_id.as_bytes());
    out.push(0x1f);
    out.extend_from_slice(&canonical_details_bytes(details));
    out.push(0x1f);
    out.extend_from_slice(previous_hash.as_bytes());
    out
}

/// Append-only audit log. Not thread-safe on its own; the engine serializes
/// access to it under the same exclusivity it uses for ledger mutations.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
    sequence: u64,
}

impl AuditLog {
    pub fn new() -> Self {
        Self { entries: Vec::new(), sequence: 0 }
    }

    /// Appends a new entry, chaining it to the previous entry's hash.
    pub fn log(&mut self, params: LogParams) -> &AuditEntry {
        self.sequence += 1;
        let previous_hash = self
            .entries
            .last()
            .map(|e| e.entry_hash.clone())
            .unwrap_or_else(|| ZERO_HASH.to_string());

        let entry_bytes = canonical_entry_bytes(
            self.sequence,
            &params.timestamp,
            &params.action,
            &params.actor_id,
            &params.actor_role,
            &params.resource_type,
            &params.resource_id,
            &params.details,
            &previous_hash,
        );
        let entry_hash = sha256_hex(&entry_bytes);

        let entry = AuditEntry {
            entry_id: sha256_hex(format!("{}:{}", self.sequence, entry_hash).as_bytes()),
            sequence_number: self.sequence,
            timestamp: params.timestamp,
            action: params.action,
            actor_id: params.actor_id,
            actor_role: params.actor_role,
            resource_type: params.resource_type,
            resource_id: params.resource_id,
            details: params.details,
            previous_hash,
            entry_hash,
        };
        self.entries.push(entry);
        self.entries.last().unwrap()
    }

    /// Walks the chain verifying each entry's recomputed hash and linkage.
    pub fn verify_chain(&self) -> ChainVerification {
        let mut previous_hash = ZERO_HASH.to_string();
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.previous_hash != previous_hash {
                return ChainVerification {
                    valid: false,
                    total_entries: self.entries.len(),
                    first_invalid_index: Some(idx),
                };
            }
            let recomputed = sha256_hex(&canonical_entry_bytes(
                entry.sequence_number,
                &entry.timestamp,
                &entry.action,
                &entry.actor_id,
                &entry.actor_role,
                &entry.resource_type,
                &entry.resource_id,
                &entry.details,
                &entry.previous_hash,
            ));
            if recomputed != entry.entry_hash {
                return ChainVerification {
                    valid: false,
                    total_entries: self.entries.len(),
                    first_invalid_index: Some(idx),
                };
            }
            previous_hash = entry.entry_hash.clone();
        }
        ChainVerification { valid: true, total_entries: self.entries.len(), first_invalid_index: None }
    }

    /// Applies `filter`'s predicates (logical AND) then keeps the newest
    /// `limit` matches, if any.
    pub fn query(&self, filter: &AuditFilter) -> Vec<&AuditEntry> {
        let mut matches: Vec<&AuditEntry> = self
            .entries
            .iter()
            .filter(|e| filter.action.as_deref().map_or(true, |a| e.action == a))
            .filter(|e| filter.actor_id.as_deref().map_or(true, |a| e.actor_id == a))
            .filter(|e| filter.resource_id.as_deref().map_or(true, |r| e.resource_id == r))
            .filter(|e| filter.start.map_or(true, |s| e.timestamp >= s))
            .filter(|e| filter.end.map_or(true, |e2| e.timestamp <= e2))
            .collect();

        if let Some(limit) = filter.limit {
            if matches.len() > limit {
                matches = matches.split_off(matches.len() - limit);
            }
        }
        matches
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs `query` then renders the result as CSV or a JSON export object.
    pub fn export_for_regulator(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        format: ExportFormat,
        exported_at: DateTime<Utc>,
    ) -> String {
        let filter = AuditFilter { start, end, ..Default::default() };
        let entries = self.query(&filter);

        match format {
            ExportFormat::Csv => {
                let mut out = String::from(
                    "EntryID,Sequence,Timestamp,Action,ActorID,ActorRole,ResourceType,ResourceID,Hash\n",
                );
                for e in entries {
                    out.push_str(&format!(
                        "{},{},{},{},{},{},{},{},{}\n",
                        csv_escape(&e.entry_id),
                        e.sequence_number,
                        to_iso_millis(&e.timestamp),
                        csv_escape(&e.action),
                        csv_escape(&e.actor_id),
                        csv_escape(&e.actor_role),
                        csv_escape(&e.resource_type),
                        csv_escape(&e.resource_id),
                        csv_escape(&e.entry_hash),
                    ));
                }
                out
            }
            ExportFormat::Json => {
                let verification = self.verify_chain();
                let payload = serde_json::json!({
                    "exportedAt": to_iso_millis(&exported_at),
                    "system": "GOVRES",
                    "chainIntegrity": {
                        "valid": verification.valid,
                        "totalEntries": verification.total_entries,
                        "firstInvalidIndex": verification.first_invalid_index,
                    },
                    "entries": entries,
                });
                serde_json::to_string_pretty(&payload).expect("export payload is serializable")
            }
        }
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
