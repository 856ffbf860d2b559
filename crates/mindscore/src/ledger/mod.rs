//! Append-only audit records for scoring and composite events.
//!
//! Every entry is sealed with a digest over its serialized fields. The digest
//! is computed once, before the hash field exists, and entries expose no way to
//! change their fields afterwards.

mod store;

pub use store::{InMemoryLedger, LedgerStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// How much of the payload an entry retains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyPolicy {
    FullPayload,
    /// Keep only a short summary; the digest still covers the summary and metadata.
    RetainHashOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// Hex-encoded SHA-256, 64 characters.
    Sha256,
    /// Hex-encoded 32-bit FNV-1a checksum, 8 characters. Not a cryptographic digest.
    Checksum32,
}

impl HashAlgorithm {
    pub fn digest(self, bytes: &[u8]) -> String {
        match self {
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
            HashAlgorithm::Checksum32 => format!("{:08x}", fnv1a32(bytes)),
        }
    }

    pub const fn hex_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Checksum32 => 8,
        }
    }
}

fn fnv1a32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0x811c_9dc5_u32, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(0x0100_0193)
    })
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger payload could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("ledger entry {0} already exists")]
    Conflict(String),
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Caller-supplied content for a new entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerDraft {
    pub actor: String,
    pub action: String,
    pub session_id: String,
    pub payload: Value,
    pub rationale: String,
}

impl LedgerDraft {
    /// Fails fast when the payload cannot be represented as JSON.
    pub fn new<T: Serialize + ?Sized>(
        actor: impl Into<String>,
        action: impl Into<String>,
        session_id: impl Into<String>,
        payload: &T,
        rationale: impl Into<String>,
    ) -> Result<Self, LedgerError> {
        Ok(Self {
            actor: actor.into(),
            action: action.into(),
            session_id: session_id.into(),
            payload: serde_json::to_value(payload)?,
            rationale: rationale.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LedgerRecord {
    id: String,
    timestamp: DateTime<Utc>,
    actor: String,
    action: String,
    session_id: String,
    payload: Value,
    summary: String,
    rationale: String,
    redacted: bool,
    hash_algorithm: HashAlgorithm,
}

impl LedgerRecord {
    /// The single serialization used for hashing, storage, and verification.
    fn canonical_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(flatten)]
    record: LedgerRecord,
    hash: String,
}

impl LedgerEntry {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.record.timestamp
    }

    pub fn actor(&self) -> &str {
        &self.record.actor
    }

    pub fn action(&self) -> &str {
        &self.record.action
    }

    pub fn session_id(&self) -> &str {
        &self.record.session_id
    }

    pub fn payload(&self) -> &Value {
        &self.record.payload
    }

    pub fn summary(&self) -> &str {
        &self.record.summary
    }

    pub fn rationale(&self) -> &str {
        &self.record.rationale
    }

    pub fn is_redacted(&self) -> bool {
        self.record.redacted
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.record.hash_algorithm
    }

    /// Recomputes the digest and compares it with the sealed hash.
    pub fn verify(&self) -> bool {
        self.record
            .canonical_bytes()
            .map(|bytes| self.record.hash_algorithm.digest(&bytes) == self.hash)
            .unwrap_or(false)
    }
}

fn summarize_payload(payload: &Value) -> String {
    match payload {
        Value::Object(fields) if fields.is_empty() => "empty payload".to_string(),
        Value::Object(fields) => {
            let keys: Vec<&str> = fields.keys().take(5).map(String::as_str).collect();
            let more = if fields.len() > keys.len() { ", ..." } else { "" };
            format!(
                "payload with {} field(s): {}{}",
                fields.len(),
                keys.join(", "),
                more
            )
        }
        Value::Array(items) => format!("payload with {} item(s)", items.len()),
        Value::Null => "no payload".to_string(),
        _ => "scalar payload".to_string(),
    }
}

/// Seals drafts into ledger entries with a fixed digest algorithm.
#[derive(Debug, Clone, Copy)]
pub struct LedgerBuilder {
    algorithm: HashAlgorithm,
}

impl Default for LedgerBuilder {
    fn default() -> Self {
        Self::new(HashAlgorithm::Sha256)
    }
}

impl LedgerBuilder {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Creates an entry with a fresh id and the current time.
    pub fn create(
        &self,
        draft: LedgerDraft,
        policy: PrivacyPolicy,
    ) -> Result<LedgerEntry, LedgerError> {
        self.seal(Uuid::new_v4().to_string(), Utc::now(), draft, policy)
    }

    /// Creates an entry with a caller-chosen id and timestamp.
    pub fn seal(
        &self,
        id: String,
        timestamp: DateTime<Utc>,
        draft: LedgerDraft,
        policy: PrivacyPolicy,
    ) -> Result<LedgerEntry, LedgerError> {
        let LedgerDraft {
            actor,
            action,
            session_id,
            payload,
            rationale,
        } = draft;

        let summary = format!(
            "{action} for session {session_id}: {}",
            summarize_payload(&payload)
        );
        let (payload, redacted) = match policy {
            PrivacyPolicy::FullPayload => (payload, false),
            PrivacyPolicy::RetainHashOnly => (json!({ "summary": summary }), true),
        };

        let record = LedgerRecord {
            id,
            timestamp,
            actor,
            action,
            session_id,
            payload,
            summary,
            rationale,
            redacted,
            hash_algorithm: self.algorithm,
        };
        let hash = self.algorithm.digest(&record.canonical_bytes()?);

        Ok(LedgerEntry { record, hash })
    }
}
