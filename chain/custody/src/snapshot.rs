//! Snapshots: persisted custody state with an integrity hash
//!
//! A snapshot holds the owner and the full ordered record sequence. The
//! custodied balance is not part of it; the host's value custody is the
//! authority on balance and is supplied again on restore.
//!
//! Snapshots are JSON so auditors can read them directly. The SHA-256 hash
//! covers version, owner, capture time and records.
//!
//! Restoring builds a new controller from verified state. It does not reset
//! or re-own an existing one.

use custody_types::ids::AccountId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::controller::CustodyController;
use crate::errors::{CustodyError, SnapshotError};
use crate::host::{Clock, InMemoryCustody, ValueCustody};
use crate::ledger::{Ledger, TransactionRecord};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Hashed portion of a snapshot.
#[derive(Serialize)]
struct SnapshotBody<'a> {
    version: u32,
    owner: &'a AccountId,
    taken_at: i64,
    records: &'a [TransactionRecord],
}

/// Persisted form of the custody state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Snapshot format version for forward compatibility.
    pub version: u32,
    pub owner: AccountId,
    /// Host timestamp when the snapshot was taken.
    pub taken_at: i64,
    pub records: Vec<TransactionRecord>,
    /// Hex SHA-256 over the fields above.
    pub integrity: String,
}

impl LedgerSnapshot {
    /// Capture `records` owned by `owner`, computing the integrity hash.
    pub fn capture(
        owner: AccountId,
        taken_at: i64,
        records: Vec<TransactionRecord>,
    ) -> Result<Self, SnapshotError> {
        let integrity = compute_integrity(SNAPSHOT_VERSION, &owner, taken_at, &records)?;
        Ok(Self {
            version: SNAPSHOT_VERSION,
            owner,
            taken_at,
            records,
            integrity,
        })
    }

    /// Check version and integrity hash.
    pub fn verify(&self) -> Result<(), SnapshotError> {
        if self.version > SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        let actual = compute_integrity(self.version, &self.owner, self.taken_at, &self.records)?;
        if actual != self.integrity {
            return Err(SnapshotError::IntegrityFailure {
                expected: self.integrity.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Write atomically: serialize to a temp file, fsync, rename.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        let tmp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;
        info!(path = %path.display(), records = self.records.len(), "Snapshot written");
        Ok(())
    }

    /// Read and verify a snapshot file.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let data = fs::read(path)?;
        let snapshot: LedgerSnapshot = serde_json::from_slice(&data)?;
        snapshot.verify()?;
        Ok(snapshot)
    }
}

fn compute_integrity(
    version: u32,
    owner: &AccountId,
    taken_at: i64,
    records: &[TransactionRecord],
) -> Result<String, SnapshotError> {
    let body = SnapshotBody {
        version,
        owner,
        taken_at,
        records,
    };
    let bytes = serde_json::to_vec(&body)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

impl<V: ValueCustody, C: Clock> CustodyController<V, C> {
    /// Capture the owner and every record.
    pub fn snapshot(&self) -> Result<LedgerSnapshot, SnapshotError> {
        LedgerSnapshot::capture(
            *self.owner(),
            self.clock().now(),
            self.ledger().records().to_vec(),
        )
    }

    /// Build a controller from a verified snapshot.
    ///
    /// `custody` must be the host custody that actually holds the value the
    /// snapshot's records account for; `reconcile` can confirm it.
    pub fn restore(snapshot: LedgerSnapshot, custody: V, clock: C) -> Result<Self, SnapshotError> {
        snapshot.verify()?;
        let ledger = Ledger::from_records(snapshot.records)?;
        info!(owner = %snapshot.owner, records = ledger.count(), "Restoring custody from snapshot");
        Ok(Self::with_ledger(snapshot.owner, ledger, custody, clock)?)
    }
}

/// Resume from a snapshot onto a fresh in-memory host.
///
/// The snapshot must belong to `owner`. `custody` is funded with the
/// balance the records account for before the controller is rebuilt, so
/// the resumed instance reconciles.
pub fn resume_in_memory<C: Clock>(
    snapshot: LedgerSnapshot,
    owner: &AccountId,
    mut custody: InMemoryCustody,
    clock: C,
) -> Result<CustodyController<InMemoryCustody, C>, SnapshotError> {
    snapshot.verify()?;
    if snapshot.owner != *owner {
        return Err(SnapshotError::OwnerMismatch {
            expected: *owner,
            found: snapshot.owner,
        });
    }
    let ledger = Ledger::from_records(snapshot.records)?;
    let net = ledger.net_balance()?;
    custody
        .receive(owner, net)
        .map_err(CustodyError::TransferFailed)?;
    info!(%owner, records = ledger.count(), balance = %net, "Resuming custody from snapshot");
    Ok(CustodyController::with_ledger(*owner, ledger, custody, clock)?)
}
