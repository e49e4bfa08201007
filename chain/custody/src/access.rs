//! Single-owner access control
//!
//! The owner is fixed when the guard is built and has no setter. Restricted
//! operations call `OwnerGuard::authorize` once, at the top, and pass the
//! returned `OwnerCapability` to the code that moves value. A capability can
//! only be minted by `authorize`, so every outbound transfer path is
//! reachable only through the one check in this module.

use custody_types::ids::AccountId;
use tracing::warn;

use crate::errors::CustodyError;

/// Holds the owner identity and performs the authorization check.
#[derive(Debug, Clone)]
pub struct OwnerGuard {
    owner: AccountId,
}

impl OwnerGuard {
    /// Create a guard for `owner`. The null account cannot own custody.
    pub fn new(owner: AccountId) -> Result<Self, CustodyError> {
        if owner.is_nil() {
            return Err(CustodyError::InvalidOwner);
        }
        Ok(Self { owner })
    }

    /// Get the owner identifier.
    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    /// Check if a caller is the owner.
    pub fn is_owner(&self, caller: &AccountId) -> bool {
        *caller == self.owner
    }

    /// Mint a capability for `caller`, or fail with `Unauthorized`.
    pub fn authorize(&self, caller: &AccountId) -> Result<OwnerCapability, CustodyError> {
        if !self.is_owner(caller) {
            warn!(%caller, "Restricted operation refused: caller is not the owner");
            return Err(CustodyError::Unauthorized);
        }
        Ok(OwnerCapability { owner: self.owner })
    }
}

/// Proof that the current call was made by the owner.
///
/// Not `Clone`: a capability lives for the call that minted it.
#[derive(Debug)]
pub struct OwnerCapability {
    owner: AccountId,
}

impl OwnerCapability {
    /// The authorized owner.
    pub fn owner(&self) -> AccountId {
        self.owner
    }
}
