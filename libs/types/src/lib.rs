//! Types library for the custodial ledger
//!
//! Identifier and amount types shared by the ledger store, the custody
//! controller and the host collaborators.
//!
//! # Modules
//! - `ids`: Account identifiers (`AccountId`), including the nil identifier
//! - `numeric`: Native-unit amounts (`Amount`)

pub mod ids;
pub mod numeric;
