use crate::{Account, BoosterTier};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("transaction {0} was rejected by the ledger")]
    Rejected(String),
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// An on-chain booster purchase claimed by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoosterPurchaseClaim<'a> {
    pub transaction: &'a str,
    pub tier: BoosterTier,
    pub quantity: u32,
}

/// Capability boundary to the external ledger. A production implementation
/// talks to a chain node; none ships with this crate.
pub trait LedgerVerifier {
    fn verify_booster_purchase(
        &self,
        buyer: &Account,
        claim: &BoosterPurchaseClaim<'_>,
    ) -> Result<(), LedgerError>;
}

/// Test double that accepts every claim.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllVerifier;

impl LedgerVerifier for AcceptAllVerifier {
    fn verify_booster_purchase(
        &self,
        _buyer: &Account,
        _claim: &BoosterPurchaseClaim<'_>,
    ) -> Result<(), LedgerError> {
        Ok(())
    }
}
