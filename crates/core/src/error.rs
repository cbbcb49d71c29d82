use crate::{DropError, StoreError};

/// Coarse classification shared by every service error, for mapping onto
/// user-facing responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    InsufficientFunds,
    CatalogExhausted,
    NotFound,
    Conflict,
    Unverified,
    Internal,
}

impl ErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::InsufficientFunds => 402,
            Self::Unverified => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::CatalogExhausted | Self::Internal => 500,
        }
    }
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountNotFound(_) | Self::CardNotFound(_) => ErrorKind::NotFound,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::NoBoosters(_)
            | Self::FreePlayUsed
            | Self::NotListed(_)
            | Self::NotOwner(_)
            | Self::SelfPurchase
            | Self::TransactionRedeemed(_) => ErrorKind::Conflict,
            Self::Overflow => ErrorKind::Internal,
        }
    }
}

impl DropError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCount => ErrorKind::InvalidInput,
            Self::CatalogExhausted(_) => ErrorKind::CatalogExhausted,
        }
    }
}
