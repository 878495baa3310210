use thiserror::Error;

/// Errors raised by the engine and the position store.
///
/// Degenerate numeric states (zero collateral, zero debt) are never
/// errors; the engine degrades those to sentinel values instead. What
/// surfaces here is caller precondition violations plus arithmetic
/// that leaves `Decimal`'s representable range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("reference currency price must be greater than zero")]
    InvalidReferencePrice,

    #[error("quantity must not be negative")]
    NegativeQuantity,

    #[error("price must not be negative")]
    NegativePrice,

    #[error("no {kind} leg for asset {symbol}")]
    UnknownAsset { symbol: String, kind: &'static str },

    #[error("a {kind} leg for asset {symbol} already exists")]
    DuplicateLeg { symbol: String, kind: &'static str },

    #[error("asset {0} is not in the available asset catalog")]
    AssetNotInCatalog(String),

    #[error("derived value exceeds the representable decimal range")]
    ValueOutOfRange,
}
