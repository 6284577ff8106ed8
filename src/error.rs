//! Crate-wide error taxonomy.
//!
//! Search outcomes (found / not found / out of zone) are carried as part of
//! dedicated result types instead of through `Error` — they are not failures,
//! they're answers. See [`crate::zone::FindResult`] and
//! [`crate::zone::Nsec3FindResult`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    BadArg(&'static str),

    #[error("name or node is out of zone")]
    OutOfZone,

    #[error("owner name already present in the zone")]
    Duplicate,

    #[error("wire buffer too small for this write")]
    NoSpace,

    #[error("malformed DNS message: {0}")]
    Malformed(&'static str),

    #[error("section declares more records than remain in the wire buffer")]
    FewData,

    #[error("NSEC3 hashing requested but the zone has no NSEC3PARAM")]
    NoNsec3Params,

    #[error("cryptographic operation failed: {0}")]
    Crypto(&'static str),

    #[error("allocator returned no memory")]
    NoMem,
}
