//! Request canonicalization and HMAC signing.

mod canonical;
mod signer;

pub use canonical::*;
pub use signer::*;
