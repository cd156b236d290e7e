//! Cache key derivation
//!
//! A key is the JSON encoding of the call's argument value. Pass several
//! arguments as a tuple and none as `()`.
//!
//! Structurally equal arguments always produce the same key. Arguments whose
//! serialization is not deterministic, such as `HashMap` with more than one
//! entry, may produce different keys for equal values; use `BTreeMap` or a
//! sorted `Vec` instead.

use crate::cache::types::CacheKey;
use crate::error::Result;
use serde::Serialize;

/// Serialize call arguments into a cache key
pub fn derive_key<A>(args: &A) -> Result<CacheKey>
where
    A: Serialize + ?Sized,
{
    Ok(serde_json::to_string(args)?)
}
