//! Correlation identifiers.
//!
//! Every piece of work done on behalf of one logical request shares a
//! single id: the outermost dispatch mints one and nested dispatches reuse
//! it. Inbound callers may hand one over instead (typically via an
//! `X-Correlation-Id` header), in which case it is parsed rather than
//! minted, so a trace can span process boundaries.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The id stitching together all work for one logical request.
///
/// Distinct from every other UUID-shaped id in the workspace on purpose;
/// the newtype keeps a correlation id from being handed somewhere an
/// entity key belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Mints a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

/// The supplied text was not a well-formed correlation id.
#[derive(Debug, Error)]
#[error("malformed correlation id: {0}")]
pub struct ParseCorrelationIdError(#[source] uuid::Error);

impl FromStr for CorrelationId {
    type Err = ParseCorrelationIdError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(text.trim())
            .map(Self)
            .map_err(ParseCorrelationIdError)
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<CorrelationId> for Uuid {
    fn from(id: CorrelationId) -> Self {
        id.0
    }
}
