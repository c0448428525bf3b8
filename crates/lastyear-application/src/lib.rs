// SPDX-License-Identifier: GPL-3.0-or-later

//! Release year resolution engine.
//!
//! [`ReleaseYearResolver`] drives the identifier pass and the fuzzy pass over a
//! listener's pending scrobbles; the lookups and normalization rules it builds
//! on are exposed for reuse.

pub mod fuzzy_lookup;
pub mod identifier_lookup;
pub mod normalize;
pub mod request;
pub mod resolution;

#[cfg(test)]
mod test_support;

pub use fuzzy_lookup::FuzzyLookup;
pub use identifier_lookup::IdentifierLookup;
pub use request::{RequestError, ResolveRequest, ResolveTarget};
pub use resolution::{ReleaseYearResolver, ResolutionError};
