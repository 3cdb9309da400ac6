//! URL handling module for Botwatch
//!
//! This module turns free-form user input into an absolute URL and resolves
//! it, through redirects, into the canonical origin an audit runs against.

mod canonical;
mod normalize;

// Re-export main functions
pub use canonical::{canonicalize, Canonicalization};
pub use normalize::{normalize_input, split_origin};
