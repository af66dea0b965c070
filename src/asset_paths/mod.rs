//! Helpers for naming artifacts and classifying source and stylesheet paths.
//!
//! The responsibilities are split into focused submodules so that cache-busted naming,
//! stylesheet URL classification and identifier expansion can be tested independently.

mod bundle;
mod filters;
mod glob;

pub use bundle::{HASH_PREFIX_LEN, asset_name, combined_target_path, leaf_target_path, short_hash};
pub use filters::should_ignore_url_reference;
pub use glob::{expand_source_identifier, is_glob};
