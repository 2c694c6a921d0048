//! Group sorting module.
//!
//! Relocates each analysed group into its own `similar_group_<n>_<size>_images`
//! folder.

mod executor;
mod types;

pub use executor::GroupSorter;
pub use types::*;
