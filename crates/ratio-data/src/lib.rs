pub mod dataset;
pub mod loader;
pub mod schema;

pub use dataset::{Dataset, Plan, load_dataset, load_plan};
pub use loader::DataLoadError;

use std::path::PathBuf;

/// Directory of the vanilla dataset shipped with this crate.
pub fn vanilla_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join("vanilla")
}
