//! Configuration module
//!
//! Loads and validates ERA5 workflow configuration files and exposes the
//! immutable [`Configuration`] handed to the retrieval and postprocessing
//! collaborators.

pub mod loader;
pub mod overrides;
pub mod paths;
pub mod schema;
pub mod summary;
pub mod table;
pub mod validation;

pub use loader::{ConfigLoader, LoadResult, LoadWarning, LoaderOptions};
pub use overrides::Overrides;
pub use paths::check_directories;
pub use schema::*;
pub use validation::{ValidationResult, Validator};
