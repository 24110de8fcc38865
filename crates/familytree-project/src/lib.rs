//! Everything that touches the filesystem: family documents, viewer
//! settings and the plain-text outline importer.

pub mod document;
pub mod error;
pub mod outline;
pub mod settings;

pub use document::{load_document, load_tree, parse_document, save_document};
pub use error::{LoadError, OutlineError, SettingsError};
pub use outline::{
    Discrepancy, OutlineImport, OutlineOptions, import_outline, import_outline_file,
    write_discrepancy_report,
};
pub use settings::ViewerSettings;
