//! Output placement of materialized documents
//!
//! Maps a document's title and hierarchy fragments onto a file under the output directory,
//! keeps those files unique within a run, and computes the relative links between them.

mod reservation;
mod resolve;
mod sanitize;

pub use reservation::{ensure_unique_path, PathReservations};
pub use resolve::{
    build_output_path, calculate_relative_path, components_under, document_filename,
    relative_path_between, DOCUMENT_EXTENSION,
};
pub use sanitize::{normalize_filename, sanitize_component};
