pub mod logging;
pub mod paths;
pub mod terminal;

pub use logging::init_tracing;
pub use paths::{collect_transcripts, format_path_with_tilde, validate_file_size};
pub use terminal::{sanitize_cell, strip_ansi_codes};
