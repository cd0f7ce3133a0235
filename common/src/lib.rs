pub mod file_format;
pub mod log_setup;
pub mod test_utils;

pub use file_format::{FileExtensionError, FileFormat, load_from_file, save_to_file};
pub use log_setup::{LogConfig, setup_logging};
