pub mod data_file;
pub mod repositories;

pub use data_file::{DataFile, DataFileError};
