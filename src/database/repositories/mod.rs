pub mod student_repository;

pub use student_repository::*;
