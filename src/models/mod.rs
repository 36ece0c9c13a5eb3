pub mod catalog;
pub mod student;

pub use catalog::*;
pub use student::*;
