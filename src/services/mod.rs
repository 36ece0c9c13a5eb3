pub mod auth_service;
pub mod purchase_service;
pub mod query_service;
pub mod student_service;

pub use auth_service::*;
pub use purchase_service::*;
pub use query_service::*;
pub use student_service::*;
