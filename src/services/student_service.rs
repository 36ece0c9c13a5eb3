use chrono::{Datelike, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use validator::{Validate, ValidationErrors};

use crate::{
    database::repositories::{StudentRepository, StudentRepositoryError},
    models::{
        catalog::{CatalogSubset, ClassRoster, Gender, PriceList},
        student::{StudentChanges, StudentFilter, StudentForm, StudentRecord},
    },
    services::{
        auth_service::{require_admin, AdminSession},
        purchase_service::calculate_purchase,
        query_service::{display_subset, query_students},
    },
    utils::config::Config,
};

pub const EMPTY_PURCHASE_MESSAGE: &str = "Select at least one item";

#[derive(Error, Debug)]
pub enum StudentServiceError {
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Admin login required")]
    Unauthorized,

    #[error("Student not found")]
    StudentNotFound,

    #[error("Repository error: {0}")]
    RepositoryError(#[from] StudentRepositoryError),
}

/// Everything a listing page needs.
#[derive(Debug, Clone, Serialize)]
pub struct StudentListing {
    pub items: PriceList,
    pub male_items: PriceList,
    pub female_items: PriceList,
    pub all_items: PriceList,
    pub classes: ClassRoster,
    pub students: Vec<StudentRecord>,
    pub students_by_class: IndexMap<String, Vec<StudentRecord>>,
    pub ordered_classes: Vec<String>,
    pub filter: StudentFilter,
    pub is_admin: bool,
    pub current_year: i32,
}

/// Everything an edit form needs.
#[derive(Debug, Clone, Serialize)]
pub struct StudentEditView {
    pub student: StudentRecord,
    pub male_items: PriceList,
    pub female_items: PriceList,
    pub all_items: PriceList,
    pub classes: ClassRoster,
}

pub struct StudentService {
    student_repository: Arc<dyn StudentRepository>,
    config: Arc<Config>,
}

impl StudentService {
    pub fn new(student_repository: Arc<dyn StudentRepository>, config: Arc<Config>) -> Self {
        Self {
            student_repository,
            config,
        }
    }

    /// Filtered and grouped view of every record. Open to anonymous visitors.
    pub async fn listing(
        &self,
        filter: StudentFilter,
        session: &AdminSession,
    ) -> Result<StudentListing, StudentServiceError> {
        let filter = filter.normalized();
        debug!("Listing students with filter: {:?}", filter);

        let students = self.student_repository.load_all().await?;
        let query = query_students(students, &filter, &self.config.classes);
        let catalog = &self.config.catalog;

        Ok(StudentListing {
            items: catalog.subset(display_subset(&filter)).clone(),
            male_items: catalog.male().clone(),
            female_items: catalog.female().clone(),
            all_items: catalog.all().clone(),
            classes: self.config.classes.clone(),
            students: query.students,
            students_by_class: query.students_by_class,
            ordered_classes: query.ordered_classes,
            filter,
            is_admin: session.is_admin(),
            current_year: Utc::now().year(),
        })
    }

    pub async fn edit_view(
        &self,
        session: &AdminSession,
        id: &str,
    ) -> Result<StudentEditView, StudentServiceError> {
        guard(session)?;
        let id = required_id(id)?;

        let student = self
            .student_repository
            .find_by_id(id)
            .await?
            .ok_or(StudentServiceError::StudentNotFound)?;
        let catalog = &self.config.catalog;

        Ok(StudentEditView {
            student,
            male_items: catalog.male().clone(),
            female_items: catalog.female().clone(),
            all_items: catalog.all().clone(),
            classes: self.config.classes.clone(),
        })
    }

    pub async fn add_student(
        &self,
        session: &AdminSession,
        form: StudentForm,
    ) -> Result<StudentRecord, StudentServiceError> {
        guard(session)?;
        info!("Adding student '{}' in class '{}'", form.name, form.class_name);

        let changes = self.build_changes(form)?;
        let student = self
            .student_repository
            .append(StudentRecord::new(changes))
            .await
            .map_err(|e| {
                error!("Failed to add student: {}", e);
                StudentServiceError::RepositoryError(e)
            })?;

        info!("Added student {} (total {})", student.id, student.total_paid);
        Ok(student)
    }

    pub async fn update_student(
        &self,
        session: &AdminSession,
        id: &str,
        form: StudentForm,
    ) -> Result<StudentRecord, StudentServiceError> {
        guard(session)?;
        let id = required_id(id)?;
        info!("Updating student {}", id);

        let changes = self.build_changes(form)?;
        let student = self
            .student_repository
            .update(id, changes)
            .await
            .map_err(|e| match e {
                StudentRepositoryError::NotFound => {
                    warn!("Student {} not found for update", id);
                    StudentServiceError::StudentNotFound
                }
                other => {
                    error!("Failed to update student {}: {}", id, other);
                    StudentServiceError::RepositoryError(other)
                }
            })?;

        info!("Updated student {}", student.id);
        Ok(student)
    }

    pub async fn delete_student(
        &self,
        session: &AdminSession,
        id: &str,
    ) -> Result<(), StudentServiceError> {
        guard(session)?;
        let id = required_id(id)?;
        info!("Deleting student {}", id);

        let deleted = self.student_repository.delete(id).await.map_err(|e| {
            error!("Failed to delete student {}: {}", id, e);
            StudentServiceError::RepositoryError(e)
        })?;

        if !deleted {
            warn!("Student {} not found for deletion", id);
            return Err(StudentServiceError::StudentNotFound);
        }

        info!("Deleted student {}", id);
        Ok(())
    }

    // Private helper methods

    /// Validates the form and prices it against the catalog the gender allows.
    fn build_changes(&self, form: StudentForm) -> Result<StudentChanges, StudentServiceError> {
        form.validate().map_err(|e| StudentServiceError::ValidationError {
            message: validation_message(&e),
        })?;
        let gender = form
            .parsed_gender()
            .ok_or_else(|| StudentServiceError::ValidationError {
                message: gender_message(),
            })?;

        let prices = self
            .config
            .catalog
            .subset(CatalogSubset::for_gender(gender));
        let purchase = calculate_purchase(prices, &form.quantities);

        if purchase.is_empty() {
            warn!("Rejected submission for '{}': no items selected", form.name);
            return Err(StudentServiceError::ValidationError {
                message: EMPTY_PURCHASE_MESSAGE.to_string(),
            });
        }

        Ok(StudentChanges {
            name: form.name,
            class_name: form.class_name,
            gender,
            purchases: purchase.lines,
            total_paid: purchase.total,
        })
    }
}

fn guard(session: &AdminSession) -> Result<(), StudentServiceError> {
    require_admin(session).map_err(|_| {
        warn!("Refused mutation from anonymous session");
        StudentServiceError::Unauthorized
    })
}

fn required_id(id: &str) -> Result<&str, StudentServiceError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(StudentServiceError::ValidationError {
            message: "Student id is required".to_string(),
        });
    }
    Ok(id)
}

fn gender_message() -> String {
    format!(
        "Gender must be {} or {}",
        Gender::MALE_LABEL,
        Gender::FEMALE_LABEL
    )
}

fn validation_message(errors: &ValidationErrors) -> String {
    let fields = errors.field_errors();
    if fields.contains_key("name") {
        "Student name is required".to_string()
    } else if fields.contains_key("gender") {
        gender_message()
    } else {
        errors.to_string()
    }
}
