use async_trait::async_trait;
use thiserror::Error;

use crate::database::data_file::{DataFile, DataFileError};
use crate::models::student::{StudentChanges, StudentRecord};

#[derive(Error, Debug)]
pub enum StudentRepositoryError {
    #[error("Student not found")]
    NotFound,
    #[error("Data file error: {0}")]
    DataFileError(#[from] DataFileError),
}

/// Student record repository trait for data access operations.
///
/// Mutations are read-modify-write over the whole collection with no
/// isolation between callers: the last save wins.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn load_all(&self) -> Result<Vec<StudentRecord>, StudentRepositoryError>;
    async fn save_all(&self, students: &[StudentRecord]) -> Result<(), StudentRepositoryError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<StudentRecord>, StudentRepositoryError>;
    async fn append(&self, student: StudentRecord) -> Result<StudentRecord, StudentRepositoryError>;
    async fn update(
        &self,
        id: &str,
        changes: StudentChanges,
    ) -> Result<StudentRecord, StudentRepositoryError>;
    async fn delete(&self, id: &str) -> Result<bool, StudentRepositoryError>;
}

/// JSON file implementation of StudentRepository
pub struct JsonStudentRepository {
    file: DataFile,
}

impl JsonStudentRepository {
    pub fn new(file: DataFile) -> Self {
        Self { file }
    }

    pub fn data_file(&self) -> &DataFile {
        &self.file
    }
}

#[async_trait]
impl StudentRepository for JsonStudentRepository {
    async fn load_all(&self) -> Result<Vec<StudentRecord>, StudentRepositoryError> {
        let students = self.file.read_all().await.map_err(|e| {
            tracing::error!("Failed to load students: {}", e);
            StudentRepositoryError::DataFileError(e)
        })?;
        Ok(students)
    }

    async fn save_all(&self, students: &[StudentRecord]) -> Result<(), StudentRepositoryError> {
        self.file.write_all(students).await.map_err(|e| {
            tracing::error!("Failed to save students: {}", e);
            StudentRepositoryError::DataFileError(e)
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<StudentRecord>, StudentRepositoryError> {
        let student = self.load_all().await?.into_iter().find(|s| s.id == id);
        Ok(student)
    }

    async fn append(&self, student: StudentRecord) -> Result<StudentRecord, StudentRepositoryError> {
        let mut students = self.load_all().await?;
        students.push(student.clone());
        self.save_all(&students).await?;
        Ok(student)
    }

    async fn update(
        &self,
        id: &str,
        changes: StudentChanges,
    ) -> Result<StudentRecord, StudentRepositoryError> {
        let mut students = self.load_all().await?;

        let student = students
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StudentRepositoryError::NotFound)?;
        student.apply(changes);
        let updated = student.clone();

        self.save_all(&students).await?;
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<bool, StudentRepositoryError> {
        let mut students = self.load_all().await?;
        let before = students.len();
        students.retain(|s| s.id != id);

        if students.len() == before {
            return Ok(false);
        }

        self.save_all(&students).await?;
        Ok(true)
    }
}
