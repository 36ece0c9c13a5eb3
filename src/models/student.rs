use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::catalog::Gender;

pub const NAME_FIELD: &str = "nama";
pub const CLASS_FIELD: &str = "kelas";
pub const GENDER_FIELD: &str = "jenis_kelamin";

/// One purchased item. Only lines with a positive quantity are ever stored.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PurchaseLine {
    #[serde(rename = "jumlah")]
    pub quantity: u64,
    #[serde(rename = "harga_satuan")]
    pub unit_price: u64,
    pub total: u64,
}

/// Item name to purchase line, in catalog order.
pub type Purchases = IndexMap<String, PurchaseLine>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    pub id: String,
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "kelas")]
    pub class_name: String,
    #[serde(rename = "jenis_kelamin")]
    pub gender: Gender,
    #[serde(rename = "pembelian")]
    pub purchases: Purchases,
    #[serde(rename = "total_bayar")]
    pub total_paid: u64,
}

/// Every replaceable field of a record. Built by the student service once
/// the purchase has been computed; the id is never part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentChanges {
    pub name: String,
    pub class_name: String,
    pub gender: Gender,
    pub purchases: Purchases,
    pub total_paid: u64,
}

impl StudentRecord {
    pub fn new(changes: StudentChanges) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: changes.name,
            class_name: changes.class_name,
            gender: changes.gender,
            purchases: changes.purchases,
            total_paid: changes.total_paid,
        }
    }

    /// Replaces everything except the id.
    pub fn apply(&mut self, changes: StudentChanges) {
        self.name = changes.name;
        self.class_name = changes.class_name;
        self.gender = changes.gender;
        self.purchases = changes.purchases;
        self.total_paid = changes.total_paid;
    }
}

// request dto
#[derive(Debug, Clone, Validate)]
pub struct StudentForm {
    #[validate(length(min = 1, message = "Student name is required"))]
    pub name: String,

    pub class_name: String,

    #[validate(custom = "validate_gender_label")]
    pub gender: String,

    /// Raw quantity per item name, exactly as submitted.
    pub quantities: HashMap<String, String>,
}

fn validate_gender_label(label: &str) -> Result<(), ValidationError> {
    if Gender::from_label(label).is_none() {
        return Err(ValidationError::new("unknown_gender"));
    }
    Ok(())
}

impl StudentForm {
    /// Splits submitted form fields into the record fields and the item
    /// quantities. The name is trimmed; missing fields become empty.
    pub fn from_fields(fields: HashMap<String, String>) -> Self {
        let name = fields
            .get(NAME_FIELD)
            .map(|n| n.trim().to_string())
            .unwrap_or_default();
        let class_name = fields.get(CLASS_FIELD).cloned().unwrap_or_default();
        let gender = fields.get(GENDER_FIELD).cloned().unwrap_or_default();

        Self {
            name,
            class_name,
            gender,
            quantities: fields,
        }
    }

    pub fn parsed_gender(&self) -> Option<Gender> {
        Gender::from_label(&self.gender)
    }
}

/// Listing filters. Empty values are inactive; all active filters must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentFilter {
    #[serde(default)]
    pub search: String,
    #[serde(default, rename = "jenis_kelamin")]
    pub gender: String,
    #[serde(default, rename = "nama")]
    pub name: String,
    #[serde(default, rename = "kelas")]
    pub class_name: String,
}

impl StudentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowercases the free-text filters. Gender stays an exact label match.
    pub fn normalized(self) -> Self {
        Self {
            search: self.search.to_lowercase(),
            gender: self.gender,
            name: self.name.to_lowercase(),
            class_name: self.class_name.to_lowercase(),
        }
    }

    pub fn with_search(mut self, term: &str) -> Self {
        self.search = term.to_string();
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender.label().to_string();
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_class(mut self, class_name: &str) -> Self {
        self.class_name = class_name.to_string();
        self
    }

    /// Expects a normalized filter.
    pub fn matches(&self, student: &StudentRecord) -> bool {
        let name = student.name.to_lowercase();

        (self.search.is_empty() || name.contains(&self.search))
            && (self.gender.is_empty() || student.gender.label() == self.gender)
            && (self.name.is_empty() || name.contains(&self.name))
            && (self.class_name.is_empty()
                || student.class_name.to_lowercase().contains(&self.class_name))
    }
}
