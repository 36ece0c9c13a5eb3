use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Item name to unit price, in catalog order.
pub type PriceList = IndexMap<String, u64>;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    #[serde(rename = "Laki-laki")]
    Male,
    #[serde(rename = "Perempuan")]
    Female,
}

impl Gender {
    pub const MALE_LABEL: &'static str = "Laki-laki";
    pub const FEMALE_LABEL: &'static str = "Perempuan";

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => Self::MALE_LABEL,
            Gender::Female => Self::FEMALE_LABEL,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            Self::MALE_LABEL => Some(Gender::Male),
            Self::FEMALE_LABEL => Some(Gender::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSubset {
    Male,
    Female,
    All,
}

impl CatalogSubset {
    /// Male records may only buy from the male list; everyone else sees everything.
    pub fn for_gender(gender: Gender) -> Self {
        match gender {
            Gender::Male => CatalogSubset::Male,
            Gender::Female => CatalogSubset::All,
        }
    }

    /// Same rule applied to a raw filter value. Anything that is not the male
    /// label, including an empty filter, selects the full catalog.
    pub fn for_gender_label(label: &str) -> Self {
        match Gender::from_label(label) {
            Some(Gender::Male) => CatalogSubset::Male,
            _ => CatalogSubset::All,
        }
    }
}

/// Immutable price catalog. `all` is derived once at construction.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    male: PriceList,
    female: PriceList,
    all: PriceList,
}

impl Catalog {
    /// Builds the catalog and its union. The union keeps male items first, then
    /// female items; a female entry overrides the price of a male entry with the
    /// same name but keeps the male entry's position.
    pub fn new(male: PriceList, female: PriceList) -> Self {
        let mut all = male.clone();
        for (item, price) in &female {
            all.insert(item.clone(), *price);
        }

        Self { male, female, all }
    }

    pub fn male(&self) -> &PriceList {
        &self.male
    }

    pub fn female(&self) -> &PriceList {
        &self.female
    }

    pub fn all(&self) -> &PriceList {
        &self.all
    }

    pub fn subset(&self, subset: CatalogSubset) -> &PriceList {
        match subset {
            CatalogSubset::Male => &self.male,
            CatalogSubset::Female => &self.female,
            CatalogSubset::All => &self.all,
        }
    }

    /// `None` means the item cannot be bought in this context, never a zero price.
    pub fn price(&self, subset: CatalogSubset, item: &str) -> Option<u64> {
        self.subset(subset).get(item).copied()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let male = price_list(&[
            ("Baju Seragam Abu-abu", 75_000),
            ("Baju Seragam Pramuka", 90_000),
            ("Baju Seragam Khas", 85_000),
            ("Baju Seragam Olahraga", 80_000),
            ("Kain Bawahan Hitam", 65_000),
            ("Kain Bawahan Batik", 65_000),
            ("Jas Almamater", 120_000),
            ("Dasi Hitam", 20_000),
            ("Dasi Abu-Abu", 20_000),
            ("Topi Abu-Abu", 15_000),
            ("Topi Merah", 15_000),
            ("Ikat Pinggang / Sabuk", 20_000),
            ("Nama Dada (ND)", 15_000),
            ("Bed Osis", 30_000),
            ("Bed Jurusan", 30_000),
            ("Bed Bendera", 30_000),
            ("Bed Bowolaksono", 30_000),
            ("Kaos Kaki Hitam", 10_000),
            ("Kaos Kaki Putih", 10_000),
        ]);
        let female = price_list(&[
            ("Jilbab Putih", 20_000),
            ("Jilbab Coklat", 20_000),
            ("Jilbab Batik", 25_000),
            ("Jilbab Khas", 25_000),
            ("Jilbab Hitam", 20_000),
        ]);

        Self::new(male, female)
    }
}

pub fn price_list(entries: &[(&str, u64)]) -> PriceList {
    entries
        .iter()
        .map(|(item, price)| (item.to_string(), *price))
        .collect()
}

/// Fixed class ordering used when presenting records grouped by class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ClassRoster(Vec<String>);

impl ClassRoster {
    pub fn new(classes: Vec<String>) -> Self {
        Self(classes)
    }

    pub fn classes(&self) -> &[String] {
        &self.0
    }

    pub fn position(&self, class_name: &str) -> Option<usize> {
        self.0.iter().position(|c| c == class_name)
    }

    /// Sort key: roster index, or one past the end for unknown classes.
    pub fn rank(&self, class_name: &str) -> usize {
        self.position(class_name).unwrap_or(self.0.len())
    }
}

impl Default for ClassRoster {
    fn default() -> Self {
        Self(
            [
                "X RPL 1", "X RPL 2", "X MP 1", "X MP 2", "X MP 3", "X BD 1", "X BD 2",
                "X BD 3", "X BD 4", "X LP 1", "X LP 2", "X LP 3", "X AK 1", "X AK 2",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        )
    }
}
