use indexmap::IndexMap;
use serde::Serialize;

use crate::models::{
    catalog::{CatalogSubset, ClassRoster},
    student::{StudentFilter, StudentRecord},
};

/// Filtered records, grouped by class, plus the display order of the groups.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StudentQuery {
    pub students: Vec<StudentRecord>,
    pub students_by_class: IndexMap<String, Vec<StudentRecord>>,
    pub ordered_classes: Vec<String>,
}

/// Applies `filter` (already normalized) and groups the survivors by class.
/// Record order inside the flat list and inside each group is the collection
/// order. Groups are ordered by roster position; classes missing from the
/// roster go last in order of first appearance.
pub fn query_students(
    students: Vec<StudentRecord>,
    filter: &StudentFilter,
    roster: &ClassRoster,
) -> StudentQuery {
    let students: Vec<StudentRecord> = students
        .into_iter()
        .filter(|s| filter.matches(s))
        .collect();

    let mut students_by_class: IndexMap<String, Vec<StudentRecord>> = IndexMap::new();
    for student in &students {
        students_by_class
            .entry(student.class_name.clone())
            .or_default()
            .push(student.clone());
    }

    let ordered_classes = order_classes(students_by_class.keys(), roster);

    StudentQuery {
        students,
        students_by_class,
        ordered_classes,
    }
}

pub fn order_classes<'a>(
    classes: impl IntoIterator<Item = &'a String>,
    roster: &ClassRoster,
) -> Vec<String> {
    let mut ordered: Vec<String> = classes.into_iter().cloned().collect();
    // sort_by_key is stable
    ordered.sort_by_key(|c| roster.rank(c));
    ordered
}

/// Which catalog a listing shows for the active gender filter.
pub fn display_subset(filter: &StudentFilter) -> CatalogSubset {
    CatalogSubset::for_gender_label(&filter.gender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        catalog::Gender,
        student::{Purchases, StudentChanges},
    };

    fn student(name: &str, class_name: &str, gender: Gender) -> StudentRecord {
        StudentRecord::new(StudentChanges {
            name: name.to_string(),
            class_name: class_name.to_string(),
            gender,
            purchases: Purchases::new(),
            total_paid: 0,
        })
    }

    fn roster(classes: &[&str]) -> ClassRoster {
        ClassRoster::new(classes.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn test_class_order_follows_roster_unknown_last() {
        let students = vec![
            student("a", "C", Gender::Male),
            student("b", "Z", Gender::Male),
            student("c", "B", Gender::Female),
        ];

        let result = query_students(students, &StudentFilter::new(), &roster(&["A", "B", "C"]));
        assert_eq!(result.ordered_classes, vec!["B", "C", "Z"]);
    }

    #[test]
    fn test_unknown_classes_keep_first_appearance_order() {
        let students = vec![
            student("a", "Q", Gender::Male),
            student("b", "A", Gender::Male),
            student("c", "P", Gender::Male),
            student("d", "Q", Gender::Male),
        ];

        let result = query_students(students, &StudentFilter::new(), &roster(&["A"]));
        assert_eq!(result.ordered_classes, vec!["A", "Q", "P"]);
    }

    #[test]
    fn test_grouping_partitions_filtered_records() {
        let students = vec![
            student("Ari", "X RPL 1", Gender::Male),
            student("Budi", "X RPL 2", Gender::Male),
            student("Citra", "X RPL 1", Gender::Female),
            student("Dodi", "X AK 1", Gender::Male),
        ];
        let filter = StudentFilter::new().with_gender(Gender::Male).normalized();

        let result = query_students(students, &filter, &ClassRoster::default());

        let names: Vec<&str> = result.students.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ari", "Budi", "Dodi"]);

        let grouped: usize = result.students_by_class.values().map(|g| g.len()).sum();
        assert_eq!(grouped, result.students.len());
        for (class_name, group) in &result.students_by_class {
            assert!(group.iter().all(|s| &s.class_name == class_name));
        }
        assert_eq!(result.ordered_classes, vec!["X RPL 1", "X RPL 2", "X AK 1"]);
    }

    #[test]
    fn test_group_preserves_collection_order() {
        let students = vec![
            student("Zed", "X MP 1", Gender::Male),
            student("Amy", "X MP 1", Gender::Female),
        ];

        let result = query_students(students, &StudentFilter::new(), &ClassRoster::default());
        let group: Vec<&str> = result.students_by_class["X MP 1"]
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(group, vec!["Zed", "Amy"]);
    }

    #[test]
    fn test_class_filter_is_case_insensitive_substring() {
        let students = vec![
            student("a", "X RPL 1", Gender::Male),
            student("b", "X BD 1", Gender::Male),
        ];
        let filter = StudentFilter::new().with_class("Rpl").normalized();

        let result = query_students(students, &filter, &ClassRoster::default());
        assert_eq!(result.students.len(), 1);
        assert_eq!(result.students[0].class_name, "X RPL 1");
    }

    #[test]
    fn test_no_match_yields_empty_result() {
        let students = vec![student("Ari", "X RPL 1", Gender::Male)];
        let filter = StudentFilter::new().with_name("zzz").normalized();

        let result = query_students(students, &filter, &ClassRoster::default());
        assert_eq!(result, StudentQuery::default());
    }

    #[test]
    fn test_display_subset_tracks_gender_filter() {
        let male = StudentFilter::new().with_gender(Gender::Male);
        let female = StudentFilter::new().with_gender(Gender::Female);

        assert_eq!(display_subset(&male), CatalogSubset::Male);
        assert_eq!(display_subset(&female), CatalogSubset::All);
        assert_eq!(display_subset(&StudentFilter::new()), CatalogSubset::All);
    }
}
