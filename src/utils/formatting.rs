use console::style;
use tabled::{settings::{Alignment, Style}, Table, Tabled};

use crate::models::student::{Purchases, StudentRecord};

#[derive(Tabled)]
struct StudentTableRow {
    #[tabled(rename = "No")]
    number: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Gender")]
    gender: String,
    #[tabled(rename = "Items")]
    items: String,
    #[tabled(rename = "Total")]
    total: String,
}

/// Rupiah with dot thousands separators: `Rp1.250.000`.
pub fn format_currency(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    format!("Rp{}", grouped)
}

pub fn format_purchases(purchases: &Purchases) -> String {
    purchases
        .iter()
        .map(|(item, line)| format!("{} x{}", item, line.quantity))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_student_table(students: &[StudentRecord]) -> String {
    if students.is_empty() {
        return String::new();
    }

    let rows: Vec<StudentTableRow> = students
        .iter()
        .enumerate()
        .map(|(i, student)| StudentTableRow {
            number: i + 1,
            name: student.name.clone(),
            gender: student.gender.to_string(),
            items: format_purchases(&student.purchases),
            total: format_currency(student.total_paid),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded()).with(Alignment::left());

    table.to_string()
}

pub fn format_class_heading(class_name: &str, students: &[StudentRecord]) -> String {
    let total: u64 = students.iter().map(|s| s.total_paid).sum();
    format!(
        "{} {} ({} students, {})",
        style("Class").bold(),
        style(class_name).bold().cyan(),
        students.len(),
        style(format_currency(total)).green()
    )
}
