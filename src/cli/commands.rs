use anyhow::{Context, Result};
use console::{style, Emoji};
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    api,
    cli::args::{Args, Commands, GenderArg},
    database::{repositories::JsonStudentRepository, DataFile},
    models::{catalog::Gender, student::StudentFilter},
    services::{AdminSession, StudentService},
    utils::{
        config::Config,
        formatting::{format_class_heading, format_currency, format_student_table},
    },
};

static INFO: Emoji<'_, '_> = Emoji("ℹ️ ", "");
static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "");

pub struct CliApp {
    config: Config,
}

impl CliApp {
    pub fn new() -> Result<Self> {
        let config = Config::from_env().context("Failed to load configuration")?;
        Ok(Self { config })
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(mut self, args: Args) -> Result<()> {
        if let Some(data_file) = args.data_file {
            self.config.data_file = PathBuf::from(data_file);
        }

        match args.command {
            Commands::Serve { host, port } => self.handle_serve(host, port).await,
            Commands::Report {
                search,
                gender,
                name,
                class,
            } => {
                let filter = report_filter(search, gender, name, class);
                let output = self.render_report(filter).await?;
                println!("{}", output);
                Ok(())
            }
        }
    }

    async fn handle_serve(mut self, host: Option<String>, port: Option<u16>) -> Result<()> {
        if let Some(host) = host {
            self.config.host = host;
        }
        if let Some(port) = port {
            self.config.port = port;
        }

        println!(
            "{} {} on http://{}",
            ROCKET,
            style("Serving uniform ledger").bold().cyan(),
            self.config.listen_addr()
        );
        api::serve(Arc::new(self.config)).await
    }

    /// Read-only; the report never needs an admin session.
    pub async fn render_report(&self, filter: StudentFilter) -> Result<String> {
        let config = Arc::new(self.config.clone());
        let repository = Arc::new(JsonStudentRepository::new(DataFile::new(
            config.data_file.clone(),
        )));
        let service = StudentService::new(repository, config);

        let listing = service
            .listing(filter, &AdminSession::Anonymous)
            .await
            .context("Failed to load students")?;

        if listing.students.is_empty() {
            return Ok(format!("{} No students found", INFO));
        }

        let mut output = String::new();
        for class_name in &listing.ordered_classes {
            let students = &listing.students_by_class[class_name];
            output.push_str(&format_class_heading(class_name, students));
            output.push('\n');
            output.push_str(&format_student_table(students));
            output.push_str("\n\n");
        }

        let grand_total: u64 = listing.students.iter().map(|s| s.total_paid).sum();
        output.push_str(&format!(
            "{} {} students, {}",
            style("Total:").bold(),
            listing.students.len(),
            style(format_currency(grand_total)).green()
        ));

        Ok(output)
    }
}

fn report_filter(
    search: Option<String>,
    gender: Option<GenderArg>,
    name: Option<String>,
    class: Option<String>,
) -> StudentFilter {
    StudentFilter {
        search: search.unwrap_or_default(),
        gender: gender
            .map(|g| Gender::from(g).label().to_string())
            .unwrap_or_default(),
        name: name.unwrap_or_default(),
        class_name: class.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repositories::StudentRepository;
    use crate::models::student::{PurchaseLine, Purchases, StudentChanges, StudentRecord};
    use tempfile::TempDir;

    async fn seed(path: PathBuf) {
        let repo = JsonStudentRepository::new(DataFile::new(path));
        for (name, class_name, total) in [("Ari", "X RPL 2", 75_000), ("Sari", "X RPL 1", 20_000)] {
            let mut purchases = Purchases::new();
            purchases.insert(
                "Item".to_string(),
                PurchaseLine {
                    quantity: 1,
                    unit_price: total,
                    total,
                },
            );
            repo.append(StudentRecord::new(StudentChanges {
                name: name.to_string(),
                class_name: class_name.to_string(),
                gender: Gender::Male,
                purchases,
                total_paid: total,
            }))
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_report_orders_classes_by_roster() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("students.json");
        seed(path.clone()).await;

        let app = CliApp::with_config(Config {
            data_file: path,
            ..Config::default()
        });
        let report = app.render_report(StudentFilter::new()).await.unwrap();

        let rpl1 = report.find("X RPL 1").unwrap();
        let rpl2 = report.find("X RPL 2").unwrap();
        assert!(rpl1 < rpl2);
        assert!(report.contains("Rp95.000"));
    }

    #[tokio::test]
    async fn test_report_without_matches() {
        let dir = TempDir::new().unwrap();
        let app = CliApp::with_config(Config {
            data_file: dir.path().join("empty.json"),
            ..Config::default()
        });

        let report = app
            .render_report(report_filter(Some("nobody".to_string()), None, None, None))
            .await
            .unwrap();
        assert!(report.contains("No students found"));
    }

    #[test]
    fn test_report_filter_uses_gender_label() {
        let filter = report_filter(None, Some(GenderArg::Male), None, Some("RPL".to_string()));
        assert_eq!(filter.gender, "Laki-laki");
        assert_eq!(filter.class_name, "RPL");
    }
}
