use clap::{Parser, Subcommand, ValueEnum};
use std::fmt;

use crate::models::catalog::Gender;

#[derive(Parser)]
#[command(name = "uniform-ledger")]
#[command(about = "School uniform purchase records with an admin-gated web interface")]
#[command(version = "0.1.0")]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Student data file (overrides DATA_FILE)
    #[arg(short, long, global = true)]
    pub data_file: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web server
    Serve {
        /// Listen host (overrides HOST)
        #[arg(long)]
        host: Option<String>,
        /// Listen port (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print students grouped by class
    Report {
        /// Search keyword matched against student names
        #[arg(long)]
        search: Option<String>,
        /// Filter by gender
        #[arg(short, long)]
        gender: Option<GenderArg>,
        /// Filter by name
        #[arg(short, long)]
        name: Option<String>,
        /// Filter by class
        #[arg(short, long)]
        class: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum GenderArg {
    Male,
    Female,
}

impl From<GenderArg> for Gender {
    fn from(arg: GenderArg) -> Self {
        match arg {
            GenderArg::Male => Gender::Male,
            GenderArg::Female => Gender::Female,
        }
    }
}

impl fmt::Display for GenderArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenderArg::Male => write!(f, "male"),
            GenderArg::Female => write!(f, "female"),
        }
    }
}
