use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

mod db;
mod models;
mod report;
mod stats;

#[derive(Parser)]
#[command(name = "grade-tracker")]
#[command(about = "Student grade tracking and statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import grades from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Overall statistics across all grades
    Stats {
        /// How many top students to include
        #[arg(long, default_value_t = 5)]
        limit: usize,
        /// Emit the snapshot as JSON instead of a report
        #[arg(long)]
        json: bool,
    },
    /// Grade summary for a single student
    #[command(group(
        ArgGroup::new("who")
            .args(["id", "email"])
            .required(true)
            .multiple(false)
    ))]
    Student {
        #[arg(long)]
        id: Option<Uuid>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Export all grades to a CSV file
    Export {
        #[arg(long, default_value = "grades.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} grades from {}.", csv.display());
        }
        Commands::Stats { limit, json } => {
            let records = db::fetch_grades(&pool).await?;
            let students = db::fetch_student_directory(&pool).await?;
            let courses = db::fetch_course_directory(&pool).await?;
            let totals = db::fetch_totals(&pool).await?;

            let snapshot = stats::build_snapshot(&records, totals, &students, &courses, limit);
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print!("{}", report::build_report(&snapshot));
            }
        }
        Commands::Student { id, email } => {
            let Some((student_id, name)) =
                db::resolve_student(&pool, id, email.as_deref()).await?
            else {
                println!("No matching student.");
                return Ok(());
            };

            let records = db::fetch_grades(&pool).await?;
            let summary = stats::summarize_student(&records, student_id);

            println!("Summary for {name} ({student_id}):");
            match summary.average {
                Some(average) => {
                    println!("- Average: {average:.2}");
                    println!(
                        "- Highest: {:.1}, lowest: {:.1}",
                        summary.highest.unwrap_or_default(),
                        summary.lowest.unwrap_or_default()
                    );
                    println!(
                        "- {} grades: {} passing, {} failing",
                        summary.total_grades, summary.passing, summary.failing
                    );
                }
                None => println!("- No grades recorded."),
            }
        }
        Commands::Export { out } => {
            let records = db::fetch_grades(&pool).await?;
            let students = db::fetch_student_directory(&pool).await?;
            let courses = db::fetch_course_directory(&pool).await?;

            let csv = report::export_grades_csv(&records, &students, &courses)?;
            std::fs::write(&out, csv)?;
            println!("Exported {} grades to {}.", records.len(), out.display());
        }
    }

    Ok(())
}
