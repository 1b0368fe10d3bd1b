use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use tracing::debug;

use crate::application::{LedgerService, MonthlyView, RecognitionInput};
use crate::domain::{
    categories_by_amount, days_in_order, format_won, CategoryAnalysisMap, DailyTransactionsMap,
    FinancialRecord, MonthlySummary, YearMonth,
};

/// Duet - Couple Finance Ledger
#[derive(Parser)]
#[command(name = "duet")]
#[command(about = "A local-first ledger that merges two partners' monthly finances")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "duet.db", env = "DUET_DATABASE")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// User profile commands
    #[command(subcommand)]
    User(UserCommands),

    /// Couple pairing commands
    #[command(subcommand)]
    Couple(CoupleCommands),

    /// Monthly record commands
    #[command(subcommand)]
    Record(RecordCommands),

    /// Show the couple's combined month
    View {
        /// User name (either partner)
        user: String,

        #[arg(long)]
        year: i32,

        #[arg(long)]
        month: u32,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// List months with data for the couple
    Months {
        /// User name (either partner)
        user: String,
    },

    /// Export the couple's combined month
    Export {
        /// User name (either partner)
        user: String,

        /// What to export: daily, categories, json
        export_type: String,

        #[arg(long)]
        year: i32,

        #[arg(long)]
        month: u32,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Add a user
    Add {
        /// User name (must be unique)
        name: String,

        /// Avatar image URL
        #[arg(long)]
        avatar_url: Option<String>,
    },

    /// List all users
    List,

    /// Show a user's profile and pairing
    Show {
        /// User name
        name: String,
    },

    /// Update a user's profile
    Update {
        /// User name
        name: String,

        /// New name
        #[arg(long)]
        rename: Option<String>,

        /// New avatar image URL
        #[arg(long)]
        avatar_url: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CoupleCommands {
    /// Pair two users
    Link {
        /// User name
        name: String,

        /// Partner's user name
        partner: String,
    },

    /// Show a user's pairing
    Status {
        /// User name
        name: String,
    },

    /// Dissolve a user's pairing (records are kept)
    Unlink {
        /// User name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum RecordCommands {
    /// Import a ledger JSON file as a user's month
    Import {
        /// User name
        user: String,

        /// Ledger file (summary, dailyTransactions, categoryAnalysis, ...)
        file: String,

        #[arg(long)]
        year: i32,

        #[arg(long)]
        month: u32,

        /// Reference to a source screenshot (repeatable)
        #[arg(long = "image")]
        images: Vec<String>,
    },

    /// Store a month from screenshot-recognition output
    Recognize {
        /// User name
        user: String,

        /// Calendar screen recognition JSON
        #[arg(long)]
        calendar: Option<String>,

        /// Spending analysis screen recognition JSON
        #[arg(long)]
        analysis: Option<String>,

        /// Year to use if the screenshots don't show one
        #[arg(long)]
        year: Option<i32>,

        /// Month to use if the screenshots don't show one
        #[arg(long)]
        month: Option<u32>,

        /// Recognition method recorded with the ledger
        #[arg(long, default_value = "gpt-vision")]
        method: String,

        /// Reference to a source screenshot (repeatable)
        #[arg(long = "image")]
        images: Vec<String>,
    },

    /// List a user's months
    List {
        /// User name
        user: String,
    },

    /// Show one of a user's months
    Show {
        /// User name
        user: String,

        #[arg(long)]
        year: i32,

        #[arg(long)]
        month: u32,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Delete one of a user's months
    Delete {
        /// User name
        user: String,

        #[arg(long)]
        year: i32,

        #[arg(long)]
        month: u32,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        debug!(database = %self.database, "dispatching command");

        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::User(user_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_user_command(&service, user_cmd).await?;
            }

            Commands::Couple(couple_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_couple_command(&service, couple_cmd).await?;
            }

            Commands::Record(record_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_record_command(&service, record_cmd).await?;
            }

            Commands::View {
                user,
                year,
                month,
                format,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let view = service.monthly_view(&user, year, month).await?;

                match format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&view)?),
                    _ => print_view(&view),
                }
            }

            Commands::Months { user } => {
                let service = LedgerService::connect(&self.database).await?;
                let months = service.available_months(&user).await?;

                if months.available_months.is_empty() {
                    println!("No months with data.");
                } else {
                    for month in &months.available_months {
                        println!("{}", month);
                    }
                }
            }

            Commands::Export {
                user,
                export_type,
                year,
                month,
                output,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                run_export_command(&service, &user, &export_type, year, month, output.as_deref())
                    .await?;
            }
        }

        Ok(())
    }
}

async fn run_user_command(service: &LedgerService, cmd: UserCommands) -> Result<()> {
    match cmd {
        UserCommands::Add { name, avatar_url } => {
            let user = service.create_user(name, avatar_url).await?;
            println!("Added user: {} ({})", user.name, user.id);
        }

        UserCommands::List => {
            let users = service.list_users().await?;
            if users.is_empty() {
                println!("No users found.");
            } else {
                println!("{:<20} {:<38} {:<10}", "NAME", "ID", "CREATED");
                println!("{}", "-".repeat(70));
                for user in users {
                    println!(
                        "{:<20} {:<38} {:<10}",
                        truncate(&user.name, 20),
                        user.id,
                        user.created_at.format("%Y-%m-%d")
                    );
                }
            }
        }

        UserCommands::Show { name } => {
            let status = service.couple_status(&name).await?;
            let user = &status.user;

            println!("User: {}", user.name);
            println!("  ID:       {}", user.id);
            if let Some(url) = &user.avatar_url {
                println!("  Avatar:   {}", url);
            }
            println!("  Created:  {}", user.created_at.format("%Y-%m-%d %H:%M:%S"));
            match &status.partner {
                Some(partner) => println!("  Partner:  {}", partner.name),
                None => println!("  Partner:  (none)"),
            }

            let records = service.list_records(&name).await?;
            println!("  Months:   {}", records.len());
        }

        UserCommands::Update {
            name,
            rename,
            avatar_url,
        } => {
            if rename.is_none() && avatar_url.is_none() {
                anyhow::bail!("Nothing to update. Use --rename and/or --avatar-url");
            }
            let user = service.update_profile(&name, rename, avatar_url).await?;
            println!("Updated user: {}", user.name);
        }
    }
    Ok(())
}

async fn run_couple_command(service: &LedgerService, cmd: CoupleCommands) -> Result<()> {
    match cmd {
        CoupleCommands::Link { name, partner } => {
            service.link_couple(&name, &partner).await?;
            println!("Linked couple: {} & {}", name, partner);
        }

        CoupleCommands::Status { name } => {
            let status = service.couple_status(&name).await?;
            match (&status.couple, &status.partner) {
                (Some(couple), Some(partner)) => {
                    println!("{} is connected", status.user.name);
                    println!("  Partner:   {}", partner.name);
                    if let Some(url) = &partner.avatar_url {
                        println!("  Avatar:    {}", url);
                    }
                    println!(
                        "  Connected: {}",
                        couple.connected_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
                _ => println!("{} is not connected", status.user.name),
            }
        }

        CoupleCommands::Unlink { name } => {
            service.unlink_couple(&name).await?;
            println!("Unlinked couple of {}", name);
        }
    }
    Ok(())
}

async fn run_record_command(service: &LedgerService, cmd: RecordCommands) -> Result<()> {
    use crate::io::Importer;

    let importer = Importer::new(service);

    match cmd {
        RecordCommands::Import {
            user,
            file,
            year,
            month,
            images,
        } => {
            let period = YearMonth::new(year, month)?;
            let reader =
                File::open(&file).with_context(|| format!("Failed to open ledger file: {}", file))?;
            let record = importer
                .import_financial_data(&user, period, reader, images)
                .await?;
            println!("Saved {} for {} ({})", record.period, user, record.id);
        }

        RecordCommands::Recognize {
            user,
            calendar,
            analysis,
            year,
            month,
            method,
            images,
        } => {
            if calendar.is_none() && analysis.is_none() {
                anyhow::bail!("Provide --calendar and/or --analysis");
            }

            let calendar = calendar
                .map(|path| {
                    File::open(&path)
                        .with_context(|| format!("Failed to open calendar file: {}", path))
                })
                .transpose()?;
            let analysis = analysis
                .map(|path| {
                    File::open(&path)
                        .with_context(|| format!("Failed to open analysis file: {}", path))
                })
                .transpose()?;

            let input = RecognitionInput {
                fallback_year: year,
                fallback_month: month,
                recognition_method: method,
                image_urls: images,
                ..Default::default()
            };

            let record = importer
                .import_recognition(&user, calendar, analysis, input)
                .await?;
            println!("Saved {} for {} ({})", record.period, user, record.id);
            print_summary(&record.data.summary);
        }

        RecordCommands::List { user } => {
            let records = service.list_records(&user).await?;
            if records.is_empty() {
                println!("No records found.");
            } else {
                println!(
                    "{:<8} {:>15} {:>15} {:>15} {:<20}",
                    "MONTH", "INCOME", "EXPENSE", "NET", "UPDATED"
                );
                println!("{}", "-".repeat(76));
                for record in records {
                    let summary = &record.data.summary;
                    println!(
                        "{:<8} {:>15} {:>15} {:>15} {:<20}",
                        record.period,
                        format_won(summary.total_income),
                        format_won(summary.total_expense),
                        format_won(summary.net_income),
                        record.updated_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }

        RecordCommands::Show {
            user,
            year,
            month,
            format,
        } => {
            let period = YearMonth::new(year, month)?;
            let record = service.get_record(&user, period).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&record)?),
                _ => print_record(&user, &record),
            }
        }

        RecordCommands::Delete { user, year, month } => {
            let period = YearMonth::new(year, month)?;
            service.delete_record(&user, period).await?;
            println!("Deleted {} for {}", period, user);
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    user: &str,
    export_type: &str,
    year: i32,
    month: u32,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(service);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "daily" => {
            let count = exporter.export_daily_csv(user, year, month, writer).await?;
            if output.is_some() {
                eprintln!("Exported {} days", count);
            }
        }
        "categories" => {
            let count = exporter
                .export_categories_csv(user, year, month, writer)
                .await?;
            if output.is_some() {
                eprintln!("Exported {} categories", count);
            }
        }
        "json" => {
            let view = exporter.export_view_json(user, year, month, writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported {}-{:02}: {} individual ledger(s)",
                    view.year,
                    view.month,
                    view.individuals.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: daily, categories, json",
                export_type
            );
        }
    }

    Ok(())
}

fn print_view(view: &MonthlyView) {
    let combined = &view.combined_data;

    println!("Couple Ledger: {}-{:02}", view.year, view.month);
    if view.individuals.is_empty() {
        println!("No records for this month.");
        return;
    }
    let names: Vec<&str> = view
        .individuals
        .values()
        .map(|i| i.user_name.as_str())
        .collect();
    println!("Records from: {}", names.join(", "));
    println!();

    print_summary(&combined.summary);

    if view.individuals.len() > 1 {
        println!();
        println!(
            "{:<20} {:>15} {:>15} {:>15}",
            "PARTNER", "INCOME", "EXPENSE", "NET"
        );
        println!("{}", "-".repeat(68));
        for individual in view.individuals.values() {
            let summary = &individual.data.summary;
            println!(
                "{:<20} {:>15} {:>15} {:>15}",
                truncate(&individual.user_name, 20),
                format_won(summary.total_income),
                format_won(summary.total_expense),
                format_won(summary.net_income)
            );
        }
    }

    print_breakdown(&combined.category_analysis, &combined.daily_transactions);
}

fn print_record(user: &str, record: &FinancialRecord) {
    println!("{}: {}", user, record.period);
    println!("  Recognized by: {}", record.data.recognition_method);
    println!(
        "  Uploaded:      {}",
        record.data.uploaded_at.format("%Y-%m-%d %H:%M:%S")
    );
    if !record.image_urls.is_empty() {
        println!("  Images:        {}", record.image_urls.join(", "));
    }
    println!();

    print_summary(&record.data.summary);
    print_breakdown(
        &record.data.category_analysis,
        &record.data.daily_transactions,
    );
}

fn print_summary(summary: &MonthlySummary) {
    println!("Total Income:   {:>15}", format_won(summary.total_income));
    println!("Total Expense:  {:>15}", format_won(summary.total_expense));
    println!("{}", "-".repeat(31));
    println!("Net:            {:>15}", format_won(summary.net_income));
}

fn print_breakdown(categories: &CategoryAnalysisMap, daily: &DailyTransactionsMap) {
    if !categories.is_empty() {
        println!();
        println!("{:<20} {:>15} {:>8}", "CATEGORY", "AMOUNT", "PERCENT");
        println!("{}", "-".repeat(45));
        for (name, category) in categories_by_amount(categories) {
            println!(
                "{:<20} {:>15} {:>7.1}%",
                truncate(name, 20),
                format_won(category.amount),
                category.percentage
            );
        }
    }

    if !daily.is_empty() {
        println!();
        println!("{:<6} {:>15} {:>15}", "DAY", "INCOME", "EXPENSE");
        println!("{}", "-".repeat(38));
        for (day, tx) in days_in_order(daily) {
            println!(
                "{:<6} {:>15} {:>15}",
                day,
                format_won(tx.income),
                format_won(tx.expense)
            );
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
