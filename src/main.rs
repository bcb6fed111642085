//! CLI interface for airline-booking

use airline_booking::{
    format_date, parse_date, BookingClient, BookingConfig, BookingForm, DestinationDirectory,
    FormInput, Warning,
};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "airline-booking")]
#[command(about = "Plan and book Digido Airlines flights")]
#[command(version)]
pub struct Cli {
    /// JSON file with the destination list (defaults to the built-in routes)
    #[arg(long, global = true, env = "BOOKING_DESTINATIONS")]
    pub destinations: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List bookable cities and their flying days
    Destinations,
    /// List dates with flights for a city
    Availability {
        /// City code
        #[arg(short, long)]
        city: String,
        /// First date to consider (YYYY-MM-DD, default today)
        #[arg(long)]
        from: Option<String>,
        /// Number of days to scan (1-366)
        #[arg(long, default_value = "28", value_parser = clap::value_parser!(u32).range(1..=366))]
        days: u32,
    },
    /// Fill in the form and print the shareable query string
    Plan(FormArgs),
    /// Fill in the form, validate it and submit the booking
    Book(FormArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FormArgs {
    /// Start from an existing query string or URL
    #[arg(short, long)]
    pub query: Option<String>,
    /// Trip type (roundtrip, oneway)
    #[arg(long = "type")]
    pub trip_type: Option<String>,
    /// Origin city code
    #[arg(short, long)]
    pub origin: Option<String>,
    /// Destination city code
    #[arg(short, long)]
    pub destination: Option<String>,
    /// Departure date (YYYY-MM-DD)
    #[arg(long)]
    pub depart: Option<String>,
    /// Return date for round trips (YYYY-MM-DD)
    #[arg(short, long)]
    pub return_date: Option<String>,
}

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("airline_booking=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_directory(path: Option<&PathBuf>) -> Result<DestinationDirectory, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => DestinationDirectory::from_path(path)?,
        None => DestinationDirectory::builtin(),
    })
}

impl From<FormArgs> for FormInput {
    fn from(args: FormArgs) -> Self {
        Self {
            query: args.query,
            trip_type: args.trip_type,
            origin: args.origin,
            destination: args.destination,
            departure_date: args.depart,
            return_date: args.return_date,
        }
    }
}

fn print_warnings(warnings: &[Warning]) {
    for warning in warnings {
        warn!(%warning, "Form warning");
        eprintln!("⚠️  {}", warning);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();
    let directory = load_directory(cli.destinations.as_ref())?;

    match cli.command {
        Commands::Destinations => {
            for destination in directory.destinations() {
                let days: Vec<&str> = destination
                    .available_weekdays
                    .iter()
                    .map(|&d| WEEKDAYS[d as usize])
                    .collect();
                println!("{:<5} {:<20} {}", destination.code, destination.city, days.join(", "));
            }
        }
        Commands::Availability { city, from, days } => {
            let from = match from {
                Some(from) => parse_date(&from)?,
                None => Local::now().date_naive(),
            };
            let dates = directory.available_dates(&city.to_uppercase(), from, days)?;
            if dates.is_empty() {
                println!("No flights for {} in the next {} days", city, days);
            }
            for date in dates {
                println!("{} {}", format_date(date), date.format("%a"));
            }
        }
        Commands::Plan(args) => {
            let (form, warnings) = BookingForm::from_input(directory, &args.into())?;
            print_warnings(&warnings);
            println!("?{}", form.to_query());
            if let Err(e) = form.validate() {
                println!("Not ready to book: {}", e);
            }
        }
        Commands::Book(args) => {
            let (mut form, warnings) = BookingForm::from_input(directory, &args.into())?;
            print_warnings(&warnings);

            let client = BookingClient::new(BookingConfig::from_env()?)?;
            println!("Submitting booking...");
            match form.submit(&client).await {
                Ok(result) => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                    if !result.is_success() {
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
