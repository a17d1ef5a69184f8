use std::env;
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::{ArgAction, Parser};
use dotenv::dotenv;

use acm_logs::{
    printer::print_logs,
    s3::{S3Options, DEFAULT_REGION},
    selection::{SelectorArgs, Selection},
    store::{self, Store, DEFAULT_STORE_URL},
};

/// Exit status of usage errors and store failures.
const FAILURE: u8 = 1;

/// Pull down and print ACM checkout logs from the logging bucket.
/// By default prints the logs of the past week.
#[derive(Parser)]
#[command(version, about = "Print ACM checkout logs stored in S3", long_about = None)]
struct Cli {
    /// positive N: logs from the past N days, negative N: logs from N days ago.
    /// -100 < N < 100
    #[arg(value_name = "N", allow_negative_numbers = true)]
    days: Option<i64>,

    /// logs of a single date, YYYY-M-D
    #[arg(short, long, action = ArgAction::Append)]
    date: Vec<String>,

    /// logs of a whole month, YYYY-M
    #[arg(short, long, action = ArgAction::Append)]
    month: Vec<String>,

    /// logs of a whole year, YYYY
    #[arg(short, long, action = ArgAction::Append)]
    year: Vec<String>,

    /// where logs are stored: s3://bucket, gs://bucket or a local directory
    #[arg(long, env = "ACM_LOGS_STORE_URL", default_value = DEFAULT_STORE_URL)]
    store_url: String,

    /// region of the s3 bucket
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// directly set an endpoint such as http://localhost:9000
    /// for local development or another s3 compatible API
    #[arg(long, env = "AWS_ENDPOINT")]
    endpoint: Option<String>,

    /// Increase debug level (use -v for info, -vv for debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn selectors(&self) -> SelectorArgs {
        SelectorArgs {
            days: self.days,
            date: self.date.clone(),
            month: self.month.clone(),
            year: self.year.clone(),
        }
    }
}

/// Runs one invocation and returns the process exit status.
///
/// Usage problems are reported on stdout before `new_store` is called.
async fn run<F>(cli: Cli, today: NaiveDate, new_store: F) -> u8
where
    F: FnOnce(&str, &S3Options) -> Result<Store, anyhow::Error>,
{
    let selection = match Selection::from_selectors(&cli.selectors()) {
        Ok(selection) => selection,
        Err(e) => {
            println!("{}", e);
            return FAILURE;
        }
    };

    let s3_options = S3Options {
        region: cli.region,
        endpoint: cli.endpoint,
    };
    let logs_store = match new_store(&cli.store_url, &s3_options) {
        Ok(logs_store) => logs_store,
        Err(e) => {
            log::error!("error: {:#}", e);
            return FAILURE;
        }
    };

    log::info!("printing {:?} from {} (today is {})", selection, cli.store_url, today);

    let mut stdout = tokio::io::stdout();
    match print_logs(&logs_store, &selection, today, &mut stdout).await {
        Ok(printed) => {
            log::info!("printed {} log objects", printed);
            0
        }
        Err(e) => {
            log::error!("error: {:#}", e);
            FAILURE
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();

    match cli.verbose {
        0 => {}
        1 => env::set_var("RUST_LOG", "info"),
        _ => env::set_var("RUST_LOG", "debug"),
    }
    env_logger::init();

    let today = Local::now().date_naive();
    let status = run(cli, today, |store_url, s3_options| {
        store::new(store_url, s3_options)
    })
    .await;

    ExitCode::from(status)
}
