//! athena-query - run a bounded SQL statement and print the result.

mod cli;

use athena_query_runner::config::Config;
use athena_query_runner::error::{Result, RunnerError};
use athena_query_runner::logging;
use athena_query_runner::output;
use athena_query_runner::query::QueryRunner;
use athena_query_runner::service::HttpQueryService;
use cli::Cli;
use std::io::Write;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        if e.execution_may_continue() {
            error!("The query may still be running on the service");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Precedence: CLI arguments and their environment variables, then the
    // config file, then built-in defaults.
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_overrides(&mut config);

    let format = cli.output_format()?;
    let sql = cli.read_sql()?;
    let request = config.query.submit_request(&sql)?;
    let options = config.query.run_options()?;

    let service = HttpQueryService::new(&config.service)?;
    info!("Using query service at {}", service.endpoint());

    let runner = QueryRunner::new(&service, options);
    let outcome = runner.run(&request).await?;
    info!(
        "Query {} returned {} rows",
        outcome.query_execution_id, outcome.row_count
    );

    let rendered = output::render(&outcome, format)?;
    match &cli.output_file {
        Some(path) => std::fs::write(path, rendered).map_err(|e| {
            RunnerError::io(format!("Failed to write {}: {e}", path.display()))
        })?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(|e| RunnerError::io(format!("Failed to write output: {e}")))?;
        }
    }

    Ok(())
}
