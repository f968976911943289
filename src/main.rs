use tradehis::{config::Config, AppError, Pipeline, RunSummary};

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    match run() {
        Ok(summary) => {
            tracing::info!(
                trades = summary.trades,
                complete = summary.complete_trades,
                partial = summary.partial_trades,
                data_quality_issues = summary.data_quality.total(),
                "conversion finished"
            );
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}

fn run() -> Result<RunSummary, AppError> {
    let config = Config::from_env()?;
    Ok(Pipeline::new(config).run()?)
}
