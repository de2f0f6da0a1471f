mod fundamentals;
mod universe;

use std::sync::Arc;
use std::time::Duration;

use time::{Date, OffsetDateTime};
use tickvault_core::{
    IndexConfig, Pipeline, PipelineConfig, ReqwestHttpClient, RetryConfig, RunReport,
};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<RunReport, CliError> {
    let today = OffsetDateTime::now_utc().date();
    let config = pipeline_config(cli, today)?;
    let pipeline = Pipeline::new(config, Arc::new(ReqwestHttpClient::new()))?;

    let report = match &cli.command {
        Command::Run => pipeline.run(today).await,
        Command::Universe => universe::run(&pipeline).await,
        Command::Fundamentals(args) => fundamentals::run(args, &pipeline).await?,
        Command::Macro => single(pipeline.macro_series(today).await),
        Command::Fx => single(pipeline.fx(today).await),
        Command::Index => single(pipeline.indexes()),
    };
    Ok(report)
}

fn single(stage: tickvault_core::StageReport) -> RunReport {
    let mut report = RunReport::default();
    report.push(stage);
    report
}

pub fn pipeline_config(cli: &Cli, today: Date) -> Result<PipelineConfig, CliError> {
    if cli.fx_start_year > today.year() {
        return Err(CliError::Config(format!(
            "--fx-start-year {} is after the current year {}",
            cli.fx_start_year,
            today.year()
        )));
    }

    let config = PipelineConfig {
        data_dir: cli.data_dir.clone(),
        api_key: cli.api_key.clone().filter(|key| !key.trim().is_empty()),
        fx_access_key: cli.fx_access_key.clone().filter(|key| !key.trim().is_empty()),
        fundamentals_base_url: cli.fundamentals_url.clone(),
        fx_base_url: cli.fx_url.clone(),
        rate_limit_per_minute: cli.rate_per_minute,
        retry: RetryConfig::fixed(Duration::from_millis(cli.retry_delay_ms), cli.max_attempts),
        request_timeout: Duration::from_millis(cli.timeout_ms),
        workers: cli.workers,
        fx_start_year: cli.fx_start_year,
        index: IndexConfig::default(),
    };
    config.validate()?;
    Ok(config)
}
