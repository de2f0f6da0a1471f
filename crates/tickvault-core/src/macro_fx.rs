//! Macro indicators, reference series and FX rates.

use time::macros::date;
use time::Date;
use tracing::info;

use crate::domain::{CurrencyCode, FxCatalog, ResourceKey};
use crate::endpoint::{fx_catalog_job, fx_chunk_job, FetchJob, Query, RemoteRequest};
use crate::fetcher::Fetcher;
use crate::report::{Stage, StageReport};
use crate::CoreError;

/// Economic series fetched from `/v4/economic`, one file each.
pub const MACRO_INDICATORS: [&str; 23] = [
    "GDP",
    "realGDP",
    "nominalPotentialGDP",
    "realGDPPerCapita",
    "federalFunds",
    "CPI",
    "inflationRate",
    "inflation",
    "retailSales",
    "consumerSentiment",
    "durableGoods",
    "unemploymentRate",
    "totalNonfarmPayroll",
    "initialClaims",
    "industrialProductionTotalIndex",
    "newPrivatelyOwnedHousingUnitsStartedTotalUnits",
    "totalVehicleSales",
    "retailMoneyFunds",
    "smoothedUSRecessionProbabilities",
    "3MonthOr90DayRatesAndYieldsCertificatesOfDeposit",
    "commercialBankInterestRateOnCreditCardPlansAllAccounts",
    "30YearFixedRateMortgageAverage",
    "15YearFixedRateMortgageAverage",
];

pub const MACRO_HISTORY_START: Date = date!(1920 - 01 - 01);
pub const TREASURY_HISTORY_START: Date = date!(1990 - 01 - 01);
pub const DEFAULT_FX_START_YEAR: i32 = 2000;
/// The FX provider has no rates before the euro's introduction.
pub const MIN_FX_START_YEAR: i32 = 1999;

/// Job for one economic indicator, `info/{name}.json`.
pub fn indicator_job(name: &str, today: Date) -> Result<FetchJob, CoreError> {
    Ok(FetchJob::new(
        ResourceKey::info(&format!("{name}.json"))?,
        RemoteRequest::fundamentals(
            "/v4/economic",
            Query::economic(name, MACRO_HISTORY_START, today)?,
        ),
    ))
}

/// Market-wide series stored next to the indicators.
pub fn reference_jobs(today: Date) -> Result<Vec<FetchJob>, CoreError> {
    Ok(vec![
        // Downstream readers expect this exact file name.
        FetchJob::new(
            ResourceKey::info_static("tresury_rates.json"),
            RemoteRequest::fundamentals(
                "/v4/treasury",
                Query::date_range(TREASURY_HISTORY_START, today)?,
            ),
        ),
        FetchJob::new(
            ResourceKey::info_static("s&p500_price.json"),
            RemoteRequest::fundamentals("/v3/historical-price-full/%5EGSPC", Query::line_series()),
        ),
        FetchJob::new(
            ResourceKey::info_static("s&p500_historical_constituent.json"),
            RemoteRequest::fundamentals("/v3/historical/sp500_constituent", Query::none()),
        ),
        FetchJob::new(
            ResourceKey::info_static("dowjones_constituent_historical_constituent.json"),
            RemoteRequest::fundamentals("/v3/historical/dowjones_constituent", Query::none()),
        ),
    ])
}

/// Fetches every indicator and reference series; each is its own unit.
pub async fn fetch_macro(fetcher: &Fetcher, today: Date) -> StageReport {
    let mut report = StageReport::new(Stage::Macro);

    for name in MACRO_INDICATORS {
        report.units += 1;
        let job = match indicator_job(name, today) {
            Ok(job) => job,
            Err(error) => {
                report.record_local_failure(name, None, error.to_string());
                continue;
            }
        };
        run_unit(fetcher, &job, name, &mut report).await;
    }

    match reference_jobs(today) {
        Ok(jobs) => {
            for job in jobs {
                report.units += 1;
                let unit = job.key.to_string();
                run_unit(fetcher, &job, &unit, &mut report).await;
            }
        }
        Err(error) => {
            report.units += 1;
            report.record_local_failure("reference-series", None, error.to_string());
        }
    }

    info!(
        series = report.units,
        fetched = report.fetched,
        failed = report.failures.len(),
        "macro stage finished"
    );
    report
}

/// Currency catalog followed by one chunk per currency and calendar year.
pub async fn fetch_fx(fetcher: &Fetcher, start_year: i32, today: Date) -> StageReport {
    let mut report = StageReport::new(Stage::Fx);

    report.units += 1;
    let catalog_job = fx_catalog_job();
    let catalog = match fetcher.fetch(&catalog_job).await {
        Ok(fetched) => {
            report.record_fetch(&fetched);
            match serde_json::from_slice::<FxCatalog>(&fetched.body) {
                Ok(catalog) => catalog,
                Err(error) => {
                    report.record_local_failure(
                        "fx-catalog",
                        Some(catalog_job.key),
                        format!("couldn't parse currency catalog: {error}"),
                    );
                    return report;
                }
            }
        }
        Err(error) => {
            report.record_failure("fx-catalog", &error);
            return report;
        }
    };

    let currencies = catalog.currencies();
    info!(currencies = currencies.len(), "currency catalog resolved");

    for currency in &currencies {
        fetch_currency(fetcher, currency, start_year, today.year(), &mut report).await;
    }

    info!(
        chunks = report.units - 1,
        fetched = report.fetched,
        failed = report.failures.len(),
        "fx stage finished"
    );
    report
}

/// Yearly chunks `start_year..=end_year` for one currency.
pub async fn fetch_currency(
    fetcher: &Fetcher,
    currency: &CurrencyCode,
    start_year: i32,
    end_year: i32,
    report: &mut StageReport,
) {
    for year in start_year..=end_year {
        report.units += 1;
        let unit = format!("{currency}_{year}");
        match fx_chunk_job(currency, year) {
            Ok(job) => run_unit(fetcher, &job, &unit, report).await,
            Err(error) => report.record_local_failure(unit, None, error.to_string()),
        }
    }
}

async fn run_unit(fetcher: &Fetcher, job: &FetchJob, unit: &str, report: &mut StageReport) {
    match fetcher.fetch(job).await {
        Ok(fetched) => report.record_fetch(&fetched),
        Err(error) => report.record_failure(unit, &error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_job_spans_full_history_until_today() {
        let job = indicator_job("CPI", date!(2024 - 05 - 17)).expect("valid");

        assert_eq!(job.key.as_str(), "info/CPI.json");
        assert_eq!(job.request.path, "/v4/economic");
        assert_eq!(
            job.request.query.to_query_string(),
            "name=CPI&from=1920-01-01&to=2024-05-17"
        );
    }

    #[test]
    fn indicator_names_are_unique() {
        let mut names = MACRO_INDICATORS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 23);
    }

    #[test]
    fn reference_series_keep_downstream_file_names() {
        let keys: Vec<String> = reference_jobs(date!(2024 - 01 - 02))
            .expect("formattable dates")
            .into_iter()
            .map(|job| job.key.to_string())
            .collect();

        assert_eq!(
            keys,
            vec![
                "info/tresury_rates.json",
                "info/s&p500_price.json",
                "info/s&p500_historical_constituent.json",
                "info/dowjones_constituent_historical_constituent.json",
            ]
        );
    }

    #[test]
    fn treasury_series_starts_in_1990() {
        let jobs = reference_jobs(date!(2024 - 01 - 02)).expect("formattable dates");
        assert_eq!(
            jobs[0].request.query.to_query_string(),
            "from=1990-01-01&to=2024-01-02"
        );
    }
}
