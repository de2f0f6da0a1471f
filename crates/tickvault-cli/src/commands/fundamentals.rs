use tickvault_core::{Pipeline, RunReport, Symbol};

use crate::cli::FundamentalsArgs;
use crate::error::CliError;

pub async fn run(args: &FundamentalsArgs, pipeline: &Pipeline) -> Result<RunReport, CliError> {
    let mut symbols: Vec<Symbol> = Vec::with_capacity(args.symbols.len());
    for raw in &args.symbols {
        let symbol = Symbol::parse(raw)?;
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }

    let mut report = RunReport::default();
    report.push(pipeline.fundamentals(symbols).await);
    Ok(report)
}
