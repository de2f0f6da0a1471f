use tickvault_core::{Pipeline, RunReport};

/// Per-list symbol counts end up in the stage's `counts`.
pub async fn run(pipeline: &Pipeline) -> RunReport {
    let (_, stage) = pipeline.resolve_universe().await;

    let mut report = RunReport::default();
    report.push(stage);
    report
}
