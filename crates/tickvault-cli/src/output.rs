use std::io::{self, Write};

use tickvault_core::RunReport;

use crate::error::CliError;

pub fn render(report: &RunReport, pretty: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_report(&mut handle, report, pretty)?;
    handle.flush()?;
    Ok(())
}

fn write_report(writer: &mut impl Write, report: &RunReport, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, report)?;
    } else {
        serde_json::to_writer(&mut *writer, report)?;
    }
    writeln!(writer)?;
    Ok(())
}
