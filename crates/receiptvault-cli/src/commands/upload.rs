//! Workbook upload command

use std::path::PathBuf;

use clap::Args;
use receiptvault_core::BatchResult;
use receiptvault_store::XlsxSource;

use super::{print_json, Context};

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// `.xlsx` workbook; the first sheet is read
    pub file: PathBuf,

    /// Name recorded on the batch (defaults to the file name)
    #[arg(long)]
    pub file_name: Option<String>,
}

pub fn execute(args: UploadArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let source = XlsxSource::new(&args.file);
    let orchestrator = ctx.orchestrator();
    let result = orchestrator.run_ingestion(&source, ctx.actor(), args.file_name.as_deref())?;

    print_json(&result)?;
    match result {
        BatchResult::Aborted(abort) => Err(format!("upload aborted: {}", abort.error).into()),
        BatchResult::Completed(_) => Ok(()),
    }
}
