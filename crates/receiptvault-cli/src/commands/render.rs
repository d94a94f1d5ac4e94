//! Receipt document rendering

use clap::Args;
use receiptvault_core::render::{render_markdown, ReceiptDocument};
use receiptvault_core::ExError;
use receiptvault_core::ExErrorKind;

use super::{print_json, Context};

#[derive(Debug, Args)]
pub struct RenderArgs {
    pub receipt_number: String,

    /// Version number to render (defaults to the current version)
    #[arg(long)]
    pub version: Option<u32>,

    /// Print the document as JSON instead of Markdown
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: RenderArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let detail = ctx.queries().receipt_detail(&args.receipt_number)?;

    let version = match args.version {
        None => detail.current_version,
        Some(number) => ctx
            .audit()
            .version_history(&args.receipt_number)?
            .into_iter()
            .find(|v| v.version_number == number),
    };
    let version = version.ok_or_else(|| {
        ExError::new(ExErrorKind::NotFound)
            .with_op("render")
            .with_entity_id(args.receipt_number.clone())
            .with_message("no such version")
    })?;

    let doc = ReceiptDocument::build(&detail.receipt, &version)?;
    if args.json {
        print_json(&doc)
    } else {
        print!("{}", render_markdown(&doc));
        Ok(())
    }
}
