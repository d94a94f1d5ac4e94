//! Upload batch listing

use clap::{Args, Subcommand};
use receiptvault_core::model::PageRequest;

use super::{print_json, Context};

#[derive(Debug, Args)]
pub struct BatchArgs {
    #[command(subcommand)]
    pub command: BatchCommand,
}

#[derive(Debug, Subcommand)]
pub enum BatchCommand {
    /// Batches, newest first
    List(ListArgs),
    /// One batch with its error log
    Show(ShowArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    #[arg(long, default_value_t = 20)]
    pub page_size: u32,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub batch_id: String,
}

pub fn execute(args: BatchArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let queries = ctx.queries();
    match args.command {
        BatchCommand::List(list) => {
            print_json(&queries.list_batches(PageRequest::new(list.page, list.page_size))?)
        }
        BatchCommand::Show(show) => print_json(&queries.get_batch(&show.batch_id)?),
    }
}
