//! Receipt search command

use chrono::NaiveDate;
use clap::Args;
use receiptvault_core::model::{PageRequest, PaymentMode, ReceiptFilter, ReceiptStatus};

use super::receipt::parse_payment_mode;
use super::{print_json, Context};

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Substring of the receipt number or student name
    #[arg(long, short)]
    pub query: Option<String>,

    #[arg(long)]
    pub student_name: Option<String>,

    #[arg(long = "class")]
    pub class_name: Option<String>,

    #[arg(long, value_parser = parse_payment_mode)]
    pub payment_mode: Option<PaymentMode>,

    /// Earliest receipt date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Latest receipt date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// active or voided
    #[arg(long)]
    pub status: Option<ReceiptStatus>,

    #[arg(long, default_value_t = 1)]
    pub page: u32,

    #[arg(long, default_value_t = 50)]
    pub page_size: u32,
}

pub fn execute(args: SearchArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let filter = ReceiptFilter {
        query: args.query,
        student_name: args.student_name,
        class_name: args.class_name,
        payment_mode: args.payment_mode,
        date_from: args.from,
        date_to: args.to,
        status: args.status,
    };
    let page = ctx
        .queries()
        .search_receipts(&filter, PageRequest::new(args.page, args.page_size))?;
    print_json(&page)
}
