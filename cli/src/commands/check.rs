//! Check command implementation

use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use devsel_shared::SelectionPolicy;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Selector string: "list" or VENDOR:DEVICE in hex (e.g. 10de:1e04)
    pub selector: String,
}

pub fn run(args: CheckArgs) -> Result<()> {
    let policy = check(&args.selector)?;
    output::success(&format!("\"{}\" selects {}", args.selector, policy));
    Ok(())
}

fn check(selector: &str) -> Result<SelectionPolicy> {
    SelectionPolicy::parse(Some(selector)).context("Invalid selector")
}
