//! One-off URL evaluation against the stored rules.

use crate::common::Context;

pub fn run(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;

    // Keep the ledger fresh before consulting time limits.
    let reset_time = ctx.settings.get()?.reset_time;
    ctx.usage.run_daily_reset_if_due(&reset_time)?;

    let verdict = ctx.engine.evaluate(url)?;
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}
