//! Time usage queries and maintenance.

use clap::Subcommand;

use crate::common::Context;

#[derive(Subcommand)]
pub enum UsageAction {
    /// Show today's per-domain usage
    Today,
    /// Show today's usage for one domain
    Get {
        /// Domain or URL
        domain: String,
    },
    /// Overwrite today's usage for a domain
    Set {
        /// Domain or URL
        domain: String,
        /// Accumulated minutes
        #[arg(long)]
        minutes: u64,
    },
    /// Delete all usage data
    Reset,
    /// Purge usage entries from previous days
    Cleanup,
}

pub fn run(action: UsageAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;

    match action {
        UsageAction::Today => {
            let reset_time = ctx.settings.get()?.reset_time;
            ctx.usage.run_daily_reset_if_due(&reset_time)?;
            let usage = ctx.usage.all_usage_today()?;
            println!("{}", serde_json::to_string_pretty(&usage)?);
        }
        UsageAction::Get { domain } => {
            let spent = ctx.usage.time_spent_today(&domain)?;
            println!("{} ms ({} min)", spent, spent / 60_000);
        }
        UsageAction::Set { domain, minutes } => {
            ctx.usage.set_time_spent_today(&domain, minutes * 60_000)?;
            println!("Usage set: {domain} = {minutes} min");
        }
        UsageAction::Reset => {
            ctx.usage.reset_usage()?;
            println!("Usage data reset");
        }
        UsageAction::Cleanup => {
            ctx.usage.cleanup_old_usage()?;
            println!("Old usage entries purged");
        }
    }
    Ok(())
}
