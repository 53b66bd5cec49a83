//! Settings management commands.

use clap::Subcommand;
use focusmate_core::SettingsUpdate;

use crate::common::Context;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show current settings
    Show,
    /// Update settings
    Set {
        /// Daily statistics reset time, HH:MM
        #[arg(long)]
        reset_time: Option<String>,
        /// Enable or disable notifications
        #[arg(long)]
        notifications: Option<bool>,
        /// Enable or disable dark mode
        #[arg(long)]
        dark_mode: Option<bool>,
        /// Default message for the block screen
        #[arg(long)]
        block_message: Option<String>,
    },
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;

    match action {
        SettingsAction::Show => {
            let settings = ctx.settings.get()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Set {
            reset_time,
            notifications,
            dark_mode,
            block_message,
        } => {
            let settings = ctx.settings.update(SettingsUpdate {
                enable_notifications: notifications,
                dark_mode,
                reset_time,
                default_block_message: block_message,
            })?;
            println!("Settings updated:");
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }
    Ok(())
}
