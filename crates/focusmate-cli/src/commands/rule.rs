//! Blocking rule management commands.

use clap::Subcommand;
use focusmate_core::{BlockingMode, DayOfWeek, NewRule, RuleUpdate, Schedule, TimeRange};

use crate::common::Context;

#[derive(Subcommand)]
pub enum RuleAction {
    /// Add a blocking rule
    Add {
        /// Domain, wildcard pattern, or /regex/ specifier
        domain: String,
        /// Blocking mode: block, time-limit, or schedule (default: block)
        #[arg(long, default_value = "block")]
        mode: String,
        /// Daily budget in minutes (time-limit mode)
        #[arg(long)]
        limit_mins: Option<u64>,
        /// Comma-separated days (schedule mode), e.g. monday,tuesday
        #[arg(long)]
        days: Option<String>,
        /// Comma-separated HH:MM-HH:MM ranges (schedule mode)
        #[arg(long)]
        times: Option<String>,
        /// Redirect URL to navigate to instead of the block screen
        #[arg(long)]
        redirect: Option<String>,
        /// Custom message for the block screen
        #[arg(long)]
        message: Option<String>,
        /// Create the rule disabled
        #[arg(long)]
        inactive: bool,
    },
    /// List all rules
    List,
    /// Get rule details
    Get {
        /// Rule ID
        id: String,
    },
    /// Update a rule
    Update {
        /// Rule ID
        id: String,
        /// New domain specifier
        #[arg(long)]
        domain: Option<String>,
        /// Enable or disable the rule
        #[arg(long)]
        active: Option<bool>,
        /// Switch to time-limit mode with this budget in minutes
        #[arg(long)]
        limit_mins: Option<u64>,
        /// New redirect URL
        #[arg(long)]
        redirect: Option<String>,
        /// New custom message
        #[arg(long)]
        message: Option<String>,
    },
    /// Delete a rule
    Delete {
        /// Rule ID
        id: String,
    },
    /// Delete all rules
    Clear,
}

pub fn run(action: RuleAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;

    match action {
        RuleAction::Add {
            domain,
            mode,
            limit_mins,
            days,
            times,
            redirect,
            message,
            inactive,
        } => {
            let mode = build_mode(&mode, limit_mins, days, times)?;
            let mut new_rule = NewRule::new(domain, mode);
            new_rule.active = !inactive;
            new_rule.redirect_url = redirect;
            new_rule.custom_message = message;

            let rule = ctx.rules.add_rule(new_rule)?;
            println!("Rule created: {}", rule.id);
            println!("{}", serde_json::to_string_pretty(&rule)?);
        }
        RuleAction::List => {
            let rules = ctx.rules.all_rules()?;
            println!("{}", serde_json::to_string_pretty(&rules)?);
        }
        RuleAction::Get { id } => match ctx.rules.rule(&id)? {
            Some(rule) => println!("{}", serde_json::to_string_pretty(&rule)?),
            None => println!("Rule not found: {id}"),
        },
        RuleAction::Update {
            id,
            domain,
            active,
            limit_mins,
            redirect,
            message,
        } => {
            let update = RuleUpdate {
                domain,
                mode: limit_mins.map(|mins| BlockingMode::TimeLimit {
                    time_limit: mins * 60_000,
                }),
                active,
                redirect_url: redirect,
                custom_message: message,
            };
            match ctx.rules.update_rule(&id, update)? {
                Some(rule) => {
                    println!("Rule updated:");
                    println!("{}", serde_json::to_string_pretty(&rule)?);
                }
                None => println!("Rule not found: {id}"),
            }
        }
        RuleAction::Delete { id } => {
            if ctx.rules.delete_rule(&id)? {
                println!("Rule deleted: {id}");
            } else {
                println!("Rule not found: {id}");
            }
        }
        RuleAction::Clear => {
            ctx.rules.clear_rules()?;
            println!("All rules deleted");
        }
    }
    Ok(())
}

fn build_mode(
    mode: &str,
    limit_mins: Option<u64>,
    days: Option<String>,
    times: Option<String>,
) -> Result<BlockingMode, Box<dyn std::error::Error>> {
    match mode {
        "block" => Ok(BlockingMode::Block),
        "time-limit" => {
            let mins = limit_mins.ok_or("time-limit mode requires --limit-mins")?;
            Ok(BlockingMode::TimeLimit {
                time_limit: mins * 60_000,
            })
        }
        "schedule" => {
            let days = parse_days(&days.ok_or("schedule mode requires --days")?)?;
            let time_ranges = parse_times(&times.ok_or("schedule mode requires --times")?)?;
            Ok(BlockingMode::Schedule {
                schedule: Schedule { days, time_ranges },
            })
        }
        other => Err(format!("unknown mode: {other} (expected block, time-limit, or schedule)").into()),
    }
}

fn parse_days(input: &str) -> Result<Vec<DayOfWeek>, Box<dyn std::error::Error>> {
    input
        .split(',')
        .map(|day| match day.trim().to_lowercase().as_str() {
            "monday" | "mon" => Ok(DayOfWeek::Monday),
            "tuesday" | "tue" => Ok(DayOfWeek::Tuesday),
            "wednesday" | "wed" => Ok(DayOfWeek::Wednesday),
            "thursday" | "thu" => Ok(DayOfWeek::Thursday),
            "friday" | "fri" => Ok(DayOfWeek::Friday),
            "saturday" | "sat" => Ok(DayOfWeek::Saturday),
            "sunday" | "sun" => Ok(DayOfWeek::Sunday),
            other => Err(format!("unknown day: {other}").into()),
        })
        .collect()
}

fn parse_times(input: &str) -> Result<Vec<TimeRange>, Box<dyn std::error::Error>> {
    input
        .split(',')
        .map(|range| {
            let (start, end) = range
                .trim()
                .split_once('-')
                .ok_or_else(|| format!("expected HH:MM-HH:MM, got: {range}"))?;
            Ok(TimeRange {
                start: start.to_string(),
                end: end.to_string(),
            })
        })
        .collect()
}
