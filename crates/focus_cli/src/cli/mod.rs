use clap::{Parser, Subcommand};
use focus_core::config::snake_key;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the current logical day
    ///
    /// Example: focus today
    Today,
    /// Manage tasks
    ///
    /// Example: focus task add "Write report"
    Task {
        #[command(subcommand)]
        task: TaskCommand,
    },
    /// Manage the stages of a task
    ///
    /// Example: focus stage add task-1 --start 09:00 --duration 90
    Stage {
        #[command(subcommand)]
        stage: StageCommand,
    },
    /// Show the stage timeline of a logical day
    ///
    /// Example: focus timeline
    /// Example: focus timeline --date 2024-03-02
    Timeline {
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,
    },
    /// List stages waiting to be started or finished
    ///
    /// Example: focus due
    Due,
    /// Send notifications for due stages
    ///
    /// Example: focus notify
    Notify,
    /// Keep redrawing today's timeline, following the day rollover
    ///
    /// Example: focus watch --interval-secs 30
    Watch {
        #[arg(long, default_value_t = 60)]
        interval_secs: u64,
        /// Stop after this many redraws
        #[arg(long)]
        ticks: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task to a logical day (today by default)
    ///
    /// Example: focus task add "Write report" --date 2024-03-02
    Add {
        title: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,
    },
    /// List the tasks of a logical day
    ///
    /// Example: focus task list
    List {
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,
    },
    /// Delete a task and its stages
    ///
    /// Example: focus task delete task-1
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum StageCommand {
    /// Add a stage; defaults to right after the last stage, 180 minutes long
    ///
    /// Example: focus stage add task-1 --start 09:00 --duration 90
    Add {
        task_id: String,
        #[arg(long, value_name = "HH:MM")]
        start: Option<String>,
        #[arg(long, value_name = "MINUTES", allow_hyphen_values = true)]
        duration: Option<i32>,
    },
    /// Move a stage to a new start time
    ///
    /// Example: focus stage move task-1 2 14:30
    Move {
        task_id: String,
        stage_id: u32,
        #[arg(value_name = "HH:MM")]
        start: String,
    },
    /// Change a stage's duration in minutes
    ///
    /// Example: focus stage resize task-1 2 45
    Resize {
        task_id: String,
        stage_id: u32,
        #[arg(allow_hyphen_values = true)]
        duration: i32,
    },
    /// Change a stage's status (upcoming, process, done, undone)
    ///
    /// Example: focus stage status task-1 2 process
    Status {
        task_id: String,
        stage_id: u32,
        status: String,
    },
    /// Delete a stage
    ///
    /// Example: focus stage delete task-1 2
    Delete { task_id: String, stage_id: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    DailyStart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let canonical_field =
        snake_key(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "daily_start" | "day_start" => ConfigOverrideTarget::DailyStart,
        other => return Err(format!("unknown config field '{other}'")),
    };

    if value.is_empty() {
        return Err(format!("{canonical_field} override needs a value"));
    }

    Ok(ParsedConfigOverride { target, value })
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, ConfigOverrideTarget, StageCommand, parse_config_override};
    use clap::Parser;

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" THEME = Midnight ").unwrap();
        assert_eq!(parsed.target, ConfigOverrideTarget::Theme);
        assert_eq!(parsed.value, "Midnight");

        let parsed = parse_config_override("daily-start=05:30").unwrap();
        assert_eq!(parsed.target, ConfigOverrideTarget::DailyStart);
        assert_eq!(parsed.value, "05:30");
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("unknown.field=value").unwrap_err();
        assert!(err.contains("unknown config field"));
    }

    #[test]
    fn parse_config_override_rejects_blank_key() {
        let err = parse_config_override(" -- =05:30").unwrap_err();
        assert!(err.contains("cannot be empty"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("daily_start").unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn parse_config_override_rejects_empty_value() {
        let err = parse_config_override("daily_start= ").unwrap_err();
        assert!(err.contains("needs a value"));
    }

    #[test]
    fn resize_accepts_negative_duration_for_validation() {
        let cli = Cli::try_parse_from(["focus", "stage", "resize", "task-1", "2", "-5"]).unwrap();
        match cli.command {
            Command::Stage {
                stage: StageCommand::Resize { duration, .. },
            } => assert_eq!(duration, -5),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
