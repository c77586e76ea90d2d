use clap::{CommandFactory, Parser};
use focus_cli::cli::{
    Cli, Command, ConfigOverrideTarget, StageCommand, TaskCommand, parse_config_override,
};
use focus_core::approval::DueStage;
use focus_core::clock::{
    DayFollower, format_clock_time, format_date_key, logical_date_key, parse_clock_time,
};
use focus_core::config::{
    Config, ConfigOverrides, Palette, load_config_with_fallback, merge_overrides,
    palette_for_theme, parse_daily_start,
};
use focus_core::error::AppError;
use focus_core::model::{Stage, StageStatus, Task};
use focus_core::notify::notifier_from_env;
use focus_core::stage_api;
use focus_core::timeline::DayTimeline;
use log::{info, warn};
use serde::Serialize;
use std::io::{self, BufRead};
use std::time::Duration;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

const NOW_ENV_VAR: &str = "FOCUS_NOW";
const LOG_ENV_VAR: &str = "FOCUS_LOG";

struct Settings {
    daily_start: i32,
    palette: Palette,
}

#[derive(Tabled)]
struct TimelineRow {
    stage: u32,
    lane: usize,
    start: String,
    end: String,
    minutes: i32,
    status: &'static str,
    due: &'static str,
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_ENV_VAR, "warn")).init();
}

/// Wall-clock now in local time; `FOCUS_NOW` (`YYYY-MM-DD HH:MM`) pins it.
fn local_now() -> Result<PrimitiveDateTime, AppError> {
    if let Ok(raw) = std::env::var(NOW_ENV_VAR)
        && !raw.trim().is_empty()
    {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
        return PrimitiveDateTime::parse(raw.trim(), format).map_err(|_| {
            AppError::invalid_input(format!("{NOW_ENV_VAR} must be YYYY-MM-DD HH:MM"))
        });
    }

    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let now = OffsetDateTime::now_utc().to_offset(offset);
    Ok(PrimitiveDateTime::new(now.date(), now.time()))
}

fn resolve_settings(raw_overrides: &[String]) -> Result<Settings, AppError> {
    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error.as_ref() {
        warn!("using default configuration: {err}");
    }

    let mut overrides = ConfigOverrides::default();
    for raw in raw_overrides {
        let parsed = parse_config_override(raw).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::DailyStart => {
                overrides.daily_start = Some(parse_daily_start(&parsed.value)?)
            }
        }
    }

    let config: Config = merge_overrides(&loaded.config, &overrides);
    Ok(Settings {
        daily_start: config.daily_start_minutes(),
        palette: palette_for_theme(config.theme.as_deref()),
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let rendered =
        serde_json::to_string(value).map_err(|err| AppError::invalid_data(err.to_string()))?;
    println!("{rendered}");
    Ok(())
}

fn stage_slot(stage: &Stage) -> String {
    match stage.start_time_minutes {
        Some(start) => format!(
            "{} for {} min",
            format_clock_time(start),
            stage.effective_duration()
        ),
        None => "unscheduled".to_string(),
    }
}

fn print_tasks_plain(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }

    for task in tasks {
        println!(
            "{} | {} | {} | {} stages, {} timed",
            task.id,
            task.title,
            task.logical_date,
            task.stages.len(),
            task.timed_stages().count()
        );
    }
}

fn print_timeline_plain(day: &DayTimeline, palette: &Palette) {
    println!(
        "{}",
        palette.accentize(&format!(
            "Logical day {} (starts {})",
            day.logical_date,
            format_clock_time(day.daily_start_minutes)
        ))
    );
    if let Some(now) = day.now_display {
        println!(
            "Now: {}",
            palette.accentize(&format_clock_time(now + day.daily_start_minutes))
        );
    }

    if day.tasks.is_empty() {
        println!("No tasks.");
        return;
    }

    for task in &day.tasks {
        println!();
        println!("{} ({}) - {} lanes", task.title, task.task_id, task.lane_count);

        if !task.entries.is_empty() {
            let rows: Vec<TimelineRow> = task
                .entries
                .iter()
                .map(|entry| TimelineRow {
                    stage: entry.stage_id,
                    lane: entry.lane,
                    start: format_clock_time(entry.start_time_minutes),
                    end: format_clock_time(entry.display_end + day.daily_start_minutes),
                    minutes: entry.duration_minutes,
                    status: entry.status.label(),
                    due: entry.due.map_or("", |due| due.label()),
                })
                .collect();
            let mut table = Table::new(rows);
            table.with(Style::sharp());
            println!("{table}");
        }

        if !task.untimed.is_empty() {
            let ids: Vec<String> = task.untimed.iter().map(|id| id.to_string()).collect();
            println!(
                "{}",
                palette.mutedize(&format!("Unscheduled stages: {}", ids.join(", ")))
            );
        }
    }
}

fn print_due_plain(due: &[DueStage], palette: &Palette) {
    if due.is_empty() {
        println!("Nothing due.");
        return;
    }

    for item in due {
        println!(
            "{} | {} ({}) stage {} at {}",
            palette.accentize(item.action.label()),
            item.task_title,
            item.task_id,
            item.stage_id,
            format_clock_time(item.start_time_minutes)
        );
    }
}

/// Keeps the first line of clap's report, without its `error: ` tag.
fn parse_error_to_app(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let summary = rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error:").trim())
        .unwrap_or("invalid command");
    AppError::invalid_input(summary)
}

/// Splits an interactive line into arguments. Double quotes group words;
/// inside them `\"` and `\\` are escapes, any other backslash is literal.
fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|ch| ch.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            return Ok(args);
        }

        let mut arg = String::new();
        while let Some(ch) = chars.next_if(|ch| !ch.is_whitespace()) {
            if ch != '"' {
                arg.push(ch);
                continue;
            }
            loop {
                match chars.next() {
                    None => return Err(AppError::invalid_input("unterminated quote in command")),
                    Some('"') => break,
                    Some('\\') => match chars.next_if(|next| matches!(next, '"' | '\\')) {
                        Some(escaped) => arg.push(escaped),
                        None => arg.push('\\'),
                    },
                    Some(quoted) => arg.push(quoted),
                }
            }
        }
        args.push(arg);
    }
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_task_command(command: TaskCommand, json: bool, settings: &Settings) -> Result<(), AppError> {
    let now = local_now()?;
    match command {
        TaskCommand::Add { title, date } => {
            let title = match title {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::invalid_input("title is required")),
            };

            let task = stage_api::add_task(&title, date.as_deref(), now, settings.daily_start)?;
            if json {
                print_json(&task)?;
            } else {
                println!(
                    "Added task: {} ({}) for {}",
                    task.title, task.id, task.logical_date
                );
            }
        }
        TaskCommand::List { date } => {
            let date = date.unwrap_or_else(|| logical_date_key(now, settings.daily_start));
            let tasks = stage_api::list_tasks(&date)?;
            if json {
                print_json(&tasks)?;
            } else {
                print_tasks_plain(&tasks);
            }
        }
        TaskCommand::Delete { id } => {
            let task = stage_api::delete_task(&id)?;
            if json {
                print_json(&task)?;
            } else {
                println!("Deleted task: {} ({})", task.title, task.id);
            }
        }
    }

    Ok(())
}

fn run_stage_command(command: StageCommand, json: bool) -> Result<(), AppError> {
    let (verb, task_id, stage) = match command {
        StageCommand::Add {
            task_id,
            start,
            duration,
        } => {
            let start = start.as_deref().map(parse_clock_time).transpose()?;
            let stage = stage_api::add_stage(&task_id, start, duration, local_now()?)?;
            ("Added", task_id, stage)
        }
        StageCommand::Move {
            task_id,
            stage_id,
            start,
        } => {
            let stage = stage_api::move_stage(&task_id, stage_id, parse_clock_time(&start)?)?;
            ("Moved", task_id, stage)
        }
        StageCommand::Resize {
            task_id,
            stage_id,
            duration,
        } => {
            let stage = stage_api::resize_stage(&task_id, stage_id, duration)?;
            ("Resized", task_id, stage)
        }
        StageCommand::Status {
            task_id,
            stage_id,
            status,
        } => {
            let status = StageStatus::parse(&status).ok_or_else(|| {
                AppError::invalid_input(format!(
                    "status must be upcoming, process, done or undone: {status}"
                ))
            })?;
            let stage = stage_api::set_stage_status(&task_id, stage_id, status)?;
            ("Updated", task_id, stage)
        }
        StageCommand::Delete { task_id, stage_id } => {
            let stage = stage_api::delete_stage(&task_id, stage_id)?;
            ("Deleted", task_id, stage)
        }
    };

    if json {
        print_json(&stage)?;
    } else {
        println!(
            "{verb} stage {} of {}: {} [{}]",
            stage.id,
            task_id,
            stage_slot(&stage),
            stage.status.label()
        );
    }

    Ok(())
}

fn run_watch(
    interval_secs: u64,
    ticks: Option<u64>,
    json: bool,
    settings: &Settings,
) -> Result<(), AppError> {
    let mut follower = DayFollower::new(local_now()?, settings.daily_start);
    let mut tick = 0;

    while ticks.is_none_or(|limit| tick < limit) {
        if tick > 0 {
            std::thread::sleep(Duration::from_secs(interval_secs));
        }

        let now = local_now()?;
        if let Some(date) = follower.tick(now, settings.daily_start) {
            info!("day rolled over to {}", format_date_key(date));
        }

        let day = stage_api::timeline(
            &format_date_key(follower.selected()),
            now,
            settings.daily_start,
        )?;
        if json {
            print_json(&day)?;
        } else {
            print_timeline_plain(&day, &settings.palette);
        }
        tick += 1;
    }

    Ok(())
}

fn run_command(cli: Cli) -> Result<(), AppError> {
    let settings = resolve_settings(&cli.config_override)?;

    match cli.command {
        Command::Today => {
            let now = local_now()?;
            let key = logical_date_key(now, settings.daily_start);
            if cli.json {
                print_json(&serde_json::json!({
                    "logical_date": key,
                    "daily_start_minutes": settings.daily_start,
                    "daily_start": format_clock_time(settings.daily_start),
                }))?;
            } else {
                println!(
                    "Logical day: {} (day starts at {})",
                    key,
                    format_clock_time(settings.daily_start)
                );
            }
        }
        Command::Task { task } => run_task_command(task, cli.json, &settings)?,
        Command::Stage { stage } => run_stage_command(stage, cli.json)?,
        Command::Timeline { date } => {
            let now = local_now()?;
            let date = date.unwrap_or_else(|| logical_date_key(now, settings.daily_start));
            let day = stage_api::timeline(&date, now, settings.daily_start)?;
            if cli.json {
                print_json(&day)?;
            } else {
                print_timeline_plain(&day, &settings.palette);
            }
        }
        Command::Due => {
            let due = stage_api::due_stages(local_now()?, settings.daily_start)?;
            if cli.json {
                print_json(&due)?;
            } else {
                print_due_plain(&due, &settings.palette);
            }
        }
        Command::Notify => {
            let notifier = notifier_from_env()?;
            let outcome =
                stage_api::notify_due(local_now()?, settings.daily_start, notifier.as_ref())?;
            for failure in &outcome.failures {
                eprintln!(
                    "ERROR: stage {} of {}: {}",
                    failure.stage_id, failure.task_id, failure.error
                );
            }
            if cli.json {
                print_json(&outcome.notified)?;
            } else {
                for item in &outcome.notified {
                    println!(
                        "Notified: {} ({}) stage {} - {}",
                        item.task_title,
                        item.task_id,
                        item.stage_id,
                        item.action.label()
                    );
                }
            }
        }
        Command::Watch {
            interval_secs,
            ticks,
        } => run_watch(interval_secs, ticks, cli.json, &settings)?,
    }

    Ok(())
}

fn run_interactive() -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock.read_line(&mut input)?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("focus".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", parse_error_to_app(err));
                continue;
            }
        };

        if let Err(err) = run_command(cli) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn main() {
    init_logging();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version arrive here as well.
            if !err.use_stderr() {
                let _ = err.print();
                return;
            }
            eprintln!("ERROR: {}", parse_error_to_app(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::split_command_line;

    #[test]
    fn split_command_line_honours_quotes() {
        let args = split_command_line(r#"task add "Write \"the\" report" --date 2024-03-02"#)
            .unwrap();
        assert_eq!(
            args,
            vec!["task", "add", "Write \"the\" report", "--date", "2024-03-02"]
        );
    }

    #[test]
    fn split_command_line_keeps_empty_quotes_and_stray_backslashes() {
        let args = split_command_line(r#"  task  add ""  "C:\tmp"  "#).unwrap();
        assert_eq!(args, vec!["task", "add", "", r"C:\tmp"]);
    }

    #[test]
    fn split_command_line_rejects_unterminated_quote() {
        let err = split_command_line("task add \"oops").unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }
}
