//! Command-line interface definition.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand};
use eventflow_core::{
    EventId, Frequency, LogFormat, Recurrence, RelativeDay, RuleDraft, WeekdaySet,
};

/// eventflow - Your calendar from the terminal
#[derive(Debug, Parser)]
#[command(name = "eventflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "EVENTFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log line format: compact, pretty or json
    #[arg(long, value_name = "FORMAT", env = "EVENTFLOW_LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Base URL of the event store API
    #[arg(long, env = "EVENTFLOW_API_URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session credential
    Login {
        #[arg(long, short)]
        username: String,

        /// Password, or a `pass::` / `env::` reference
        #[arg(long, short, env = "EVENTFLOW_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and log in with it
    Register {
        #[arg(long, short)]
        username: String,

        /// Password, or a `pass::` / `env::` reference
        #[arg(long, short, env = "EVENTFLOW_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long, short)]
        email: Option<String>,
    },

    /// Forget the stored session credential
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List every occurrence, recurring instances included
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List occurrences that have not finished yet
    Upcoming {
        /// Maximum number of occurrences to display
        #[arg(long, short = 'n', default_value_t = 10)]
        limit: usize,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Create an event
    Create {
        #[arg(long, short)]
        title: String,

        /// Start time (RFC 3339, or `YYYY-MM-DD HH:MM` in UTC)
        #[arg(long, short, value_parser = parse_time)]
        start: DateTime<Utc>,

        /// End time (RFC 3339, or `YYYY-MM-DD HH:MM` in UTC)
        #[arg(long, short, value_parser = parse_time)]
        end: DateTime<Utc>,

        #[arg(long, short)]
        description: Option<String>,

        /// Mark as an all-day event
        #[arg(long)]
        all_day: bool,

        #[command(flatten)]
        recurrence: RecurrenceArgs,
    },

    /// Change an existing event; unset options keep their current value
    Update {
        id: EventId,

        #[arg(long, short)]
        title: Option<String>,

        #[arg(long, short, value_parser = parse_time)]
        start: Option<DateTime<Utc>>,

        #[arg(long, short, value_parser = parse_time)]
        end: Option<DateTime<Utc>>,

        #[arg(long, short)]
        description: Option<String>,

        #[arg(long)]
        all_day: Option<bool>,

        #[command(flatten)]
        recurrence: RecurrenceArgs,
    },

    /// Move one occurrence to a new time window
    ///
    /// Moving an instance of a recurring event moves the whole series.
    Move {
        id: EventId,

        /// Current start of the occurrence to move
        #[arg(long, value_parser = parse_time)]
        from: DateTime<Utc>,

        #[arg(long, short, value_parser = parse_time)]
        start: DateTime<Utc>,

        #[arg(long, short, value_parser = parse_time)]
        end: DateTime<Utc>,
    },

    /// Delete an event, with every occurrence if it recurs
    Delete { id: EventId },

    /// Delete a single occurrence of a recurring event
    DeleteInstance {
        id: EventId,

        /// Start of the occurrence to delete
        #[arg(long, short, value_parser = parse_time)]
        start: DateTime<Utc>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Show configuration file path
    Path,
}

/// Recurrence options shared by `create` and `update`.
#[derive(Debug, Clone, Default, Args)]
pub struct RecurrenceArgs {
    /// Repeat the event: daily, weekly, monthly or yearly
    #[arg(long, value_name = "FREQ")]
    pub repeat: Option<Frequency>,

    /// Repeat every N periods
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub interval: Option<i64>,

    /// Days of the week for weekly rules, e.g. `MO,WE,FR`
    #[arg(long, value_name = "DAYS")]
    pub weekdays: Option<WeekdaySet>,

    /// Day of the month for monthly rules, e.g. `1MO` or `-1FR`
    #[arg(long, value_name = "NTH")]
    pub relative_day: Option<RelativeDay>,

    /// Last date the event repeats on
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    pub until: Option<NaiveDate>,

    /// Stop repeating
    #[arg(
        long,
        conflicts_with_all = ["repeat", "interval", "weekdays", "relative_day", "until"]
    )]
    pub no_repeat: bool,
}

impl RecurrenceArgs {
    fn touches_rule(&self) -> bool {
        self.repeat.is_some()
            || self.interval.is_some()
            || self.weekdays.is_some()
            || self.relative_day.is_some()
            || self.until.is_some()
    }

    /// Applies the options on top of an existing recurrence state.
    ///
    /// Any rule option switches recurrence on, starting from the default
    /// daily rule when it was off. Without options the state is unchanged.
    pub fn apply(&self, current: Recurrence) -> Recurrence {
        if self.no_repeat {
            return Recurrence::None;
        }
        if !self.touches_rule() {
            return current;
        }

        let mut rule = match current {
            Recurrence::Recurring(rule) => rule,
            Recurrence::None => RuleDraft::default(),
        };
        if let Some(frequency) = self.repeat {
            rule.frequency = Some(frequency);
        }
        if let Some(interval) = self.interval {
            rule.interval = interval;
        }
        if let Some(weekdays) = &self.weekdays {
            rule.weekdays = Some(weekdays.clone());
        }
        if let Some(relative_day) = self.relative_day {
            rule.relative_day = Some(relative_day);
        }
        if let Some(until) = self.until {
            rule.end_date = Some(until);
        }
        Recurrence::Recurring(rule)
    }
}

const NAIVE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parses a command-line time. Times without an offset are taken as UTC and
/// a bare date means midnight UTC.
pub fn parse_time(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Ok(time.with_timezone(&Utc));
    }
    for format in NAIVE_TIME_FORMATS {
        if let Ok(time) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(time.and_utc());
        }
    }
    if let Ok(date) = parse_date(value)
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight.and_utc());
    }
    Err(format!(
        "invalid time '{}', expected RFC 3339 or YYYY-MM-DD HH:MM",
        value
    ))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", value))
}
