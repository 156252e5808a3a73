use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::Zone;
use crate::error::{Result, TaskError};
use crate::scoring::{is_on_time, points, level_for};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl FromStr for Priority {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(TaskError::invalid(format!(
                "unrecognized priority '{}'. Use low, medium or high.",
                other
            ))),
        }
    }
}

/// Represents a single scheduled task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    /// Unique identifier for the task.
    pub id: u64,
    /// The user who owns the task. Never changes.
    pub owner_id: u64,
    pub title: String,
    /// Scheduled calendar date.
    pub date: NaiveDate,
    /// Scheduled hour and minute, stored as `HH:MM`.
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Unset until the first completion.
    #[serde(default)]
    pub completed_on_time: Option<bool>,
    #[serde(default)]
    pub points_earned: u32,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Marks the task complete at `at`, scoring it against its schedule.
    ///
    /// The schedule is read in `zone`. Calling this on an already-completed
    /// task re-stamps it.
    pub fn complete(&mut self, at: DateTime<Utc>, zone: Zone) {
        let on_time = is_on_time(self.date, self.time, at, zone);
        self.completed = true;
        self.completed_at = Some(at);
        self.completed_on_time = Some(on_time);
        self.points_earned = points(self.priority, on_time);
    }

    /// Returns the task to the incomplete state, clearing all completion data.
    pub fn reopen(&mut self) {
        self.completed = false;
        self.completed_at = None;
        self.completed_on_time = None;
        self.points_earned = 0;
    }

    /// True only for tasks completed on or before their scheduled time.
    pub fn on_time(&self) -> bool {
        self.completed_on_time == Some(true)
    }

    pub fn scheduled_hour(&self) -> u32 {
        self.time.hour()
    }
}

/// A registered user and their derived progression.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Unique login handle.
    pub username: String,
    #[serde(default)]
    pub total_points: u32,
    #[serde(default = "first_level")]
    pub level: u32,
    /// Maintained outside this crate; only read here.
    #[serde(default)]
    pub current_streak: u32,
    pub created_at: DateTime<Utc>,
}

fn first_level() -> u32 {
    level_for(0)
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| TaskError::invalid(format!("invalid date '{}': {}. Use YYYY-MM-DD.", raw, e)))
}

/// Parses an `HH:MM` time.
pub fn parse_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|e| TaskError::invalid(format!("invalid time '{}': {}. Use HH:MM.", raw, e)))
}

/// Trims a title, rejecting empty ones.
pub fn parse_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(TaskError::invalid("title must not be empty"));
    }
    Ok(title.to_string())
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}
