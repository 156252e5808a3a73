use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::storage::default_db_path;

/// Time zone used to anchor scheduled dates: day buckets, "today", and the
/// instant a task is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl Zone {
    /// Resolves a wall-clock time in this zone to an instant.
    ///
    /// Ambiguous times (DST fall-back) take the earlier instant; times that fall
    /// into a DST gap are pushed forward an hour.
    pub fn resolve(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        match self {
            Zone::Local => resolve_in(&Local, naive),
            Zone::Utc => resolve_in(&Utc, naive),
            Zone::Fixed(offset) => resolve_in(offset, naive),
        }
    }

    /// The instant the given calendar day starts.
    pub fn midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        self.resolve(date.and_time(NaiveTime::MIN))
    }

    /// The calendar day an instant falls on.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Zone::Local => instant.with_timezone(&Local).date_naive(),
            Zone::Utc => instant.date_naive(),
            Zone::Fixed(offset) => instant.with_timezone(offset).date_naive(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }
}

fn resolve_in<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return dt.with_timezone(&Utc);
    }
    tz.from_local_datetime(&(naive + Duration::hours(1)))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

impl FromStr for Zone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Zone::Local),
            "utc" | "z" => Ok(Zone::Utc),
            other => {
                let parsed = DateTime::parse_from_str(&format!("2000-01-01T00:00:00{}", other), "%Y-%m-%dT%H:%M:%S%:z")
                    .map_err(|_| format!("unrecognized time zone '{}'. Use local, utc or +HH:MM.", s))?;
                Ok(Zone::Fixed(*parsed.offset()))
            }
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Local => write!(f, "local"),
            Zone::Utc => write!(f, "utc"),
            Zone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

/// Runtime settings shared by the CLI and the TUI.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the JSON data file.
    pub db_path: PathBuf,
    pub zone: Zone,
    /// Username of the acting owner, if one was supplied.
    pub user: Option<String>,
}

impl Config {
    /// Builds the configuration from the environment.
    ///
    /// - `TASKMASTER_DB`: data file path (defaults to the XDG data directory).
    /// - `TASKMASTER_TZ`: `local`, `utc` or a fixed `+HH:MM` offset.
    /// - `TASKMASTER_USER`: acting username.
    ///
    /// An unparsable `TASKMASTER_TZ` falls back to `local` with a warning.
    pub fn from_env() -> Self {
        let zone = match std::env::var("TASKMASTER_TZ") {
            Ok(raw) => raw.parse::<Zone>().unwrap_or_else(|e| {
                tracing::warn!("{}", e);
                Zone::default()
            }),
            Err(_) => Zone::default(),
        };
        Config {
            db_path: default_db_path(),
            zone,
            user: std::env::var("TASKMASTER_USER").ok().filter(|u| !u.trim().is_empty()),
        }
    }

    /// Applies command-line flags on top of the environment.
    pub fn with_overrides(mut self, db: Option<PathBuf>, zone: Option<Zone>, user: Option<String>) -> Self {
        if let Some(db) = db {
            self.db_path = db;
        }
        if let Some(zone) = zone {
            self.zone = zone;
        }
        if user.is_some() {
            self.user = user;
        }
        self
    }

    /// Configuration rooted at an explicit data file, used by tests and embedders.
    pub fn at(db_path: impl Into<PathBuf>, zone: Zone) -> Self {
        Config { db_path: db_path.into(), zone, user: None }
    }
}
