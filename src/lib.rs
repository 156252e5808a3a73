//! # Taskmaster
//!
//! A terminal task tracker that rewards finishing on time. Tasks are scheduled
//! for a date and time; completing one earns points, points raise your level,
//! and milestones unlock achievements.
//!
//! The scoring engine lives in [`scoring`], [`stats`] and [`achievements`];
//! [`analytics`] rolls task history up into daily and monthly summaries.
//! [`lifecycle`] applies task edits against a [`storage::Store`], and
//! [`commands`] / [`tui`] are the two front ends.

pub mod achievements;
pub mod analytics;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod lifecycle;
pub mod models;
pub mod owner;
pub mod scoring;
pub mod stats;
pub mod storage;
pub mod tui;
