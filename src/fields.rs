//! Enumerations and field types for tasks.
//!
//! This module defines the priority and status values a task carries, along with
//! the upper-case tokens they are written as in the text database file.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ParseTokenError;

/// Priority classification for task importance, ordered from lowest to highest.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    #[value(alias = "1")]
    Low,
    #[value(alias = "2")]
    Medium,
    #[value(alias = "3")]
    High,
    #[value(alias = "4")]
    Urgent,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    /// Token written to the database file.
    pub fn as_token(self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }

    /// Menu number (1 for LOW up to 4 for URGENT).
    pub fn number(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Urgent => 4,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for Priority {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            "URGENT" => Ok(Priority::Urgent),
            _ => Err(ParseTokenError::new("priority", s)),
        }
    }
}

/// Task lifecycle status. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[serde(alias = "TO_DO")]
    Todo,
    Done,
    Failed,
}

impl Status {
    /// Token written to the database file.
    pub fn as_token(self) -> &'static str {
        match self {
            Status::Todo => "TODO",
            Status::Done => "DONE",
            Status::Failed => "FAILED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Done | Status::Failed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for Status {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            // Older database files spell the open status TO_DO.
            "TODO" | "TO_DO" => Ok(Status::Todo),
            "DONE" => Ok(Status::Done),
            "FAILED" => Ok(Status::Failed),
            _ => Err(ParseTokenError::new("status", s)),
        }
    }
}
