use std::{fmt::Write, hash::Hash};

use chrono::{DateTime, Datelike, TimeZone, Utc};

/// The archive owner's profile. Every field is optional in the archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub timezone: Option<String>,
}

impl User {
    /// "First Last", falling back to the email, then to "unknown".
    pub fn display_name(&self) -> String {
        let name: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if !name.is_empty() {
            return name.join(" ");
        }
        self.email.clone().unwrap_or_else(|| "unknown".to_string())
    }
}

/// A photo row. `backing` locates the stored bytes, see [`crate::backing`].
#[derive(Debug, Clone, Default)]
pub struct Photo {
    pub pid: Vec<u8>,
    /// UNIX timestamp in UTC
    pub timestamp: Option<i64>,
    pub year: i32,
    pub source_type: Option<String>,
    pub source_name: Option<String>,
    pub device_type: Option<String>,
    pub device_name: Option<String>,
    pub backing: Vec<u8>,
}

impl Photo {
    pub fn pid_hex(&self) -> String {
        hex(&self.pid)
    }

    pub fn taken_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(timestamp_to_utc)
    }
}

impl Eq for Photo {}

impl PartialEq for Photo {
    fn eq(&self, other: &Self) -> bool {
        self.pid == other.pid
    }
}

impl Hash for Photo {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.pid.hash(state);
    }
}

pub fn timestamp_to_utc(timestamp: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(timestamp, 0).single()
}

/// Year of a UTC timestamp, used when the archive row carries no year.
pub fn year_from_timestamp(timestamp: Option<i64>) -> Option<i32> {
    timestamp.and_then(timestamp_to_utc).map(|date| date.year())
}

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}
