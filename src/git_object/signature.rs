use super::{Error, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

static SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<name>[^<]*?) <(?<email>[^>]*)> (?<epoch>-?[0-9]+) (?<sign>[+-])(?<hours>[0-9]{2})(?<minutes>[0-9]{2})$")
        .expect("signature regex is valid")
});

/// `name <email> <epoch-seconds> <+HHMM>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorSignature {
    name: String,
    email: String,
    timestamp: i64,
    /// Minutes east of UTC.
    offset: i32,
}

impl AuthorSignature {
    pub fn new(name: impl Into<String>, email: impl Into<String>, timestamp: i64, offset: i32) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            timestamp,
            offset,
        }
    }

    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        Self::new(name, email, timestamp, 0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }
}

impl fmt::Display for AuthorSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.offset < 0 { '-' } else { '+' };
        let offset = self.offset.abs();
        write!(
            f,
            "{} <{}> {} {sign}{:02}{:02}",
            self.name,
            self.email,
            self.timestamp,
            offset / 60,
            offset % 60
        )
    }
}

impl FromStr for AuthorSignature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = SIGNATURE
            .captures(s)
            .ok_or_else(|| Error::corrupt_object(format!("malformed signature: {s:?}")))?;

        let timestamp = caps["epoch"].parse::<i64>()?;
        let hours = caps["hours"].parse::<i32>()?;
        let minutes = caps["minutes"].parse::<i32>()?;
        let mut offset_minutes = hours * 60 + minutes;
        if &caps["sign"] == "-" {
            offset_minutes = -offset_minutes;
        }

        Ok(Self {
            name: caps["name"].to_string(),
            email: caps["email"].to_string(),
            timestamp,
            offset: offset_minutes,
        })
    }
}
