use std::fmt;

use anyhow::Result;
use chrono::{NaiveTime, Timelike};
use serde::{Serialize, Serializer};

/// A GTFS arrival or departure time. GTFS counts hours from the start of the service day, so a
/// trip running past midnight has times like `25:10:00`. That's stored as `01:10:00` with
/// `next_day` set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServiceTime {
    pub next_day: bool,
    pub time: NaiveTime,
}

impl ServiceTime {
    /// Parses `H:MM:SS` or `HH:MM:SS`. Only one wraparound past midnight is supported, so the
    /// hour must be below 48.
    pub fn parse(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.trim().split(':').collect();
        if parts.len() != 3 || parts.iter().any(|x| x.is_empty()) {
            bail!("Invalid time format {raw:?}");
        }
        let mut hour: u32 = parts[0]
            .parse()
            .map_err(|err| anyhow!("Invalid hour in {raw:?}: {err}"))?;
        let minute: u32 = parts[1]
            .parse()
            .map_err(|err| anyhow!("Invalid minute in {raw:?}: {err}"))?;
        let second: u32 = parts[2]
            .parse()
            .map_err(|err| anyhow!("Invalid second in {raw:?}: {err}"))?;

        let mut next_day = false;
        if hour > 23 {
            hour -= 24;
            next_day = true;
        }
        if hour > 23 {
            bail!("{raw:?} is more than one day past the start of service");
        }
        let time = match NaiveTime::from_hms_opt(hour, minute, second) {
            Some(x) => x,
            None => bail!("Invalid time {raw:?}"),
        };
        Ok(Self { next_day, time })
    }

    /// The time of day, always below 24 hours
    pub fn time_of_day(&self) -> String {
        self.time.format("%H:%M:%S").to_string()
    }

    /// Back to the GTFS form, with hours past 23 for the next day
    pub fn to_gtfs_string(&self) -> String {
        let hour = self.time.hour() + if self.next_day { 24 } else { 0 };
        format!(
            "{:02}:{:02}:{:02}",
            hour,
            self.time.minute(),
            self.time.second()
        )
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_gtfs_string())
    }
}

// Consumers expect `["HH:MM:SS", next_day]`
impl Serialize for ServiceTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.time_of_day(), self.next_day).serialize(serializer)
    }
}
