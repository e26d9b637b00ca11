use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::Weekday;

use crate::error::{Result, ScienceError};

/// Which authors to harvest on each day of the week.
///
/// Loaded from the `[roster]` table of the config file, keyed by weekday
/// name (`monday`, `Tue`, ...).
#[derive(Debug, Clone, Default)]
pub struct WeeklyRoster {
    days: BTreeMap<u8, Vec<String>>,
    authors_per_run: usize,
}

impl WeeklyRoster {
    pub fn from_config(table: &BTreeMap<String, Vec<String>>, authors_per_run: usize) -> Result<Self> {
        let mut days = BTreeMap::new();
        for (key, names) in table {
            let day = Weekday::from_str(key.trim())
                .map_err(|_| ScienceError::Validation(format!("unknown roster day '{key}'")))?;
            days.insert(day.num_days_from_monday() as u8, names.clone());
        }
        Ok(Self { days, authors_per_run })
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// The trimmed, non-empty author names scheduled for `day`.
    pub fn authors_for(&self, day: Weekday) -> Result<Vec<String>> {
        let scheduled = self
            .days
            .get(&(day.num_days_from_monday() as u8))
            .ok_or_else(|| ScienceError::Validation(format!("no authors scheduled for {day}")))?;

        let names: Vec<String> = scheduled
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if names.len() != self.authors_per_run {
            return Err(ScienceError::Validation(format!(
                "roster for {day} lists {} authors, expected {}",
                names.len(),
                self.authors_per_run
            )));
        }
        Ok(names)
    }
}
