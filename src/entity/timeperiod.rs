//! Time periods: weekly windows referenced by hosts.

use crate::Result;
use crate::diagnostics::Diagnostics;
use crate::entity::{ConfigItem, EntityKind, Item, TimePeriodId};
use crate::error::ConfigError;
use crate::link::LinkContext;
use crate::schema::registry::WEEKDAYS;
use regex::Regex;
use std::collections::BTreeMap;

const RANGE_RE: &str = r"^(\d{1,2}):(\d{2})-(\d{1,2}):(\d{2})$";

/// Half-open window in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: u16,
    pub end: u16,
}

#[derive(Debug, Clone)]
pub struct TimePeriod {
    item: Item,
    ranges: BTreeMap<&'static str, Vec<TimeRange>>,
    pub(crate) excludes: Vec<TimePeriodId>,
}

impl TimePeriod {
    pub fn name(&self) -> &str {
        self.item.name()
    }

    /// Ranges for one weekday, empty when the day is not covered.
    pub fn ranges(&self, day: &str) -> &[TimeRange] {
        self.ranges.get(day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn excludes(&self) -> &[TimePeriodId] {
        &self.excludes
    }
}

fn parse_range(re: &Regex, piece: &str) -> Option<TimeRange> {
    let caps = re.captures(piece.trim())?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u16>().ok());
    let (h1, m1, h2, m2) = (num(1)?, num(2)?, num(3)?, num(4)?);
    let minutes = |h: u16, m: u16| match (h, m) {
        (24, 0) => Some(24 * 60),
        (h, m) if h < 24 && m < 60 => Some(h * 60 + m),
        _ => None,
    };
    let start = minutes(h1, m1)?;
    let end = minutes(h2, m2)?;
    (start < end).then_some(TimeRange { start, end })
}

impl ConfigItem for TimePeriod {
    const KIND: EntityKind = EntityKind::TimePeriod;

    fn from_item(item: Item) -> Self {
        Self {
            item,
            ranges: BTreeMap::new(),
            excludes: Vec::new(),
        }
    }

    fn item(&self) -> &Item {
        &self.item
    }

    fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }

    fn after_normalize(&mut self, diags: &mut Diagnostics) -> Result<()> {
        let re = Regex::new(RANGE_RE)?;
        for &day in WEEKDAYS {
            let Some(value) = self.item.str_attr(day).map(str::to_string) else {
                continue;
            };
            let mut day_ranges = Vec::new();
            for piece in value.split(',').filter(|p| !p.trim().is_empty()) {
                match parse_range(&re, piece) {
                    Some(range) => day_ranges.push(range),
                    None => {
                        diags.report(ConfigError::InvalidTimeRange {
                            entity: self.name().to_string(),
                            day,
                            value: piece.trim().to_string(),
                        });
                        self.item.mark_invalid();
                    }
                }
            }
            self.ranges.insert(day, day_ranges);
        }
        Ok(())
    }

    fn link(&mut self, ctx: &mut LinkContext, diags: &mut Diagnostics) -> Result<()> {
        self.excludes = ctx.link_excludes(&mut self.item, diags);
        Ok(())
    }
}
