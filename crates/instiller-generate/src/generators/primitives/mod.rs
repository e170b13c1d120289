use std::fmt::Write;

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use rand::Rng;

use crate::errors::{GenerationError, Result};
use crate::generators::{GeneratorPlugin, PluginRegistry, PluginRng, pattern_or};

pub const NUMBER: &str = "NUMBER";
pub const DATE: &str = "DATE";

const DEFAULT_NUMBER_RANGE: &str = "0,1000";
const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_DATE_SPAN_DAYS: i64 = 365;

/// Register the number and date plugins.
pub fn register(registry: &mut PluginRegistry, seed: Option<u64>) {
    registry.register(
        NUMBER,
        NumberPlugin {
            rng: PluginRng::new(NUMBER, seed),
        },
    );
    registry.register(
        DATE,
        DatePlugin {
            rng: PluginRng::new(DATE, seed),
        },
    );
}

/// Number within an inclusive `min,max` range.
///
/// Integer bounds yield integers; otherwise the output keeps as many
/// fraction digits as the most precise bound.
struct NumberPlugin {
    rng: PluginRng,
}

impl GeneratorPlugin for NumberPlugin {
    fn generate(&self, pattern: &str, _seed: &str) -> Result<String> {
        let range = pattern_or(pattern, DEFAULT_NUMBER_RANGE);
        let (min, max) = split_pair(range)
            .ok_or_else(|| GenerationError::plugin(NUMBER, format!("range '{range}' is not 'min,max'")))?;

        let decimals = fraction_digits(min).max(fraction_digits(max));
        if decimals == 0 {
            let min = parse_bound::<i64>(min)?;
            let max = parse_bound::<i64>(max)?;
            check_order(min, max, range)?;
            return self
                .rng
                .with(|rng| rng.random_range(min..=max).to_string());
        }

        let min = parse_bound::<f64>(min)?;
        let max = parse_bound::<f64>(max)?;
        check_order(min, max, range)?;
        self.rng
            .with(|rng| format!("{:.decimals$}", rng.random_range(min..=max)))
    }
}

fn split_pair(text: &str) -> Option<(&str, &str)> {
    let (first, second) = text.split_once(',')?;
    Some((first.trim(), second.trim()))
}

fn fraction_digits(literal: &str) -> usize {
    literal
        .split_once('.')
        .map(|(_, fraction)| fraction.len())
        .unwrap_or(0)
}

fn parse_bound<T: std::str::FromStr>(literal: &str) -> Result<T> {
    literal
        .parse()
        .map_err(|_| GenerationError::plugin(NUMBER, format!("'{literal}' is not a number")))
}

fn check_order<T: PartialOrd>(min: T, max: T, range: &str) -> Result<()> {
    if min > max {
        return Err(GenerationError::plugin(
            NUMBER,
            format!("range '{range}' has min greater than max"),
        ));
    }
    Ok(())
}

/// Calendar date formatted with a chrono pattern.
///
/// The seed may bound the draw with `from,to` ISO dates; by default the date
/// falls within a year of today.
struct DatePlugin {
    rng: PluginRng,
}

impl GeneratorPlugin for DatePlugin {
    fn generate(&self, pattern: &str, seed: &str) -> Result<String> {
        let format = pattern_or(pattern, DEFAULT_DATE_FORMAT);
        let (from, to) = date_bounds(seed)?;
        let span = (to - from).num_days();
        let offset = self.rng.with(|rng| rng.random_range(0..=span))?;
        let date = from + Duration::days(offset);

        let mut output = String::new();
        write!(output, "{}", date.and_time(NaiveTime::MIN).format(format)).map_err(|_| {
            GenerationError::plugin(DATE, format!("'{format}' is not a usable date format"))
        })?;
        Ok(output)
    }
}

fn date_bounds(seed: &str) -> Result<(NaiveDate, NaiveDate)> {
    let seed = seed.trim();
    if seed.is_empty() {
        let today = Utc::now().date_naive();
        let span = Duration::days(DEFAULT_DATE_SPAN_DAYS);
        return Ok((today - span, today + span));
    }

    let (from, to) = split_pair(seed)
        .ok_or_else(|| GenerationError::plugin(DATE, format!("seed '{seed}' is not 'from,to'")))?;
    let from = parse_date(from)?;
    let to = parse_date(to)?;
    if from > to {
        return Err(GenerationError::plugin(
            DATE,
            format!("seed '{seed}' ends before it starts"),
        ));
    }
    Ok((from, to))
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|err| GenerationError::plugin(DATE, format!("'{text}' is not a date: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        register(&mut registry, Some(3));
        registry
    }

    #[test]
    fn decimals_follow_the_bounds() {
        let registry = registry();
        for _ in 0..20 {
            let value = registry.invoke(NUMBER, "1.5,2.25", "").expect("number");
            assert_eq!(fraction_digits(&value), 2, "{value}");
            let parsed: f64 = value.parse().expect("float");
            assert!((1.5..=2.25).contains(&parsed));
        }
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = registry()
            .invoke(NUMBER, "9,1", "")
            .expect_err("min greater than max");
        assert!(matches!(err, GenerationError::Plugin { .. }));
    }

    #[test]
    fn dates_stay_within_seed_bounds() {
        let registry = registry();
        for _ in 0..20 {
            let value = registry
                .invoke(DATE, "%d/%m/%Y", "2020-02-01,2020-02-03")
                .expect("date");
            let date = NaiveDate::parse_from_str(&value, "%d/%m/%Y").expect("parse date");
            assert!(date >= NaiveDate::from_ymd_opt(2020, 2, 1).expect("date"));
            assert!(date <= NaiveDate::from_ymd_opt(2020, 2, 3).expect("date"));
        }
    }
}
