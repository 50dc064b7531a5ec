use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;

const TIMEZONE_CONFIG_FILE: &str = "perch-time.toml";
const TIMEZONE_ENV_VAR: &str = "PERCH_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str = "PERCH_TIME_CONFIG";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
    timezone: Option<String>,
    time: Option<TimezoneSection>,
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
    timezone: Option<String>,
}

/// Named-zone override for resolving "today". `None` means the system local
/// zone, which is the default for a personal board.
pub fn board_timezone() -> Option<&'static Tz> {
    static BOARD_TZ: OnceLock<Option<Tz>> = OnceLock::new();
    BOARD_TZ.get_or_init(resolve_board_timezone).as_ref()
}

/// The board's current calendar date. Relative labels and date expressions
/// are anchored to this, at local midnight.
#[must_use]
pub fn board_today(now: DateTime<Utc>) -> NaiveDate {
    match board_timezone() {
        Some(tz) => now.with_timezone(tz).date_naive(),
        None => now.with_timezone(&Local).date_naive(),
    }
}

fn resolve_board_timezone() -> Option<Tz> {
    if let Ok(raw) = std::env::var(TIMEZONE_ENV_VAR)
        && let Some(tz) = parse_timezone(&raw, TIMEZONE_ENV_VAR)
    {
        return Some(tz);
    }

    if let Some(path) = timezone_config_path()
        && let Some(tz) = load_timezone_from_file(&path)
    {
        return Some(tz);
    }

    tracing::debug!("no timezone override; using system local zone");
    None
}

fn timezone_config_path() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var(TIMEZONE_CONFIG_ENV_VAR) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    std::env::current_dir()
        .ok()
        .map(|dir| dir.join(TIMEZONE_CONFIG_FILE))
}

fn load_timezone_from_file(path: &PathBuf) -> Option<Tz> {
    if !path.exists() {
        return None;
    }

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::error!(
                file = %path.display(),
                error = %err,
                "failed reading timezone config file"
            );
            return None;
        }
    };

    let parsed = match toml::from_str::<TimezoneConfig>(&raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::error!(
                file = %path.display(),
                error = %err,
                "failed parsing timezone config file"
            );
            return None;
        }
    };

    let timezone = parsed
        .timezone
        .or_else(|| parsed.time.and_then(|section| section.timezone));
    let Some(timezone) = timezone else {
        tracing::warn!(
            file = %path.display(),
            "timezone config had no timezone field"
        );
        return None;
    };

    parse_timezone(timezone.as_str(), &format!("file:{}", path.display()))
}

fn parse_timezone(raw: &str, source: &str) -> Option<Tz> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        tracing::warn!(source, "timezone source was empty");
        return None;
    }

    match trimmed.parse::<Tz>() {
        Ok(tz) => {
            tracing::info!(source, timezone = %trimmed, "configured board timezone");
            Some(tz)
        }
        Err(err) => {
            tracing::error!(
                source,
                timezone = %trimmed,
                error = %err,
                "failed to parse timezone id"
            );
            None
        }
    }
}

/// Parses a user-facing date argument into the stored `YYYY-MM-DD` form.
/// An empty argument clears the field and maps to an empty string.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_date_arg(input: &str, today: NaiveDate) -> anyhow::Result<String> {
    let token = input.trim();
    if token.is_empty() {
        return Ok(String::new());
    }
    let lower = token.to_ascii_lowercase();

    match lower.as_str() {
        "today" => return Ok(format_date(today)),
        "tomorrow" => return shifted(today, 1),
        "yesterday" => return shifted(today, -1),
        _ => {}
    }

    if let Some(target_weekday) = parse_weekday_name(&lower) {
        return Ok(format_date(next_weekday_date(today, target_weekday)));
    }

    let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)d$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;
    if let Some(caps) = rel_re.captures(&lower) {
        let num: i64 = caps
            .name("num")
            .map(|m| m.as_str())
            .ok_or_else(|| anyhow!("missing relative amount"))?
            .parse()
            .context("invalid relative day count")?;
        let signed = if caps.name("sign").map(|m| m.as_str()) == Some("-") {
            -num
        } else {
            num
        };
        return shifted(today, signed);
    }

    if let Ok(date) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
        return Ok(format_date(date));
    }

    Err(anyhow!("unrecognized date expression: {input}")).with_context(|| {
        "supported formats: today/tomorrow/yesterday, weekday names (e.g. \
         friday), +Nd/-Nd, YYYY-MM-DD"
    })
}

fn shifted(today: NaiveDate, days: i64) -> anyhow::Result<String> {
    let date = today
        .checked_add_signed(Duration::days(days))
        .ok_or_else(|| anyhow!("date out of range: {days} days from {today}"))?;
    Ok(format_date(date))
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Human label for a stored date, relative to `today`: `Due today`,
/// `Due tomorrow`, `Due in 2 days`, `Due yesterday`, `Due 2 days ago`, and a
/// long form (`Due Fri, Mar 20, 2026`) beyond two days either way. Anything
/// that is not a dashed numeric calendar date comes back unchanged, and an
/// empty string stays empty.
pub fn relative_label(raw: &str, today: NaiveDate) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let Some(target) = parse_stored_date(raw) else {
        return raw.to_string();
    };

    match (target - today).num_days() {
        0 => "Due today".to_string(),
        1 => "Due tomorrow".to_string(),
        2 => "Due in 2 days".to_string(),
        -1 => "Due yesterday".to_string(),
        -2 => "Due 2 days ago".to_string(),
        _ => format!("Due {}", target.format("%a, %b %-d, %Y")),
    }
}

/// True when `raw` holds a calendar date strictly before `today`.
/// Malformed and empty values are never overdue.
pub fn is_overdue(raw: &str, today: NaiveDate) -> bool {
    parse_stored_date(raw).is_some_and(|date| date < today)
}

/// Strict `year-month-day` with all-digit segments. Impossible calendar
/// dates (month 13) are rejected rather than rolled over.
fn parse_stored_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.split('-');
    let (y, m, d) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    if [y, m, d]
        .iter()
        .any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

fn parse_weekday_name(token: &str) -> Option<Weekday> {
    match token.trim() {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thur" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

fn next_weekday_date(from: NaiveDate, target: Weekday) -> NaiveDate {
    let from_idx = from.weekday().num_days_from_monday() as i64;
    let target_idx = target.num_days_from_monday() as i64;
    let mut delta = (7 + target_idx - from_idx) % 7;
    if delta == 0 {
        delta = 7;
    }
    from.checked_add_signed(Duration::days(delta)).unwrap_or(from)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{parse_date_arg, relative_label};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn labels_near_dates_with_fixed_phrases() {
        let today = day(2026, 3, 10);
        assert_eq!(relative_label("2026-03-10", today), "Due today");
        assert_eq!(relative_label("2026-03-11", today), "Due tomorrow");
        assert_eq!(relative_label("2026-03-12", today), "Due in 2 days");
        assert_eq!(relative_label("2026-03-09", today), "Due yesterday");
        assert_eq!(relative_label("2026-03-08", today), "Due 2 days ago");
    }

    #[test]
    fn labels_far_dates_with_the_target_date() {
        let today = day(2026, 3, 10);
        assert_eq!(relative_label("2026-03-20", today), "Due Fri, Mar 20, 2026");
        assert_eq!(relative_label("2026-03-05", today), "Due Thu, Mar 5, 2026");
    }

    #[test]
    fn malformed_dates_fall_back_to_the_raw_string() {
        let today = day(2026, 3, 10);
        assert_eq!(relative_label("", today), "");
        assert_eq!(relative_label("soonish", today), "soonish");
        assert_eq!(relative_label("2026-03", today), "2026-03");
        assert_eq!(relative_label("03/10/2026", today), "03/10/2026");
        assert_eq!(relative_label("2026-13-40", today), "2026-13-40");
        assert_eq!(relative_label("2026--10", today), "2026--10");
    }

    #[test]
    fn parses_date_expressions() {
        let today = day(2026, 3, 10);
        assert_eq!(
            parse_date_arg("2026-04-01", today).expect("iso"),
            "2026-04-01"
        );
        assert_eq!(parse_date_arg("today", today).expect("today"), "2026-03-10");
        assert_eq!(
            parse_date_arg("tomorrow", today).expect("tomorrow"),
            "2026-03-11"
        );
        assert_eq!(parse_date_arg("+3d", today).expect("plus"), "2026-03-13");
        assert_eq!(parse_date_arg("-2d", today).expect("minus"), "2026-03-08");
        assert_eq!(
            parse_date_arg("friday", today).expect("weekday"),
            "2026-03-13"
        );
        assert_eq!(parse_date_arg("  ", today).expect("blank clears"), "");
        assert!(parse_date_arg("someday", today).is_err());
    }
}
