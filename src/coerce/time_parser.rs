// src/coerce/time_parser.rs

use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;

static LOOSE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<hours>\d{1,2})[.:](?P<minutes>\d{1,2})(?:[.:](?P<seconds>\d{1,2}))? ?(?P<ampm>[AaPp][Mm])?",
    )
    .expect("time pattern compiles")
});

/// Parse with the strict `fmt` first, then fall back to [`parse_loose_time`].
pub fn parse_time(s: &str, fmt: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, fmt)
        .ok()
        .or_else(|| parse_loose_time(s))
}

/// Forgiving time reader for hand-typed FileMaker times:
/// `H:M`, `H:M:S`, `H.M`, optional `am`/`pm`, found anywhere in the text.
/// `pm` adds 12 below noon and hour 24 wraps to midnight.
pub fn parse_loose_time(s: &str) -> Option<NaiveTime> {
    let caps = LOOSE_TIME.captures(s)?;
    let mut h: u32 = caps.name("hours")?.as_str().parse().ok()?;
    let m: u32 = caps.name("minutes")?.as_str().parse().ok()?;
    let sec: u32 = match caps.name("seconds") {
        Some(x) => x.as_str().parse().ok()?,
        None => 0,
    };
    if let Some(ampm) = caps.name("ampm") {
        if ampm.as_str().eq_ignore_ascii_case("pm") && h < 12 {
            h += 12;
        }
    }
    if h > 23 {
        h = 0;
    }
    NaiveTime::from_hms_opt(h, m, sec)
}
