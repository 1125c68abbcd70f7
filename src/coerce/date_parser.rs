// src/coerce/date_parser.rs

use chrono::{NaiveDate, NaiveDateTime};

use super::time_parser;

/// Parse a date cell with a chrono pattern such as `"%m/%d/%Y"`.
pub fn parse_date(s: &str, fmt: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), fmt).ok()
}

/// Parse `"<date> <time>"`: the combined pattern first, then the date half with
/// `date_fmt` and the remainder through the time parser (which may be loose).
pub fn parse_timestamp(s: &str, date_fmt: &str, time_fmt: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    let combined = format!("{} {}", date_fmt, time_fmt);
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, &combined) {
        return Some(ts);
    }
    let (date_part, time_part) = s.split_once(char::is_whitespace)?;
    let date = parse_date(date_part, date_fmt)?;
    let time = time_parser::parse_time(time_part, time_fmt)?;
    Some(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_parse_date_and_round_trip() {
        let d = parse_date("25/12/2024", "%d/%m/%Y").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 12, 25).unwrap());
        assert_eq!(d.format("%d/%m/%Y").to_string(), "25/12/2024");
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date("", "%m/%d/%Y"), None);
        assert_eq!(parse_date("13/45/2024", "%m/%d/%Y"), None);
        assert_eq!(parse_date("yesterday", "%m/%d/%Y"), None);
    }

    #[test]
    fn test_parse_timestamp() {
        let want = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(15, 4, 5).unwrap());
        assert_eq!(
            parse_timestamp("01/02/2024 15:04:05", "%m/%d/%Y", "%H:%M:%S"),
            Some(want)
        );

        let loose = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(15, 4, 0).unwrap());
        assert_eq!(
            parse_timestamp("01/02/2024 3:04 pm", "%m/%d/%Y", "%H:%M:%S"),
            Some(loose)
        );
        assert_eq!(parse_timestamp("01/02/2024", "%m/%d/%Y", "%H:%M:%S"), None);
    }
}
