// Elapsed-Time Formatting Helpers
//
// Both display policies live here so the lifecycle and the workload report
// cannot drift apart: the frozen per-task duration ("2h15m0s", round-trip
// parseable) and the aggregated hour total ("2h 30m").

/// Format elapsed milliseconds as hours/minutes/seconds with unit suffixes.
///
/// Leading zero units are omitted ("15m0s", "42s"); the seconds component is
/// always present. Rounds to whole seconds; negative intervals keep a
/// leading sign.
pub fn format_elapsed(ms: i64) -> String {
    let negative = ms < 0;
    let total_secs = (ms.abs() + 500) / 1000;
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;

    let body = if h > 0 {
        format!("{}h{}m{}s", h, m, s)
    } else if m > 0 {
        format!("{}m{}s", m, s)
    } else {
        format!("{}s", s)
    };

    // An interval that rounds to zero carries no sign
    if negative && total_secs > 0 {
        format!("-{}", body)
    } else {
        body
    }
}

/// Parse a `format_elapsed` string back to milliseconds.
///
/// Accepts exactly the shapes the formatter emits, so
/// format -> parse -> format is the identity on formatted strings.
pub fn parse_elapsed(s: &str) -> Option<i64> {
    let (negative, rest) = match s.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, s),
    };
    let rest = rest.strip_suffix('s')?;

    let (hours, rest) = match rest.split_once('h') {
        Some((h, tail)) => (h.parse::<i64>().ok()?, tail),
        None => (0, rest),
    };
    let (minutes, rest) = match rest.split_once('m') {
        Some((m, tail)) => (m.parse::<i64>().ok()?, tail),
        None => (0, rest),
    };
    let seconds = rest.parse::<i64>().ok()?;

    if hours < 0 || minutes < 0 || seconds < 0 {
        return None;
    }

    let total_ms = (hours * 3600 + minutes * 60 + seconds) * 1000;
    Some(if negative { -total_ms } else { total_ms })
}

/// Format a floating hour total as `"<h>h <m>m"`.
///
/// The minute component is rounded; a rounded value of 60 carries into the
/// hour component so 2.999999 hours reads "3h 0m", never "2h 60m".
pub fn format_hour_total(hours: f64) -> String {
    let mut h = hours.floor() as i64;
    let mut m = ((hours - h as f64) * 60.0).round() as i64;
    if m == 60 {
        h += 1;
        m = 0;
    }
    format!("{}h {}m", h, m)
}
