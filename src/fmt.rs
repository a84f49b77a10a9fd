/// Parse an `HH:MM` duration into total minutes.
///
/// Both parts must be non-negative integers. Minutes are taken as given,
/// so `"01:75"` is 135 minutes.
pub fn parse_hhmm(raw: &str) -> Option<u32> {
    let (hours, minutes) = raw.split_once(':')?;
    if minutes.contains(':') {
        return None;
    }
    let hours: u32 = hours.trim().parse().ok()?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    hours.checked_mul(60)?.checked_add(minutes)
}

/// Format total minutes as `HH:MM` (hours are not wrapped at 24).
pub fn minutes_to_hhmm(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Label of the one-hour bucket starting at `hour`, e.g. `08:00 - 08:59`.
pub fn hour_interval(hour: u8) -> String {
    format!("{hour:02}:00 - {hour:02}:59")
}

/// File-name friendly form of a display name: `M&Q SPA` -> `m_q_spa`.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_sep = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_sep = false;
        } else if !last_sep {
            out.push('_');
            last_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("00:00"), Some(0));
        assert_eq!(parse_hhmm("01:30"), Some(90));
        assert_eq!(parse_hhmm("12:05"), Some(725));
        assert_eq!(parse_hhmm("1:5"), Some(65));
    }

    #[test]
    fn test_parse_hhmm_does_not_bound_minutes() {
        assert_eq!(parse_hhmm("01:75"), Some(135));
    }

    #[test]
    fn test_parse_hhmm_rejects_malformed() {
        assert_eq!(parse_hhmm("abc"), None);
        assert_eq!(parse_hhmm("12"), None);
        assert_eq!(parse_hhmm(""), None);
        assert_eq!(parse_hhmm("-1:00"), None);
        assert_eq!(parse_hhmm("01:-5"), None);
        assert_eq!(parse_hhmm("01:02:03"), None);
        assert_eq!(parse_hhmm("aa:10"), None);
    }

    #[test]
    fn test_hhmm_roundtrip() {
        for h in [0u32, 1, 9, 23, 47, 99] {
            for m in [0u32, 1, 30, 59] {
                let s = format!("{h:02}:{m:02}");
                assert_eq!(minutes_to_hhmm(parse_hhmm(&s).unwrap()), s);
            }
        }
    }

    #[test]
    fn test_hour_interval() {
        assert_eq!(hour_interval(0), "00:00 - 00:59");
        assert_eq!(hour_interval(8), "08:00 - 08:59");
        assert_eq!(hour_interval(23), "23:00 - 23:59");
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("M&Q SPA"), "m_q_spa");
        assert_eq!(slug("  Coseducam S.A. "), "coseducam_s_a");
        assert_eq!(slug("MSD"), "msd");
    }
}
