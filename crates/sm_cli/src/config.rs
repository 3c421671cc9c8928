use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Durations such as `45s`, `2m` or `1m30s`. A bare number counts as seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let too_large = || format!("Duration is too large: {}", s);
        let mut rest = s.trim();
        if rest.is_empty() {
            return Err("Duration must include a number".to_string());
        }

        let mut total_seconds = 0u64;
        while !rest.is_empty() {
            let digits_end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            let (digits, tail) = rest.split_at(digits_end);
            if digits.is_empty() {
                return Err(format!("Expected a number in duration: {}", s));
            }
            let value: u64 = digits.parse().map_err(|_| too_large())?;

            let tail = tail.trim_start();
            let mut units = tail.chars();
            let (unit_seconds, next) = match units.next() {
                None => (1, ""),
                Some('s') => (1, units.as_str()),
                Some('m') => (60, units.as_str()),
                Some('h') => (3600, units.as_str()),
                Some(unit) => return Err(format!("Invalid duration unit: {}", unit)),
            };

            total_seconds = value
                .checked_mul(unit_seconds)
                .and_then(|seconds| total_seconds.checked_add(seconds))
                .ok_or_else(too_large)?;
            rest = next.trim_start();
        }

        if total_seconds == 0 {
            return Err("Duration must be longer than zero".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

/// `<data dir>/surfmind/state.json`, or `./surfmind-state.json` without a data dir.
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("surfmind").join("state.json"))
        .unwrap_or_else(|| PathBuf::from("surfmind-state.json"))
}
