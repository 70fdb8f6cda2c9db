// Duration text parser: "1h 2m 3s" style strings to total seconds

use regex::Regex;
use std::sync::LazyLock;

// optional hours, minutes, seconds in that order; whitespace between them is tolerated
static COMPONENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:([0-9]+)h)?\s*(?:([0-9]+)m)?\s*(?:([0-9]+)s)?").unwrap()
});

/// Parse a duration string to seconds. Text without any h/m/s component yields 0.
pub fn parse_duration(text: &str) -> u64 {
    let Some(caps) = COMPONENTS.captures(text) else {
        return 0;
    };
    let component = |index: usize, scale: u64| {
        caps.get(index)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .map_or(0, |n| n.saturating_mul(scale))
    };
    component(1, 3600)
        .saturating_add(component(2, 60))
        .saturating_add(component(3, 1))
}
