use std::fmt;

/// An exact currency amount in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price {
    cents: u64,
}

impl Price {
    pub fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    pub fn cents(&self) -> u64 {
        self.cents
    }

    /// Parse displayed price text that must start with `prefix`.
    ///
    /// `"$1,299.00"` and `"$790"` parse; `"N/A"`, `"1299"` (no prefix),
    /// `"$1,2,3"` and `"$12.345"` do not. Commas only separate thousands.
    pub fn parse(text: &str, prefix: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix(prefix)?;
        parse_amount(rest)
    }

    /// Parse an amount where the currency prefix is optional.
    ///
    /// Cart and order totals on most storefronts drop the symbol.
    pub fn parse_lenient(text: &str, prefix: &str) -> Option<Self> {
        let text = text.trim();
        parse_amount(text.strip_prefix(prefix).unwrap_or(text))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

fn parse_amount(raw: &str) -> Option<Price> {
    let raw = raw.trim();
    let (whole, frac) = match raw.split_once('.') {
        Some((w, f)) => (w, f),
        None => (raw, ""),
    };
    let whole = strip_thousands(whole)?;
    if whole.is_empty() || frac.len() > 2 {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole: u64 = whole.parse().ok()?;
    let frac: u64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<u64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };
    whole.checked_mul(100)?.checked_add(frac).map(Price::from_cents)
}

/// Remove `,` thousands separators. A leading group of one to three digits
/// must be followed by groups of exactly three; anything else is rejected.
fn strip_thousands(whole: &str) -> Option<String> {
    let mut groups = whole.split(',');
    let first = groups.next()?;
    let mut digits = first.to_string();
    let mut grouped = false;
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        grouped = true;
        digits.push_str(group);
    }
    if grouped && (first.is_empty() || first.len() > 3) {
        return None;
    }
    Some(digits)
}
