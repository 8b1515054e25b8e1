//! Drop-denominated money. 1 XRP = 1,000,000 drops; every balance and every
//! bill amount in the engine is an `i64` drop count. The ledger reports XRP
//! deltas as decimal strings, so conversion is an exact string parse —
//! a float round-trip could not distinguish amounts one drop apart.

pub type Drops = i64;

pub const DROPS_PER_XRP: i64 = 1_000_000;

const XRP_DECIMALS: usize = 6;

/// Parses a ledger-reported XRP amount ("12", "-0.5", "0.000001") into an
/// exact drop count. Returns `None` for anything that does not encode a whole
/// number of drops: malformed strings, more than six fractional digits, or
/// values outside the i64 drop range.
pub fn xrp_str_to_drops(value: &str) -> Option<Drops> {
    let (negative, rest) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, f),
        None => (rest, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if frac_part.len() > XRP_DECIMALS {
        return None;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };
    let mut frac: i64 = if frac_part.is_empty() {
        0
    } else {
        frac_part.parse().ok()?
    };
    frac *= 10_i64.pow((XRP_DECIMALS - frac_part.len()) as u32);

    let drops = whole.checked_mul(DROPS_PER_XRP)?.checked_add(frac)?;
    Some(if negative { -drops } else { drops })
}

/// Formats a drop count as the ledger's decimal XRP notation, trimming
/// trailing fractional zeros ("1500000" -> "1.5", "1" -> "0.000001").
pub fn drops_to_xrp_string(drops: Drops) -> String {
    let sign = if drops < 0 { "-" } else { "" };
    let abs = drops.unsigned_abs();
    let whole = abs / DROPS_PER_XRP as u64;
    let frac = abs % DROPS_PER_XRP as u64;
    if frac == 0 {
        return format!("{}{}", sign, whole);
    }
    let frac_str = format!("{:06}", frac);
    format!("{}{}.{}", sign, whole, frac_str.trim_end_matches('0'))
}
