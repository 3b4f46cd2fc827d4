//! Text and number cleaning shared by the extractors and the matcher.

use bigdecimal::{BigDecimal, Zero};
use regex::Regex;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;

/// Business abbreviations, applied in this order.
///
/// `DOANH NGHIỆP` is first shortened to `DN` and then expanded again by the
/// following entry; the chain is kept as-is.
const ABBREVIATIONS: &[(&str, &str)] = &[
    (r"\bTM\b", "THUONG MAI"),
    (r"\bTHƯƠNG MẠI\b", "THUONG MAI"),
    (r"\bDV\b", "DICH VU"),
    (r"\bDỊCH VỤ\b", "DICH VU"),
    (r"\bTNHH\b", "TRACH NHIEM HUU HAN"),
    (r"\bCP\b", "CO PHAN"),
    (r"\bMTV\b", "MOT THANH VIEN"),
    (r"\bVT\b", "VAN TAI"),
    (r"\bVẬN TẢI\b", "VAN TAI"),
    (r"\bXN\b", "XI NGIEP"),
    (r"\bXÍ NGHIỆP\b", "XI NGIEP"),
    (r"\bBX\b", "BEN XE"),
    (r"\bBẾN XE\b", "BEN XE"),
    (r"\bĐT\b", "DAU TU"),
    (r"\bĐẦU TƯ\b", "DAU TU"),
    (r"\bXD\b", "XANG DAU"),
    (r"\bXĂNG DẦU\b", "XANG DAU"),
    (r"\bXÂY DỰNG\b", "XAY DUNG"),
    (r"\bDOANH NGHIỆP\b", "DN"),
    (r"\bDN\b", "DOANH NGHIEP"),
];

static ABBREVIATION_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    ABBREVIATIONS
        .iter()
        .map(|(pattern, replacement)| (Regex::new(pattern).expect("abbreviation pattern"), *replacement))
        .collect()
});

static NON_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Z0-9 ]").expect("name filter pattern"));

/// Values spreadsheets export for missing cells
pub fn is_blank(s: &str) -> bool {
    let t = s.trim();
    t.is_empty() || t.eq_ignore_ascii_case("nan")
}

/// Trim, drop a leading apostrophe and collapse inner whitespace
pub fn clean_string(s: &str) -> String {
    if s.eq_ignore_ascii_case("nan") {
        return String::new();
    }
    let trimmed = s.trim();
    let trimmed = trimmed.strip_prefix('\'').unwrap_or(trimmed);
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Amount text: `,` is a thousands separator. Blank or junk -> `None`
pub fn parse_amount(s: &str) -> Option<f64> {
    let cleaned = s.replace(',', "");
    let cleaned = cleaned.trim();
    if is_blank(cleaned) {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Measurement text (temperature, density): a lone `,` is the decimal mark.
/// Anything else with a comma is not a number.
pub fn parse_measure(s: &str) -> Option<f64> {
    let t = s.trim();
    if is_blank(t) {
        return None;
    }
    let normalized = match t.matches(',').count() {
        0 => t.to_string(),
        1 if !t.contains('.') => t.replace(',', "."),
        _ => return None,
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Decimal from the shortest representation of `v`; non-finite -> 0
pub fn to_decimal(v: f64) -> BigDecimal {
    if !v.is_finite() {
        return BigDecimal::zero();
    }
    BigDecimal::from_str(&v.to_string()).unwrap_or_else(|_| BigDecimal::zero())
}

/// Quantity as compared between BKHD and BM19 (3 decimals)
pub fn quantity_decimal(v: f64) -> BigDecimal {
    to_decimal(round3(v))
}

fn vat_number(raw: &str) -> Option<f64> {
    if is_blank(raw) {
        return None;
    }
    raw.replace('%', "").trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// VAT code ("8%", "10", "0.08") as a fraction
pub fn parse_vat_rate(raw: &str) -> BigDecimal {
    match vat_number(raw) {
        Some(v) if v >= 1.0 => to_decimal(v / 100.0),
        Some(v) => to_decimal(v),
        None => BigDecimal::zero(),
    }
}

/// Two-digit tax code ("08", "10"); unparseable codes pass through
pub fn format_tax_code(raw: &str) -> String {
    if is_blank(raw) {
        return String::new();
    }
    match vat_number(raw) {
        Some(mut v) => {
            if v > 0.0 && v < 1.0 {
                v *= 100.0;
            }
            format!("{:02}", v.round() as i64)
        }
        None => raw.to_string(),
    }
}

/// Tax IDs are compared on their upper-cased alphanumerics only
pub fn normalize_mst(raw: &str) -> String {
    raw.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect()
}

/// Upper-case, expand abbreviations, keep `[A-Z0-9 ]`, collapse spaces
pub fn normalize_name(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    let mut s = name.to_uppercase();
    for (re, replacement) in ABBREVIATION_PATTERNS.iter() {
        s = re.replace_all(&s, *replacement).into_owned();
    }
    let s = NON_NAME_CHARS.replace_all(&s, "");
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Token-set Jaccard index of two normalized names
pub fn name_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let na = normalize_name(a);
    let nb = normalize_name(b);
    let s1: HashSet<&str> = na.split_whitespace().collect();
    let s2: HashSet<&str> = nb.split_whitespace().collect();
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }
    let common = s1.intersection(&s2).count();
    let union = s1.union(&s2).count();
    common as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_string_strips_apostrophe_and_spaces() {
        assert_eq!(clean_string("  'Công ty   TNHH  A "), "Công ty TNHH A");
        assert_eq!(clean_string("nan"), "");
        assert_eq!(clean_string("NaN"), "");
    }

    #[test]
    fn amounts_drop_thousands_separators() {
        assert_eq!(parse_amount("1,234.5"), Some(1234.5));
        assert_eq!(parse_amount(" 12 "), Some(12.0));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("nan"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn measures_read_comma_as_decimal_mark() {
        assert_eq!(parse_measure("28,5"), Some(28.5));
        assert_eq!(parse_measure(" 0,8421 "), Some(0.8421));
        assert_eq!(parse_measure("0.8421"), Some(0.8421));
        assert_eq!(parse_measure("1,234.5"), None);
        assert_eq!(parse_measure("1,2,3"), None);
        assert_eq!(parse_measure("n/a"), None);
        assert_eq!(parse_measure(""), None);
    }

    #[test]
    fn quantity_decimal_rounds_to_three_places() {
        assert_eq!(quantity_decimal(100.0004), quantity_decimal(100.0));
        assert_eq!(quantity_decimal(99.9996), BigDecimal::from(100));
        assert_ne!(quantity_decimal(100.001), quantity_decimal(100.0));
    }

    #[test]
    fn vat_rate_accepts_percent_and_fraction() {
        let eight = BigDecimal::from_str("0.08").unwrap();
        assert_eq!(parse_vat_rate("8%"), eight);
        assert_eq!(parse_vat_rate("8"), eight);
        assert_eq!(parse_vat_rate("0.08"), eight);
        assert_eq!(parse_vat_rate("10%"), BigDecimal::from_str("0.1").unwrap());
        assert!(parse_vat_rate("KCT").is_zero());
        assert!(parse_vat_rate("").is_zero());
    }

    #[test]
    fn tax_code_is_two_digits() {
        assert_eq!(format_tax_code("8%"), "08");
        assert_eq!(format_tax_code("0.1"), "10");
        assert_eq!(format_tax_code("10"), "10");
        assert_eq!(format_tax_code("KCT"), "KCT");
        assert_eq!(format_tax_code("nan"), "");
    }

    #[test]
    fn mst_keeps_alphanumerics() {
        assert_eq!(normalize_mst("0101-234.567 "), "0101234567");
        assert_eq!(normalize_mst("ab12"), "AB12");
    }

    #[test]
    fn normalize_name_expands_abbreviations() {
        assert_eq!(
            normalize_name("Công ty TNHH TM DV Hải Long"),
            "CNG TY TRACH NHIEM HUU HAN THUONG MAI DICH VU HI LONG"
        );
        assert_eq!(normalize_name("Xăng dầu  Nam Định"), "XANG DAU NAM NH");
    }

    #[test]
    fn doanh_nghiep_round_trips_through_dn() {
        assert_eq!(normalize_name("Doanh nghiệp tư nhân An"), "DOANH NGHIEP T NHN AN");
        assert_eq!(normalize_name("DN An"), "DOANH NGHIEP AN");
    }

    #[test]
    fn abbreviations_only_match_whole_words() {
        assert_eq!(normalize_name("TMX"), "TMX");
    }

    #[test]
    fn similarity_is_jaccard_on_tokens() {
        assert_eq!(name_similarity("Công ty TM An", "Cong ty Thuong mai An"),
            name_similarity("Cong ty Thuong mai An", "Công ty TM An"));
        assert_eq!(name_similarity("A B C D", "A B C D"), 1.0);
        assert_eq!(name_similarity("A B", "A C"), 1.0 / 3.0);
        assert_eq!(name_similarity("", "A"), 0.0);
        assert_eq!(name_similarity("...", "A"), 0.0);
    }

    #[test]
    fn similarity_is_symmetric() {
        let names = ["Cty TNHH Vận tải Minh", "CTY VT MINH", "Xí nghiệp BX", "", "DN Hòa"];
        for a in names {
            for b in names {
                assert_eq!(name_similarity(a, b), name_similarity(b, a));
            }
        }
    }
}
