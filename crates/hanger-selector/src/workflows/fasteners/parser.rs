use regex::Regex;
use std::sync::OnceLock;

use super::{Dimension, FastenerDescriptor, FastenerParseFailure, LengthUnit, ParseFailureKind};
use crate::workflows::normalizer::collapse_whitespace;

const NUMBER: &str = r"\d+\s+\d+/\d+|\d+/\d+|\d*\.\d+|\d+";
const UNIT: &str = r#"inch(?:es)?|in\.?|mm|"|''|″|”"#;

fn markup_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("markup pattern compiles"))
}

fn count_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\(\s*(\d+)\s*\)\s*(.*)$").expect("count pattern compiles"))
}

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([^\s()/]+)\s*(?:/\s*)?(?:\((.*)\))?\s*$").expect("code pattern compiles")
    })
}

fn dimension_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let pattern = format!(
            r"(?i)^(?P<dia>{NUMBER})\s*(?P<dia_unit>{UNIT})?\s*[x×]\s*(?P<len>{NUMBER})\s*(?P<len_unit>{UNIT})\s*(?P<finish>.*)$"
        );
        Regex::new(&pattern).expect("dimension pattern compiles")
    })
}

/// Parses `(N) CODE (DIAMETER x LENGTH FINISH)`, tolerating a markup break or `/`
/// between the code and the dimension clause.
pub fn parse(text: &str) -> Result<FastenerDescriptor, FastenerParseFailure> {
    let fail = |recovered_count: u32, kind: ParseFailureKind| FastenerParseFailure {
        raw: text.to_string(),
        recovered_count,
        kind,
    };

    let cleaned = collapse_whitespace(&markup_pattern().replace_all(text, " "));
    if cleaned.is_empty() {
        return Err(fail(0, ParseFailureKind::Empty));
    }

    let (count, rest) = match count_pattern().captures(&cleaned) {
        Some(captures) => {
            let count = captures[1]
                .parse::<u32>()
                .ok()
                .filter(|count| *count > 0)
                .ok_or_else(|| fail(0, ParseFailureKind::MissingCount))?;
            (count, captures.get(2).map_or("", |m| m.as_str()))
        }
        None => return Err(fail(0, ParseFailureKind::MissingCount)),
    };

    let captures = code_pattern()
        .captures(rest)
        .ok_or_else(|| fail(count, ParseFailureKind::MissingSpecCode))?;
    let spec_code = captures[1].to_string();
    let clause = captures
        .get(2)
        .map(|m| m.as_str().trim())
        .ok_or_else(|| fail(count, ParseFailureKind::MissingDimensions))?;

    let dimensions = dimension_pattern()
        .captures(clause)
        .ok_or_else(|| fail(count, ParseFailureKind::InvalidDimensions))?;

    let length_unit = parse_unit(&dimensions["len_unit"]);
    let diameter_unit = dimensions
        .name("dia_unit")
        .map_or(length_unit, |m| parse_unit(m.as_str()));
    let diameter = parse_number(&dimensions["dia"])
        .and_then(|value| Dimension::new(value, diameter_unit))
        .ok_or_else(|| fail(count, ParseFailureKind::InvalidDimensions))?;
    let length = parse_number(&dimensions["len"])
        .and_then(|value| Dimension::new(value, length_unit))
        .ok_or_else(|| fail(count, ParseFailureKind::InvalidDimensions))?;

    Ok(FastenerDescriptor {
        count,
        spec_code,
        diameter,
        length,
        finish: dimensions["finish"].trim().to_string(),
        raw: text.to_string(),
    })
}

fn parse_unit(unit: &str) -> LengthUnit {
    if unit.eq_ignore_ascii_case("mm") {
        LengthUnit::Millimetre
    } else {
        LengthUnit::Inch
    }
}

/// Decimal, whole, `n/d` and mixed `w n/d` forms.
fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Some((whole, fraction)) = text.split_once(char::is_whitespace) {
        return Some(whole.parse::<f64>().ok()? + parse_fraction(fraction.trim())?);
    }
    if text.contains('/') {
        return parse_fraction(text);
    }
    text.parse::<f64>().ok()
}

fn parse_fraction(text: &str) -> Option<f64> {
    let (numerator, denominator) = text.split_once('/')?;
    let numerator = numerator.trim().parse::<f64>().ok()?;
    let denominator = denominator.trim().parse::<f64>().ok()?;
    (denominator != 0.0).then(|| numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn parses_common_nail_descriptor() {
        let parsed = parse(r#"(6) 10HDG (0.148" x 3" HDG 10d Common)"#).expect("parses");
        assert_eq!(parsed.count, 6);
        assert_eq!(parsed.spec_code, "10HDG");
        assert_close(parsed.diameter.value(), 0.148);
        assert_close(parsed.length.value(), 3.0);
        assert_eq!(parsed.finish, "HDG 10d Common");
    }

    #[test]
    fn parses_mixed_fraction_lengths() {
        let parsed = parse(r#"(4) N10 (0.148" x 1 1/2" HDG)"#).expect("parses");
        assert_eq!(parsed.count, 4);
        assert_eq!(parsed.spec_code, "N10");
        assert_close(parsed.diameter.value(), 0.148);
        assert_close(parsed.length.value(), 1.5);
        assert_eq!(parsed.finish, "HDG");
    }

    #[test]
    fn tolerates_markup_breaks_and_inch_words() {
        let slash = parse("(6) 10HDG / (0.148in x 3in HDG 10d Common)").expect("slash form");
        let markup = parse("(6) 10HDG<br/>(0.148 in x 3 in HDG 10d Common)").expect("markup form");
        let quoted = parse(r#"(6) 10HDG (0.148" x 3" HDG 10d Common)"#).expect("quoted form");
        assert_eq!(slash.key(), quoted.key());
        assert_eq!(markup.key(), quoted.key());
        assert_eq!(slash.raw, "(6) 10HDG / (0.148in x 3in HDG 10d Common)");
    }

    #[test]
    fn metric_dimensions_keep_their_unit() {
        let parsed = parse("(10) CNA4.0x40 (4.0mm x 40mm)").expect("metric form");
        assert_eq!(parsed.diameter.unit(), LengthUnit::Millimetre);
        assert_close(parsed.length.value(), 40.0);
        assert_eq!(parsed.finish, "");
    }

    #[test]
    fn canonical_rendering_reparses_to_the_same_identity() {
        for sample in [
            r#"(6) 10HDG (0.148" x 3" HDG 10d Common)"#,
            r#"(4) N10 (0.148" x 1 1/2" HDG)"#,
            "(6) 10HDG / (0.148in x 3in HDG 10d Common)",
        ] {
            let parsed = parse(sample).expect("sample parses");
            let reparsed = parse(&parsed.to_string()).expect("canonical form parses");
            assert_eq!(reparsed.key(), parsed.key());
            assert_eq!(reparsed.count, parsed.count);
        }
        let parsed = parse(r#"(4) N10 (0.148" x 1 1/2" HDG)"#).expect("parses");
        assert_eq!(parsed.to_string(), r#"(4) N10 (0.148" x 1.5" HDG)"#);
    }

    #[test]
    fn failures_keep_raw_text_and_recoverable_count() {
        let missing_clause = parse("(8) SD9112").expect_err("no dimensions");
        assert_eq!(missing_clause.kind, ParseFailureKind::MissingDimensions);
        assert_eq!(missing_clause.recovered_count, 8);
        assert_eq!(missing_clause.raw, "(8) SD9112");

        let garbled = parse("(2) 16d (sinker)").expect_err("no numbers");
        assert_eq!(garbled.kind, ParseFailureKind::InvalidDimensions);
        assert_eq!(garbled.recovered_count, 2);

        let no_count = parse("10HDG (0.148\" x 3\")").expect_err("no count");
        assert_eq!(no_count.kind, ParseFailureKind::MissingCount);
        assert_eq!(no_count.recovered_count, 0);

        let zero = parse("(0) N10 (0.148\" x 1.5\")").expect_err("zero count");
        assert_eq!(zero.recovered_count, 0);

        assert_eq!(parse("  ").expect_err("blank").kind, ParseFailureKind::Empty);
    }

    #[test]
    fn number_forms() {
        assert_eq!(parse_number("1 1/2"), Some(1.5));
        assert_eq!(parse_number("3/4"), Some(0.75));
        assert_eq!(parse_number(".162"), Some(0.162));
        assert_eq!(parse_number("1/0"), None);
    }
}
