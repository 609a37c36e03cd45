//! Lossless hexadecimal float text, `0x1.8000000000000p+1` style.
//!
//! Layout: optional sign, `0x`, leading digit (1 for normals, 0 for zero and
//! subnormals), 13 hex fraction digits, binary exponent in decimal.

use thiserror::Error;

const FRAC_BITS: u32 = 52;
const FRAC_MASK: u64 = (1 << FRAC_BITS) - 1;
const EXP_BIAS: i32 = 1023;
const MAX_SHIFT: i64 = 2200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexFloatError {
    #[error("empty hex float")]
    Empty,
    #[error("invalid hex float '{0}'")]
    Invalid(String),
    #[error("hex float '{0}' has too many significant digits")]
    TooLong(String),
}

/// Format `x` as a hexadecimal float.
pub fn format(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    let sign = if x.is_sign_negative() { "-" } else { "" };
    if x.is_infinite() {
        return format!("{sign}inf");
    }

    let bits = x.to_bits();
    let exp_bits = ((bits >> FRAC_BITS) & 0x7ff) as i32;
    let frac = bits & FRAC_MASK;

    match (exp_bits, frac) {
        (0, 0) => format!("{sign}0x0.0p+0"),
        (0, _) => format!("{sign}0x0.{frac:013x}p-{}", EXP_BIAS - 1),
        _ => format!("{sign}0x1.{frac:013x}p{:+}", exp_bits - EXP_BIAS),
    }
}

/// Multiply by 2^e without overflowing the intermediate power.
fn scale_by_pow2(mut v: f64, mut e: i32) -> f64 {
    while e > 1000 {
        v *= pow2(1000);
        e -= 1000;
    }
    while e < -1000 {
        v *= pow2(-1000);
        e += 1000;
    }
    v * pow2(e)
}

fn pow2(e: i32) -> f64 {
    f64::from_bits(((e + EXP_BIAS) as u64) << FRAC_BITS)
}

/// Parse a hexadecimal float produced by [`format`] (or any `[-]0xH.HHHp±D`).
pub fn parse(s: &str) -> Result<f64, HexFloatError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(HexFloatError::Empty);
    }
    let invalid = || HexFloatError::Invalid(s.to_string());

    let (negative, body) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let signed = |v: f64| if negative { -v } else { v };

    match body.to_ascii_lowercase().as_str() {
        "inf" | "infinity" => return Ok(signed(f64::INFINITY)),
        "nan" => return Ok(f64::NAN),
        _ => {}
    }

    let body = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
        .unwrap_or(body);
    let (digits, exp) = match body.find(['p', 'P']) {
        Some(i) => (&body[..i], body[i + 1..].parse::<i32>().map_err(|_| invalid())?),
        None => (body, 0),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }

    let mut mantissa: u64 = 0;
    let mut significant = 0;
    for c in int_part.chars().chain(frac_part.chars()) {
        let d = c.to_digit(16).ok_or_else(invalid)? as u64;
        if mantissa != 0 || d != 0 {
            significant += 1;
        }
        if significant > 15 {
            return Err(HexFloatError::TooLong(s.to_string()));
        }
        mantissa = mantissa * 16 + d;
    }

    // Anything past +/-MAX_SHIFT has already saturated to inf or zero.
    let shift = (i64::from(exp) - 4 * frac_part.len() as i64).clamp(-MAX_SHIFT, MAX_SHIFT);
    Ok(signed(scale_by_pow2(mantissa as f64, shift as i32)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_known_values() {
        assert_eq!(format(1.0), "0x1.0000000000000p+0");
        assert_eq!(format(-2.5), "-0x1.4000000000000p+1");
        assert_eq!(format(0.1), "0x1.999999999999ap-4");
        assert_eq!(format(0.0), "0x0.0p+0");
        assert_eq!(format(-0.0), "-0x0.0p+0");
        assert_eq!(format(f64::from_bits(1)), "0x0.0000000000001p-1022");
        assert_eq!(format(f64::INFINITY), "inf");
        assert_eq!(format(f64::NAN), "nan");
    }

    #[test]
    fn test_parse_known_values() {
        assert_eq!(parse("0x1.0000000000000p+0"), Ok(1.0));
        assert_eq!(parse("-0x1.4p1"), Ok(-2.5));
        assert_eq!(parse("0x1.999999999999ap-4"), Ok(0.1));
        assert_eq!(parse("0x0.0000000000001p-1022"), Ok(f64::from_bits(1)));
        assert_eq!(parse("-inf"), Ok(f64::NEG_INFINITY));
        assert!(parse("nan").unwrap().is_nan());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse(""), Err(HexFloatError::Empty));
        assert!(matches!(parse("0x1.gp+0"), Err(HexFloatError::Invalid(_))));
        assert!(matches!(parse("0x.p+0"), Err(HexFloatError::Invalid(_))));
        assert!(matches!(parse("0x1p+"), Err(HexFloatError::Invalid(_))));
    }

    #[test]
    fn test_parse_extreme_exponents_saturate() {
        assert_eq!(parse("0x1.0p-2147483648"), Ok(0.0));
        assert_eq!(parse("0x1p2147483647"), Ok(f64::INFINITY));
        assert_eq!(parse("-0x1p2147483647"), Ok(f64::NEG_INFINITY));
        let long_zero_fraction = format!("0x1.{}p+0", "0".repeat(5000));
        assert_eq!(parse(&long_zero_fraction), Ok(0.0));
        assert!(matches!(parse("0x1p99999999999"), Err(HexFloatError::Invalid(_))));
    }

    #[test]
    fn test_lossless_for_awkward_values() {
        let values = [
            std::f64::consts::PI,
            -1.0 / 3.0,
            f64::MAX,
            f64::MIN_POSITIVE,
            f64::MIN_POSITIVE / 3.0,
            1.2345678901234567e-300,
            9.87654321e250,
        ];
        for v in values {
            let back = parse(&format(v)).unwrap();
            assert_eq!(back.to_bits(), v.to_bits(), "{v} -> {} -> {back}", format(v));
        }
    }
}
