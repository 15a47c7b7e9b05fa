//! Quantity normalization and display formatting
//!
//! Kubernetes serializes resource amounts as strings ("500m", "2.5",
//! "512Mi", "129e6"). This module canonicalizes them into integer
//! millicores (CPU) and floating-point mebibytes (memory), and provides
//! the inverse display formatting used by every report table.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantityError {
    #[error("invalid quantity {0:?}")]
    Invalid(String),
    #[error("quantity {0:?} out of range")]
    OutOfRange(String),
}

/// Decomposed quantity: value = mantissa * 10^dec_exp * 2^bin_exp.
struct Parsed {
    mantissa: i128,
    dec_exp: i32,
    bin_exp: u32,
}

fn parse(raw: &str) -> Result<Parsed, QuantityError> {
    let invalid = || QuantityError::Invalid(raw.to_string());
    let s = raw.trim();
    if s.is_empty() {
        return Err(invalid());
    }

    // Suffix first: two-character binary suffixes, then single-character
    // SI suffixes. A trailing 'E' is exa; exponent notation always ends
    // in a digit, so the two never collide.
    let (num, suffix_exp, bin_exp): (&str, i32, u32) = if let Some(p) = s.strip_suffix("Ki") {
        (p, 0, 10)
    } else if let Some(p) = s.strip_suffix("Mi") {
        (p, 0, 20)
    } else if let Some(p) = s.strip_suffix("Gi") {
        (p, 0, 30)
    } else if let Some(p) = s.strip_suffix("Ti") {
        (p, 0, 40)
    } else if let Some(p) = s.strip_suffix("Pi") {
        (p, 0, 50)
    } else if let Some(p) = s.strip_suffix("Ei") {
        (p, 0, 60)
    } else if let Some(p) = s.strip_suffix('m') {
        (p, -3, 0)
    } else if let Some(p) = s.strip_suffix('k') {
        (p, 3, 0)
    } else if let Some(p) = s.strip_suffix('M') {
        (p, 6, 0)
    } else if let Some(p) = s.strip_suffix('G') {
        (p, 9, 0)
    } else if let Some(p) = s.strip_suffix('T') {
        (p, 12, 0)
    } else if let Some(p) = s.strip_suffix('P') {
        (p, 15, 0)
    } else if let Some(p) = s.strip_suffix('E') {
        (p, 18, 0)
    } else {
        (s, 0, 0)
    };

    let (mantissa_str, exp) = match num.find(['e', 'E']) {
        Some(i) => {
            let exp: i32 = num[i + 1..].parse().map_err(|_| invalid())?;
            (&num[..i], exp)
        }
        None => (num, 0),
    };

    let (negative, digits) = match mantissa_str.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, mantissa_str.strip_prefix('+').unwrap_or(mantissa_str)),
    };

    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let mut mantissa: i128 = 0;
    for b in int_part.bytes().chain(frac_part.bytes()) {
        mantissa = mantissa
            .checked_mul(10)
            .and_then(|m| m.checked_add((b - b'0') as i128))
            .ok_or_else(|| QuantityError::OutOfRange(raw.to_string()))?;
    }
    if negative {
        mantissa = -mantissa;
    }

    Ok(Parsed {
        mantissa,
        dec_exp: exp - frac_part.len() as i32 + suffix_exp,
        bin_exp,
    })
}

/// Converts a CPU quantity to millicores, rounding fractional millicores
/// up — the same semantics the API machinery applies to milli-values.
pub fn cpu_millicores(q: &Quantity) -> Result<i64, QuantityError> {
    let p = parse(&q.0)?;
    let out_of_range = || QuantityError::OutOfRange(q.0.clone());

    let mut v = p
        .mantissa
        .checked_mul(1i128 << p.bin_exp)
        .ok_or_else(out_of_range)?;
    let e = p.dec_exp + 3;
    if e >= 0 {
        for _ in 0..e {
            v = v.checked_mul(10).ok_or_else(out_of_range)?;
        }
    } else {
        let mut divisor: i128 = 1;
        for _ in 0..-e {
            divisor = divisor.checked_mul(10).ok_or_else(out_of_range)?;
        }
        v = if v >= 0 { (v + divisor - 1) / divisor } else { v / divisor };
    }
    i64::try_from(v).map_err(|_| out_of_range())
}

/// Converts a memory quantity to mebibytes (bytes / 2^20).
pub fn mem_mib(q: &Quantity) -> Result<f64, QuantityError> {
    let p = parse(&q.0)?;
    let bytes = p.mantissa as f64 * 10f64.powi(p.dec_exp) * 2f64.powi(p.bin_exp as i32);
    Ok(bytes / (1024.0 * 1024.0))
}

/// Formats millicores as "250m", or as cores ("2", "1.50") from 1000m up.
/// Zero formats as the bare literal "0".
pub fn format_cpu(millicores: i64) -> String {
    if millicores == 0 {
        return "0".to_string();
    }
    if millicores < 1000 {
        return format!("{}m", millicores);
    }
    if millicores % 1000 == 0 {
        format!("{}", millicores / 1000)
    } else {
        format!("{:.2}", millicores as f64 / 1000.0)
    }
}

/// Formats a MiB value as "512Mi", or as gibibytes ("2Gi", "1.5Gi") from
/// 1024 MiB up.
pub fn format_mem(mib: f64) -> String {
    if mib >= 1024.0 {
        let gib = mib / 1024.0;
        if gib == gib.trunc() {
            format!("{}Gi", gib as i64)
        } else {
            format!("{:.1}Gi", gib)
        }
    } else {
        format!("{}Mi", mib as i64)
    }
}

/// Over-request factor string: "42x", "N/A" (actual = 0), or "no req"
/// (request = 0). Integer division truncates toward zero, so a bursting
/// pod shows "0x" — intentional, the factor is only meaningful above 1.
pub fn format_factor(req: i64, actual: i64) -> String {
    if req == 0 {
        return "no req".to_string();
    }
    if actual == 0 {
        return "N/A".to_string();
    }
    format!("{}x", req / actual)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(s: &str) -> Quantity {
        Quantity(s.to_string())
    }

    #[test]
    fn cpu_millicores_canonical_forms() {
        let cases = [
            ("500m", 500),
            ("1", 1000),
            ("2.5", 2500),
            ("100m", 100),
            ("0", 0),
            ("0.1", 100),
            ("1500m", 1500),
        ];
        for (input, want) in cases {
            assert_eq!(cpu_millicores(&q(input)).unwrap(), want, "input {input:?}");
        }
    }

    #[test]
    fn cpu_millicores_rounds_fractions_up() {
        // 1.2345 cores -> 1234.5 millicores -> 1235
        assert_eq!(cpu_millicores(&q("1.2345")).unwrap(), 1235);
    }

    #[test]
    fn mem_mib_canonical_forms() {
        let cases = [
            ("512Mi", 512.0),
            ("1Gi", 1024.0),
            ("1536Mi", 1536.0),
            ("256Mi", 256.0),
            ("1048576", 1.0),
            ("128974848", 123.0),
            ("129e6", 129e6 / (1024.0 * 1024.0)),
            ("1Ki", 1.0 / 1024.0),
        ];
        for (input, want) in cases {
            let got = mem_mib(&q(input)).unwrap();
            assert!((got - want).abs() < 1e-9, "input {input:?}: got {got}, want {want}");
        }
    }

    #[test]
    fn rejects_malformed_quantities() {
        for input in ["", "abc", "1.2.3", "Mi", "12x"] {
            assert!(cpu_millicores(&q(input)).is_err(), "input {input:?}");
        }
    }

    #[test]
    fn format_cpu_table() {
        let cases = [
            (0, "0"),
            (250, "250m"),
            (999, "999m"),
            (1000, "1"),
            (2000, "2"),
            (1500, "1.50"),
            (2500, "2.50"),
        ];
        for (input, want) in cases {
            assert_eq!(format_cpu(input), want);
        }
    }

    #[test]
    fn format_mem_table() {
        let cases = [
            (0.0, "0Mi"),
            (512.0, "512Mi"),
            (1023.0, "1023Mi"),
            (1024.0, "1Gi"),
            (2048.0, "2Gi"),
            (1536.0, "1.5Gi"),
        ];
        for (input, want) in cases {
            assert_eq!(format_mem(input), want);
        }
    }

    #[test]
    fn format_factor_table() {
        let cases = [
            (0, 100, "no req"),
            (100, 0, "N/A"),
            (100, 10, "10x"),
            (500, 5, "100x"),
            (50, 100, "0x"),
            (100, 100, "1x"),
        ];
        for (req, actual, want) in cases {
            assert_eq!(format_factor(req, actual), want);
        }
    }
}
