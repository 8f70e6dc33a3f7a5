//! Writing floating point numbers in text encodings.
//!
//! Text mesh formats don't say how numbers have to be written. We use the
//! notation of C's `printf("%.*g", precision, v)`, which is what most mesh
//! tools produce and every parser understands: the shorter of fixed and
//! scientific notation, without trailing zeros. With a precision of 17, every
//! `f64` is written in a way that parses back into the exact same value.

use std::io::{self, Write};


/// Writes `v` with `precision` significant digits into `w`, formatted like
/// `%.{precision}g`.
///
/// A `precision` of 0 is treated as 1 (like C does). Non-finite values are
/// written as `inf`, `-inf` and `nan`.
pub fn write_float(w: &mut impl Write, v: f64, precision: usize) -> io::Result<()> {
    if v.is_nan() {
        return w.write_all(b"nan");
    }
    if v.is_infinite() {
        return w.write_all(if v < 0.0 { b"-inf" as &[u8] } else { b"inf" });
    }
    if v == 0.0 {
        return w.write_all(if v.is_sign_negative() { b"-0" as &[u8] } else { b"0" });
    }

    let precision = if precision == 0 { 1 } else { precision };

    // The exponent of the value *after* rounding to `precision` digits decides
    // which notation is used. The scientific representation tells us exactly
    // that.
    let sci = format!("{:.*e}", precision - 1, v);
    let e_idx = sci.find('e').unwrap_or(sci.len());
    let exponent: i32 = sci.get(e_idx + 1..).and_then(|e| e.parse().ok()).unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let mantissa = trim_fraction_zeros(&sci[..e_idx]);
        let sign = if exponent < 0 { '-' } else { '+' };
        write!(w, "{}e{}{:02}", mantissa, sign, exponent.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent) as usize;
        let fixed = format!("{:.*}", decimals, v);
        w.write_all(trim_fraction_zeros(&fixed).as_bytes())
    }
}

/// Like [`write_float`], but returns a `String`.
pub fn format_float(v: f64, precision: usize) -> String {
    let mut out = Vec::new();
    // Writing into a `Vec` never fails and we only write ASCII.
    let _ = write_float(&mut out, v, precision);
    String::from_utf8(out).unwrap_or_default()
}

/// Writes the three values separated by a single space.
pub(crate) fn write_floats3(w: &mut impl Write, [x, y, z]: [f64; 3], precision: usize) -> io::Result<()> {
    write_float(w, x, precision)?;
    w.write_all(b" ")?;
    write_float(w, y, precision)?;
    w.write_all(b" ")?;
    write_float(w, z, precision)
}

/// Removes trailing zeros after the decimal point, and the point itself if
/// nothing remains after it.
fn trim_fraction_zeros(s: &str) -> &str {
    if !s.contains('.') {
        return s;
    }

    s.trim_end_matches('0').trim_end_matches('.')
}


#[cfg(test)]
mod tests {
    use super::*;

    fn g17(v: f64) -> String {
        format_float(v, 17)
    }

    #[test]
    fn integers() {
        assert_eq!(g17(1.0), "1");
        assert_eq!(g17(-3.0), "-3");
        assert_eq!(g17(123456789.0), "123456789");
        assert_eq!(g17(100.0), "100");
    }

    #[test]
    fn fractions() {
        assert_eq!(g17(0.5), "0.5");
        assert_eq!(g17(-2.25), "-2.25");
        assert_eq!(g17(0.1), "0.10000000000000001");
        assert_eq!(g17(0.0625), "0.0625");
    }

    #[test]
    fn scientific() {
        assert_eq!(g17(1e20), "1e+20");
        assert_eq!(g17(1e17), "1e+17");
        assert_eq!(g17(1e16), "10000000000000000");
        assert_eq!(g17(2f64.powi(-20)), "9.5367431640625e-07");
        assert_eq!(g17(-1.5e-300).parse::<f64>().unwrap(), -1.5e-300);
        assert!(g17(-1.5e-300).ends_with("e-300"));
    }

    #[test]
    fn zeros_and_specials() {
        assert_eq!(g17(0.0), "0");
        assert_eq!(g17(-0.0), "-0");
        assert_eq!(g17(std::f64::INFINITY), "inf");
        assert_eq!(g17(std::f64::NEG_INFINITY), "-inf");
        assert_eq!(g17(std::f64::NAN), "nan");
    }

    #[test]
    fn low_precision() {
        assert_eq!(format_float(0.1, 6), "0.1");
        assert_eq!(format_float(1234567.0, 6), "1.23457e+06");
        assert_eq!(format_float(0.0001, 6), "0.0001");
        assert_eq!(format_float(0.00001, 6), "1e-05");
        assert_eq!(format_float(2.7, 0), "3");
    }

    #[test]
    fn round_trips() {
        let values = [0.1, 1.0 / 3.0, std::f64::consts::PI, 1e-300, 6.02214076e23, -7.77e-5];
        for &v in &values {
            assert_eq!(g17(v).parse::<f64>().unwrap(), v, "value {} did not round trip", v);
        }
    }
}
