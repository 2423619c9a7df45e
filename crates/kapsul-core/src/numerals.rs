//! Conversion between Latin digits and Persian numeral glyphs.
//!
//! Only the ten digits are mapped; every other character passes through
//! untouched, so `FE-001` becomes `FE-۰۰۱`.

use std::fmt::Display;

const PERSIAN_DIGITS: [char; 10] =
  ['۰', '۱', '۲', '۳', '۴', '۵', '۶', '۷', '۸', '۹'];

/// Render `value` with Persian numerals.
///
/// Works on the `Display` form, so the integer `0` renders as `۰` rather than
/// collapsing to an empty string.
pub fn to_persian_numerals(value: impl Display) -> String {
  value
    .to_string()
    .chars()
    .map(|c| match c.to_digit(10) {
      Some(d) => PERSIAN_DIGITS[d as usize],
      None => c,
    })
    .collect()
}

/// Replace Persian numerals in `value` with Latin digits.
pub fn to_latin_numerals(value: &str) -> String {
  value
    .chars()
    .map(|c| {
      PERSIAN_DIGITS
        .iter()
        .position(|&p| p == c)
        .and_then(|d| char::from_digit(d as u32, 10))
        .unwrap_or(c)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_is_not_empty() {
    assert_eq!(to_persian_numerals(0), "۰");
    assert_eq!(to_persian_numerals(0_usize), "۰");
  }

  #[test]
  fn only_digits_are_converted() {
    assert_eq!(to_persian_numerals("FE-001"), "FE-۰۰۱");
    assert_eq!(to_persian_numerals("1403/06/20"), "۱۴۰۳/۰۶/۲۰");
    assert_eq!(to_persian_numerals(""), "");
  }

  #[test]
  fn latin_conversion_leaves_other_characters() {
    assert_eq!(to_latin_numerals("۱۴۰۳/۷/۱"), "1403/7/1");
    assert_eq!(to_latin_numerals("انبار ۲"), "انبار 2");
    assert_eq!(to_latin_numerals("already 42"), "already 42");
  }

  #[test]
  fn round_trip_restores_input() {
    for input in ["FE-001", "1403/06/20", "0", "9876543210", "ظرفیت 6 کیلوگرم"] {
      assert_eq!(to_latin_numerals(&to_persian_numerals(input)), input);
    }
  }
}
