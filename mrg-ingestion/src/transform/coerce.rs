//! Cell coercion. Every function here reports failure as a [`CoercionError`];
//! defaults are applied by the row mapper.

use time::{macros::date, macros::format_description, Date, Duration};

use crate::sheet::{format_number, Cell};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("'{0}' is not a finite number")]
    NonFinite(String),
    #[error("date serial {0} is outside the supported range")]
    SerialOutOfRange(String),
}

/// Length of the longest `[+-]digits[.digits][e[+-]digits]` prefix of `s`,
/// or 0 when `s` does not start with a number.
fn numeric_prefix_len(s: &str) -> usize {
    let b = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i = 1;
    }
    let int_end = digits_from(i);
    let mut end = int_end;
    let mut has_digits = int_end > i;

    if b.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if has_digits || frac_end > end + 1 {
            has_digits = true;
            end = frac_end;
        }
    }
    if !has_digits {
        return 0;
    }

    // Exponent only counts when digits follow it.
    if matches!(b.get(end), Some(b'e' | b'E')) {
        let mut j = end + 1;
        if matches!(b.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end > j {
            end = exp_end;
        }
    }
    end
}

/// Parses a locale decimal: surrounding whitespace ignored, the first comma
/// taken as the decimal separator, trailing text after the number ignored
/// (`85%` is 85, `123,4 км` is 123.4).
pub fn parse_decimal(raw: &str) -> Result<f64, CoercionError> {
    let s = raw.trim().replacen(',', ".", 1);
    let len = numeric_prefix_len(&s);
    if len == 0 {
        return Err(CoercionError::NotANumber(raw.to_string()));
    }
    let n: f64 = s[..len]
        .parse()
        .map_err(|_| CoercionError::NotANumber(raw.to_string()))?;
    if n.is_finite() {
        Ok(n)
    } else {
        Err(CoercionError::NonFinite(raw.to_string()))
    }
}

fn finite(n: f64) -> Result<f64, CoercionError> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(CoercionError::NonFinite(n.to_string()))
    }
}

/// Measurement value; a missing or blank cell is 0.
pub fn coerce_measure(cell: Option<&Cell>) -> Result<f64, CoercionError> {
    match cell {
        None => Ok(0.0),
        Some(c) if c.is_blank() => Ok(0.0),
        Some(Cell::Number(n)) => finite(*n),
        Some(c) => parse_decimal(&c.display_text()),
    }
}

/// Distance along the pipeline. Blank and `-` mean "not applicable".
pub fn coerce_km(cell: Option<&Cell>) -> Result<Option<f64>, CoercionError> {
    match cell {
        None => Ok(None),
        Some(Cell::Number(n)) => finite(*n).map(Some),
        Some(c) => {
            let text = c.display_text();
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed == "-" {
                Ok(None)
            } else {
                parse_decimal(trimmed).map(Some)
            }
        }
    }
}

/// Period label: numbers are date serials, anything else is kept verbatim.
pub fn coerce_period(cell: Option<&Cell>) -> Result<String, CoercionError> {
    match cell {
        None => Ok(String::new()),
        Some(Cell::Number(n)) => format_date_serial(*n),
        Some(c) => Ok(c.display_text()),
    }
}

pub fn coerce_text(cell: Option<&Cell>) -> String {
    cell.map(Cell::display_text).unwrap_or_default()
}

/// Serial of 31/12/9999.
const LAST_SERIAL: f64 = 2_958_465.0;

/// Formats a 1900-system date serial as `dd/mm/yyyy`, ignoring the time of
/// day. Serial 60 is the fictitious 29 February 1900.
pub fn format_date_serial(serial: f64) -> Result<String, CoercionError> {
    let out_of_range = || CoercionError::SerialOutOfRange(format_number(serial));

    if !serial.is_finite() || serial < 1.0 || serial >= LAST_SERIAL + 1.0 {
        return Err(out_of_range());
    }

    let days = serial.floor() as i64;
    if days == 60 {
        return Ok("29/02/1900".to_string());
    }

    // Serials after the phantom leap day are offset by one.
    let epoch: Date = if days < 60 {
        date!(1899 - 12 - 31)
    } else {
        date!(1899 - 12 - 30)
    };

    let d = epoch
        .checked_add(Duration::days(days))
        .ok_or_else(out_of_range)?;
    if d.year() > 9999 {
        return Err(out_of_range());
    }

    d.format(format_description!("[day]/[month]/[year]"))
        .map_err(|_| out_of_range())
}
