use std::time::Duration;

use url::Url;

use super::types::HeaderPair;
use crate::error::{AppError, AppResult, ValidationError};

/// Parses `Key: Value`. The key must be non-empty; both sides are trimmed.
pub(crate) fn parse_header(s: &str) -> Result<HeaderPair, ValidationError> {
    let Some((key, value)) = s.split_once(':') else {
        return Err(ValidationError::InvalidHeaderFormat {
            value: s.to_owned(),
        });
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(ValidationError::HeaderKeyEmpty {
            value: s.to_owned(),
        });
    }
    Ok(HeaderPair {
        name: key.to_owned(),
        value: value.trim().to_owned(),
    })
}

const NANOS_PER_SECOND: u128 = 1_000_000_000;
/// Fraction digits beyond this are below one nanosecond for every unit.
const MAX_FRACTION_DIGITS: usize = 18;

/// Parses one or more `<number>[.<fraction>]<unit>` segments such as `1m30s`,
/// `1.5s` or `500us`, with units `ns`, `us`/`µs`, `ms`, `s`, `m` and `h`. A bare
/// integer is seconds. Zero is accepted and means "unset" for optional
/// durations.
pub(crate) fn parse_duration_arg(s: &str) -> Result<Duration, ValidationError> {
    let value = s.trim();
    if value.is_empty() {
        return Err(ValidationError::DurationEmpty);
    }
    if value.bytes().all(|byte| byte.is_ascii_digit()) {
        return parse_whole(value, value).map(Duration::from_secs);
    }

    let mut total: u128 = 0;
    let mut rest = value;
    while !rest.is_empty() {
        let (whole, after_whole) = split_digits(rest);
        let (fraction, after_number) = after_whole
            .strip_prefix('.')
            .map_or(("", after_whole), split_digits);
        if whole.is_empty() && fraction.is_empty() {
            return Err(ValidationError::InvalidDurationFormat {
                value: value.to_owned(),
            });
        }
        let unit_len = after_number
            .find(|ch: char| ch.is_ascii_digit() || ch == '.')
            .unwrap_or(after_number.len());
        let (unit, tail) = after_number.split_at(unit_len);
        if unit.is_empty() {
            return Err(ValidationError::InvalidDurationFormat {
                value: value.to_owned(),
            });
        }
        let per_unit = unit_nanos(unit).ok_or_else(|| ValidationError::InvalidDurationUnit {
            unit: unit.to_owned(),
        })?;

        let whole = if whole.is_empty() {
            0
        } else {
            parse_whole(whole, value)?
        };
        let segment = u128::from(whole)
            .checked_mul(per_unit)
            .and_then(|nanos| nanos.checked_add(fraction_nanos(fraction, per_unit)?))
            .ok_or(ValidationError::DurationOverflow)?;
        total = total
            .checked_add(segment)
            .ok_or(ValidationError::DurationOverflow)?;
        rest = tail;
    }

    let secs = total
        .checked_div(NANOS_PER_SECOND)
        .and_then(|secs| u64::try_from(secs).ok())
        .ok_or(ValidationError::DurationOverflow)?;
    let nanos = total
        .checked_rem(NANOS_PER_SECOND)
        .and_then(|nanos| u32::try_from(nanos).ok())
        .ok_or(ValidationError::DurationOverflow)?;
    Ok(Duration::new(secs, nanos))
}

fn split_digits(s: &str) -> (&str, &str) {
    let len = s.bytes().take_while(u8::is_ascii_digit).count();
    s.split_at(len)
}

fn parse_whole(digits: &str, value: &str) -> Result<u64, ValidationError> {
    digits
        .parse()
        .map_err(|err| ValidationError::InvalidDurationNumber {
            value: value.to_owned(),
            source: err,
        })
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "\u{b5}s" | "\u{3bc}s" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(60_000_000_000),
        "h" => Some(3_600_000_000_000),
        _ => None,
    }
}

/// Nanoseconds contributed by the digits after the decimal point, truncated.
fn fraction_nanos(fraction: &str, per_unit: u128) -> Option<u128> {
    let digits = fraction.get(..fraction.len().min(MAX_FRACTION_DIGITS))?;
    if digits.is_empty() {
        return Some(0);
    }
    let numerator: u128 = digits.parse().ok()?;
    let scale = 10_u128.checked_pow(u32::try_from(digits.len()).ok()?)?;
    numerator.checked_mul(per_unit)?.checked_div(scale)
}

/// Accepts only absolute `http`/`https` URLs with a host.
///
/// # Errors
///
/// Returns an error when the URL is empty, malformed or relative.
pub fn parse_target_url(raw: &str) -> AppResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(ValidationError::MissingUrl));
    }
    let url = Url::parse(trimmed).map_err(|err| {
        AppError::validation(ValidationError::InvalidUrl {
            url: trimmed.to_owned(),
            source: err,
        })
    })?;
    let http_scheme = matches!(url.scheme(), "http" | "https");
    if !http_scheme || url.cannot_be_a_base() || url.host_str().is_none_or(str::is_empty) {
        return Err(AppError::validation(ValidationError::UrlNotAbsolute {
            url: trimmed.to_owned(),
        }));
    }
    Ok(url)
}

pub(crate) const fn ensure_positive_u64(value: u64, flag: &'static str) -> AppResult<u64> {
    if value == 0 {
        return Err(AppError::Validation(ValidationError::MustBePositive { flag }));
    }
    Ok(value)
}

pub(crate) const fn ensure_positive_usize(value: usize, flag: &'static str) -> AppResult<usize> {
    if value == 0 {
        return Err(AppError::Validation(ValidationError::MustBePositive { flag }));
    }
    Ok(value)
}

pub(crate) fn ensure_non_negative(value: f64, flag: &'static str) -> AppResult<f64> {
    if value.is_nan() || value < 0.0 {
        return Err(AppError::validation(ValidationError::MustNotBeNegative {
            flag,
        }));
    }
    Ok(value)
}
