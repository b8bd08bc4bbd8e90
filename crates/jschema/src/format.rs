//! Format validators.
//!
//! The `format` keyword only asserts when a validator for its format name is
//! registered on the [`ValidatorBuilder`](crate::ValidatorBuilder). Without
//! one, `format` is an annotation.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use jschema_pointer::JsonPointer;
use regex::Regex;
use url::Url;

/// Checks strings against a named format.
pub trait FormatValidator {
    fn name(&self) -> &str;
    fn validate(&self, value: &str) -> bool;
}

/// A format validator backed by a closure.
pub struct FnFormat<F> {
    name: String,
    check: F,
}

impl<F> FnFormat<F>
where
    F: Fn(&str) -> bool,
{
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<F> FormatValidator for FnFormat<F>
where
    F: Fn(&str) -> bool,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, value: &str) -> bool {
        (self.check)(value)
    }
}

/// The built-in validators, in registration order.
pub fn builtin_formats() -> Vec<Box<dyn FormatValidator>> {
    let mut formats: Vec<Box<dyn FormatValidator>> = vec![
        Box::new(FnFormat::new("time", is_time)),
        Box::new(FnFormat::new("duration", is_duration)),
        Box::new(FnFormat::new("email", is_email)),
        Box::new(FnFormat::new("idn-email", is_email)),
        Box::new(FnFormat::new("hostname", is_hostname)),
        Box::new(FnFormat::new("ipv4", |s| s.parse::<Ipv4Addr>().is_ok())),
        Box::new(FnFormat::new("ipv6", |s| s.parse::<Ipv6Addr>().is_ok())),
        Box::new(FnFormat::new("uri", is_uri)),
        Box::new(FnFormat::new("uri-reference", is_uri_reference)),
        Box::new(FnFormat::new("iri", is_uri)),
        Box::new(FnFormat::new("iri-reference", is_uri_reference)),
        Box::new(FnFormat::new("regex", |s| Regex::new(s).is_ok())),
        Box::new(FnFormat::new("json-pointer", |s| JsonPointer::parse(s).is_ok())),
        Box::new(FnFormat::new(
            "relative-json-pointer",
            is_relative_json_pointer,
        )),
    ];
    #[cfg(feature = "chrono")]
    {
        formats.push(Box::new(FnFormat::new("date-time", is_date_time)));
        formats.push(Box::new(FnFormat::new("date", is_date)));
    }
    #[cfg(feature = "uuid")]
    formats.push(Box::new(FnFormat::new("uuid", is_uuid)));
    formats
}

#[cfg(feature = "chrono")]
fn is_date_time(s: &str) -> bool {
    // RFC 3339 requires the 'T' separator; chrono also accepts a space.
    s.len() > 10
        && matches!(s.as_bytes()[10], b'T' | b't')
        && chrono::DateTime::parse_from_rfc3339(s).is_ok()
}

#[cfg(feature = "chrono")]
fn is_date(s: &str) -> bool {
    static SHAPE: LazyLock<Option<Regex>> =
        LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").ok());
    SHAPE.as_ref().is_some_and(|re| re.is_match(s))
        && chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn is_time(s: &str) -> bool {
    static SHAPE: LazyLock<Option<Regex>> = LazyLock::new(|| {
        Regex::new(r"^(\d{2}):(\d{2}):(\d{2})(\.\d+)?([Zz]|([+-])(\d{2}):(\d{2}))$").ok()
    });
    let Some(caps) = SHAPE.as_ref().and_then(|re| re.captures(s)) else {
        return false;
    };
    let field = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };
    let (hour, minute, second) = (field(1), field(2), field(3));
    if hour > 23 || minute > 59 || second > 60 {
        return false;
    }
    let (offset_hour, offset_minute) = (field(7), field(8));
    if offset_hour > 23 || offset_minute > 59 {
        return false;
    }
    if second == 60 {
        // A leap second is only valid at 23:59:60 UTC.
        let sign: i64 = if caps.get(6).is_some_and(|m| m.as_str() == "-") {
            -1
        } else {
            1
        };
        let offset = sign * (offset_hour as i64 * 60 + offset_minute as i64);
        let utc = (hour as i64 * 60 + minute as i64 - offset).rem_euclid(24 * 60);
        return utc == 23 * 60 + 59;
    }
    true
}

fn is_duration(s: &str) -> bool {
    static SHAPE: LazyLock<Option<Regex>> = LazyLock::new(|| {
        Regex::new(r"^P(?:\d+W|(?:\d+Y)?(?:\d+M)?(?:\d+D)?(?:T(?:\d+H)?(?:\d+M)?(?:\d+S)?)?)$")
            .ok()
    });
    s != "P" && !s.ends_with('T') && SHAPE.as_ref().is_some_and(|re| re.is_match(s))
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && !s.chars().any(char::is_whitespace)
        && (is_hostname(domain) || is_ip_literal(domain))
}

fn is_ip_literal(domain: &str) -> bool {
    let Some(inner) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) else {
        return false;
    };
    match inner.strip_prefix("IPv6:") {
        Some(v6) => v6.parse::<Ipv6Addr>().is_ok(),
        None => inner.parse::<Ipv4Addr>().is_ok(),
    }
}

fn is_hostname(s: &str) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);
    !s.is_empty()
        && s.len() <= 253
        && s.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

fn is_uri(s: &str) -> bool {
    !s.chars().any(|c| c.is_whitespace() || c == '\\') && Url::parse(s).is_ok()
}

fn is_uri_reference(s: &str) -> bool {
    static BASE: LazyLock<Option<Url>> =
        LazyLock::new(|| Url::parse("http://reference.invalid/").ok());
    !s.chars().any(|c| c.is_whitespace() || c == '\\')
        && BASE.as_ref().is_some_and(|base| base.join(s).is_ok())
}

fn is_relative_json_pointer(s: &str) -> bool {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || (digits > 1 && s.starts_with('0')) {
        return false;
    }
    let rest = &s[digits..];
    rest == "#" || JsonPointer::parse(rest).is_ok()
}

#[cfg(feature = "uuid")]
fn is_uuid(s: &str) -> bool {
    s.len() == 36 && uuid::Uuid::try_parse(s).is_ok()
}
