// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # PostgreSQL Text Rendering
//!
//! Prints PostgreSQL values from their binary wire form the way `psql` shows
//! them. Values the server can represent but `chrono` or the standard
//! numeric types cannot (`NaN`, `infinity`, 40-digit numerics) are decoded
//! by hand.
//!
//! Types outside [`decodes_natively`] are cast to `text` in the query, so
//! they arrive here already printed.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use log::debug;
use postgres::types::{FromSql, Kind, Type};
use std::error::Error;
use std::net::{Ipv4Addr, Ipv6Addr};

pub(crate) type DecodeResult<T> = std::result::Result<T, Box<dyn Error + Sync + Send>>;

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

const PGSQL_AF_INET: u8 = 2;
const PGSQL_AF_INET6: u8 = 3;

/// PostgreSQL's own limit on array dimensions.
const MAX_ARRAY_DIMS: i32 = 6;

/// Printed form of any PostgreSQL value. Decoding never fails: a value whose
/// bytes do not parse is kept as text if printable, as `\x` hex otherwise.
pub(crate) struct PgText(pub(crate) String);

impl<'a> FromSql<'a> for PgText {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> DecodeResult<Self> {
        match decode_text(ty, raw) {
            Ok(text) => Ok(PgText(text)),
            Err(e) => {
                debug!("Unable to decode {} value ({}), keeping raw bytes", ty.name(), e);
                Ok(PgText(printable_fallback(raw)))
            }
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// Whether [`PgText`] prints `ty` from its binary form. Columns of any other
/// type are selected as `::text`.
pub(crate) fn decodes_natively(ty: &Type) -> bool {
    match ty.kind() {
        Kind::Domain(inner) => decodes_natively(inner),
        Kind::Array(member) => decodes_natively(member),
        Kind::Enum(_) => true,
        _ => {
            *ty == Type::BOOL
                || *ty == Type::INT2
                || *ty == Type::INT4
                || *ty == Type::INT8
                || *ty == Type::OID
                || *ty == Type::FLOAT4
                || *ty == Type::FLOAT8
                || *ty == Type::NUMERIC
                || *ty == Type::UUID
                || *ty == Type::TIMESTAMP
                || *ty == Type::TIMESTAMPTZ
                || *ty == Type::DATE
                || *ty == Type::TIME
                || *ty == Type::TIMETZ
                || *ty == Type::INTERVAL
                || *ty == Type::INET
                || *ty == Type::CIDR
                || *ty == Type::BYTEA
                || *ty == Type::JSON
                || *ty == Type::JSONB
                || <&str as FromSql>::accepts(ty)
        }
    }
}

fn decode_text(ty: &Type, raw: &[u8]) -> DecodeResult<String> {
    match ty.kind() {
        Kind::Domain(inner) => decode_text(inner, raw),
        Kind::Array(member) => decode_array(member, raw),
        Kind::Enum(_) => Ok(std::str::from_utf8(raw)?.to_string()),
        _ => decode_scalar(ty, raw),
    }
}

fn decode_scalar(ty: &Type, raw: &[u8]) -> DecodeResult<String> {
    let text = if *ty == Type::BOOL {
        bool::from_sql(ty, raw)?.to_string()
    } else if *ty == Type::INT2 {
        i16::from_sql(ty, raw)?.to_string()
    } else if *ty == Type::INT4 {
        i32::from_sql(ty, raw)?.to_string()
    } else if *ty == Type::INT8 {
        i64::from_sql(ty, raw)?.to_string()
    } else if *ty == Type::OID {
        u32::from_sql(ty, raw)?.to_string()
    } else if *ty == Type::FLOAT4 {
        f32::from_sql(ty, raw)?.to_string()
    } else if *ty == Type::FLOAT8 {
        f64::from_sql(ty, raw)?.to_string()
    } else if *ty == Type::NUMERIC {
        decode_numeric(raw)?
    } else if *ty == Type::UUID {
        uuid::Uuid::from_sql(ty, raw)?.to_string()
    } else if *ty == Type::TIMESTAMP || *ty == Type::TIMESTAMPTZ {
        decode_timestamp(ty, raw)?
    } else if *ty == Type::DATE {
        decode_date(ty, raw)?
    } else if *ty == Type::TIME {
        let mut buf = raw;
        format_clock(read_i64(&mut buf)?)
    } else if *ty == Type::TIMETZ {
        decode_timetz(raw)?
    } else if *ty == Type::INTERVAL {
        decode_interval(raw)?
    } else if *ty == Type::INET || *ty == Type::CIDR {
        decode_inet(raw)?
    } else if *ty == Type::BYTEA {
        hex_literal(raw)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        serde_json::Value::from_sql(ty, raw)?.to_string()
    } else if <&str as FromSql>::accepts(ty) {
        <&str as FromSql>::from_sql(ty, raw)?.to_string()
    } else {
        return Err(format!("no binary decoder for type {}", ty.name()).into());
    };
    Ok(text)
}

fn take<'a>(buf: &mut &'a [u8], n: usize) -> DecodeResult<&'a [u8]> {
    if buf.len() < n {
        return Err("value is truncated".into());
    }
    let (head, tail) = buf.split_at(n);
    *buf = tail;
    Ok(head)
}

fn read_u8(buf: &mut &[u8]) -> DecodeResult<u8> {
    Ok(take(buf, 1)?[0])
}

fn read_i16(buf: &mut &[u8]) -> DecodeResult<i16> {
    Ok(i16::from_be_bytes(take(buf, 2)?.try_into()?))
}

fn read_u16(buf: &mut &[u8]) -> DecodeResult<u16> {
    Ok(u16::from_be_bytes(take(buf, 2)?.try_into()?))
}

fn read_i32(buf: &mut &[u8]) -> DecodeResult<i32> {
    Ok(i32::from_be_bytes(take(buf, 4)?.try_into()?))
}

fn read_i64(buf: &mut &[u8]) -> DecodeResult<i64> {
    Ok(i64::from_be_bytes(take(buf, 8)?.try_into()?))
}

/// `numeric` is a sign, a weight and base-10000 digit groups; the weight is
/// the power of 10000 of the first group.
fn decode_numeric(raw: &[u8]) -> DecodeResult<String> {
    let mut buf = raw;
    let ndigits = read_i16(&mut buf)?;
    let weight = read_i16(&mut buf)? as i64;
    let sign = read_u16(&mut buf)?;
    let dscale = read_u16(&mut buf)? as usize;

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        NUMERIC_POS | NUMERIC_NEG => {}
        other => return Err(format!("invalid numeric sign 0x{:04x}", other).into()),
    }
    if ndigits < 0 {
        return Err("negative numeric digit count".into());
    }

    let mut digits = Vec::with_capacity(ndigits as usize);
    for _ in 0..ndigits {
        let group = read_u16(&mut buf)?;
        if group >= 10000 {
            return Err(format!("numeric digit group {} out of range", group).into());
        }
        digits.push(group);
    }
    let group_at = |index: i64| -> u16 {
        usize::try_from(index)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    if sign == NUMERIC_NEG {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        out.push_str(&group_at(0).to_string());
        for index in 1..=weight {
            out.push_str(&format!("{:04}", group_at(index)));
        }
    }

    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut index = weight + 1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", group_at(index)));
            index += 1;
        }
        fraction.truncate(dscale);
        out.push('.');
        out.push_str(&fraction);
    }
    Ok(out)
}

/// `timestamp` columns carry no zone; they are printed as UTC.
fn format_timestamp(ts: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(ts, Utc).to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn decode_timestamp(ty: &Type, raw: &[u8]) -> DecodeResult<String> {
    let mut buf = raw;
    Ok(match read_i64(&mut buf)? {
        i64::MAX => "infinity".to_string(),
        i64::MIN => "-infinity".to_string(),
        _ if *ty == Type::TIMESTAMP => format_timestamp(NaiveDateTime::from_sql(ty, raw)?),
        _ => DateTime::<Utc>::from_sql(ty, raw)?.to_rfc3339_opts(SecondsFormat::AutoSi, true),
    })
}

fn decode_date(ty: &Type, raw: &[u8]) -> DecodeResult<String> {
    let mut buf = raw;
    Ok(match read_i32(&mut buf)? {
        i32::MAX => "infinity".to_string(),
        i32::MIN => "-infinity".to_string(),
        _ => NaiveDate::from_sql(ty, raw)?.to_string(),
    })
}

/// `HH:MM:SS[.ffffff]` with trailing fraction zeros dropped. Hours are not
/// wrapped, so `time '24:00'` and long intervals print as stored.
fn format_clock(micros: i64) -> String {
    let micros = micros.unsigned_abs();
    let secs = micros / 1_000_000;
    let fraction = micros % 1_000_000;
    let mut out = format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60);
    if fraction > 0 {
        out.push('.');
        out.push_str(format!("{:06}", fraction).trim_end_matches('0'));
    }
    out
}

/// The zone is stored as seconds west of UTC and printed as `+HH[:MM[:SS]]` east.
fn decode_timetz(raw: &[u8]) -> DecodeResult<String> {
    let mut buf = raw;
    let micros = read_i64(&mut buf)?;
    let east = -(read_i32(&mut buf)? as i64);

    let sign = if east < 0 { '-' } else { '+' };
    let east = east.unsigned_abs();
    let mut out = format!("{}{}{:02}", format_clock(micros), sign, east / 3600);
    let (minutes, seconds) = (east / 60 % 60, east % 60);
    if minutes != 0 || seconds != 0 {
        out.push_str(&format!(":{:02}", minutes));
    }
    if seconds != 0 {
        out.push_str(&format!(":{:02}", seconds));
    }
    Ok(out)
}

/// Postgres interval style: `1 year 2 mons 3 days 04:05:06`.
fn decode_interval(raw: &[u8]) -> DecodeResult<String> {
    let mut buf = raw;
    let micros = read_i64(&mut buf)?;
    let days = read_i32(&mut buf)?;
    let months = read_i32(&mut buf)?;

    let mut out = String::new();
    // A positive part after a negative one is printed with an explicit `+`.
    let mut after_negative = false;
    for (value, unit) in [(months / 12, "year"), (months % 12, "mon"), (days, "day")] {
        if value == 0 {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        if after_negative && value > 0 {
            out.push('+');
        }
        out.push_str(&format!("{} {}{}", value, unit, if value == 1 { "" } else { "s" }));
        after_negative = value < 0;
    }

    if out.is_empty() || micros != 0 {
        if !out.is_empty() {
            out.push(' ');
        }
        if micros < 0 {
            out.push('-');
        } else if after_negative {
            out.push('+');
        }
        out.push_str(&format_clock(micros));
    }
    Ok(out)
}

/// `inet` omits a full-length prefix; `cidr` always shows it.
fn decode_inet(raw: &[u8]) -> DecodeResult<String> {
    let mut buf = raw;
    let family = read_u8(&mut buf)?;
    let bits = read_u8(&mut buf)?;
    let is_cidr = read_u8(&mut buf)? != 0;
    let len = read_u8(&mut buf)? as usize;
    let address = take(&mut buf, len)?;

    let (text, max_bits) = match family {
        PGSQL_AF_INET => {
            let octets: [u8; 4] = address.try_into()?;
            (Ipv4Addr::from(octets).to_string(), 32)
        }
        PGSQL_AF_INET6 => {
            let octets: [u8; 16] = address.try_into()?;
            (Ipv6Addr::from(octets).to_string(), 128)
        }
        other => return Err(format!("unknown address family {}", other).into()),
    };
    if is_cidr || bits != max_bits {
        Ok(format!("{}/{}", text, bits))
    } else {
        Ok(text)
    }
}

/// Array literal as `psql` prints it, e.g. `{1,2,NULL}` or `{{a,b},{c,d}}`.
/// Lower bounds other than 1 are spelled out as `[0:1]={x,y}`.
fn decode_array(member: &Type, raw: &[u8]) -> DecodeResult<String> {
    let mut buf = raw;
    let ndim = read_i32(&mut buf)?;
    let _has_nulls = read_i32(&mut buf)?;
    let _element_oid = read_i32(&mut buf)?;
    if !(0..=MAX_ARRAY_DIMS).contains(&ndim) {
        return Err(format!("invalid array dimension count {}", ndim).into());
    }

    let mut dims = Vec::with_capacity(ndim as usize);
    for _ in 0..ndim {
        let len = read_i32(&mut buf)?;
        let lower_bound = read_i32(&mut buf)?;
        let len = usize::try_from(len).map_err(|_| "negative array dimension")?;
        dims.push((len, lower_bound));
    }
    if dims.is_empty() {
        return Ok("{}".to_string());
    }

    let mut out = String::new();
    if dims.iter().any(|&(_, lower_bound)| lower_bound != 1) {
        for &(len, lower_bound) in &dims {
            let upper_bound = lower_bound as i64 + len as i64 - 1;
            out.push_str(&format!("[{}:{}]", lower_bound, upper_bound));
        }
        out.push('=');
    }
    write_dimension(member, &dims, &mut buf, &mut out)?;
    Ok(out)
}

fn write_dimension(
    member: &Type,
    dims: &[(usize, i32)],
    buf: &mut &[u8],
    out: &mut String,
) -> DecodeResult<()> {
    let Some((&(len, _), inner)) = dims.split_first() else {
        return Ok(());
    };
    out.push('{');
    for i in 0..len {
        if i > 0 {
            out.push(',');
        }
        if !inner.is_empty() {
            write_dimension(member, inner, buf, out)?;
            continue;
        }
        let element_len = read_i32(buf)?;
        match usize::try_from(element_len) {
            Ok(n) => out.push_str(&quote_element(&decode_text(member, take(buf, n)?)?)),
            Err(_) => out.push_str("NULL"),
        }
    }
    out.push('}');
    Ok(())
}

fn quote_element(element: &str) -> String {
    let needs_quotes = element.is_empty()
        || element.eq_ignore_ascii_case("NULL")
        || element
            .chars()
            .any(|c| matches!(c, '"' | '\\' | '{' | '}' | ',') || c.is_ascii_whitespace());
    if !needs_quotes {
        return element.to_string();
    }

    let mut out = String::with_capacity(element.len() + 2);
    out.push('"');
    for c in element.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn hex_literal(raw: &[u8]) -> String {
    let mut out = String::with_capacity(2 + raw.len() * 2);
    out.push_str("\\x");
    for byte in raw {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

fn printable_fallback(raw: &[u8]) -> String {
    match std::str::from_utf8(raw) {
        Ok(text) if !text.chars().any(|c| c.is_control() && !c.is_whitespace()) => {
            text.to_string()
        }
        _ => hex_literal(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(ty: &Type, raw: &[u8]) -> String {
        PgText::from_sql(ty, raw).unwrap().0
    }

    fn numeric(weight: i16, sign: u16, dscale: u16, digits: &[u16]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&(digits.len() as i16).to_be_bytes());
        raw.extend_from_slice(&weight.to_be_bytes());
        raw.extend_from_slice(&sign.to_be_bytes());
        raw.extend_from_slice(&dscale.to_be_bytes());
        for d in digits {
            raw.extend_from_slice(&d.to_be_bytes());
        }
        raw
    }

    fn array(element_oid: u32, dims: &[(i32, i32)], elements: &[Option<&[u8]>]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&(dims.len() as i32).to_be_bytes());
        let has_nulls = elements.iter().any(Option::is_none) as i32;
        raw.extend_from_slice(&has_nulls.to_be_bytes());
        raw.extend_from_slice(&element_oid.to_be_bytes());
        for (len, lower_bound) in dims {
            raw.extend_from_slice(&len.to_be_bytes());
            raw.extend_from_slice(&lower_bound.to_be_bytes());
        }
        for element in elements {
            match element {
                Some(bytes) => {
                    raw.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
                    raw.extend_from_slice(bytes);
                }
                None => raw.extend_from_slice(&(-1i32).to_be_bytes()),
            }
        }
        raw
    }

    fn interval(micros: i64, days: i32, months: i32) -> Vec<u8> {
        let mut raw = micros.to_be_bytes().to_vec();
        raw.extend_from_slice(&days.to_be_bytes());
        raw.extend_from_slice(&months.to_be_bytes());
        raw
    }

    #[test]
    fn test_scalar_decoding() {
        assert_eq!(text(&Type::INT4, &42i32.to_be_bytes()), "42");
        assert_eq!(text(&Type::BOOL, &[1]), "true");
        assert_eq!(text(&Type::VARCHAR, b"hello, world"), "hello, world");
        assert_eq!(text(&Type::FLOAT8, &1.5f64.to_be_bytes()), "1.5");
        assert_eq!(text(&Type::BYTEA, &[0xde, 0xad, 0x01]), "\\xdead01");
        assert!(PgText::accepts(&Type::MONEY));
    }

    #[test]
    fn test_uuid_decoding() {
        let id = uuid::Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(text(&Type::UUID, id.as_bytes()), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn test_numeric_decoding() {
        assert_eq!(text(&Type::NUMERIC, &numeric(0, NUMERIC_POS, 2, &[123, 4500])), "123.45");
        assert_eq!(text(&Type::NUMERIC, &numeric(-1, NUMERIC_NEG, 3, &[10])), "-0.001");
        assert_eq!(text(&Type::NUMERIC, &numeric(1, NUMERIC_POS, 0, &[12, 3456])), "123456");
        assert_eq!(text(&Type::NUMERIC, &numeric(0, NUMERIC_POS, 0, &[])), "0");
        assert_eq!(text(&Type::NUMERIC, &numeric(0, NUMERIC_POS, 3, &[])), "0.000");
    }

    #[test]
    fn test_numeric_beyond_decimal_range() {
        let expected = format!("1{}", "0".repeat(40));
        assert_eq!(text(&Type::NUMERIC, &numeric(10, NUMERIC_POS, 0, &[1])), expected);
    }

    #[test]
    fn test_numeric_special_values() {
        assert_eq!(text(&Type::NUMERIC, &numeric(0, NUMERIC_NAN, 0, &[])), "NaN");
        assert_eq!(text(&Type::NUMERIC, &numeric(0, NUMERIC_PINF, 0, &[])), "Infinity");
        assert_eq!(text(&Type::NUMERIC, &numeric(0, NUMERIC_NINF, 0, &[])), "-Infinity");
    }

    #[test]
    fn test_infinite_timestamps_and_dates() {
        assert_eq!(text(&Type::TIMESTAMP, &i64::MAX.to_be_bytes()), "infinity");
        assert_eq!(text(&Type::TIMESTAMP, &i64::MIN.to_be_bytes()), "-infinity");
        assert_eq!(text(&Type::TIMESTAMPTZ, &i64::MAX.to_be_bytes()), "infinity");
        assert_eq!(text(&Type::DATE, &i32::MAX.to_be_bytes()), "infinity");
        assert_eq!(text(&Type::DATE, &i32::MIN.to_be_bytes()), "-infinity");
    }

    #[test]
    fn test_finite_timestamps_and_dates() {
        // 2021-01-01T10:00:00 is 7671 days and 10 hours after 2000-01-01.
        let micros: i64 = (7671 * 86_400 + 10 * 3600) * 1_000_000;
        assert_eq!(text(&Type::TIMESTAMP, &micros.to_be_bytes()), "2021-01-01T10:00:00Z");
        assert_eq!(text(&Type::TIMESTAMPTZ, &micros.to_be_bytes()), "2021-01-01T10:00:00Z");
        assert_eq!(text(&Type::DATE, &7671i32.to_be_bytes()), "2021-01-01");
    }

    #[test]
    fn test_format_timestamp() {
        let ts = NaiveDate::from_ymd_opt(2023, 10, 27)
            .unwrap()
            .and_hms_micro_opt(14, 30, 45, 123456)
            .unwrap();
        assert_eq!(format_timestamp(ts), "2023-10-27T14:30:45.123456Z");
    }

    #[test]
    fn test_time_and_timetz() {
        let micros: i64 = 36_000_000_000 + 500_000;
        assert_eq!(text(&Type::TIME, &micros.to_be_bytes()), "10:00:00.5");
        assert_eq!(text(&Type::TIME, &86_400_000_000i64.to_be_bytes()), "24:00:00");

        let mut raw = 36_000_000_000i64.to_be_bytes().to_vec();
        raw.extend_from_slice(&(-7200i32).to_be_bytes());
        assert_eq!(text(&Type::TIMETZ, &raw), "10:00:00+02");

        let mut raw = 0i64.to_be_bytes().to_vec();
        raw.extend_from_slice(&19_800i32.to_be_bytes());
        assert_eq!(text(&Type::TIMETZ, &raw), "00:00:00-05:30");
    }

    #[test]
    fn test_interval_decoding() {
        let hms: i64 = (4 * 3600 + 5 * 60 + 6) * 1_000_000;
        assert_eq!(text(&Type::INTERVAL, &interval(hms, 3, 14)), "1 year 2 mons 3 days 04:05:06");
        assert_eq!(text(&Type::INTERVAL, &interval(0, 0, 0)), "00:00:00");
        assert_eq!(text(&Type::INTERVAL, &interval(0, 1, 0)), "1 day");
        assert_eq!(
            text(&Type::INTERVAL, &interval(2 * 3_600_000_000, -1, 0)),
            "-1 days +02:00:00"
        );
        assert_eq!(text(&Type::INTERVAL, &interval(-90_000_000, 0, 0)), "-00:01:30");
    }

    #[test]
    fn test_inet_and_cidr() {
        let host = [PGSQL_AF_INET, 32, 0, 4, 192, 168, 0, 1];
        assert_eq!(text(&Type::INET, &host), "192.168.0.1");
        let subnet = [PGSQL_AF_INET, 24, 0, 4, 192, 168, 0, 0];
        assert_eq!(text(&Type::INET, &subnet), "192.168.0.0/24");
        let block = [PGSQL_AF_INET, 32, 1, 4, 10, 0, 0, 1];
        assert_eq!(text(&Type::CIDR, &block), "10.0.0.1/32");

        let mut v6 = vec![PGSQL_AF_INET6, 128, 0, 16];
        v6.extend_from_slice(&Ipv6Addr::LOCALHOST.octets());
        assert_eq!(text(&Type::INET, &v6), "::1");
    }

    #[test]
    fn test_integer_array() {
        let (one, two, three) = (1i32.to_be_bytes(), 2i32.to_be_bytes(), 3i32.to_be_bytes());
        let raw = array(23, &[(3, 1)], &[Some(&one[..]), Some(&two[..]), Some(&three[..])]);
        assert_eq!(text(&Type::INT4_ARRAY, &raw), "{1,2,3}");

        let elements = [Some(&one[..]), Some(&two[..]), Some(&three[..]), None];
        let raw = array(23, &[(2, 1), (2, 1)], &elements);
        assert_eq!(text(&Type::INT4_ARRAY, &raw), "{{1,2},{3,NULL}}");

        let raw = array(23, &[(1, 0)], &[Some(&one[..])]);
        assert_eq!(text(&Type::INT4_ARRAY, &raw), "[0:0]={1}");

        assert_eq!(text(&Type::INT4_ARRAY, &array(23, &[], &[])), "{}");
    }

    #[test]
    fn test_text_array_quoting() {
        let raw = array(
            25,
            &[(5, 1)],
            &[
                Some(&b"plain"[..]),
                None,
                Some(&b"a,b"[..]),
                Some(&b"say \"hi\""[..]),
                Some(&b"null"[..]),
            ],
        );
        assert_eq!(
            text(&Type::TEXT_ARRAY, &raw),
            r#"{plain,NULL,"a,b","say \"hi\"","null"}"#
        );
    }

    #[test]
    fn test_undecodable_value_falls_back_to_bytes() {
        // A two-byte numeric is truncated.
        assert_eq!(text(&Type::NUMERIC, &[0, 1]), "\\x0001");
        assert_eq!(text(&Type::INT4, b"ab"), "ab");
        assert_eq!(text(&Type::MONEY, b"$1.00"), "$1.00");
    }

    #[test]
    fn test_native_types() {
        assert!(decodes_natively(&Type::NUMERIC));
        assert!(decodes_natively(&Type::INTERVAL));
        assert!(decodes_natively(&Type::TEXT_ARRAY));
        assert!(!decodes_natively(&Type::MONEY));
        assert!(!decodes_natively(&Type::MONEY_ARRAY));
        assert!(!decodes_natively(&Type::POINT));
    }
}
