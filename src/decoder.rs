//! Positional record decoder.
//!
//! Most /proc files that hold a single record are a flat list of values
//! whose meaning depends only on their position. Each format declares an
//! ordered schema of [`FieldSpec`]s, one per value, and [`decode_record`]
//! walks the schema and the tokens together, parsing each token according to
//! the kind of its setter.
//!
//! Policy:
//! - fewer tokens than fields: the remaining fields keep their default value
//! - more tokens than fields: the extra tokens are ignored
//! - a token that fails to parse: the whole decode fails, naming the field,
//!   its position and the raw text

use chrono::{DateTime, Utc};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::clock::ClockContext;
use crate::error::{DecodeError, ProcError};

/// Semantic kind of a positional field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int32,
    Int64,
    Uint32,
    Uint64,
    Str,
    /// Clock ticks since boot, stored as a UTC timestamp.
    Jiffies,
}

/// Typed setter for one field of `T`.
pub enum Setter<T> {
    Int32(fn(&mut T, i32)),
    Int64(fn(&mut T, i64)),
    Uint32(fn(&mut T, u32)),
    Uint64(fn(&mut T, u64)),
    Str(fn(&mut T, String)),
    Jiffies(fn(&mut T, DateTime<Utc>)),
}

/// One entry of a positional schema.
pub struct FieldSpec<T> {
    pub name: &'static str,
    pub setter: Setter<T>,
}

impl<T> FieldSpec<T> {
    pub fn kind(&self) -> FieldKind {
        match self.setter {
            Setter::Int32(_) => FieldKind::Int32,
            Setter::Int64(_) => FieldKind::Int64,
            Setter::Uint32(_) => FieldKind::Uint32,
            Setter::Uint64(_) => FieldKind::Uint64,
            Setter::Str(_) => FieldKind::Str,
            Setter::Jiffies(_) => FieldKind::Jiffies,
        }
    }

    fn parse_num<N>(&self, raw: &str, position: usize) -> Result<N, DecodeError>
    where
        N: FromStr,
        N::Err: fmt::Display,
    {
        raw.parse::<N>().map_err(|e| DecodeError::InvalidField {
            field: self.name,
            position,
            raw: raw.to_string(),
            reason: e.to_string(),
        })
    }

    fn apply(
        &self,
        record: &mut T,
        raw: &str,
        position: usize,
        clock: Option<&ClockContext>,
    ) -> Result<(), DecodeError> {
        match self.setter {
            Setter::Int32(set) => set(record, self.parse_num::<i32>(raw, position)?),
            Setter::Int64(set) => set(record, self.parse_num::<i64>(raw, position)?),
            Setter::Uint32(set) => set(record, self.parse_num::<u32>(raw, position)?),
            Setter::Uint64(set) => set(record, self.parse_num::<u64>(raw, position)?),
            Setter::Str(set) => set(record, raw.to_string()),
            Setter::Jiffies(set) => {
                let jiffies = self.parse_num::<i64>(raw, position)?;
                let clock = clock.ok_or(DecodeError::MissingClock { field: self.name })?;
                let ts = clock
                    .jiffies_to_time(jiffies)
                    .ok_or(DecodeError::TimestampOutOfRange {
                        field: self.name,
                        jiffies,
                    })?;
                set(record, ts);
            }
        }
        Ok(())
    }
}

/// Builds a [`FieldSpec`] that assigns straight into a struct field.
///
/// `field!(ProcessStat, Int32, "ppid", ppid)`
#[macro_export]
macro_rules! field {
    ($ty:ty, $kind:ident, $name:literal, $member:ident) => {
        $crate::decoder::FieldSpec {
            name: $name,
            setter: $crate::decoder::Setter::$kind(|r: &mut $ty, v| r.$member = v),
        }
    };
}

/// Decodes `tokens` into a fresh `T` following `schema` in order.
///
/// Tokens are trimmed before parsing. `clock` is only consulted for
/// [`FieldKind::Jiffies`] fields.
pub fn decode_record<T, I, S>(
    schema: &[FieldSpec<T>],
    tokens: I,
    clock: Option<&ClockContext>,
) -> Result<T, DecodeError>
where
    T: Default,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut record = T::default();
    for (position, (spec, raw)) in schema.iter().zip(tokens).enumerate() {
        spec.apply(&mut record, raw.as_ref().trim(), position, clock)?;
    }
    Ok(record)
}

/// Reads a text file that may carry arbitrary bytes, such as a comm name
/// set with `prctl(PR_SET_NAME)`. Invalid UTF-8 becomes U+FFFD.
pub fn read_lossy(path: &Path) -> Result<String, ProcError> {
    let bytes = fs::read(path).map_err(|e| ProcError::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Splits a NUL-separated block (cmdline, environ) into its non-empty entries.
///
/// Entries are decoded lossily: bytes that are not valid UTF-8 are replaced
/// with U+FFFD, so a replaced argument no longer matches its raw bytes.
pub fn nul_tokens(bytes: &[u8]) -> Vec<String> {
    bytes
        .split(|&b| b == 0u8)
        .filter(|s| !s.is_empty())
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Sample {
        id: i32,
        name: String,
        big: i64,
        mask: u64,
        started: DateTime<Utc>,
    }

    static SAMPLE_FIELDS: &[FieldSpec<Sample>] = &[
        field!(Sample, Int32, "id", id),
        field!(Sample, Str, "name", name),
        field!(Sample, Int64, "big", big),
        field!(Sample, Uint64, "mask", mask),
        field!(Sample, Jiffies, "started", started),
    ];

    fn clock() -> ClockContext {
        ClockContext::new(1_000_000, 100).unwrap()
    }

    #[test]
    fn test_decode_all_kinds() {
        let clock = clock();
        let rec: Sample = decode_record(
            SAMPLE_FIELDS,
            ["7", "worker", "-42", "18446744073709551615", "500"],
            Some(&clock),
        )
        .unwrap();

        assert_eq!(rec.id, 7);
        assert_eq!(rec.name, "worker");
        assert_eq!(rec.big, -42);
        assert_eq!(rec.mask, u64::MAX);
        assert_eq!(rec.started.timestamp(), 1_000_005);
    }

    #[test]
    fn test_short_token_sequence_keeps_defaults() {
        let rec: Sample = decode_record(SAMPLE_FIELDS, ["7", "worker"], None).unwrap();
        assert_eq!(rec.id, 7);
        assert_eq!(rec.name, "worker");
        assert_eq!(rec.big, 0);
        assert_eq!(rec.mask, 0);
        assert_eq!(rec.started, DateTime::<Utc>::default());
    }

    #[test]
    fn test_extra_tokens_ignored() {
        let clock = clock();
        let rec: Sample =
            decode_record(SAMPLE_FIELDS, ["1", "a", "2", "3", "4", "5", "6"], Some(&clock))
                .unwrap();
        assert_eq!(rec.mask, 3);
    }

    #[test]
    fn test_tokens_are_trimmed() {
        let rec: Sample = decode_record(SAMPLE_FIELDS, [" 12\n", "  x "], None).unwrap();
        assert_eq!(rec.id, 12);
        assert_eq!(rec.name, "x");
    }

    #[test]
    fn test_invalid_token_reports_field_position_and_raw() {
        let err = decode_record(SAMPLE_FIELDS, ["1", "a", "notanumber"], None).unwrap_err();
        match err {
            DecodeError::InvalidField {
                field,
                position,
                raw,
                ..
            } => {
                assert_eq!(field, "big");
                assert_eq!(position, 2);
                assert_eq!(raw, "notanumber");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_jiffies_without_clock_fails() {
        let err = decode_record(SAMPLE_FIELDS, ["1", "a", "2", "3", "4"], None).unwrap_err();
        assert_eq!(err, DecodeError::MissingClock { field: "started" });
    }

    #[test]
    fn test_kind_follows_setter() {
        let kinds: Vec<FieldKind> = SAMPLE_FIELDS.iter().map(|f| f.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                FieldKind::Int32,
                FieldKind::Str,
                FieldKind::Int64,
                FieldKind::Uint64,
                FieldKind::Jiffies
            ]
        );
    }

    #[test]
    fn test_nul_tokens_drop_empty_entries() {
        let tokens = nul_tokens(b"/sbin/dhclient\0-d\0\0eth0\0");
        assert_eq!(tokens, vec!["/sbin/dhclient", "-d", "eth0"]);
        assert!(nul_tokens(b"").is_empty());
    }

    #[test]
    fn test_nul_tokens_replace_invalid_utf8() {
        let tokens = nul_tokens(b"/bin/w\xffk\0--name=\xfe\0");
        assert_eq!(tokens, vec!["/bin/w\u{FFFD}k", "--name=\u{FFFD}"]);
    }

    #[test]
    fn test_read_lossy() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("comm");
        std::fs::write(&path, b"w\xffk\n").unwrap();
        assert_eq!(read_lossy(&path).unwrap(), "w\u{FFFD}k\n");
        assert!(read_lossy(&dir.path().join("missing"))
            .unwrap_err()
            .is_not_found());
    }
}
