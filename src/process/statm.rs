//! Memory usage summary from `/proc/<pid>/statm`.
//!
//! Seven page counts on one line. Values are kept as pages; multiply by the
//! page size for bytes.

use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::decoder::{decode_record, FieldSpec};
use crate::error::{DecodeError, ProcError};
use crate::field;

/// Page counts from /proc/<pid>/statm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statm {
    /// total program size (same as VmSize in status)
    pub size: i64,
    /// resident set size (same as VmRSS in status)
    pub resident: i64,
    /// resident shared pages (file backed)
    pub shared: i64,
    /// text (code)
    pub text: i64,
    /// library, unused since Linux 2.6
    pub lib: i64,
    /// data + stack
    pub data: i64,
    /// dirty pages, unused since Linux 2.6
    pub dirty: i64,
}

static STATM_FIELDS: &[FieldSpec<Statm>] = &[
    field!(Statm, Int64, "size", size),
    field!(Statm, Int64, "resident", resident),
    field!(Statm, Int64, "shared", shared),
    field!(Statm, Int64, "text", text),
    field!(Statm, Int64, "lib", lib),
    field!(Statm, Int64, "data", data),
    field!(Statm, Int64, "dt", dirty),
];

pub fn parse_statm(content: &str) -> Result<Statm, DecodeError> {
    decode_record(STATM_FIELDS, content.split_whitespace(), None)
}

/// Reads and decodes `<proc_path>/statm`.
pub fn read_statm(proc_path: &Path) -> Result<Statm, ProcError> {
    let path = proc_path.join("statm");
    let content = fs::read_to_string(&path).map_err(|e| ProcError::io(&path, e))?;
    parse_statm(&content).map_err(|e| ProcError::decode(&path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_statm() {
        let statm = parse_statm("5597 1163 950 214 0 413 0\n").unwrap();
        assert_eq!(
            statm,
            Statm {
                size: 5597,
                resident: 1163,
                shared: 950,
                text: 214,
                lib: 0,
                data: 413,
                dirty: 0,
            }
        );
    }

    #[test]
    fn test_parse_statm_invalid() {
        let err = parse_statm("5597 abc 950 214 0 413 0").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidField {
                field: "resident",
                position: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_statm_empty_is_zero() {
        assert_eq!(parse_statm("").unwrap(), Statm::default());
    }
}
