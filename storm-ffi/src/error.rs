//! Loader errors and StormLib error code translation

use std::path::PathBuf;

use thiserror::Error;

use crate::raw::{codes, DWORD, LONG, SFILE_INVALID_POS, SFILE_INVALID_SIZE};

/// Failure to load StormLib at run time
#[derive(Error, Debug)]
pub enum LoadError {
    /// None of the candidate libraries could be opened
    #[error("Could not load StormLib ({tried}): {reason}")]
    Open {
        /// Library names or paths that were tried
        tried: String,
        /// Dynamic loader message for the last attempt
        reason: String,
    },

    /// The library loaded but lacks a required export
    #[error("StormLib at {library} does not export {symbol}")]
    MissingSymbol {
        /// Library that was loaded
        library: String,
        /// Name of the missing function
        symbol: &'static str,
    },

    /// Library path that cannot be passed to the dynamic loader
    #[error("Invalid library path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// Run-time loading is not available on this platform
    #[error("Loading StormLib at run time is not supported on this platform")]
    Unsupported,
}

/// Human readable description of a StormLib error code
pub fn describe(code: DWORD) -> String {
    let text = match code {
        codes::ERROR_SUCCESS => "No error reported",
        codes::ERROR_FILE_NOT_FOUND => "File not found",
        codes::ERROR_ACCESS_DENIED => "Access denied",
        codes::ERROR_INVALID_HANDLE => "Invalid handle",
        codes::ERROR_NOT_ENOUGH_MEMORY => "Not enough memory",
        codes::ERROR_NOT_SUPPORTED => "Operation not supported",
        codes::ERROR_INVALID_PARAMETER => "Invalid parameter",
        codes::ERROR_NEGATIVE_SEEK => "Negative seek",
        codes::ERROR_DISK_FULL => "Disk full",
        codes::ERROR_ALREADY_EXISTS => "Already exists",
        codes::ERROR_INSUFFICIENT_BUFFER => "Insufficient buffer",
        codes::ERROR_BAD_FORMAT => "Bad archive format",
        codes::ERROR_NO_MORE_FILES => "No more files",
        codes::ERROR_HANDLE_EOF => "End of file",
        codes::ERROR_CAN_NOT_COMPLETE => "Operation cannot be completed",
        codes::ERROR_FILE_CORRUPT => "File is corrupt",
        other => return format!("StormLib error {other}"),
    };
    format!("{text} (error {code})")
}

/// Translate a failed StormLib call into an [`mpq::Error`]
///
/// `name` is the entry the call was made for, if any; it lets a
/// not-found code become [`mpq::Error::FileNotFound`].
pub fn to_mpq_error(operation: &'static str, code: DWORD, name: Option<&str>) -> mpq::Error {
    match (code, name) {
        (codes::ERROR_FILE_NOT_FOUND, Some(name)) => mpq::Error::FileNotFound(name.to_string()),
        (codes::ERROR_NOT_SUPPORTED, _) => mpq::Error::Unsupported(operation),
        _ => mpq::Error::engine(operation, describe(code)),
    }
}

/// Outcome of `SFileHasFile`
///
/// A missing entry is reported either with a not-found code or with no
/// code at all; anything else is a real failure.
pub(crate) fn has_file_result(found: bool, code: DWORD) -> mpq::Result<bool> {
    if found {
        return Ok(true);
    }
    match code {
        codes::ERROR_FILE_NOT_FOUND | codes::ERROR_SUCCESS => Ok(false),
        code => Err(to_mpq_error("SFileHasFile", code, None)),
    }
}

/// Outcome of `SFileReadFile`; reaching the end of the entry is a short read
pub(crate) fn read_result(ok: bool, code: DWORD, read: DWORD) -> mpq::Result<usize> {
    if !ok && code != codes::ERROR_HANDLE_EOF {
        return Err(to_mpq_error("SFileReadFile", code, None));
    }
    Ok(read as usize)
}

/// Outcome of `SFileSetFilePointer` for a request to move to `requested`
///
/// `SFILE_INVALID_POS` is also a valid low half, so only a set error code
/// marks failure.
pub(crate) fn file_pointer_result(
    low: DWORD,
    high: LONG,
    code: DWORD,
    requested: i64,
) -> mpq::Result<u64> {
    if low == SFILE_INVALID_POS {
        match code {
            codes::ERROR_SUCCESS => {}
            codes::ERROR_NEGATIVE_SEEK => {
                return Err(mpq::Error::NegativeSeek {
                    position: requested,
                })
            }
            code => return Err(to_mpq_error("SFileSetFilePointer", code, None)),
        }
    }
    Ok(((high as u32 as u64) << 32) | low as u64)
}

/// Outcome of `SFileGetFileSize`
pub(crate) fn file_size_result(low: DWORD, high: DWORD, code: DWORD) -> mpq::Result<u64> {
    if low == SFILE_INVALID_SIZE && code != codes::ERROR_SUCCESS {
        return Err(to_mpq_error("SFileGetFileSize", code, None));
    }
    Ok(((high as u64) << 32) | low as u64)
}

/// Error for a failed `SFileGetFileInfo`
///
/// StormLib rejects info classes it does not know with an invalid
/// parameter code.
pub(crate) fn file_info_error(code: DWORD) -> mpq::Error {
    match code {
        codes::ERROR_INVALID_PARAMETER | codes::ERROR_NOT_SUPPORTED => {
            mpq::Error::Unsupported("SFileGetFileInfo")
        }
        code => to_mpq_error("SFileGetFileInfo", code, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_describe_known_codes() {
        assert_eq!(describe(codes::ERROR_FILE_CORRUPT), "File is corrupt (error 1004)");
        assert_eq!(describe(codes::ERROR_BAD_FORMAT), "Bad archive format (error 1000)");
        assert_eq!(describe(4242), "StormLib error 4242");
    }

    #[test]
    fn test_not_found_with_name() {
        let err = to_mpq_error("SFileOpenFileEx", codes::ERROR_FILE_NOT_FOUND, Some("a.txt"));
        assert!(matches!(err, mpq::Error::FileNotFound(ref name) if name == "a.txt"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_not_found_without_name_is_engine_error() {
        let err = to_mpq_error("SFileReadFile", codes::ERROR_FILE_NOT_FOUND, None);
        assert!(matches!(
            err,
            mpq::Error::Engine {
                operation: "SFileReadFile",
                ..
            }
        ));
    }

    #[test]
    fn test_not_supported() {
        let err = to_mpq_error("SFileGetFileInfo", codes::ERROR_NOT_SUPPORTED, None);
        assert!(matches!(err, mpq::Error::Unsupported("SFileGetFileInfo")));
    }

    #[test]
    fn test_engine_error_message() {
        let err = to_mpq_error("SFileReadFile", codes::ERROR_FILE_CORRUPT, Some("a.txt"));
        assert_eq!(
            err.to_string(),
            "SFileReadFile failed: File is corrupt (error 1004)"
        );
    }

    #[test]
    fn test_has_file_found() {
        assert!(has_file_result(true, codes::ERROR_FILE_CORRUPT).unwrap());
    }

    #[test]
    fn test_has_file_missing_is_false() {
        assert!(!has_file_result(false, codes::ERROR_FILE_NOT_FOUND).unwrap());
        assert!(!has_file_result(false, codes::ERROR_SUCCESS).unwrap());
    }

    #[test]
    fn test_has_file_other_code_is_engine_error() {
        let err = has_file_result(false, codes::ERROR_INVALID_HANDLE).unwrap_err();
        assert!(matches!(
            err,
            mpq::Error::Engine {
                operation: "SFileHasFile",
                ..
            }
        ));
    }

    #[test]
    fn test_read_end_of_file_is_short_read() {
        assert_eq!(read_result(true, codes::ERROR_SUCCESS, 16).unwrap(), 16);
        assert_eq!(read_result(false, codes::ERROR_HANDLE_EOF, 3).unwrap(), 3);
        assert_eq!(read_result(false, codes::ERROR_HANDLE_EOF, 0).unwrap(), 0);
    }

    #[test]
    fn test_read_failure() {
        let err = read_result(false, codes::ERROR_FILE_CORRUPT, 0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "SFileReadFile failed: File is corrupt (error 1004)"
        );
    }

    #[test]
    fn test_file_pointer_combines_halves() {
        assert_eq!(file_pointer_result(10, 0, codes::ERROR_SUCCESS, 10).unwrap(), 10);
        assert_eq!(
            file_pointer_result(5, 1, codes::ERROR_SUCCESS, 0x1_0000_0005).unwrap(),
            0x1_0000_0005
        );
    }

    #[test]
    fn test_file_pointer_invalid_pos_without_error_is_position() {
        assert_eq!(
            file_pointer_result(SFILE_INVALID_POS, 0, codes::ERROR_SUCCESS, 0xFFFF_FFFF).unwrap(),
            0xFFFF_FFFF
        );
    }

    #[test]
    fn test_file_pointer_failures() {
        assert!(matches!(
            file_pointer_result(SFILE_INVALID_POS, 0, codes::ERROR_NEGATIVE_SEEK, -4),
            Err(mpq::Error::NegativeSeek { position: -4 })
        ));
        assert!(matches!(
            file_pointer_result(SFILE_INVALID_POS, 0, codes::ERROR_INVALID_HANDLE, 0),
            Err(mpq::Error::Engine {
                operation: "SFileSetFilePointer",
                ..
            })
        ));
    }

    #[test]
    fn test_file_size_results() {
        assert_eq!(file_size_result(42, 0, codes::ERROR_SUCCESS).unwrap(), 42);
        assert_eq!(file_size_result(0, 2, codes::ERROR_SUCCESS).unwrap(), 0x2_0000_0000);
        assert_eq!(
            file_size_result(SFILE_INVALID_SIZE, 0, codes::ERROR_SUCCESS).unwrap(),
            0xFFFF_FFFF
        );
        assert!(file_size_result(SFILE_INVALID_SIZE, 0, codes::ERROR_INVALID_HANDLE).is_err());
    }

    #[test]
    fn test_file_info_unknown_class_is_unsupported() {
        for code in [codes::ERROR_INVALID_PARAMETER, codes::ERROR_NOT_SUPPORTED] {
            assert!(matches!(
                file_info_error(code),
                mpq::Error::Unsupported("SFileGetFileInfo")
            ));
        }
        assert!(matches!(
            file_info_error(codes::ERROR_INVALID_HANDLE),
            mpq::Error::Engine {
                operation: "SFileGetFileInfo",
                ..
            }
        ));
    }
}
