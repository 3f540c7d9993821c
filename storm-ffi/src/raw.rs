//! StormLib C ABI: handle type, constants and function signatures
//!
//! Only the read-side subset used by [`StormEngine`](crate::StormEngine) is
//! described here. Signatures follow `StormLib.h` for non-Windows builds,
//! where `DWORD` and `LONG` are 32 bits wide.

#![allow(non_camel_case_types)]

use libc::{c_char, c_int, c_void};

/// Opaque StormLib handle (archive or file)
pub type HANDLE = *mut c_void;
/// 32-bit unsigned integer as used by StormLib
pub type DWORD = u32;
/// 32-bit signed integer as used by StormLib
pub type LONG = i32;

/// Longest name `SFileGetFileName` writes, excluding the terminator
pub const MAX_PATH: usize = 260;

/// Returned by `SFileGetFileSize` on failure
pub const SFILE_INVALID_SIZE: DWORD = 0xFFFF_FFFF;
/// Returned by `SFileSetFilePointer` on failure
pub const SFILE_INVALID_POS: DWORD = 0xFFFF_FFFF;

/// Open the file with patches applied
pub const SFILE_OPEN_FROM_MPQ: DWORD = 0x0000_0000;
/// Open the unpatched version of a file
pub const SFILE_OPEN_BASE_FILE: DWORD = 0xFFFF_FFFD;

/// `SFileSetFilePointer` move methods
pub const FILE_BEGIN: DWORD = 0;
pub const FILE_CURRENT: DWORD = 1;
pub const FILE_END: DWORD = 2;

/// `SFileGetFileInfo` classes
pub const SFILE_INFO_FILE_TIME: c_int = 50;
pub const SFILE_INFO_FILE_SIZE: c_int = 51;
pub const SFILE_INFO_COMPRESSED_SIZE: c_int = 52;

/// Error codes reported by StormLib on Linux and macOS
///
/// The first group aliases `errno` values; the rest are StormLib's own.
pub mod codes {
    use super::DWORD;

    pub const ERROR_SUCCESS: DWORD = 0;
    pub const ERROR_FILE_NOT_FOUND: DWORD = libc::ENOENT as DWORD;
    pub const ERROR_ACCESS_DENIED: DWORD = libc::EPERM as DWORD;
    pub const ERROR_INVALID_HANDLE: DWORD = libc::EBADF as DWORD;
    pub const ERROR_NOT_ENOUGH_MEMORY: DWORD = libc::ENOMEM as DWORD;
    pub const ERROR_NOT_SUPPORTED: DWORD = libc::ENOTSUP as DWORD;
    pub const ERROR_INVALID_PARAMETER: DWORD = libc::EINVAL as DWORD;
    pub const ERROR_NEGATIVE_SEEK: DWORD = libc::ESPIPE as DWORD;
    pub const ERROR_DISK_FULL: DWORD = libc::ENOSPC as DWORD;
    pub const ERROR_ALREADY_EXISTS: DWORD = libc::EEXIST as DWORD;
    pub const ERROR_INSUFFICIENT_BUFFER: DWORD = libc::ENOBUFS as DWORD;
    pub const ERROR_BAD_FORMAT: DWORD = 1000;
    pub const ERROR_NO_MORE_FILES: DWORD = 1001;
    pub const ERROR_HANDLE_EOF: DWORD = 1002;
    pub const ERROR_CAN_NOT_COMPLETE: DWORD = 1003;
    pub const ERROR_FILE_CORRUPT: DWORD = 1004;
}

pub type SFileOpenArchiveFn =
    unsafe extern "C" fn(*const c_char, DWORD, DWORD, *mut HANDLE) -> bool;
pub type SFileCloseArchiveFn = unsafe extern "C" fn(HANDLE) -> bool;
pub type SFileHasFileFn = unsafe extern "C" fn(HANDLE, *const c_char) -> bool;
pub type SFileOpenFileExFn =
    unsafe extern "C" fn(HANDLE, *const c_char, DWORD, *mut HANDLE) -> bool;
pub type SFileCloseFileFn = unsafe extern "C" fn(HANDLE) -> bool;
pub type SFileReadFileFn =
    unsafe extern "C" fn(HANDLE, *mut c_void, DWORD, *mut DWORD, *mut c_void) -> bool;
pub type SFileSetFilePointerFn = unsafe extern "C" fn(HANDLE, LONG, *mut LONG, DWORD) -> DWORD;
pub type SFileGetFileSizeFn = unsafe extern "C" fn(HANDLE, *mut DWORD) -> DWORD;
pub type SFileGetFileInfoFn =
    unsafe extern "C" fn(HANDLE, c_int, *mut c_void, DWORD, *mut DWORD) -> bool;
pub type SFileGetFileNameFn = unsafe extern "C" fn(HANDLE, *mut c_char) -> bool;
pub type SFileExtractFileFn =
    unsafe extern "C" fn(HANDLE, *const c_char, *const c_char, DWORD) -> bool;
pub type SFileOpenPatchArchiveFn =
    unsafe extern "C" fn(HANDLE, *const c_char, *const c_char, DWORD) -> bool;
pub type SFileIsPatchedArchiveFn = unsafe extern "C" fn(HANDLE) -> bool;
pub type GetLastErrorFn = unsafe extern "C" fn() -> DWORD;
pub type SetLastErrorFn = unsafe extern "C" fn(DWORD);

/// Value of a `SFileGetFileInfo` result written into a zeroed u64 buffer
///
/// Classes returning a DWORD fill only its low bytes.
pub fn info_value(buffer: u64, size: DWORD) -> u64 {
    if size as usize == std::mem::size_of::<DWORD>() {
        let bytes = buffer.to_ne_bytes();
        return DWORD::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64;
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dword_buffer(value: DWORD) -> u64 {
        let mut buffer = [0u8; 8];
        buffer[..4].copy_from_slice(&value.to_ne_bytes());
        u64::from_ne_bytes(buffer)
    }

    #[test]
    fn test_info_value_dword() {
        assert_eq!(info_value(dword_buffer(1234), 4), 1234);
        assert_eq!(info_value(dword_buffer(DWORD::MAX), 4), 0xFFFF_FFFF);
    }

    #[test]
    fn test_info_value_ignores_bytes_past_dword() {
        let mut buffer = dword_buffer(7).to_ne_bytes();
        buffer[4..].copy_from_slice(&[0xAA; 4]);
        assert_eq!(info_value(u64::from_ne_bytes(buffer), 4), 7);
    }

    #[test]
    fn test_info_value_u64() {
        let file_time = 0x01CB_8AE6_D6B2_8000;
        assert_eq!(info_value(file_time, 8), file_time);
    }
}
