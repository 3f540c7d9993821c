//! [`ArchiveEngine`] implementation backed by StormLib

use std::ffi::{CStr, CString};
use std::fmt;
use std::path::Path;
use std::ptr;

use mpq::path::to_archive_name;
use mpq::{ArchiveEngine, Error, InfoField, OpenFlags, Result, SearchScope, SeekOrigin};

use crate::error::{
    describe, file_info_error, file_pointer_result, file_size_result, has_file_result,
    read_result, to_mpq_error,
};
use crate::library::StormLib;
use crate::raw::{self, DWORD, HANDLE, LONG};

/// Open StormLib archive handle
#[derive(Debug)]
pub struct StormArchive(HANDLE);

/// Open StormLib file handle
#[derive(Debug)]
pub struct StormFile(HANDLE);

/// Archive engine calling into a loaded StormLib
///
/// Handles are raw StormLib handles, so neither the engine nor its handles
/// may cross threads.
///
/// # Examples
///
/// ```no_run
/// use mpq::{ArchiveSet, OpenFlags};
/// use storm_ffi::StormEngine;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut set = ArchiveSet::new(StormEngine::load()?);
/// set.attach("Data/common.MPQ", OpenFlags::default())?;
/// set.attach("Data/patch.MPQ", OpenFlags::default())?;
///
/// let data = set.read_all("Interface/FrameXML/UIParent.lua")?;
/// println!("{} bytes", data.len());
/// # Ok(())
/// # }
/// ```
pub struct StormEngine {
    lib: StormLib,
}

impl StormEngine {
    /// Load StormLib from the default search path
    pub fn load() -> std::result::Result<Self, crate::LoadError> {
        StormLib::load().map(Self::new)
    }

    /// Load StormLib from an explicit path
    pub fn load_from<P: AsRef<Path>>(path: P) -> std::result::Result<Self, crate::LoadError> {
        StormLib::load_from(path).map(Self::new)
    }

    /// Wrap an already loaded library
    pub fn new(lib: StormLib) -> Self {
        Self { lib }
    }

    /// The loaded library
    pub fn library(&self) -> &StormLib {
        &self.lib
    }

    fn fail(&self, operation: &'static str, name: Option<&str>) -> Error {
        let code = self.lib.last_error();
        log::debug!("{} failed with {}", operation, describe(code));
        to_mpq_error(operation, code, name)
    }

    fn position(&self, file: &StormFile) -> Result<u64> {
        self.set_pointer(file, 0, raw::FILE_CURRENT)
    }

    fn set_pointer(&self, file: &StormFile, offset: i64, method: DWORD) -> Result<u64> {
        let mut high = (offset >> 32) as LONG;
        self.lib.clear_last_error();
        // SAFETY: file.0 is an open file handle; high is a valid out pointer
        let low = unsafe {
            (self.lib.functions.set_file_pointer)(file.0, offset as LONG, &mut high, method)
        };

        file_pointer_result(low, high, self.lib.last_error(), offset)
    }
}

impl fmt::Debug for StormEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StormEngine")
            .field("library", &self.lib.location())
            .finish()
    }
}

fn name_to_cstring(name: &str) -> Result<CString> {
    CString::new(to_archive_name(name)).map_err(|_| Error::InvalidName(name.to_string()))
}

#[cfg(unix)]
fn path_to_cstring(path: &Path) -> Result<CString> {
    use std::os::unix::ffi::OsStrExt;

    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| Error::InvalidName(path.display().to_string()))
}

#[cfg(not(unix))]
fn path_to_cstring(path: &Path) -> Result<CString> {
    path.to_str()
        .and_then(|s| CString::new(s).ok())
        .ok_or_else(|| Error::InvalidName(path.display().to_string()))
}

fn scope_to_raw(scope: SearchScope) -> DWORD {
    match scope {
        SearchScope::Patched => raw::SFILE_OPEN_FROM_MPQ,
        SearchScope::BaseOnly => raw::SFILE_OPEN_BASE_FILE,
    }
}

impl ArchiveEngine for StormEngine {
    type Archive = StormArchive;
    type File = StormFile;

    fn open_archive(&self, path: &Path, flags: OpenFlags) -> Result<StormArchive> {
        let c_path = path_to_cstring(path)?;
        let mut handle: HANDLE = ptr::null_mut();

        // SAFETY: c_path is NUL-terminated; handle is a valid out pointer
        let ok = unsafe {
            (self.lib.functions.open_archive)(c_path.as_ptr(), 0, flags.bits(), &mut handle)
        };
        if !ok || handle.is_null() {
            let code = self.lib.last_error();
            return Err(Error::open(path, describe(code)));
        }

        log::debug!("Opened {} with flags {:?}", path.display(), flags);
        Ok(StormArchive(handle))
    }

    fn close_archive(&self, archive: StormArchive) -> Result<()> {
        // SAFETY: the handle is consumed, so it is closed exactly once
        if unsafe { (self.lib.functions.close_archive)(archive.0) } {
            Ok(())
        } else {
            Err(self.fail("SFileCloseArchive", None))
        }
    }

    fn has_file(&self, archive: &StormArchive, name: &str) -> Result<bool> {
        let c_name = name_to_cstring(name)?;
        self.lib.clear_last_error();

        // SAFETY: archive.0 is an open archive handle; c_name is NUL-terminated
        let found = unsafe { (self.lib.functions.has_file)(archive.0, c_name.as_ptr()) };
        has_file_result(found, self.lib.last_error())
    }

    fn open_file(&self, archive: &StormArchive, name: &str, scope: SearchScope) -> Result<StormFile> {
        let c_name = name_to_cstring(name)?;
        let mut handle: HANDLE = ptr::null_mut();

        // SAFETY: archive.0 is an open archive handle; handle is a valid out pointer
        let ok = unsafe {
            (self.lib.functions.open_file)(archive.0, c_name.as_ptr(), scope_to_raw(scope), &mut handle)
        };
        if !ok || handle.is_null() {
            return Err(self.fail("SFileOpenFileEx", Some(name)));
        }

        Ok(StormFile(handle))
    }

    fn close_file(&self, file: StormFile) -> Result<()> {
        // SAFETY: the handle is consumed, so it is closed exactly once
        if unsafe { (self.lib.functions.close_file)(file.0) } {
            Ok(())
        } else {
            Err(self.fail("SFileCloseFile", None))
        }
    }

    fn read(&self, file: &mut StormFile, buf: &mut [u8]) -> Result<usize> {
        let len = buf.len().min(DWORD::MAX as usize) as DWORD;
        let mut read: DWORD = 0;

        // SAFETY: buf is valid for len bytes; read is a valid out pointer
        let ok = unsafe {
            (self.lib.functions.read_file)(
                file.0,
                buf.as_mut_ptr().cast(),
                len,
                &mut read,
                ptr::null_mut(),
            )
        };
        read_result(ok, self.lib.last_error(), read)
    }

    fn seek(&self, file: &mut StormFile, offset: i64, origin: SeekOrigin) -> Result<u64> {
        let base = match origin {
            SeekOrigin::Start => 0,
            SeekOrigin::Current => self.position(file)?,
            SeekOrigin::End => self.file_size(file)?,
        };
        let position = i64::try_from(base)
            .map_err(|_| Error::engine("SFileSetFilePointer", "position out of range"))?
            .saturating_add(offset);
        if position < 0 {
            return Err(Error::NegativeSeek { position });
        }

        self.set_pointer(file, position, raw::FILE_BEGIN)
    }

    fn file_size(&self, file: &StormFile) -> Result<u64> {
        let mut high: DWORD = 0;
        self.lib.clear_last_error();

        // SAFETY: file.0 is an open file handle; high is a valid out pointer
        let low = unsafe { (self.lib.functions.get_file_size)(file.0, &mut high) };
        file_size_result(low, high, self.lib.last_error())
    }

    fn file_info(&self, file: &StormFile, field: InfoField) -> Result<u64> {
        let class = match field {
            InfoField::FileTime => raw::SFILE_INFO_FILE_TIME,
            InfoField::FileSize => raw::SFILE_INFO_FILE_SIZE,
            InfoField::CompressedSize => raw::SFILE_INFO_COMPRESSED_SIZE,
        };

        let mut value: u64 = 0;
        let size = match field {
            InfoField::FileTime => std::mem::size_of::<u64>(),
            InfoField::FileSize | InfoField::CompressedSize => std::mem::size_of::<DWORD>(),
        } as DWORD;

        // SAFETY: value has room for `size` bytes; both sizes fit in a u64
        let ok = unsafe {
            (self.lib.functions.get_file_info)(
                file.0,
                class,
                (&mut value as *mut u64).cast(),
                size,
                ptr::null_mut(),
            )
        };
        if !ok {
            return Err(file_info_error(self.lib.last_error()));
        }
        Ok(raw::info_value(value, size))
    }

    fn file_name(&self, file: &StormFile) -> Result<String> {
        let mut buf = [0 as libc::c_char; raw::MAX_PATH + 1];

        // SAFETY: buf holds MAX_PATH characters plus a terminator
        if !unsafe { (self.lib.functions.get_file_name)(file.0, buf.as_mut_ptr()) } {
            return Err(self.fail("SFileGetFileName", None));
        }

        // Guarantee termination even if the library filled the buffer
        buf[raw::MAX_PATH] = 0;
        // SAFETY: buf is NUL-terminated
        let name = unsafe { CStr::from_ptr(buf.as_ptr()) };
        Ok(name.to_string_lossy().into_owned())
    }

    fn extract(&self, archive: &StormArchive, name: &str, dest: &Path, scope: SearchScope) -> Result<()> {
        let c_name = name_to_cstring(name)?;
        let c_dest = path_to_cstring(dest)?;

        // SAFETY: archive.0 is open; both strings are NUL-terminated
        let ok = unsafe {
            (self.lib.functions.extract_file)(
                archive.0,
                c_name.as_ptr(),
                c_dest.as_ptr(),
                scope_to_raw(scope),
            )
        };
        if ok {
            Ok(())
        } else {
            Err(self.fail("SFileExtractFile", Some(name)))
        }
    }

    fn open_patch_archive(&self, archive: &StormArchive, path: &Path, prefix: Option<&str>) -> Result<()> {
        let c_path = path_to_cstring(path)?;
        let c_prefix = prefix.map(name_to_cstring).transpose()?;

        // SAFETY: archive.0 is open; strings are NUL-terminated or NULL
        let ok = unsafe {
            (self.lib.functions.open_patch_archive)(
                archive.0,
                c_path.as_ptr(),
                c_prefix.as_ref().map_or(ptr::null(), |p| p.as_ptr()),
                0,
            )
        };
        if ok {
            Ok(())
        } else {
            let code = self.lib.last_error();
            Err(Error::open(path, describe(code)))
        }
    }

    fn is_patched(&self, archive: &StormArchive) -> Result<bool> {
        // SAFETY: archive.0 is an open archive handle
        Ok(unsafe { (self.lib.functions.is_patched_archive)(archive.0) })
    }
}
