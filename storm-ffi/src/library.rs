//! Run-time loading of the StormLib shared library
//!
//! The library is opened with `dlopen` so that nothing links against
//! StormLib at build time. Every required export is resolved up front; a
//! library missing any of them is rejected.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::LoadError;
use crate::raw::*;

/// Names tried by [`StormLib::load`], in order
#[cfg(target_os = "macos")]
pub const DEFAULT_LIBRARY_NAMES: &[&str] = &["libstorm.dylib", "libstorm.9.dylib"];
/// Names tried by [`StormLib::load`], in order
#[cfg(not(target_os = "macos"))]
pub const DEFAULT_LIBRARY_NAMES: &[&str] = &["libstorm.so", "libstorm.so.9", "libStorm.so"];

/// Resolved StormLib entry points
pub(crate) struct Functions {
    pub open_archive: SFileOpenArchiveFn,
    pub close_archive: SFileCloseArchiveFn,
    pub has_file: SFileHasFileFn,
    pub open_file: SFileOpenFileExFn,
    pub close_file: SFileCloseFileFn,
    pub read_file: SFileReadFileFn,
    pub set_file_pointer: SFileSetFilePointerFn,
    pub get_file_size: SFileGetFileSizeFn,
    pub get_file_info: SFileGetFileInfoFn,
    pub get_file_name: SFileGetFileNameFn,
    pub extract_file: SFileExtractFileFn,
    pub open_patch_archive: SFileOpenPatchArchiveFn,
    pub is_patched_archive: SFileIsPatchedArchiveFn,
    pub get_last_error: GetLastErrorFn,
    pub set_last_error: Option<SetLastErrorFn>,
}

/// A loaded StormLib shared library
///
/// The library stays loaded until this value is dropped.
pub struct StormLib {
    #[cfg_attr(not(unix), allow(dead_code))]
    handle: *mut libc::c_void,
    location: String,
    pub(crate) functions: Functions,
}

impl StormLib {
    /// Load StormLib from the dynamic loader's search path
    pub fn load() -> Result<Self, LoadError> {
        let mut last_reason = String::new();
        for name in DEFAULT_LIBRARY_NAMES {
            match Self::load_from(name) {
                Ok(lib) => return Ok(lib),
                Err(LoadError::Open { reason, .. }) => {
                    log::debug!("Could not load {}: {}", name, reason);
                    last_reason = reason;
                }
                Err(e) => return Err(e),
            }
        }

        Err(LoadError::Open {
            tried: DEFAULT_LIBRARY_NAMES.join(", "),
            reason: last_reason,
        })
    }

    /// Load StormLib from an explicit path or library name
    #[cfg(unix)]
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        use std::ffi::{CStr, CString};
        use std::os::unix::ffi::OsStrExt;

        let path = path.as_ref();
        let location = path.display().to_string();
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| LoadError::InvalidPath(PathBuf::from(path)))?;

        // SAFETY: c_path is a valid NUL-terminated string
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        if handle.is_null() {
            // SAFETY: dlerror returns NULL or a valid C string owned by the loader
            let reason = unsafe {
                let message = libc::dlerror();
                if message.is_null() {
                    "unknown dlopen failure".to_string()
                } else {
                    CStr::from_ptr(message).to_string_lossy().into_owned()
                }
            };
            return Err(LoadError::Open {
                tried: location,
                reason,
            });
        }

        let lookup = |symbol: &'static str| -> Result<*mut libc::c_void, LoadError> {
            let c_symbol = CString::new(symbol).map_err(|_| LoadError::MissingSymbol {
                library: location.clone(),
                symbol,
            })?;
            // SAFETY: handle was returned by a successful dlopen
            let ptr = unsafe { libc::dlsym(handle, c_symbol.as_ptr()) };
            if ptr.is_null() {
                Err(LoadError::MissingSymbol {
                    library: location.clone(),
                    symbol,
                })
            } else {
                Ok(ptr)
            }
        };

        macro_rules! resolve {
            ($symbol:literal) => {
                // SAFETY: the symbol is a StormLib export with the signature
                // declared for it in `raw`
                lookup($symbol).map(|ptr| unsafe { std::mem::transmute(ptr) })
            };
        }

        let functions = (|| -> Result<Functions, LoadError> {
            let get_last_error: GetLastErrorFn = match resolve!("SErrGetLastError") {
                Ok(f) => f,
                Err(_) => resolve!("GetLastError")?,
            };
            let set_last_error: Option<SetLastErrorFn> = resolve!("SErrSetLastError")
                .or_else(|_| resolve!("SetLastError"))
                .ok();

            Ok(Functions {
                open_archive: resolve!("SFileOpenArchive")?,
                close_archive: resolve!("SFileCloseArchive")?,
                has_file: resolve!("SFileHasFile")?,
                open_file: resolve!("SFileOpenFileEx")?,
                close_file: resolve!("SFileCloseFile")?,
                read_file: resolve!("SFileReadFile")?,
                set_file_pointer: resolve!("SFileSetFilePointer")?,
                get_file_size: resolve!("SFileGetFileSize")?,
                get_file_info: resolve!("SFileGetFileInfo")?,
                get_file_name: resolve!("SFileGetFileName")?,
                extract_file: resolve!("SFileExtractFile")?,
                open_patch_archive: resolve!("SFileOpenPatchArchive")?,
                is_patched_archive: resolve!("SFileIsPatchedArchive")?,
                get_last_error,
                set_last_error,
            })
        })();

        match functions {
            Ok(functions) => {
                log::info!("Loaded StormLib from {}", location);
                Ok(Self {
                    handle,
                    location,
                    functions,
                })
            }
            Err(e) => {
                // SAFETY: handle came from dlopen and is not used afterwards
                unsafe { libc::dlclose(handle) };
                Err(e)
            }
        }
    }

    /// Load StormLib from an explicit path or library name
    #[cfg(not(unix))]
    pub fn load_from<P: AsRef<Path>>(_path: P) -> Result<Self, LoadError> {
        Err(LoadError::Unsupported)
    }

    /// Path or name the library was loaded from
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Last error code reported by StormLib on this thread
    pub(crate) fn last_error(&self) -> DWORD {
        // SAFETY: resolved from the loaded library, takes no arguments
        unsafe { (self.functions.get_last_error)() }
    }

    /// Reset the last error code, when the library allows it
    pub(crate) fn clear_last_error(&self) {
        if let Some(set_last_error) = self.functions.set_last_error {
            // SAFETY: resolved from the loaded library
            unsafe { set_last_error(codes::ERROR_SUCCESS) };
        }
    }
}

impl Drop for StormLib {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            log::debug!("Unloading StormLib from {}", self.location);
            // SAFETY: handle came from a successful dlopen; no function
            // pointers outlive self
            unsafe { libc::dlclose(self.handle) };
        }
    }
}

impl fmt::Debug for StormLib {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StormLib")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}
