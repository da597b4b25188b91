//! Anonymous POSIX shared memory for wl_shm pools
//!
//! Segments are created with `O_EXCL` under a process-unique name and
//! unlinked before `allocate` returns, so the only handle left is the file
//! descriptor. That descriptor is what gets mapped locally and handed to
//! the compositor.

use log::{debug, trace};
use std::ffi::CString;
use std::fs::File;
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Default prefix for segment names
pub const DEFAULT_NAME_PREFIX: &str = "/wl_shm";

/// Process-wide suffix counter, shared by every allocator
static NAME_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Errors raised while creating a shared memory segment
#[derive(Debug, Error)]
pub enum ShmError {
    #[error("refusing to allocate an empty shared memory segment")]
    ZeroSize,

    #[error("invalid shared memory name {0:?}")]
    InvalidName(String),

    #[error("shm_open({name}) failed: {source}")]
    Open {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("ftruncate to {size} bytes failed: {source}")]
    Truncate {
        size: usize,
        #[source]
        source: io::Error,
    },
}

/// An unlinked shared memory segment, owned through its descriptor
#[derive(Debug)]
pub struct SharedMemory {
    fd: OwnedFd,
    name: String,
    size: usize,
}

impl SharedMemory {
    /// Name the segment was created under (no longer reachable)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes the segment was truncated to
    pub fn size(&self) -> usize {
        self.size
    }

    /// Duplicate the descriptor as a `File` for mapping
    pub fn try_clone_file(&self) -> io::Result<File> {
        Ok(File::from(self.fd.try_clone()?))
    }
}

impl AsFd for SharedMemory {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

/// Allocates anonymous shared memory segments
#[derive(Debug, Clone)]
pub struct ShmAllocator {
    prefix: String,
}

impl Default for ShmAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_NAME_PREFIX)
    }
}

impl ShmAllocator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Next collision-free segment name for this process
    fn next_name(&self) -> String {
        let n = NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}-{}", self.prefix, std::process::id(), n)
    }

    /// Create an unlinked segment of exactly `size` bytes
    pub fn allocate(&self, size: usize) -> Result<SharedMemory, ShmError> {
        if size == 0 {
            return Err(ShmError::ZeroSize);
        }

        let name = self.next_name();
        let c_name =
            CString::new(name.clone()).map_err(|_| ShmError::InvalidName(name.clone()))?;

        trace!("Creating shm segment {}", name);
        // SAFETY: c_name is a valid NUL-terminated string for the duration of the call.
        let raw = unsafe {
            libc::shm_open(
                c_name.as_ptr(),
                libc::O_RDWR | libc::O_CREAT | libc::O_EXCL | libc::O_CLOEXEC,
                0o600 as libc::mode_t,
            )
        };
        if raw < 0 {
            return Err(ShmError::Open {
                name,
                source: io::Error::last_os_error(),
            });
        }
        // SAFETY: shm_open returned a fresh descriptor that nothing else owns.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        // SAFETY: same name as above; failure only means it is already gone.
        unsafe {
            libc::shm_unlink(c_name.as_ptr());
        }

        let len = libc::off_t::try_from(size).map_err(|_| ShmError::Truncate {
            size,
            source: io::Error::from(io::ErrorKind::InvalidInput),
        })?;
        // SAFETY: fd is open for writing.
        if unsafe { libc::ftruncate(fd.as_raw_fd(), len) } == -1 {
            return Err(ShmError::Truncate {
                size,
                source: io::Error::last_os_error(),
            });
        }

        debug!("Allocated {} bytes of shared memory ({})", size, name);
        Ok(SharedMemory { fd, name, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn reopen(name: &str) -> io::Result<()> {
        let c_name = CString::new(name).unwrap();
        let fd = unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDWR, 0) };
        if fd < 0 {
            Err(io::Error::last_os_error())
        } else {
            unsafe {
                libc::close(fd);
            }
            Ok(())
        }
    }

    #[test]
    #[serial]
    fn test_allocate_truncates_to_requested_size() {
        let alloc = ShmAllocator::default();
        for size in [1usize, 4096, 640 * 480 * 4 * 2] {
            let shm = alloc.allocate(size).unwrap();
            let file = shm.try_clone_file().unwrap();
            assert_eq!(file.metadata().unwrap().len(), size as u64);
            assert_eq!(shm.size(), size);
        }
    }

    #[test]
    #[serial]
    fn test_segment_is_unlinked() {
        let shm = ShmAllocator::default().allocate(128).unwrap();
        let err = reopen(shm.name()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    #[serial]
    fn test_names_are_unique_per_call() {
        let alloc = ShmAllocator::new("/wl_playground_test");
        let a = alloc.allocate(16).unwrap();
        let b = alloc.allocate(16).unwrap();
        assert_ne!(a.name(), b.name());
        assert!(a.name().starts_with("/wl_playground_test-"));
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let err = ShmAllocator::default().allocate(0).unwrap_err();
        assert!(matches!(err, ShmError::ZeroSize));
    }

    #[test]
    fn test_interior_nul_in_prefix_is_rejected() {
        let err = ShmAllocator::new("/bad\0name").allocate(8).unwrap_err();
        assert!(matches!(err, ShmError::InvalidName(_)));
    }
}
