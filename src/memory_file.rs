//! Fixed-size anonymous in-memory files.
//!
//! Device contents that the guest can read or map live in a memfd, so that a
//! mapping and ordinary reads see the same bytes without us copying between
//! them.

use crate::{
    log::LogLevel::{LogDebug, LogError},
    scoped_fd::ScopedFd,
};
use libc::off_t;
use nix::{
    errno::Errno,
    sys::{
        memfd::{memfd_create, MemFdCreateFlag},
        uio::{pread, pwrite},
    },
    unistd::{ftruncate, sysconf, SysconfVar},
};
use std::{cmp::min, ffi::CString, sync::Arc};

pub type MemoryFileSharedPtr = Arc<MemoryFile>;

/// We DONT want this to be either Copy or Clone.
pub struct MemoryFile {
    name: String,
    file: ScopedFd,
    size_: u64,
}

/// What a memory mapping request looks like once a file has configured it.
#[derive(Clone, Default)]
pub struct MMapOpts {
    pub length: u64,
    pub offset: u64,
    pub private: bool,
    /// What to map. Filled in by the file being mapped.
    pub mappable: Option<MemoryFileSharedPtr>,
}

fn page_size() -> u64 {
    match sysconf(SysconfVar::PAGE_SIZE) {
        Ok(Some(size)) if size > 0 => size as u64,
        _ => 4096,
    }
}

impl MemoryFile {
    /// Create a memfd and truncate it to exactly `size` bytes.
    pub fn create(name: &str, size: u64) -> Result<MemoryFile, Errno> {
        let cname = CString::new(name).map_err(|_| Errno::EINVAL)?;
        let file = ScopedFd::from_raw(memfd_create(&cname, MemFdCreateFlag::MFD_CLOEXEC)?);
        if let Err(e) = ftruncate(file.as_raw(), size as off_t) {
            log!(LogError, "Failed to size memory file `{}' to {}", name, size);
            return Err(e);
        }
        log!(
            LogDebug,
            "Created memory file `{}' of {} bytes at fd {}",
            name,
            size,
            file.as_raw()
        );
        Ok(MemoryFile {
            name: name.to_owned(),
            file,
            size_: size,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size_
    }

    pub fn fd(&self) -> &ScopedFd {
        &self.file
    }

    /// Read at `offset`. Short reads only happen at the end of the file.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize, Errno> {
        if offset >= self.size_ {
            return Ok(0);
        }
        let len = min(buf.len() as u64, self.size_ - offset) as usize;
        let mut done = 0;
        while done < len {
            let nread = pread(
                self.file.as_raw(),
                &mut buf[done..len],
                (offset + done as u64) as off_t,
            )?;
            if nread == 0 {
                break;
            }
            done += nread;
        }
        Ok(done)
    }

    /// Write at `offset`. The file never grows, so anything past the end is
    /// dropped and not counted.
    pub fn write_at(&self, buf: &[u8], offset: u64) -> Result<usize, Errno> {
        if offset >= self.size_ {
            return Ok(0);
        }
        let len = min(buf.len() as u64, self.size_ - offset) as usize;
        let mut done = 0;
        while done < len {
            let nwritten = pwrite(
                self.file.as_raw(),
                &buf[done..len],
                (offset + done as u64) as off_t,
            )?;
            if nwritten == 0 {
                break;
            }
            done += nwritten;
        }
        Ok(done)
    }

    /// Point `opts` at this file.
    pub fn configure_mmap(self: &Arc<Self>, opts: &mut MMapOpts) -> Result<(), Errno> {
        if opts.offset % page_size() != 0 || opts.length == 0 {
            return Err(Errno::EINVAL);
        }
        opts.mappable = Some(self.clone());
        Ok(())
    }
}
