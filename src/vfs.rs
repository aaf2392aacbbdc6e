//! The slice of the VFS that device nodes are written against.

use crate::device::File;
use nix::errno::Errno;

pub use crate::memory_file::MMapOpts;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FileOwner {
    pub uid: u32,
    pub gid: u32,
}

impl FileOwner {
    pub fn root() -> FileOwner {
        FileOwner { uid: 0, gid: 0 }
    }
}

/// Permission bits only; the file type lives in the inode.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FilePermissions {
    pub mode: u32,
}

impl FilePermissions {
    pub fn from_mode(mode: u32) -> FilePermissions {
        FilePermissions {
            mode: mode & 0o7777,
        }
    }

    pub fn other_can_read(&self) -> bool {
        self.mode & 0o004 != 0
    }

    pub fn other_can_write(&self) -> bool {
        self.mode & 0o002 != 0
    }
}

bitflags! {
    /// What an open file description may do.
    pub struct FileFlags: u32 {
        const READ = 0x1;
        const WRITE = 0x2;
        const PREAD = 0x4;
        const PWRITE = 0x8;
        const NONBLOCK = 0x10;
        const APPEND = 0x20;
    }
}

impl FileFlags {
    /// Flags for an `open(2)` with the given access mode and status flags.
    pub fn from_open_flags(oflags: i32) -> FileFlags {
        let mut flags = match oflags & libc::O_ACCMODE {
            libc::O_RDONLY => FileFlags::READ,
            libc::O_WRONLY => FileFlags::WRITE,
            _ => FileFlags::READ | FileFlags::WRITE,
        };
        if oflags & libc::O_NONBLOCK != 0 {
            flags |= FileFlags::NONBLOCK;
        }
        if oflags & libc::O_APPEND != 0 {
            flags |= FileFlags::APPEND;
        }
        flags
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Dirent {
    pub name: String,
}

impl Dirent {
    pub fn new(name: &str) -> Dirent {
        Dirent {
            name: name.to_owned(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct InodeAttributes {
    pub owner: FileOwner,
    pub perms: FilePermissions,
    /// Filesystem magic reported by statfs.
    pub magic: u64,
    pub rdev: u64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SeekWhence {
    Set,
    Cur,
    End,
}

impl SeekWhence {
    pub fn from_raw(whence: i32) -> Result<SeekWhence, Errno> {
        match whence {
            libc::SEEK_SET => Ok(SeekWhence::Set),
            libc::SEEK_CUR => Ok(SeekWhence::Cur),
            libc::SEEK_END => Ok(SeekWhence::End),
            _ => Err(Errno::EINVAL),
        }
    }
}

/// A character device inode.
pub trait DeviceNode: Send + Sync {
    fn name(&self) -> &str;

    fn attributes(&self) -> InodeAttributes;

    /// Open a new file description on this node. Device files are always
    /// positionally readable and writable, whatever `flags` says.
    fn get_file(&self, dirent: &Dirent, flags: FileFlags) -> Result<File, Errno>;
}
