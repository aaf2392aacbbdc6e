//! Virtual character devices.
//!
//! A device supplies `FileOperations` for whatever it actually implements and
//! declares that set in its `FileCaps`. `File` fills in the rest with the same
//! no-ops and errors the kernel gives for a device that lacks the operation.

use crate::{
    context::Context,
    ioctl::{self, IoctlArgs, UnknownIoctlPolicy},
    log::LogLevel::LogDebug,
    vfs::{FileFlags, MMapOpts, SeekWhence},
};
use nix::errno::Errno;
use std::fmt::{self, Display, Formatter};

pub mod fb;
pub mod pty;
pub mod table;

bitflags! {
    pub struct FileCaps: u32 {
        const READ = 0x1;
        const WRITE = 0x2;
        const MMAP = 0x4;
        const SEEK = 0x8;
        const IOCTL = 0x10;
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DeviceKind {
    Framebuffer,
    Pty,
}

impl DeviceKind {
    pub fn caps(self) -> FileCaps {
        match self {
            DeviceKind::Framebuffer => {
                FileCaps::READ | FileCaps::MMAP | FileCaps::SEEK | FileCaps::IOCTL
            }
            DeviceKind::Pty => FileCaps::SEEK | FileCaps::IOCTL,
        }
    }

    pub fn unknown_ioctl_policy(self) -> UnknownIoctlPolicy {
        match self {
            DeviceKind::Framebuffer => UnknownIoctlPolicy::Reject,
            DeviceKind::Pty => UnknownIoctlPolicy::Ignore,
        }
    }
}

impl Display for DeviceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Framebuffer => write!(f, "framebuffer"),
            DeviceKind::Pty => write!(f, "pty"),
        }
    }
}

/// Per-open-file device behaviour. Only called for operations the device
/// kind has the capability for.
pub trait FileOperations: Send {
    fn read(&mut self, _buf: &mut [u8], _offset: u64) -> Result<usize, Errno> {
        Ok(0)
    }

    fn write(&mut self, buf: &[u8], _offset: u64) -> Result<usize, Errno> {
        Ok(buf.len())
    }

    fn configure_mmap(&mut self, _opts: &mut MMapOpts) -> Result<(), Errno> {
        Err(Errno::ENODEV)
    }

    /// Used for SEEK_END.
    fn size(&self) -> u64 {
        0
    }

    /// `None` means the command is not recognized; the caller applies the
    /// device kind's policy.
    fn ioctl(&mut self, _ctx: &mut Context, _args: &IoctlArgs) -> Option<Result<usize, Errno>> {
        None
    }
}

/// An open file description on a device node.
pub struct File {
    kind: DeviceKind,
    name: String,
    flags: FileFlags,
    offset: u64,
    ops: Box<dyn FileOperations>,
}

impl File {
    pub fn new(
        kind: DeviceKind,
        name: &str,
        flags: FileFlags,
        ops: Box<dyn FileOperations>,
    ) -> File {
        File {
            kind,
            name: name.to_owned(),
            flags,
            offset: 0,
            ops,
        }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> FileFlags {
        self.flags
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn has(&self, cap: FileCaps) -> bool {
        self.kind.caps().contains(cap)
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Errno> {
        let nread = self.do_read(buf, self.offset)?;
        self.offset += nread as u64;
        Ok(nread)
    }

    pub fn pread(&mut self, buf: &mut [u8], offset: u64) -> Result<usize, Errno> {
        if !self.flags.contains(FileFlags::PREAD) {
            return Err(Errno::ESPIPE);
        }
        self.do_read(buf, offset)
    }

    fn do_read(&mut self, buf: &mut [u8], offset: u64) -> Result<usize, Errno> {
        if !self.flags.contains(FileFlags::READ) {
            return Err(Errno::EBADF);
        }
        if !self.has(FileCaps::READ) {
            return Ok(0);
        }
        self.ops.read(buf, offset)
    }

    pub fn write(&mut self, buf: &[u8]) -> Result<usize, Errno> {
        let nwritten = self.do_write(buf, self.offset)?;
        if self.has(FileCaps::WRITE) {
            self.offset += nwritten as u64;
        }
        Ok(nwritten)
    }

    pub fn pwrite(&mut self, buf: &[u8], offset: u64) -> Result<usize, Errno> {
        if !self.flags.contains(FileFlags::PWRITE) {
            return Err(Errno::ESPIPE);
        }
        self.do_write(buf, offset)
    }

    fn do_write(&mut self, buf: &[u8], offset: u64) -> Result<usize, Errno> {
        if !self.flags.contains(FileFlags::WRITE) {
            return Err(Errno::EBADF);
        }
        if !self.has(FileCaps::WRITE) {
            return Ok(buf.len());
        }
        self.ops.write(buf, offset)
    }

    pub fn seek(&mut self, offset: i64, whence: SeekWhence) -> Result<u64, Errno> {
        if !self.has(FileCaps::SEEK) {
            return Err(Errno::ESPIPE);
        }
        let base = match whence {
            SeekWhence::Set => 0,
            SeekWhence::Cur => self.offset as i64,
            SeekWhence::End => self.ops.size() as i64,
        };
        let new_offset = base.checked_add(offset).ok_or(Errno::EOVERFLOW)?;
        if new_offset < 0 {
            return Err(Errno::EINVAL);
        }
        self.offset = new_offset as u64;
        Ok(self.offset)
    }

    pub fn configure_mmap(&mut self, opts: &mut MMapOpts) -> Result<(), Errno> {
        if !self.has(FileCaps::MMAP) {
            return Err(Errno::ENODEV);
        }
        self.ops.configure_mmap(opts)
    }

    pub fn ioctl(&mut self, ctx: &mut Context, args: &IoctlArgs) -> Result<usize, Errno> {
        if !self.has(FileCaps::IOCTL) {
            return Err(Errno::ENOTTY);
        }
        ioctl::dispatch(self.kind, &self.name, self.ops.as_mut(), ctx, args)
    }

    pub fn flush(&mut self) -> Result<(), Errno> {
        Ok(())
    }

    pub fn fsync(&mut self) -> Result<(), Errno> {
        Ok(())
    }
}

impl Drop for File {
    fn drop(&mut self) {
        log!(LogDebug, "Releasing {} file on {}", self.kind, self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting {
        reads: usize,
    }

    impl FileOperations for Counting {
        fn read(&mut self, buf: &mut [u8], offset: u64) -> Result<usize, Errno> {
            self.reads += 1;
            for (i, b) in buf.iter_mut().enumerate() {
                *b = (offset as usize + i) as u8;
            }
            Ok(buf.len())
        }

        fn size(&self) -> u64 {
            100
        }
    }

    fn file(kind: DeviceKind, flags: FileFlags) -> File {
        File::new(kind, "test", flags, Box::new(Counting { reads: 0 }))
    }

    #[test]
    fn caps_tables() {
        assert!(DeviceKind::Framebuffer.caps().contains(FileCaps::MMAP));
        assert!(!DeviceKind::Framebuffer.caps().contains(FileCaps::WRITE));
        assert_eq!(FileCaps::SEEK | FileCaps::IOCTL, DeviceKind::Pty.caps());
        assert_eq!(
            UnknownIoctlPolicy::Reject,
            DeviceKind::Framebuffer.unknown_ioctl_policy()
        );
        assert_eq!(UnknownIoctlPolicy::Ignore, DeviceKind::Pty.unknown_ioctl_policy());
    }

    #[test]
    fn read_advances_offset() {
        let mut f = file(DeviceKind::Framebuffer, FileFlags::READ | FileFlags::PREAD);
        let mut buf = [0u8; 4];
        assert_eq!(Ok(4), f.read(&mut buf));
        assert_eq!(Ok(4), f.read(&mut buf));
        assert_eq!([4, 5, 6, 7], buf);
        assert_eq!(8, f.offset());
        assert_eq!(Ok(4), f.pread(&mut buf, 50));
        assert_eq!([50, 51, 52, 53], buf);
        assert_eq!(8, f.offset());
    }

    #[test]
    fn missing_read_cap_reads_nothing() {
        let mut f = file(DeviceKind::Pty, FileFlags::READ);
        let mut buf = [0xaau8; 4];
        assert_eq!(Ok(0), f.read(&mut buf));
        assert_eq!(Ok(0), f.read(&mut []));
        assert_eq!([0xaa; 4], buf);
    }

    #[test]
    fn access_mode_checks() {
        let mut f = file(DeviceKind::Framebuffer, FileFlags::WRITE);
        assert_eq!(Err(Errno::EBADF), f.read(&mut [0u8; 1]));
        assert_eq!(Err(Errno::ESPIPE), f.pread(&mut [0u8; 1], 0));
        let mut f = file(DeviceKind::Framebuffer, FileFlags::READ);
        assert_eq!(Err(Errno::EBADF), f.write(b"x"));
    }

    #[test]
    fn noop_write_consumes_everything() {
        let mut f = file(DeviceKind::Pty, FileFlags::WRITE | FileFlags::PWRITE);
        assert_eq!(Ok(5), f.write(b"hello"));
        assert_eq!(Ok(3), f.pwrite(b"abc", 1000));
        assert_eq!(0, f.offset());
    }

    #[test]
    fn seek() {
        let mut f = file(DeviceKind::Framebuffer, FileFlags::READ);
        assert_eq!(Ok(10), f.seek(10, SeekWhence::Set));
        assert_eq!(Ok(15), f.seek(5, SeekWhence::Cur));
        assert_eq!(Ok(90), f.seek(-10, SeekWhence::End));
        assert_eq!(Err(Errno::EINVAL), f.seek(-1, SeekWhence::Set));
        assert_eq!(90, f.offset());
    }

    #[test]
    fn mmap_needs_capability() {
        let mut f = file(DeviceKind::Pty, FileFlags::READ);
        let mut opts = MMapOpts::default();
        assert_eq!(Err(Errno::ENODEV), f.configure_mmap(&mut opts));
        assert!(opts.mappable.is_none());
        assert_eq!(Ok(()), f.flush());
        assert_eq!(Ok(()), f.fsync());
    }
}
