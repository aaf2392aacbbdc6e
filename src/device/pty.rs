//! `/dev/tty0`: a console that is never attached to anything.
//!
//! Programs probe the console with a handful of ioctls before they give up on
//! it. We answer those, keep whatever terminal settings they push, and
//! otherwise stay silent: reads see no input and output goes nowhere.

use crate::{
    abi::{
        makedev,
        termios::{
            termios,
            winsize,
            KernelTermios,
            KB_101,
            KDGKBTYPE,
            TCGETS,
            TCSETS,
            TCSETSF,
            TCSETSW,
            TIOCGWINSZ,
            TIOCSWINSZ,
            VT_OPENQRY,
        },
        TMPFS_MAGIC,
        TTY_MAJOR,
    },
    context::Context,
    device::{DeviceKind, File, FileOperations},
    ioctl::{copy_in, copy_out, IoctlArgs},
    log::LogLevel::LogDebug,
    remote_ptr::{RemotePtr, Void},
    vfs::{DeviceNode, Dirent, FileFlags, FileOwner, FilePermissions, InodeAttributes},
};
use nix::errno::Errno;

pub struct PtyDevice {
    name: String,
    attrs: InodeAttributes,
}

impl PtyDevice {
    pub fn new(name: &str, owner: FileOwner, perms: FilePermissions) -> PtyDevice {
        PtyDevice {
            name: name.to_owned(),
            attrs: InodeAttributes {
                owner,
                perms,
                magic: TMPFS_MAGIC,
                rdev: makedev(TTY_MAJOR, 0),
            },
        }
    }
}

impl DeviceNode for PtyDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> InodeAttributes {
        self.attrs
    }

    fn get_file(&self, dirent: &Dirent, flags: FileFlags) -> Result<File, Errno> {
        log!(LogDebug, "Opening console {} with {:?}", dirent.name, flags);
        Ok(File::new(
            DeviceKind::Pty,
            &dirent.name,
            flags | FileFlags::PREAD | FileFlags::PWRITE,
            Box::new(PtyFile::new()),
        ))
    }
}

/// Settings are per open file; two opens of the console do not see each
/// other's changes.
#[derive(Default)]
pub struct PtyFile {
    termios: KernelTermios,
    winsize: winsize,
}

impl PtyFile {
    pub fn new() -> PtyFile {
        Default::default()
    }

    pub fn termios(&self) -> &KernelTermios {
        &self.termios
    }

    fn set_termios(&mut self, ctx: &mut Context, arg: RemotePtr<Void>) -> Result<usize, Errno> {
        let t: termios = copy_in(ctx, arg)?;
        self.termios.from_termios(&t);
        log!(
            LogDebug,
            "termios now iflag={:#o} oflag={:#o} cflag={:#o} lflag={:#o}",
            self.termios.input_flags,
            self.termios.output_flags,
            self.termios.control_flags,
            self.termios.local_flags
        );
        Ok(0)
    }
}

impl FileOperations for PtyFile {
    fn ioctl(&mut self, ctx: &mut Context, args: &IoctlArgs) -> Option<Result<usize, Errno>> {
        let res = match args.cmd {
            KDGKBTYPE => copy_out(ctx, args.arg, &KB_101),
            VT_OPENQRY => copy_out(ctx, args.arg, &0u32),
            TCGETS => copy_out(ctx, args.arg, &self.termios.to_termios()),
            // There is no queue to drain or flush.
            TCSETS | TCSETSW | TCSETSF => self.set_termios(ctx, args.arg),
            TIOCGWINSZ => copy_out(ctx, args.arg, &self.winsize),
            TIOCSWINSZ => copy_in(ctx, args.arg).map(|ws| {
                self.winsize = ws;
                0
            }),
            _ => return None,
        };
        Some(res)
    }
}
