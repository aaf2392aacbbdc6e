//! Shared ioctl plumbing for the virtual devices.
//!
//! A device's `FileOperations::ioctl` only has to say what it does with the
//! commands it knows about. Everything else is decided here, per device kind.

use crate::{
    context::Context,
    device::{DeviceKind, FileOperations},
    guest_memory::{copy_object_in, copy_object_out, IoOpts},
    kernel_metadata::{errno_name, ioctl_name},
    log::LogLevel::{LogDebug, LogWarn},
    remote_ptr::{RemotePtr, Void},
    unimpl::UnimplementedEvent,
};
use nix::errno::Errno;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IoctlArgs {
    pub fd: i32,
    pub cmd: u32,
    /// Usually a pointer into the guest, but some commands pass a plain
    /// integer here.
    pub arg: RemotePtr<Void>,
}

impl IoctlArgs {
    pub fn new(fd: i32, cmd: u32, arg: RemotePtr<Void>) -> IoctlArgs {
        IoctlArgs { fd, cmd, arg }
    }

    pub fn arg_as_int(&self) -> u64 {
        self.arg.as_usize() as u64
    }
}

/// What happens to commands a device does not recognize.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum UnknownIoctlPolicy {
    /// Report an unimplemented feature and fail with EINVAL.
    Reject,
    /// Pretend it worked.
    Ignore,
}

pub fn dispatch(
    kind: DeviceKind,
    device: &str,
    ops: &mut dyn FileOperations,
    ctx: &mut Context,
    args: &IoctlArgs,
) -> Result<usize, Errno> {
    log!(
        LogDebug,
        "{}: {} from task {} (fd {}, arg {})",
        device,
        ioctl_name(args.cmd),
        ctx.task(),
        args.fd,
        args.arg
    );

    match ops.ioctl(ctx, args) {
        Some(Ok(ret)) => Ok(ret),
        Some(Err(e)) => {
            log!(
                LogDebug,
                "{}: {} failed with {}",
                device,
                ioctl_name(args.cmd),
                errno_name(e as i32)
            );
            Err(e)
        }
        None => match kind.unknown_ioctl_policy() {
            UnknownIoctlPolicy::Reject => {
                ctx.emit_unimplemented_event(UnimplementedEvent::ioctl(
                    ctx.task(),
                    args.fd,
                    args.cmd,
                    args.arg,
                    device,
                ));
                Err(Errno::EINVAL)
            }
            UnknownIoctlPolicy::Ignore => {
                log!(
                    LogWarn,
                    "{}: ignoring unknown {}",
                    device,
                    ioctl_name(args.cmd)
                );
                Ok(0)
            }
        },
    }
}

/// Encode `val` into the guest at `addr`. Returns the ioctl result.
pub fn copy_out<T: Copy + 'static>(
    ctx: &mut Context,
    addr: RemotePtr<Void>,
    val: &T,
) -> Result<usize, Errno> {
    copy_object_out(ctx.mem(), RemotePtr::<T>::cast(addr), val, IoOpts::active())?;
    Ok(0)
}

pub fn copy_in<T: Copy + 'static>(ctx: &mut Context, addr: RemotePtr<Void>) -> Result<T, Errno> {
    copy_object_in(ctx.mem(), RemotePtr::<T>::cast(addr), IoOpts::active())
}
