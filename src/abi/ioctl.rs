//! The kernel's `_IOC` command number encoding (asm-generic/ioctl.h).
//!
//! The legacy fbdev and tty commands predate this scheme and are plain
//! numbers; the helpers are used to build and pull apart the newer style.

pub const IOC_NRBITS: u32 = 8;
pub const IOC_TYPEBITS: u32 = 8;
pub const IOC_SIZEBITS: u32 = 14;
pub const IOC_DIRBITS: u32 = 2;

pub const IOC_NRSHIFT: u32 = 0;
pub const IOC_TYPESHIFT: u32 = IOC_NRSHIFT + IOC_NRBITS;
pub const IOC_SIZESHIFT: u32 = IOC_TYPESHIFT + IOC_TYPEBITS;
pub const IOC_DIRSHIFT: u32 = IOC_SIZESHIFT + IOC_SIZEBITS;

pub const IOC_NONE: u32 = 0;
pub const IOC_WRITE: u32 = 1;
pub const IOC_READ: u32 = 2;

pub const fn ioc(dir: u32, type_: u32, nr: u32, size: u32) -> u32 {
    (dir << IOC_DIRSHIFT) | (type_ << IOC_TYPESHIFT) | (nr << IOC_NRSHIFT) | (size << IOC_SIZESHIFT)
}

pub const fn io(type_: u32, nr: u32) -> u32 {
    ioc(IOC_NONE, type_, nr, 0)
}

pub const fn ior(type_: u32, nr: u32, size: u32) -> u32 {
    ioc(IOC_READ, type_, nr, size)
}

pub const fn iow(type_: u32, nr: u32, size: u32) -> u32 {
    ioc(IOC_WRITE, type_, nr, size)
}

pub const fn iowr(type_: u32, nr: u32, size: u32) -> u32 {
    ioc(IOC_READ | IOC_WRITE, type_, nr, size)
}

pub const fn ioc_dir(cmd: u32) -> u32 {
    (cmd >> IOC_DIRSHIFT) & ((1 << IOC_DIRBITS) - 1)
}

pub const fn ioc_type(cmd: u32) -> u32 {
    (cmd >> IOC_TYPESHIFT) & ((1 << IOC_TYPEBITS) - 1)
}

pub const fn ioc_nr(cmd: u32) -> u32 {
    (cmd >> IOC_NRSHIFT) & ((1 << IOC_NRBITS) - 1)
}

pub const fn ioc_size(cmd: u32) -> u32 {
    (cmd >> IOC_SIZESHIFT) & ((1 << IOC_SIZEBITS) - 1)
}
