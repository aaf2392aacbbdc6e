//! Kernel ABI surfaces for programs running in a user-space sandbox: the
//! NETLINK_AUDIT control protocol and the `/dev/fb0` and `/dev/tty0`
//! character devices.

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate static_assertions;
#[macro_use]
extern crate memoffset;

#[macro_use]
pub mod log;

pub mod abi;
pub mod commands;
pub mod context;
pub mod core;
pub mod device;
pub mod flags;
pub mod guest_memory;
pub mod ioctl;
pub mod kernel_metadata;
pub mod memory_file;
pub mod netlink;
pub mod remote_ptr;
pub mod scoped_fd;
pub mod task;
pub mod unimpl;
pub mod vfs;
