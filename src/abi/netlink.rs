#![allow(non_camel_case_types)]

//! Netlink framing ABI from include/uapi/linux/netlink.h.

pub const NETLINK_ROUTE: i32 = 0;
pub const NETLINK_AUDIT: i32 = 9;
pub const NETLINK_KOBJECT_UEVENT: i32 = 15;

/// Nothing.
pub const NLMSG_NOOP: u16 = 0x1;
/// Error
pub const NLMSG_ERROR: u16 = 0x2;
/// End of a dump
pub const NLMSG_DONE: u16 = 0x3;
/// Data lost
pub const NLMSG_OVERRUN: u16 = 0x4;
/// Types below this are reserved for control messages.
pub const NLMSG_MIN_TYPE: u16 = 0x10;

pub const NLM_F_REQUEST: u16 = 0x1;
pub const NLM_F_MULTI: u16 = 0x2;
pub const NLM_F_ACK: u16 = 0x4;
pub const NLM_F_ECHO: u16 = 0x8;
pub const NLM_F_DUMP_INTR: u16 = 0x10;
pub const NLM_F_DUMP_FILTERED: u16 = 0x20;

pub const NLM_F_ROOT: u16 = 0x100;
pub const NLM_F_MATCH: u16 = 0x200;
pub const NLM_F_ATOMIC: u16 = 0x400;
pub const NLM_F_DUMP: u16 = NLM_F_ROOT | NLM_F_MATCH;

pub const NLMSG_ALIGNTO: usize = 4;

pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

pub const NLMSG_HDRLEN: usize = nlmsg_align(std::mem::size_of::<nlmsghdr>());

#[repr(C)]
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct nlmsghdr {
    /// Length of message including header
    pub nlmsg_len: u32,
    /// Message content
    pub nlmsg_type: u16,
    /// Additional flags
    pub nlmsg_flags: u16,
    /// Sequence number
    pub nlmsg_seq: u32,
    /// Sending process port ID
    pub nlmsg_pid: u32,
}

assert_eq_size!(nlmsghdr, [u8; 16]);

#[repr(C)]
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct nlmsgerr {
    /// Negative errno or 0 for acknowledgements
    pub error: i32,
    /// Message header that caused the error
    pub msg: nlmsghdr,
}

assert_eq_size!(nlmsgerr, [u8; 20]);
