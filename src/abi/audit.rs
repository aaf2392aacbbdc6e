#![allow(non_camel_case_types)]

//! Audit netlink ABI from include/uapi/linux/audit.h.
//!
//! Message types are grouped in blocks of 100:
//!   1000 - 1099 commanding the audit system
//!   1100 - 1199 user space trusted application messages
//!   1300 - 1399 audit event messages
//!   2100 - 2999 user space generated events
//! 1000-1199 travel in both directions.

pub const AUDIT_ARCH_X86_64: u32 = 0xc000_003e;
pub const AUDIT_ARCH_AARCH64: u32 = 0xc000_00b7;

/// Get status
pub const AUDIT_GET: u16 = 1000;
/// Set status (enable/disable/auditd)
pub const AUDIT_SET: u16 = 1001;
/// List syscall rules -- deprecated
pub const AUDIT_LIST: u16 = 1002;
/// Add syscall rule -- deprecated
pub const AUDIT_ADD: u16 = 1003;
/// Delete syscall rule -- deprecated
pub const AUDIT_DEL: u16 = 1004;
/// Message from userspace -- deprecated
pub const AUDIT_USER: u16 = 1005;
/// Define the login id and information
pub const AUDIT_LOGIN: u16 = 1006;
pub const AUDIT_WATCH_INS: u16 = 1007;
pub const AUDIT_WATCH_REM: u16 = 1008;
pub const AUDIT_WATCH_LIST: u16 = 1009;
/// Get info about sender of signal to auditd
pub const AUDIT_SIGNAL_INFO: u16 = 1010;
pub const AUDIT_ADD_RULE: u16 = 1011;
pub const AUDIT_DEL_RULE: u16 = 1012;
pub const AUDIT_LIST_RULES: u16 = 1013;
pub const AUDIT_TRIM: u16 = 1014;
pub const AUDIT_MAKE_EQUIV: u16 = 1015;
pub const AUDIT_TTY_GET: u16 = 1016;
pub const AUDIT_TTY_SET: u16 = 1017;
/// Turn an audit feature on or off
pub const AUDIT_SET_FEATURE: u16 = 1018;
/// Get which features are enabled
pub const AUDIT_GET_FEATURE: u16 = 1019;

pub const AUDIT_FIRST_USER_MSG: u16 = 1100;
pub const AUDIT_LAST_USER_MSG: u16 = 1199;

pub const AUDIT_STATUS_ENABLED: u32 = 0x0001;
pub const AUDIT_STATUS_FAILURE: u32 = 0x0002;
pub const AUDIT_STATUS_PID: u32 = 0x0004;
pub const AUDIT_STATUS_RATE_LIMIT: u32 = 0x0008;
pub const AUDIT_STATUS_BACKLOG_LIMIT: u32 = 0x0010;
pub const AUDIT_STATUS_BACKLOG_WAIT_TIME: u32 = 0x0020;
pub const AUDIT_STATUS_LOST: u32 = 0x0040;

pub const AUDIT_FEATURE_BITMAP_BACKLOG_LIMIT: u32 = 0x0000_0001;
pub const AUDIT_FEATURE_BITMAP_BACKLOG_WAIT_TIME: u32 = 0x0000_0002;
pub const AUDIT_FEATURE_BITMAP_EXECUTABLE_PATH: u32 = 0x0000_0004;
pub const AUDIT_FEATURE_BITMAP_EXCLUDE_EXTEND: u32 = 0x0000_0008;
pub const AUDIT_FEATURE_BITMAP_SESSIONID_FILTER: u32 = 0x0000_0010;
pub const AUDIT_FEATURE_BITMAP_LOST_RESET: u32 = 0x0000_0020;
pub const AUDIT_FEATURE_BITMAP_FILTER_FS: u32 = 0x0000_0040;

/// Failure-to-log actions
pub const AUDIT_FAIL_SILENT: u32 = 0;
pub const AUDIT_FAIL_PRINTK: u32 = 1;
pub const AUDIT_FAIL_PANIC: u32 = 2;

pub const AUDIT_FEATURE_VERSION: u32 = 1;
/// `audit_features::mask` as reported by AUDIT_GET_FEATURE.
pub const AUDIT_FEATURE_MASK_ALL: u32 = 0xffff;

#[repr(C)]
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct audit_status {
    /// Bit mask for valid entries
    pub mask: u32,
    /// 1 = enabled, 0 = disabled
    pub enabled: u32,
    /// Failure-to-log action
    pub failure: u32,
    /// pid of auditd process
    pub pid: u32,
    /// messages rate limit (per second)
    pub rate_limit: u32,
    /// waiting messages limit
    pub backlog_limit: u32,
    /// messages lost
    pub lost: u32,
    /// messages waiting in queue
    pub backlog: u32,
    /// bitmap of kernel audit features
    pub feature_bitmap: u32,
    /// message queue wait timeout
    pub backlog_wait_time: u32,
}

assert_eq_size!(audit_status, [u8; 40]);

#[repr(C)]
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct audit_features {
    pub vers: u32,
    /// which bits we are dealing with
    pub mask: u32,
    /// which feature to enable/disable
    pub features: u32,
    /// which features to lock
    pub lock: u32,
}

assert_eq_size!(audit_features, [u8; 16]);
