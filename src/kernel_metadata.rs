//! Human readable names for the numbers that show up in log lines.

use crate::abi::{audit, fb, ioctl, netlink, termios};

pub fn errno_name(err: i32) -> String {
    match err {
        0 => "SUCCESS".into(),
        libc::EPERM => "EPERM".into(),
        libc::ENOENT => "ENOENT".into(),
        libc::ESRCH => "ESRCH".into(),
        libc::EINTR => "EINTR".into(),
        libc::EIO => "EIO".into(),
        libc::ENXIO => "ENXIO".into(),
        libc::E2BIG => "E2BIG".into(),
        libc::EBADF => "EBADF".into(),
        libc::EAGAIN => "EAGAIN".into(),
        libc::ENOMEM => "ENOMEM".into(),
        libc::EACCES => "EACCES".into(),
        libc::EFAULT => "EFAULT".into(),
        libc::EBUSY => "EBUSY".into(),
        libc::EEXIST => "EEXIST".into(),
        libc::ENODEV => "ENODEV".into(),
        libc::ENOTDIR => "ENOTDIR".into(),
        libc::EISDIR => "EISDIR".into(),
        libc::EINVAL => "EINVAL".into(),
        libc::ENFILE => "ENFILE".into(),
        libc::EMFILE => "EMFILE".into(),
        libc::ENOTTY => "ENOTTY".into(),
        libc::EFBIG => "EFBIG".into(),
        libc::ENOSPC => "ENOSPC".into(),
        libc::ESPIPE => "ESPIPE".into(),
        libc::EROFS => "EROFS".into(),
        libc::EPIPE => "EPIPE".into(),
        libc::ERANGE => "ERANGE".into(),
        libc::ENOSYS => "ENOSYS".into(),
        libc::ENOTSUP => "EOPNOTSUPP".into(),
        libc::ECONNREFUSED => "ECONNREFUSED".into(),
        libc::EPROTONOSUPPORT => "EPROTONOSUPPORT".into(),
        _ => format!("errno({})", err),
    }
}

pub fn ioctl_name(cmd: u32) -> String {
    match cmd {
        fb::FBIOGET_VSCREENINFO => "FBIOGET_VSCREENINFO".into(),
        fb::FBIOPUT_VSCREENINFO => "FBIOPUT_VSCREENINFO".into(),
        fb::FBIOGET_FSCREENINFO => "FBIOGET_FSCREENINFO".into(),
        fb::FBIOGETCMAP => "FBIOGETCMAP".into(),
        fb::FBIOPUTCMAP => "FBIOPUTCMAP".into(),
        fb::FBIOPAN_DISPLAY => "FBIOPAN_DISPLAY".into(),
        fb::FBIOBLANK => "FBIOBLANK".into(),
        termios::TCGETS => "TCGETS".into(),
        termios::TCSETS => "TCSETS".into(),
        termios::TCSETSW => "TCSETSW".into(),
        termios::TCSETSF => "TCSETSF".into(),
        termios::TIOCGWINSZ => "TIOCGWINSZ".into(),
        termios::TIOCSWINSZ => "TIOCSWINSZ".into(),
        termios::KDGKBTYPE => "KDGKBTYPE".into(),
        termios::VT_OPENQRY => "VT_OPENQRY".into(),
        _ if ioctl::ioc_size(cmd) != 0 => format!(
            "ioctl(dir={}, type={:#x}, nr={:#x}, size={})",
            ioctl::ioc_dir(cmd),
            ioctl::ioc_type(cmd),
            ioctl::ioc_nr(cmd),
            ioctl::ioc_size(cmd)
        ),
        _ => format!("ioctl({:#x})", cmd),
    }
}

pub fn audit_message_type_name(type_: u16) -> String {
    match type_ {
        audit::AUDIT_GET => "AUDIT_GET".into(),
        audit::AUDIT_SET => "AUDIT_SET".into(),
        audit::AUDIT_LIST => "AUDIT_LIST".into(),
        audit::AUDIT_ADD => "AUDIT_ADD".into(),
        audit::AUDIT_DEL => "AUDIT_DEL".into(),
        audit::AUDIT_USER => "AUDIT_USER".into(),
        audit::AUDIT_LOGIN => "AUDIT_LOGIN".into(),
        audit::AUDIT_WATCH_INS => "AUDIT_WATCH_INS".into(),
        audit::AUDIT_WATCH_REM => "AUDIT_WATCH_REM".into(),
        audit::AUDIT_WATCH_LIST => "AUDIT_WATCH_LIST".into(),
        audit::AUDIT_SIGNAL_INFO => "AUDIT_SIGNAL_INFO".into(),
        audit::AUDIT_ADD_RULE => "AUDIT_ADD_RULE".into(),
        audit::AUDIT_DEL_RULE => "AUDIT_DEL_RULE".into(),
        audit::AUDIT_LIST_RULES => "AUDIT_LIST_RULES".into(),
        audit::AUDIT_TRIM => "AUDIT_TRIM".into(),
        audit::AUDIT_MAKE_EQUIV => "AUDIT_MAKE_EQUIV".into(),
        audit::AUDIT_TTY_GET => "AUDIT_TTY_GET".into(),
        audit::AUDIT_TTY_SET => "AUDIT_TTY_SET".into(),
        audit::AUDIT_SET_FEATURE => "AUDIT_SET_FEATURE".into(),
        audit::AUDIT_GET_FEATURE => "AUDIT_GET_FEATURE".into(),
        netlink::NLMSG_NOOP => "NLMSG_NOOP".into(),
        netlink::NLMSG_ERROR => "NLMSG_ERROR".into(),
        netlink::NLMSG_DONE => "NLMSG_DONE".into(),
        netlink::NLMSG_OVERRUN => "NLMSG_OVERRUN".into(),
        _ => format!("audit_msg({})", type_),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names() {
        assert_eq!("EINVAL", errno_name(libc::EINVAL));
        assert_eq!("EOPNOTSUPP", errno_name(libc::EOPNOTSUPP));
        assert_eq!("FBIOGET_FSCREENINFO", ioctl_name(0x4602));
        assert_eq!("TCGETS", ioctl_name(0x5401));
        assert_eq!("AUDIT_GET_FEATURE", audit_message_type_name(1019));
    }

    #[test]
    fn unknown_names() {
        assert_eq!("errno(9999)", errno_name(9999));
        assert_eq!("ioctl(0x1234)", ioctl_name(0x1234));
        assert_eq!("audit_msg(1337)", audit_message_type_name(1337));
        let encoded = ioctl::ior(b'F' as u32, 0x30, 8);
        assert_eq!("ioctl(dir=2, type=0x46, nr=0x30, size=8)", ioctl_name(encoded));
    }
}
