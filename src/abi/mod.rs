//! Numeric codes and fixed binary layouts shared with the guest.
//!
//! Everything in here has to match the Linux headers bit for bit.

pub mod audit;
pub mod fb;
pub mod ioctl;
pub mod netlink;
pub mod termios;

/// `f_type` reported for the device inodes.
pub const TMPFS_MAGIC: u64 = 0x0102_1994;

/// Character device major numbers.
pub const TTY_MAJOR: u32 = 4;
pub const FB_MAJOR: u32 = 29;

pub const fn makedev(major: u32, minor: u32) -> u64 {
    ((major as u64 & 0xffff_f000) << 32)
        | ((major as u64 & 0x0000_0fff) << 8)
        | ((minor as u64 & 0xffff_ff00) << 12)
        | (minor as u64 & 0x0000_00ff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn makedev_matches_glibc() {
        assert_eq!(0x1d00, makedev(FB_MAJOR, 0));
        assert_eq!(0x0401, makedev(TTY_MAJOR, 1));
        assert_eq!(0x1000_0010_0001, makedev(0x1000, 0x101));
    }
}
