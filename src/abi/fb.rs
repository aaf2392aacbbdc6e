#![allow(non_camel_case_types)]

//! Linux fbdev ABI (include/uapi/linux/fb.h), 64 bit layout.
//!
//! Every hole the C compiler would insert is spelled out as a `_padN`
//! field so an encoded structure never carries uninitialized bytes.

pub const FBIOGET_VSCREENINFO: u32 = 0x4600;
pub const FBIOPUT_VSCREENINFO: u32 = 0x4601;
pub const FBIOGET_FSCREENINFO: u32 = 0x4602;
pub const FBIOGETCMAP: u32 = 0x4604;
pub const FBIOPUTCMAP: u32 = 0x4605;
pub const FBIOPAN_DISPLAY: u32 = 0x4606;
pub const FBIOBLANK: u32 = 0x4611;

pub const FB_TYPE_PACKED_PIXELS: u32 = 0;
pub const FB_TYPE_PLANES: u32 = 1;

pub const FB_VISUAL_MONO01: u32 = 0;
pub const FB_VISUAL_MONO10: u32 = 1;
pub const FB_VISUAL_TRUECOLOR: u32 = 2;
pub const FB_VISUAL_PSEUDOCOLOR: u32 = 3;
pub const FB_VISUAL_DIRECTCOLOR: u32 = 4;

pub const FB_ACTIVATE_NOW: u32 = 0;
pub const FB_ACTIVATE_TEST: u32 = 2;

pub const FB_BLANK_UNBLANK: u32 = 0;
pub const FB_BLANK_POWERDOWN: u32 = 4;

/// Size of `fb_fix_screeninfo::id`.
pub const FB_ID_LEN: usize = 16;

#[repr(C)]
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct fb_bitfield {
    /// beginning of bitfield
    pub offset: u32,
    /// length of bitfield
    pub length: u32,
    /// != 0 : Most significant bit is right
    pub msb_right: u32,
}

assert_eq_size!(fb_bitfield, [u8; 12]);

#[repr(C)]
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct fb_fix_screeninfo {
    /// identification string eg "TT Builtin"
    pub id: [u8; FB_ID_LEN],
    /// Start of frame buffer mem (physical address)
    pub smem_start: u64,
    /// Length of frame buffer mem
    pub smem_len: u32,
    /// see FB_TYPE_*
    pub type_: u32,
    /// Interleave for interleaved Planes
    pub type_aux: u32,
    /// see FB_VISUAL_*
    pub visual: u32,
    pub xpanstep: u16,
    pub ypanstep: u16,
    pub ywrapstep: u16,
    pub _pad0: u16,
    /// length of a line in bytes
    pub line_length: u32,
    pub _pad1: u32,
    /// Start of Memory Mapped I/O (physical address)
    pub mmio_start: u64,
    pub mmio_len: u32,
    /// Indicate to driver which specific chip/card we have
    pub accel: u32,
    /// see FB_CAP_*
    pub capabilities: u16,
    pub reserved: [u16; 2],
    pub _pad2: u16,
}

assert_eq_size!(fb_fix_screeninfo, [u8; 80]);

#[repr(C)]
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct fb_var_screeninfo {
    /// visible resolution
    pub xres: u32,
    pub yres: u32,
    /// virtual resolution
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    /// offset from virtual to visible
    pub xoffset: u32,
    pub yoffset: u32,
    pub bits_per_pixel: u32,
    /// 0 = color, 1 = grayscale, >1 = FOURCC
    pub grayscale: u32,
    pub red: fb_bitfield,
    pub green: fb_bitfield,
    pub blue: fb_bitfield,
    pub transp: fb_bitfield,
    /// != 0 Non standard pixel format
    pub nonstd: u32,
    /// see FB_ACTIVATE_*
    pub activate: u32,
    /// height of picture in mm
    pub height: u32,
    /// width of picture in mm
    pub width: u32,
    /// (OBSOLETE) see fb_info.flags
    pub accel_flags: u32,
    /// pixel clock in ps (pico seconds)
    pub pixclock: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    pub upper_margin: u32,
    pub lower_margin: u32,
    pub hsync_len: u32,
    pub vsync_len: u32,
    pub sync: u32,
    pub vmode: u32,
    /// angle we rotate counter clockwise
    pub rotate: u32,
    /// colorspace for FOURCC-based modes
    pub colorspace: u32,
    pub reserved: [u32; 4],
}

assert_eq_size!(fb_var_screeninfo, [u8; 160]);

/// Argument of FBIOGETCMAP/FBIOPUTCMAP. Pointers are guest addresses.
#[repr(C)]
#[derive(Copy, Clone, Default, Debug)]
pub struct fb_cmap {
    pub start: u32,
    pub len: u32,
    pub red: u64,
    pub green: u64,
    pub blue: u64,
    pub transp: u64,
}

assert_eq_size!(fb_cmap, [u8; 40]);

/// Copy `name` into a fixed-size, NUL terminated id field. Longer names are
/// truncated so the terminator always fits.
pub fn fb_id(name: &str) -> [u8; FB_ID_LEN] {
    let mut id = [0u8; FB_ID_LEN];
    let bytes = name.as_bytes();
    let len = bytes.len().min(FB_ID_LEN - 1);
    id[..len].copy_from_slice(&bytes[..len]);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::type_has_no_holes;

    #[test]
    fn fix_screeninfo_offsets() {
        assert_eq!(16, offset_of!(fb_fix_screeninfo, smem_start));
        assert_eq!(24, offset_of!(fb_fix_screeninfo, smem_len));
        assert_eq!(28, offset_of!(fb_fix_screeninfo, type_));
        assert_eq!(36, offset_of!(fb_fix_screeninfo, visual));
        assert_eq!(40, offset_of!(fb_fix_screeninfo, xpanstep));
        assert_eq!(44, offset_of!(fb_fix_screeninfo, ywrapstep));
        assert_eq!(48, offset_of!(fb_fix_screeninfo, line_length));
        assert_eq!(56, offset_of!(fb_fix_screeninfo, mmio_start));
        assert_eq!(64, offset_of!(fb_fix_screeninfo, mmio_len));
        assert_eq!(68, offset_of!(fb_fix_screeninfo, accel));
        assert_eq!(72, offset_of!(fb_fix_screeninfo, capabilities));
        assert_eq!(74, offset_of!(fb_fix_screeninfo, reserved));
    }

    #[test]
    fn var_screeninfo_offsets() {
        assert_eq!(24, offset_of!(fb_var_screeninfo, bits_per_pixel));
        assert_eq!(32, offset_of!(fb_var_screeninfo, red));
        assert_eq!(44, offset_of!(fb_var_screeninfo, green));
        assert_eq!(56, offset_of!(fb_var_screeninfo, blue));
        assert_eq!(68, offset_of!(fb_var_screeninfo, transp));
        assert_eq!(80, offset_of!(fb_var_screeninfo, nonstd));
        assert_eq!(84, offset_of!(fb_var_screeninfo, activate));
        assert_eq!(96, offset_of!(fb_var_screeninfo, accel_flags));
        assert_eq!(100, offset_of!(fb_var_screeninfo, pixclock));
        assert_eq!(136, offset_of!(fb_var_screeninfo, rotate));
        assert_eq!(144, offset_of!(fb_var_screeninfo, reserved));
    }

    #[test]
    fn no_holes() {
        assert!(type_has_no_holes::<fb_bitfield>());
        assert!(type_has_no_holes::<fb_fix_screeninfo>());
        assert!(type_has_no_holes::<fb_var_screeninfo>());
    }

    #[test]
    fn id_is_nul_terminated() {
        let id = fb_id("a very long framebuffer name");
        assert_eq!(0, id[FB_ID_LEN - 1]);
        assert_eq!(b"a very long fra", &id[..FB_ID_LEN - 1]);

        let short = fb_id("fb");
        assert_eq!(b"fb\0", &short[..3]);
        assert!(short[2..].iter().all(|b| *b == 0));
    }
}
