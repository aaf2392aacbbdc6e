//! `/dev/fb0`: a fixed-mode truecolor framebuffer.
//!
//! Nothing is ever displayed. The pixels live in a memory file that every
//! open file on the node shares, so a guest can mmap it and draw to its
//! heart's content.

use crate::{
    abi::{
        fb::{
            fb_bitfield,
            fb_fix_screeninfo,
            fb_id,
            fb_var_screeninfo,
            FBIOBLANK,
            FBIOGET_FSCREENINFO,
            FBIOGET_VSCREENINFO,
            FBIOPAN_DISPLAY,
            FBIOPUT_VSCREENINFO,
            FB_TYPE_PACKED_PIXELS,
            FB_VISUAL_TRUECOLOR,
        },
        makedev,
        FB_MAJOR,
        TMPFS_MAGIC,
    },
    context::Context,
    device::{DeviceKind, File, FileOperations},
    ioctl::{copy_in, copy_out, IoctlArgs},
    log::LogLevel::LogDebug,
    memory_file::{MemoryFile, MemoryFileSharedPtr},
    remote_ptr::{RemotePtr, Void},
    vfs::{
        DeviceNode,
        Dirent,
        FileFlags,
        FileOwner,
        FilePermissions,
        InodeAttributes,
        MMapOpts,
    },
};
use nix::errno::Errno;
use std::sync::Arc;

pub const FB_WIDTH: u32 = 800;
pub const FB_HEIGHT: u32 = 600;
pub const FB_BITS_PER_PIXEL: u32 = 32;
pub const FB_LINE_LENGTH: u32 = FB_WIDTH * FB_BITS_PER_PIXEL / 8;
pub const FB_SIZE: u64 = FB_LINE_LENGTH as u64 * FB_HEIGHT as u64;
pub const FB_ID: &str = "kcompat fb";

pub struct FbDevice {
    name: String,
    attrs: InodeAttributes,
    store: MemoryFileSharedPtr,
}

impl FbDevice {
    pub fn new(name: &str, owner: FileOwner, perms: FilePermissions) -> Result<FbDevice, Errno> {
        let store = Arc::new(MemoryFile::create(name, FB_SIZE)?);
        Ok(FbDevice {
            name: name.to_owned(),
            attrs: InodeAttributes {
                owner,
                perms,
                magic: TMPFS_MAGIC,
                rdev: makedev(FB_MAJOR, 0),
            },
            store,
        })
    }

    pub fn store(&self) -> &MemoryFileSharedPtr {
        &self.store
    }
}

impl DeviceNode for FbDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> InodeAttributes {
        self.attrs
    }

    fn get_file(&self, dirent: &Dirent, flags: FileFlags) -> Result<File, Errno> {
        log!(LogDebug, "Opening framebuffer {} with {:?}", dirent.name, flags);
        Ok(File::new(
            DeviceKind::Framebuffer,
            &dirent.name,
            flags | FileFlags::PREAD | FileFlags::PWRITE,
            Box::new(FbFile {
                store: self.store.clone(),
            }),
        ))
    }
}

pub struct FbFile {
    store: MemoryFileSharedPtr,
}

pub fn fix_screeninfo() -> fb_fix_screeninfo {
    fb_fix_screeninfo {
        id: fb_id(FB_ID),
        smem_len: FB_SIZE as u32,
        type_: FB_TYPE_PACKED_PIXELS,
        visual: FB_VISUAL_TRUECOLOR,
        line_length: FB_LINE_LENGTH,
        ..Default::default()
    }
}

pub fn var_screeninfo() -> fb_var_screeninfo {
    let channel = |offset| fb_bitfield {
        offset,
        length: 8,
        msb_right: 1,
    };
    fb_var_screeninfo {
        xres: FB_WIDTH,
        yres: FB_HEIGHT,
        xres_virtual: FB_WIDTH,
        yres_virtual: FB_HEIGHT,
        bits_per_pixel: FB_BITS_PER_PIXEL,
        red: channel(0),
        green: channel(8),
        blue: channel(16),
        transp: channel(24),
        ..Default::default()
    }
}

impl FbFile {
    /// The mode is fixed. Asking for it again is fine, anything else is not.
    fn put_vscreeninfo(&self, ctx: &mut Context, arg: RemotePtr<Void>) -> Result<usize, Errno> {
        let req: fb_var_screeninfo = copy_in(ctx, arg)?;
        let cur = var_screeninfo();
        if req.xres != cur.xres
            || req.yres != cur.yres
            || req.xres_virtual != cur.xres_virtual
            || req.yres_virtual != cur.yres_virtual
            || req.bits_per_pixel != cur.bits_per_pixel
        {
            log!(
                LogDebug,
                "Refusing mode change to {}x{} ({}x{} virtual) at {} bpp",
                req.xres,
                req.yres,
                req.xres_virtual,
                req.yres_virtual,
                req.bits_per_pixel
            );
            return Err(Errno::EINVAL);
        }
        copy_out(ctx, arg, &cur)
    }

    fn pan_display(&self, ctx: &mut Context, arg: RemotePtr<Void>) -> Result<usize, Errno> {
        let req: fb_var_screeninfo = copy_in(ctx, arg)?;
        if req.xoffset != 0 || req.yoffset != 0 {
            return Err(Errno::EINVAL);
        }
        Ok(0)
    }
}

impl FileOperations for FbFile {
    fn read(&mut self, buf: &mut [u8], offset: u64) -> Result<usize, Errno> {
        self.store.read_at(buf, offset)
    }

    fn configure_mmap(&mut self, opts: &mut MMapOpts) -> Result<(), Errno> {
        opts.length = self.store.size();
        self.store.configure_mmap(opts)
    }

    fn size(&self) -> u64 {
        self.store.size()
    }

    fn ioctl(&mut self, ctx: &mut Context, args: &IoctlArgs) -> Option<Result<usize, Errno>> {
        let res = match args.cmd {
            FBIOGET_FSCREENINFO => copy_out(ctx, args.arg, &fix_screeninfo()),
            FBIOGET_VSCREENINFO => copy_out(ctx, args.arg, &var_screeninfo()),
            FBIOPUT_VSCREENINFO => self.put_vscreeninfo(ctx, args.arg),
            FBIOPAN_DISPLAY => self.pan_display(ctx, args.arg),
            // Nothing to blank.
            FBIOBLANK => Ok(0),
            _ => return None,
        };
        Some(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        abi::{fb::FBIOGETCMAP, ioctl::ior},
        guest_memory::{GuestMemory, IoOpts, LocalMemory},
        task::Task,
        unimpl::CollectingEventSink,
        vfs::SeekWhence,
    };
    use libc::SYS_ioctl;

    const BUF: usize = 0x10000;

    fn open() -> File {
        let dev = FbDevice::new(
            "fb0",
            FileOwner::root(),
            FilePermissions::from_mode(0o666),
        )
        .unwrap();
        dev.get_file(&Dirent::new("fb0"), FileFlags::READ | FileFlags::WRITE)
            .unwrap()
    }

    fn ioctl_in<T: Copy + 'static>(f: &mut File, cmd: u32) -> T {
        let mut mem = LocalMemory::new();
        let buf = mem.map(BUF, 0x1000);
        let events = CollectingEventSink::new();
        let mut ctx = Context::new(Task::leader(100), &mut mem, &events);
        assert_eq!(Ok(0), f.ioctl(&mut ctx, &IoctlArgs::new(3, cmd, buf)));
        assert!(events.is_empty());
        copy_in(&mut ctx, buf).unwrap()
    }

    #[test]
    fn fixed_screen_info() {
        let mut f = open();
        let fix: fb_fix_screeninfo = ioctl_in(&mut f, FBIOGET_FSCREENINFO);
        assert_eq!(3200, fix.line_length);
        assert_eq!(FB_VISUAL_TRUECOLOR, fix.visual);
        assert_eq!(FB_TYPE_PACKED_PIXELS, fix.type_);
        assert_eq!(1_920_000, fix.smem_len);
        assert_eq!(b"kcompat fb\0", &fix.id[..11]);
        assert_eq!(0, fix.smem_start);
        assert_eq!(0, fix.accel);
        assert_eq!([0, 0], fix.reserved);
    }

    #[test]
    fn variable_screen_info() {
        let mut f = open();
        let var: fb_var_screeninfo = ioctl_in(&mut f, FBIOGET_VSCREENINFO);
        assert_eq!((800, 600), (var.xres, var.yres));
        assert_eq!((800, 600), (var.xres_virtual, var.yres_virtual));
        assert_eq!(32, var.bits_per_pixel);
        for (field, offset) in [(var.red, 0), (var.green, 8), (var.blue, 16), (var.transp, 24)]
            .iter()
        {
            assert_eq!(*offset, field.offset);
            assert_eq!(8, field.length);
            assert_eq!(1, field.msb_right);
        }
        assert_eq!(0, var.pixclock);
        assert_eq!([0; 4], var.reserved);
    }

    #[test]
    fn mode_set_only_accepts_current_mode() {
        let mut f = open();
        let mut mem = LocalMemory::new();
        let buf = mem.map(BUF, 0x1000);
        let events = CollectingEventSink::new();
        let mut ctx = Context::new(Task::leader(1), &mut mem, &events);

        let mut var = var_screeninfo();
        copy_out(&mut ctx, buf, &var).unwrap();
        let args = IoctlArgs::new(3, FBIOPUT_VSCREENINFO, buf);
        assert_eq!(Ok(0), f.ioctl(&mut ctx, &args));

        var.xres = 1024;
        copy_out(&mut ctx, buf, &var).unwrap();
        assert_eq!(Err(Errno::EINVAL), f.ioctl(&mut ctx, &args));
        assert!(events.is_empty());
    }

    #[test]
    fn pan_and_blank() {
        let mut f = open();
        let mut mem = LocalMemory::new();
        let buf = mem.map(BUF, 0x1000);
        let events = CollectingEventSink::new();
        let mut ctx = Context::new(Task::leader(1), &mut mem, &events);

        let mut var = var_screeninfo();
        copy_out(&mut ctx, buf, &var).unwrap();
        let pan = IoctlArgs::new(3, FBIOPAN_DISPLAY, buf);
        assert_eq!(Ok(0), f.ioctl(&mut ctx, &pan));
        var.yoffset = 600;
        copy_out(&mut ctx, buf, &var).unwrap();
        assert_eq!(Err(Errno::EINVAL), f.ioctl(&mut ctx, &pan));

        let blank = IoctlArgs::new(3, FBIOBLANK, RemotePtr::new_from_val(4));
        assert_eq!(Ok(0), f.ioctl(&mut ctx, &blank));
    }

    #[test]
    fn unknown_ioctl_is_einval_with_one_event() {
        let mut f = open();
        let mut mem = LocalMemory::new();
        let buf = mem.map(BUF, 0x1000);
        let events = CollectingEventSink::new();
        let mut ctx = Context::new(Task::new(101, 100), &mut mem, &events);
        let cmd = ior(b'F' as u32, 0x30, 8);
        assert_eq!(
            Err(Errno::EINVAL),
            f.ioctl(&mut ctx, &IoctlArgs::new(7, cmd, buf))
        );
        let evs = events.events();
        assert_eq!(1, evs.len());
        assert_eq!(101, evs[0].tid);
        assert_eq!(100, evs[0].tgid);
        assert_eq!(SYS_ioctl as i64, evs[0].sysno);
        assert_eq!([7, cmd as u64, BUF as u64], evs[0].args);

        // Known to the ABI table but not emulated.
        assert_eq!(
            Err(Errno::EINVAL),
            f.ioctl(&mut ctx, &IoctlArgs::new(7, FBIOGETCMAP, buf))
        );
        assert_eq!(2, events.len());
    }

    #[test]
    fn bad_pointer_is_efault() {
        let mut f = open();
        let mut mem = LocalMemory::new();
        let events = CollectingEventSink::new();
        let mut ctx = Context::new(Task::leader(1), &mut mem, &events);
        let args = IoctlArgs::new(3, FBIOGET_VSCREENINFO, RemotePtr::new_from_val(0xdead_0000));
        assert_eq!(Err(Errno::EFAULT), f.ioctl(&mut ctx, &args));
        assert!(events.is_empty());
    }

    #[test]
    fn mmap_length_is_store_size() {
        let mut f = open();
        for asked in [1u64, 4096, 1 << 30].iter() {
            let mut opts = MMapOpts {
                length: *asked,
                ..Default::default()
            };
            f.configure_mmap(&mut opts).unwrap();
            assert_eq!(1_920_000, opts.length);
            assert_eq!(1_920_000, opts.mappable.as_ref().unwrap().size());
        }
    }

    #[test]
    fn reads_come_from_store_writes_are_dropped() {
        let dev = FbDevice::new(
            "fb0",
            FileOwner::root(),
            FilePermissions::from_mode(0o666),
        )
        .unwrap();
        dev.store().write_at(b"pixels", 100).unwrap();
        let mut f = dev
            .get_file(&Dirent::new("fb0"), FileFlags::READ | FileFlags::WRITE)
            .unwrap();
        assert!(f.flags().contains(FileFlags::PREAD | FileFlags::PWRITE));

        assert_eq!(Ok(6), f.write(b"ignore"));
        assert_eq!(Ok(6), f.pwrite(b"ignore", 100));
        let mut buf = [0u8; 6];
        assert_eq!(Ok(6), f.pread(&mut buf, 100));
        assert_eq!(b"pixels", &buf);

        assert_eq!(Ok(FB_SIZE - 2), f.seek(-2, SeekWhence::End));
        let mut tail = [0xffu8; 8];
        assert_eq!(Ok(2), f.read(&mut tail));
        assert_eq!(Ok(0), f.read(&mut tail));
    }

    #[test]
    fn node_attributes() {
        let dev = FbDevice::new("fb0", FileOwner::root(), FilePermissions::from_mode(0o666))
            .unwrap();
        let attrs = dev.attributes();
        assert_eq!(makedev(29, 0), attrs.rdev);
        assert_eq!(TMPFS_MAGIC, attrs.magic);
        assert_eq!(FileOwner::root(), attrs.owner);
        assert_eq!("fb0", dev.name());
    }

    #[test]
    fn guest_sees_exact_layout() {
        let mut f = open();
        let mut mem = LocalMemory::new();
        let buf = mem.map(BUF, 0x1000);
        let events = CollectingEventSink::new();
        {
            let mut ctx = Context::new(Task::leader(1), &mut mem, &events);
            f.ioctl(&mut ctx, &IoctlArgs::new(3, FBIOGET_FSCREENINFO, buf))
                .unwrap();
        }
        let mut raw = [0u8; 80];
        mem.copy_in_bytes(buf, &mut raw, IoOpts::active()).unwrap();
        // line_length lives at offset 48.
        assert_eq!(&3200u32.to_le_bytes()[..], &raw[48..52]);
        assert_eq!(&FB_VISUAL_TRUECOLOR.to_le_bytes()[..], &raw[36..40]);
    }
}
