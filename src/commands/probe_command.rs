//! Drive everything the way a guest would and report what it saw.

use crate::{
    abi::{
        audit::{
            audit_features,
            audit_status,
            AUDIT_GET,
            AUDIT_GET_FEATURE,
            AUDIT_LIST_RULES,
            AUDIT_SET,
            AUDIT_STATUS_PID,
            AUDIT_USER,
        },
        fb::{fb_fix_screeninfo, fb_var_screeninfo, FBIOGET_FSCREENINFO, FBIOGET_VSCREENINFO},
        ioctl::ior,
        netlink::{nlmsgerr, nlmsghdr, NETLINK_AUDIT, NLMSG_ERROR, NLM_F_ACK, NLM_F_REQUEST},
        termios::{
            termios,
            KernelTermios,
            LocalFlags,
            KDGKBTYPE,
            TCGETS,
            TCSETS,
            VMIN,
            VT_OPENQRY,
        },
    },
    commands::KcompatCommand,
    context::Context,
    core::from_bytes,
    device::{
        table::{DeviceTable, FB_NODE_NAME, TTY_NODE_NAME},
        File,
    },
    guest_memory::LocalMemory,
    ioctl::{copy_in, copy_out, IoctlArgs},
    kernel_metadata::errno_name,
    log::LogLevel::LogInfo,
    netlink::{
        message::{parse_messages, Message},
        socket::NetlinkSocket,
    },
    remote_ptr::{RemotePtr, Void},
    task::Task,
    unimpl::{CollectingEventSink, UnimplementedEvent},
    vfs::{FileFlags, MMapOpts},
};
use nix::{errno::Errno, unistd::getpid};
use serde::Serialize;
use std::{
    io::{self, stdout, Write},
    sync::Arc,
};

/// Where the probe's guest scratch page lives.
const SCRATCH: usize = 0x7000_0000;
const SCRATCH_LEN: usize = 0x1000;

#[derive(Debug, Default, Serialize)]
pub struct FramebufferProbe {
    pub id: String,
    pub line_length: u32,
    pub visual: u32,
    pub smem_len: u32,
    pub xres: u32,
    pub yres: u32,
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    pub bits_per_pixel: u32,
    /// (offset, length) of red, green, blue and transp.
    pub channels: Vec<(u32, u32)>,
    pub mmap_length: u64,
    pub unknown_ioctl: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ConsoleProbe {
    pub keyboard_type: u8,
    pub vt_openqry: u32,
    pub canonical: bool,
    pub echo: bool,
    pub raw_mode_round_trip: bool,
    pub read_bytes: usize,
    pub unknown_ioctl: String,
}

#[derive(Debug, Default, Serialize)]
pub struct AuditProbe {
    pub enabled_before: u32,
    pub enabled_after: u32,
    pub daemon_pid: u32,
    pub forwarded: Option<String>,
    pub feature_version: u32,
    pub feature_mask: u32,
    pub unsupported_error: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ProbeReport {
    pub framebuffer: FramebufferProbe,
    pub console: ConsoleProbe,
    pub audit: AuditProbe,
    pub unimplemented: Vec<UnimplementedEvent>,
}

fn outcome(res: Result<usize, Errno>) -> String {
    match res {
        Ok(ret) => ret.to_string(),
        Err(e) => errno_name(e as i32),
    }
}

pub struct ProbeCommand {
    json: bool,
    mmap_length: u64,
}

impl ProbeCommand {
    pub fn new(json: bool, mmap_length: u64) -> ProbeCommand {
        ProbeCommand { json, mmap_length }
    }

    pub fn probe(&self) -> Result<ProbeReport, Errno> {
        let devices = DeviceTable::new()?;
        let mut mem = LocalMemory::new();
        let scratch = mem.map(SCRATCH, SCRATCH_LEN);
        let events = CollectingEventSink::new();
        let task = Task::leader(getpid().as_raw());
        let mut report = ProbeReport::default();
        {
            let mut ctx = Context::new(task, &mut mem, &events);
            report.framebuffer = self.probe_framebuffer(&devices, &mut ctx, scratch)?;
            report.console = probe_console(&devices, &mut ctx, scratch)?;
            report.audit = probe_audit(&mut ctx, task)?;
        }
        report.unimplemented = events.events();
        Ok(report)
    }

    fn probe_framebuffer(
        &self,
        devices: &DeviceTable,
        ctx: &mut Context,
        scratch: RemotePtr<Void>,
    ) -> Result<FramebufferProbe, Errno> {
        let mut fb = devices.open(FB_NODE_NAME, FileFlags::READ | FileFlags::WRITE)?;
        let fix: fb_fix_screeninfo = ioctl_read(&mut fb, ctx, FBIOGET_FSCREENINFO, scratch)?;
        let var: fb_var_screeninfo = ioctl_read(&mut fb, ctx, FBIOGET_VSCREENINFO, scratch)?;

        let mut opts = MMapOpts {
            length: self.mmap_length,
            ..Default::default()
        };
        fb.configure_mmap(&mut opts)?;

        let unknown = fb.ioctl(
            ctx,
            &IoctlArgs::new(3, ior(b'F' as u32, 0x30, 8), scratch),
        );

        let id_len = fix.id.iter().position(|&b| b == 0).unwrap_or(fix.id.len());
        Ok(FramebufferProbe {
            id: String::from_utf8_lossy(&fix.id[..id_len]).into_owned(),
            line_length: fix.line_length,
            visual: fix.visual,
            smem_len: fix.smem_len,
            xres: var.xres,
            yres: var.yres,
            xres_virtual: var.xres_virtual,
            yres_virtual: var.yres_virtual,
            bits_per_pixel: var.bits_per_pixel,
            channels: [var.red, var.green, var.blue, var.transp]
                .iter()
                .map(|c| (c.offset, c.length))
                .collect(),
            mmap_length: opts.length,
            unknown_ioctl: outcome(unknown),
        })
    }

    fn write_text(&self, report: &ProbeReport, out: &mut dyn Write) -> io::Result<()> {
        let fb = &report.framebuffer;
        writeln!(
            out,
            "/dev/{}: id={:?} {}x{} ({}x{} virtual) {} bpp, line_length={} visual={} smem_len={}",
            FB_NODE_NAME,
            fb.id,
            fb.xres,
            fb.yres,
            fb.xres_virtual,
            fb.yres_virtual,
            fb.bits_per_pixel,
            fb.line_length,
            fb.visual,
            fb.smem_len
        )?;
        writeln!(out, "  channels (offset, length): {:?}", fb.channels)?;
        writeln!(out, "  mmap length: {}", fb.mmap_length)?;
        writeln!(out, "  unknown ioctl: {}", fb.unknown_ioctl)?;

        let con = &report.console;
        writeln!(
            out,
            "/dev/{}: keyboard type {}, VT_OPENQRY {}, canonical={} echo={}",
            TTY_NODE_NAME, con.keyboard_type, con.vt_openqry, con.canonical, con.echo
        )?;
        writeln!(out, "  raw mode round trip: {}", con.raw_mode_round_trip)?;
        writeln!(out, "  read: {} bytes", con.read_bytes)?;
        writeln!(out, "  unknown ioctl: {}", con.unknown_ioctl)?;

        let audit = &report.audit;
        writeln!(
            out,
            "audit: enabled {} -> {}, daemon pid {}",
            audit.enabled_before, audit.enabled_after, audit.daemon_pid
        )?;
        writeln!(out, "  forwarded user message: {:?}", audit.forwarded)?;
        writeln!(
            out,
            "  features: version {} mask {:#x}",
            audit.feature_version, audit.feature_mask
        )?;
        writeln!(out, "  unsupported request: {}", audit.unsupported_error)?;

        writeln!(out, "unimplemented feature events: {}", report.unimplemented.len())?;
        for ev in &report.unimplemented {
            writeln!(out, "  {}/{}: {}", ev.tgid, ev.tid, ev.what)?;
        }
        Ok(())
    }

    fn report(&self, out: &mut dyn Write) -> io::Result<()> {
        let report = self
            .probe()
            .map_err(|e| io::Error::from_raw_os_error(e as i32))?;
        if self.json {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)
        } else {
            self.write_text(&report, out)
        }
    }
}

impl KcompatCommand for ProbeCommand {
    fn run(&mut self) -> io::Result<()> {
        self.report(&mut stdout())
    }
}

fn ioctl_read<T: Copy + 'static>(
    file: &mut File,
    ctx: &mut Context,
    cmd: u32,
    scratch: RemotePtr<Void>,
) -> Result<T, Errno> {
    file.ioctl(ctx, &IoctlArgs::new(3, cmd, scratch))?;
    copy_in(ctx, scratch)
}

fn probe_console(
    devices: &DeviceTable,
    ctx: &mut Context,
    scratch: RemotePtr<Void>,
) -> Result<ConsoleProbe, Errno> {
    let mut tty = devices.open(TTY_NODE_NAME, FileFlags::READ | FileFlags::WRITE)?;
    let keyboard_type: u8 = ioctl_read(&mut tty, ctx, KDGKBTYPE, scratch)?;
    let vt_openqry: u32 = ioctl_read(&mut tty, ctx, VT_OPENQRY, scratch)?;
    let t: termios = ioctl_read(&mut tty, ctx, TCGETS, scratch)?;
    let mut current = KernelTermios::default();
    current.from_termios(&t);

    let mut raw = current;
    raw.local_flags &= !(LocalFlags::ICANON | LocalFlags::ECHO).bits();
    raw.control_characters[VMIN] = 0;
    copy_out(ctx, scratch, &raw.to_termios())?;
    tty.ioctl(ctx, &IoctlArgs::new(4, TCSETS, scratch))?;
    let back: termios = ioctl_read(&mut tty, ctx, TCGETS, scratch)?;

    let mut buf = [0u8; 64];
    let read_bytes = tty.read(&mut buf)?;
    let unknown = tty.ioctl(ctx, &IoctlArgs::new(4, 0x5409, scratch));

    Ok(ConsoleProbe {
        keyboard_type,
        vt_openqry,
        canonical: current.is_canonical(),
        echo: current.echo(),
        raw_mode_round_trip: back == raw.to_termios(),
        read_bytes,
        unknown_ioctl: outcome(unknown),
    })
}

fn audit_request(type_: u16, flags: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
    let mut m = Message::new(nlmsghdr {
        nlmsg_type: type_,
        nlmsg_flags: NLM_F_REQUEST | flags,
        nlmsg_seq: seq,
        ..Default::default()
    });
    m.put_bytes(payload);
    m.encode()
}

/// Send `req` and decode the first reply as a `T`.
fn audit_query<T: Copy + 'static>(
    sock: &Arc<NetlinkSocket>,
    ctx: &mut Context,
    req: &[u8],
) -> Result<T, Errno> {
    sock.send(ctx, req)?;
    let reply = sock.recv().ok_or(Errno::EAGAIN)?;
    let msgs = parse_messages(&reply);
    let (_, data) = msgs.first().ok_or(Errno::EIO)?;
    from_bytes(data).ok_or(Errno::EIO)
}

fn probe_audit(ctx: &mut Context, task: Task) -> Result<AuditProbe, Errno> {
    let daemon_port = task.tgid as u32;
    let daemon = NetlinkSocket::open(NETLINK_AUDIT, daemon_port)?;
    let client = NetlinkSocket::open(NETLINK_AUDIT, daemon_port + 1)?;

    let before: audit_status = audit_query(&client, ctx, &audit_request(AUDIT_GET, 0, 1, &[]))?;

    let set = audit_status {
        mask: AUDIT_STATUS_PID,
        pid: task.tgid as u32,
        ..Default::default()
    };
    let mut set_msg = Message::new(nlmsghdr {
        nlmsg_type: AUDIT_SET,
        nlmsg_flags: NLM_F_REQUEST | NLM_F_ACK,
        nlmsg_seq: 2,
        ..Default::default()
    });
    set_msg.put(&set);
    let ack: nlmsgerr = audit_query(&daemon, ctx, &set_msg.encode())?;
    if ack.error != 0 {
        log!(LogInfo, "AUDIT_SET was not acked: {}", ack.error);
    }

    let after: audit_status = audit_query(&client, ctx, &audit_request(AUDIT_GET, 0, 3, &[]))?;

    let text = b"op=probe res=success";
    client.send(ctx, &audit_request(AUDIT_USER, 0, 4, text))?;
    let forwarded = daemon.recv().and_then(|d| {
        parse_messages(&d)
            .first()
            .filter(|(hdr, _)| hdr.nlmsg_type == AUDIT_USER)
            .map(|(_, data)| String::from_utf8_lossy(data).into_owned())
    });

    let features: audit_features =
        audit_query(&client, ctx, &audit_request(AUDIT_GET_FEATURE, 0, 5, &[]))?;

    client.send(ctx, &audit_request(AUDIT_LIST_RULES, 0, 6, &[]))?;
    let unsupported_error = match client.recv() {
        Some(reply) => match parse_messages(&reply).first() {
            Some((hdr, data)) if hdr.nlmsg_type == NLMSG_ERROR => from_bytes::<nlmsgerr>(data)
                .map(|e| errno_name(-e.error))
                .unwrap_or_default(),
            _ => "no error".into(),
        },
        None => "no reply".into(),
    };

    Ok(AuditProbe {
        enabled_before: before.enabled,
        enabled_after: after.enabled,
        daemon_pid: after.pid,
        forwarded,
        feature_version: features.vers,
        feature_mask: features.mask,
        unsupported_error,
    })
}
