use crate::{
    abi::{
        audit::{
            audit_features,
            audit_status,
            AUDIT_GET,
            AUDIT_GET_FEATURE,
            AUDIT_LIST_RULES,
            AUDIT_SET,
            AUDIT_USER,
        },
        fb::{
            fb_bitfield,
            fb_fix_screeninfo,
            fb_var_screeninfo,
            FBIOBLANK,
            FBIOGET_FSCREENINFO,
            FBIOGET_VSCREENINFO,
            FBIOPAN_DISPLAY,
            FBIOPUT_VSCREENINFO,
        },
        netlink::{nlmsgerr, nlmsghdr},
        termios::{
            termios,
            winsize,
            KDGKBTYPE,
            TCGETS,
            TCSETS,
            TCSETSF,
            TCSETSW,
            TIOCGWINSZ,
            TIOCSWINSZ,
            VT_OPENQRY,
        },
    },
    commands::KcompatCommand,
    kernel_metadata::{audit_message_type_name, ioctl_name},
};
use serde::Serialize;
use std::{
    io::{self, stdout, Write},
    mem::size_of,
};

macro_rules! layout {
    ($t:path { $($f:tt),* }) => {
        StructLayout {
            name: stringify!($t),
            size: size_of::<$t>(),
            fields: vec![$(FieldOffset {
                name: stringify!($f),
                offset: offset_of!($t, $f),
            }),*],
        }
    };
}

#[derive(Debug, Serialize)]
pub struct FieldOffset {
    pub name: &'static str,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
pub struct StructLayout {
    pub name: &'static str,
    pub size: usize,
    pub fields: Vec<FieldOffset>,
}

#[derive(Debug, Serialize)]
pub struct Code {
    pub name: String,
    pub value: u32,
}

#[derive(Debug, Serialize)]
pub struct LayoutReport {
    pub ioctls: Vec<Code>,
    pub audit_messages: Vec<Code>,
    pub structs: Vec<StructLayout>,
}

impl LayoutReport {
    pub fn new() -> LayoutReport {
        let ioctls = [
            FBIOGET_VSCREENINFO,
            FBIOPUT_VSCREENINFO,
            FBIOGET_FSCREENINFO,
            FBIOPAN_DISPLAY,
            FBIOBLANK,
            TCGETS,
            TCSETS,
            TCSETSW,
            TCSETSF,
            TIOCGWINSZ,
            TIOCSWINSZ,
            KDGKBTYPE,
            VT_OPENQRY,
        ]
        .iter()
        .map(|&cmd| Code {
            name: ioctl_name(cmd),
            value: cmd,
        })
        .collect();

        let audit_messages = [
            AUDIT_GET,
            AUDIT_SET,
            AUDIT_USER,
            AUDIT_LIST_RULES,
            AUDIT_GET_FEATURE,
        ]
        .iter()
        .map(|&t| Code {
            name: audit_message_type_name(t),
            value: t as u32,
        })
        .collect();

        let structs = vec![
            layout!(fb_bitfield { offset, length, msb_right }),
            layout!(fb_fix_screeninfo {
                id,
                smem_start,
                smem_len,
                type_,
                visual,
                line_length,
                mmio_start,
                capabilities
            }),
            layout!(fb_var_screeninfo {
                xres,
                yres,
                xres_virtual,
                yres_virtual,
                bits_per_pixel,
                red,
                green,
                blue,
                transp,
                activate,
                pixclock,
                rotate,
                colorspace,
                reserved
            }),
            layout!(termios {
                c_iflag,
                c_oflag,
                c_cflag,
                c_lflag,
                c_line,
                c_cc
            }),
            layout!(winsize {
                ws_row,
                ws_col,
                ws_xpixel,
                ws_ypixel
            }),
            layout!(audit_status {
                mask,
                enabled,
                failure,
                pid,
                feature_bitmap,
                backlog_wait_time
            }),
            layout!(audit_features {
                vers,
                mask,
                features,
                lock
            }),
            layout!(nlmsghdr {
                nlmsg_len,
                nlmsg_type,
                nlmsg_flags,
                nlmsg_seq,
                nlmsg_pid
            }),
            layout!(nlmsgerr { error, msg }),
        ];

        LayoutReport {
            ioctls,
            audit_messages,
            structs,
        }
    }

    pub fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "ioctls:")?;
        for c in &self.ioctls {
            writeln!(out, "  {:<22}{:#06x}", c.name, c.value)?;
        }
        writeln!(out, "audit messages:")?;
        for c in &self.audit_messages {
            writeln!(out, "  {:<22}{}", c.name, c.value)?;
        }
        for s in &self.structs {
            writeln!(out, "struct {} ({} bytes):", s.name, s.size)?;
            for f in &s.fields {
                writeln!(out, "  {:>4}  {}", f.offset, f.name)?;
            }
        }
        Ok(())
    }
}

pub struct LayoutCommand {
    json: bool,
}

impl LayoutCommand {
    pub fn new(json: bool) -> LayoutCommand {
        LayoutCommand { json }
    }

    fn layout(&self, out: &mut dyn Write) -> io::Result<()> {
        let report = LayoutReport::new();
        if self.json {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)
        } else {
            report.write_text(out)
        }
    }
}

impl KcompatCommand for LayoutCommand {
    fn run(&mut self) -> io::Result<()> {
        self.layout(&mut stdout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size_of_named(report: &LayoutReport, name: &str) -> usize {
        report
            .structs
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.size)
            .unwrap()
    }

    #[test]
    fn struct_sizes() {
        let report = LayoutReport::new();
        assert_eq!(80, size_of_named(&report, "fb_fix_screeninfo"));
        assert_eq!(160, size_of_named(&report, "fb_var_screeninfo"));
        assert_eq!(12, size_of_named(&report, "fb_bitfield"));
        assert_eq!(36, size_of_named(&report, "termios"));
        assert_eq!(8, size_of_named(&report, "winsize"));
        assert_eq!(40, size_of_named(&report, "audit_status"));
        assert_eq!(16, size_of_named(&report, "audit_features"));
        assert_eq!(16, size_of_named(&report, "nlmsghdr"));
        assert_eq!(20, size_of_named(&report, "nlmsgerr"));
    }

    #[test]
    fn codes() {
        let report = LayoutReport::new();
        let fscreen = report
            .ioctls
            .iter()
            .find(|c| c.name == "FBIOGET_FSCREENINFO")
            .unwrap();
        assert_eq!(0x4602, fscreen.value);
        assert!(report
            .audit_messages
            .iter()
            .any(|c| c.name == "AUDIT_GET_FEATURE" && c.value == 1019));
    }

    #[test]
    fn json_and_text() {
        let mut json = Vec::new();
        LayoutCommand::new(true).layout(&mut json).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(9, v["structs"].as_array().unwrap().len());
        assert_eq!("line_length", v["structs"][1]["fields"][5]["name"]);
        assert_eq!(48, v["structs"][1]["fields"][5]["offset"]);

        let mut text = Vec::new();
        LayoutCommand::new(false).layout(&mut text).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.contains("struct termios (36 bytes):"));
        assert!(text.contains("TCGETS"));
    }
}
