#![allow(non_camel_case_types)]

//! Terminal ABI: the kernel's `struct termios` (the one TCGETS/TCSETS move,
//! *not* glibc's larger one), `struct winsize` and the console ioctls.

pub const TCGETS: u32 = 0x5401;
pub const TCSETS: u32 = 0x5402;
pub const TCSETSW: u32 = 0x5403;
pub const TCSETSF: u32 = 0x5404;
pub const TIOCGWINSZ: u32 = 0x5413;
pub const TIOCSWINSZ: u32 = 0x5414;

/// Get keyboard type.
pub const KDGKBTYPE: u32 = 0x4B33;
/// Find an available virtual terminal.
pub const VT_OPENQRY: u32 = 0x5600;

pub const KB_84: u8 = 0x01;
pub const KB_101: u8 = 0x02;

/// Number of control characters in the kernel termios.
pub const NCCS: usize = 19;

pub const VINTR: usize = 0;
pub const VQUIT: usize = 1;
pub const VERASE: usize = 2;
pub const VKILL: usize = 3;
pub const VEOF: usize = 4;
pub const VTIME: usize = 5;
pub const VMIN: usize = 6;
pub const VSWTC: usize = 7;
pub const VSTART: usize = 8;
pub const VSTOP: usize = 9;
pub const VSUSP: usize = 10;
pub const VEOL: usize = 11;
pub const VREPRINT: usize = 12;
pub const VDISCARD: usize = 13;
pub const VWERASE: usize = 14;
pub const VLNEXT: usize = 15;
pub const VEOL2: usize = 16;

bitflags! {
    pub struct InputFlags: u32 {
        const IGNBRK = 0o1;
        const BRKINT = 0o2;
        const IGNPAR = 0o4;
        const PARMRK = 0o10;
        const INPCK = 0o20;
        const ISTRIP = 0o40;
        const INLCR = 0o100;
        const IGNCR = 0o200;
        const ICRNL = 0o400;
        const IUCLC = 0o1000;
        const IXON = 0o2000;
        const IXANY = 0o4000;
        const IXOFF = 0o10000;
        const IMAXBEL = 0o20000;
        const IUTF8 = 0o40000;
    }
}

bitflags! {
    pub struct OutputFlags: u32 {
        const OPOST = 0o1;
        const OLCUC = 0o2;
        const ONLCR = 0o4;
        const OCRNL = 0o10;
        const ONOCR = 0o20;
        const ONLRET = 0o40;
        const OFILL = 0o100;
        const OFDEL = 0o200;
    }
}

bitflags! {
    pub struct ControlFlags: u32 {
        const CBAUD = 0o10017;
        const B38400 = 0o17;
        const CSIZE = 0o60;
        const CS6 = 0o20;
        const CS7 = 0o40;
        const CS8 = 0o60;
        const CSTOPB = 0o100;
        const CREAD = 0o200;
        const PARENB = 0o400;
        const PARODD = 0o1000;
        const HUPCL = 0o2000;
        const CLOCAL = 0o4000;
    }
}

bitflags! {
    pub struct LocalFlags: u32 {
        const ISIG = 0o1;
        const ICANON = 0o2;
        const XCASE = 0o4;
        const ECHO = 0o10;
        const ECHOE = 0o20;
        const ECHOK = 0o40;
        const ECHONL = 0o100;
        const NOFLSH = 0o200;
        const TOSTOP = 0o400;
        const ECHOCTL = 0o1000;
        const ECHOPRT = 0o2000;
        const ECHOKE = 0o4000;
        const FLUSHO = 0o10000;
        const PENDIN = 0o40000;
        const IEXTEN = 0o100000;
        const EXTPROC = 0o200000;
    }
}

/// `struct termios` from include/uapi/asm-generic/termbits.h.
#[repr(C)]
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct termios {
    pub c_iflag: u32,
    pub c_oflag: u32,
    pub c_cflag: u32,
    pub c_lflag: u32,
    pub c_line: u8,
    pub c_cc: [u8; NCCS],
}

assert_eq_size!(termios, [u8; 36]);

#[repr(C)]
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct winsize {
    pub ws_row: u16,
    pub ws_col: u16,
    pub ws_xpixel: u16,
    pub ws_ypixel: u16,
}

assert_eq_size!(winsize, [u8; 8]);

const fn control_character(c: u8) -> u8 {
    c - b'A' + 1
}

/// The kernel's in-memory `struct ktermios`. Unlike `termios` it remembers the
/// line speeds, which are not part of the TCGETS layout.
///
/// Flag words are stored raw so that whatever the guest sets is exactly what
/// it reads back; the typed accessors are for inspection only.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct KernelTermios {
    pub input_flags: u32,
    pub output_flags: u32,
    pub control_flags: u32,
    pub local_flags: u32,
    pub line_discipline: u8,
    pub control_characters: [u8; NCCS],
    pub input_speed: u32,
    pub output_speed: u32,
}

impl KernelTermios {
    /// What a freshly opened pty slave looks like.
    pub fn default_slave() -> KernelTermios {
        let mut cc = [0u8; NCCS];
        cc[VINTR] = control_character(b'C');
        cc[VQUIT] = control_character(b'\\');
        cc[VERASE] = 0x7f;
        cc[VKILL] = control_character(b'U');
        cc[VEOF] = control_character(b'D');
        cc[VTIME] = 0;
        cc[VMIN] = 1;
        cc[VSWTC] = 0;
        cc[VSTART] = control_character(b'Q');
        cc[VSTOP] = control_character(b'S');
        cc[VSUSP] = control_character(b'Z');
        cc[VEOL] = 0;
        cc[VREPRINT] = control_character(b'R');
        cc[VDISCARD] = control_character(b'O');
        cc[VWERASE] = control_character(b'W');
        cc[VLNEXT] = control_character(b'V');
        cc[VEOL2] = 0;

        KernelTermios {
            input_flags: (InputFlags::ICRNL | InputFlags::IXON).bits(),
            output_flags: (OutputFlags::OPOST | OutputFlags::ONLCR).bits(),
            control_flags: (ControlFlags::B38400 | ControlFlags::CS8 | ControlFlags::CREAD)
                .bits(),
            local_flags: (LocalFlags::ISIG
                | LocalFlags::ICANON
                | LocalFlags::ECHO
                | LocalFlags::ECHOE
                | LocalFlags::ECHOK
                | LocalFlags::ECHOCTL
                | LocalFlags::ECHOKE
                | LocalFlags::IEXTEN)
                .bits(),
            line_discipline: 0,
            control_characters: cc,
            input_speed: 38400,
            output_speed: 38400,
        }
    }

    pub fn to_termios(&self) -> termios {
        termios {
            c_iflag: self.input_flags,
            c_oflag: self.output_flags,
            c_cflag: self.control_flags,
            c_lflag: self.local_flags,
            c_line: self.line_discipline,
            c_cc: self.control_characters,
        }
    }

    /// Speeds are left alone; the TCSETS layout does not carry them.
    pub fn from_termios(&mut self, t: &termios) {
        self.input_flags = t.c_iflag;
        self.output_flags = t.c_oflag;
        self.control_flags = t.c_cflag;
        self.local_flags = t.c_lflag;
        self.line_discipline = t.c_line;
        self.control_characters = t.c_cc;
    }

    pub fn iflags(&self) -> InputFlags {
        InputFlags::from_bits_truncate(self.input_flags)
    }

    pub fn oflags(&self) -> OutputFlags {
        OutputFlags::from_bits_truncate(self.output_flags)
    }

    pub fn lflags(&self) -> LocalFlags {
        LocalFlags::from_bits_truncate(self.local_flags)
    }

    pub fn is_canonical(&self) -> bool {
        self.lflags().contains(LocalFlags::ICANON)
    }

    pub fn echo(&self) -> bool {
        self.lflags().contains(LocalFlags::ECHO)
    }
}

impl Default for KernelTermios {
    fn default() -> Self {
        KernelTermios::default_slave()
    }
}
