use nix::unistd::close;
use std::os::unix::io::RawFd;

// We DON'T want this to be Copy or Clone because of the Drop.
pub struct ScopedFd {
    fd: RawFd,
}

impl ScopedFd {
    pub fn new() -> Self {
        ScopedFd { fd: -1 }
    }

    pub fn from_raw(fd: RawFd) -> Self {
        ScopedFd { fd }
    }

    pub fn close(&mut self) {
        if self.fd >= 0 {
            // We swallow any error on close
            close(self.fd).unwrap_or(());
        }

        self.fd = -1;
    }

    pub fn is_open(&self) -> bool {
        self.fd >= 0
    }

    pub fn as_raw(&self) -> RawFd {
        self.fd
    }
}

impl Default for ScopedFd {
    fn default() -> Self {
        ScopedFd::new()
    }
}

impl Drop for ScopedFd {
    fn drop(&mut self) {
        self.close()
    }
}
