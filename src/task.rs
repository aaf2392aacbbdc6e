use libc::pid_t;
use std::fmt::{Display, Formatter, Result};

/// The identity of the guest execution context that issued a request.
///
/// Task management lives outside this crate; all we ever need is who is
/// asking, both as a thread and as a thread group (what userspace calls the
/// pid).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Task {
    pub tid: pid_t,
    pub tgid: pid_t,
}

impl Task {
    pub fn new(tid: pid_t, tgid: pid_t) -> Task {
        Task { tid, tgid }
    }

    /// A single threaded process.
    pub fn leader(pid: pid_t) -> Task {
        Task::new(pid, pid)
    }

    pub fn is_thread_group_leader(&self) -> bool {
        self.tid == self.tgid
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}/{}", self.tgid, self.tid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leader() {
        assert!(Task::leader(7).is_thread_group_leader());
        assert!(!Task::new(8, 7).is_thread_group_leader());
        assert_eq!("7/8", format!("{}", Task::new(8, 7)));
    }
}
