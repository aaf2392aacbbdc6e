use crate::{
    device::{fb::FbDevice, pty::PtyDevice, File},
    log::LogLevel::LogDebug,
    vfs::{DeviceNode, Dirent, FileFlags, FileOwner, FilePermissions},
};
use nix::errno::Errno;
use std::{collections::BTreeMap, sync::Arc};

pub const FB_NODE_NAME: &str = "fb0";
pub const TTY_NODE_NAME: &str = "tty0";

/// The device nodes under /dev that we provide.
pub struct DeviceTable {
    nodes: BTreeMap<String, Arc<dyn DeviceNode>>,
}

impl DeviceTable {
    /// A table with `fb0` and `tty0`, both world read/writable and owned by
    /// root.
    pub fn new() -> Result<DeviceTable, Errno> {
        let perms = FilePermissions::from_mode(0o666);
        let mut table = DeviceTable {
            nodes: BTreeMap::new(),
        };
        table.register(Arc::new(FbDevice::new(
            FB_NODE_NAME,
            FileOwner::root(),
            perms,
        )?));
        table.register(Arc::new(PtyDevice::new(
            TTY_NODE_NAME,
            FileOwner::root(),
            perms,
        )));
        Ok(table)
    }

    /// Later registrations with the same name replace earlier ones.
    pub fn register(&mut self, node: Arc<dyn DeviceNode>) {
        log!(LogDebug, "Registering device node /dev/{}", node.name());
        self.nodes.insert(node.name().to_owned(), node);
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn DeviceNode>> {
        self.nodes.get(name)
    }

    pub fn open(&self, name: &str, flags: FileFlags) -> Result<File, Errno> {
        let node = self.lookup(name).ok_or(Errno::ENOENT)?;
        node.get_file(&Dirent::new(name), flags)
    }

    pub fn names(&self) -> Vec<&str> {
        self.nodes.keys().map(|k| k.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        abi::{makedev, FB_MAJOR, TMPFS_MAGIC, TTY_MAJOR},
        device::DeviceKind,
    };

    #[test]
    fn registers_both_nodes() {
        let table = DeviceTable::new().unwrap();
        assert_eq!(vec!["fb0", "tty0"], table.names());

        let fb = table.lookup("fb0").unwrap().attributes();
        assert_eq!(makedev(FB_MAJOR, 0), fb.rdev);
        assert_eq!(0o666, fb.perms.mode);
        assert_eq!(FileOwner::root(), fb.owner);
        assert_eq!(TMPFS_MAGIC, fb.magic);

        let tty = table.lookup("tty0").unwrap().attributes();
        assert_eq!(makedev(TTY_MAJOR, 0), tty.rdev);
        assert_eq!(0o666, tty.perms.mode);
    }

    #[test]
    fn open_by_name() {
        let table = DeviceTable::new().unwrap();
        let f = table.open("fb0", FileFlags::READ).unwrap();
        assert_eq!(DeviceKind::Framebuffer, f.kind());
        assert_eq!("fb0", f.name());
        let f = table.open("tty0", FileFlags::READ).unwrap();
        assert_eq!(DeviceKind::Pty, f.kind());
        assert!(table.open("fb1", FileFlags::READ).is_err());
    }
}
