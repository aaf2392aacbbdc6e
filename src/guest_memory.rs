//! Copying structures across the guest boundary.

use crate::{
    core::{as_bytes, from_bytes, type_has_no_holes},
    log::LogLevel::LogDebug,
    remote_ptr::{RemotePtr, Void},
};
use nix::errno::Errno;
use std::{collections::BTreeMap, mem::size_of};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct IoOpts {
    /// The caller's address space is the one currently installed, so the
    /// copy may touch it directly.
    pub address_space_active: bool,
}

impl IoOpts {
    pub fn active() -> IoOpts {
        IoOpts {
            address_space_active: true,
        }
    }
}

/// A guest address space as seen by a device or protocol handler.
///
/// Both directions either move the whole range or fail with EFAULT.
pub trait GuestMemory {
    fn copy_out_bytes(
        &mut self,
        addr: RemotePtr<Void>,
        src: &[u8],
        opts: IoOpts,
    ) -> Result<usize, Errno>;

    fn copy_in_bytes(
        &self,
        addr: RemotePtr<Void>,
        dst: &mut [u8],
        opts: IoOpts,
    ) -> Result<usize, Errno>;
}

/// Write the ABI encoding of `val` to `addr`.
pub fn copy_object_out<T: Copy + 'static>(
    mem: &mut dyn GuestMemory,
    addr: RemotePtr<T>,
    val: &T,
    opts: IoOpts,
) -> Result<usize, Errno> {
    debug_assert!(type_has_no_holes::<T>());
    mem.copy_out_bytes(RemotePtr::cast(addr), as_bytes(val), opts)
}

/// Read a `T` in its ABI encoding from `addr`.
pub fn copy_object_in<T: Copy + 'static>(
    mem: &dyn GuestMemory,
    addr: RemotePtr<T>,
    opts: IoOpts,
) -> Result<T, Errno> {
    let mut buf = vec![0u8; size_of::<T>()];
    mem.copy_in_bytes(RemotePtr::cast(addr), &mut buf, opts)?;
    from_bytes::<T>(&buf).ok_or(Errno::EFAULT)
}

/// An address space made of explicitly mapped regions that live in this
/// process. Used when the guest's memory is our own, and by the tests.
#[derive(Default)]
pub struct LocalMemory {
    /// Start address -> contents. Regions never overlap.
    regions: BTreeMap<usize, Vec<u8>>,
}

impl LocalMemory {
    pub fn new() -> LocalMemory {
        Default::default()
    }

    /// Map `len` zeroed bytes at `addr`. Panics if this would overlap an
    /// existing region; callers pick the layout.
    pub fn map(&mut self, addr: usize, len: usize) -> RemotePtr<Void> {
        assert!(addr != 0, "Refusing to map the null page");
        let starts_inside = self
            .regions
            .range(..=addr)
            .next_back()
            .map_or(false, |(start, region)| addr < start + region.len());
        assert!(
            !starts_inside && self.regions.range(addr..addr + len).next().is_none(),
            "Region {:#x}+{:#x} overlaps an existing mapping",
            addr,
            len
        );
        self.regions.insert(addr, vec![0u8; len]);
        RemotePtr::new_from_val(addr)
    }

    pub fn unmap(&mut self, addr: usize) -> bool {
        self.regions.remove(&addr).is_some()
    }

    /// (region start, offset into region) for a fully contained range.
    fn find(&self, addr: usize, len: usize) -> Option<(usize, usize)> {
        let (start, region) = self.regions.range(..=addr).next_back()?;
        let offset = addr - start;
        if offset.checked_add(len)? <= region.len() {
            Some((*start, offset))
        } else {
            None
        }
    }
}

impl GuestMemory for LocalMemory {
    fn copy_out_bytes(
        &mut self,
        addr: RemotePtr<Void>,
        src: &[u8],
        opts: IoOpts,
    ) -> Result<usize, Errno> {
        if src.is_empty() {
            return Ok(0);
        }
        if !opts.address_space_active {
            log!(LogDebug, "copy out to {} with inactive address space", addr);
        }
        let (start, offset) = self.find(addr.as_usize(), src.len()).ok_or(Errno::EFAULT)?;
        // find() just returned this key.
        let region = self.regions.get_mut(&start).ok_or(Errno::EFAULT)?;
        region[offset..offset + src.len()].copy_from_slice(src);
        Ok(src.len())
    }

    fn copy_in_bytes(
        &self,
        addr: RemotePtr<Void>,
        dst: &mut [u8],
        _opts: IoOpts,
    ) -> Result<usize, Errno> {
        if dst.is_empty() {
            return Ok(0);
        }
        let (start, offset) = self.find(addr.as_usize(), dst.len()).ok_or(Errno::EFAULT)?;
        let region = &self.regions[&start];
        dst.copy_from_slice(&region[offset..offset + dst.len()]);
        Ok(dst.len())
    }
}
