//! Guest addresses.

use std::{
    cmp::Ordering,
    fmt::{Display, Formatter, Result},
    marker::PhantomData,
    ops::{Add, Sub},
};

/// Useful alias.
pub type Void = u8;

/// A pointer into the guest's address space. Arithmetic is in units of `T`
/// just like a C pointer; dereferencing has to go through `GuestMemory`.
#[derive(Hash, Debug)]
pub struct RemotePtr<T> {
    ptr: usize,
    /// This struct does not "own" a `T` so `PhantomData<*const T>` rather than
    /// `PhantomData<T>`.
    phantom: PhantomData<*const T>,
}

// Manually derive Copy, Clone due to quirks with PhantomData
impl<T> Clone for RemotePtr<T> {
    fn clone(&self) -> Self {
        RemotePtr::new_from_val(self.ptr)
    }
}

impl<T> Copy for RemotePtr<T> {}

impl<T> Default for RemotePtr<T> {
    fn default() -> Self {
        RemotePtr::null()
    }
}

// The guest address is just a number; it is never dereferenced locally.
unsafe impl<T> Send for RemotePtr<T> {}
unsafe impl<T> Sync for RemotePtr<T> {}

impl<T> RemotePtr<T> {
    pub fn null() -> RemotePtr<T> {
        RemotePtr::new_from_val(0)
    }

    pub fn new_from_val(val: usize) -> RemotePtr<T> {
        RemotePtr {
            ptr: val,
            phantom: PhantomData,
        }
    }

    pub fn as_usize(&self) -> usize {
        self.ptr
    }

    pub fn is_null(&self) -> bool {
        self.ptr == 0
    }

    pub fn referent_size(&self) -> usize {
        std::mem::size_of::<T>()
    }

    pub fn cast<U>(r: RemotePtr<U>) -> RemotePtr<T> {
        RemotePtr::<T>::new_from_val(r.ptr)
    }

    pub fn as_rptr_u8(self) -> RemotePtr<u8> {
        RemotePtr::<u8>::new_from_val(self.ptr)
    }
}

impl<T> Display for RemotePtr<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{:#x}", self.ptr)
    }
}

impl<T> Add<usize> for RemotePtr<T> {
    type Output = Self;

    fn add(self, delta: usize) -> Self::Output {
        // Will automatically deal with overflow in debug mode.
        Self::new_from_val(self.as_usize() + delta * std::mem::size_of::<T>())
    }
}

impl<T> Sub<usize> for RemotePtr<T> {
    type Output = Self;

    fn sub(self, delta: usize) -> Self::Output {
        // Will automatically deal with underflow in debug mode.
        Self::new_from_val(self.as_usize() - delta * std::mem::size_of::<T>())
    }
}

impl<T> PartialOrd for RemotePtr<T> {
    fn partial_cmp(&self, other: &RemotePtr<T>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for RemotePtr<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ptr.cmp(&other.ptr)
    }
}

impl<T> PartialEq for RemotePtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for RemotePtr<T> {}

impl<T> From<usize> for RemotePtr<T> {
    fn from(addr: usize) -> Self {
        RemotePtr::<T>::new_from_val(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_test() {
        let a = RemotePtr::<u64>::null();
        assert_eq!(0, a.as_usize());
        assert!(a.is_null());
    }

    #[test]
    fn add_test() {
        let a = RemotePtr::<u64>::null();
        let b = a + 1usize;
        assert_eq!(8, b.as_usize());
    }

    #[test]
    fn add_test_with_custom_struct() {
        struct S(u64, u64);
        let a = RemotePtr::<S>::null();
        let b = a + 1usize;
        assert_eq!(16, b.as_usize());
    }

    #[test]
    fn add_sub_test() {
        let a = RemotePtr::<u32>::new_from_val(0x1000);
        let b = a + 3usize;
        let c = b - 3usize;
        assert_eq!(0x100c, b.as_usize());
        assert_eq!(a, c);
    }

    #[test]
    fn cast_test() {
        struct S(u64, u64);
        let a = RemotePtr::<u64>::new_from_val(8);
        let b = RemotePtr::<S>::cast(a);
        assert_eq!(16, b.referent_size());
        assert_eq!(8, a.referent_size());
        assert_eq!(8, b.as_rptr_u8().as_usize());
    }

    #[test]
    fn comparison_and_display() {
        let c = RemotePtr::<u8>::new_from_val(0);
        let d = RemotePtr::<u8>::from(0x10usize);
        assert!(c < d);
        assert!(c != d);
        assert_eq!("0x10", format!("{}", d));
    }
}
