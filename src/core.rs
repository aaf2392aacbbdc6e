//! Raw byte views of the `#[repr(C)]` ABI structures.

use memchr::memchr;
use std::{
    any::TypeId,
    collections::HashMap,
    mem::{size_of, zeroed},
    ptr::copy_nonoverlapping,
    slice,
    sync::Mutex,
};

lazy_static! {
    static ref CHECK_TYPE_FOR_HOLES: Mutex<HashMap<TypeId, bool>> = Mutex::new(HashMap::new());
}

fn return_dummy_value<T>() -> T {
    let mut v: T = unsafe { zeroed() };
    let buf: Vec<u8> = vec![1u8; size_of::<T>()];
    unsafe {
        copy_nonoverlapping(buf.as_ptr(), &mut v as *mut T as *mut u8, size_of::<T>());
    }
    v
}

pub fn check_type_has_no_holes<T>() -> bool {
    let mut v: T = unsafe { zeroed() };
    let buf: Vec<u8> = vec![2u8; size_of::<T>()];
    unsafe {
        copy_nonoverlapping(buf.as_ptr(), &mut v as *mut T as *mut u8, size_of::<T>());
    }
    v = return_dummy_value::<T>();

    let s = unsafe { slice::from_raw_parts(&v as *const T as *const u8, size_of::<T>()) };
    memchr(2, s).is_none()
}

/// Returns true when type T has no holes.
/// This is not 100% reliable since the copy may be compiled to also copy the
/// holes, so it can only ever catch a layout bug, not prove its absence.
pub fn type_has_no_holes<T: 'static>() -> bool {
    let mut map = match CHECK_TYPE_FOR_HOLES.lock() {
        Ok(map) => map,
        Err(poisoned) => poisoned.into_inner(),
    };
    match map.get(&TypeId::of::<T>()) {
        Some(no_holes) => *no_holes,
        None => {
            let result = check_type_has_no_holes::<T>();
            map.insert(TypeId::of::<T>(), result);
            result
        }
    }
}

/// View a plain-old-data ABI value as the bytes the guest would see.
///
/// Only use this with `#[repr(C)]` types whose padding is explicit.
pub fn as_bytes<T: Copy + 'static>(val: &T) -> &[u8] {
    debug_assert!(type_has_no_holes::<T>());
    unsafe { slice::from_raw_parts(val as *const T as *const u8, size_of::<T>()) }
}

/// Decode a plain-old-data ABI value from the start of `bytes`.
/// Returns None when `bytes` is too short.
pub fn from_bytes<T: Copy + 'static>(bytes: &[u8]) -> Option<T> {
    if bytes.len() < size_of::<T>() {
        return None;
    }
    let mut v: T = unsafe { zeroed() };
    unsafe {
        copy_nonoverlapping(bytes.as_ptr(), &mut v as *mut T as *mut u8, size_of::<T>());
    }
    Some(v)
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Copy, Clone)]
    #[repr(C)]
    struct S2 {
        a: u32,
        b: u32,
    }

    #[derive(Copy, Clone, Debug, PartialEq)]
    #[repr(C)]
    struct S3 {
        a: u16,
        b: u16,
        c: u32,
    }

    #[test]
    fn check_for_holes() {
        assert!(check_type_has_no_holes::<S2>());
        assert!(check_type_has_no_holes::<S3>());
    }

    #[test]
    fn cached_check_for_holes() {
        assert!(type_has_no_holes::<S2>());
        assert!(type_has_no_holes::<S2>());
    }

    #[test]
    fn bytes_roundtrip() {
        let s = S3 {
            a: 0x0201,
            b: 0x0403,
            c: 0x0807_0605,
        };
        let bytes = as_bytes(&s);
        assert_eq!(&[1, 2, 3, 4, 5, 6, 7, 8], bytes);
        assert_eq!(Some(s), from_bytes::<S3>(bytes));
    }

    #[test]
    fn from_short_buffer() {
        assert_eq!(None, from_bytes::<S3>(&[1, 2, 3]));
    }
}
