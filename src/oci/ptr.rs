//! Send-able pointers to OCI handles and descriptors

use std::{fmt, ptr};

use super::OCIStruct;

/**
    Send-able cell-like wrapper around a pointer to OCI handle or descriptor.

    `Ptr` has the same layout as the raw pointer it wraps, thus a slice of
    `Ptr<OCILobLocator>` can be handed to OCI as an array of `OCILobLocator*`.
*/
#[repr(transparent)]
pub struct Ptr<T: OCIStruct> {
    value: *mut T
}

impl<T: OCIStruct> Ptr<T> {
    pub fn new(ptr: *mut T) -> Self {
        Self{ value: ptr }
    }

    pub fn null() -> Self {
        Self{ value: ptr::null_mut() }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn get(&self) -> *mut T {
        self.value
    }

    pub fn as_mut_ptr(&mut self) -> *mut *mut T {
        &mut self.value as *mut *mut T
    }
}

impl<T: OCIStruct> Clone for Ptr<T> {
    fn clone(&self) -> Self {
        Self { value: self.value }
    }
}

impl<T: OCIStruct> Copy for Ptr<T> {}

impl<T: OCIStruct> Default for Ptr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: OCIStruct> PartialEq for Ptr<T> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.value, other.value)
    }
}

impl<T: OCIStruct> Eq for Ptr<T> {}

impl<T: OCIStruct> fmt::Debug for Ptr<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:p}", self.value)
    }
}

unsafe impl<T: OCIStruct> Send for Ptr<T> {}
unsafe impl<T: OCIStruct> Sync for Ptr<T> {}
