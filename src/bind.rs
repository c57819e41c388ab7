//! Binding of BLOB parameters

mod lobs;
mod blob;
mod blob_slice;

pub use blob::BlobBind;
pub use blob_slice::BlobSliceBind;

use crate::{Result, oci::*};
use std::{any::Any, collections::HashMap};

/// Identifies the kind of a binder. Idle binders are pooled per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindKind {
    /// A single BLOB
    Blob,
    /// An array of BLOBs
    BlobSlice,
}

/// Common interface of binders.
pub trait Bind: Default + Send + 'static {
    /// The key the binder's idle instances are pooled under
    const KIND: BindKind;

    /// Refreshes pointers that were passed to OCI before the statement is executed.
    fn set_ptr(&mut self) -> Result<()>;

    /**
        Releases the native resources held by the binder and returns it to the
        statement's pool. Closing an already closed binder does nothing.
    */
    fn close(&mut self) -> Result<()>;
}

/// Idle binders of a statement
#[derive(Default)]
pub(crate) struct BindPool {
    idle: HashMap<BindKind, Vec<Box<dyn Any + Send>>>,
}

impl BindPool {
    pub(crate) fn get<T: Bind>(&mut self) -> T {
        let reused = self.idle
            .get_mut(&T::KIND)
            .and_then(|binds| binds.pop())
            .and_then(|bind| bind.downcast::<T>().ok());
        match reused {
            Some(bind) => {
                log::trace!("reusing pooled {:?} binder", T::KIND);
                *bind
            }
            None => T::default()
        }
    }

    pub(crate) fn put<T: Bind>(&mut self, bind: T) {
        self.idle.entry(T::KIND).or_default().push(Box::new(bind));
    }

    #[cfg(test)]
    pub(crate) fn idle_count(&self, kind: BindKind) -> usize {
        self.idle.get(&kind).map(|binds| binds.len()).unwrap_or_default()
    }
}

/// Splits optional values into their bytes and NULL indicators.
pub(crate) fn normalize<B: AsRef<[u8]>>(values: &[Option<B>]) -> (Vec<&[u8]>, Vec<i16>) {
    let mut data  = Vec::with_capacity(values.len());
    let mut nulls = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Some(bytes) => {
                data.push(bytes.as_ref());
                nulls.push(OCI_IND_NOTNULL);
            }
            None => {
                data.push(&[][..]);
                nulls.push(OCI_IND_NULL);
            }
        }
    }
    (data, nulls)
}
