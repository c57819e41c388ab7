//! Scalar bind of a BLOB

use super::{Bind, BindKind, lobs::LobBinds};
use crate::{Result, Statement, oci::*};
use std::{mem, sync::Arc};

/// Binds a single binary value, streamed into a temporary BLOB, to a parameter placeholder.
#[derive(Default)]
pub struct BlobBind(LobBinds);

impl BlobBind {
    /// Streams `value` into a temporary BLOB and binds it at `position`. `None` binds a NULL.
    pub fn bind_value(&mut self, value: Option<&[u8]>, position: u32, piece_size: usize, stmt: &Arc<Statement>) -> Result<()> {
        match value {
            Some(data) => self.bind(data, OCI_IND_NOTNULL, position, piece_size, stmt),
            None       => self.bind(&[], OCI_IND_NULL, position, piece_size, stmt),
        }
    }

    /// Streams `value` into a temporary BLOB and binds it at `position`. A negative `null_ind` binds a NULL.
    pub fn bind(&mut self, value: &[u8], null_ind: i16, position: u32, piece_size: usize, stmt: &Arc<Statement>) -> Result<()> {
        self.0.load(&[value], Some(&[null_ind]), position, piece_size, stmt)?;
        self.0.register(position, false)
    }

    /// Returns `true` when the bound value is NULL.
    pub fn is_null(&self) -> bool {
        self.0.nulls().first().map(|&ind| ind < 0).unwrap_or(true)
    }

    pub fn status_code(&self) -> Option<u16> {
        self.0.codes().first().copied()
    }
}

impl Bind for BlobBind {
    const KIND: BindKind = BindKind::Blob;

    fn set_ptr(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        match self.0.release() {
            None => Ok(()),
            Some((stmt, res)) => {
                stmt.put_bind(mem::take(self));
                res
            }
        }
    }
}
