//! Temporary BLOBs that back LOB binds

use crate::{Error, Result, Session, Statement, oci::*};
use libc::c_void;
use std::{cmp, mem, ptr, sync::Arc, panic::{self, AssertUnwindSafe}};

/// Size of the bound value, i.e. of a LOB locator pointer
pub(crate) const LOB_LOCATOR_SIZE : usize = mem::size_of::<*mut OCILobLocator>();

/// Progress of a single LOB slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LobState {
    Unallocated,
    /// Descriptor is allocated
    Allocated,
    /// Temporary LOB is created
    Created,
    /// Data is streamed into the LOB
    Written,
    Freed,
}

/**
    Temporary BLOBs and the parallel arrays OCI reads them from at execution.

    All arrays are heap allocated, so their addresses survive moves of the binder
    between the bind and the statement execution.
*/
#[derive(Default)]
pub(crate) struct LobBinds {
    stmt:     Option<Arc<Statement>>,
    bind:     Ptr<OCIBind>,
    locators: Vec<Ptr<OCILobLocator>>,
    states:   Vec<LobState>,
    nulls:    Vec<i16>,
    lens:     Vec<u32>,
    codes:    Vec<u16>,
    buf:      Vec<u8>,
}

impl Drop for LobBinds {
    fn drop(&mut self) {
        if let Some((_, Err(err))) = self.release() {
            log::warn!("cannot release LOBs of an unclosed bind: {}", err);
        }
    }
}

impl LobBinds {
    pub(crate) fn len(&self) -> usize {
        self.locators.len()
    }

    #[cfg(test)]
    pub(crate) fn locators(&self) -> &[Ptr<OCILobLocator>] {
        &self.locators
    }

    #[cfg(test)]
    pub(crate) fn states(&self) -> &[LobState] {
        &self.states
    }

    pub(crate) fn nulls(&self) -> &[i16] {
        &self.nulls
    }

    pub(crate) fn lens(&self) -> &[u32] {
        &self.lens
    }

    pub(crate) fn codes(&self) -> &[u16] {
        &self.codes
    }

    #[cfg(test)]
    pub(crate) fn buf_len(&self) -> usize {
        self.buf.len()
    }

    /**
        Creates a temporary BLOB for every value and streams non-NULL values into them.

        Input is validated before anything is allocated. When an OCI call fails the LOBs
        that have been allocated so far are kept for `release` to free.
    */
    pub(crate) fn load<B: AsRef<[u8]>>(
        &mut self, values: &[B], null_inds: Option<&[i16]>, position: u32, piece_size: usize, stmt: &Arc<Statement>
    ) -> Result<()> {
        if self.stmt.is_some() {
            return Err( Error::new("bind still holds LOBs of the previous execution") );
        }
        if values.is_empty() {
            return Err( Error::new("cannot bind an empty set of BLOBs") );
        }
        if position == 0 {
            return Err( Error::new("parameter positions start at 1") );
        }
        if piece_size == 0 {
            return Err( Error::new("LOB piece size must be greater than zero") );
        }
        if let Some(nulls) = null_inds {
            if nulls.len() != values.len() {
                return Err( Error::msg(format!("{} NULL indicators for {} values", nulls.len(), values.len())) );
            }
        }
        // OCILobWrite2 cannot write zero bytes, and writing a byte only to erase it is not supported either
        let is_null = |ix: usize| null_inds.map(|nulls| nulls[ix] < 0).unwrap_or(false);
        if values.iter().enumerate().any(|(ix, value)| value.as_ref().is_empty() && !is_null(ix)) {
            return Err( Error::new("writing a zero-length BLOB is unsupported") );
        }

        let count = values.len();
        self.stmt = Some(stmt.clone());
        self.locators.clear();
        self.locators.resize(count, Ptr::null());
        self.states.clear();
        self.states.resize(count, LobState::Unallocated);
        self.nulls.clear();
        match null_inds {
            Some(nulls) => self.nulls.extend_from_slice(nulls),
            None        => self.nulls.resize(count, OCI_IND_NOTNULL),
        }
        self.lens.clear();
        self.lens.resize(count, 0);
        self.codes.clear();
        self.codes.resize(count, 0);
        if self.buf.len() < piece_size {
            self.buf.resize(piece_size, 0);
        }

        let session = stmt.session();
        for (ix, value) in values.iter().enumerate() {
            self.create(ix, session)?;
            if self.nulls[ix] >= 0 {
                let num_pieces = self.write(ix, value.as_ref(), piece_size, session)?;
                log::trace!("position {} element {}: {} bytes in {} piece(s)", position, ix, value.as_ref().len(), num_pieces);
            }
            // locators are bound, so their size is what OCI needs, not the size of the data
            self.lens[ix] = LOB_LOCATOR_SIZE as u32;
        }
        Ok(())
    }

    /// Allocates a LOB descriptor for the slot and creates a temporary BLOB on it.
    fn create(&mut self, ix: usize, session: &Session) -> Result<()> {
        let env = session.env();
        let res = env.api().descriptor_alloc(env.env_ptr(), &mut self.locators[ix], OCI_DTYPE_LOB);
        match res {
            OCI_ERROR => return Err( env.env_error(res) ),
            OCI_INVALID_HANDLE => return Err( Error::new("unable to allocate oci lob handle during bind") ),
            _ => {}
        }
        if self.locators[ix].is_null() {
            return Err( Error::new("unable to allocate oci lob handle during bind") );
        }
        self.states[ix] = LobState::Allocated;

        catch!{env =>
            env.api().lob_create_temporary(
                session.svc_ptr(), env.err_ptr(), self.locators[ix],
                OCI_DEFAULT as u16, SQLCS_IMPLICIT, OCI_TEMP_BLOB, FALSE, OCI_DURATION_SESSION
            )
        };
        self.states[ix] = LobState::Created;
        Ok(())
    }

    /**
        Streams `data` into the slot's LOB in pieces of at most `piece_size` bytes.
        OCI decides when the LOB is complete: it asks for more data with `OCI_NEED_DATA`
        and accepts the final piece with `OCI_SUCCESS`.

        Returns the number of pieces written.
    */
    fn write(&mut self, ix: usize, data: &[u8], piece_size: usize, session: &Session) -> Result<usize> {
        let env = session.env();
        let loc = self.locators[ix];
        let mut remaining = data.len();
        let mut read_ix = 0;
        let mut piece = OCI_FIRST_PIECE;
        let mut num_pieces = 0;
        loop {
            let chunk = cmp::min(remaining, piece_size);
            self.buf[..chunk].copy_from_slice(&data[read_ix..read_ix + chunk]);
            read_ix += chunk;
            remaining = data.len() - read_ix;

            // amount 0 streams the data until OCI_LAST_PIECE
            let mut byte_amt = 0u64;
            let res = catch!{env =>
                env.api().lob_write(
                    session.svc_ptr(), env.err_ptr(), loc,
                    &mut byte_amt, 1, &self.buf[..chunk], piece,
                    0, SQLCS_IMPLICIT
                )
            };
            num_pieces += 1;
            match res {
                OCI_NEED_DATA if piece == OCI_LAST_PIECE => {
                    return Err( Error::msg(format!("OCI requested more data after the last piece of LOB {}", ix)) );
                }
                OCI_NEED_DATA => {
                    piece = if remaining > piece_size { OCI_NEXT_PIECE } else { OCI_LAST_PIECE };
                }
                OCI_SUCCESS | OCI_SUCCESS_WITH_INFO => break,
                _ => {
                    return Err( Error::msg(format!("unexpected OCILobWrite2 result {} for LOB {}", res, ix)) );
                }
            }
        }
        self.states[ix] = LobState::Written;
        Ok(num_pieces)
    }

    /**
        Registers the locators with the statement at `position`. Array binds also
        tell OCI the distance between consecutive elements of each parallel array.
    */
    pub(crate) fn register(&mut self, position: u32, as_array: bool) -> Result<()> {
        let stmt = match self.stmt.as_ref() {
            Some(stmt) => stmt,
            None => return Err( Error::new("there are no LOBs to bind") ),
        };
        let env = stmt.session().env();
        catch!{env =>
            unsafe {
                env.api().bind_by_pos(
                    stmt.stmt_ptr(), &mut self.bind, env.err_ptr(),
                    position, self.locators.as_mut_ptr() as *mut c_void, LOB_LOCATOR_SIZE as i64, SQLT_BLOB,
                    self.nulls.as_mut_ptr() as *mut c_void, self.lens.as_mut_ptr(), self.codes.as_mut_ptr(),
                    0, ptr::null_mut(), OCI_DEFAULT
                )
            }
        };
        if as_array {
            catch!{env =>
                env.api().bind_array_of_struct(
                    self.bind, env.err_ptr(),
                    LOB_LOCATOR_SIZE as u32,
                    mem::size_of::<i16>() as u32,
                    mem::size_of::<u32>() as u32,
                    mem::size_of::<u16>() as u32
                )
            };
        }
        log::debug!("bound {} BLOB(s) at position {}", self.locators.len(), position);
        Ok(())
    }

    /**
        Frees every temporary LOB and LOB descriptor the slots hold. Keeps going when
        a call fails or panics and reports all faults at the end.

        Returns `None` when nothing was bound, otherwise the statement the LOBs were
        bound to and the outcome of the cleanup.
    */
    pub(crate) fn release(&mut self) -> Option<(Arc<Statement>, Result<()>)> {
        let stmt = self.stmt.take()?;
        let session = stmt.session();
        let env = session.env();
        let mut errors = Vec::new();
        let mut num_freed = 0;
        for (loc, state) in self.locators.iter_mut().zip(self.states.iter_mut()) {
            if matches!(state, LobState::Created | LobState::Written) {
                let res = guard("OCILobFreeTemporary", || {
                    let res = env.api().lob_free_temporary(session.svc_ptr(), env.err_ptr(), *loc);
                    check(res, || env.error(res))
                });
                if let Err(err) = res {
                    errors.push(err);
                }
            }
            if matches!(state, LobState::Allocated | LobState::Created | LobState::Written) {
                let res = guard("OCIDescriptorFree", || {
                    let res = env.api().descriptor_free(*loc, OCI_DTYPE_LOB);
                    check(res, || env.env_error(res))
                });
                if let Err(err) = res {
                    errors.push(err);
                }
                num_freed += 1;
            }
            *loc = Ptr::null();
            *state = LobState::Freed;
        }
        log::debug!("released {} BLOB(s) with {} error(s)", num_freed, errors.len());
        self.bind = Ptr::null();
        self.locators.clear();
        self.states.clear();
        self.nulls.clear();
        self.lens.clear();
        self.codes.clear();
        Some((stmt, Error::collect(errors)))
    }
}

fn check(res: i32, error: impl FnOnce() -> Error) -> Result<()> {
    match res {
        OCI_ERROR | OCI_INVALID_HANDLE => Err( error() ),
        _ => Ok(())
    }
}

/// Runs an OCI call, including the lookup of its error, and turns a panic raised by either into an error.
fn guard(func: &str, call: impl FnOnce() -> Result<()>) -> Result<()> {
    panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|cause| {
        let reason = cause.downcast_ref::<&str>().map(|msg| msg.to_string())
            .or_else(|| cause.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| String::from("unknown cause"));
        Err( Error::msg(format!("{} panicked: {}", func, reason)) )
    })
}
