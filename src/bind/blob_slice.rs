//! Array bind of BLOBs

use super::{Bind, BindKind, lobs::LobBinds, normalize};
use crate::{Result, Statement};
use std::{mem, sync::Arc};

/**
    Binds a slice of binary values, some of which may be NULL, as an array of
    temporary BLOBs to a single parameter placeholder.

    Each non-NULL value is streamed into its own temporary BLOB in pieces of at
    most `piece_size` bytes. A pooled binder may keep a larger scratch buffer from
    an earlier bind; that does not make the pieces larger. The binder then owns the
    LOB locators and the arrays OCI reads during the execution of the statement.
    They must outlive the execution and are released by `close`.

    # Example

    ```no_run
    # #[cfg(feature="oci")]
    # fn main() -> lobslice::Result<()> {
    use std::sync::Arc;
    use lobslice::{Bind, BlobSliceBind, Environment, Session, Statement};

    # let dbname = std::env::var("DBNAME").unwrap();
    # let dbuser = std::env::var("DBUSER").unwrap();
    # let dbpass = std::env::var("DBPASS").unwrap();
    let oracle = Arc::new(Environment::new()?);
    let session = Arc::new(Session::connect(oracle, &dbname, &dbuser, &dbpass)?);
    let stmt = Arc::new(Statement::prepare(session, "INSERT INTO test_blobs (id, data) VALUES (:id, :data)")?);

    let photos = [ Some(&b"\x89PNG"[..]), None ];
    let mut bind : BlobSliceBind = stmt.get_bind();
    bind.bind_values(&photos, 2, stmt.lob_piece_size(), &stmt)?;
    # bind.close()?;
    # Ok(())
    # }
    # #[cfg(not(feature="oci"))]
    # fn main() {}
    ```
*/
#[derive(Default)]
pub struct BlobSliceBind(LobBinds);

impl BlobSliceBind {
    /**
        Streams optional values into temporary BLOBs and binds them as an array at
        `position` (1-based). `None` values are bound as NULLs.
    */
    pub fn bind_values<B: AsRef<[u8]>>(
        &mut self, values: &[Option<B>], position: u32, piece_size: usize, stmt: &Arc<Statement>
    ) -> Result<()> {
        let (data, nulls) = normalize(values);
        self.bind(&data, Some(&nulls), position, piece_size, stmt)
    }

    /**
        Streams `values` into temporary BLOBs and binds them as an array at `position`.

        `null_inds`, when provided, must have an indicator for every value. Values with
        a negative indicator are bound as NULLs and their bytes are ignored.

        When an OCI call fails the LOBs created so far stay with the binder until it
        is closed.
    */
    pub fn bind<B: AsRef<[u8]>>(
        &mut self, values: &[B], null_inds: Option<&[i16]>, position: u32, piece_size: usize, stmt: &Arc<Statement>
    ) -> Result<()> {
        self.0.load(values, null_inds, position, piece_size, stmt)?;
        self.0.register(position, true)
    }

    /// Returns the number of bound values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.len() == 0
    }

    /// Returns NULL indicators of the bound values.
    pub fn indicators(&self) -> &[i16] {
        self.0.nulls()
    }

    /// Returns actual lengths of the bound values, which for LOBs is the size of a locator.
    pub fn lengths(&self) -> &[u32] {
        self.0.lens()
    }

    /// Returns per-element return codes OCI reported for the last execution.
    pub fn status_codes(&self) -> &[u16] {
        self.0.codes()
    }
}

impl Bind for BlobSliceBind {
    const KIND: BindKind = BindKind::BlobSlice;

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

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::lobs::{LobState, LOB_LOCATOR_SIZE};
    use crate::{Error, oci::*, test::{self, Script, TestOci, ORA_FAILURE}};

    const KB : usize = 1024;

    fn payload(len: usize, seed: u8) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
    }

    #[test]
    fn mixed_rows() -> Result<()> {
        let oci = TestOci::new(64 * KB);
        let stmt = test::statement(&oci, 64 * KB);
        let photo = payload(100 * KB, 7);
        let rows = [ Some(photo.clone()), None, Some(vec![1u8, 2, 3]) ];

        let mut bind = stmt.bind_blobs(3, &rows)?;
        assert_eq!(bind.len(), 3);
        assert_eq!(bind.indicators(), &[OCI_IND_NOTNULL, OCI_IND_NULL, OCI_IND_NOTNULL]);
        assert_eq!(bind.lengths(), &[LOB_LOCATOR_SIZE as u32; 3]);
        assert_eq!(bind.status_codes(), &[0u16; 3]);
        assert_eq!(bind.0.states(), &[LobState::Written, LobState::Created, LobState::Written]);
        {
            let calls = oci.calls();
            assert_eq!(calls.allocated, vec![0, 1, 2]);
            assert_eq!(calls.created, vec![0, 1, 2]);

            let pieces = calls.pieces_of(0);
            assert_eq!(pieces.len(), 2);
            assert_eq!((pieces[0].piece, pieces[0].data.len()), (OCI_FIRST_PIECE, 64 * KB));
            assert_eq!((pieces[1].piece, pieces[1].data.len()), (OCI_LAST_PIECE, 36 * KB));
            assert!(pieces.iter().all(|piece| piece.offset == 1 && piece.amount == 0));
            assert_eq!(calls.data_of(0), photo);

            assert!(calls.pieces_of(1).is_empty());

            let pieces = calls.pieces_of(2);
            assert_eq!(pieces.len(), 1);
            assert_eq!(pieces[0].piece, OCI_FIRST_PIECE);
            assert_eq!(pieces[0].data, vec![1u8, 2, 3]);

            assert_eq!(calls.binds.len(), 1);
            let call = &calls.binds[0];
            assert_eq!(call.position, 3);
            assert_eq!(call.dty, SQLT_BLOB);
            assert_eq!(call.value_sz, LOB_LOCATOR_SIZE as i64);
            assert_eq!(call.maxarr_len, 0);
            assert_eq!(call.valuep, bind.0.locators().as_ptr() as usize);
            assert_eq!(call.indp,   bind.indicators().as_ptr() as usize);
            assert_eq!(call.alenp,  bind.lengths().as_ptr() as usize);
            assert_eq!(call.rcodep, bind.status_codes().as_ptr() as usize);
            assert_eq!(calls.strides, vec![(LOB_LOCATOR_SIZE as u32, 2, 4, 2)]);
        }

        bind.set_ptr()?;
        bind.close()?;
        let calls = oci.calls();
        assert_eq!(calls.freed_temps, vec![0, 1, 2]);
        assert_eq!(calls.freed_descs, vec![0, 1, 2]);
        Ok(())
    }

    #[test]
    fn piece_sequence() -> Result<()> {
        const PIECE : usize = 16;
        // a value of exactly one piece is the only case that needs an extra, empty, last piece
        for len in (1..PIECE).chain(PIECE + 1..6 * PIECE + 3) {
            let oci = TestOci::new(PIECE);
            let stmt = test::statement(&oci, PIECE);
            let data = payload(len, len as u8);
            let mut bind : BlobSliceBind = stmt.get_bind();
            bind.bind(&[&data], None, 1, PIECE, &stmt)?;

            let calls = oci.calls();
            let pieces = calls.pieces_of(0);
            let num_pieces = (len + PIECE - 1) / PIECE;
            assert_eq!(pieces.len(), num_pieces, "length {}", len);
            assert_eq!(pieces[0].piece, OCI_FIRST_PIECE);
            if num_pieces > 1 {
                assert!(pieces[1..num_pieces - 1].iter().all(|piece| piece.piece == OCI_NEXT_PIECE));
                assert_eq!(pieces[num_pieces - 1].piece, OCI_LAST_PIECE);
            }
            assert!(pieces.iter().all(|piece| piece.data.len() <= PIECE));
            assert_eq!(calls.data_of(0), data);
            drop(calls);
            bind.close()?;
        }
        Ok(())
    }

    #[test]
    fn single_full_piece() -> Result<()> {
        let oci = TestOci::new(8);
        let stmt = test::statement(&oci, 8);
        let data = payload(8, 0);
        let mut bind = stmt.bind_blobs(1, &[Some(&data)])?;
        {
            let calls = oci.calls();
            let pieces : Vec<_> = calls.pieces.iter().map(|piece| (piece.piece, piece.data.len())).collect();
            assert_eq!(pieces, vec![(OCI_FIRST_PIECE, 8), (OCI_LAST_PIECE, 0)]);
            assert_eq!(calls.data_of(0), data);
        }
        bind.close()
    }

    #[test]
    fn zero_length_value() {
        let oci = TestOci::new(16);
        let stmt = test::statement(&oci, 16);
        let rows = [ Some(vec![1u8]), Some(Vec::new()) ];
        let res = stmt.bind_blobs(1, &rows);
        assert_eq!(res.err(), Some(Error::new("writing a zero-length BLOB is unsupported")));
        let calls = oci.calls();
        assert!(calls.allocated.is_empty());
        assert!(calls.pieces.is_empty());
    }

    #[test]
    fn empty_null_value() -> Result<()> {
        let oci = TestOci::new(16);
        let stmt = test::statement(&oci, 16);
        let mut bind : BlobSliceBind = stmt.get_bind();
        bind.bind(&[&b""[..], &b"abc"[..]], Some(&[OCI_IND_NULL, OCI_IND_NOTNULL]), 1, 16, &stmt)?;
        assert_eq!(oci.calls().pieces.len(), 1);
        bind.close()
    }

    #[test]
    fn invalid_input() {
        let oci = TestOci::new(16);
        let stmt = test::statement(&oci, 16);
        let mut bind = BlobSliceBind::default();
        let data = [ &b"abc"[..] ];

        let no_rows : [Option<Vec<u8>>; 0] = [];
        assert_eq!(bind.bind_values(&no_rows, 1, 16, &stmt), Err(Error::new("cannot bind an empty set of BLOBs")));
        assert_eq!(bind.bind(&data, None, 0, 16, &stmt), Err(Error::new("parameter positions start at 1")));
        assert_eq!(bind.bind(&data, None, 1, 0, &stmt), Err(Error::new("LOB piece size must be greater than zero")));
        assert_eq!(
            bind.bind(&data, Some(&[0, 0]), 1, 16, &stmt),
            Err(Error::new("2 NULL indicators for 1 values"))
        );
        assert!(oci.calls().allocated.is_empty());
        assert_eq!(bind.close(), Ok(()));
    }

    #[test]
    fn rebind_before_close() -> Result<()> {
        let oci = TestOci::new(16);
        let stmt = test::statement(&oci, 16);
        let mut bind = stmt.bind_blobs(1, &[Some(b"abc")])?;
        let res = bind.bind_values(&[Some(b"def")], 1, 16, &stmt);
        assert_eq!(res, Err(Error::new("bind still holds LOBs of the previous execution")));
        assert_eq!(oci.calls().allocated.len(), 1);
        bind.close()
    }

    #[test]
    fn double_close() -> Result<()> {
        let oci = TestOci::new(16);
        let stmt = test::statement(&oci, 16);
        let mut bind = stmt.bind_blobs(1, &[Some(b"abc"), None])?;
        bind.close()?;
        bind.close()?;
        assert!(bind.is_empty());
        let calls = oci.calls();
        assert_eq!(calls.freed_temps, vec![0, 1]);
        assert_eq!(calls.freed_descs, vec![0, 1]);
        drop(calls);
        assert_eq!(stmt.binds_idle(BindKind::BlobSlice), 1);
        Ok(())
    }

    #[test]
    fn failed_allocation() -> Result<()> {
        let oci = TestOci::with_script(16, Script { fail_alloc: Some(1), ..Script::default() });
        let stmt = test::statement(&oci, 16);
        let mut bind : BlobSliceBind = stmt.get_bind();
        let res = bind.bind_values(&[Some(b"abc"), Some(b"def"), Some(b"ghi")], 1, 16, &stmt);
        match res {
            Err(Error::Oracle(code, msg)) => {
                assert_eq!(code, ORA_FAILURE);
                assert!(msg.contains("environment"));
            }
            _ => panic!("unexpected result {:?}", res)
        }
        assert_eq!(bind.0.states(), &[LobState::Written, LobState::Unallocated, LobState::Unallocated]);
        {
            let calls = oci.calls();
            assert_eq!(calls.allocated, vec![0]);
            assert!(calls.binds.is_empty());
            assert!(calls.freed_descs.is_empty());
        }
        bind.close()?;
        let calls = oci.calls();
        assert_eq!(calls.freed_temps, vec![0]);
        assert_eq!(calls.freed_descs, vec![0]);
        Ok(())
    }

    #[test]
    fn invalid_handle_allocation() {
        let oci = TestOci::with_script(16, Script { invalid_alloc: Some(0), ..Script::default() });
        let stmt = test::statement(&oci, 16);
        let res = stmt.bind_blobs(1, &[Some(b"abc")]);
        assert_eq!(res.err(), Some(Error::new("unable to allocate oci lob handle during bind")));
        assert_eq!(stmt.binds_idle(BindKind::BlobSlice), 1);
    }

    #[test]
    fn failed_creation() {
        let oci = TestOci::with_script(16, Script { fail_create: Some(1), ..Script::default() });
        let stmt = test::statement(&oci, 16);
        let res = stmt.bind_blobs(1, &[None, Some(b"abc")]);
        match res {
            Err(Error::Oracle(code, msg)) => {
                assert_eq!(code, ORA_FAILURE);
                assert!(msg.contains("error handle"));
            }
            _ => panic!("unexpected result {:?}", res.map(|bind| bind.len()))
        }
        // second LOB has a descriptor but no temporary LOB
        let calls = oci.calls();
        assert_eq!(calls.freed_temps, vec![0]);
        assert_eq!(calls.freed_descs, vec![0, 1]);
    }

    #[test]
    fn failed_write() {
        let oci = TestOci::with_script(4, Script { fail_write: Some(2), ..Script::default() });
        let stmt = test::statement(&oci, 4);
        let res = stmt.bind_blobs(1, &[Some(payload(10, 1))]);
        assert!(matches!(res, Err(Error::Oracle(ORA_FAILURE, _))));
        let calls = oci.calls();
        assert_eq!(calls.pieces.len(), 2);
        assert_eq!(calls.freed_temps, vec![0]);
        assert_eq!(calls.freed_descs, vec![0]);
    }

    #[test]
    fn endless_stream() {
        let oci = TestOci::with_script(4, Script { always_need_data: true, ..Script::default() });
        let stmt = test::statement(&oci, 4);
        let res = stmt.bind_blobs(1, &[Some(payload(10, 1))]);
        assert_eq!(res.err(), Some(Error::new("OCI requested more data after the last piece of LOB 0")));
        let calls = oci.calls();
        let pieces : Vec<_> = calls.pieces.iter().map(|piece| piece.piece).collect();
        assert_eq!(pieces, vec![OCI_FIRST_PIECE, OCI_NEXT_PIECE, OCI_LAST_PIECE]);
        assert_eq!(calls.freed_descs, vec![0]);
    }

    #[test]
    fn failed_registration() {
        let oci = TestOci::with_script(16, Script { fail_bind: true, ..Script::default() });
        let stmt = test::statement(&oci, 16);
        let res = stmt.bind_blobs(1, &[Some(b"abc"), Some(b"def")]);
        assert!(matches!(res, Err(Error::Oracle(ORA_FAILURE, _))));
        let calls = oci.calls();
        assert!(calls.strides.is_empty());
        assert_eq!(calls.freed_descs, vec![0, 1]);

        let oci = TestOci::with_script(16, Script { fail_array_of_struct: true, ..Script::default() });
        let stmt = test::statement(&oci, 16);
        let res = stmt.bind_blobs(1, &[Some(b"abc"), Some(b"def")]);
        assert!(matches!(res, Err(Error::Oracle(ORA_FAILURE, _))));
        let calls = oci.calls();
        assert_eq!(calls.binds.len(), 1);
        assert_eq!(calls.freed_descs, vec![0, 1]);
    }

    #[test]
    fn panic_during_close() -> Result<()> {
        let oci = TestOci::with_script(16, Script { panic_on_free: vec![1].into_iter().collect(), ..Script::default() });
        let stmt = test::statement(&oci, 16);
        let mut bind = stmt.bind_blobs(1, &[Some(b"abc"), Some(b"def"), Some(b"ghi")])?;
        let res = bind.close();
        assert_eq!(res, Err(Error::new("OCILobFreeTemporary panicked: LOB 1 is corrupted")));
        {
            let calls = oci.calls();
            assert_eq!(calls.freed_temps, vec![0, 2]);
            assert_eq!(calls.freed_descs, vec![0, 1, 2]);
        }
        assert_eq!(bind.close(), Ok(()));

        let pooled : BlobSliceBind = stmt.get_bind();
        assert!(pooled.is_empty());
        assert_eq!(pooled.0.buf_len(), 16);
        Ok(())
    }

    #[test]
    fn failures_during_close() -> Result<()> {
        let script = Script {
            panic_on_free: vec![0].into_iter().collect(),
            fail_free: vec![2].into_iter().collect(),
            ..Script::default()
        };
        let oci = TestOci::with_script(16, script);
        let stmt = test::statement(&oci, 16);
        let mut bind = stmt.bind_blobs(1, &[Some(b"abc"), Some(b"def"), Some(b"ghi")])?;
        match bind.close() {
            Err(Error::Cleanup(errors)) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0], Error::new("OCILobFreeTemporary panicked: LOB 0 is corrupted"));
                assert_eq!(errors[1], Error::Oracle(ORA_FAILURE, String::new()));
            }
            res => panic!("unexpected result {:?}", res)
        }
        let calls = oci.calls();
        assert_eq!(calls.freed_temps, vec![1]);
        assert_eq!(calls.freed_descs, vec![0, 1, 2]);
        Ok(())
    }

    #[test]
    fn pooled_binder_reuse() -> Result<()> {
        let oci = TestOci::new(8);
        let mut stmt = test::statement(&oci, 32);
        let mut bind = stmt.bind_blobs(1, &[Some(payload(100, 0))])?;
        bind.close()?;
        drop(bind);

        // a smaller piece size reuses the larger buffer, which never shrinks
        Arc::get_mut(&mut stmt).expect("statement is not shared").set_lob_piece_size(8);
        let mut bind = stmt.bind_blobs(2, &[Some(payload(20, 1)), None])?;
        assert_eq!(stmt.binds_idle(BindKind::BlobSlice), 0);
        assert_eq!(bind.0.buf_len(), 32);
        {
            let calls = oci.calls();
            assert_eq!(calls.pieces_of(1).len(), 3);
            assert!(calls.pieces_of(1).iter().all(|piece| piece.data.len() <= 8));
            assert_eq!(calls.binds[1].position, 2);
        }
        bind.close()?;
        assert_eq!(stmt.binds_idle(BindKind::BlobSlice), 1);
        Ok(())
    }

    #[test]
    fn drop_releases_lobs() -> Result<()> {
        let oci = TestOci::new(16);
        let stmt = test::statement(&oci, 16);
        let bind = stmt.bind_blobs(1, &[Some(b"abc"), None])?;
        drop(bind);
        let calls = oci.calls();
        assert_eq!(calls.freed_temps, vec![0, 1]);
        assert_eq!(calls.freed_descs, vec![0, 1]);
        drop(calls);
        assert_eq!(stmt.binds_idle(BindKind::BlobSlice), 0);
        Ok(())
    }

    #[test]
    fn drop_after_failed_free() -> Result<()> {
        let oci = TestOci::with_script(16, Script { fail_free: vec![1].into_iter().collect(), ..Script::default() });
        let stmt = test::statement(&oci, 16);
        let bind = stmt.bind_blobs(1, &[Some(b"abc"), Some(b"def"), None])?;
        drop(bind);
        let calls = oci.calls();
        assert_eq!(calls.freed_temps, vec![0, 2]);
        assert_eq!(calls.freed_descs, vec![0, 1, 2]);
        drop(calls);
        assert_eq!(stmt.binds_idle(BindKind::BlobSlice), 0);
        Ok(())
    }

    #[test]
    fn panic_while_reading_error() -> Result<()> {
        let script = Script {
            fail_free: vec![0].into_iter().collect(),
            panic_on_error_get: true,
            ..Script::default()
        };
        let oci = TestOci::with_script(16, script);
        let stmt = test::statement(&oci, 16);
        let mut bind = stmt.bind_blobs(1, &[Some(b"abc"), Some(b"def"), Some(b"ghi")])?;
        let res = bind.close();
        assert_eq!(res, Err(Error::new("OCILobFreeTemporary panicked: error record is unreadable")));
        {
            let calls = oci.calls();
            assert_eq!(calls.freed_temps, vec![1, 2]);
            assert_eq!(calls.freed_descs, vec![0, 1, 2]);
        }
        assert_eq!(stmt.binds_idle(BindKind::BlobSlice), 1);
        Ok(())
    }

    #[test]
    fn null_descriptor() {
        let oci = TestOci::with_script(16, Script { null_alloc: Some(1), ..Script::default() });
        let stmt = test::statement(&oci, 16);
        let res = stmt.bind_blobs(1, &[Some(b"abc"), Some(b"def")]);
        assert_eq!(res.err(), Some(Error::new("unable to allocate oci lob handle during bind")));
        let calls = oci.calls();
        assert_eq!(calls.freed_temps, vec![0]);
        assert_eq!(calls.freed_descs, vec![0]);
        drop(calls);
        assert_eq!(stmt.binds_idle(BindKind::BlobSlice), 1);
    }

    #[test]
    fn write_completed_with_info() -> Result<()> {
        let oci = TestOci::with_script(4, Script { write_done: Some(OCI_SUCCESS_WITH_INFO), ..Script::default() });
        let stmt = test::statement(&oci, 4);
        let data = payload(10, 3);
        let mut bind = stmt.bind_blobs(1, &[Some(&data), None])?;
        assert_eq!(bind.0.states(), &[LobState::Written, LobState::Created]);
        {
            let calls = oci.calls();
            let pieces : Vec<_> = calls.pieces.iter().map(|piece| piece.piece).collect();
            assert_eq!(pieces, vec![OCI_FIRST_PIECE, OCI_NEXT_PIECE, OCI_LAST_PIECE]);
            assert_eq!(calls.data_of(0), data);
            assert_eq!(calls.binds.len(), 1);
        }
        bind.close()
    }

    #[test]
    fn unexpected_write_result() {
        let oci = TestOci::with_script(4, Script { write_done: Some(OCI_NO_DATA), ..Script::default() });
        let stmt = test::statement(&oci, 4);
        let res = stmt.bind_blobs(1, &[Some(b"abc")]);
        assert_eq!(res.err(), Some(Error::new("unexpected OCILobWrite2 result 100 for LOB 0")));
        let calls = oci.calls();
        assert_eq!(calls.pieces.len(), 1);
        assert!(calls.binds.is_empty());
        assert_eq!(calls.freed_temps, vec![0]);
        assert_eq!(calls.freed_descs, vec![0]);
    }
}
