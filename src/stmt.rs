//! SQL statement that LOBs are bound to

use crate::{Result, Session, bind::{Bind, BindPool, BlobBind, BlobSliceBind}, oci::*};
use parking_lot::Mutex;
use std::{fmt, sync::Arc};

/// Default size of the pieces BLOB data is streamed in
pub const DEFAULT_LOB_PIECE_SIZE : usize = 64 * 1024;

/// Represents a prepared SQL statement.
pub struct Statement {
    session: Arc<Session>,
    stmt: Ptr<OCIStmt>,
    binds: Mutex<BindPool>,
    lob_piece_size: usize,
    #[cfg_attr(not(feature="oci"), allow(dead_code))]
    owned: bool,
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Statement")
            .field("stmt", &self.stmt)
            .field("lob_piece_size", &self.lob_piece_size)
            .finish()
    }
}

impl Statement {
    /**
        Wraps an existing statement handle.

        # Safety

        `stmt` must be a valid statement handle prepared in the session and must
        outlive the returned statement. It is not released when the statement is dropped.
    */
    pub unsafe fn from_raw(session: Arc<Session>, stmt: *mut OCIStmt) -> Self {
        Self::make(session, Ptr::new(stmt), false)
    }

    fn make(session: Arc<Session>, stmt: Ptr<OCIStmt>, owned: bool) -> Self {
        Self { session, stmt, binds: Mutex::new(BindPool::default()), lob_piece_size: DEFAULT_LOB_PIECE_SIZE, owned }
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn stmt_ptr(&self) -> Ptr<OCIStmt> {
        self.stmt
    }

    /// Returns the size of the pieces `bind_blob` and `bind_blobs` stream LOB data in.
    pub fn lob_piece_size(&self) -> usize {
        self.lob_piece_size
    }

    /**
        Sets the size of the pieces `bind_blob` and `bind_blobs` stream LOB data in.
        This is also the size of the binder's scratch buffer.
    */
    pub fn set_lob_piece_size(&mut self, size: usize) {
        self.lob_piece_size = size;
    }

    /// Takes an idle binder of the requested kind from the statement's pool or creates a new one.
    pub fn get_bind<T: Bind>(&self) -> T {
        self.binds.lock().get()
    }

    /// Returns a closed binder to the statement's pool.
    pub(crate) fn put_bind<T: Bind>(&self, bind: T) {
        self.binds.lock().put(bind);
    }

    #[cfg(test)]
    pub(crate) fn binds_idle(&self, kind: crate::BindKind) -> usize {
        self.binds.lock().idle_count(kind)
    }

    /**
        Streams `values` into temporary BLOBs and binds them as an array to the parameter
        placeholder at `position` (1-based).

        The returned binder must be kept until the statement is executed and then closed.
        When binding fails, the LOBs that were created before the failure are released.
    */
    pub fn bind_blobs<B: AsRef<[u8]>>(self: &Arc<Self>, position: u32, values: &[Option<B>]) -> Result<BlobSliceBind> {
        let mut bind : BlobSliceBind = self.get_bind();
        if let Err(err) = bind.bind_values(values, position, self.lob_piece_size, self) {
            if let Err(close_err) = bind.close() {
                log::warn!("cannot release LOBs of the failed bind at position {}: {}", position, close_err);
            }
            return Err(err);
        }
        Ok(bind)
    }

    /**
        Streams `value` into a temporary BLOB and binds it to the parameter placeholder
        at `position` (1-based).
    */
    pub fn bind_blob(self: &Arc<Self>, position: u32, value: Option<&[u8]>) -> Result<BlobBind> {
        let mut bind : BlobBind = self.get_bind();
        if let Err(err) = bind.bind_value(value, position, self.lob_piece_size, self) {
            if let Err(close_err) = bind.close() {
                log::warn!("cannot release LOB of the failed bind at position {}: {}", position, close_err);
            }
            return Err(err);
        }
        Ok(bind)
    }
}

#[cfg(feature="oci")]
#[cfg_attr(docsrs, doc(cfg(feature="oci")))]
impl Statement {
    /**
        Prepares SQL or PL/SQL statement for execution.

        # Example

        ```no_run
        use std::sync::Arc;
        use lobslice::{Environment, Session, Statement};

        # let dbname = std::env::var("DBNAME")?;
        # let dbuser = std::env::var("DBUSER")?;
        # let dbpass = std::env::var("DBPASS")?;
        let oracle = Arc::new(Environment::new()?);
        let session = Arc::new(Session::connect(oracle, &dbname, &dbuser, &dbpass)?);
        let stmt = Arc::new(Statement::prepare(session, "INSERT INTO test_blobs (data) VALUES (:data)")?);

        let rows = [ Some(vec![1u8; 100 * 1024]), None, Some(vec![2u8, 3, 4]) ];
        let mut bind = stmt.bind_blobs(1, &rows)?;
        stmt.execute(rows.len() as u32)?;
        bind.close()?;
        # Ok::<(),Box<dyn std::error::Error>>(())
        ```
    */
    pub fn prepare(session: Arc<Session>, sql: &str) -> Result<Self> {
        let mut stmt = Ptr::<OCIStmt>::null();
        let env = session.env();
        catch!{env =>
            native::stmt_prepare(session.svc_ptr(), env.err_ptr(), &mut stmt, sql)
        };
        Ok(Self::make(session, stmt, true))
    }

    /// Executes the statement `iters` times, i.e. once for each element of the bound arrays.
    pub fn execute(&self, iters: u32) -> Result<()> {
        let env = self.session.env();
        catch!{env =>
            native::stmt_execute(self.session.svc_ptr(), self.stmt, env.err_ptr(), iters)
        };
        Ok(())
    }
}

#[cfg(feature="oci")]
impl Drop for Statement {
    fn drop(&mut self) {
        if self.owned {
            native::stmt_release(self.stmt, self.session.env().err_ptr());
        }
    }
}
