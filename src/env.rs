//! OCI environment

use crate::{Error, oci::*, err::get_oracle_error};
use libc::c_void;
use std::{fmt, sync::Arc};

/**
    Represents an OCI environment: the OCI implementation, the environment handle
    and the error handle that the LOB calls report their failures into.
*/
pub struct Environment {
    api: Arc<dyn Oci>,
    env: Ptr<OCIEnv>,
    err: Ptr<OCIError>,
    #[cfg_attr(not(feature="oci"), allow(dead_code))]
    owned: bool,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Environment").field("env", &self.env).field("err", &self.err).finish()
    }
}

impl Environment {
    /**
        Wraps existing environment and error handles.

        # Safety

        `env` and `err` must be valid handles of `api` and must outlive the returned
        environment and everything that is created from it. They are not freed when
        the environment is dropped.
    */
    pub unsafe fn from_raw(api: Arc<dyn Oci>, env: *mut OCIEnv, err: *mut OCIError) -> Self {
        Self { api, env: Ptr::new(env), err: Ptr::new(err), owned: false }
    }

    pub(crate) fn api(&self) -> &dyn Oci {
        self.api.as_ref()
    }

    pub(crate) fn env_ptr(&self) -> Ptr<OCIEnv> {
        self.env
    }

    pub(crate) fn err_ptr(&self) -> Ptr<OCIError> {
        self.err
    }

    /// Returns the last error recorded in the error handle.
    pub(crate) fn error(&self, rc: i32) -> Error {
        let (code, msg) = get_oracle_error(self.api(), rc, self.err.get() as *mut c_void, OCI_HTYPE_ERROR);
        Error::Oracle(code, msg)
    }

    /// Returns the last error recorded in the environment handle.
    pub(crate) fn env_error(&self, rc: i32) -> Error {
        let (code, msg) = get_oracle_error(self.api(), rc, self.env.get() as *mut c_void, OCI_HTYPE_ENV);
        Error::Oracle(code, msg)
    }
}

#[cfg(feature="oci")]
#[cfg_attr(docsrs, doc(cfg(feature="oci")))]
impl Environment {
    /**
        Returns a new environment handle, which is then used by the OCI functions.

        # Example

        ```no_run
        let oracle = lobslice::Environment::new()?;
        # Ok::<(),lobslice::Error>(())
        ```
    */
    pub fn new() -> crate::Result<Self> {
        let mut env = Ptr::<OCIEnv>::null();
        let res = native::env_create(&mut env);
        if res != OCI_SUCCESS {
            return Err( Error::new("Cannot create OCI environment") );
        }
        let mut err = Ptr::<OCIError>::null();
        let res = native::error_handle_alloc(env, &mut err);
        if res != OCI_SUCCESS || err.is_null() {
            native::handle_free(env, OCI_HTYPE_ENV);
            return Err( Error::new("Cannot allocate OCI error handle") );
        }
        Ok(Self { api: Native::api(), env, err, owned: true })
    }
}

#[cfg(feature="oci")]
impl Drop for Environment {
    fn drop(&mut self) {
        if self.owned {
            native::handle_free(self.err, OCI_HTYPE_ERROR);
            native::handle_free(self.env, OCI_HTYPE_ENV);
        }
    }
}
