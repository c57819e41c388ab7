//! User session

use crate::{Environment, oci::*};
use std::sync::Arc;

/// Represents a user session, i.e. the service context LOB calls are made in.
#[derive(Debug)]
pub struct Session {
    env: Arc<Environment>,
    svc: Ptr<OCISvcCtx>,
    #[cfg_attr(not(feature="oci"), allow(dead_code))]
    owned: bool,
}

impl Session {
    /**
        Wraps an existing service context.

        # Safety

        `svc` must be a valid service context of the environment and must outlive
        the returned session and everything that is created from it. It is not
        released when the session is dropped.
    */
    pub unsafe fn from_raw(env: Arc<Environment>, svc: *mut OCISvcCtx) -> Self {
        Self { env, svc: Ptr::new(svc), owned: false }
    }

    pub(crate) fn env(&self) -> &Environment {
        &self.env
    }

    pub(crate) fn svc_ptr(&self) -> Ptr<OCISvcCtx> {
        self.svc
    }
}

#[cfg(feature="oci")]
#[cfg_attr(docsrs, doc(cfg(feature="oci")))]
impl Session {
    /**
        Creates a simple logon session.

        # Example

        ```no_run
        use std::sync::Arc;

        let dbname = std::env::var("DBNAME")?;
        let dbuser = std::env::var("DBUSER")?;
        let dbpass = std::env::var("DBPASS")?;
        let oracle = Arc::new(lobslice::Environment::new()?);
        let session = lobslice::Session::connect(oracle, &dbname, &dbuser, &dbpass)?;
        # Ok::<(),Box<dyn std::error::Error>>(())
        ```
    */
    pub fn connect(env: Arc<Environment>, dbname: &str, user: &str, pass: &str) -> crate::Result<Self> {
        let mut svc = Ptr::<OCISvcCtx>::null();
        catch!{env =>
            native::logon(env.env_ptr(), env.err_ptr(), &mut svc, user, pass, dbname)
        };
        Ok(Self { env, svc, owned: true })
    }
}

#[cfg(feature="oci")]
impl Drop for Session {
    fn drop(&mut self) {
        if self.owned {
            native::logoff(self.svc, self.env.err_ptr());
        }
    }
}
