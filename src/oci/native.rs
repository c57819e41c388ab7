//! OCI as provided by the Oracle client library.

use super::*;
use libc::{size_t, c_void};
use once_cell::sync::OnceCell;
use std::{ptr, sync::Arc, ffi::CStr};

/// [`Oci`] implementation that calls the Oracle client library.
pub struct Native;

impl Native {
    /// Returns the process-wide instance.
    pub fn api() -> Arc<dyn Oci> {
        static API: OnceCell<Arc<Native>> = OnceCell::new();
        API.get_or_init(|| Arc::new(Native)).clone()
    }
}

impl Oci for Native {
    fn descriptor_alloc(&self, env: Ptr<OCIEnv>, descpp: &mut Ptr<OCILobLocator>, desc_type: u32) -> i32 {
        unsafe {
            OCIDescriptorAlloc(env.get(), descpp.as_mut_ptr() as *mut *mut c_void, desc_type, 0, ptr::null())
        }
    }

    fn descriptor_free(&self, desc: Ptr<OCILobLocator>, desc_type: u32) -> i32 {
        unsafe {
            OCIDescriptorFree(desc.get() as *mut c_void, desc_type)
        }
    }

    fn lob_create_temporary(
        &self, svc: Ptr<OCISvcCtx>, err: Ptr<OCIError>, loc: Ptr<OCILobLocator>,
        csid: u16, csfrm: u8, lob_type: u8, cache: u8, duration: u16
    ) -> i32 {
        unsafe {
            OCILobCreateTemporary(svc.get(), err.get(), loc.get(), csid, csfrm, lob_type, cache, duration)
        }
    }

    fn lob_write(
        &self, svc: Ptr<OCISvcCtx>, err: Ptr<OCIError>, loc: Ptr<OCILobLocator>,
        byte_amt: &mut u64, offset: u64, buf: &[u8], piece: u8, csid: u16, csfrm: u8
    ) -> i32 {
        unsafe {
            OCILobWrite2(
                svc.get(), err.get(), loc.get(),
                byte_amt, ptr::null_mut(), offset,
                buf.as_ptr(), buf.len() as u64, piece,
                ptr::null_mut(), ptr::null(),
                csid, csfrm
            )
        }
    }

    fn lob_free_temporary(&self, svc: Ptr<OCISvcCtx>, err: Ptr<OCIError>, loc: Ptr<OCILobLocator>) -> i32 {
        unsafe {
            OCILobFreeTemporary(svc.get(), err.get(), loc.get())
        }
    }

    unsafe fn bind_by_pos(
        &self, stmt: Ptr<OCIStmt>, bindpp: &mut Ptr<OCIBind>, err: Ptr<OCIError>,
        position: u32, valuep: *mut c_void, value_sz: i64, dty: u16,
        indp: *mut c_void, alenp: *mut u32, rcodep: *mut u16,
        maxarr_len: u32, curelep: *mut u32, mode: u32
    ) -> i32 {
        OCIBindByPos2(
            stmt.get(), bindpp.as_mut_ptr(), err.get(),
            position, valuep, value_sz, dty,
            indp, alenp, rcodep,
            maxarr_len, curelep, mode
        )
    }

    fn bind_array_of_struct(
        &self, bind: Ptr<OCIBind>, err: Ptr<OCIError>,
        pvskip: u32, indskip: u32, alskip: u32, rcskip: u32
    ) -> i32 {
        unsafe {
            OCIBindArrayOfStruct(bind.get(), err.get(), pvskip, indskip, alskip, rcskip)
        }
    }

    fn error_get(&self, hndl: *mut c_void, htype: u32) -> Option<(i32, String)> {
        let mut errcode = 0i32;
        let mut errmsg = vec![0u8; OCI_ERROR_MAXMSG_SIZE];
        let res = unsafe {
            OCIErrorGet(hndl, 1, ptr::null(), &mut errcode, errmsg.as_mut_ptr(), OCI_ERROR_MAXMSG_SIZE as u32, htype)
        };
        if res == OCI_SUCCESS {
            let msg = unsafe { CStr::from_ptr(errmsg.as_ptr() as *const libc::c_char) };
            Some( (errcode, msg.to_string_lossy().trim_end().to_string()) )
        } else {
            None
        }
    }
}

// Lifecycle of the collaborators that are created natively.

pub(crate) fn env_create(env: &mut Ptr<OCIEnv>) -> i32 {
    unsafe {
        OCIEnvNlsCreate(
            env.as_mut_ptr(), OCI_OBJECT | OCI_THREADED,
            ptr::null(), ptr::null(), ptr::null(), ptr::null(), 0, ptr::null(),
            AL32UTF8, UTF8
        )
    }
}

pub(crate) fn error_handle_alloc(env: Ptr<OCIEnv>, err: &mut Ptr<OCIError>) -> i32 {
    unsafe {
        OCIHandleAlloc(env.get(), err.as_mut_ptr() as *mut *mut c_void, OCI_HTYPE_ERROR, 0, ptr::null())
    }
}

pub(crate) fn handle_free<T: OCIStruct>(hndl: Ptr<T>, htype: u32) -> i32 {
    unsafe {
        OCIHandleFree(hndl.get() as *mut c_void, htype)
    }
}

pub(crate) fn logon(env: Ptr<OCIEnv>, err: Ptr<OCIError>, svc: &mut Ptr<OCISvcCtx>, user: &str, pass: &str, dbname: &str) -> i32 {
    unsafe {
        OCILogon2(
            env.get(), err.get(), svc.as_mut_ptr(),
            user.as_ptr(), user.len() as u32,
            pass.as_ptr(), pass.len() as u32,
            dbname.as_ptr(), dbname.len() as u32,
            OCI_DEFAULT
        )
    }
}

pub(crate) fn logoff(svc: Ptr<OCISvcCtx>, err: Ptr<OCIError>) -> i32 {
    unsafe {
        OCILogoff(svc.get(), err.get())
    }
}

pub(crate) fn stmt_prepare(svc: Ptr<OCISvcCtx>, err: Ptr<OCIError>, stmt: &mut Ptr<OCIStmt>, sql: &str) -> i32 {
    unsafe {
        OCIStmtPrepare2(
            svc.get(), stmt.as_mut_ptr(), err.get(),
            sql.as_ptr(), sql.len() as u32,
            ptr::null(), 0,
            OCI_NTV_SYNTAX, OCI_DEFAULT
        )
    }
}

pub(crate) fn stmt_release(stmt: Ptr<OCIStmt>, err: Ptr<OCIError>) -> i32 {
    unsafe {
        OCIStmtRelease(stmt.get(), err.get(), ptr::null(), 0, OCI_DEFAULT)
    }
}

pub(crate) fn stmt_execute(svc: Ptr<OCISvcCtx>, stmt: Ptr<OCIStmt>, err: Ptr<OCIError>, iters: u32) -> i32 {
    unsafe {
        OCIStmtExecute(svc.get(), stmt.get(), err.get(), iters, 0, ptr::null(), ptr::null_mut(), OCI_DEFAULT)
    }
}

extern "C" {
    // https://docs.oracle.com/en/database/oracle/oracle-database/19/lnoci/connect-authorize-and-initialize-functions.html#GUID-0B6911A9-4B46-476C-BC5E-B87581666CD9
    fn OCIEnvNlsCreate(
        envhpp:     *mut *mut  OCIEnv,
        mode:       u32,
        ctxp:       *const c_void,
        malocfp:    *const c_void,
        ralocfp:    *const c_void,
        mfreefp:    *const c_void,
        xtramemsz:  size_t,
        usrmempp:   *const c_void,
        charset:    u16,
        ncharset:   u16
    ) -> i32;

    fn OCILogon2(
        envhp:      *mut OCIEnv,
        errhp:      *mut OCIError,
        svchp:      *mut *mut OCISvcCtx,
        username:   *const u8,
        uname_len:  u32,
        password:   *const u8,
        passwd_len: u32,
        dbname:     *const u8,
        dbname_len: u32,
        mode:       u32
    ) -> i32;

    fn OCILogoff(
        svchp:      *mut OCISvcCtx,
        errhp:      *mut OCIError
    ) -> i32;
}

extern "C" {
    // https://docs.oracle.com/en/database/oracle/oracle-database/19/lnoci/handle-and-descriptor-functions.html#GUID-C5BF55F7-A110-4CB5-9663-5056590F12B5
    fn OCIHandleAlloc(
        parenth:    *mut OCIEnv,
        hndlpp:     *mut *mut  c_void,
        hndl_type:  u32,
        xtramem_sz: size_t,
        usrmempp:   *const c_void
    ) -> i32;

    // https://docs.oracle.com/en/database/oracle/oracle-database/19/lnoci/handle-and-descriptor-functions.html#GUID-E87E9F91-D3DC-4F35-BE7C-F1EFBFEEBA0A
    fn OCIHandleFree(
        hndlp:      *mut c_void,
        hnd_type:   u32
    ) -> i32;

    // https://docs.oracle.com/en/database/oracle/oracle-database/19/lnoci/handle-and-descriptor-functions.html#GUID-E9EF2766-E078-49A7-B1D1-738E4BA4814F
    fn OCIDescriptorAlloc(
        parenth:    *mut OCIEnv,
        descpp:     *mut *mut  c_void,
        desc_type:  u32,
        xtramem_sz: size_t,
        usrmempp:   *const c_void
    ) -> i32;

    // https://docs.oracle.com/en/database/oracle/oracle-database/19/lnoci/handle-and-descriptor-functions.html#GUID-A32BF051-3DC1-491C-AAFD-A46034DD1629
    fn OCIDescriptorFree(
        descp:      *mut c_void,
        desc_type:  u32
    ) -> i32;
}

extern "C" {
    // https://docs.oracle.com/en/database/oracle/oracle-database/19/lnoci/miscellaneous-functions.html#GUID-4B99087C-74F6-498A-8310-D6645172390A
    fn OCIErrorGet(
        hndlp:      *mut c_void,
        recordno:   u32,
        sqlstate:   *const c_void,
        errcodep:   *mut i32,
        bufp:       *mut u8,
        bufsiz:     u32,
        hnd_type:   u32,
    ) -> i32;
}

extern "C" {
    // https://docs.oracle.com/en/database/oracle/oracle-database/19/lnoci/statement-functions.html#GUID-E6C1DC67-D464-4D2A-9F19-737423D31779
    fn OCIStmtPrepare2(
        svchp:      *mut OCISvcCtx,
        stmthp:     *mut *mut OCIStmt,
        errhp:      *mut OCIError,
        stmttext:   *const u8,
        stmt_len:   u32,
        key:        *const u8,
        keylen:     u32,
        language:   u32,
        mode:       u32
    ) -> i32;

    fn OCIStmtRelease(
        stmtp:      *mut OCIStmt,
        errhp:      *mut OCIError,
        key:        *const u8,
        keylen:     u32,
        mode:       u32
    ) -> i32;

    // https://docs.oracle.com/en/database/oracle/oracle-database/19/lnoci/statement-functions.html#GUID-98B26708-3E02-45C0-8258-5D5544F32BE9
    fn OCIStmtExecute(
        svchp:      *mut OCISvcCtx,
        stmtp:      *mut OCIStmt,
        errhp:      *mut OCIError,
        iters:      u32,
        rowoff:     u32,
        snap_in:    *const c_void,
        snap_out:   *mut c_void,
        mode:       u32
    ) -> i32;
}

extern "C" {
    // https://docs.oracle.com/en/database/oracle/oracle-database/19/lnoci/bind-define-describe-functions.html#GUID-D28DF5A7-3C75-4E52-82F7-A5D6D5714E69
    fn OCIBindByPos2(
        stmtp:      *mut OCIStmt,
        bindpp:     *mut *mut OCIBind,
        errhp:      *mut OCIError,
        position:   u32,
        valuep:     *mut c_void,
        value_sz:   i64,
        dty:        u16,
        indp:       *mut c_void,
        alenp:      *mut u32,
        rcodep:     *mut u16,
        maxarr_len: u32,
        curelep:    *mut u32,
        mode:       u32
    ) -> i32;

    fn OCIBindArrayOfStruct(
        bindp:      *mut OCIBind,
        errhp:      *mut OCIError,
        pvskip:     u32,
        indskip:    u32,
        alskip:     u32,
        rcskip:     u32
    ) -> i32;
}

extern "C" {
    // https://docs.oracle.com/en/database/oracle/oracle-database/19/lnoci/lob-functions.html#GUID-63F75EC5-EB14-4E25-B593-270FF814615A
    fn OCILobCreateTemporary(
        svchp:      *mut OCISvcCtx,
        errhp:      *mut OCIError,
        loc:        *mut OCILobLocator,
        csid:       u16,
        csfrm:      u8,
        lob_type:   u8,
        cache:      u8,
        duration:   u16,
    ) -> i32;

    // https://docs.oracle.com/en/database/oracle/oracle-database/19/lnoci/lob-functions.html#GUID-E0FBF017-1B08-410C-9E53-F6E14008813A
    fn OCILobFreeTemporary(
        svchp:      *mut OCISvcCtx,
        errhp:      *mut OCIError,
        loc:        *mut OCILobLocator,
    ) -> i32;

    // https://docs.oracle.com/en/database/oracle/oracle-database/19/lnoci/lob-functions.html#GUID-77F056CA-9EEE-4550-8A8E-0155DF994DBE
    fn OCILobWrite2(
        svchp:      *mut OCISvcCtx,
        errhp:      *mut OCIError,
        loc:        *mut OCILobLocator,
        byte_cnt:   *mut u64,
        char_cnt:   *mut u64,
        offset:     u64,
        buf:        *const u8,
        buf_len:    u64,
        piece:      u8,
        ctx:        *mut c_void,
        write_cb:   *const c_void,
        csid:       u16,
        csfrm:      u8,
    ) -> i32;
}
