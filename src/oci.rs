//! Oracle OCI

use libc::c_void;

pub mod ptr;

#[cfg(feature="oci")]
#[cfg_attr(docsrs, doc(cfg(feature="oci")))]
pub mod native;

pub use ptr::Ptr;

#[cfg(feature="oci")]
pub use native::Native;

pub const OCI_DEFAULT                : u32 = 0;

// OCI Error Codes
pub const OCI_SUCCESS                : i32 = 0;
pub const OCI_SUCCESS_WITH_INFO      : i32 = 1;
pub const OCI_NEED_DATA              : i32 = 99;
pub const OCI_NO_DATA                : i32 = 100;
pub const OCI_ERROR                  : i32 = -1;
pub const OCI_INVALID_HANDLE         : i32 = -2;

// Handle Types
pub const OCI_HTYPE_ENV              : u32 = 1;
pub const OCI_HTYPE_ERROR            : u32 = 2;

// Handle Definitions
#[repr(C)] pub struct OCIEnv                { _private: [u8; 0] }
#[repr(C)] pub struct OCIError              { _private: [u8; 0] }
#[repr(C)] pub struct OCISvcCtx             { _private: [u8; 0] }
#[repr(C)] pub struct OCIStmt               { _private: [u8; 0] }
#[repr(C)] pub struct OCIBind               { _private: [u8; 0] }

// Descriptor Types
pub const OCI_DTYPE_LOB              : u32 = 50;  // lob locator

// Descriptor Definitions
#[repr(C)] pub struct OCILobLocator         { _private: [u8; 0] }

/// Marker trait for OCI handles and descriptors
pub trait OCIStruct {}

macro_rules! mark_as_oci {
    ($($t:ty),+) => {
        $(
            impl OCIStruct for $t {}
        )+
    };
}

mark_as_oci!(OCIEnv, OCIError, OCISvcCtx, OCIStmt, OCIBind, OCILobLocator);

// Data types
pub const SQLT_BLOB                  : u16 = 113; // binary lob

// Null indicator information
pub const OCI_IND_NOTNULL            : i16 = 0;
pub const OCI_IND_NULL               : i16 = -1;

// char set "form" information
pub const SQLCS_IMPLICIT             : u8 = 1;

// OBJECT Duration
pub const OCI_DURATION_SESSION       : u16 = 10;

// Character Sets
pub const AL32UTF8                   : u16 = 873;
pub const UTF8                       : u16 = 871;

// Initialization Modes
pub const OCI_THREADED               : u32 = 1;
pub const OCI_OBJECT                 : u32 = 2;

// Parsing Syntax Types
pub const OCI_NTV_SYNTAX             : u32 = 1;

pub const OCI_ERROR_MAXMSG_SIZE      : usize = 3072;

pub const OCI_TEMP_BLOB              : u8 = 1;

// boolean
pub const FALSE                      : u8 = 0;

// LOB piece markers
pub const OCI_FIRST_PIECE            : u8 = 1;
pub const OCI_NEXT_PIECE             : u8 = 2;
pub const OCI_LAST_PIECE             : u8 = 3;

/**
    The slice of the Oracle Call Interface that LOB binds are made of.

    Every method mirrors the OCI function it is named after and returns that
    function's status code (`OCI_SUCCESS`, `OCI_NEED_DATA`, `OCI_ERROR`, ...).
    Handles are passed as [`Ptr`]s that were obtained from the same implementation.

    With the `oci` feature enabled [`Native`] implements it by calling into the Oracle
    client library. Other implementations can be plugged in when the native handles are
    managed elsewhere.
*/
pub trait Oci: Send + Sync {
    /// `OCIDescriptorAlloc`
    fn descriptor_alloc(&self, env: Ptr<OCIEnv>, descpp: &mut Ptr<OCILobLocator>, desc_type: u32) -> i32;

    /// `OCIDescriptorFree`
    fn descriptor_free(&self, desc: Ptr<OCILobLocator>, desc_type: u32) -> i32;

    /// `OCILobCreateTemporary`
    fn lob_create_temporary(
        &self, svc: Ptr<OCISvcCtx>, err: Ptr<OCIError>, loc: Ptr<OCILobLocator>,
        csid: u16, csfrm: u8, lob_type: u8, cache: u8, duration: u16
    ) -> i32;

    /// `OCILobWrite2` without a callback. `byte_amt` of 0 requests streaming mode.
    fn lob_write(
        &self, svc: Ptr<OCISvcCtx>, err: Ptr<OCIError>, loc: Ptr<OCILobLocator>,
        byte_amt: &mut u64, offset: u64, buf: &[u8], piece: u8, csid: u16, csfrm: u8
    ) -> i32;

    /// `OCILobFreeTemporary`
    fn lob_free_temporary(&self, svc: Ptr<OCISvcCtx>, err: Ptr<OCIError>, loc: Ptr<OCILobLocator>) -> i32;

    /**
        `OCIBindByPos2`

        # Safety

        `valuep`, `indp`, `alenp` and `rcodep` are read by OCI when the statement
        is executed. They must stay valid, and must not move, until the statement
        is executed or the bind is replaced.
    */
    unsafe fn bind_by_pos(
        &self, stmt: Ptr<OCIStmt>, bindpp: &mut Ptr<OCIBind>, err: Ptr<OCIError>,
        position: u32, valuep: *mut c_void, value_sz: i64, dty: u16,
        indp: *mut c_void, alenp: *mut u32, rcodep: *mut u16,
        maxarr_len: u32, curelep: *mut u32, mode: u32
    ) -> i32;

    /// `OCIBindArrayOfStruct`
    fn bind_array_of_struct(
        &self, bind: Ptr<OCIBind>, err: Ptr<OCIError>,
        pvskip: u32, indskip: u32, alskip: u32, rcskip: u32
    ) -> i32;

    /// `OCIErrorGet` for the first error record. Returns `None` when there is no record to report.
    fn error_get(&self, hndl: *mut c_void, htype: u32) -> Option<(i32, String)>;
}
