use crate::oci::*;
use libc::c_void;
use std::{cmp, fmt, error, io};

pub(crate) fn get_oracle_error(api: &dyn Oci, rc: i32, hndl: *mut c_void, htype: u32) -> (i32, String) {
    match api.error_get(hndl, htype) {
        Some(( errcode, errmsg )) => (errcode, errmsg),
        None => {
            let msg = match rc {
                OCI_NO_DATA        => String::from("No Data"),
                OCI_NEED_DATA      => String::from("Need Data"),
                OCI_INVALID_HANDLE => String::from("Invalid Handle"),
                _ => format!("Error {}", rc),
            };
            (rc, msg)
        }
    }
}

/**
    Evaluates an OCI call and returns early with the environment's last error if
    the call reported `OCI_ERROR` or `OCI_INVALID_HANDLE`. Otherwise evaluates to
    the call's return code.
*/
macro_rules! catch {
    ( $env:expr => $( $stmt:stmt );+ ) => {{
        let res = { $($stmt)+ };
        match res {
            OCI_ERROR | OCI_INVALID_HANDLE => { return Err( $env.error(res) ); },
            _ => res
        }
    }};
}

/// Represents possible errors returned from lobslice
#[derive(Debug)]
pub enum Error {
    /// Error detected by the binder itself
    Interface(String),
    /// Error reported by OCI, i.e. error code and message
    Oracle(i32,String),
    /// Faults collected while releasing native resources
    Cleanup(Vec<Error>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Oracle(errcode, errmsg) => write!(f, "ORA-{:05}: {}", errcode, errmsg),
            Error::Interface(errmsg) => write!(f, "{}", errmsg),
            Error::Cleanup(errors) => {
                write!(f, "{} error(s) while releasing LOBs", errors.len())?;
                for err in errors {
                    write!(f, "; {}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl error::Error for Error {}

impl cmp::PartialEq for Error {
    fn eq(&self, other: &Error) -> bool {
        match (self, other) {
            (Error::Oracle(this_code, _), Error::Oracle(other_code, _)) => this_code == other_code,
            (Error::Interface(this_msg),  Error::Interface(other_msg))  => this_msg  == other_msg,
            (Error::Cleanup(these),       Error::Cleanup(others))       => these     == others,
            _ => false,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        io::Error::new(io::ErrorKind::Other, err)
    }
}

impl Error {
    pub(crate) fn new(msg: &str) -> Self {
        Error::Interface( msg.to_owned() )
    }

    pub(crate) fn msg(msg: String) -> Self {
        Error::Interface( msg )
    }

    /// Folds the faults collected during a cleanup into a single result.
    pub(crate) fn collect(mut errors: Vec<Error>) -> crate::Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err( errors.remove(0) ),
            _ => Err( Error::Cleanup(errors) ),
        }
    }
}
