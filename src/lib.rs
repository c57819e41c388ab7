#![cfg_attr(not(doctest), doc=include_str!("../README.md"))]

#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
mod err;

pub mod oci;
mod env;
mod session;
mod stmt;
mod bind;


pub use err::Error;
pub use env::Environment;
pub use session::Session;
pub use stmt::{Statement, DEFAULT_LOB_PIECE_SIZE};
pub use bind::{Bind, BindKind, BlobBind, BlobSliceBind};

pub type Result<T> = std::result::Result<T, Error>;
