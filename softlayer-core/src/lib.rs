//! Core protocol types for the SoftLayer session layer.
//!
//! This crate provides the protocol-neutral pieces shared by both wire
//! bindings of the session (`softlayer-session`):
//!
//! ## Modules
//!
//! - `error`: Fault codes, the [`Fault`] value and encode errors
//! - `mask`: Object-mask normalization
//! - `value`: The tagged argument model every call parameter converts into
//! - [`xmlrpc`]: XML-RPC `methodCall` / `methodResponse` codec

mod error;
mod finite;
mod mask;
mod value;
pub mod xmlrpc;

pub use error::*;
pub use mask::*;
pub use value::*;
