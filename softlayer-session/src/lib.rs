//! Session and dispatch core for the SoftLayer API.
//!
//! A [`Session`] holds an endpoint, credentials, a per-attempt timeout and a
//! [`RetryPolicy`]. Every API method goes through one entry point:
//!
//! ```ignore
//! use softlayer_session::{Options, Session, Value};
//!
//! let session = Session::builder()
//!     .api_key("alice", "0123abcd")
//!     .build()?;
//!
//! let mut account = serde_json::Value::Null;
//! session
//!     .do_request(
//!         "SoftLayer_Account",
//!         "getObject",
//!         &[],
//!         &Options::new().mask("id,companyName"),
//!         &mut account,
//!     )
//!     .await?;
//! ```
//!
//! ## Protocols
//!
//! | Protocol | Endpoint | Wire format |
//! |----------|----------|-------------|
//! | [`Protocol::Rest`] | `https://api.softlayer.com/rest/v3.1` | `<service>[/<id>]/<method>.json`, JSON body |
//! | [`Protocol::XmlRpc`] | `https://api.softlayer.com/xmlrpc/v3.1` | `methodCall` named `<service>.<method>` |
//!
//! The protocol is inferred from the endpoint unless set explicitly with
//! [`SessionBuilder::protocol`]. Both produce the same results and the same
//! classified errors.
//!
//! ## Call Options
//!
//! [`Options`] carries the per-call modifiers: the receiver `id`, an object
//! mask (normalized with [`normalize_mask`]), an object filter and a result
//! window (`limit`/`offset`). Paginated calls report the total result count,
//! available through [`Session::call_with_metadata`]; [`Session::pages`]
//! walks every page.
//!
//! ## Errors
//!
//! Every failure is a [`SessionError`] with a [`Code`]. API faults carry the
//! exception class and message the server sent. Only transient failures are
//! retried:
//!
//! - [`Code::Unavailable`] - network failures, HTTP 502/503/504
//! - [`Code::ResourceExhausted`] - HTTP 429
//! - [`Code::DeadlineExceeded`] - the per-attempt timeout elapsed
//!
//! ## Configuration
//!
//! [`SessionBuilder::from_env`] reads the variables named in [`env`]:
//! `SL_USERNAME`, `SL_API_KEY`, `SL_ACCESS_TOKEN`, `SL_ENDPOINT_URL` and
//! `SL_TIMEOUT` (seconds).
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `tls` (default) | `tls-ring` + `tls-native-roots` |
//! | `tls-ring` / `tls-aws-lc` | rustls crypto provider |
//! | `tls-native-roots` / `tls-webpki-roots` | Root certificates |
//! | `tracing` (default) | A `sl.call` span per call, retry events |
//!
//! The `sl.call` span records `sl.service`, `sl.method`, `sl.protocol` and
//! `otel.kind = "client"`.

mod builder;
pub mod config;
mod credentials;
mod error;
pub mod fault;
mod options;
mod request;
mod response;
mod session;
pub mod transport;

pub use builder::{DEFAULT_TIMEOUT, SessionBuilder, env};
pub use config::{ExponentialBackoff, RetryPolicy, defaults, retry_with_policy};
pub use credentials::{Credentials, Secret};
pub use error::{SessionBuildError, SessionError};
pub use options::Options;
pub use request::Protocol;
pub use response::{Page, SessionResponse, TOTAL_ITEMS_HEADER};
pub use session::Session;

pub use transport::{HttpTransport, HyperTransport, HyperTransportBuilder, RawResponse};

// Re-export core types that users need
pub use softlayer_core::{Code, EncodeError, Fault, Value, normalize_mask, to_value};
