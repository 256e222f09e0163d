//! The session facade.
//!
//! A call goes through these stages:
//!
//! 1. The call is validated and encoded once for the session's protocol.
//! 2. Each attempt sends the encoded request under the per-attempt timeout
//!    and classifies the response; transient failures are retried per the
//!    [`RetryPolicy`].
//! 3. A successful payload is mapped into the caller's type.
//!
//! Nothing is written to a caller's destination unless every stage succeeded.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use softlayer_core::{EncodeError, Value};

use crate::builder::SessionBuilder;
use crate::config::{RetryPolicy, retry_with_policy};
use crate::credentials::Credentials;
use crate::error::SessionError;
use crate::options::Options;
use crate::request::{Call, EncodedRequest, Protocol, Target};
use crate::response::{Page, SessionResponse, decode_value, interpret};
use crate::transport::HttpTransport;

/// A configured connection to the API.
///
/// Immutable once built. Cloning is cheap and clones share the connection
/// pool, so one session can serve any number of concurrent calls.
///
/// # Example
///
/// ```ignore
/// use softlayer_session::{Options, Session, Value};
///
/// let session = Session::builder().api_key("alice", "key").build()?;
///
/// let guests: Vec<serde_json::Value> = session
///     .call(
///         "SoftLayer_Account",
///         "getVirtualGuests",
///         &[],
///         &Options::new().mask("id,hostname").limit(50),
///     )
///     .await?;
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    pub endpoint: String,
    pub protocol: Protocol,
    pub credentials: Credentials,
    pub transport: Arc<dyn HttpTransport>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub user_agent: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.inner.endpoint)
            .field("protocol", &self.inner.protocol)
            .field("credentials", &self.inner.credentials)
            .field("timeout", &self.inner.timeout)
            .field("retry", &self.inner.retry)
            .field("user_agent", &self.inner.user_agent)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub(crate) fn from_inner(inner: Inner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    pub fn protocol(&self) -> Protocol {
        self.inner.protocol
    }

    pub fn credentials(&self) -> &Credentials {
        &self.inner.credentials
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.retry
    }

    /// Call `service.method` and write the result into `dest`.
    ///
    /// `dest` is only written when the call succeeds; on error it keeps
    /// whatever it held before.
    pub async fn do_request<T>(
        &self,
        service: &str,
        method: &str,
        args: &[Value],
        options: &Options,
        dest: &mut T,
    ) -> Result<(), SessionError>
    where
        T: DeserializeOwned,
    {
        *dest = self.call(service, method, args, options).await?;
        Ok(())
    }

    /// Call `service.method` and decode the result as `T`.
    ///
    /// An empty or `null` result decodes into any type that accepts "no
    /// value", such as `Option<_>`, `()` or `serde_json::Value`.
    pub async fn call<T>(
        &self,
        service: &str,
        method: &str,
        args: &[Value],
        options: &Options,
    ) -> Result<T, SessionError>
    where
        T: DeserializeOwned,
    {
        self.call_with_metadata(service, method, args, options)
            .await
            .map(SessionResponse::into_inner)
    }

    /// Call `service.method`, discarding any result payload.
    pub async fn call_void(
        &self,
        service: &str,
        method: &str,
        args: &[Value],
        options: &Options,
    ) -> Result<(), SessionError> {
        self.execute(service, method, args, options).await.map(|_| ())
    }

    /// Call `service.method` and return the result with response metadata,
    /// including the total item count of paginated calls.
    pub async fn call_with_metadata<T>(
        &self,
        service: &str,
        method: &str,
        args: &[Value],
        options: &Options,
    ) -> Result<SessionResponse<T>, SessionError>
    where
        T: DeserializeOwned,
    {
        let (value, headers) = self.execute(service, method, args, options).await?;
        Ok(SessionResponse::new(decode_value(value)?, headers))
    }

    /// Fetch every item of a list call, `page_size` at a time.
    ///
    /// Pages are requested with increasing offsets, starting at the offset in
    /// `options`, until a page comes back short (or empty) or the reported
    /// total is reached. A page longer than `page_size` means the server
    /// ignored the window; that page alone is returned as the full result.
    /// Any failure aborts the walk and nothing is returned.
    pub async fn pages<T>(
        &self,
        service: &str,
        method: &str,
        args: &[Value],
        options: &Options,
        page_size: u32,
    ) -> Result<Page<T>, SessionError>
    where
        T: DeserializeOwned,
    {
        if page_size == 0 {
            return Err(EncodeError::Unsupported("page size must be positive".into()).into());
        }

        let mut items = Vec::new();
        let mut total_items = None;
        let mut offset = options.get_offset().unwrap_or(0);

        loop {
            let page_options = options.clone().limit(page_size).offset(offset);
            let (page, total) = self
                .call_with_metadata::<Vec<T>>(service, method, args, &page_options)
                .await?
                .into_parts();
            if total.is_some() {
                total_items = total;
            }

            let fetched = page.len();

            #[cfg(feature = "tracing")]
            tracing::debug!(fetched, offset, total = ?total_items, "fetched page");

            // More than asked for: the window was ignored and this page is the
            // whole result.
            if fetched > page_size as usize {
                items = page;
                break;
            }

            items.extend(page);
            offset = offset.saturating_add(u32::try_from(fetched).unwrap_or(u32::MAX));

            let short = fetched < page_size as usize;
            let complete = total_items.is_some_and(|total| u64::from(offset) >= total);
            if short || complete || offset == u32::MAX {
                break;
            }
        }

        Ok(Page { items, total_items })
    }

    /// Encode, send with retries, and classify. Returns the result in the
    /// JSON data model plus the response headers.
    async fn execute(
        &self,
        service: &str,
        method: &str,
        args: &[Value],
        options: &Options,
    ) -> Result<(serde_json::Value, http::HeaderMap), SessionError> {
        let call = Call::new(service, method, args, options)?;
        let target = Target {
            endpoint: &self.inner.endpoint,
            credentials: &self.inner.credentials,
            user_agent: &self.inner.user_agent,
        };
        let request = self.inner.protocol.encode(&target, &call)?;

        let exchange = retry_with_policy(&self.inner.retry, || self.attempt(&request));

        #[cfg(feature = "tracing")]
        let exchange = {
            use tracing::Instrument;
            exchange.instrument(tracing::info_span!(
                "sl.call",
                sl.service = %service,
                sl.method = %method,
                sl.protocol = %self.inner.protocol,
                otel.kind = "client",
            ))
        };

        exchange.await
    }

    /// One attempt: send under the per-attempt timeout, then classify.
    async fn attempt(
        &self,
        request: &EncodedRequest,
    ) -> Result<(serde_json::Value, http::HeaderMap), SessionError> {
        let timeout = self.inner.timeout;
        let response = tokio::time::timeout(timeout, self.inner.transport.send(request.to_http()))
            .await
            .map_err(|_| SessionError::timeout(format!("attempt timed out after {timeout:?}")))??;

        let value = interpret(self.inner.protocol, &response)?;
        Ok((value, response.headers))
    }
}
