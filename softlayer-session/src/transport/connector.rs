//! TLS connector setup for the hyper HTTP client.
//!
//! TLS needs both a crypto provider and root certificates:
//!
//! - **Crypto providers** (choose one):
//!   - `tls-ring` - ring (default with the `tls` feature)
//!   - `tls-aws-lc` - AWS LC
//!   - neither: a provider installed with `CryptoProvider::install_default()`
//!
//! - **Root certificates** (choose one):
//!   - `tls-native-roots` - system roots (default with the `tls` feature)
//!   - `tls-webpki-roots` - bundled Mozilla roots
//!   - neither: an empty store, so only a custom `ClientConfig` can verify
//!     servers

use std::sync::Arc;
use std::time::Duration;

use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use rustls::ClientConfig;

/// Whether both a crypto provider and root certificates are compiled in.
#[inline]
pub const fn has_tls_support() -> bool {
    cfg!(any(feature = "tls-ring", feature = "tls-aws-lc"))
        && cfg!(any(feature = "tls-native-roots", feature = "tls-webpki-roots"))
}

/// Pick the crypto provider.
///
/// Priority:
/// 1. Feature-gated provider (tls-ring, then tls-aws-lc)
/// 2. User-installed global default provider
fn crypto_provider() -> Option<Arc<rustls::crypto::CryptoProvider>> {
    #[cfg(feature = "tls-ring")]
    return Some(Arc::new(rustls::crypto::ring::default_provider()));

    #[cfg(all(feature = "tls-aws-lc", not(feature = "tls-ring")))]
    return Some(Arc::new(rustls::crypto::aws_lc_rs::default_provider()));

    #[cfg(not(any(feature = "tls-ring", feature = "tls-aws-lc")))]
    {
        rustls::crypto::CryptoProvider::get_default().cloned()
    }
}

/// Build the default TLS configuration from the enabled features.
pub fn default_tls_config() -> Result<ClientConfig, String> {
    let provider = crypto_provider().ok_or_else(|| {
        "no TLS crypto provider: enable `tls-ring` or `tls-aws-lc`, or install a global \
         provider with `CryptoProvider::install_default()`"
            .to_string()
    })?;

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| format!("unsupported TLS protocol versions: {e}"))?
        .with_root_certificates(build_root_store())
        .with_no_client_auth();

    Ok(config)
}

/// Build the root certificate store from enabled features.
fn build_root_store() -> rustls::RootCertStore {
    #[allow(unused_mut)]
    let mut roots = rustls::RootCertStore::empty();

    // Prefer native over webpki if both are enabled
    #[cfg(feature = "tls-native-roots")]
    {
        let native_certs = rustls_native_certs::load_native_certs();
        if !native_certs.errors.is_empty() {
            // Some certs may still have loaded
            #[cfg(feature = "tracing")]
            tracing::debug!("errors loading native certs: {:?}", native_certs.errors);
        }
        roots.add_parsable_certificates(native_certs.certs);
    }

    #[cfg(all(feature = "tls-webpki-roots", not(feature = "tls-native-roots")))]
    {
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    roots
}

/// Build an HTTPS connector that also accepts plain `http://` URLs.
pub fn build_https_connector(
    tls_config: ClientConfig,
    connect_timeout: Option<Duration>,
) -> HttpsConnector<HttpConnector> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(connect_timeout);

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_all_versions()
        .wrap_connector(http)
}
