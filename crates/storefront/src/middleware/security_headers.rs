//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Adds restrictive security headers to all responses. The CSP is built once
//! at startup because it names the configured Supabase origin.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, InvalidHeaderValue, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::config::StorefrontConfig;

/// Host serving the catalog's product photos.
const CATALOG_IMAGE_ORIGIN: &str = "https://images.unsplash.com";

/// Host serving generated initials avatars.
const AVATAR_PLACEHOLDER_ORIGIN: &str = "https://api.dicebear.com";

/// Precomputed header values that depend on configuration.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    csp: HeaderValue,
}

impl SecurityHeaders {
    /// Build the header set for this deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if the Supabase origin cannot appear in a header.
    pub fn new(config: &StorefrontConfig) -> Result<Self, InvalidHeaderValue> {
        let csp = content_security_policy(&config.supabase.origin(), config.is_secure());
        Ok(Self {
            csp: HeaderValue::from_str(&csp)?,
        })
    }
}

/// Build the CSP.
///
/// ```text
/// default-src 'none';
/// script-src 'self';
/// style-src 'self';
/// font-src 'self';
/// img-src 'self' https://images.unsplash.com <supabase> https://api.dicebear.com;
/// connect-src 'self';
/// frame-src 'none';
/// object-src 'none';
/// base-uri 'self';
/// form-action 'self';
/// frame-ancestors 'none';
/// upgrade-insecure-requests      (https deployments only)
/// ```
fn content_security_policy(supabase_origin: &str, secure: bool) -> String {
    let mut csp = format!(
        "default-src 'none'; \
         script-src 'self'; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' {CATALOG_IMAGE_ORIGIN} {supabase_origin} {AVATAR_PLACEHOLDER_ORIGIN}; \
         connect-src 'self'; \
         frame-src 'none'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    );
    if secure {
        csp.push_str("; upgrade-insecure-requests");
    }
    csp
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: no-referrer` - Zero referrer leakage
/// - `Content-Security-Policy` - See [`content_security_policy`]
/// - `Permissions-Policy` - Deny all sensitive features
/// - `Cache-Control: no-store, max-age=0` - Prevent caching per-visitor pages
/// - `Cross-Origin-Opener-Policy: same-origin` - Process isolation
/// - `Cross-Origin-Resource-Policy: same-origin` - Resource isolation
/// - `Cross-Origin-Embedder-Policy: credentialless` - Isolation that still
///   loads third-party product images
/// - `X-DNS-Prefetch-Control: off` - Prevent DNS prefetch leakage
pub async fn security_headers_middleware(
    State(security): State<SecurityHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(CONTENT_SECURITY_POLICY, security.csp.clone());

    // Strict Permissions Policy - deny all sensitive features
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             ambient-light-sensor=(), \
             autoplay=(), \
             battery=(), \
             browsing-topics=(), \
             camera=(), \
             cross-origin-isolated=(), \
             display-capture=(), \
             document-domain=(), \
             encrypted-media=(), \
             execution-while-not-rendered=(), \
             execution-while-out-of-viewport=(), \
             fullscreen=(), \
             geolocation=(), \
             gyroscope=(), \
             hid=(), \
             idle-detection=(), \
             interest-cohort=(), \
             magnetometer=(), \
             microphone=(), \
             midi=(), \
             navigation-override=(), \
             payment=(), \
             picture-in-picture=(), \
             publickey-credentials-get=(), \
             screen-wake-lock=(), \
             serial=(), \
             sync-xhr=(), \
             usb=(), \
             web-share=(), \
             xr-spatial-tracking=()",
        ),
    );

    // Prevent caching of sensitive responses
    headers.insert(
        HeaderName::from_static("cache-control"),
        HeaderValue::from_static("no-store, max-age=0"),
    );

    // Cross-Origin policies for additional isolation
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );

    // Catalog images come from a CDN without CORP headers
    headers.insert(
        HeaderName::from_static("cross-origin-embedder-policy"),
        HeaderValue::from_static("credentialless"),
    );

    // Prevent DNS prefetching to avoid leaking which links user hovers over
    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_allows_image_hosts() {
        let csp = content_security_policy("https://project.supabase.test", false);
        assert!(csp.contains(
            "img-src 'self' https://images.unsplash.com https://project.supabase.test https://api.dicebear.com;"
        ));
        assert!(csp.starts_with("default-src 'none';"));
        assert!(!csp.contains("upgrade-insecure-requests"));
    }

    #[test]
    fn test_csp_upgrades_on_https() {
        let csp = content_security_policy("https://project.supabase.test", true);
        assert!(csp.ends_with("; upgrade-insecure-requests"));
    }
}
