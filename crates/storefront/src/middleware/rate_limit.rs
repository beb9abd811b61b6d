//! Rate limiting for authentication form posts.
//!
//! Sign-in, sign-up and password recovery all hit the identity provider, so
//! each client IP gets a small token bucket (~10 requests per minute, burst
//! of 5) shared across those routes.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Seconds to replenish one request.
const REPLENISH_SECONDS: u64 = 6;

/// Requests allowed in a burst.
const BURST_SIZE: u32 = 5;

/// Key extractor that prefers proxy headers, then the peer address.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        // Try X-Forwarded-For (first IP in the chain)
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        // Try X-Real-IP
        if let Some(ip) = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        // Direct connection
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create the rate limiter for auth form posts.
///
/// Clones of the returned layer share one bucket per client IP.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers, which are always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(REPLENISH_SECONDS)
        .burst_size(BURST_SIZE)
        .finish()
        .expect("rate limiter config with positive period and burst is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .unwrap();
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut req = Request::builder().body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo("198.51.100.2:5000".parse::<SocketAddr>().unwrap()));
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "198.51.100.2".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_no_source_is_an_error() {
        let req = Request::builder().body(()).unwrap();
        assert!(ClientIpKeyExtractor.extract(&req).is_err());
    }
}
