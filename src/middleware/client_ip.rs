use axum::extract::{ConnectInfo, Request};
use std::net::{IpAddr, SocketAddr};

/// Client address as seen through proxies.
///
/// Priority:
/// 1. X-Forwarded-For header (first hop)
/// 2. X-Real-IP header
/// 3. ConnectInfo socket address
pub fn client_ip(request: &Request) -> Option<IpAddr> {
    let headers = request.headers();
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());
    if forwarded.is_some() {
        return forwarded;
    }

    // Unparseable headers fall through to the next source
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());
    if real_ip.is_some() {
        return real_ip;
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(headers: &[(&str, &str)]) -> Request {
        let mut builder = axum::http::Request::builder().uri("/");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn forwarded_for_takes_first_hop() {
        let req = request(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1"), ("x-real-ip", "10.0.0.2")]);
        assert_eq!(client_ip(&req), Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn real_ip_then_socket() {
        let req = request(&[("x-real-ip", "198.51.100.4")]);
        assert_eq!(client_ip(&req), Some("198.51.100.4".parse().unwrap()));

        let mut req = request(&[]);
        assert_eq!(client_ip(&req), None);
        let addr: SocketAddr = "192.0.2.1:5555".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(client_ip(&req), Some(addr.ip()));
    }

    #[test]
    fn garbage_headers_fall_through() {
        let req = request(&[("x-forwarded-for", "unknown"), ("x-real-ip", "198.51.100.9")]);
        assert_eq!(client_ip(&req), Some("198.51.100.9".parse().unwrap()));

        let mut req = request(&[("x-forwarded-for", "not-an-ip"), ("x-real-ip", "also bad")]);
        let addr: SocketAddr = "192.0.2.8:4000".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(client_ip(&req), Some(addr.ip()));
    }
}
