use crate::domain::model::Endpoint;
use std::net::{IpAddr, SocketAddr};

/// IP 字面值產生 IP 端點，其餘視為主機名稱，解析延後到實際連線時
pub fn resolve_endpoint(name_or_address: &str, port: u16) -> Endpoint {
    match name_or_address.parse::<IpAddr>() {
        Ok(ip) => Endpoint::Ip(SocketAddr::new(ip, port)),
        Err(_) => Endpoint::Dns {
            host: name_or_address.to_string(),
            port,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_ipv4_literal() {
        let endpoint = resolve_endpoint("10.0.0.5", 28015);
        assert_eq!(
            endpoint,
            Endpoint::Ip(SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)), 28015))
        );
    }

    #[test]
    fn test_ipv6_literal() {
        let endpoint = resolve_endpoint("::1", 28016);
        assert!(matches!(endpoint, Endpoint::Ip(addr) if addr.is_ipv6() && addr.port() == 28016));
    }

    #[test]
    fn test_hostname() {
        let endpoint = resolve_endpoint("db.internal", 28015);
        assert_eq!(
            endpoint,
            Endpoint::Dns {
                host: "db.internal".to_string(),
                port: 28015
            }
        );
        assert_eq!(endpoint.to_string(), "db.internal:28015");
    }

    #[test]
    fn test_garbage_is_left_to_the_network_layer() {
        let endpoint = resolve_endpoint("not a host!", 1);
        assert!(matches!(endpoint, Endpoint::Dns { .. }));
    }
}
