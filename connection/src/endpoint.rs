use crate::ConnectionError;

/// Namespace the collector serves its stream on.
pub const DEFAULT_NAMESPACE: &str = "/stream";

/// A resolved duplex endpoint: the WebSocket URL to dial and the namespace
/// to join once the engine handshake completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub raw: String,
    pub socket_url: String,
    pub namespace: String,
    /// `host[:port]` as entered.
    pub authority: String,
    pub secure: bool,
}

impl Endpoint {
    /// Resolves a user-entered endpoint.
    ///
    /// Accepts `http`, `https`, `ws` and `wss` URLs as well as a bare
    /// `host:port`. The URL path, when present, names the namespace;
    /// otherwise `default_namespace` is used.
    pub fn parse(raw: &str, default_namespace: &str) -> Result<Self, ConnectionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConnectionError::EmptyEndpoint);
        }

        let (scheme, rest) = match trimmed.find("://") {
            Some(idx) => (trimmed[..idx].to_ascii_lowercase(), &trimmed[idx + 3..]),
            None => ("http".to_string(), trimmed),
        };
        let ws_scheme = match scheme.as_str() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(ConnectionError::UnsupportedScheme(other.to_string())),
        };

        let rest = rest.split(['#', '?']).next().unwrap_or_default();
        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        if authority.is_empty() || authority.contains(char::is_whitespace) {
            return Err(ConnectionError::InvalidEndpoint(trimmed.to_string()));
        }

        let path = path.trim_end_matches('/');
        let namespace = if path.is_empty() {
            normalize_namespace(default_namespace)
        } else {
            path.to_string()
        };

        Ok(Self {
            raw: trimmed.to_string(),
            socket_url: format!("{ws_scheme}://{authority}/socket.io/?EIO=4&transport=websocket"),
            namespace,
            authority: authority.to_string(),
            secure: ws_scheme == "wss",
        })
    }

    /// `host:port` to dial, filling in 80 or 443 when no port was given.
    pub fn socket_addr(&self) -> String {
        let has_port = match self.authority.rsplit_once(':') {
            Some((host, port)) => {
                !port.is_empty()
                    && port.chars().all(|c| c.is_ascii_digit())
                    && (!host.starts_with('[') || host.ends_with(']'))
            }
            None => false,
        };
        if has_port {
            self.authority.clone()
        } else if self.secure {
            format!("{}:443", self.authority)
        } else {
            format!("{}:80", self.authority)
        }
    }
}

/// Canonical namespace form: leading slash, no trailing slash, `/` when empty.
pub fn normalize_namespace(namespace: &str) -> String {
    let namespace = namespace.trim().trim_end_matches('/');
    if namespace.is_empty() {
        "/".to_string()
    } else if namespace.starts_with('/') {
        namespace.to_string()
    } else {
        format!("/{namespace}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_endpoint_maps_to_websocket_with_default_namespace() {
        let endpoint = Endpoint::parse(" http://10.0.0.5:3000/ ", DEFAULT_NAMESPACE).unwrap();
        assert_eq!(
            endpoint.socket_url,
            "ws://10.0.0.5:3000/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(endpoint.namespace, "/stream");
        assert_eq!(endpoint.raw, "http://10.0.0.5:3000/");
    }

    #[test]
    fn path_selects_namespace_and_https_maps_to_wss() {
        let endpoint = Endpoint::parse("https://collector.local/live?x=1", "/stream").unwrap();
        assert_eq!(
            endpoint.socket_url,
            "wss://collector.local/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(endpoint.namespace, "/live");
    }

    #[test]
    fn bare_host_is_treated_as_http() {
        let endpoint = Endpoint::parse("localhost:3000", "").unwrap();
        assert!(endpoint.socket_url.starts_with("ws://localhost:3000/"));
        assert_eq!(endpoint.namespace, "/");
        assert_eq!(endpoint.socket_addr(), "localhost:3000");
    }

    #[test]
    fn socket_addr_fills_default_ports() {
        let plain = Endpoint::parse("http://collector.local/stream", "/").unwrap();
        assert_eq!(plain.socket_addr(), "collector.local:80");
        assert!(!plain.secure);
        let secure = Endpoint::parse("wss://collector.local", "/").unwrap();
        assert_eq!(secure.socket_addr(), "collector.local:443");
        assert!(secure.secure);
        let v6 = Endpoint::parse("ws://[::1]", "/").unwrap();
        assert_eq!(v6.socket_addr(), "[::1]:80");
        let v6_port = Endpoint::parse("ws://[::1]:3000", "/").unwrap();
        assert_eq!(v6_port.socket_addr(), "[::1]:3000");
    }

    #[test]
    fn namespaces_are_normalized() {
        assert_eq!(normalize_namespace(""), "/");
        assert_eq!(normalize_namespace(" stream/ "), "/stream");
        assert_eq!(normalize_namespace("/live"), "/live");
    }

    #[test]
    fn rejects_empty_and_unsupported_endpoints() {
        assert_eq!(
            Endpoint::parse("   ", "/stream"),
            Err(ConnectionError::EmptyEndpoint)
        );
        assert!(matches!(
            Endpoint::parse("ftp://host", "/stream"),
            Err(ConnectionError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            Endpoint::parse("http:///stream", "/stream"),
            Err(ConnectionError::InvalidEndpoint(_))
        ));
    }
}
