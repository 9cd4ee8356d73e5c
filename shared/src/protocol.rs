/// Operational endpoint every documented service exposes; the exporter
/// serves its own index on the same path.
pub const ABOUT_PATH: &str = "/__/about";

/// API-proxy href for a service's own about endpoint, as linked from the
/// HTML index.
pub fn proxy_href(namespace: &str, name: &str) -> String {
    format!("/../../../{}/services/{}:80{}", namespace, name, ABOUT_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_href() {
        assert_eq!(
            proxy_href("billing", "uw-service-refdata"),
            "/../../../billing/services/uw-service-refdata:80/__/about"
        );
    }
}
