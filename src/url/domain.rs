//! Host pattern expansion.
//!
//! Domain patterns name three slices of a concrete host, split on `.`:
//! `%tld%` is the last label, `%sld%` the second-to-last, and
//! `%domain%` the registrable pair `sld.tld`. Expansion is purely
//! textual; callers compare the result against a request host for
//! string equality. A host that parses as an IPv4 address counts as a
//! single label.

/// Substitute `%tld%`, `%domain%` and `%sld%` in `pattern` with the
/// parts derived from `host`.
#[must_use]
pub fn expand_domain(pattern: &str, host: &str) -> String {
    if !pattern.contains('%') {
        return pattern.to_string();
    }
    let (tld, sld, domain) = host_parts(host);
    pattern
        .replace("%domain%", &domain)
        .replace("%sld%", sld)
        .replace("%tld%", tld)
}

/// `(tld, sld, domain)` slices of a host.
pub(crate) fn host_parts(host: &str) -> (&str, &str, String) {
    if is_ipv4(host) {
        return (host, "", host.to_string());
    }
    let labels: Vec<&str> = host.split('.').collect();
    match labels.as_slice() {
        [] | [""] => ("", "", String::new()),
        [only] => (only, "", (*only).to_string()),
        [.., sld, tld] => (tld, sld, format!("{}.{}", sld, tld)),
    }
}

fn is_ipv4(host: &str) -> bool {
    let mut labels = 0;
    for label in host.split('.') {
        if label.is_empty() || label.parse::<u8>().is_err() {
            return false;
        }
        labels += 1;
    }
    labels == 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_subdomain_pattern() {
        assert_eq!(
            expand_domain("%sld%.example.com", "api.example.com"),
            "api.example.com"
        );
        assert_eq!(
            expand_domain("%sld%.example.com", "other.org"),
            "other.example.com"
        );
    }

    #[test]
    fn expands_domain_and_tld() {
        assert_eq!(expand_domain("%domain%", "www.acme.org"), "acme.org");
        assert_eq!(expand_domain("%tld%", "www.acme.org"), "org");
        assert_eq!(expand_domain("api.%domain%", "www.acme.org"), "api.acme.org");
    }

    #[test]
    fn single_label_hosts() {
        assert_eq!(expand_domain("%domain%", "localhost"), "localhost");
        assert_eq!(expand_domain("%tld%", "localhost"), "localhost");
        assert_eq!(expand_domain("x%sld%x", "localhost"), "xx");
    }

    #[test]
    fn ipv4_hosts_are_one_label() {
        assert_eq!(expand_domain("%domain%", "192.168.0.1"), "192.168.0.1");
        assert_eq!(expand_domain("%tld%", "192.168.0.1"), "192.168.0.1");
        assert_eq!(expand_domain("%sld%", "192.168.0.1"), "");
    }

    #[test]
    fn literal_patterns_pass_through() {
        assert_eq!(
            expand_domain("admin.example.com", "whatever.org"),
            "admin.example.com"
        );
    }
}
