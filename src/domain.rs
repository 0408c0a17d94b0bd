use url::Url;

/// Common two-part public suffixes like .co.uk, .com.br, .gov.br
const TWO_PART_SUFFIXES: [&str; 18] = [
    "co.uk", "com.au", "co.jp", "co.kr", "com.br", "gov.br", "co.za", "com.mx", "co.in",
    "com.sg", "co.nz", "com.ar", "co.il", "org.uk", "net.au", "gov.uk", "ac.uk", "edu.au",
];

/// Hostname helpers shared by the detectors.
pub struct DomainUtils;

impl DomainUtils {
    /// Lowercased host of a URL, if it has one.
    pub fn host_of(url: &str) -> Option<String> {
        Url::parse(url)
            .ok()?
            .host_str()
            .map(|h| h.to_lowercase())
    }

    /// Canonicalize a hostname (lowercase, strip one leading "www.").
    pub fn canonicalize(host: &str) -> String {
        let host_lower = host.to_lowercase();
        if let Some(stripped) = host_lower.strip_prefix("www.") {
            stripped.to_string()
        } else {
            host_lower
        }
    }

    /// True when two hostnames differ at most by a "www." prefix.
    pub fn is_www_variant(a: &str, b: &str) -> bool {
        Self::canonicalize(a) == Self::canonicalize(b)
    }

    /// Reduce a hostname to its registrable domain (domain + public suffix).
    /// e.g., "accounts.google.com" -> "google.com", "login.bb.com.br" -> "bb.com.br"
    pub fn registrable_domain(host: &str) -> String {
        let host = host.to_lowercase();
        let parts: Vec<&str> = host.split('.').collect();

        if parts.len() < 2 {
            // Single-label hosts (localhost) and empty strings stay as-is
            return host;
        }

        // IP literals have no registrable domain
        if parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())) {
            return host;
        }

        let root = format!("{}.{}", parts[parts.len() - 2], parts[parts.len() - 1]);

        if parts.len() >= 3 && TWO_PART_SUFFIXES.contains(&root.as_str()) {
            return format!(
                "{}.{}.{}",
                parts[parts.len() - 3],
                parts[parts.len() - 2],
                parts[parts.len() - 1]
            );
        }

        root
    }

    /// Drop the public suffix of a hostname, leaving the part one entity
    /// actually chose. e.g., "paypa1-login.tk" -> "paypa1-login",
    /// "login.bb.com.br" -> "login.bb". Hosts without a recognizable suffix
    /// are returned unchanged.
    pub fn strip_public_suffix(host: &str) -> String {
        let host = host.to_lowercase();
        let parts: Vec<&str> = host.split('.').collect();

        if parts.len() < 2 {
            return host;
        }

        let last_two = format!("{}.{}", parts[parts.len() - 2], parts[parts.len() - 1]);
        let suffix_labels = if parts.len() >= 3 && TWO_PART_SUFFIXES.contains(&last_two.as_str()) {
            2
        } else {
            1
        };

        parts[..parts.len() - suffix_labels].join(".")
    }

    /// Check whether a hostname matches a provider list entry exactly or as
    /// a subdomain of one (host ends with ".{entry}").
    pub fn matches_provider_list<'a, I>(host: &str, providers: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        let host_lower = host.to_lowercase();
        for provider in providers {
            let provider_lower = provider.to_lowercase();
            if host_lower == provider_lower
                || host_lower.ends_with(&format!(".{}", provider_lower))
            {
                return true;
            }
        }
        false
    }
}
