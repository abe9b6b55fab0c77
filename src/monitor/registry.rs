use crate::tls::normalize_domain;

/// Ordered set of monitored domains.
///
/// By default identity is the trimmed input string, so `https://x.com` and
/// `x.com` are separate entries. With normalization enabled the bare host is
/// stored instead and both spellings collapse into one entry.
#[derive(Debug, Clone, Default)]
pub struct DomainRegistry {
    domains: Vec<String>,
    normalize: bool,
}

impl DomainRegistry {
    pub fn new(normalize: bool) -> Self {
        Self {
            domains: Vec::new(),
            normalize,
        }
    }

    /// Registry key for a user-supplied domain
    pub fn identity(&self, domain: &str) -> String {
        if self.normalize {
            normalize_domain(domain)
        } else {
            domain.trim().to_string()
        }
    }

    /// Returns the stored identity when the domain was not already present
    pub fn add(&mut self, domain: &str) -> Option<String> {
        let identity = self.identity(domain);
        if identity.is_empty() || self.domains.contains(&identity) {
            return None;
        }
        self.domains.push(identity.clone());
        Some(identity)
    }

    /// Returns the removed identity, if it was present
    pub fn remove(&mut self, domain: &str) -> Option<String> {
        let identity = self.identity(domain);
        let idx = self.domains.iter().position(|d| *d == identity)?;
        Some(self.domains.remove(idx))
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.domains.iter().any(|d| d == identity)
    }

    pub fn list(&self) -> Vec<String> {
        self.domains.clone()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_noop_when_present() {
        let mut registry = DomainRegistry::default();
        assert_eq!(registry.add("example.com"), Some("example.com".to_string()));
        assert_eq!(registry.add("example.com"), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_add_trims_and_rejects_empty() {
        let mut registry = DomainRegistry::default();
        assert_eq!(registry.add("  example.com "), Some("example.com".to_string()));
        assert_eq!(registry.add("   "), None);
        assert_eq!(registry.list(), vec!["example.com"]);
    }

    #[test]
    fn test_raw_spellings_are_distinct() {
        let mut registry = DomainRegistry::default();
        registry.add("https://x.com");
        registry.add("x.com");
        assert_eq!(registry.list(), vec!["https://x.com", "x.com"]);
    }

    #[test]
    fn test_normalized_spellings_collapse() {
        let mut registry = DomainRegistry::new(true);
        assert_eq!(registry.add("https://www.x.com/"), Some("x.com".to_string()));
        assert_eq!(registry.add("x.com"), None);
        assert_eq!(registry.remove("http://x.com"), Some("x.com".to_string()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_preserves_insertion_order() {
        let mut registry = DomainRegistry::default();
        for d in ["c.example", "a.example", "b.example"] {
            registry.add(d);
        }
        assert_eq!(registry.list(), vec!["c.example", "a.example", "b.example"]);

        registry.remove("a.example");
        assert_eq!(registry.list(), vec!["c.example", "b.example"]);
        assert_eq!(registry.remove("a.example"), None);
    }
}
