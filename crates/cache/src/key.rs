use std::fmt;

/// Cache consumers sharing one backing store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    /// Raw feature documents, keyed by fetch target.
    Feature,
    /// Resolved display labels.
    Namify,
    /// Facet groupings for listing pages.
    Facets,
}

impl CacheNamespace {
    fn suffix(self) -> &'static str {
        match self {
            CacheNamespace::Feature => "",
            CacheNamespace::Namify => "#namify",
            CacheNamespace::Facets => "#facets",
        }
    }
}

/// Physical key in the backing store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map a logical lookup to its physical key.
///
/// `#` is reserved for namespace suffixes and escaped in the logical part,
/// so keys from different namespaces can never collide. `%` is escaped
/// first so an already-escaped `%23` stays distinct from a literal `#`.
pub fn key_for(logical: &str, namespace: CacheNamespace) -> CacheKey {
    let mut key = logical.replace('%', "%25").replace('#', "%23");
    key.push_str(namespace.suffix());
    CacheKey(key)
}

#[cfg(test)]
mod tests {
    use super::{CacheNamespace, key_for};

    #[test]
    fn feature_keys_are_the_target() {
        assert_eq!(
            key_for("/id/42/geojson", CacheNamespace::Feature).as_str(),
            "/id/42/geojson"
        );
        assert_eq!(
            key_for("/id/42/geojson", CacheNamespace::Namify).as_str(),
            "/id/42/geojson#namify"
        );
    }

    #[test]
    fn namespaces_never_collide() {
        let path = "/id/42/geojson";
        let a = key_for(path, CacheNamespace::Feature);
        let b = key_for(path, CacheNamespace::Namify);
        let c = key_for(path, CacheNamespace::Facets);
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);

        // A logical key that looks like another namespace's physical key.
        let forged = key_for("/id/42/geojson#namify", CacheNamespace::Feature);
        assert_ne!(forged, b);
    }

    #[test]
    fn escaped_and_literal_hash_stay_distinct() {
        let literal = key_for("/x#y?facet=country", CacheNamespace::Facets);
        let escaped = key_for("/x%23y?facet=country", CacheNamespace::Facets);
        assert_ne!(literal, escaped);
        assert_eq!(literal.as_str(), "/x%23y?facet=country#facets");
        assert_eq!(escaped.as_str(), "/x%2523y?facet=country#facets");

        assert_ne!(
            key_for("/a%", CacheNamespace::Feature),
            key_for("/a%25", CacheNamespace::Feature)
        );
    }

    #[test]
    fn deterministic() {
        assert_eq!(
            key_for("/x", CacheNamespace::Facets),
            key_for("/x", CacheNamespace::Facets)
        );
    }
}
