use foundation::FeatureId;

use crate::feature::AltGeometry;

/// Discriminators selecting an alternate geometry variant of a record.
///
/// The default value requests the record's primary geometry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FetchOptions {
    pub alt: bool,
    pub source: Option<String>,
    pub function: Option<String>,
    pub extra: Option<String>,
}

impl FetchOptions {
    pub fn alternate(
        source: impl Into<String>,
        function: Option<String>,
        extra: Option<String>,
    ) -> Self {
        Self {
            alt: true,
            source: Some(source.into()),
            function,
            extra,
        }
    }

    pub fn is_primary(&self) -> bool {
        *self == FetchOptions::default()
    }
}

impl From<&AltGeometry> for FetchOptions {
    fn from(alt: &AltGeometry) -> Self {
        FetchOptions::alternate(alt.source.clone(), alt.function.clone(), alt.extra.clone())
    }
}

/// Canonical request target for a record, relative to the store's root.
///
/// `/id/{id}/geojson`, followed by `alt`, `source`, `function`, `extra` in
/// that fixed order for whichever are set. Values are percent-encoded, so
/// distinct options always yield distinct targets.
pub fn feature_target(id: FeatureId, options: &FetchOptions) -> String {
    let mut target = format!("/id/{id}/geojson");

    let mut params: Vec<(&str, &str)> = Vec::new();
    if options.alt {
        params.push(("alt", "true"));
    }
    if let Some(v) = options.source.as_deref() {
        params.push(("source", v));
    }
    if let Some(v) = options.function.as_deref() {
        params.push(("function", v));
    }
    if let Some(v) = options.extra.as_deref() {
        params.push(("extra", v));
    }

    for (i, (k, v)) in params.into_iter().enumerate() {
        target.push(if i == 0 { '?' } else { '&' });
        target.push_str(k);
        target.push('=');
        target.push_str(&urlencoding::encode(v));
    }
    target
}

/// Relative target of the facet endpoint for a listing path.
pub fn facets_target(path: &str, facet: &str) -> String {
    let sep = if path.contains('?') { '&' } else { '?' };
    format!("{path}{sep}facet={}", urlencoding::encode(facet))
}

#[cfg(test)]
mod tests {
    use super::{FetchOptions, facets_target, feature_target};
    use foundation::FeatureId;
    use std::collections::HashSet;

    fn id(raw: i64) -> FeatureId {
        FeatureId::new(raw).unwrap()
    }

    #[test]
    fn primary_target_has_no_query() {
        assert_eq!(
            feature_target(id(1108830809), &FetchOptions::default()),
            "/id/1108830809/geojson"
        );
        assert!(FetchOptions::default().is_primary());
    }

    #[test]
    fn alternate_params_in_fixed_order() {
        let opts = FetchOptions::alternate(
            "whosonfirst",
            Some("reversegeo".to_string()),
            Some("display".to_string()),
        );
        assert_eq!(
            feature_target(id(42), &opts),
            "/id/42/geojson?alt=true&source=whosonfirst&function=reversegeo&extra=display"
        );
    }

    #[test]
    fn target_is_stable_and_injective() {
        let variants = vec![
            FetchOptions::default(),
            FetchOptions {
                alt: true,
                ..Default::default()
            },
            FetchOptions {
                source: Some("a".into()),
                ..Default::default()
            },
            FetchOptions {
                source: Some(String::new()),
                ..Default::default()
            },
            FetchOptions::alternate("a", None, None),
            FetchOptions::alternate("a&function=b", None, None),
            FetchOptions::alternate("a", Some("b".into()), None),
            FetchOptions::alternate("a", None, Some("b".into())),
        ];
        let targets: HashSet<String> = variants.iter().map(|o| feature_target(id(7), o)).collect();
        assert_eq!(targets.len(), variants.len());

        for o in &variants {
            assert_eq!(feature_target(id(7), o), feature_target(id(7), &o.clone()));
        }
        assert_ne!(
            feature_target(id(7), &FetchOptions::default()),
            feature_target(id(8), &FetchOptions::default())
        );
    }

    #[test]
    fn option_values_are_percent_encoded() {
        assert_eq!(
            feature_target(id(1), &FetchOptions::alternate("a b#c/d", Some("naïve".into()), None)),
            "/id/1/geojson?alt=true&source=a%20b%23c%2Fd&function=na%C3%AFve"
        );
        assert_eq!(
            facets_target("/placetypes/region", "wof:country"),
            "/placetypes/region?facet=wof%3Acountry"
        );
    }

    #[test]
    fn facet_targets() {
        assert_eq!(facets_target("/placetypes/locality", "country"), "/placetypes/locality?facet=country");
        assert_eq!(facets_target("/search?q=x", "placetype"), "/search?q=x&facet=placetype");
    }
}
