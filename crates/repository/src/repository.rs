use std::rc::Rc;

use cache::{CacheNamespace, TtlCache};
use formats::{FacetResponse, Feature, FetchOptions, facets_target, feature_target};
use foundation::FeatureId;
use tracing::{debug, warn};

use crate::transport::Transport;
use crate::{FetchError, RepositoryError};

/// Cache-aside access to records in the remote record store.
///
/// Lookups go through the shared [`TtlCache`] first; only misses reach the
/// transport. Concurrent lookups of the same uncached record are not merged
/// and each issues its own request.
#[derive(Clone)]
pub struct FeatureRepository {
    cache: TtlCache,
    transport: Rc<dyn Transport>,
}

impl FeatureRepository {
    pub fn new(cache: TtlCache, transport: Rc<dyn Transport>) -> Self {
        Self { cache, transport }
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    pub fn transport(&self) -> &Rc<dyn Transport> {
        &self.transport
    }

    /// Resolve record `id` (optionally an alternate geometry of it).
    ///
    /// Identifiers `<= 0` are rejected before any I/O. Failed or malformed
    /// responses leave the cache untouched.
    pub async fn fetch(&self, id: i64, options: &FetchOptions) -> Result<Feature, RepositoryError> {
        let id = FeatureId::new(id)?;
        let target = feature_target(id, options);
        let key = self.cache.key_for(&target, CacheNamespace::Feature);

        if let Some(feature) = self.cache.get::<Feature>(&key) {
            return Ok(feature);
        }

        debug!(%target, "fetching record");
        let body = self
            .transport
            .get_text(&target)
            .await
            .map_err(|e| FetchError::new(target.as_str(), e))?;

        let feature = Feature::from_json(&body).map_err(|e| {
            warn!(%target, error = %e, "record store returned a malformed document");
            FetchError::malformed(target.as_str(), e)
        })?;

        self.cache.set(&key, &feature);
        Ok(feature)
    }

    /// Display label of record `id`, if the record carries one.
    ///
    /// Labels are cached separately from the record itself, under the same
    /// logical target.
    pub async fn fetch_label(&self, id: i64) -> Result<Option<String>, RepositoryError> {
        let fid = FeatureId::new(id)?;
        let target = feature_target(fid, &FetchOptions::default());
        let key = self.cache.key_for(&target, CacheNamespace::Namify);

        if let Some(label) = self.cache.get::<String>(&key) {
            return Ok(Some(label));
        }

        let feature = self.fetch(id, &FetchOptions::default()).await?;
        let label = feature.label().map(str::to_string);
        if let Some(label) = &label {
            self.cache.set(&key, label);
        }
        Ok(label)
    }

    /// Facet counts for a listing path, with the deprecation facet collapsed
    /// into its two buckets.
    pub async fn fetch_facets(
        &self,
        path: &str,
        facet: &str,
    ) -> Result<Vec<FacetResponse>, FetchError> {
        let target = facets_target(path, facet);
        let key = self.cache.key_for(&target, CacheNamespace::Facets);

        if let Some(facets) = self.cache.get::<Vec<FacetResponse>>(&key) {
            return Ok(facets);
        }

        let body = self
            .transport
            .get_text(&target)
            .await
            .map_err(|e| FetchError::new(target.as_str(), e))?;
        let facets: Vec<FacetResponse> = FacetResponse::list_from_json(&body)
            .map_err(|e| FetchError::malformed(target.as_str(), e))?
            .into_iter()
            .map(FacetResponse::normalized)
            .collect();

        self.cache.set(&key, &facets);
        Ok(facets)
    }
}
