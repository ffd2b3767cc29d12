pub mod mount;
pub mod options;

#[cfg(target_arch = "wasm32")]
mod fetch;
#[cfg(target_arch = "wasm32")]
mod leaflet;

#[cfg(target_arch = "wasm32")]
pub use app::*;

#[cfg(target_arch = "wasm32")]
mod app {
    use std::rc::Rc;

    use cache::TtlCache;
    use console_error_panic_hook::set_once;
    use layers::{Services, ServicesConfig};
    use runtime::BrowserSpawner;
    use tracing::{info, warn};
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::future_to_promise;

    use crate::fetch::BrowserTransport;
    use crate::leaflet::LeafletFactory;
    use crate::mount;

    #[wasm_bindgen(start)]
    pub fn start() -> Result<(), JsValue> {
        set_once();
        runtime::logging::init(runtime::logging::DEFAULT_FILTER);
        Ok(())
    }

    /// One per page. Holds the cache, repository and map registry that every
    /// map on the page shares.
    #[wasm_bindgen]
    pub struct Viewer {
        services: Services,
    }

    #[wasm_bindgen]
    impl Viewer {
        /// `root_url` is the record store root; empty means the page's origin.
        /// `config` is an optional JSON `ServicesConfig`.
        #[wasm_bindgen(constructor)]
        pub fn new(root_url: Option<String>, config: Option<String>) -> Result<Viewer, JsValue> {
            let config = match config.as_deref() {
                Some(body) if !body.trim().is_empty() => ServicesConfig::from_json(body)
                    .map_err(|e| JsValue::from_str(&format!("invalid viewer config: {e}")))?,
                _ => ServicesConfig::default(),
            };
            let services = Services::new(
                &config,
                TtlCache::local_storage(),
                Rc::new(BrowserTransport::new(root_url.unwrap_or_default())),
                Rc::new(LeafletFactory),
                Rc::new(BrowserSpawner),
            );
            info!(cache = services.cache.is_available(), "viewer ready");
            Ok(Viewer { services })
        }

        /// Render the record named by the mount element's `data-wof-*`
        /// attributes. On failure the `{mount}-svg` element is shown instead
        /// and the promise rejects.
        pub fn render(&self, mount_id: String) -> js_sys::Promise {
            let compositor = self.services.compositor.clone();
            future_to_promise(async move {
                let Some(el) = element(&mount_id) else {
                    reveal(&mount::fallback_id(&mount_id));
                    return Err(JsValue::from_str(&format!("no element with id {mount_id:?}")));
                };
                let Some(id) = mount::record_id(el.get_attribute(mount::ATTR_ID)) else {
                    reveal(&mount::fallback_id(&mount_id));
                    return Err(JsValue::from_str("missing or invalid data-wof-id"));
                };
                let options = mount::fetch_options(
                    el.get_attribute(mount::ATTR_ALT_SOURCE),
                    el.get_attribute(mount::ATTR_ALT_FUNCTION),
                    el.get_attribute(mount::ATTR_ALT_EXTRA),
                );

                match compositor.render(&mount_id, id, &options).await {
                    Ok(_) => {
                        reveal(&mount_id);
                        Ok(JsValue::UNDEFINED)
                    }
                    Err(err) => {
                        warn!(mount = %mount_id, id, error = %err, "failed to render record");
                        reveal(&mount::fallback_id(&mount_id));
                        Err(JsValue::from_str(&err.to_string()))
                    }
                }
            })
        }

        /// Display label for a record, or `null`.
        pub fn label(&self, id: f64) -> js_sys::Promise {
            let repository = self.services.repository.clone();
            future_to_promise(async move {
                let Some(id) = mount::js_record_id(id) else {
                    return Err(JsValue::from_str(&format!("not a valid record identifier: {id}")));
                };
                match repository.fetch_label(id).await {
                    Ok(Some(label)) => Ok(JsValue::from_str(&label)),
                    Ok(None) => Ok(JsValue::NULL),
                    Err(err) => Err(JsValue::from_str(&err.to_string())),
                }
            })
        }

        /// Facet counts for a listing path, as parsed JSON.
        pub fn facets(&self, path: String, facet: String) -> js_sys::Promise {
            let repository = self.services.repository.clone();
            future_to_promise(async move {
                let facets = repository
                    .fetch_facets(&path, &facet)
                    .await
                    .map_err(|e| JsValue::from_str(&e.to_string()))?;
                let body = serde_json::to_string(&facets)
                    .map_err(|e| JsValue::from_str(&e.to_string()))?;
                js_sys::JSON::parse(&body)
            })
        }
    }

    fn element(id: &str) -> Option<web_sys::HtmlElement> {
        web_sys::window()?
            .document()?
            .get_element_by_id(id)?
            .dyn_into::<web_sys::HtmlElement>()
            .ok()
    }

    fn reveal(id: &str) {
        if let Some(el) = element(id) {
            let _ = el.style().set_property("display", "block");
        }
    }
}
