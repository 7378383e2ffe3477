//! Restaurant data gateway
//!
//! Fetches restaurants from the reviews server, mirrors them into the local
//! cache, and serves them from that cache when the server cannot be reached.
//! Filtered views and the favorite toggle are built on top of a single fetch.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{distinct_cuisines, distinct_neighborhoods, Filter, Restaurant, RestaurantId};
use crate::cache::{CacheError, CacheManager};

/// Server used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:1337";

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur when fetching restaurant data
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The server answered with a non-success status
    #[error("Request failed. Returned status of {status}")]
    Remote {
        /// HTTP status returned by the server
        status: StatusCode,
    },

    /// No response was received (offline, DNS failure, timeout)
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the expected JSON
    #[error("Failed to parse server response: {0}")]
    Decode(String),

    /// No restaurant with the requested id exists
    #[error("Restaurant does not exist: {0}")]
    NotFound(RestaurantId),

    /// The server was unreachable and the cache had nothing to offer
    #[error("Server unreachable and no cached restaurants available: {source}")]
    Offline {
        /// The transport failure that triggered the cache fallback
        #[source]
        source: reqwest::Error,
    },
}

/// Which path a favorite toggle took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteSync {
    /// The server accepted the change and its copy was cached
    Confirmed,
    /// The server could not be updated; only the local copy changed
    LocalOnly,
}

/// Connection settings for the gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Server root, without the `/restaurants` path
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Client for the restaurant endpoints with an offline cache
///
/// Clone is cheap: the HTTP client, cache lock and pending-write list are shared.
#[derive(Debug, Clone)]
pub struct RestaurantGateway {
    /// HTTP client for making requests
    http_client: Client,
    /// Cache manager for the offline copy, if a cache directory is available
    cache_manager: Option<CacheManager>,
    /// Server root
    base_url: String,
    /// Background cache writes that have not been awaited yet
    pending_writes: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl RestaurantGateway {
    /// Creates a gateway for the default server using the XDG cache directory
    pub fn new() -> Result<Self, GatewayError> {
        Self::with_config(GatewayConfig::default(), CacheManager::new())
    }

    /// Creates a gateway with explicit settings and an optional cache
    pub fn with_config(
        config: GatewayConfig,
        cache_manager: Option<CacheManager>,
    ) -> Result<Self, GatewayError> {
        let http_client = Client::builder().timeout(config.timeout).build()?;

        if cache_manager.is_none() {
            warn!("No cache directory available; running without offline cache");
        }

        Ok(Self {
            http_client,
            cache_manager,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            pending_writes: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Server root this gateway talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Cache backing this gateway, if any
    pub fn cache(&self) -> Option<&CacheManager> {
        self.cache_manager.as_ref()
    }

    fn restaurants_url(&self) -> String {
        format!("{}/restaurants", self.base_url)
    }

    fn favorite_url(&self, id: &RestaurantId, is_favorite: bool) -> String {
        format!(
            "{}/restaurants/{}/?is_favorite={}",
            self.base_url, id, is_favorite
        )
    }

    /// Fetches all restaurants
    ///
    /// # Behavior
    /// - On success, mirrors the list into the cache in the background and returns it
    /// - On a non-success status, returns `GatewayError::Remote`
    /// - When no response is received, returns the cached restaurants if there
    ///   are any, otherwise `GatewayError::Offline`
    pub async fn fetch_all(&self) -> Result<Vec<Restaurant>, GatewayError> {
        match self.fetch_from_api().await {
            Ok(restaurants) => {
                self.mirror_in_background(&restaurants);
                Ok(restaurants)
            }
            Err(GatewayError::Transport(error)) => self.fall_back_to_cache(error).await,
            Err(error) => Err(error),
        }
    }

    /// Fetches the restaurant with the given id
    ///
    /// `7` and `"7"` name the same restaurant.
    pub async fn get_by_id(
        &self,
        id: impl Into<RestaurantId>,
    ) -> Result<Restaurant, GatewayError> {
        let id = id.into();
        self.fetch_all()
            .await?
            .into_iter()
            .find(|restaurant| restaurant.id == id)
            .ok_or(GatewayError::NotFound(id))
    }

    /// Fetches restaurants serving the given cuisine (`"all"` for any)
    pub async fn filter_by_cuisine(&self, cuisine: &str) -> Result<Vec<Restaurant>, GatewayError> {
        self.filter(&Filter::cuisine(cuisine)).await
    }

    /// Fetches restaurants in the given neighborhood (`"all"` for any)
    pub async fn filter_by_neighborhood(
        &self,
        neighborhood: &str,
    ) -> Result<Vec<Restaurant>, GatewayError> {
        self.filter(&Filter::neighborhood(neighborhood)).await
    }

    /// Fetches restaurants matching both dimensions (`"all"` disables one)
    pub async fn filter_by_cuisine_and_neighborhood(
        &self,
        cuisine: &str,
        neighborhood: &str,
    ) -> Result<Vec<Restaurant>, GatewayError> {
        self.filter(&Filter::new(cuisine, neighborhood)).await
    }

    /// Fetches restaurants matching the filter, in server order
    pub async fn filter(&self, filter: &Filter) -> Result<Vec<Restaurant>, GatewayError> {
        let restaurants = self.fetch_all().await?;
        Ok(filter.apply(&restaurants))
    }

    /// Lists neighborhoods in first-seen order without duplicates
    pub async fn list_neighborhoods(&self) -> Result<Vec<String>, GatewayError> {
        let restaurants = self.fetch_all().await?;
        Ok(distinct_neighborhoods(&restaurants))
    }

    /// Lists cuisines in first-seen order without duplicates
    pub async fn list_cuisines(&self) -> Result<Vec<String>, GatewayError> {
        let restaurants = self.fetch_all().await?;
        Ok(distinct_cuisines(&restaurants))
    }

    /// Marks a restaurant as favorite (or not) on the server
    ///
    /// On success the server's copy is cached and replaces `restaurant`. On any
    /// failure the flag is set on `restaurant` directly and that copy is cached
    /// on a best-effort basis. Cache failures are logged, never returned.
    pub async fn toggle_favorite(
        &self,
        restaurant: &mut Restaurant,
        is_favorite: bool,
    ) -> FavoriteSync {
        match self.put_favorite(&restaurant.id, is_favorite).await {
            Ok(updated) => {
                debug!(id = %updated.id, is_favorite, "Favorite confirmed by server");
                self.store(updated.clone()).await;
                *restaurant = updated;
                FavoriteSync::Confirmed
            }
            Err(error) => {
                warn!(
                    id = %restaurant.id,
                    is_favorite,
                    %error,
                    "Favorite update failed, keeping local change"
                );
                restaurant.is_favorite = is_favorite;
                self.store(restaurant.clone()).await;
                FavoriteSync::LocalOnly
            }
        }
    }

    /// Waits for every background cache write spawned so far
    pub async fn settle(&self) {
        let handles: Vec<JoinHandle<()>> = match self.pending_writes.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        };

        for result in futures::future::join_all(handles).await {
            if let Err(error) = result {
                warn!(%error, "Background cache write did not complete");
            }
        }
    }

    /// Fetches the restaurant list directly from the server
    async fn fetch_from_api(&self) -> Result<Vec<Restaurant>, GatewayError> {
        let url = self.restaurants_url();
        debug!(%url, "Fetching restaurants");

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Remote { status });
        }

        let body = response.bytes().await?;
        decode(&body)
    }

    /// Sends the favorite change and decodes the server's copy
    async fn put_favorite(
        &self,
        id: &RestaurantId,
        is_favorite: bool,
    ) -> Result<Restaurant, GatewayError> {
        let url = self.favorite_url(id, is_favorite);
        debug!(%url, "Updating favorite");

        let response = self.http_client.put(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Remote { status });
        }

        let body = response.bytes().await?;
        decode(&body)
    }

    /// Serves cached restaurants after a transport failure
    async fn fall_back_to_cache(
        &self,
        error: reqwest::Error,
    ) -> Result<Vec<Restaurant>, GatewayError> {
        let Some(cache) = self.cache_manager.clone() else {
            return Err(GatewayError::Offline { source: error });
        };

        match run_blocking(move || cache.read_all()).await {
            Ok(restaurants) if !restaurants.is_empty() => {
                info!(
                    count = restaurants.len(),
                    %error,
                    "Unable to reach server, using cached restaurants"
                );
                Ok(restaurants)
            }
            Ok(_) => Err(GatewayError::Offline { source: error }),
            Err(cache_error) => {
                warn!(error = %cache_error, "Offline cache unavailable");
                Err(GatewayError::Offline { source: error })
            }
        }
    }

    /// Spawns a cache mirror of `restaurants` without waiting for it
    fn mirror_in_background(&self, restaurants: &[Restaurant]) {
        let Some(cache) = self.cache_manager.clone() else {
            return;
        };
        let restaurants = restaurants.to_vec();

        let handle = tokio::task::spawn_blocking(move || {
            if let Err(error) = cache.mirror(&restaurants) {
                warn!(%error, "Failed to mirror restaurants into cache");
            }
        });

        let mut pending = match self.pending_writes.lock() {
            Ok(pending) => pending,
            Err(poisoned) => poisoned.into_inner(),
        };
        pending.retain(|handle| !handle.is_finished());
        pending.push(handle);
    }

    /// Upserts one restaurant, logging instead of failing
    async fn store(&self, restaurant: Restaurant) {
        let Some(cache) = self.cache_manager.clone() else {
            return;
        };
        let id = restaurant.id.clone();
        if let Err(error) = run_blocking(move || cache.upsert(&restaurant)).await {
            warn!(id = %id, %error, "Failed to cache restaurant");
        }
    }
}

/// Runs a cache operation on the blocking pool
async fn run_blocking<T, F>(operation: F) -> Result<T, CacheError>
where
    F: FnOnce() -> Result<T, CacheError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(operation)
        .await
        .map_err(|e| CacheError::Unavailable(e.to_string()))?
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, GatewayError> {
    serde_json::from_slice(body).map_err(|e| GatewayError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ids, sample_restaurant};
    use mockito::{Matcher, Server};
    use serde_json::json;
    use tempfile::TempDir;

    /// Address nothing listens on, so requests fail without a response
    const UNREACHABLE: &str = "http://127.0.0.1:1";

    fn two_restaurants_body() -> String {
        json!([
            {
                "id": 1, "name": "Pasta Place", "cuisine_type": "Italian",
                "neighborhood": "SoHo", "latlng": { "lat": 40.72, "lng": -74.0 }
            },
            {
                "id": 2, "name": "Thai Time", "cuisine_type": "Thai",
                "neighborhood": "Uptown", "latlng": { "lat": 40.8, "lng": -73.95 }
            }
        ])
        .to_string()
    }

    fn gateway(base_url: &str, cache: Option<CacheManager>) -> RestaurantGateway {
        let config = GatewayConfig {
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        };
        RestaurantGateway::with_config(config, cache).expect("Failed to build gateway")
    }

    fn temp_cache() -> (CacheManager, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        (CacheManager::with_dir(temp_dir.path().to_path_buf()), temp_dir)
    }

    #[test]
    fn test_urls_are_built_from_trimmed_base() {
        let gateway = gateway("http://example.test:1337/", None);
        assert_eq!(gateway.base_url(), "http://example.test:1337");
        assert_eq!(gateway.restaurants_url(), "http://example.test:1337/restaurants");
        assert_eq!(
            gateway.favorite_url(&RestaurantId::Number(3), true),
            "http://example.test:1337/restaurants/3/?is_favorite=true"
        );
    }

    #[tokio::test]
    async fn test_fetch_all_returns_and_mirrors_restaurants() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/restaurants")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(two_restaurants_body())
            .create_async()
            .await;
        let (cache, _temp_dir) = temp_cache();
        let gateway = gateway(&server.url(), Some(cache.clone()));

        let restaurants = gateway.fetch_all().await.expect("Fetch should succeed");
        gateway.settle().await;

        assert_eq!(restaurants.len(), 2);
        assert_eq!(cache.read_all().unwrap(), restaurants);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_all_reports_remote_status() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/restaurants")
            .with_status(500)
            .create_async()
            .await;
        let (cache, _temp_dir) = temp_cache();
        cache.upsert(&sample_restaurant(1, "Thai", "Uptown")).unwrap();
        let gateway = gateway(&server.url(), Some(cache));

        let result = gateway.fetch_all().await;

        match result {
            Err(GatewayError::Remote { status }) => assert_eq!(status.as_u16(), 500),
            other => panic!("Expected remote error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_all_reports_undecodable_body() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/restaurants")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;
        let gateway = gateway(&server.url(), None);

        assert!(matches!(gateway.fetch_all().await, Err(GatewayError::Decode(_))));
    }

    #[tokio::test]
    async fn test_transport_failure_serves_cached_restaurants() {
        let (cache, _temp_dir) = temp_cache();
        let cached = sample_restaurant(4, "Thai", "Uptown");
        cache.upsert(&cached).unwrap();
        let gateway = gateway(UNREACHABLE, Some(cache));

        let restaurants = gateway.fetch_all().await.expect("Cache fallback should succeed");

        assert_eq!(restaurants, vec![cached]);
    }

    #[tokio::test]
    async fn test_transport_failure_with_empty_cache_is_offline() {
        let (cache, _temp_dir) = temp_cache();
        let gateway = gateway(UNREACHABLE, Some(cache));

        assert!(matches!(
            gateway.fetch_all().await,
            Err(GatewayError::Offline { .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_without_cache_is_offline() {
        let gateway = gateway(UNREACHABLE, None);

        let error = gateway.fetch_all().await.unwrap_err();

        assert!(matches!(error, GatewayError::Offline { .. }));
        assert!(error.to_string().contains("no cached restaurants"));
    }

    #[tokio::test]
    async fn test_get_by_id_found_and_missing() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/restaurants")
            .with_status(200)
            .with_body(two_restaurants_body())
            .expect(2)
            .create_async()
            .await;
        let gateway = gateway(&server.url(), None);

        let found = gateway.get_by_id(2u64).await.expect("Restaurant 2 exists");
        assert_eq!(found.name, "Thai Time");

        match gateway.get_by_id(99u64).await {
            Err(GatewayError::NotFound(id)) => assert_eq!(id, RestaurantId::Number(99)),
            other => panic!("Expected not found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_string_ids_decode_and_resolve() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/restaurants")
            .with_status(200)
            .with_body(
                json!([
                    { "id": "1", "name": "A", "cuisine_type": "Thai", "neighborhood": "Uptown" },
                    { "id": 2, "name": "B", "cuisine_type": "Pizza", "neighborhood": "SoHo" },
                    { "id": "tu-casa", "name": "C", "cuisine_type": "Mexican", "neighborhood": "SoHo" }
                ])
                .to_string(),
            )
            .expect(3)
            .create_async()
            .await;
        let gateway = gateway(&server.url(), None);

        let restaurants = gateway.fetch_all().await.expect("String ids should decode");
        assert_eq!(restaurants.len(), 3);
        assert_eq!(restaurants[0].id, RestaurantId::Number(1));

        let by_number = gateway.get_by_id(1u64).await.expect("Restaurant 1 exists");
        assert_eq!(by_number.name, "A");

        let by_text = gateway.get_by_id("tu-casa").await.expect("tu-casa exists");
        assert_eq!(by_text.name, "C");
    }

    #[tokio::test]
    async fn test_failed_mirror_does_not_fail_fetch() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/restaurants")
            .with_status(200)
            .with_body(two_restaurants_body())
            .create_async()
            .await;
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the cache directory should be makes every write fail
        let blocked = temp_dir.path().join("blocked");
        std::fs::write(&blocked, "file").unwrap();
        let gateway = gateway(&server.url(), Some(CacheManager::with_dir(blocked.clone())));

        let restaurants = gateway.fetch_all().await.expect("Fetch should ignore the cache");
        gateway.settle().await;

        assert_eq!(restaurants.len(), 2);
        assert_eq!(restaurants[1].name, "Thai Time");
        assert!(blocked.is_file());
    }

    #[tokio::test]
    async fn test_filters_and_lists() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/restaurants")
            .with_status(200)
            .with_body(two_restaurants_body())
            .create_async()
            .await;
        let gateway = gateway(&server.url(), None);

        let thai = gateway.filter_by_cuisine("Thai").await.unwrap();
        assert_eq!(thai.into_iter().map(|r| r.id).collect::<Vec<_>>(), ids(&[2]));

        let everything = gateway.filter_by_cuisine("all").await.unwrap();
        assert_eq!(everything.len(), 2);

        let soho = gateway.filter_by_neighborhood("SoHo").await.unwrap();
        assert_eq!(soho.into_iter().map(|r| r.id).collect::<Vec<_>>(), ids(&[1]));

        let both_all = gateway
            .filter_by_cuisine_and_neighborhood("all", "all")
            .await
            .unwrap();
        assert_eq!(both_all, gateway.fetch_all().await.unwrap());

        let none = gateway
            .filter_by_cuisine_and_neighborhood("Thai", "SoHo")
            .await
            .unwrap();
        assert!(none.is_empty());

        assert_eq!(gateway.list_cuisines().await.unwrap(), vec!["Italian", "Thai"]);
        assert_eq!(
            gateway.list_neighborhoods().await.unwrap(),
            vec!["SoHo", "Uptown"]
        );
    }

    #[tokio::test]
    async fn test_toggle_favorite_confirmed_caches_server_copy() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/restaurants/1/")
            .match_query(Matcher::UrlEncoded("is_favorite".into(), "true".into()))
            .with_status(200)
            .with_body(
                json!({
                    "id": 1, "name": "Pasta Place", "cuisine_type": "Italian",
                    "neighborhood": "SoHo", "is_favorite": "true",
                    "updatedAt": "2018-07-01T10:00:00.000Z"
                })
                .to_string(),
            )
            .create_async()
            .await;
        let (cache, _temp_dir) = temp_cache();
        let gateway = gateway(&server.url(), Some(cache.clone()));
        let mut restaurant = sample_restaurant(1, "Italian", "SoHo");

        let sync = gateway.toggle_favorite(&mut restaurant, true).await;

        assert_eq!(sync, FavoriteSync::Confirmed);
        assert!(restaurant.is_favorite);
        assert_eq!(restaurant.name, "Pasta Place");
        let cached = cache.read_all().unwrap();
        assert_eq!(cached, vec![restaurant]);
        assert!(cached[0].extra.contains_key("updatedAt"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_toggle_favorite_offline_is_optimistic() {
        let (cache, _temp_dir) = temp_cache();
        let gateway = gateway(UNREACHABLE, Some(cache.clone()));
        let mut restaurant = sample_restaurant(6, "Thai", "Uptown");

        let sync = gateway.toggle_favorite(&mut restaurant, true).await;

        assert_eq!(sync, FavoriteSync::LocalOnly);
        assert!(restaurant.is_favorite);
        let cached = cache.read_all().unwrap();
        assert_eq!(cached.len(), 1);
        assert!(cached[0].is_favorite);
    }

    #[tokio::test]
    async fn test_toggle_favorite_rejected_by_server_is_optimistic() {
        let mut server = Server::new_async().await;
        server
            .mock("PUT", "/restaurants/2/")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;
        let gateway = gateway(&server.url(), None);
        let mut restaurant = sample_restaurant(2, "Thai", "Uptown");
        restaurant.is_favorite = true;

        let sync = gateway.toggle_favorite(&mut restaurant, false).await;

        assert_eq!(sync, FavoriteSync::LocalOnly);
        assert!(!restaurant.is_favorite);
    }

    #[tokio::test]
    async fn test_toggle_favorite_swallows_cache_failure() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the cache directory should be makes every write fail
        let blocked = temp_dir.path().join("blocked");
        std::fs::write(&blocked, "file").unwrap();
        let gateway = gateway(UNREACHABLE, Some(CacheManager::with_dir(blocked)));
        let mut restaurant = sample_restaurant(3, "Thai", "Uptown");

        let sync = gateway.toggle_favorite(&mut restaurant, true).await;

        assert_eq!(sync, FavoriteSync::LocalOnly);
        assert!(restaurant.is_favorite);
    }

    #[tokio::test]
    async fn test_settle_without_pending_writes_returns() {
        let gateway = gateway(UNREACHABLE, None);
        gateway.settle().await;
    }
}
