//! Pluggable routing oracles: trait abstraction over routing backends.
//!
//! Two implementations, selectable via [`RouteProviderKind`]:
//!
//! - **`EuclideanRouteProvider`**: straight-line legs at a constant speed.
//!   Zero dependencies.
//! - **`OsrmRouteProvider`** (feature `osrm`): calls a local/remote OSRM HTTP
//!   endpoint with bounded retries and backoff.
//!
//! The provider is stored as a `Box<dyn RouteProvider>` ECS resource,
//! constructed from `RouteProviderKind` during scenario building. A routing
//! failure is the distinguished value `None`; callers treat it locally
//! (skipped insertion, infeasible score, aborted assignment) and never abort
//! the tick.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use bevy_ecs::prelude::Resource;
use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::spatial::Coord;

/// Default straight-line travel speed, meters per minute.
pub const DEFAULT_METERS_PER_MINUTE: f64 = 320.0;

/// Default route cache capacity for the cached wrapper.
const DEFAULT_ROUTE_CACHE_CAPACITY: usize = 20_000;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// One leg of a route: from the previous waypoint (or the start) to `end`.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteLeg {
    pub distance_m: f64,
    pub duration_s: f64,
    /// Coordinate this leg ends at; the last leg's `end` is the courier
    /// relocation point when the route completes.
    pub end: Coord,
}

/// Result of a route query: start plus an ordered sequence of waypoints.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    pub distance_m: f64,
    pub duration_s: f64,
    /// Encoded polyline, when the backend provides one.
    pub geometry: Option<String>,
    pub legs: Vec<RouteLeg>,
}

impl Route {
    pub fn duration_mins(&self) -> f64 {
        self.duration_s / 60.0
    }

    /// Final waypoint of the route, if it has any legs.
    pub fn last_waypoint(&self) -> Option<Coord> {
        self.legs.last().map(|leg| leg.end)
    }
}

/// Which routing backend to use. Stored in `ScenarioParams` so it serializes
/// into run parameter sets.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum RouteProviderKind {
    /// Straight-line legs at a constant speed (meters per minute).
    Euclidean { meters_per_minute: f64 },
    /// OSRM HTTP endpoint (e.g. `"http://localhost:5000"`). When
    /// `fallback_to_euclidean` is set, failed queries are retried with the
    /// Euclidean backend at `meters_per_minute`.
    #[cfg(feature = "osrm")]
    Osrm {
        endpoint: String,
        meters_per_minute: f64,
        fallback_to_euclidean: bool,
    },
}

impl Default for RouteProviderKind {
    fn default() -> Self {
        Self::Euclidean {
            meters_per_minute: DEFAULT_METERS_PER_MINUTE,
        }
    }
}

/// Trait for routing backends. Implementations must be `Send + Sync` so the
/// provider can be stored as a shared ECS resource.
pub trait RouteProvider: Send + Sync {
    /// Compute a route from `start` through `waypoints` in order.
    /// Returns `None` on failure (no waypoints, transport error, no route).
    fn route(&self, start: Coord, waypoints: &[Coord]) -> Option<Route>;
}

/// ECS resource wrapping a boxed route provider.
#[derive(Resource)]
pub struct RouteProviderResource(pub Box<dyn RouteProvider>);

// ---------------------------------------------------------------------------
// Euclidean provider (always available)
// ---------------------------------------------------------------------------

/// Routes along straight lines between consecutive points at a constant speed.
pub struct EuclideanRouteProvider {
    meters_per_minute: f64,
}

impl EuclideanRouteProvider {
    pub fn new(meters_per_minute: f64) -> Self {
        let meters_per_minute = if meters_per_minute > 0.0 {
            meters_per_minute
        } else {
            DEFAULT_METERS_PER_MINUTE
        };
        Self { meters_per_minute }
    }
}

impl Default for EuclideanRouteProvider {
    fn default() -> Self {
        Self::new(DEFAULT_METERS_PER_MINUTE)
    }
}

impl RouteProvider for EuclideanRouteProvider {
    fn route(&self, start: Coord, waypoints: &[Coord]) -> Option<Route> {
        if waypoints.is_empty() {
            return None;
        }
        let mut legs = Vec::with_capacity(waypoints.len());
        let mut total_m = 0.0;
        let mut total_s = 0.0;
        let mut prev = start;
        for &wp in waypoints {
            let distance_m = prev.haversine_m(wp);
            let duration_s = distance_m / self.meters_per_minute * 60.0;
            total_m += distance_m;
            total_s += duration_s;
            legs.push(RouteLeg {
                distance_m,
                duration_s,
                end: wp,
            });
            prev = wp;
        }
        Some(Route {
            distance_m: total_m,
            duration_s: total_s,
            geometry: None,
            legs,
        })
    }
}

// ---------------------------------------------------------------------------
// OSRM provider (behind `osrm` feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "osrm")]
pub mod osrm;

// ---------------------------------------------------------------------------
// Caching wrapper
// ---------------------------------------------------------------------------

type RouteKey = Vec<(i64, i64)>;

fn route_key(start: Coord, waypoints: &[Coord]) -> RouteKey {
    let mut key = Vec::with_capacity(waypoints.len() + 1);
    key.push(start.quantized());
    key.extend(waypoints.iter().map(Coord::quantized));
    key
}

/// LRU-cached wrapper around any [`RouteProvider`].
///
/// Cache key is the quantized `(start, waypoint-sequence)` (directional).
/// On cache miss the inner provider is queried; on inner failure the optional
/// Euclidean fallback is tried before returning `None`.
pub struct CachedRouteProvider {
    inner: Box<dyn RouteProvider>,
    cache: Mutex<LruCache<RouteKey, Route>>,
    fallback: Option<EuclideanRouteProvider>,
}

impl CachedRouteProvider {
    /// Create a caching wrapper with the given capacity.
    ///
    /// If `fallback` is set, cache misses that also fail in the inner provider
    /// will be retried with the Euclidean backend.
    pub fn new(
        inner: Box<dyn RouteProvider>,
        capacity: usize,
        fallback: Option<EuclideanRouteProvider>,
    ) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity.max(1)).expect("cache capacity must be > 0"),
            )),
            fallback,
        }
    }
}

impl RouteProvider for CachedRouteProvider {
    fn route(&self, start: Coord, waypoints: &[Coord]) -> Option<Route> {
        if waypoints.is_empty() {
            return None;
        }
        let key = route_key(start, waypoints);

        // Fast path: cache hit
        {
            let mut cache = self.cache.lock().ok()?;
            if let Some(cached) = cache.get(&key) {
                return Some(cached.clone());
            }
        }

        // Slow path: query inner provider
        let result = self.inner.route(start, waypoints).or_else(|| {
            let fallback = self.fallback.as_ref()?;
            tracing::debug!("routing backend failed, falling back to euclidean");
            fallback.route(start, waypoints)
        });

        // Store in cache
        if let Some(ref route) = result {
            if let Ok(mut cache) = self.cache.lock() {
                cache.put(key, route.clone());
            }
        }

        result
    }
}

// ---------------------------------------------------------------------------
// Factory: build a provider from RouteProviderKind
// ---------------------------------------------------------------------------

/// Construct a boxed [`RouteProvider`] from a [`RouteProviderKind`] descriptor.
///
/// - `Euclidean` is returned without caching (it is already cheap).
/// - `Osrm` is wrapped in a [`CachedRouteProvider`] with optional Euclidean
///   fallback on failure.
pub fn build_route_provider(kind: &RouteProviderKind) -> Box<dyn RouteProvider> {
    match kind {
        RouteProviderKind::Euclidean { meters_per_minute } => {
            Box::new(EuclideanRouteProvider::new(*meters_per_minute))
        }

        #[cfg(feature = "osrm")]
        RouteProviderKind::Osrm {
            endpoint,
            meters_per_minute,
            fallback_to_euclidean,
        } => {
            let inner = Box::new(osrm::OsrmRouteProvider::new(endpoint));
            let fallback =
                fallback_to_euclidean.then(|| EuclideanRouteProvider::new(*meters_per_minute));
            Box::new(CachedRouteProvider::new(
                inner,
                DEFAULT_ROUTE_CACHE_CAPACITY,
                fallback,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn base() -> Coord {
        Coord::new(24.1422, -110.3108)
    }

    // ~320 m east of `base` at this latitude.
    fn east_320m() -> Coord {
        Coord::new(24.1422, -110.3108 + 320.0 / (111_320.0 * 24.1422_f64.to_radians().cos()))
    }

    #[test]
    fn euclidean_duration_matches_speed() {
        let provider = EuclideanRouteProvider::new(320.0);
        let route = provider.route(base(), &[east_320m()]).expect("route");
        // 320 m at 320 m/min is one minute.
        assert!((route.duration_s - 60.0).abs() < 1.0, "got {}", route.duration_s);
        assert!((route.distance_m - 320.0).abs() < 5.0);
        assert_eq!(route.legs.len(), 1);
        assert_eq!(route.last_waypoint(), Some(east_320m()));
    }

    #[test]
    fn euclidean_sums_multi_stop_legs() {
        let provider = EuclideanRouteProvider::new(320.0);
        let a = east_320m();
        let route = provider.route(base(), &[a, base()]).expect("route");
        assert_eq!(route.legs.len(), 2);
        let leg_sum: f64 = route.legs.iter().map(|l| l.distance_m).sum();
        assert!((route.distance_m - leg_sum).abs() < 1e-9);
        assert_eq!(route.last_waypoint(), Some(base()));
    }

    #[test]
    fn euclidean_rejects_empty_waypoints() {
        let provider = EuclideanRouteProvider::default();
        assert!(provider.route(base(), &[]).is_none());
    }

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl RouteProvider for CountingProvider {
        fn route(&self, start: Coord, waypoints: &[Coord]) -> Option<Route> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                None
            } else {
                EuclideanRouteProvider::default().route(start, waypoints)
            }
        }
    }

    #[test]
    fn cached_provider_hits_cache_on_repeat_queries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = Box::new(CountingProvider {
            calls: calls.clone(),
            fail: false,
        });
        let cached = CachedRouteProvider::new(inner, 16, None);

        let first = cached.route(base(), &[east_320m()]).expect("route");
        let second = cached.route(base(), &[east_320m()]).expect("route");
        assert_eq!(first, second);
        // One inner call, second served from cache.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cached_provider_falls_back_on_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = Box::new(CountingProvider {
            calls: calls.clone(),
            fail: true,
        });
        let cached =
            CachedRouteProvider::new(inner, 16, Some(EuclideanRouteProvider::new(320.0)));
        let route = cached.route(base(), &[east_320m()]).expect("fallback route");
        assert!((route.duration_s - 60.0).abs() < 1.0);

        let no_fallback = CachedRouteProvider::new(
            Box::new(CountingProvider {
                calls: Arc::new(AtomicUsize::new(0)),
                fail: true,
            }),
            16,
            None,
        );
        assert!(no_fallback.route(base(), &[east_320m()]).is_none());
    }
}
