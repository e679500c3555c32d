//! OSRM HTTP routing backend with bounded retries and backoff.
//!
//! Issues a single `/route/v1/driving` request per query. Transport errors
//! and the retryable status set {429, 500, 502, 503, 504} are retried with
//! multiplicative backoff; anything else fails the query. A short spacing
//! delay before each request rate-limits outbound calls.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{Route, RouteLeg, RouteProvider};
use crate::spatial::Coord;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Spacing delay enforced before every outbound request.
const REQUEST_SPACING: Duration = Duration::from_millis(50);

/// Maximum attempts per query (first try included).
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base backoff; attempt `n` sleeps `backoff * 2^(n-1)`.
const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

const RETRYABLE_STATUS: [u16; 5] = [429, 500, 502, 503, 504];

/// Routes via an OSRM HTTP endpoint.
pub struct OsrmRouteProvider {
    client: Client,
    endpoint: String,
    max_attempts: u32,
    backoff: Duration,
}

impl OsrmRouteProvider {
    pub fn new(endpoint: &str) -> Self {
        Self::with_retry_policy(endpoint, DEFAULT_MAX_ATTEMPTS, DEFAULT_BACKOFF)
    }

    pub fn with_retry_policy(endpoint: &str, max_attempts: u32, backoff: Duration) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build OSRM HTTP client");
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    fn request_url(&self, start: Coord, waypoints: &[Coord]) -> String {
        let mut coords = String::new();
        coords.push_str(&format!("{},{}", start.lon, start.lat));
        for wp in waypoints {
            coords.push_str(&format!(";{},{}", wp.lon, wp.lat));
        }
        format!(
            "{}/route/v1/driving/{}?overview=full&steps=true",
            self.endpoint, coords
        )
    }

    /// Fetch with retries. Returns the parsed body, or `None` after the
    /// attempt budget is exhausted or on a non-retryable failure.
    fn fetch(&self, url: &str) -> Option<OsrmResponse> {
        for attempt in 1..=self.max_attempts {
            thread::sleep(REQUEST_SPACING);

            let response = match self.client.get(url).send() {
                Ok(response) => response,
                Err(err) => {
                    tracing::debug!(attempt, error = %err, "osrm transport error");
                    self.sleep_backoff(attempt);
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::OK {
                match response.json::<OsrmResponse>() {
                    Ok(body) => return Some(body),
                    Err(err) => {
                        tracing::warn!(error = %err, "osrm response body did not parse");
                        return None;
                    }
                }
            }

            if RETRYABLE_STATUS.contains(&status.as_u16()) {
                tracing::debug!(attempt, status = status.as_u16(), "osrm retryable status");
                self.sleep_backoff(attempt);
                continue;
            }

            tracing::warn!(status = status.as_u16(), "osrm non-retryable status");
            return None;
        }
        tracing::warn!(attempts = self.max_attempts, "osrm attempts exhausted");
        None
    }

    fn sleep_backoff(&self, attempt: u32) {
        let factor = 1u32 << (attempt - 1).min(16);
        thread::sleep(self.backoff * factor);
    }
}

/// Minimal OSRM JSON response structures.
#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    routes: Option<Vec<OsrmRoute>>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    distance: f64, // meters
    duration: f64, // seconds
    geometry: String,
    legs: Vec<OsrmLeg>,
}

#[derive(Deserialize)]
struct OsrmLeg {
    distance: f64,
    duration: f64,
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Deserialize)]
struct OsrmStep {
    maneuver: OsrmManeuver,
}

#[derive(Deserialize)]
struct OsrmManeuver {
    /// `[lon, lat]` of the maneuver point.
    location: [f64; 2],
}

impl RouteProvider for OsrmRouteProvider {
    fn route(&self, start: Coord, waypoints: &[Coord]) -> Option<Route> {
        if waypoints.is_empty() {
            return None;
        }

        let url = self.request_url(start, waypoints);
        let body = self.fetch(&url)?;
        if body.code != "Ok" {
            tracing::warn!(code = %body.code, "osrm returned non-Ok code");
            return None;
        }
        let route = body.routes?.into_iter().next()?;

        // One OSRM leg per waypoint pair; each leg ends at the maneuver
        // location of its last step, falling back to the requested waypoint.
        let legs: Vec<RouteLeg> = route
            .legs
            .iter()
            .zip(waypoints.iter())
            .map(|(leg, requested)| {
                let end = leg
                    .steps
                    .last()
                    .map(|step| Coord::new(step.maneuver.location[1], step.maneuver.location[0]))
                    .unwrap_or(*requested);
                RouteLeg {
                    distance_m: leg.distance,
                    duration_s: leg.duration,
                    end,
                }
            })
            .collect();

        Some(Route {
            distance_m: route.distance,
            duration_s: route.duration,
            geometry: Some(route.geometry),
            legs,
        })
    }
}
