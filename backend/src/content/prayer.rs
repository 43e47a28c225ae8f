//! Prayer-times lookup against the Aladhan HTTP API.
//!
//! Results are cached per (city, country) for a short window so repeated
//! page loads do not hammer the upstream service; on upstream failure a
//! stale cache entry is served when one exists.

use crate::errors::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrayerTimes {
    #[serde(rename = "Fajr")]
    pub fajr: String,
    #[serde(rename = "Sunrise")]
    pub sunrise: String,
    #[serde(rename = "Dhuhr")]
    pub dhuhr: String,
    #[serde(rename = "Asr")]
    pub asr: String,
    #[serde(rename = "Maghrib")]
    pub maghrib: String,
    #[serde(rename = "Isha")]
    pub isha: String,
}

#[derive(Deserialize)]
struct AladhanResponse {
    data: AladhanData,
}

#[derive(Deserialize)]
struct AladhanData {
    timings: PrayerTimes,
}

#[derive(Clone)]
struct CachedTimes {
    times: PrayerTimes,
    last_updated: SystemTime,
}

#[derive(Clone)]
pub struct PrayerTimesClient {
    cache: Arc<RwLock<HashMap<(String, String), CachedTimes>>>,
    client: reqwest::Client,
}

impl PrayerTimesClient {
    const CACHE_DURATION: Duration = Duration::from_secs(15 * 60);
    const API_URL: &'static str = "https://api.aladhan.com/v1/timingsByCity";

    pub fn new() -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            client: reqwest::Client::new(),
        }
    }

    /// Today's prayer times for a city (cached or fetched).
    pub async fn timings_by_city(&self, city: &str, country: &str) -> ServiceResult<PrayerTimes> {
        let key = (city.to_lowercase(), country.to_lowercase());

        if let Some(cached) = self.check_cache(&key).await {
            return Ok(cached);
        }

        match self.fetch_from_api(city, country).await {
            Ok(times) => {
                self.update_cache(key, times.clone()).await;
                Ok(times)
            }
            Err(e) => {
                // Fallback to a stale entry if one exists.
                let cache = self.cache.read().await;
                cache.get(&key).map(|c| c.times.clone()).ok_or(e)
            }
        }
    }

    async fn check_cache(&self, key: &(String, String)) -> Option<PrayerTimes> {
        let cache = self.cache.read().await;
        cache.get(key).and_then(|c| {
            c.last_updated
                .elapsed()
                .ok()
                .filter(|&elapsed| elapsed < Self::CACHE_DURATION)
                .map(|_| c.times.clone())
        })
    }

    async fn fetch_from_api(&self, city: &str, country: &str) -> ServiceResult<PrayerTimes> {
        let response = self
            .client
            .get(Self::API_URL)
            .query(&[("city", city), ("country", country)])
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| ServiceError::external_service(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::external_service(format!(
                "Prayer times API returned {}",
                response.status()
            )));
        }

        let body: AladhanResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::external_service(e.to_string()))?;

        Ok(body.data.timings)
    }

    async fn update_cache(&self, key: (String, String), times: PrayerTimes) {
        let mut cache = self.cache.write().await;
        cache.insert(key, CachedTimes {
            times,
            last_updated: SystemTime::now(),
        });
    }
}

impl Default for PrayerTimesClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timings_deserialize_from_api_shape() {
        let raw = r#"{
            "code": 200,
            "status": "OK",
            "data": {
                "timings": {
                    "Fajr": "04:15",
                    "Sunrise": "05:48",
                    "Dhuhr": "12:03",
                    "Asr": "15:31",
                    "Maghrib": "18:17",
                    "Isha": "19:41",
                    "Imsak": "04:05",
                    "Midnight": "00:03"
                }
            }
        }"#;

        let parsed: AladhanResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data.timings.fajr, "04:15");
        assert_eq!(parsed.data.timings.isha, "19:41");
    }

    #[tokio::test]
    async fn cached_entries_are_served() {
        let client = PrayerTimesClient::new();
        let key = ("makkah".to_string(), "sa".to_string());
        let times = PrayerTimes {
            fajr: "04:15".into(),
            sunrise: "05:48".into(),
            dhuhr: "12:03".into(),
            asr: "15:31".into(),
            maghrib: "18:17".into(),
            isha: "19:41".into(),
        };

        client.update_cache(key.clone(), times).await;

        let cached = client.check_cache(&key).await.expect("cache hit");
        assert_eq!(cached.dhuhr, "12:03");
    }
}
