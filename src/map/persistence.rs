//! Viewport persistence between sessions

use crate::core::{LatLng, VIEWPORT_COOKIE, VIEWPORT_COOKIE_DAYS, VIEWPORT_COOKIE_PATH};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Cookie attributes for the saved viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    pub name: String,
    pub path: String,
    pub max_age_days: u32,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: VIEWPORT_COOKIE.to_string(),
            path: VIEWPORT_COOKIE_PATH.to_string(),
            max_age_days: VIEWPORT_COOKIE_DAYS,
        }
    }
}

/// A cookie ready to be written to a store
#[derive(Debug, Clone, PartialEq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub expires: DateTime<Utc>,
}

impl Cookie {
    pub fn new(settings: &CookieSettings, value: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: settings.name.clone(),
            value: value.into(),
            path: settings.path.clone(),
            expires: now + Duration::days(settings.max_age_days as i64),
        }
    }

    /// `Set-Cookie` style serialization
    pub fn header_value(&self) -> String {
        format!(
            "{}={}; path={}; expires={}",
            self.name,
            percent_encode(&self.value),
            self.path,
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT")
        )
    }
}

fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'!' | b'~' | b'*'
            | b'\'' | b'(' | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Last viewport of the user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedViewport {
    pub lat: f64,
    pub lon: f64,
    pub zoom: u8,
}

impl SavedViewport {
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self { lat: center.lat, lon: center.lon, zoom }
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(self.lat, self.lon)
    }

    pub fn to_cookie_value(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_cookie_value(value: &str) -> serde_json::Result<Self> {
        serde_json::from_str(value)
    }
}

/// Name/value storage for the viewport cookie
pub trait ViewportStore {
    fn get(&self, name: &str) -> Option<String>;

    fn set(&mut self, cookie: &Cookie);
}

/// Store that forgets everything when dropped
#[derive(Debug, Default)]
pub struct MemoryStore {
    cookies: BTreeMap<String, Cookie>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.get(name)
    }
}

impl ViewportStore for MemoryStore {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies.get(name).map(|c| c.value.clone())
    }

    fn set(&mut self, cookie: &Cookie) {
        self.cookies.insert(cookie.name.clone(), cookie.clone());
    }
}

/// Store backed by a JSON file of name/value pairs. Failures are logged and
/// otherwise ignored, the viewport is a convenience only.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "viewport store not readable");
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "viewport store is malformed");
            BTreeMap::new()
        })
    }
}

impl ViewportStore for FileStore {
    fn get(&self, name: &str) -> Option<String> {
        self.read_all().remove(name)
    }

    fn set(&mut self, cookie: &Cookie) {
        let mut all = self.read_all();
        all.insert(cookie.name.clone(), cookie.value.clone());
        let result = serde_json::to_string_pretty(&all)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(&self.path, json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "failed to save viewport");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cookie_header() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let viewport = SavedViewport::new(LatLng::new(60.1, 24.9), 11);
        let cookie = Cookie::new(&CookieSettings::default(), viewport.to_cookie_value().unwrap(), now);

        assert_eq!(cookie.expires, Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap());
        assert_eq!(
            cookie.header_value(),
            "map_pos=%7B%22lat%22%3A60.1%2C%22lon%22%3A24.9%2C%22zoom%22%3A11%7D; path=/; \
             expires=Tue, 31 Dec 2024 00:00:00 GMT"
        );
    }

    #[test]
    fn test_saved_viewport_parse() {
        let parsed = SavedViewport::from_cookie_value(r#"{"lat":60.0,"lon":24.0,"zoom":9}"#).unwrap();
        assert_eq!(parsed.center(), LatLng::new(60.0, 24.0));
        assert_eq!(parsed.zoom, 9);
        assert!(SavedViewport::from_cookie_value("garbage").is_err());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.get("map_pos").is_none());
        store.set(&Cookie::new(&CookieSettings::default(), "v", Utc::now()));
        assert_eq!(store.get("map_pos").as_deref(), Some("v"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let path = std::env::temp_dir().join(format!("depthmap_store_{}.json", std::process::id()));
        let mut store = FileStore::new(&path);
        assert!(store.get("map_pos").is_none());

        store.set(&Cookie::new(&CookieSettings::default(), "abc", Utc::now()));
        assert_eq!(FileStore::new(&path).get("map_pos").as_deref(), Some("abc"));

        let _ = fs::remove_file(&path);
    }
}
