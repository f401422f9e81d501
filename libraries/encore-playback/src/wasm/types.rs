//! Track objects exchanged with JavaScript

use crate::Track;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wasm_bindgen::prelude::*;

/// Plain JS object form of a [`Track`]
///
/// Crosses the boundary through serde-wasm-bindgen, so JS passes and
/// receives ordinary objects: `{ id, locator, title, artist, durationSecs }`
/// plus the optional `album` and `trackNumber`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WasmTrack {
    pub id: String,
    pub locator: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default)]
    pub duration_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_number: Option<u32>,
}

impl WasmTrack {
    /// Parse a JS track object
    pub fn from_js(value: JsValue) -> Result<Track, JsValue> {
        let track: Self = serde_wasm_bindgen::from_value(value)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse track: {e}")))?;
        Ok(track.into())
    }

    pub fn to_js(track: &Track) -> JsValue {
        serde_wasm_bindgen::to_value(&Self::from(track)).unwrap_or(JsValue::NULL)
    }
}

impl From<&Track> for WasmTrack {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            locator: track.locator.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            duration_secs: track.duration_hint.as_secs_f64(),
            track_number: track.track_number,
        }
    }
}

impl From<WasmTrack> for Track {
    fn from(track: WasmTrack) -> Self {
        let duration_hint = if track.duration_secs.is_finite() && track.duration_secs > 0.0 {
            Duration::from_secs_f64(track.duration_secs)
        } else {
            Duration::ZERO
        };

        Self {
            id: track.id,
            locator: track.locator,
            title: track.title,
            artist: track.artist,
            album: track.album,
            track_number: track.track_number,
            duration_hint,
        }
    }
}
