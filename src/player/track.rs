// ==========================================
// TRACK
// ==========================================
// A single catalog entry. Tracks are built once by the catalog mapping and
// never edited afterwards, so everything downstream just clones them around.
//
// id:         unique within one catalog, used for every identity comparison
//             (shelf lookups, saved set membership, "same cassette" checks)
// album_art:  cover image URI, display only
// preview:    URI of the short audio sample; None means the track cannot be
//             played at all (the demo tracks are like this)
//
// Field names are serialized in camelCase so saved tracks written by older
// builds keep loading.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_art: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Track {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album_art: None,
            preview: None,
        }
    }

    pub fn with_album_art(mut self, uri: impl Into<String>) -> Self {
        self.album_art = Some(uri.into());
        self
    }

    pub fn with_preview(mut self, uri: impl Into<String>) -> Self {
        self.preview = Some(uri.into());
        self
    }

    /// The preview URI, if there is a non-empty one.
    pub fn preview_uri(&self) -> Option<&str> {
        self.preview
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
    }

    pub fn is_playable(&self) -> bool {
        self.preview_uri().is_some()
    }
}
