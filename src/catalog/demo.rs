// The fixed fallback set. No previews on purpose.

use super::Catalog;
use crate::error::Result;
use crate::player::Track;

const DEMO: [(&str, &str, &str, &str); 5] = [
    (
        "1",
        "Flowers",
        "Miley Cyrus",
        "https://is1-ssl.mzstatic.com/image/thumb/Music123/v4/9e/80/c7/9e80c757-6994-4338-9e79-b0f5611b1b0a/196589564437.jpg/400x400bb.jpg",
    ),
    (
        "2",
        "Anti-Hero",
        "Taylor Swift",
        "https://is1-ssl.mzstatic.com/image/thumb/Music112/v4/8f/84/d9/8f84d9e9-e9af-9b45-3a68-0b527c507e41/22UM1IM24801.rgb.jpg/400x400bb.jpg",
    ),
    (
        "3",
        "Unholy",
        "Sam Smith & Kim Petras",
        "https://is1-ssl.mzstatic.com/image/thumb/Music112/v4/a7/46/2f/a7462f44-24f6-4875-0a8b-986150ca63b5/196589564694.jpg/400x400bb.jpg",
    ),
    (
        "4",
        "As It Was",
        "Harry Styles",
        "https://is1-ssl.mzstatic.com/image/thumb/Music126/v4/2a/19/fb/2a19fb85-2f70-9e44-f2a9-82abe679b88e/886449990061.jpg/400x400bb.jpg",
    ),
    (
        "5",
        "Rich Flex",
        "Drake & 21 Savage",
        "https://is1-ssl.mzstatic.com/image/thumb/Music112/v4/40/3f/67/403f67e8-d485-883e-882f-37b9cc609d19/22UM1IM11914.rgb.jpg/400x400bb.jpg",
    ),
];

pub fn demo_tracks() -> Vec<Track> {
    DEMO.iter()
        .map(|(id, title, artist, art)| Track::new(*id, *title, *artist).with_album_art(*art))
        .collect()
}

/// Catalog used when nothing else is configured: trending is the demo set
/// and search filters it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoCatalog;

impl Catalog for DemoCatalog {
    fn search(&self, query: &str) -> Result<Vec<Track>> {
        Ok(super::file::filter_tracks(&demo_tracks(), query))
    }

    fn trending(&self) -> Result<Vec<Track>> {
        Ok(demo_tracks())
    }
}
