use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Session identifier, also the key into the session table
    pub id: String,
    pub title: String,
    /// Audio file, relative to the playlist file unless absolute
    pub url: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct Playlist {
    tracks: Vec<Track>,
}

impl Playlist {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    /// Load a JSON array of tracks. Relative urls resolve against the playlist's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let mut tracks: Vec<Track> = serde_json::from_str(&json)?;
        if tracks.is_empty() {
            bail!("playlist {:?} has no tracks", path);
        }

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for track in &mut tracks {
            if track.url.is_relative() {
                track.url = base.join(&track.url);
            }
        }
        Ok(Self { tracks })
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn find(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// `requested` if the playlist has it, otherwise the first track's id.
    pub fn resolve_session<'a>(&'a self, requested: &'a str) -> Option<&'a str> {
        if self.find(requested).is_some() {
            Some(requested)
        } else {
            self.tracks.first().map(|t| t.id.as_str())
        }
    }

    /// Id of the track after `id`, wrapping around.
    pub fn next_after(&self, id: &str) -> Option<&str> {
        let index = self.tracks.iter().position(|t| t.id == id)?;
        let next = (index + 1) % self.tracks.len();
        Some(self.tracks[next].id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist() -> Playlist {
        Playlist::new(vec![
            Track {
                id: "session1".into(),
                title: "Dawn".into(),
                url: "dawn.mp3".into(),
            },
            Track {
                id: "session2".into(),
                title: "Dusk".into(),
                url: "dusk.mp3".into(),
            },
        ])
    }

    #[test]
    fn test_resolve_session_falls_back_to_first() {
        let playlist = playlist();
        assert_eq!(playlist.resolve_session("session2"), Some("session2"));
        assert_eq!(playlist.resolve_session("missing"), Some("session1"));
        assert_eq!(Playlist::default().resolve_session("session1"), None);
    }

    #[test]
    fn test_next_wraps() {
        let playlist = playlist();
        assert_eq!(playlist.next_after("session1"), Some("session2"));
        assert_eq!(playlist.next_after("session2"), Some("session1"));
        assert_eq!(playlist.next_after("nope"), None);
    }

    #[test]
    fn test_load_resolves_relative_urls() {
        let dir = std::env::temp_dir().join("ambient_visualizer_playlist_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("playlist.json");
        std::fs::write(
            &path,
            r#"[{ "id": "session1", "title": "Dawn", "url": "audio/dawn.mp3" }]"#,
        )
        .unwrap();

        let playlist = Playlist::load(&path).unwrap();
        assert_eq!(playlist.tracks()[0].url, dir.join("audio/dawn.mp3"));

        std::fs::write(&path, "[]").unwrap();
        assert!(Playlist::load(&path).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
