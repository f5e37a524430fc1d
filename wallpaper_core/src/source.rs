// Source classification: plain strings are images unless they point at a remote video,
// descriptor objects are local videos. Resolved once per new source value.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{MediaKind, VideoTrack};

/// Host of the remote video platform.
static EMBED_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[a-z][a-z0-9+.-]*:)?(?://)?(?:[\w-]+\.)*(?:youtube(?:-nocookie)?\.com|youtu\.be)/")
        .expect("embed host pattern is valid")
});

/// Video id in watch (`v=`), short (`youtu.be/`), embed (`embed/`, `e/`, `v/`) and user (`u/<name>/`)
/// forms. The leading `.*` is greedy so the rightmost marker wins.
static EMBED_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*(?:youtu\.be/|v/|e/|u/\w+/|embed/|v=)([^#&?]*).*")
        .expect("embed id pattern is valid")
});

/// Source value exactly as the caller passed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSource {
    Url(String),
    Video(VideoDescriptor),
}

impl From<&str> for RawSource {
    fn from(url: &str) -> Self {
        RawSource::Url(url.to_string())
    }
}

impl From<VideoDescriptor> for RawSource {
    fn from(descriptor: VideoDescriptor) -> Self {
        RawSource::Video(descriptor)
    }
}

/// Local video: any subset of encodings plus an optional poster image.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mp4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ogg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
}

impl VideoDescriptor {
    /// `<source>` entries in preference order: webm, mp4, ogg.
    pub fn tracks(&self) -> Vec<VideoTrack> {
        [
            (&self.webm, "video/webm"),
            (&self.mp4, "video/mp4"),
            (&self.ogg, "video/ogg"),
        ]
        .into_iter()
        .filter_map(|(src, mime)| {
            src.as_ref().map(|src| VideoTrack {
                src: src.clone(),
                mime: mime.to_string(),
            })
        })
        .collect()
    }
}

/// Remote embed: the URL as given and the platform video id extracted from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedSource {
    pub url: String,
    pub video_id: String,
}

/// Classified source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Image(String),
    Video(VideoDescriptor),
    Embed(EmbedSource),
}

impl MediaSource {
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaSource::Image(_) => MediaKind::Image,
            MediaSource::Video(_) => MediaKind::Video,
            MediaSource::Embed(_) => MediaKind::Embed,
        }
    }
}

/// Classify a source. Strings that are not recognizable remote-video URLs fall back to images.
pub fn classify(source: &RawSource) -> MediaSource {
    match source {
        RawSource::Video(descriptor) => MediaSource::Video(descriptor.clone()),
        RawSource::Url(url) => match embed_video_id(url) {
            Some(video_id) => MediaSource::Embed(EmbedSource {
                url: url.clone(),
                video_id,
            }),
            None => MediaSource::Image(url.clone()),
        },
    }
}

/// Extract the remote platform video id, if `url` is a remote-video URL.
pub fn embed_video_id(url: &str) -> Option<String> {
    if !EMBED_HOST.is_match(url) {
        return None;
    }
    EMBED_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embed_id(url: &str) -> Option<String> {
        match classify(&RawSource::from(url)) {
            MediaSource::Embed(embed) => Some(embed.video_id),
            _ => None,
        }
    }

    #[test]
    fn short_url_is_embed() {
        assert_eq!(embed_id("https://youtu.be/abc123").as_deref(), Some("abc123"));
    }

    #[test]
    fn watch_and_embed_urls() {
        assert_eq!(
            embed_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            embed_id("https://www.youtube.com/watch?feature=share&v=xyz789&t=42").as_deref(),
            Some("xyz789")
        );
        assert_eq!(
            embed_id("//www.youtube.com/embed/E1?autoplay=1").as_deref(),
            Some("E1")
        );
        assert_eq!(embed_id("youtube.com/v/VID#t=3").as_deref(), Some("VID"));
        assert_eq!(
            embed_id("https://www.youtube-nocookie.com/embed/nc1").as_deref(),
            Some("nc1")
        );
    }

    #[test]
    fn plain_strings_are_images() {
        assert_eq!(
            classify(&RawSource::from("bg.jpg")),
            MediaSource::Image("bg.jpg".to_string())
        );
        // Path segments that look like id markers do not make an image an embed.
        assert_eq!(
            classify(&RawSource::from("https://example.com/some/v/bg.jpg")).kind(),
            MediaKind::Image
        );
        // Recognized host but no id.
        assert_eq!(
            classify(&RawSource::from("https://www.youtube.com/watch?v=")).kind(),
            MediaKind::Image
        );
    }

    #[test]
    fn descriptor_is_video() {
        let source: RawSource = serde_json::from_str(r#"{"mp4":"x.mp4"}"#).unwrap();
        assert_eq!(source.clone(), RawSource::Video(VideoDescriptor {
            mp4: Some("x.mp4".to_string()),
            ..Default::default()
        }));
        assert_eq!(classify(&source).kind(), MediaKind::Video);
    }

    #[test]
    fn json_string_is_url() {
        let source: RawSource = serde_json::from_str(r#""bg.jpg""#).unwrap();
        assert_eq!(source, RawSource::from("bg.jpg"));
    }

    #[test]
    fn tracks_keep_preference_order() {
        let descriptor = VideoDescriptor {
            ogg: Some("a.ogv".to_string()),
            webm: Some("a.webm".to_string()),
            ..Default::default()
        };
        let tracks = descriptor.tracks();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].mime, "video/webm");
        assert_eq!(tracks[1].src, "a.ogv");
    }
}
