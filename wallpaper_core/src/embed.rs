// Remote embed session: one bootstrap script per page, requests parked until the player API
// says it is ready, then replayed in arrival order exactly once.

use std::collections::VecDeque;

use url::Url;

use crate::error::WallpaperError;
use crate::host::Host;
use crate::platform::Platform;
use crate::source::EmbedSource;
use crate::types::{Generation, InstanceId};

/// Playback quality requested once a remote player is ready.
pub const PLAYER_QUALITY: &str = "highres";

/// Remote embeds have no natural size; they are laid out as a box this tall.
pub const NOMINAL_EMBED_HEIGHT: f64 = 500.0;

pub fn script_src(platform: &Platform) -> String {
    format!("{}//www.youtube.com/iframe_api", platform.embed_protocol())
}

/// Poster used when the caller supplied none.
pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/maxresdefault.jpg")
}

/// Query parameters of the embed iframe.
#[derive(Debug, Clone)]
pub struct EmbedUrl<'a> {
    pub video_id: &'a str,
    /// Element id the remote API binds its player to.
    pub player_id: &'a str,
    pub looped: bool,
    /// Page origin the player is locked to. Omitted when unknown.
    pub origin: &'a str,
}

impl EmbedUrl<'_> {
    /// Controls hidden, related videos inline, API enabled. Autoplay is always on: without it the
    /// platform draws its own play button over the background.
    pub fn build(&self, platform: &Platform) -> Result<String, WallpaperError> {
        let mut url = Url::parse(&format!(
            "{}//www.youtube.com/embed/",
            platform.embed_protocol()
        ))?;

        url.path_segments_mut()
            .map_err(|_| WallpaperError::InvalidSource("embed base URL has no path".to_string()))?
            .pop_if_empty()
            .push(self.video_id)
            .push("");

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("controls", "0")
                .append_pair("rel", "0")
                .append_pair("showinfo", "0")
                .append_pair("enablejsapi", "1")
                .append_pair("version", "3")
                .append_pair("playerapiid", self.player_id);
            if self.looped {
                query.append_pair("loop", "1");
            }
            query.append_pair("autoplay", "1");
            if !self.origin.is_empty() {
                query.append_pair("origin", self.origin);
            }
        }

        Ok(url.into())
    }
}

/// Embed load parked until the remote API is ready.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEmbed {
    pub instance: InstanceId,
    /// Generation of the instance when the request was made. A request whose instance has
    /// since moved on is consumed without effect.
    pub generation: Generation,
    pub source: EmbedSource,
}

/// Process-wide remote API state. Initialized once, never reset.
#[derive(Debug, Default)]
pub struct EmbedSession {
    ready: bool,
    script_injected: bool,
    queue: VecDeque<PendingEmbed>,
}

impl EmbedSession {
    pub fn new() -> Self {
        EmbedSession::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Inject the bootstrap script unless it already is on the page.
    pub fn ensure_script<H: Host>(&mut self, host: &mut H, platform: &Platform) {
        if !self.script_injected {
            self.script_injected = true;
            let src = script_src(platform);
            tracing::debug!(%src, "injecting remote player script");
            host.inject_embed_script(&src);
        }
    }

    pub fn enqueue(&mut self, request: PendingEmbed) {
        debug_assert!(!self.ready, "embed requests are only queued before readiness");
        tracing::debug!(
            instance = %request.instance,
            video_id = %request.source.video_id,
            queued = self.queue.len() + 1,
            "remote player API not ready, queueing embed"
        );
        self.queue.push_back(request);
    }

    /// Flip to ready and hand back every queued request in arrival order.
    /// Later calls return nothing.
    pub fn mark_ready(&mut self) -> Vec<PendingEmbed> {
        if self.ready {
            tracing::trace!("remote player API signalled ready twice");
            return Vec::new();
        }
        self.ready = true;
        tracing::debug!(pending = self.queue.len(), "remote player API ready");
        self.queue.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::recording::{Call, RecordingHost};
    use proptest::prelude::*;

    fn request(instance: u32) -> PendingEmbed {
        PendingEmbed {
            instance: InstanceId::new(instance),
            generation: Generation::default(),
            source: EmbedSource {
                url: format!("https://youtu.be/v{instance}"),
                video_id: format!("v{instance}"),
            },
        }
    }

    #[test]
    fn embed_url_carries_player_parameters() {
        let platform = Platform {
            protocol: "https:".to_string(),
            origin: "https://example.com".to_string(),
            ..Default::default()
        };
        let url = EmbedUrl {
            video_id: "abc123",
            player_id: "wallpaper-0-2",
            looped: true,
            origin: &platform.origin,
        }
        .build(&platform)
        .unwrap();

        assert_eq!(
            url,
            "https://www.youtube.com/embed/abc123/?controls=0&rel=0&showinfo=0&enablejsapi=1\
             &version=3&playerapiid=wallpaper-0-2&loop=1&autoplay=1\
             &origin=https%3A%2F%2Fexample.com"
        );
    }

    #[test]
    fn embed_url_without_loop_or_origin() {
        let platform = Platform::default();
        let url = EmbedUrl {
            video_id: "abc123",
            player_id: "p",
            looped: false,
            origin: "",
        }
        .build(&platform)
        .unwrap();
        assert!(!url.contains("loop="));
        assert!(!url.contains("origin="));
        assert!(url.ends_with("autoplay=1"));
    }

    #[test]
    fn script_injected_once() {
        let mut session = EmbedSession::new();
        let mut host = RecordingHost::new();
        let platform = Platform::default();

        session.ensure_script(&mut host, &platform);
        session.ensure_script(&mut host, &platform);

        assert_eq!(
            host.calls,
            vec![Call::Script(
                "https://www.youtube.com/iframe_api".to_string()
            )]
        );
    }

    #[test]
    fn second_ready_signal_is_ignored() {
        let mut session = EmbedSession::new();
        session.enqueue(request(1));
        assert_eq!(session.mark_ready().len(), 1);
        assert!(session.mark_ready().is_empty());
        assert!(session.is_ready());
    }

    proptest! {
        /// Property: every request queued before readiness comes back once, in order.
        #[test]
        fn queue_drains_in_submission_order(ids in prop::collection::vec(0u32..1000, 0..20)) {
            let mut session = EmbedSession::new();
            for id in &ids {
                session.enqueue(request(*id));
            }
            prop_assert_eq!(session.pending(), ids.len());

            let drained: Vec<u32> = session
                .mark_ready()
                .into_iter()
                .map(|r| r.instance.as_u32())
                .collect();

            prop_assert_eq!(drained, ids);
            prop_assert_eq!(session.pending(), 0);
        }
    }
}
