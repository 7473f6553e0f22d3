//! Participant projection.
//!
//! Maps the room's participant list to view tiles. The projection owns no
//! state; it is recomputed on every participant event.

/// Kind of a published track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    /// Microphone or other audio source.
    Audio,
    /// Camera or screen share.
    Video,
}

/// A track a participant has published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPublication {
    /// Transport-assigned track ID.
    pub sid: String,
    /// Track kind.
    pub kind: TrackKind,
    /// Media is flowing to this client (a renderable track exists).
    pub subscribed: bool,
}

/// A participant as reported by the media room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Participant identity (as embedded in their credential).
    pub identity: String,
    /// Published tracks in publication order.
    pub publications: Vec<TrackPublication>,
}

impl Participant {
    /// Participant with no published tracks.
    pub fn new(identity: impl Into<String>) -> Self {
        Self { identity: identity.into(), publications: Vec::new() }
    }

    /// Add a publication.
    #[must_use]
    pub fn with_track(mut self, sid: impl Into<String>, kind: TrackKind, subscribed: bool) -> Self {
        self.publications.push(TrackPublication { sid: sid.into(), kind, subscribed });
        self
    }

    /// First renderable video publication, in publication order.
    pub fn first_video_track(&self) -> Option<&TrackPublication> {
        self.publications.iter().find(|p| p.kind == TrackKind::Video && p.subscribed)
    }
}

/// A rendered tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantView {
    /// Live video tile.
    Video {
        /// Participant identity.
        identity: String,
        /// Track to render.
        track_sid: String,
    },
    /// No video: show the identity's initial.
    Placeholder {
        /// Participant identity.
        identity: String,
        /// First character of the identity, `'?'` if empty.
        initial: char,
    },
}

impl ParticipantView {
    /// Identity of the participant this tile shows.
    pub fn identity(&self) -> &str {
        match self {
            Self::Video { identity, .. } | Self::Placeholder { identity, .. } => identity,
        }
    }
}

/// Project participants to tiles, preserving room order.
pub fn project(participants: &[Participant]) -> Vec<ParticipantView> {
    participants
        .iter()
        .map(|p| match p.first_video_track() {
            Some(track) => {
                ParticipantView::Video { identity: p.identity.clone(), track_sid: track.sid.clone() }
            },
            None => ParticipantView::Placeholder {
                identity: p.identity.clone(),
                initial: p.identity.chars().next().unwrap_or('?'),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_subscribed_video_wins() {
        let p = Participant::new("dr-lee")
            .with_track("TR_audio", TrackKind::Audio, true)
            .with_track("TR_cam_pending", TrackKind::Video, false)
            .with_track("TR_cam", TrackKind::Video, true)
            .with_track("TR_screen", TrackKind::Video, true);

        assert_eq!(project(&[p]), vec![ParticipantView::Video {
            identity: "dr-lee".into(),
            track_sid: "TR_cam".into(),
        }]);
    }

    #[test]
    fn placeholder_uses_initial() {
        let tiles = project(&[
            Participant::new("élise").with_track("TR_a", TrackKind::Audio, true),
            Participant::new(""),
        ]);

        assert_eq!(tiles, vec![
            ParticipantView::Placeholder { identity: "élise".into(), initial: 'é' },
            ParticipantView::Placeholder { identity: String::new(), initial: '?' },
        ]);
        assert_eq!(tiles[0].identity(), "élise");
    }

    #[test]
    fn preserves_room_order() {
        let tiles = project(&[Participant::new("b"), Participant::new("a")]);
        let ids: Vec<_> = tiles.iter().map(ParticipantView::identity).collect();
        assert_eq!(ids, ["b", "a"]);
    }
}
