//! Local track publishing.
//!
//! Tracks whether the local microphone and camera are published. Toggles are
//! optimistic: the flag flips immediately and the returned [`MediaAction`] is
//! executed fire-and-forget. A failed hardware toggle is logged by the driver
//! and never rolls the flag back.

/// Instruction for the media room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaAction {
    /// Enable or disable the local microphone track.
    SetMicrophone(bool),
    /// Enable or disable the local camera track.
    SetCamera(bool),
}

/// Local publication flags.
///
/// The camera starts enabled because it is published as soon as the link
/// comes up. The microphone starts disabled and is only published when the
/// user unmutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaPublisher {
    microphone: bool,
    camera: bool,
}

impl Default for MediaPublisher {
    fn default() -> Self {
        Self { microphone: false, camera: true }
    }
}

impl MediaPublisher {
    /// Publisher in its post-connect state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the microphone and return the instruction to apply it.
    pub fn toggle_microphone(&mut self) -> MediaAction {
        self.microphone = !self.microphone;
        MediaAction::SetMicrophone(self.microphone)
    }

    /// Flip the camera and return the instruction to apply it.
    pub fn toggle_camera(&mut self) -> MediaAction {
        self.camera = !self.camera;
        MediaAction::SetCamera(self.camera)
    }

    /// Microphone is published.
    pub fn microphone_enabled(&self) -> bool {
        self.microphone
    }

    /// Camera is published.
    pub fn camera_enabled(&self) -> bool {
        self.camera
    }
}
