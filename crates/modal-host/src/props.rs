//! Presentation attributes of modal nodes.

use serde::{Deserialize, Serialize};

/// Transition style requested by the modal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationType {
    /// Appear and disappear without animation.
    None,
    /// Slide in from the bottom edge.
    #[default]
    Slide,
    /// Cross-fade.
    Fade,
}

/// How the native surface covers the host's top-level container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationStyle {
    /// Cover the whole screen; the presenting container is removed from view.
    #[default]
    FullScreen,
    /// Partially cover the presenting container as a sheet.
    PageSheet,
    /// Centered form sheet.
    FormSheet,
    /// Cover the whole screen while keeping the presenting container visible underneath.
    OverFullScreen,
}

/// Presentation attributes of one modal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalProps {
    /// Transition style.
    pub animation: AnimationType,
    /// Surface coverage.
    pub presentation_style: PresentationStyle,
    /// Render the surface background transparent.
    pub transparent: bool,
    /// Hide the status bar while the modal is visible.
    pub hide_status_bar: bool,
}

impl ModalProps {
    /// True when transitions for these props should animate.
    pub fn animated(&self) -> bool {
        self.animation != AnimationType::None
    }

    /// Builder-style setter for the animation type.
    #[must_use]
    pub fn with_animation(mut self, animation: AnimationType) -> Self {
        self.animation = animation;
        self
    }

    /// Builder-style setter for the presentation style.
    #[must_use]
    pub fn with_style(mut self, style: PresentationStyle) -> Self {
        self.presentation_style = style;
        self
    }

    /// Builder-style setter for transparency.
    #[must_use]
    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }
}
