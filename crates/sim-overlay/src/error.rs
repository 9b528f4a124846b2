//! Error types for sim-overlay.

use sim_overlay_core::OverlayError;
use sim_overlay_render::RenderError;
use thiserror::Error;

use crate::simulator::ActorId;

/// Errors reported by a [`Simulator`](crate::Simulator) implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// The connection to the simulator was lost. Never retried.
    #[error("simulator disconnected: {0}")]
    Disconnected(String),

    /// A sensor attribute value the simulator does not accept.
    #[error("unsupported sensor attribute {name}={value}")]
    UnsupportedAttribute { name: String, value: String },

    /// The actor does not exist (never spawned or already destroyed).
    #[error("unknown actor {0}")]
    UnknownActor(ActorId),

    /// Any other simulator-side failure.
    #[error("simulator error: {0}")]
    Other(String),
}

/// A specialized Result type for simulator calls.
pub type SimResult<T> = std::result::Result<T, SimError>;

/// The main error type for running a scenario.
#[derive(Error, Debug)]
pub enum SceneError {
    /// Simulator failure.
    #[error(transparent)]
    Simulator(#[from] SimError),

    /// Invalid options or camera parameters.
    #[error(transparent)]
    Overlay(#[from] OverlayError),

    /// Renderer failure.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// No spawn point accepted the ego actor.
    #[error("failed to spawn ego actor after {tries} attempts")]
    EgoSpawnFailed { tries: usize },

    /// A Running-phase operation was attempted before setup placed the ego.
    #[error("no ego actor: the scene has not been set up")]
    NotSetUp,

    /// The renderer cannot lay out every configured camera.
    #[error("{cameras} cameras configured but the renderer has {views} views")]
    NotEnoughViews { cameras: usize, views: usize },
}

/// A specialized Result type for scenario operations.
pub type Result<T> = std::result::Result<T, SceneError>;
