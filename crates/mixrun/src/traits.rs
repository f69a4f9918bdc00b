//! Core trait definitions for extensibility.
//!
//! - **ScriptEnv**: a scripting environment the game instance can start

use anyhow::Result;

use crate::game_instance::GameInstance;

/// An embedded scripting environment.
///
/// # Example
///
/// ```rust,no_run
/// use mixrun::{GameInstance, ScriptEnv};
/// use anyhow::Result;
///
/// struct Headless;
///
/// impl ScriptEnv for Headless {
///     fn start(&self, entry: &str, game_instance: &GameInstance) -> Result<()> {
///         // Bind FCall, register mixins, etc.
///         Ok(())
///     }
/// }
/// ```
pub trait ScriptEnv: Send + Sync + 'static {
    /// Runs the entry module `entry`. The game instance is handed over
    /// explicitly; there is no ambient registry to look it up in.
    fn start(&self, entry: &str, game_instance: &GameInstance) -> Result<()>;
}
