//! # Script host
//!
//! A [`ScriptEnv`] whose modules are Rust closures registered by name, and the
//! built-in `MainGame` entry that wires the game instance's `FCall` event to
//! the dispatch bridge.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use hostobj::MethodName;

use crate::game_instance::FCallArgs;
use crate::game_instance::GameInstance;
use crate::runtime::Runtime;
use crate::traits::ScriptEnv;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    EntryNotFound(String),
    DuplicateEntry(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EntryNotFound(name) => write!(f, "Script entry '{}' not found", name),
            Self::DuplicateEntry(name) => write!(f, "Script entry '{}' is already registered", name),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

pub type EntryFn = dyn Fn(&GameInstance) -> anyhow::Result<()> + Send + Sync;

/// Name of the built-in entry registered by [`ScriptHost::with_main_game`].
pub const MAIN_GAME: &str = "MainGame";

#[derive(Default)]
pub struct ScriptHost {
    entries: DashMap<String, Arc<EntryFn>>,
}

impl ScriptHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host with the `MainGame` entry bound to `runtime`.
    pub fn with_main_game(runtime: &Arc<Runtime>) -> Self {
        let host = Self::new();
        let runtime = runtime.clone();
        // a fresh host has no entries
        let _ = host.register_entry(MAIN_GAME, move |game_instance| {
            main_game(&runtime, game_instance);
            Ok(())
        });
        host
    }

    pub fn register_entry<F>(&self, name: impl Into<String>, func: F) -> Result<()>
    where
        F: Fn(&GameInstance) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        match self.entries.entry(name.into()) {
            Entry::Occupied(entry) => Err(Error::DuplicateEntry(entry.key().clone())),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(func));
                Ok(())
            }
        }
    }

    pub fn has_entry(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

impl ScriptEnv for ScriptHost {
    fn start(&self, entry: &str, game_instance: &GameInstance) -> anyhow::Result<()> {
        let func = self.entries
            .get(entry)
            .map(|found| found.value().clone())
            .ok_or_else(|| Error::EntryNotFound(entry.to_string()))?;
        func(game_instance)
    }
}

/// The `MainGame` entry: every `FCall` firing becomes a dispatch on `runtime`.
///
/// Names that are not valid method names and failed dispatches are logged and
/// dropped; nothing is reported back to the host.
pub fn main_game(runtime: &Arc<Runtime>, game_instance: &GameInstance) {
    tracing::info!(game_instance = %game_instance.handle(), "MainGame started");

    let runtime = runtime.clone();
    game_instance.fcall().bind(move |(function_name, object): FCallArgs| {
        let name = match MethodName::new(&function_name) {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(%object, error = %e, "FCall ignored");
                return;
            }
        };

        if let Err(e) = runtime.dispatch(object, &name) {
            tracing::warn!(error = %e, "FCall dispatch failed");
        }
    });
}
