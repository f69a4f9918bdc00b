//! # mixrun
//!
//! Scripting bridge for a host object model: script-side mixins over host
//! classes, and a dynamic dispatch bridge that lets the host call methods on
//! objects by name.
//!
//! ## Architecture
//!
//! - **Dispatcher**: resolves `(handle, name)` against the object's class chain
//!   and mixin hooks, and contains every failure in a typed result
//! - **MixinRegistry**: script modules and the mixins applied to classes
//! - **AutoMixinListener**: applies mixins as mixin-capable classes are
//!   instantiated, removes them when classes unload
//! - **GameInstance**: starts the script environment and owns the `FCall` event
//! - **ScriptHost**: named entry points, including the built-in `MainGame`
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hostobj::Class;
//! use mixrun::{Config, GameInstance, Mixin, Runtime, ScriptEnv, ScriptHost};
//!
//! # fn example() -> anyhow::Result<()> {
//! let runtime = Arc::new(Runtime::new(Config::standard()));
//!
//! runtime.mixins().register_module(
//!     "Project/Blueprints/Character/BP_MainCharacter",
//!     Mixin::new("/Game/BP_MainCharacter.BP_MainCharacter_C")
//!         .hook("ReceiveBeginPlay", |_| Ok(()))?,
//! )?;
//!
//! let gi_class = runtime.objects().register_class(Class::builder("GameInstance"))?;
//! let game_instance = GameInstance::new(runtime.objects().spawn(gi_class.id(), "GI")?, runtime.config());
//!
//! let host: Arc<dyn ScriptEnv> = Arc::new(ScriptHost::with_main_game(&runtime));
//! game_instance.on_start(&host)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod delegate;
pub mod dispatch;
pub mod game_instance;
pub mod game_thread;
pub mod listener;
pub mod mixin;
pub mod runtime;
pub mod script;
pub mod traits;

pub use config::Config;
pub use delegate::Delegate;
pub use dispatch::DispatchError;
pub use dispatch::DispatchRequest;
pub use dispatch::DispatchResult;
pub use dispatch::Dispatcher;
pub use game_instance::GameInstance;
pub use game_thread::GameThread;
pub use listener::AutoMixinListener;
pub use mixin::Mixin;
pub use mixin::MixinOptions;
pub use mixin::MixinRegistry;
pub use runtime::Runtime;
pub use script::ScriptHost;
pub use traits::ScriptEnv;

/// Installs a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over [`Config::log_filter`]. Safe to call more
/// than once; only the first call installs anything.
pub fn init_logging(config: &Config) {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
        )
        .with_target(false)
        .with_thread_ids(true)
        .try_init();
}
