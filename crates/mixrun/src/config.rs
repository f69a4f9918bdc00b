//! Runtime configuration.

/// Interface a class implements to opt into automatic mixin application.
pub const MIXIN_INTERFACE: &str = "PuertsMixinInterface";

/// Class-default property holding the script module to mix into the class.
pub const MIXIN_MODULE_PATH: &str = "MixinModulePath";

/// Configuration for a [`Runtime`](crate::Runtime) and its game instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Script entry started by the game instance.
    pub script_entry: String,
    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Whether the auto-mixin listener is attached at start-up.
    pub auto_mixin: bool,
    /// Interface name that marks a class as mixin-capable.
    pub mixin_interface: String,
}

impl Config {
    pub fn standard() -> Self {
        Self {
            script_entry: "MainGame".to_string(),
            log_filter: "mixrun=info,hostobj=info".to_string(),
            auto_mixin: true,
            mixin_interface: MIXIN_INTERFACE.to_string(),
        }
    }

    /// Reads overrides from the process environment.
    ///
    /// - `MIXRUN_SCRIPT_ENTRY`
    /// - `MIXRUN_LOG`
    /// - `MIXRUN_AUTO_MIXIN` (`0`/`false`/`off` disables)
    /// - `MIXRUN_MIXIN_INTERFACE`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::standard();

        if let Some(entry) = lookup("MIXRUN_SCRIPT_ENTRY").filter(|v| !v.is_empty()) {
            config.script_entry = entry;
        }
        if let Some(filter) = lookup("MIXRUN_LOG").filter(|v| !v.is_empty()) {
            config.log_filter = filter;
        }
        if let Some(flag) = lookup("MIXRUN_AUTO_MIXIN") {
            config.auto_mixin = !matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            );
        }
        if let Some(interface) = lookup("MIXRUN_MIXIN_INTERFACE").filter(|v| !v.is_empty()) {
            config.mixin_interface = interface;
        }

        config
    }

    pub fn with_script_entry(mut self, entry: impl Into<String>) -> Self {
        self.script_entry = entry.into();
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    pub fn with_auto_mixin(mut self, enabled: bool) -> Self {
        self.auto_mixin = enabled;
        self
    }

    pub fn with_mixin_interface(mut self, interface: impl Into<String>) -> Self {
        self.mixin_interface = interface.into();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::standard()
    }
}
