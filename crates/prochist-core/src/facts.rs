//! Automatic field collection.
//!
//! The record builder never reads process state directly: it asks a
//! [`FactProvider`]. [`SystemFacts`] reads the real host; [`StaticFacts`]
//! returns a fixed mapping for tests and replays.

use indexmap::IndexMap;
use prochist_types::{Fields, keys};
use serde_json::Value;

/// Version recorded for a component whose version cannot be determined.
pub const UNKNOWN_VERSION: &str = "unknown";

/// `rustc --version` of the compiler that built this crate, set by `build.rs`.
pub const RUSTC_VERSION: &str = env!("PROCHIST_RUSTC_VERSION");

/// Source of the automatically recorded fields.
pub trait FactProvider {
    /// Every automatic field this provider can supply, in recording order.
    fn facts(&self) -> Fields;
}

/// Facts gathered from the running process and host.
#[derive(Clone, Debug)]
pub struct SystemFacts {
    components: IndexMap<String, Option<String>>,
}

impl Default for SystemFacts {
    fn default() -> Self {
        let mut components = IndexMap::new();
        components.insert(
            env!("CARGO_PKG_NAME").to_string(),
            Some(env!("CARGO_PKG_VERSION").to_string()),
        );
        Self { components }
    }
}

impl SystemFacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the version of a software component used by the caller.
    ///
    /// `None` is recorded as [`UNKNOWN_VERSION`].
    pub fn with_component(mut self, name: impl Into<String>, version: Option<&str>) -> Self {
        self.components
            .insert(name.into(), version.map(str::to_string));
        self
    }

    fn component_versions(&self) -> Value {
        self.components
            .iter()
            .map(|(name, version)| {
                let version = version.as_deref().unwrap_or(UNKNOWN_VERSION);
                (name.clone(), Value::String(version.to_string()))
            })
            .collect::<serde_json::Map<_, _>>()
            .into()
    }
}

impl FactProvider for SystemFacts {
    fn facts(&self) -> Fields {
        let mut fields = Fields::new();
        let mut put = |key: &str, value: Value| {
            fields.insert(key.to_string(), value);
        };

        put(
            keys::TIMESTAMP,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%z").to_string().into(),
        );
        put(keys::LOGIN, whoami::username().into());

        let os = os_info::get();
        put(keys::UNAME_OS, os.os_type().to_string().into());
        if let Some(host) = hostname::get().ok().map(|h| h.to_string_lossy().into_owned()) {
            put(keys::UNAME_HOST, host.into());
        }
        put(keys::UNAME_RELEASE, os.version().to_string().into());
        put(
            keys::UNAME_VERSION,
            os.edition()
                .or(os.codename())
                .unwrap_or(UNKNOWN_VERSION)
                .into(),
        );
        put(
            keys::UNAME_MACHINE,
            os.architecture().unwrap_or(std::env::consts::ARCH).into(),
        );

        if let Ok(cwd) = std::env::current_dir() {
            put(keys::CWD, cwd.display().to_string().into());
        }

        let args: Vec<String> = std::env::args().collect();
        if let Some(program) = args.first().filter(|p| !p.is_empty()) {
            let (script, script_dir) = split_program(program);
            put(keys::SCRIPT, script.into());
            put(keys::SCRIPT_DIR, script_dir.into());
            put(keys::COMMANDLINE, args[1..].join(" ").into());
        }

        put(keys::RUNTIME_VERSION, RUSTC_VERSION.into());
        put(keys::COMPONENT_VERSIONS, self.component_versions());

        fields
    }
}

/// Base name and directory of the invoking program path.
fn split_program(program: &str) -> (String, String) {
    let path = std::path::Path::new(program);
    let script = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string());
    let script_dir = path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    (script, script_dir)
}

/// A fixed set of facts.
#[derive(Clone, Debug, Default)]
pub struct StaticFacts(Fields);

impl StaticFacts {
    pub fn new(fields: Fields) -> Self {
        Self(fields)
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl FactProvider for StaticFacts {
    fn facts(&self) -> Fields {
        self.0.clone()
    }
}
