use std::collections::BTreeMap;
use std::fmt;

use crate::backend_options::BackendOptions;
use crate::error::EngineError;

/// Payload buffer passed to `write_obj`/`read_obj`. A plain `Vec<u8>` alias
/// keeps call sites readable without introducing an opaque handle type —
/// plug-ins never need anything beyond a byte slice.
pub type StorageBuffer = Vec<u8>;

/// Closed result taxonomy every plug-in operation reports through.
///
/// `Noop` is distinct from `Ok`: it means the call was meaningful for this
/// plug-in's taxonomy but there was nothing to do (e.g. a flat namespace has
/// no dataset concept). The engine counts neither success nor failure for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginResult {
    Ok,
    Noop,
    Error,
    ErrorCreate,
    ErrorFind,
}

impl PluginResult {
    pub fn is_success(self) -> bool {
        matches!(self, PluginResult::Ok)
    }

    pub fn is_error(self) -> bool {
        matches!(
            self,
            PluginResult::Error | PluginResult::ErrorCreate | PluginResult::ErrorFind
        )
    }
}

impl fmt::Display for PluginResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PluginResult::Ok => "OK",
            PluginResult::Noop => "NOOP",
            PluginResult::Error => "ERROR",
            PluginResult::ErrorCreate => "ERROR_CREATE",
            PluginResult::ErrorFind => "ERROR_FIND",
        };
        f.write_str(s)
    }
}

/// The eight operation kinds the Statistics Aggregator tracks per phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OpKind {
    DsetName,
    DsetCreate,
    DsetDelete,
    ObjName,
    ObjCreate,
    ObjRead,
    ObjStat,
    ObjDelete,
}

impl OpKind {
    pub const ALL: [OpKind; 8] = [
        OpKind::DsetName,
        OpKind::DsetCreate,
        OpKind::DsetDelete,
        OpKind::ObjName,
        OpKind::ObjCreate,
        OpKind::ObjRead,
        OpKind::ObjStat,
        OpKind::ObjDelete,
    ];

    pub fn index(self) -> usize {
        OpKind::ALL.iter().position(|k| *k == self).unwrap()
    }
}

/// One option the plug-in accepts, surfaced for `--help`-style listings.
pub struct OptionDescriptor {
    pub name: &'static str,
    pub description: &'static str,
}

/// Capability bundle a storage backend implements. Every method is
/// synchronous and blocking — the engine is single-threaded per worker
/// (§5), so no async or cancellation surface is needed here.
pub trait StoragePlugin: Send {
    fn name(&self) -> &'static str;

    fn get_options(&self) -> Vec<OptionDescriptor> {
        Vec::new()
    }

    /// Apply plug-in-specific options parsed from the command line. Default
    /// no-op for plug-ins with nothing to configure.
    fn configure(&mut self, options: &BackendOptions) -> Result<(), EngineError> {
        let _ = options;
        Ok(())
    }

    fn initialize(&mut self) -> Result<(), EngineError>;
    fn finalize(&mut self) -> Result<(), EngineError>;

    /// Called only by rank 0, before precreate.
    fn prepare_global(&self) -> PluginResult;
    /// Called only by rank 0, after cleanup.
    fn purge_global(&self) -> PluginResult;

    fn def_dset_name(&self, owner_rank: i32, dataset_index: u64) -> Result<String, EngineError>;
    fn def_obj_name(
        &self,
        owner_rank: i32,
        dataset_index: u64,
        seq_index: u64,
    ) -> Result<String, EngineError>;

    fn create_dset(&self, dset: &str) -> PluginResult;
    fn rm_dset(&self, dset: &str) -> PluginResult;

    fn write_obj(&self, dset: &str, obj: &str, buf: &StorageBuffer) -> PluginResult;
    fn read_obj(&self, dset: &str, obj: &str, buf: &mut StorageBuffer) -> PluginResult;
    fn stat_obj(&self, dset: &str, obj: &str, expected_size: u64) -> PluginResult;
    fn delete_obj(&self, dset: &str, obj: &str) -> PluginResult;
}

type Constructor = fn() -> Box<dyn StoragePlugin>;

/// Selects a plug-in by name from a fixed list of constructors, the same
/// shape as the original's static plug-in table — just a small runtime map
/// instead of a function-pointer-table-of-structs.
pub struct PluginRegistry {
    constructors: BTreeMap<&'static str, Constructor>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, name: &'static str, ctor: Constructor) {
        self.constructors.insert(name, ctor);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.constructors.keys().copied().collect()
    }

    pub fn build(&self, name: &str) -> Result<Box<dyn StoragePlugin>, EngineError> {
        match self.constructors.get(name) {
            Some(ctor) => Ok(ctor()),
            None => Err(EngineError::UnknownPlugin(name.to_string())),
        }
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::DummyPlugin;

    #[test]
    fn unknown_plugin_is_an_error() {
        let registry = PluginRegistry::new();
        assert!(matches!(
            registry.build("nope"),
            Err(EngineError::UnknownPlugin(_))
        ));
    }

    #[test]
    fn registered_plugin_builds() {
        let mut registry = PluginRegistry::new();
        registry.register("dummy", || Box::new(DummyPlugin::new()));
        assert_eq!(registry.names(), vec!["dummy"]);
        let plugin = registry.build("dummy").unwrap();
        assert_eq!(plugin.name(), "dummy");
    }
}
