//! An always-succeeding, no-storage plug-in.
//!
//! Useful for exercising the phase engine and statistics aggregator in unit
//! tests without touching a filesystem, and as the degenerate backend a
//! `list`-style plug-in enumeration would show alongside real backends.

use crate::error::EngineError;
use crate::plugin::{PluginResult, StorageBuffer, StoragePlugin};

pub struct DummyPlugin {
    initialized: bool,
}

impl DummyPlugin {
    pub fn new() -> Self {
        Self { initialized: false }
    }
}

impl Default for DummyPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePlugin for DummyPlugin {
    fn name(&self) -> &'static str {
        "dummy"
    }

    fn initialize(&mut self) -> Result<(), EngineError> {
        self.initialized = true;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), EngineError> {
        self.initialized = false;
        Ok(())
    }

    fn prepare_global(&self) -> PluginResult {
        PluginResult::Noop
    }

    fn purge_global(&self) -> PluginResult {
        PluginResult::Noop
    }

    fn def_dset_name(&self, owner_rank: i32, dataset_index: u64) -> Result<String, EngineError> {
        Ok(format!("dset-{owner_rank}-{dataset_index}"))
    }

    fn def_obj_name(
        &self,
        owner_rank: i32,
        dataset_index: u64,
        seq_index: u64,
    ) -> Result<String, EngineError> {
        Ok(format!("obj-{owner_rank}-{dataset_index}-{seq_index}"))
    }

    fn create_dset(&self, _dset: &str) -> PluginResult {
        PluginResult::Noop
    }

    fn rm_dset(&self, _dset: &str) -> PluginResult {
        PluginResult::Noop
    }

    fn write_obj(&self, _dset: &str, _obj: &str, _buf: &StorageBuffer) -> PluginResult {
        PluginResult::Noop
    }

    fn read_obj(&self, _dset: &str, _obj: &str, _buf: &mut StorageBuffer) -> PluginResult {
        PluginResult::Noop
    }

    fn stat_obj(&self, _dset: &str, _obj: &str, _expected_size: u64) -> PluginResult {
        PluginResult::Noop
    }

    fn delete_obj(&self, _dset: &str, _obj: &str) -> PluginResult {
        PluginResult::Noop
    }
}
