use std::ffi::CString;
use std::os::raw::c_int;

use fifobench_core::backend_options::BackendOptions;
use fifobench_core::error::EngineError;
use fifobench_core::plugin::{PluginResult, StorageBuffer, StoragePlugin};

const DEFAULT_ROOT: &str = "./fifobench-data";
const MAX_RETRY: usize = 10_000;

/// POSIX filesystem plug-in: datasets are directories, objects are regular
/// files inside them. The one concrete, always-compiled-in backend.
pub struct PosixPlugin {
    root: String,
}

impl PosixPlugin {
    pub fn new() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
        }
    }
}

impl Default for PosixPlugin {
    fn default() -> Self {
        Self::new()
    }
}

fn errno() -> c_int {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

fn cpath(path: &str) -> Result<CString, EngineError> {
    CString::new(path).map_err(|e| EngineError::invalid(e.to_string()))
}

fn join(dset: &str, obj: &str) -> String {
    format!("{dset}/{obj}")
}

impl StoragePlugin for PosixPlugin {
    fn name(&self) -> &'static str {
        "posix"
    }

    fn configure(&mut self, options: &BackendOptions) -> Result<(), EngineError> {
        if let Some(value) = options.get("posix.root") {
            let root = value
                .as_str()
                .ok_or_else(|| EngineError::invalid("posix.root requires a value"))?;
            self.root = root.to_string();
        }
        Ok(())
    }

    fn initialize(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn prepare_global(&self) -> PluginResult {
        match std::fs::create_dir_all(&self.root) {
            Ok(()) => PluginResult::Ok,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => PluginResult::Noop,
            Err(_) => PluginResult::Error,
        }
    }

    fn purge_global(&self) -> PluginResult {
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => PluginResult::Ok,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PluginResult::Noop,
            Err(_) => PluginResult::Error,
        }
    }

    fn def_dset_name(&self, owner_rank: i32, dataset_index: u64) -> Result<String, EngineError> {
        Ok(format!("{}/d{}-{}", self.root, owner_rank, dataset_index))
    }

    fn def_obj_name(
        &self,
        owner_rank: i32,
        dataset_index: u64,
        seq_index: u64,
    ) -> Result<String, EngineError> {
        Ok(format!("o{}-{}-{}", owner_rank, dataset_index, seq_index))
    }

    fn create_dset(&self, dset: &str) -> PluginResult {
        let Ok(c) = cpath(dset) else {
            return PluginResult::Error;
        };
        let ret = unsafe { libc::mkdir(c.as_ptr(), 0o755) };
        if ret == 0 {
            PluginResult::Ok
        } else if errno() == libc::EEXIST {
            PluginResult::Noop
        } else {
            PluginResult::Error
        }
    }

    fn rm_dset(&self, dset: &str) -> PluginResult {
        let Ok(c) = cpath(dset) else {
            return PluginResult::Error;
        };
        let ret = unsafe { libc::rmdir(c.as_ptr()) };
        if ret == 0 {
            PluginResult::Ok
        } else if errno() == libc::ENOENT {
            PluginResult::Noop
        } else {
            PluginResult::Error
        }
    }

    fn write_obj(&self, dset: &str, obj: &str, buf: &StorageBuffer) -> PluginResult {
        let path = join(dset, obj);
        let Ok(c) = cpath(&path) else {
            return PluginResult::Error;
        };
        let fd = unsafe { libc::open(c.as_ptr(), libc::O_CREAT | libc::O_WRONLY | libc::O_TRUNC, 0o644) };
        if fd < 0 {
            return if errno() == libc::ENOENT {
                // parent dataset directory missing
                PluginResult::ErrorCreate
            } else {
                PluginResult::Error
            };
        }

        let mut written = 0usize;
        let mut retries = 0;
        let mut ok = true;
        while written < buf.len() {
            let n = unsafe {
                libc::write(
                    fd,
                    buf[written..].as_ptr() as *const libc::c_void,
                    buf.len() - written,
                )
            };
            if n < 0 {
                retries += 1;
                if retries >= MAX_RETRY {
                    ok = false;
                    break;
                }
                continue;
            }
            if n == 0 {
                ok = false;
                break;
            }
            written += n as usize;
        }
        unsafe { libc::close(fd) };
        if ok {
            PluginResult::Ok
        } else {
            PluginResult::Error
        }
    }

    fn read_obj(&self, dset: &str, obj: &str, buf: &mut StorageBuffer) -> PluginResult {
        let path = join(dset, obj);
        let Ok(c) = cpath(&path) else {
            return PluginResult::Error;
        };
        let fd = unsafe { libc::open(c.as_ptr(), libc::O_RDONLY) };
        if fd < 0 {
            return if errno() == libc::ENOENT {
                PluginResult::ErrorFind
            } else {
                PluginResult::Error
            };
        }

        let mut read = 0usize;
        let mut retries = 0;
        let mut ok = true;
        while read < buf.len() {
            let n = unsafe {
                libc::read(
                    fd,
                    buf[read..].as_mut_ptr() as *mut libc::c_void,
                    buf.len() - read,
                )
            };
            if n < 0 {
                retries += 1;
                if retries >= MAX_RETRY {
                    ok = false;
                    break;
                }
                continue;
            }
            if n == 0 {
                break; // short file: treat remainder as already read
            }
            read += n as usize;
        }
        unsafe { libc::close(fd) };
        if ok {
            PluginResult::Ok
        } else {
            PluginResult::Error
        }
    }

    fn stat_obj(&self, dset: &str, obj: &str, expected_size: u64) -> PluginResult {
        let path = join(dset, obj);
        let Ok(c) = cpath(&path) else {
            return PluginResult::Error;
        };
        let mut st: libc::stat = unsafe { std::mem::zeroed() };
        let ret = unsafe { libc::stat(c.as_ptr(), &mut st) };
        if ret != 0 {
            return if errno() == libc::ENOENT {
                PluginResult::ErrorFind
            } else {
                PluginResult::Error
            };
        }
        if expected_size > 0 && st.st_size as u64 != expected_size {
            return PluginResult::Error;
        }
        PluginResult::Ok
    }

    fn delete_obj(&self, dset: &str, obj: &str) -> PluginResult {
        let path = join(dset, obj);
        let Ok(c) = cpath(&path) else {
            return PluginResult::Error;
        };
        let ret = unsafe { libc::unlink(c.as_ptr()) };
        if ret == 0 {
            PluginResult::Ok
        } else if errno() == libc::ENOENT {
            PluginResult::Noop
        } else {
            PluginResult::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_plugin(tag: &str) -> PosixPlugin {
        let root = std::env::temp_dir().join(format!(
            "fifobench-posix-test-{}-{}-{}",
            std::process::id(),
            tag,
            fastrand_like()
        ));
        PosixPlugin {
            root: root.to_string_lossy().to_string(),
        }
    }

    // Cheap process-local counter so parallel tests don't collide on the
    // same scratch directory name.
    fn fastrand_like() -> u64 {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        COUNTER.fetch_add(1, Ordering::Relaxed)
    }

    #[test]
    fn create_write_read_delete_roundtrip() {
        let plugin = scratch_plugin("roundtrip");
        assert_eq!(plugin.prepare_global(), PluginResult::Ok);

        let dset = plugin.def_dset_name(0, 0).unwrap();
        assert_eq!(plugin.create_dset(&dset), PluginResult::Ok);

        let obj = plugin.def_obj_name(0, 0, 0).unwrap();
        let payload = vec![7u8; 64];
        assert_eq!(plugin.write_obj(&dset, &obj, &payload), PluginResult::Ok);

        assert_eq!(plugin.stat_obj(&dset, &obj, 64), PluginResult::Ok);

        let mut buf = vec![0u8; 64];
        assert_eq!(plugin.read_obj(&dset, &obj, &mut buf), PluginResult::Ok);
        assert_eq!(buf, payload);

        assert_eq!(plugin.delete_obj(&dset, &obj), PluginResult::Ok);
        assert_eq!(plugin.delete_obj(&dset, &obj), PluginResult::Noop);

        assert_eq!(plugin.rm_dset(&dset), PluginResult::Ok);
        assert_eq!(plugin.purge_global(), PluginResult::Ok);
    }

    #[test]
    fn read_of_missing_object_is_error_find() {
        let plugin = scratch_plugin("missing");
        plugin.prepare_global();
        let dset = plugin.def_dset_name(0, 0).unwrap();
        plugin.create_dset(&dset);
        let obj = plugin.def_obj_name(0, 0, 0).unwrap();
        let mut buf = vec![0u8; 16];
        assert_eq!(plugin.read_obj(&dset, &obj, &mut buf), PluginResult::ErrorFind);
        plugin.purge_global();
    }

    #[test]
    fn write_into_missing_dataset_is_error_create() {
        let plugin = scratch_plugin("nodset");
        // Root itself doesn't exist yet, so writing directly fails with
        // a missing-parent error.
        let dset = format!("{}/no-such-dir", plugin.root);
        let obj = "o".to_string();
        let payload = vec![1u8; 8];
        assert_eq!(
            plugin.write_obj(&dset, &obj, &payload),
            PluginResult::ErrorCreate
        );
    }

    #[test]
    fn purge_of_missing_root_is_noop() {
        let plugin = scratch_plugin("nevercreated");
        assert_eq!(plugin.purge_global(), PluginResult::Noop);
    }

    #[test]
    fn configure_overrides_root() {
        let mut plugin = PosixPlugin::new();
        let mut opts = BackendOptions::new();
        opts.insert(
            "posix.root",
            fifobench_core::backend_options::OptionValue::Str("/tmp/custom-root".to_string()),
        );
        plugin.configure(&opts).unwrap();
        assert_eq!(plugin.root, "/tmp/custom-root");
    }
}
