//! Fake SDDS programs for process-level tests.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

// Serialises script creation and execution across test threads: exec of a
// script fails with ETXTBSY while any forked child still holds its write fd.
static TOOL_LOCK: Mutex<()> = Mutex::new(());

pub fn lock_tools() -> MutexGuard<'static, ()> {
    TOOL_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Write an executable `/bin/sh` script named `name` into `dir`.
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}
