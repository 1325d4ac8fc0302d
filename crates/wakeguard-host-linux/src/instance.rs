//! OS-wide instance lock
//!
//! An exclusive, non-blocking `flock` on `<runtime dir>/<name>.lock`. The
//! kernel drops the lock when the holding process dies, so a crashed instance
//! never blocks the next launch. The file itself is left in place.

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use wakeguard_host_api::{HostError, HostResult};
use wakeguard_util::{InstanceName, lock_path};

/// Held instance lock; released when dropped or when the process dies
pub struct InstanceLock {
    name: InstanceName,
    path: PathBuf,
    _lock: Flock<File>,
}

impl InstanceLock {
    pub fn name(&self) -> &InstanceName {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for InstanceLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceLock")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

/// Result of a lock attempt
#[derive(Debug)]
pub enum Acquire {
    /// This process is the primary instance
    Exclusive(InstanceLock),
    /// Another process holds the lock
    Deferred,
}

/// Try once to take the named lock in the runtime directory
pub fn acquire(name: &InstanceName) -> HostResult<Acquire> {
    acquire_at(name, &lock_path(name))
}

/// Try once to take the named lock at an explicit path
pub fn acquire_at(name: &InstanceName, path: &Path) -> HostResult<Acquire> {
    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
        fs::set_permissions(parent, fs::Permissions::from_mode(0o700))?;
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .mode(0o600)
        .open(path)?;

    match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
        Ok(lock) => {
            write_holder_pid(&lock);
            info!(instance = %name, path = %path.display(), "Instance lock acquired");
            Ok(Acquire::Exclusive(InstanceLock {
                name: name.clone(),
                path: path.to_path_buf(),
                _lock: lock,
            }))
        }
        Err((_, errno)) if errno == Errno::EWOULDBLOCK => {
            info!(instance = %name, "Instance lock held elsewhere");
            Ok(Acquire::Deferred)
        }
        Err((_, errno)) => Err(HostError::Io(errno.into())),
    }
}

/// Record the holder for anyone inspecting the runtime directory
fn write_holder_pid(lock: &Flock<File>) {
    let mut file: &File = lock;
    let result = file
        .set_len(0)
        .and_then(|_| writeln!(file, "{}", std::process::id()));
    if let Err(e) = result {
        debug!(error = %e, "Could not record pid in lock file");
    }
}
