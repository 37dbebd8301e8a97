//! Filesystem helpers for staging and installing entries.
//!
//! All functions are synchronous; async callers run them on the blocking pool.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Write staged content to a fresh file and flush it to disk.
///
/// Fails if `path` already exists.
pub fn write_new(path: &Path, content: &[u8]) -> io::Result<()> {
  let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
  file.write_all(content)?;
  file.sync_all()
}

/// Set exact permission bits.
#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
  use std::os::unix::fs::PermissionsExt;
  fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

/// Windows has no mode bits; only the write bit is honoured.
#[cfg(windows)]
pub fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
  let mut perms = fs::metadata(path)?.permissions();
  perms.set_readonly(mode & 0o200 == 0);
  fs::set_permissions(path, perms)
}

/// Move a finished file into place and make the rename durable.
pub fn install(staged: &Path, dest: &Path) -> io::Result<()> {
  fs::rename(staged, dest)?;
  sync_parent(dest)
}

#[cfg(unix)]
fn sync_parent(path: &Path) -> io::Result<()> {
  match path.parent() {
    Some(parent) => File::open(parent)?.sync_all(),
    None => Ok(()),
  }
}

#[cfg(windows)]
fn sync_parent(_path: &Path) -> io::Result<()> {
  Ok(())
}

/// Rename `from` to `to`, failing with `AlreadyExists` instead of replacing
/// anything already at `to`.
#[cfg(target_os = "linux")]
pub fn rename_no_replace(from: &Path, to: &Path) -> io::Result<()> {
  use rustix::fs::{CWD, RenameFlags, renameat_with};
  use rustix::io::Errno;

  match renameat_with(CWD, from, CWD, to, RenameFlags::NOREPLACE) {
    Ok(()) => Ok(()),
    // Filesystems without RENAME_NOREPLACE support.
    Err(e) if e == Errno::INVAL || e == Errno::NOSYS => rename_checked(from, to),
    Err(e) => Err(e.into()),
  }
}

#[cfg(not(target_os = "linux"))]
pub fn rename_no_replace(from: &Path, to: &Path) -> io::Result<()> {
  rename_checked(from, to)
}

fn rename_checked(from: &Path, to: &Path) -> io::Result<()> {
  if exists_no_follow(to) {
    return Err(io::Error::new(
      io::ErrorKind::AlreadyExists,
      format!("{} already exists", to.display()),
    ));
  }
  fs::rename(from, to)
}

/// Create a symlink at `link` pointing at `target`, recorded verbatim.
pub fn symlink(target: &Path, link: &Path) -> io::Result<()> {
  #[cfg(unix)]
  {
    std::os::unix::fs::symlink(target, link)
  }
  #[cfg(windows)]
  {
    if target.is_dir() {
      std::os::windows::fs::symlink_dir(target, link)
    } else {
      std::os::windows::fs::symlink_file(target, link)
    }
  }
}

/// Whether anything (including a dangling symlink) exists at `path`.
pub fn exists_no_follow(path: &Path) -> bool {
  fs::symlink_metadata(path).is_ok()
}

/// Remove whatever is at `path` without following symlinks.
pub fn remove_any(path: &Path) -> io::Result<()> {
  let meta = fs::symlink_metadata(path)?;
  if meta.is_dir() {
    fs::remove_dir_all(path)
  } else {
    fs::remove_file(path)
  }
}
