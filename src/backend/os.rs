//! Host filesystem backend rooted at a directory.

use super::{paginate, Backend, DirEntry, File, FileKind, Metadata, OpenFlags};
use crate::path::{self, ROOT};
use std::fs::{self, FileTimes, Permissions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::{DirBuilderExt, FileExt, MetadataExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// A [`Backend`] over a real directory tree.
///
/// Virtual paths are resolved below `root`; `..` components are collapsed
/// during normalization, so a path can never escape it.
#[derive(Debug, Clone)]
pub struct OsFs {
    root: PathBuf,
}

impl OsFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        OsFs { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a virtual path to the host path underneath `root`.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let normalized = path::normalize(path);
        let relative = normalized.trim_start_matches('/');
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }
}

fn convert_metadata(name: &str, meta: &fs::Metadata) -> Metadata {
    Metadata {
        name: name.to_string(),
        kind: if meta.is_dir() {
            FileKind::Directory
        } else {
            FileKind::File
        },
        size: meta.len(),
        mode: meta.mode() & 0o7777,
        modified: meta.modified().unwrap_or(UNIX_EPOCH),
        accessed: meta.accessed().unwrap_or(UNIX_EPOCH),
        uid: meta.uid(),
        gid: meta.gid(),
    }
}

fn list_dir(dir: &Path) -> io::Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        // Dangling symlinks fall back to lstat
        let meta = fs::metadata(entry.path()).or_else(|_| entry.metadata())?;
        entries.push(DirEntry {
            metadata: convert_metadata(&name, &meta),
            name,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

impl Backend for OsFs {
    fn open_file(&self, path: &str, flags: OpenFlags, perm: u32) -> io::Result<Box<dyn File>> {
        let name = path::normalize(path);
        let real = self.resolve(&name);
        let exclusive = flags.contains(OpenFlags::CREATE | OpenFlags::EXCLUSIVE);

        if let Ok(meta) = fs::metadata(&real) {
            if meta.is_dir() {
                if exclusive {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("already exists: {}", name),
                    ));
                }
                if flags.writable() {
                    return Err(io::Error::new(
                        io::ErrorKind::IsADirectory,
                        format!("is a directory: {}", name),
                    ));
                }
                let metadata = convert_metadata(path::file_name(&name), &meta);
                let entries = list_dir(&real)?;
                return Ok(Box::new(OsFile {
                    name,
                    handle: OsHandle::Directory {
                        metadata,
                        entries,
                        offset: 0,
                    },
                }));
            }
        }

        let write = flags.intersects(OpenFlags::WRITE_ONLY | OpenFlags::READ_WRITE);
        let mut options = fs::OpenOptions::new();
        options
            .read(flags.readable())
            .write(write)
            .append(flags.contains(OpenFlags::APPEND))
            .truncate(flags.contains(OpenFlags::TRUNCATE))
            .mode(perm);

        if flags.contains(OpenFlags::CREATE) {
            if flags.writable() {
                if exclusive {
                    options.create_new(true);
                } else {
                    options.create(true);
                }
            } else {
                // std refuses to create through a read-only open
                let mut creator = fs::OpenOptions::new();
                creator.write(true).mode(perm);
                if exclusive {
                    creator.create_new(true);
                } else {
                    creator.create(true);
                }
                creator.open(&real)?;
            }
        }

        let file = options.open(&real)?;
        Ok(Box::new(OsFile {
            name,
            handle: OsHandle::File(file),
        }))
    }

    fn mkdir(&self, path: &str, perm: u32) -> io::Result<()> {
        fs::DirBuilder::new().mode(perm).create(self.resolve(path))
    }

    fn remove(&self, path: &str) -> io::Result<()> {
        if path::normalize(path) == ROOT {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "cannot remove the backend root",
            ));
        }
        let real = self.resolve(path);
        if fs::symlink_metadata(&real)?.is_dir() {
            fs::remove_dir(&real)
        } else {
            fs::remove_file(&real)
        }
    }

    fn rename(&self, old_path: &str, new_path: &str) -> io::Result<()> {
        fs::rename(self.resolve(old_path), self.resolve(new_path))
    }

    fn stat(&self, path: &str) -> io::Result<Metadata> {
        let name = path::normalize(path);
        let meta = fs::metadata(self.resolve(&name))?;
        Ok(convert_metadata(path::file_name(&name), &meta))
    }

    fn chmod(&self, path: &str, mode: u32) -> io::Result<()> {
        fs::set_permissions(self.resolve(path), Permissions::from_mode(mode & 0o7777))
    }

    fn chtimes(&self, path: &str, atime: SystemTime, mtime: SystemTime) -> io::Result<()> {
        let file = fs::File::open(self.resolve(path))?;
        file.set_times(FileTimes::new().set_accessed(atime).set_modified(mtime))
    }

    fn chown(&self, path: &str, uid: u32, gid: u32) -> io::Result<()> {
        std::os::unix::fs::chown(self.resolve(path), Some(uid), Some(gid))
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(path))
    }
}

enum OsHandle {
    File(fs::File),
    Directory {
        metadata: Metadata,
        entries: Vec<DirEntry>,
        offset: usize,
    },
}

/// Handle returned by [`OsFs::open_file`].
pub struct OsFile {
    name: String,
    handle: OsHandle,
}

impl OsFile {
    fn is_a_directory(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::IsADirectory,
            format!("is a directory: {}", self.name),
        )
    }
}

impl Read for OsFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.handle {
            OsHandle::File(file) => file.read(buf),
            OsHandle::Directory { .. } => Err(self.is_a_directory()),
        }
    }
}

impl Write for OsFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.handle {
            OsHandle::File(file) => file.write(buf),
            OsHandle::Directory { .. } => Err(self.is_a_directory()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.handle {
            OsHandle::File(file) => file.flush(),
            OsHandle::Directory { .. } => Ok(()),
        }
    }
}

impl Seek for OsFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.handle {
            OsHandle::File(file) => file.seek(pos),
            OsHandle::Directory { offset, .. } if matches!(pos, SeekFrom::Start(0)) => {
                *offset = 0;
                Ok(0)
            }
            OsHandle::Directory { .. } => Err(self.is_a_directory()),
        }
    }
}

impl File for OsFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn stat(&self) -> io::Result<Metadata> {
        match &self.handle {
            OsHandle::File(file) => Ok(convert_metadata(
                path::file_name(&self.name),
                &file.metadata()?,
            )),
            OsHandle::Directory { metadata, .. } => Ok(metadata.clone()),
        }
    }

    fn sync(&mut self) -> io::Result<()> {
        match &self.handle {
            OsHandle::File(file) => file.sync_all(),
            OsHandle::Directory { .. } => Ok(()),
        }
    }

    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        match &self.handle {
            OsHandle::File(file) => FileExt::read_at(file, buf, offset),
            OsHandle::Directory { .. } => Err(self.is_a_directory()),
        }
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize> {
        match &self.handle {
            OsHandle::File(file) => FileExt::write_at(file, buf, offset),
            OsHandle::Directory { .. } => Err(self.is_a_directory()),
        }
    }

    fn truncate(&mut self, size: u64) -> io::Result<()> {
        match &self.handle {
            OsHandle::File(file) => file.set_len(size),
            OsHandle::Directory { .. } => Err(self.is_a_directory()),
        }
    }

    fn read_dir_entries(&mut self, n: usize) -> io::Result<Vec<DirEntry>> {
        match &mut self.handle {
            OsHandle::Directory {
                entries, offset, ..
            } => Ok(paginate(entries, offset, n)),
            OsHandle::File(_) => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: {}", self.name),
            )),
        }
    }
}
