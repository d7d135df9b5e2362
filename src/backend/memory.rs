//! In-memory backend.
//!
//! Used for tests and scratch overlays. All data is lost when dropped.

use super::{paginate, Backend, DirEntry, File, FileKind, Metadata, OpenFlags, TempDir};
use crate::error::not_found;
use crate::path::{self, ROOT};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;
use std::time::SystemTime;

const MEM_TEMP_DIR: &str = "/tmp";

#[derive(Debug, Clone, Copy)]
struct Attrs {
    mode: u32,
    modified: SystemTime,
    accessed: SystemTime,
    uid: u32,
    gid: u32,
}

impl Attrs {
    fn new(mode: u32) -> Self {
        let now = SystemTime::now();
        Attrs {
            mode: mode & 0o7777,
            modified: now,
            accessed: now,
            uid: 0,
            gid: 0,
        }
    }
}

#[derive(Debug)]
struct FileData {
    data: Vec<u8>,
    attrs: Attrs,
}

/// File contents are shared between every handle open on the same path so
/// writes are visible immediately.
#[derive(Debug, Clone)]
enum Node {
    File(Arc<Mutex<FileData>>),
    Directory(Attrs),
}

impl Node {
    fn metadata(&self, path: &str) -> Metadata {
        match self {
            Node::File(file) => {
                let file = file.lock();
                build_metadata(path, FileKind::File, file.data.len() as u64, &file.attrs)
            }
            Node::Directory(attrs) => build_metadata(path, FileKind::Directory, 0, attrs),
        }
    }
}

fn build_metadata(path: &str, kind: FileKind, size: u64, attrs: &Attrs) -> Metadata {
    Metadata {
        name: path::file_name(path).to_string(),
        kind,
        size,
        mode: attrs.mode,
        modified: attrs.modified,
        accessed: attrs.accessed,
        uid: attrs.uid,
        gid: attrs.gid,
    }
}

fn error(kind: io::ErrorKind, what: &str, path: &str) -> io::Error {
    io::Error::new(kind, format!("{}: {}", what, path))
}

fn subtree_prefix(dir: &str) -> String {
    if dir == ROOT {
        ROOT.to_string()
    } else {
        format!("{}/", dir)
    }
}

fn check_parent(nodes: &BTreeMap<String, Node>, path: &str) -> io::Result<()> {
    let Some(parent) = path::parent(path) else {
        return Ok(());
    };
    match nodes.get(&parent) {
        Some(Node::Directory(_)) => Ok(()),
        Some(Node::File(_)) => Err(error(io::ErrorKind::NotADirectory, "not a directory", &parent)),
        None => Err(not_found(&parent)),
    }
}

fn children(nodes: &BTreeMap<String, Node>, dir: &str) -> Vec<DirEntry> {
    let prefix = subtree_prefix(dir);
    nodes
        .range(prefix.clone()..)
        .take_while(|(key, _)| key.starts_with(&prefix))
        .filter(|(key, _)| key.len() > prefix.len() && !key[prefix.len()..].contains('/'))
        .map(|(key, node)| DirEntry {
            name: path::file_name(key).to_string(),
            metadata: node.metadata(key),
        })
        .collect()
}

fn has_children(nodes: &BTreeMap<String, Node>, dir: &str) -> bool {
    let prefix = subtree_prefix(dir);
    nodes
        .range(prefix.clone()..)
        .take_while(|(key, _)| key.starts_with(&prefix))
        .any(|(key, _)| key.len() > prefix.len())
}

/// In-memory filesystem.
///
/// Thread-safe via an internal `RwLock` over a sorted path map, so directory
/// listings come back ordered by name.
#[derive(Debug)]
pub struct MemFs {
    nodes: RwLock<BTreeMap<String, Node>>,
}

impl Default for MemFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemFs {
    /// Create an empty filesystem holding only the root directory.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(ROOT.to_string(), Node::Directory(Attrs::new(0o755)));
        MemFs {
            nodes: RwLock::new(nodes),
        }
    }

    /// Write a whole file, creating missing parent directories.
    ///
    /// A seeding convenience for tests and fixtures.
    pub fn write_file(&self, path: &str, data: &[u8], perm: u32) -> io::Result<()> {
        let path = path::normalize(path);
        for dir in path::ancestors(&path) {
            match self.mkdir(&dir, 0o755) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e),
            }
        }
        let mut file = self.open_file(
            &path,
            OpenFlags::WRITE_ONLY | OpenFlags::CREATE | OpenFlags::TRUNCATE,
            perm,
        )?;
        file.write_all(data)
    }

    fn update_attrs<F>(&self, path: &str, update: F) -> io::Result<()>
    where
        F: FnOnce(&mut Attrs),
    {
        let path = path::normalize(path);
        let mut nodes = self.nodes.write();
        match nodes.get_mut(&path) {
            Some(Node::File(file)) => {
                update(&mut file.lock().attrs);
                Ok(())
            }
            Some(Node::Directory(attrs)) => {
                update(attrs);
                Ok(())
            }
            None => Err(not_found(&path)),
        }
    }
}

impl Backend for MemFs {
    fn open_file(&self, path: &str, flags: OpenFlags, perm: u32) -> io::Result<Box<dyn File>> {
        let path = path::normalize(path);
        let exclusive = flags.contains(OpenFlags::CREATE | OpenFlags::EXCLUSIVE);

        let existing = self.nodes.read().get(&path).cloned();
        let node = match existing {
            Some(_) if exclusive => {
                return Err(error(io::ErrorKind::AlreadyExists, "already exists", &path));
            }
            Some(node) => node,
            None if !flags.contains(OpenFlags::CREATE) => return Err(not_found(&path)),
            None => {
                let mut nodes = self.nodes.write();
                // Another thread may have created it between the two locks
                match nodes.get(&path) {
                    Some(_) if exclusive => {
                        return Err(error(io::ErrorKind::AlreadyExists, "already exists", &path));
                    }
                    Some(node) => node.clone(),
                    None => {
                        check_parent(&nodes, &path)?;
                        let node = Node::File(Arc::new(Mutex::new(FileData {
                            data: Vec::new(),
                            attrs: Attrs::new(perm),
                        })));
                        nodes.insert(path.clone(), node.clone());
                        node
                    }
                }
            }
        };

        match node {
            Node::Directory(attrs) => {
                if flags.writable() {
                    return Err(error(io::ErrorKind::IsADirectory, "is a directory", &path));
                }
                let entries = children(&self.nodes.read(), &path);
                let metadata = build_metadata(&path, FileKind::Directory, 0, &attrs);
                Ok(Box::new(MemFile {
                    name: path,
                    handle: Handle::Directory {
                        metadata,
                        entries,
                        offset: 0,
                    },
                }))
            }
            Node::File(data) => {
                if flags.contains(OpenFlags::TRUNCATE) {
                    if !flags.writable() {
                        return Err(error(
                            io::ErrorKind::InvalidInput,
                            "truncate requires write access",
                            &path,
                        ));
                    }
                    let mut file = data.lock();
                    file.data.clear();
                    file.attrs.modified = SystemTime::now();
                }
                Ok(Box::new(MemFile {
                    name: path,
                    handle: Handle::File {
                        data,
                        cursor: 0,
                        flags,
                    },
                }))
            }
        }
    }

    fn mkdir(&self, path: &str, perm: u32) -> io::Result<()> {
        let path = path::normalize(path);
        let mut nodes = self.nodes.write();
        if nodes.contains_key(&path) {
            return Err(error(io::ErrorKind::AlreadyExists, "already exists", &path));
        }
        check_parent(&nodes, &path)?;
        nodes.insert(path, Node::Directory(Attrs::new(perm)));
        Ok(())
    }

    fn remove(&self, path: &str) -> io::Result<()> {
        let path = path::normalize(path);
        if path == ROOT {
            return Err(error(io::ErrorKind::PermissionDenied, "cannot remove", &path));
        }
        let mut nodes = self.nodes.write();
        match nodes.get(&path) {
            None => return Err(not_found(&path)),
            Some(Node::Directory(_)) if has_children(&nodes, &path) => {
                return Err(error(io::ErrorKind::DirectoryNotEmpty, "directory not empty", &path));
            }
            Some(_) => {}
        }
        nodes.remove(&path);
        Ok(())
    }

    fn rename(&self, old_path: &str, new_path: &str) -> io::Result<()> {
        let old_path = path::normalize(old_path);
        let new_path = path::normalize(new_path);

        let mut nodes = self.nodes.write();
        let Some(node) = nodes.get(&old_path).cloned() else {
            return Err(not_found(&old_path));
        };
        if old_path == new_path {
            return Ok(());
        }
        if old_path == ROOT || path::is_within(&new_path, &old_path) {
            return Err(error(
                io::ErrorKind::InvalidInput,
                "cannot move a directory into itself",
                &new_path,
            ));
        }
        check_parent(&nodes, &new_path)?;

        match (nodes.get(&new_path), &node) {
            (Some(Node::Directory(_)), Node::File(_)) => {
                return Err(error(io::ErrorKind::IsADirectory, "is a directory", &new_path));
            }
            (Some(Node::File(_)), Node::Directory(_)) => {
                return Err(error(io::ErrorKind::NotADirectory, "not a directory", &new_path));
            }
            (Some(Node::Directory(_)), Node::Directory(_)) if has_children(&nodes, &new_path) => {
                return Err(error(
                    io::ErrorKind::DirectoryNotEmpty,
                    "directory not empty",
                    &new_path,
                ));
            }
            _ => {}
        }
        nodes.remove(&new_path);

        let prefix = subtree_prefix(&old_path);
        let moved: Vec<String> = std::iter::once(old_path.clone())
            .chain(
                nodes
                    .range(prefix.clone()..)
                    .take_while(|(key, _)| key.starts_with(&prefix))
                    .map(|(key, _)| key.clone()),
            )
            .collect();

        for key in moved {
            if let Some(node) = nodes.remove(&key) {
                let target = format!("{}{}", new_path, &key[old_path.len()..]);
                nodes.insert(target, node);
            }
        }
        Ok(())
    }

    fn stat(&self, path: &str) -> io::Result<Metadata> {
        let path = path::normalize(path);
        let nodes = self.nodes.read();
        nodes
            .get(&path)
            .map(|node| node.metadata(&path))
            .ok_or_else(|| not_found(&path))
    }

    fn chmod(&self, path: &str, mode: u32) -> io::Result<()> {
        self.update_attrs(path, |attrs| attrs.mode = mode & 0o7777)
    }

    fn chtimes(&self, path: &str, atime: SystemTime, mtime: SystemTime) -> io::Result<()> {
        self.update_attrs(path, |attrs| {
            attrs.accessed = atime;
            attrs.modified = mtime;
        })
    }

    fn chown(&self, path: &str, uid: u32, gid: u32) -> io::Result<()> {
        self.update_attrs(path, |attrs| {
            attrs.uid = uid;
            attrs.gid = gid;
        })
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        let path = path::normalize(path);
        let nodes = self.nodes.read();
        match nodes.get(&path) {
            Some(Node::File(file)) => Ok(file.lock().data.clone()),
            Some(Node::Directory(_)) => {
                Err(error(io::ErrorKind::IsADirectory, "is a directory", &path))
            }
            None => Err(not_found(&path)),
        }
    }

    fn as_temp_dir(&self) -> Option<&dyn TempDir> {
        Some(self)
    }
}

impl TempDir for MemFs {
    fn temp_dir(&self) -> String {
        MEM_TEMP_DIR.to_string()
    }
}

enum Handle {
    File {
        data: Arc<Mutex<FileData>>,
        cursor: u64,
        flags: OpenFlags,
    },
    Directory {
        metadata: Metadata,
        entries: Vec<DirEntry>,
        offset: usize,
    },
}

/// Handle returned by [`MemFs::open_file`].
///
/// Directory handles snapshot their listing at open time.
pub struct MemFile {
    name: String,
    handle: Handle,
}

fn read_from(file: &FileData, buf: &mut [u8], offset: u64) -> usize {
    let Ok(start) = usize::try_from(offset) else {
        return 0;
    };
    if start >= file.data.len() {
        return 0;
    }
    let n = buf.len().min(file.data.len() - start);
    buf[..n].copy_from_slice(&file.data[start..start + n]);
    n
}

fn write_into(file: &mut FileData, buf: &[u8], offset: u64) -> io::Result<usize> {
    let start = usize::try_from(offset)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))?;
    let end = start + buf.len();
    if file.data.len() < end {
        file.data.resize(end, 0);
    }
    file.data[start..end].copy_from_slice(buf);
    file.attrs.modified = SystemTime::now();
    Ok(buf.len())
}

fn access_denied(op: &str, path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("file not opened for {}: {}", op, path),
    )
}

impl Read for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.handle {
            Handle::File {
                data,
                cursor,
                flags,
            } => {
                if !flags.readable() {
                    return Err(access_denied("reading", &self.name));
                }
                let n = read_from(&data.lock(), buf, *cursor);
                *cursor += n as u64;
                Ok(n)
            }
            Handle::Directory { .. } => Err(error(
                io::ErrorKind::IsADirectory,
                "is a directory",
                &self.name,
            )),
        }
    }
}

impl Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.handle {
            Handle::File {
                data,
                cursor,
                flags,
            } => {
                if !flags.writable() {
                    return Err(access_denied("writing", &self.name));
                }
                let mut file = data.lock();
                if flags.contains(OpenFlags::APPEND) {
                    *cursor = file.data.len() as u64;
                }
                let n = write_into(&mut file, buf, *cursor)?;
                *cursor += n as u64;
                Ok(n)
            }
            Handle::Directory { .. } => Err(error(
                io::ErrorKind::IsADirectory,
                "is a directory",
                &self.name,
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.handle {
            Handle::File { data, cursor, .. } => {
                let len = data.lock().data.len() as u64;
                let target = match pos {
                    SeekFrom::Start(n) => Some(n),
                    SeekFrom::End(delta) => len.checked_add_signed(delta),
                    SeekFrom::Current(delta) => cursor.checked_add_signed(delta),
                };
                let target = target.ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "invalid seek to a negative or overflowing position",
                    )
                })?;
                *cursor = target;
                Ok(target)
            }
            Handle::Directory { offset, .. } => match pos {
                SeekFrom::Start(0) => {
                    *offset = 0;
                    Ok(0)
                }
                _ => Err(error(
                    io::ErrorKind::IsADirectory,
                    "is a directory",
                    &self.name,
                )),
            },
        }
    }
}

impl File for MemFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn stat(&self) -> io::Result<Metadata> {
        match &self.handle {
            Handle::File { data, .. } => {
                let file = data.lock();
                Ok(build_metadata(
                    &self.name,
                    FileKind::File,
                    file.data.len() as u64,
                    &file.attrs,
                ))
            }
            Handle::Directory { metadata, .. } => Ok(metadata.clone()),
        }
    }

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        match &self.handle {
            Handle::File { data, flags, .. } => {
                if !flags.readable() {
                    return Err(access_denied("reading", &self.name));
                }
                Ok(read_from(&data.lock(), buf, offset))
            }
            Handle::Directory { .. } => Err(error(
                io::ErrorKind::IsADirectory,
                "is a directory",
                &self.name,
            )),
        }
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize> {
        match &self.handle {
            Handle::File { data, flags, .. } => {
                if !flags.writable() {
                    return Err(access_denied("writing", &self.name));
                }
                write_into(&mut data.lock(), buf, offset)
            }
            Handle::Directory { .. } => Err(error(
                io::ErrorKind::IsADirectory,
                "is a directory",
                &self.name,
            )),
        }
    }

    fn truncate(&mut self, size: u64) -> io::Result<()> {
        match &self.handle {
            Handle::File { data, flags, .. } => {
                if !flags.writable() {
                    return Err(access_denied("writing", &self.name));
                }
                let size = usize::try_from(size)
                    .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "size out of range"))?;
                let mut file = data.lock();
                file.data.resize(size, 0);
                file.attrs.modified = SystemTime::now();
                Ok(())
            }
            Handle::Directory { .. } => Err(error(
                io::ErrorKind::IsADirectory,
                "is a directory",
                &self.name,
            )),
        }
    }

    fn read_dir_entries(&mut self, n: usize) -> io::Result<Vec<DirEntry>> {
        match &mut self.handle {
            Handle::Directory {
                entries, offset, ..
            } => Ok(paginate(entries, offset, n)),
            Handle::File { .. } => Err(error(
                io::ErrorKind::NotADirectory,
                "not a directory",
                &self.name,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_string(fs: &MemFs, path: &str) -> String {
        String::from_utf8(fs.read_file(path).unwrap()).unwrap()
    }

    #[test]
    fn test_root_exists() {
        let fs = MemFs::new();
        let meta = fs.stat("/").unwrap();
        assert!(meta.is_dir());
        assert_eq!(meta.name, "/");
    }

    #[test]
    fn test_create_write_read() {
        let fs = MemFs::new();
        let mut file = fs
            .open_file("/hello.txt", OpenFlags::WRITE_ONLY | OpenFlags::CREATE, 0o640)
            .unwrap();
        file.write_all(b"hello").unwrap();
        drop(file);

        assert_eq!(read_string(&fs, "/hello.txt"), "hello");
        let meta = fs.stat("hello.txt").unwrap();
        assert_eq!(meta.size, 5);
        assert_eq!(meta.mode, 0o640);
        assert!(meta.is_file());
    }

    #[test]
    fn test_create_requires_parent() {
        let fs = MemFs::new();
        let err = fs
            .open_file("/missing/file.txt", OpenFlags::WRITE_ONLY | OpenFlags::CREATE, 0o644)
            .err()
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_exclusive_create_fails_on_existing() {
        let fs = MemFs::new();
        fs.write_file("/a.txt", b"x", 0o644).unwrap();
        let err = fs
            .open_file(
                "/a.txt",
                OpenFlags::WRITE_ONLY | OpenFlags::CREATE | OpenFlags::EXCLUSIVE,
                0o644,
            )
            .err()
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_append_and_truncate() {
        let fs = MemFs::new();
        fs.write_file("/log.txt", b"one", 0o644).unwrap();

        let mut file = fs
            .open_file("/log.txt", OpenFlags::WRITE_ONLY | OpenFlags::APPEND, 0)
            .unwrap();
        file.write_all(b" two").unwrap();
        drop(file);
        assert_eq!(read_string(&fs, "/log.txt"), "one two");

        let file = fs
            .open_file("/log.txt", OpenFlags::WRITE_ONLY | OpenFlags::TRUNCATE, 0)
            .unwrap();
        drop(file);
        assert_eq!(read_string(&fs, "/log.txt"), "");
    }

    #[test]
    fn test_read_only_handle_rejects_writes() {
        let fs = MemFs::new();
        fs.write_file("/ro.txt", b"data", 0o644).unwrap();
        let mut file = fs.open_file("/ro.txt", OpenFlags::READ_ONLY, 0).unwrap();
        let err = file.write(b"nope").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_seek_and_positional_io() {
        let fs = MemFs::new();
        fs.write_file("/pos.txt", b"0123456789", 0o644).unwrap();
        let mut file = fs.open_file("/pos.txt", OpenFlags::READ_WRITE, 0).unwrap();

        file.seek(SeekFrom::Start(4)).unwrap();
        let mut buf = [0u8; 3];
        file.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"456");

        let mut buf = [0u8; 2];
        assert_eq!(file.read_at(&mut buf, 0).unwrap(), 2);
        assert_eq!(&buf, b"01");

        file.write_at(b"AB", 8).unwrap();
        assert_eq!(file.seek(SeekFrom::Current(0)).unwrap(), 7);
        assert!(file.seek(SeekFrom::Current(-100)).is_err());
        drop(file);

        assert_eq!(read_string(&fs, "/pos.txt"), "01234567AB");
    }

    #[test]
    fn test_directory_listing_sorted_and_paginated() {
        let fs = MemFs::new();
        fs.mkdir("/dir", 0o755).unwrap();
        fs.write_file("/dir/b.txt", b"b", 0o644).unwrap();
        fs.write_file("/dir/a.txt", b"a", 0o644).unwrap();
        fs.write_file("/dir/sub/c.txt", b"c", 0o644).unwrap();
        fs.write_file("/dir2/other.txt", b"x", 0o644).unwrap();

        let names: Vec<String> = fs.read_dir("/dir").unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);

        let mut dir = fs.open_file("/dir", OpenFlags::READ_ONLY, 0).unwrap();
        assert_eq!(dir.read_dir_names(2).unwrap(), vec!["a.txt", "b.txt"]);
        assert_eq!(dir.read_dir_names(2).unwrap(), vec!["sub"]);
        assert!(dir.read_dir_names(2).unwrap().is_empty());
    }

    #[test]
    fn test_open_directory_for_write_fails() {
        let fs = MemFs::new();
        fs.mkdir("/dir", 0o755).unwrap();
        let err = fs
            .open_file("/dir", OpenFlags::WRITE_ONLY, 0)
            .err()
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::IsADirectory);
    }

    #[test]
    fn test_mkdir_and_remove() {
        let fs = MemFs::new();
        fs.mkdir("/dir", 0o700).unwrap();
        assert_eq!(
            fs.mkdir("/dir", 0o700).unwrap_err().kind(),
            io::ErrorKind::AlreadyExists
        );
        fs.write_file("/dir/file.txt", b"x", 0o644).unwrap();
        assert_eq!(
            fs.remove("/dir").unwrap_err().kind(),
            io::ErrorKind::DirectoryNotEmpty
        );
        fs.remove("/dir/file.txt").unwrap();
        fs.remove("/dir").unwrap();
        assert!(!fs.exists("/dir"));
        assert_eq!(fs.remove("/dir").unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_rename_moves_subtree() {
        let fs = MemFs::new();
        fs.write_file("/src/a/one.txt", b"1", 0o644).unwrap();
        fs.write_file("/src/two.txt", b"2", 0o644).unwrap();

        fs.rename("/src", "/dst").unwrap();

        assert!(!fs.exists("/src"));
        assert_eq!(read_string(&fs, "/dst/a/one.txt"), "1");
        assert_eq!(read_string(&fs, "/dst/two.txt"), "2");
        assert!(fs.rename("/dst", "/dst/inner").is_err());
    }

    #[test]
    fn test_rename_replaces_file() {
        let fs = MemFs::new();
        fs.write_file("/a.txt", b"a", 0o644).unwrap();
        fs.write_file("/b.txt", b"b", 0o644).unwrap();
        fs.rename("/a.txt", "/b.txt").unwrap();
        assert_eq!(read_string(&fs, "/b.txt"), "a");
        assert!(!fs.exists("/a.txt"));
    }

    #[test]
    fn test_metadata_changes() {
        let fs = MemFs::new();
        fs.write_file("/f.txt", b"x", 0o644).unwrap();

        fs.chmod("/f.txt", 0o600).unwrap();
        fs.chown("/f.txt", 1000, 100).unwrap();
        let when = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        fs.chtimes("/f.txt", when, when).unwrap();

        let meta = fs.stat("/f.txt").unwrap();
        assert_eq!(meta.mode, 0o600);
        assert_eq!((meta.uid, meta.gid), (1000, 100));
        assert_eq!(meta.modified, when);
        assert_eq!(meta.accessed, when);

        assert_eq!(
            fs.chmod("/missing", 0o600).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_temp_dir_capability() {
        let fs = MemFs::new();
        let temp = fs.as_temp_dir().map(|t| t.temp_dir());
        assert_eq!(temp.as_deref(), Some("/tmp"));
    }
}
