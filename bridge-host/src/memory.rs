//! In-memory host filesystem.
//!
//! [`MemoryFileSystem`] implements both host handle traits over an in-memory
//! tree of files, directories and symbolic links. Callbacks are invoked
//! inline, before the host method returns, which exercises the synchronous
//! completion path of the bridge. Errors use node-style codes.
//!
//! # Path Handling
//!
//! Paths are posix-style and normalized lexically (`.` and `..` are folded,
//! duplicate separators removed). The root directory `/` always exists.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bridge_traits::{
    FileContent, HostCallback, HostError, HostResult, HostStats, InputFileSystem,
    OutputFileSystem,
};
use bytes::Bytes;

/// Symbolic link hops allowed while resolving one path
const MAX_SYMLINK_HOPS: usize = 40;

#[derive(Debug, Clone)]
enum Node {
    File(Bytes),
    Directory,
    Symlink(String),
}

#[derive(Debug)]
pub struct MemoryFileSystem {
    nodes: RwLock<BTreeMap<String, Node>>,
}

fn components(path: &str) -> VecDeque<String> {
    let mut parts = VecDeque::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop_back();
            }
            other => parts.push_back(other.to_string()),
        }
    }
    parts
}

fn normalize(path: &str) -> String {
    let parts = components(path);
    if parts.is_empty() {
        "/".to_string()
    } else {
        let joined: Vec<String> = parts.into_iter().collect();
        format!("/{}", joined.join("/"))
    }
}

fn child_of(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

fn split_parent(path: &str) -> (String, String) {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(0) => ("/".to_string(), normalized[1..].to_string()),
        Some(idx) => (
            normalized[..idx].to_string(),
            normalized[idx + 1..].to_string(),
        ),
        None => ("/".to_string(), normalized),
    }
}

fn enoent(syscall: &str, path: &str) -> HostError {
    HostError::coded("ENOENT", "no such file or directory", syscall, path).with_errno(-2)
}

fn enotdir(syscall: &str, path: &str) -> HostError {
    HostError::coded("ENOTDIR", "not a directory", syscall, path).with_errno(-20)
}

fn eisdir(syscall: &str, path: &str) -> HostError {
    HostError::coded("EISDIR", "illegal operation on a directory", syscall, path)
        .with_errno(-21)
}

fn eexist(syscall: &str, path: &str) -> HostError {
    HostError::coded("EEXIST", "file already exists", syscall, path).with_errno(-17)
}

fn stats_of(node: &Node) -> HostStats {
    match node {
        Node::File(bytes) => HostStats::file(bytes.len() as u64),
        Node::Directory => HostStats::directory(),
        Node::Symlink(_) => HostStats::symlink(),
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFileSystem {
    /// Create a filesystem containing only the root directory.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Directory);
        Self {
            nodes: RwLock::new(nodes),
        }
    }

    /// Create a filesystem seeded with files, creating parent directories.
    pub fn from_files<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: Into<Bytes>,
    {
        let fs = Self::new();
        for (path, content) in files {
            fs.add_file(path.as_ref(), content);
        }
        fs
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Node>> {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Node>> {
        self.nodes.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a file, replacing whatever was there and creating parents.
    pub fn add_file(&self, path: &str, content: impl Into<Bytes>) {
        self.seed(path, Node::File(content.into()));
    }

    /// Create a directory and its missing parents.
    ///
    /// Seeding wins over existing entries: a file or link standing where a
    /// directory is needed is replaced by one.
    pub fn add_dir(&self, path: &str) {
        let mut nodes = self.write();
        Self::seed_dirs(&mut nodes, path);
    }

    /// Create a symbolic link at `path` pointing to `target`.
    pub fn add_symlink(&self, target: &str, path: &str) {
        self.seed(path, Node::Symlink(target.to_string()));
    }

    fn seed(&self, path: &str, node: Node) {
        let (parent, _) = split_parent(path);
        let path = normalize(path);
        if path == "/" {
            return;
        }
        let mut nodes = self.write();
        Self::seed_dirs(&mut nodes, &parent);

        let prefix = child_of(&path, "");
        nodes.retain(|key, _| !key.starts_with(&prefix));
        nodes.insert(path, node);
    }

    fn seed_dirs(nodes: &mut BTreeMap<String, Node>, path: &str) {
        let mut current = "/".to_string();
        for part in components(path) {
            current = child_of(&current, &part);
            if !matches!(nodes.get(&current), Some(Node::Directory)) {
                nodes.insert(current.clone(), Node::Directory);
            }
        }
    }

    /// Contents of the file at `path`, read straight from the store.
    pub fn contents(&self, path: &str) -> Option<Bytes> {
        match self.read().get(&normalize(path)) {
            Some(Node::File(bytes)) => Some(bytes.clone()),
            _ => None,
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.read().contains_key(&normalize(path))
    }

    pub fn is_dir(&self, path: &str) -> bool {
        matches!(self.read().get(&normalize(path)), Some(Node::Directory))
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Resolve `path` to the normalized path of an existing node, following
    /// symbolic links on intermediate components and, if `follow_last`, on
    /// the final one.
    fn resolve(
        nodes: &BTreeMap<String, Node>,
        path: &str,
        follow_last: bool,
        syscall: &str,
    ) -> HostResult<String> {
        let mut pending = components(path);
        let mut current = "/".to_string();
        let mut hops = 0;

        while let Some(part) = pending.pop_front() {
            let candidate = child_of(&current, &part);
            match nodes.get(&candidate) {
                None => return Err(enoent(syscall, path)),
                Some(Node::Symlink(target)) if follow_last || !pending.is_empty() => {
                    hops += 1;
                    if hops > MAX_SYMLINK_HOPS {
                        return Err(HostError::coded(
                            "ELOOP",
                            "too many symbolic links encountered",
                            syscall,
                            path,
                        ));
                    }
                    let absolute = if target.starts_with('/') {
                        target.clone()
                    } else {
                        child_of(&current, target)
                    };
                    let mut next = components(&absolute);
                    next.extend(pending.drain(..));
                    pending = next;
                    current = "/".to_string();
                }
                Some(Node::File(_)) | Some(Node::Symlink(_)) if !pending.is_empty() => {
                    return Err(enotdir(syscall, path));
                }
                Some(_) => current = candidate,
            }
        }

        Ok(current)
    }

    /// Resolve the parent of `path` and return `(parent, name)`; the parent
    /// must be an existing directory.
    fn resolve_parent(
        nodes: &BTreeMap<String, Node>,
        path: &str,
        syscall: &str,
    ) -> HostResult<(String, String)> {
        let (parent, name) = split_parent(path);
        let resolved = Self::resolve(nodes, &parent, true, syscall)
            .map_err(|err| HostError { path: Some(path.to_string()), ..err })?;
        match nodes.get(&resolved) {
            Some(Node::Directory) => Ok((resolved, name)),
            _ => Err(enotdir(syscall, path)),
        }
    }

    fn children(nodes: &BTreeMap<String, Node>, dir: &str) -> Vec<String> {
        let prefix = if dir == "/" {
            "/".to_string()
        } else {
            format!("{dir}/")
        };
        nodes
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, _)| {
                let rest = &key[prefix.len()..];
                (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
            })
            .collect()
    }

    fn do_read_file(&self, path: &str) -> HostResult<FileContent> {
        let nodes = self.read();
        let resolved = Self::resolve(&nodes, path, true, "open")?;
        match nodes.get(&resolved) {
            Some(Node::File(bytes)) => Ok(FileContent::Bytes(bytes.clone())),
            _ => Err(eisdir("read", path)),
        }
    }

    fn do_readdir(&self, path: &str) -> HostResult<Vec<String>> {
        let nodes = self.read();
        let resolved = Self::resolve(&nodes, path, true, "scandir")?;
        match nodes.get(&resolved) {
            Some(Node::Directory) => Ok(Self::children(&nodes, &resolved)),
            _ => Err(enotdir("scandir", path)),
        }
    }

    fn do_stat(&self, path: &str, follow: bool) -> HostResult<HostStats> {
        let syscall = if follow { "stat" } else { "lstat" };
        let nodes = self.read();
        let resolved = Self::resolve(&nodes, path, follow, syscall)?;
        nodes
            .get(&resolved)
            .map(stats_of)
            .ok_or_else(|| enoent(syscall, path))
    }

    fn do_realpath(&self, path: &str) -> HostResult<String> {
        let nodes = self.read();
        Self::resolve(&nodes, path, true, "realpath")
    }

    fn do_write_file(&self, path: &str, content: Bytes) -> HostResult<()> {
        let mut nodes = self.write();
        let target = match Self::resolve(&nodes, path, true, "open") {
            Ok(existing) => existing,
            Err(_) => {
                let (parent, name) = Self::resolve_parent(&nodes, path, "open")?;
                child_of(&parent, &name)
            }
        };
        if matches!(nodes.get(&target), Some(Node::Directory)) {
            return Err(eisdir("open", path));
        }
        nodes.insert(target, Node::File(content));
        Ok(())
    }

    fn do_unlink(&self, path: &str) -> HostResult<()> {
        let mut nodes = self.write();
        let target = Self::resolve(&nodes, path, false, "unlink")?;
        if matches!(nodes.get(&target), Some(Node::Directory)) {
            return Err(eisdir("unlink", path));
        }
        nodes.remove(&target);
        Ok(())
    }

    fn do_mkdir(&self, path: &str) -> HostResult<()> {
        let mut nodes = self.write();
        let (parent, name) = Self::resolve_parent(&nodes, path, "mkdir")?;
        let target = child_of(&parent, &name);
        if name.is_empty() || nodes.contains_key(&target) {
            return Err(eexist("mkdir", path));
        }
        nodes.insert(target, Node::Directory);
        Ok(())
    }

    fn do_rmdir(&self, path: &str) -> HostResult<()> {
        let mut nodes = self.write();
        let target = Self::resolve(&nodes, path, false, "rmdir")?;
        if target == "/" {
            return Err(HostError::coded(
                "EBUSY",
                "resource busy or locked",
                "rmdir",
                path,
            ));
        }
        match nodes.get(&target) {
            Some(Node::Directory) => {}
            _ => return Err(enotdir("rmdir", path)),
        }
        if !Self::children(&nodes, &target).is_empty() {
            return Err(
                HostError::coded("ENOTEMPTY", "directory not empty", "rmdir", path)
                    .with_errno(-39),
            );
        }
        nodes.remove(&target);
        Ok(())
    }
}

impl InputFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &str, callback: HostCallback<FileContent>) {
        let result = self.do_read_file(path);
        callback(result);
    }

    fn readdir(&self, path: &str, callback: HostCallback<Vec<String>>) {
        let result = self.do_readdir(path);
        callback(result);
    }

    fn stat(&self, path: &str, callback: HostCallback<HostStats>) {
        let result = self.do_stat(path, true);
        callback(result);
    }

    fn lstat(&self, path: &str, callback: HostCallback<HostStats>) {
        let result = self.do_stat(path, false);
        callback(result);
    }

    fn realpath(&self, path: &str, callback: HostCallback<String>) {
        let result = self.do_realpath(path);
        callback(result);
    }
}

impl OutputFileSystem for MemoryFileSystem {
    fn write_file(&self, path: &str, content: Bytes, callback: HostCallback<()>) {
        let result = self.do_write_file(path, content);
        callback(result);
    }

    fn unlink(&self, path: &str, callback: HostCallback<()>) {
        let result = self.do_unlink(path);
        callback(result);
    }

    fn mkdir(&self, path: &str, callback: HostCallback<()>) {
        let result = self.do_mkdir(path);
        callback(result);
    }

    fn rmdir(&self, path: &str, callback: HostCallback<()>) {
        let result = self.do_rmdir(path);
        callback(result);
    }

    fn readdir(&self, path: &str, callback: HostCallback<Vec<String>>) {
        let result = self.do_readdir(path);
        callback(result);
    }

    fn stat(&self, path: &str, callback: HostCallback<HostStats>) {
        let result = self.do_stat(path, true);
        callback(result);
    }
}
