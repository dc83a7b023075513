//! Integration tests for the threadsafe read adapter

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use bridge_host::{build_fs_bindings, FsBridgeConfig, MemoryFileSystem, ThreadsafeReadableFs};
use bridge_traits::{
    host::CALLBACK_DROPPED, BridgeError, DirEntry, FileContent, HostCallback, HostError,
    HostStats, InputFileSystem, Metadata,
};
use mockall::mock;

mock! {
    Host {}

    impl InputFileSystem for Host {
        fn read_file(&self, path: &str, callback: HostCallback<FileContent>);
        fn readdir(&self, path: &str, callback: HostCallback<Vec<String>>);
        fn stat(&self, path: &str, callback: HostCallback<HostStats>);
    }
}

/// Completes every callback on a fresh thread after a short delay.
struct ThreadedHost {
    inner: Arc<MemoryFileSystem>,
}

impl InputFileSystem for ThreadedHost {
    fn read_file(&self, path: &str, callback: HostCallback<FileContent>) {
        let inner = Arc::clone(&self.inner);
        let path = path.to_string();
        thread::spawn(move || inner.read_file(&path, callback));
    }

    fn readdir(&self, path: &str, callback: HostCallback<Vec<String>>) {
        let inner = Arc::clone(&self.inner);
        let path = path.to_string();
        thread::spawn(move || InputFileSystem::readdir(&*inner, &path, callback));
    }

    fn stat(&self, path: &str, callback: HostCallback<HostStats>) {
        let inner = Arc::clone(&self.inner);
        let path = path.to_string();
        let delay = Duration::from_micros((path.len() % 7) as u64 * 150);
        thread::spawn(move || {
            thread::sleep(delay);
            InputFileSystem::stat(&*inner, &path, callback);
        });
    }
}

/// Lists directories but never answers stat lookups.
struct SilentStatHost {
    inner: MemoryFileSystem,
}

impl InputFileSystem for SilentStatHost {
    fn read_file(&self, path: &str, callback: HostCallback<FileContent>) {
        self.inner.read_file(path, callback);
    }

    fn readdir(&self, path: &str, callback: HostCallback<Vec<String>>) {
        InputFileSystem::readdir(&self.inner, path, callback);
    }

    fn stat(&self, _path: &str, callback: HostCallback<HostStats>) {
        drop(callback);
    }
}

/// Fails the stat of one entry at once and parks every other stat callback
/// until the test answers it.
struct HeldStatHost {
    failing: &'static str,
    held: Mutex<Vec<(String, HostCallback<HostStats>)>>,
}

impl HeldStatHost {
    fn new(failing: &'static str) -> Self {
        Self {
            failing,
            held: Mutex::new(Vec::new()),
        }
    }

    fn take_held(&self) -> Vec<(String, HostCallback<HostStats>)> {
        std::mem::take(&mut *self.held.lock().unwrap())
    }
}

impl InputFileSystem for HeldStatHost {
    fn read_file(&self, path: &str, callback: HostCallback<FileContent>) {
        callback(Err(HostError::coded(
            "ENOENT",
            "no such file or directory",
            "open",
            path,
        )));
    }

    fn readdir(&self, _path: &str, callback: HostCallback<Vec<String>>) {
        callback(Ok(vec!["a".into(), "b".into(), "c".into()]));
    }

    fn stat(&self, path: &str, callback: HostCallback<HostStats>) {
        if path == self.failing {
            callback(Err(HostError::coded(
                "EACCES",
                "permission denied",
                "stat",
                path,
            )
            .with_errno(-13)));
        } else {
            self.held.lock().unwrap().push((path.to_string(), callback));
        }
    }
}

fn sample_host() -> Arc<MemoryFileSystem> {
    Arc::new(MemoryFileSystem::from_files([
        ("/a.txt", "1"),
        ("/b/c.txt", "2"),
    ]))
}

fn sorted(mut entries: Vec<DirEntry>) -> Vec<DirEntry> {
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

#[test]
fn test_missing_input_rejected_before_any_operation() {
    let err = ThreadsafeReadableFs::new(None).unwrap_err();
    assert!(matches!(err, BridgeError::Configuration(_)));

    let err = build_fs_bindings(FsBridgeConfig::default()).unwrap_err();
    assert!(err.to_string().contains("InputFileSystem"));
}

#[tokio::test]
async fn test_sample_tree_listing_and_read() {
    let fs = ThreadsafeReadableFs::new(Some(sample_host())).unwrap();

    let entries = sorted(fs.read_dir().call("/".into()).await.unwrap());
    assert_eq!(
        entries,
        vec![
            DirEntry {
                path: "/a.txt".into(),
                metadata: Metadata {
                    is_dir: false,
                    is_file: true,
                    is_symlink: false,
                },
            },
            DirEntry {
                path: "/b".into(),
                metadata: Metadata {
                    is_dir: true,
                    is_file: false,
                    is_symlink: false,
                },
            },
        ]
    );

    let content = fs.read_file().call("/a.txt".into()).await.unwrap();
    assert_eq!(content.as_bytes(), b"1");
}

#[tokio::test]
async fn test_read_dir_entry_count_matches_host() {
    let host = MemoryFileSystem::new();
    for i in 0..25 {
        host.add_file(&format!("/pkg/file{i}.js"), "x");
    }
    for i in 0..5 {
        host.add_dir(&format!("/pkg/dir{i}"));
    }
    let fs = ThreadsafeReadableFs::new(Some(Arc::new(host))).unwrap();

    let entries = fs.read_dir().call("/pkg".into()).await.unwrap();
    assert_eq!(entries.len(), 30);
    assert_eq!(entries.iter().filter(|e| e.metadata.is_file).count(), 25);
    assert_eq!(entries.iter().filter(|e| e.metadata.is_dir).count(), 5);
}

#[tokio::test]
async fn test_read_dir_empty_directory() {
    let host = MemoryFileSystem::new();
    host.add_dir("/empty");
    let fs = ThreadsafeReadableFs::new(Some(Arc::new(host))).unwrap();

    let entries = fs.read_dir().call("/empty".into()).await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_read_dir_surfaces_failing_lookup_error() {
    let expected = HostError::coded("EACCES", "permission denied", "stat", "/src/b.js")
        .with_errno(-13);
    let sent = expected.clone();

    let mut host = MockHost::new();
    host.expect_readdir().times(1).returning(|_, cb| {
        cb(Ok(vec!["a.js".into(), "b.js".into(), "c.js".into()]))
    });
    host.expect_stat().times(3).returning(move |path: &str, cb| {
        if path == "/src/b.js" {
            cb(Err(sent.clone()));
        } else {
            cb(Ok(HostStats::file(10)));
        }
    });

    let fs = ThreadsafeReadableFs::new(Some(Arc::new(host))).unwrap();
    let err = fs.read_dir().call("/src".into()).await.unwrap_err();
    assert_eq!(err, expected);
}

#[tokio::test]
async fn test_read_dir_fails_while_sibling_lookups_pending() {
    let host = Arc::new(HeldStatHost::new("/d/b"));
    let fs = ThreadsafeReadableFs::new(Some(host.clone())).unwrap();

    let err = tokio::time::timeout(Duration::from_secs(5), fs.read_dir().call("/d".into()))
        .await
        .expect("read_dir should settle on the first failure")
        .unwrap_err();
    assert_eq!(
        err,
        HostError::coded("EACCES", "permission denied", "stat", "/d/b").with_errno(-13)
    );

    let held = host.take_held();
    let mut paths: Vec<_> = held.iter().map(|(path, _)| path.clone()).collect();
    paths.sort();
    assert_eq!(paths, vec!["/d/a", "/d/c"]);

    // Late answers land on a settled join and are discarded.
    let late: Vec<_> = held
        .into_iter()
        .map(|(_, callback)| thread::spawn(move || callback(Ok(HostStats::file(1)))))
        .collect();
    for handle in late {
        handle.join().unwrap();
    }
}

#[tokio::test]
async fn test_listing_failure_skips_lookups() {
    let mut host = MockHost::new();
    host.expect_readdir().times(1).returning(|path: &str, cb| {
        cb(Err(HostError::coded(
            "ENOENT",
            "no such file or directory",
            "scandir",
            path,
        )))
    });
    host.expect_stat().never();

    let fs = ThreadsafeReadableFs::new(Some(Arc::new(host))).unwrap();
    let err = fs.read_dir().call("/gone".into()).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.path.as_deref(), Some("/gone"));
}

#[tokio::test]
async fn test_repeated_access_returns_same_operation() {
    let fs = ThreadsafeReadableFs::new(Some(sample_host())).unwrap();

    let first = fs.read_dir().clone();
    let second = fs.read_dir().clone();
    assert!(first.ptr_eq(&second));
    assert!(fs.stat().ptr_eq(fs.stat()));

    let a = sorted(first.call("/".into()).await.unwrap());
    let b = sorted(second.call("/".into()).await.unwrap());
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_lstat_and_realpath() {
    let host = sample_host();
    host.add_symlink("/b", "/alias");
    let fs = ThreadsafeReadableFs::new(Some(host)).unwrap();

    let meta = fs.lstat().call("/alias".into()).await.unwrap();
    assert!(meta.is_symlink);
    let meta = fs.stat().call("/alias".into()).await.unwrap();
    assert!(meta.is_dir);

    let real = fs.realpath().call("/alias/c.txt".into()).await.unwrap();
    assert_eq!(real, "/b/c.txt");
}

#[tokio::test]
async fn test_optional_lookups_unsupported_by_host() {
    let host = MockHost::new();
    let fs = ThreadsafeReadableFs::new(Some(Arc::new(host))).unwrap();

    let err = fs.realpath().call("/x".into()).await.unwrap_err();
    assert_eq!(err.code.as_deref(), Some("ENOSYS"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_read_dir_with_cross_thread_completions() {
    let inner = MemoryFileSystem::new();
    for i in 0..64 {
        inner.add_file(&format!("/lib/m{i}.js"), format!("module {i}"));
    }
    let host = ThreadedHost {
        inner: Arc::new(inner),
    };
    let fs = Arc::new(ThreadsafeReadableFs::new(Some(Arc::new(host))).unwrap());

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let fs = Arc::clone(&fs);
            tokio::spawn(async move { fs.read_dir().call("/lib".into()).await })
        })
        .collect();

    for task in tasks {
        let entries = task.await.unwrap().unwrap();
        assert_eq!(entries.len(), 64);
        assert!(entries.iter().all(|e| e.metadata.is_file));
    }

    let content = fs.read_file().call("/lib/m3.js".into()).await.unwrap();
    assert_eq!(content.as_bytes(), b"module 3");
}

#[tokio::test]
async fn test_dropped_stat_callbacks_do_not_hang() {
    let host = SilentStatHost {
        inner: MemoryFileSystem::from_files([("/x/1.js", "1"), ("/x/2.js", "2")]),
    };
    let fs = ThreadsafeReadableFs::new(Some(Arc::new(host))).unwrap();

    let err = tokio::time::timeout(Duration::from_secs(5), fs.read_dir().call("/x".into()))
        .await
        .expect("read_dir should settle")
        .unwrap_err();
    assert_eq!(err.code.as_deref(), Some(CALLBACK_DROPPED));

    let err = fs.stat().call("/x/1.js".into()).await.unwrap_err();
    assert_eq!(err.code.as_deref(), Some(CALLBACK_DROPPED));
}

#[tokio::test]
async fn test_read_dir_result_wire_shape() {
    let fs = ThreadsafeReadableFs::new(Some(sample_host())).unwrap();
    let entries = sorted(fs.read_dir().call("/b".into()).await.unwrap());

    let json = serde_json::to_value(&entries).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {
                "path": "/b/c.txt",
                "metadata": { "isDir": false, "isFile": true, "isSymlink": false }
            }
        ])
    );
}
