use super::*;
use metadata::FileKind;
use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

fn collect_relative_paths(walker: Walker) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for entry in walker {
        let entry = entry.expect("walker entry");
        if entry.is_root() {
            continue;
        }
        paths.push(entry.relative_path().to_path_buf());
    }
    paths
}

fn describe(visit: &Visit) -> String {
    let (tag, node) = match visit {
        Visit::EnterDirectory(node) => ("enter", node),
        Visit::LeaveDirectory(node) => ("leave", node),
        Visit::File(node) => ("file", node),
        Visit::Symlink(node) => ("symlink", node),
        Visit::Whiteout(node) => ("whiteout", node),
    };
    format!("{tag} {}", node.relative_path().display())
}

fn collect_visits(walker: DualWalker) -> Vec<String> {
    walker
        .map(|visit| describe(&visit.expect("visit")))
        .collect()
}

fn mkfifo(path: &Path) {
    rustix::fs::mknodat(
        rustix::fs::CWD,
        path,
        rustix::fs::FileType::Fifo,
        rustix::fs::Mode::from_raw_mode(0o644),
        0,
    )
    .expect("mkfifo");
}

// ============================================================================
// Single tree
// ============================================================================

#[test]
fn walk_errors_when_root_missing() {
    let builder = WalkBuilder::new("/nonexistent/path/for/walker");
    let error = match builder.build() {
        Ok(_) => panic!("missing root should fail"),
        Err(error) => error,
    };
    assert!(matches!(error.kind(), WalkErrorKind::RootMetadata { .. }));
    assert_eq!(error.path(), Path::new("/nonexistent/path/for/walker"));
}

#[test]
fn walk_directory_yields_deterministic_pre_order() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("root");
    fs::create_dir(&root).expect("create root");
    fs::create_dir(root.join("b")).expect("dir b");
    fs::create_dir(root.join("a")).expect("dir a");
    fs::write(root.join("a/inner.txt"), b"data").expect("write inner");
    fs::write(root.join("c.txt"), b"data").expect("write file");

    let walker = WalkBuilder::new(&root).build().expect("build walker");
    assert_eq!(
        collect_relative_paths(walker),
        vec![
            PathBuf::from("a"),
            PathBuf::from("a/inner.txt"),
            PathBuf::from("b"),
            PathBuf::from("c.txt"),
        ]
    );
}

#[test]
fn walk_skip_current_dir_prunes_children() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("root");
    fs::create_dir_all(root.join("a/deep")).expect("create tree");
    fs::write(root.join("a/deep/file"), b"x").expect("write");
    fs::write(root.join("b"), b"x").expect("write");

    let mut walker = WalkBuilder::new(&root).build().expect("build walker");
    let mut seen = Vec::new();
    while let Some(entry) = walker.next() {
        let entry = entry.expect("entry");
        if entry.depth() == 1 && entry.kind() == FileKind::Directory {
            walker.skip_current_dir();
        }
        seen.push(entry.relative_path().to_path_buf());
    }
    assert_eq!(
        seen,
        vec![PathBuf::new(), PathBuf::from("a"), PathBuf::from("b")]
    );
}

#[test]
fn walk_does_not_follow_symlinks() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("root");
    let target = temp.path().join("target");
    fs::create_dir(&root).expect("create root");
    fs::create_dir(&target).expect("create target");
    fs::write(target.join("inner.txt"), b"data").expect("write inner");
    symlink(&target, root.join("link")).expect("create symlink");

    let walker = WalkBuilder::new(&root).build().expect("build walker");
    let entries: Vec<_> = walker.map(|entry| entry.expect("entry")).collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].kind(), FileKind::Symlink);
    assert_eq!(entries[1].relative_path(), Path::new("link"));
}

// ============================================================================
// Dual tree
// ============================================================================

#[test]
fn dual_walk_yields_enter_and_leave_around_children() {
    let temp = tempfile::tempdir().expect("tempdir");
    let upper = temp.path().join("upper");
    let lower = temp.path().join("lower");
    fs::create_dir_all(upper.join("a")).expect("create upper");
    fs::create_dir(&lower).expect("create lower");
    fs::write(upper.join("a/f"), b"x").expect("write");
    fs::write(upper.join("b"), b"x").expect("write");
    symlink("b", upper.join("c")).expect("symlink");

    let walker = DualWalkBuilder::new(&upper, &lower)
        .build()
        .expect("build walker");
    assert_eq!(
        collect_visits(walker),
        vec![
            "enter ",
            "enter a",
            "file a/f",
            "leave a",
            "file b",
            "symlink c",
            "leave ",
        ]
    );
}

#[test]
fn dual_walk_root_observes_peer_root() {
    let temp = tempfile::tempdir().expect("tempdir");
    let upper = temp.path().join("upper");
    let lower = temp.path().join("lower");
    fs::create_dir(&upper).expect("create upper");
    fs::create_dir(&lower).expect("create lower");

    let mut walker = DualWalkBuilder::new(&upper, &lower)
        .build()
        .expect("build walker");
    let visit = walker.next().expect("root").expect("root ok");
    let node = visit.node();
    assert!(node.is_root());
    assert_eq!(node.primary_path(), upper);
    assert_eq!(node.secondary_path(), lower);
    assert_eq!(node.secondary_kind(), Some(FileKind::Directory));
    assert!(node.file_name().is_none());
}

#[test]
fn dual_walk_reports_peer_presence_and_kind() {
    let temp = tempfile::tempdir().expect("tempdir");
    let upper = temp.path().join("upper");
    let lower = temp.path().join("lower");
    fs::create_dir(&upper).expect("create upper");
    fs::create_dir(&lower).expect("create lower");
    fs::write(upper.join("both"), b"x").expect("write");
    fs::write(lower.join("both"), b"y").expect("write");
    fs::write(upper.join("only"), b"x").expect("write");
    fs::write(upper.join("swapped"), b"x").expect("write");
    fs::create_dir(lower.join("swapped")).expect("mkdir");

    let walker = DualWalkBuilder::new(&upper, &lower)
        .build()
        .expect("build walker");
    let peers: Vec<_> = walker
        .map(|visit| visit.expect("visit"))
        .filter_map(|visit| match visit {
            Visit::File(node) => Some((
                node.relative_path().to_path_buf(),
                node.secondary_kind(),
            )),
            _ => None,
        })
        .collect();
    assert_eq!(
        peers,
        vec![
            (PathBuf::from("both"), Some(FileKind::Regular)),
            (PathBuf::from("only"), None),
            (PathBuf::from("swapped"), Some(FileKind::Directory)),
        ]
    );
}

#[test]
fn dual_walk_treats_non_directory_ancestor_as_absent() {
    let temp = tempfile::tempdir().expect("tempdir");
    let upper = temp.path().join("upper");
    let lower = temp.path().join("lower");
    fs::create_dir_all(upper.join("d")).expect("create upper");
    fs::create_dir(&lower).expect("create lower");
    fs::write(upper.join("d/child"), b"x").expect("write");
    fs::write(lower.join("d"), b"file in lower").expect("write");

    let walker = DualWalkBuilder::new(&upper, &lower)
        .build()
        .expect("build walker");
    let child = walker
        .map(|visit| visit.expect("visit"))
        .find_map(|visit| match visit {
            Visit::File(node) => Some(node),
            _ => None,
        })
        .expect("child visited");
    assert_eq!(child.relative_path(), Path::new("d/child"));
    assert!(child.secondary().is_none());
}

#[test]
fn dual_walk_never_resolves_peers_through_a_symlinked_ancestor() {
    let temp = tempfile::tempdir().expect("tempdir");
    let upper = temp.path().join("upper");
    let lower = temp.path().join("lower");
    let outside = temp.path().join("outside");
    fs::create_dir_all(upper.join("d/sub")).expect("create upper");
    fs::create_dir_all(outside.join("sub")).expect("create outside");
    fs::create_dir(&lower).expect("create lower");
    fs::write(upper.join("d/f"), b"same").expect("write");
    fs::write(upper.join("d/sub/g"), b"same").expect("write");
    fs::write(outside.join("f"), b"same").expect("write");
    fs::write(outside.join("sub/g"), b"same").expect("write");
    symlink("../outside", lower.join("d")).expect("symlink");

    let walker = DualWalkBuilder::new(&upper, &lower)
        .build()
        .expect("build walker");
    let mut peers = Vec::new();
    for visit in walker {
        let visit = visit.expect("visit");
        let node = visit.node();
        peers.push((node.relative_path().to_path_buf(), node.secondary_kind()));
    }

    assert!(peers.contains(&(PathBuf::from("d"), Some(FileKind::Symlink))));
    for (path, kind) in &peers {
        if path.starts_with("d") && path != Path::new("d") {
            assert_eq!(*kind, None, "{} must have no peer", path.display());
        }
    }
    assert!(peers.iter().any(|(path, _)| path == Path::new("d/sub/g")));
}

#[test]
fn dual_walk_skip_suppresses_children_and_leave() {
    let temp = tempfile::tempdir().expect("tempdir");
    let upper = temp.path().join("upper");
    let lower = temp.path().join("lower");
    fs::create_dir_all(upper.join("skip/inner")).expect("create upper");
    fs::create_dir(&lower).expect("create lower");
    fs::write(upper.join("skip/inner/f"), b"x").expect("write");
    fs::write(upper.join("z"), b"x").expect("write");

    let mut walker = DualWalkBuilder::new(&upper, &lower)
        .build()
        .expect("build walker");
    let mut seen = Vec::new();
    while let Some(visit) = walker.next() {
        let visit = visit.expect("visit");
        if let Visit::EnterDirectory(node) = &visit {
            if node.relative_path() == Path::new("skip") {
                walker.skip_current_dir();
            }
        }
        seen.push(describe(&visit));
    }
    assert_eq!(seen, vec!["enter ", "enter skip", "file z", "leave "]);
}

#[test]
fn dual_walk_fails_on_fifo_and_stops() {
    let temp = tempfile::tempdir().expect("tempdir");
    let upper = temp.path().join("upper");
    let lower = temp.path().join("lower");
    fs::create_dir(&upper).expect("create upper");
    fs::create_dir(&lower).expect("create lower");
    fs::write(upper.join("a"), b"x").expect("write");
    mkfifo(&upper.join("pipe"));
    fs::write(upper.join("z"), b"x").expect("write");

    let mut walker = DualWalkBuilder::new(&upper, &lower)
        .build()
        .expect("build walker");
    assert!(matches!(walker.next(), Some(Ok(Visit::EnterDirectory(_)))));
    assert!(matches!(walker.next(), Some(Ok(Visit::File(_)))));
    let error = match walker.next() {
        Some(Err(error)) => error,
        other => panic!("expected unsupported node error, got {other:?}"),
    };
    assert!(error.kind().is_unsupported_node());
    assert_eq!(error.path(), upper.join("pipe"));
    assert!(walker.next().is_none());
}

#[test]
fn dual_walk_yields_whiteouts() {
    let temp = tempfile::tempdir().expect("tempdir");
    let upper = temp.path().join("upper");
    let lower = temp.path().join("lower");
    fs::create_dir(&upper).expect("create upper");
    fs::create_dir(&lower).expect("create lower");
    let created = rustix::fs::mknodat(
        rustix::fs::CWD,
        &upper.join("gone"),
        rustix::fs::FileType::CharacterDevice,
        rustix::fs::Mode::from_raw_mode(0o000),
        rustix::fs::makedev(0, 0),
    );
    if created.is_err() {
        eprintln!("mknod not permitted, skipping test");
        return;
    }

    let walker = DualWalkBuilder::new(&upper, &lower)
        .build()
        .expect("build walker");
    assert_eq!(
        collect_visits(walker),
        vec!["enter ", "whiteout gone", "leave "]
    );
}

// ============================================================================
// Visitor driving
// ============================================================================

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
    skip: Option<PathBuf>,
    fail_on: Option<PathBuf>,
}

impl Visitor for Recorder {
    type Error = WalkError;

    fn on_enter_dir(&mut self, node: &NodeObservation) -> Result<Flow, WalkError> {
        self.events
            .push(format!("enter {}", node.relative_path().display()));
        if self.skip.as_deref() == Some(node.relative_path()) {
            return Ok(Flow::SkipSubtree);
        }
        Ok(Flow::Continue)
    }

    fn on_leave_dir(&mut self, node: &NodeObservation) -> Result<(), WalkError> {
        self.events
            .push(format!("leave {}", node.relative_path().display()));
        Ok(())
    }

    fn on_file(&mut self, node: &NodeObservation) -> Result<(), WalkError> {
        if self.fail_on.as_deref() == Some(node.relative_path()) {
            return Err(WalkError::unsupported_node(node.primary_path().to_path_buf()));
        }
        self.events
            .push(format!("file {}", node.relative_path().display()));
        Ok(())
    }
}

struct Silent;

impl Visitor for Silent {
    type Error = WalkError;
}

#[test]
fn drive_dispatches_and_honours_skip() {
    let temp = tempfile::tempdir().expect("tempdir");
    let upper = temp.path().join("upper");
    let lower = temp.path().join("lower");
    fs::create_dir_all(upper.join("a")).expect("create upper");
    fs::create_dir_all(upper.join("b")).expect("create upper");
    fs::create_dir(&lower).expect("create lower");
    fs::write(upper.join("a/f"), b"x").expect("write");
    fs::write(upper.join("b/g"), b"x").expect("write");

    let mut recorder = Recorder {
        skip: Some(PathBuf::from("a")),
        ..Recorder::default()
    };
    let walker = DualWalkBuilder::new(&upper, &lower)
        .build()
        .expect("build walker");
    drive(walker, &mut recorder).expect("drive");
    assert_eq!(
        recorder.events,
        vec!["enter ", "enter a", "enter b", "file b/g", "leave b", "leave "]
    );
}

#[test]
fn drive_stops_at_first_handler_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let upper = temp.path().join("upper");
    let lower = temp.path().join("lower");
    fs::create_dir(&upper).expect("create upper");
    fs::create_dir(&lower).expect("create lower");
    for name in ["a", "b", "c"] {
        fs::write(upper.join(name), b"x").expect("write");
    }

    let mut recorder = Recorder {
        fail_on: Some(PathBuf::from("b")),
        ..Recorder::default()
    };
    let walker = DualWalkBuilder::new(&upper, &lower)
        .build()
        .expect("build walker");
    let error = drive(walker, &mut recorder).expect_err("handler error propagates");
    assert_eq!(error.path(), upper.join("b"));
    assert_eq!(recorder.events, vec!["enter ", "file a"]);
}

#[test]
fn drive_with_default_handlers_still_reports_walk_errors() {
    let temp = tempfile::tempdir().expect("tempdir");
    let upper = temp.path().join("upper");
    let lower = temp.path().join("lower");
    fs::create_dir_all(upper.join("nested")).expect("create upper");
    fs::create_dir(&lower).expect("create lower");
    mkfifo(&upper.join("nested/pipe"));

    let walker = DualWalkBuilder::new(&upper, &lower)
        .build()
        .expect("build walker");
    let error = drive(walker, &mut Silent).expect_err("fifo aborts the walk");
    assert!(error.kind().is_unsupported_node());
}
