//! Integration tests for the organization engine.
//!
//! These tests verify end-to-end behavior including:
//! - The destination layout for every mode
//! - Duplicate routing and rerun idempotence
//! - Move safety and copy verification
//! - Collision renames and cancellation

use assert_fs::prelude::*;
use assert_fs::TempDir;
use chrono::{NaiveDate, NaiveDateTime};
use media_organizer::core::hasher::ContentFingerprinter;
use media_organizer::core::metadata::StaticMetadataProvider;
use media_organizer::core::organize::{
    OperationLabel, OperationMode, OrganizationEngine, OrganizationMode, OrganizeRequest, RunState,
};
use media_organizer::events::{Event, EventChannel, OrganizeEvent};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

fn march_15() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

fn engine() -> OrganizationEngine {
    OrganizationEngine::builder()
        .provider(Arc::new(StaticMetadataProvider::new(march_15(), "Canon")))
        .build()
}

fn request(src: &Path, dest: &Path) -> OrganizeRequest {
    OrganizeRequest::new(vec![src.to_path_buf()], vec![dest.to_path_buf()])
}

/// Every regular file below `root`, relative to it
fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

#[test]
fn photo_lands_in_each_mode_layout() {
    let cases = [
        (OrganizationMode::ByDate, "Picture/2024/2024-03-15/photo.jpg"),
        (OrganizationMode::ByDevice, "Picture/Canon/photo.jpg"),
        (OrganizationMode::ByDateAndDevice, "Picture/2024-03-15/Canon/photo.jpg"),
        (OrganizationMode::ByExtension, "JPG/photo.jpg"),
    ];

    for (mode, expected) in cases {
        let src = TempDir::new().unwrap();
        src.child("photo.jpg").write_binary(b"canon pixels").unwrap();
        let dest = TempDir::new().unwrap();

        let report = engine().run(&request(src.path(), dest.path()).mode(mode)).unwrap();

        assert_eq!(report.state, RunState::Completed);
        dest.child(expected).assert(predicate::path::is_file());
        dest.child(expected).assert("canon pixels");
        src.child("photo.jpg").assert(predicate::path::exists());
    }
}

#[test]
fn extension_mode_takes_every_file() {
    let src = TempDir::new().unwrap();
    src.child("clip.MOV").write_binary(b"movie").unwrap();
    src.child("docs/notes.txt").write_str("hello").unwrap();
    src.child("docs/Makefile").write_str("all:").unwrap();
    src.child(".hidden.txt").write_str("secret").unwrap();
    let dest = TempDir::new().unwrap();

    let report = engine()
        .run(&request(src.path(), dest.path()).mode(OrganizationMode::ByExtension))
        .unwrap();

    assert_eq!(report.statistics.total, 3);
    assert_eq!(report.statistics.videos, 1);
    assert_eq!(report.statistics.other, 2);
    assert_eq!(
        files_under(dest.path()),
        vec![
            PathBuf::from("MOV/clip.MOV"),
            PathBuf::from("NO_EXTENSION/Makefile"),
            PathBuf::from("TXT/notes.txt"),
        ]
    );
}

#[test]
fn second_copy_is_filed_as_duplicate() {
    let src = TempDir::new().unwrap();
    src.child("a.jpg").write_binary(b"same bytes").unwrap();
    let dest = TempDir::new().unwrap();

    let first = engine().run(&request(src.path(), dest.path())).unwrap();
    assert_eq!(first.statistics.duplicates, 0);

    let second = engine().run(&request(src.path(), dest.path())).unwrap();
    assert_eq!(second.statistics.duplicates, 1);
    assert_eq!(second.statistics.processed, 1);
    assert!(second.outcomes[0].is_duplicate);

    dest.child("Picture/2024/2024-03-15/a.jpg").assert("same bytes");
    dest.child("Picture/duplicate/2024/2024-03-15/a.jpg").assert("same bytes");
    dest.child("Picture/2024/2024-03-15/a_1.jpg").assert(predicate::path::missing());
}

#[test]
fn rerun_with_ignore_duplicates_writes_nothing() {
    let src = TempDir::new().unwrap();
    src.child("a.jpg").write_binary(b"photo a").unwrap();
    src.child("b.jpg").write_binary(b"photo b").unwrap();
    src.child("sub/c.mp4").write_binary(b"video c").unwrap();
    let dest = TempDir::new().unwrap();

    let req = request(src.path(), dest.path()).ignore_duplicates(true);
    engine().run(&req).unwrap();
    let after_first = files_under(dest.path());
    assert_eq!(after_first.len(), 3);

    let second = engine().run(&req).unwrap();
    assert_eq!(second.statistics.duplicates, 3);
    assert_eq!(second.statistics.skipped, 3);
    assert_eq!(second.statistics.processed, 0);
    assert!(second
        .outcomes
        .iter()
        .all(|o| o.operation == OperationLabel::Skipped && o.target.is_none()));
    assert_eq!(files_under(dest.path()), after_first);
}

#[test]
fn same_name_different_content_gets_suffix() {
    let src = TempDir::new().unwrap();
    src.child("card1/clip.mp4").write_binary(b"first clip").unwrap();
    src.child("card2/clip.mp4").write_binary(b"second clip, longer").unwrap();
    let dest = TempDir::new().unwrap();

    let report = engine().run(&request(src.path(), dest.path())).unwrap();

    assert_eq!(report.statistics.processed, 2);
    assert_eq!(report.statistics.duplicates, 0);
    let dir = dest.child("Video/2024/2024-03-15");
    dir.child("clip.mp4").assert(predicate::path::is_file());
    dir.child("clip_1.mp4").assert(predicate::path::is_file());

    let contents: Vec<Vec<u8>> = ["clip.mp4", "clip_1.mp4"]
        .iter()
        .map(|name| fs::read(dir.path().join(name)).unwrap())
        .collect();
    assert_ne!(contents[0], contents[1]);
}

#[test]
fn renamed_collision_is_recognized_on_rerun() {
    let src = TempDir::new().unwrap();
    src.child("card1/clip.mp4").write_binary(b"first clip").unwrap();
    src.child("card2/clip.mp4").write_binary(b"second clip, longer").unwrap();
    let dest = TempDir::new().unwrap();

    let req = request(src.path(), dest.path()).ignore_duplicates(true);
    engine().run(&req).unwrap();
    let second = engine().run(&req).unwrap();

    assert_eq!(second.statistics.skipped, 2);
    dest.child("Video/2024/2024-03-15/clip_2.mp4")
        .assert(predicate::path::missing());
}

#[test]
fn many_files_with_one_name_never_overwrite() {
    let src = TempDir::new().unwrap();
    for i in 0..6 {
        src.child(format!("dir{}/IMG_0001.JPG", i))
            .write_binary(format!("content {}", i).as_bytes())
            .unwrap();
    }
    let dest = TempDir::new().unwrap();

    let report = engine().run(&request(src.path(), dest.path())).unwrap();
    assert_eq!(report.statistics.processed, 6);

    let files = files_under(dest.path());
    assert_eq!(files.len(), 6);
    let mut contents: Vec<Vec<u8>> = files
        .iter()
        .map(|f| fs::read(dest.path().join(f)).unwrap())
        .collect();
    contents.sort();
    contents.dedup();
    assert_eq!(contents.len(), 6);
}

#[test]
fn move_removes_sources_and_keeps_content() {
    let src = TempDir::new().unwrap();
    src.child("a.jpg").write_binary(b"photo a").unwrap();
    src.child("nested/b.mov").write_binary(b"video b").unwrap();
    let dest = TempDir::new().unwrap();

    for verify in [false, true] {
        let report = engine()
            .run(
                &request(src.path(), dest.path())
                    .operation(OperationMode::Move)
                    .verify(verify),
            )
            .unwrap();

        if !verify {
            assert_eq!(report.statistics.processed, 2);
            src.child("a.jpg").assert(predicate::path::missing());
            src.child("nested/b.mov").assert(predicate::path::missing());
            dest.child("Picture/2024/2024-03-15/a.jpg").assert("photo a");
            dest.child("Video/2024/2024-03-15/b.mov").assert("video b");

            // Put fresh files back for the verified pass
            src.child("a.jpg").write_binary(b"photo a2").unwrap();
            src.child("nested/b.mov").write_binary(b"video b2").unwrap();
        } else {
            assert_eq!(report.statistics.processed, 2);
            src.child("a.jpg").assert(predicate::path::missing());
            dest.child("Picture/2024/2024-03-15/a_1.jpg").assert("photo a2");
            dest.child("Video/2024/2024-03-15/b_1.mov").assert("video b2");
        }
    }
}

#[test]
fn verified_copies_match_their_sources() {
    let src = TempDir::new().unwrap();
    let payload: Vec<u8> = (0..200_000u32).map(|i| (i * 31 % 256) as u8).collect();
    src.child("big.dng").write_binary(&payload).unwrap();
    src.child("small.jpg").write_binary(b"tiny").unwrap();
    let dest = TempDir::new().unwrap();

    let report = engine()
        .run(&request(src.path(), dest.path()).verify(true))
        .unwrap();

    let hasher = ContentFingerprinter::new();
    for outcome in report.outcomes.iter().filter(|o| o.success) {
        let target = outcome.target.as_ref().unwrap();
        assert_eq!(
            hasher.fingerprint(&outcome.source).unwrap(),
            hasher.fingerprint(target).unwrap()
        );
    }
    assert_eq!(report.statistics.processed, 2);
}

#[test]
fn copy_to_several_destinations() {
    let src = TempDir::new().unwrap();
    src.child("a.jpg").write_binary(b"photo").unwrap();
    let d1 = TempDir::new().unwrap();
    let d2 = TempDir::new().unwrap();

    let report = engine()
        .run(&OrganizeRequest::new(
            vec![src.path().to_path_buf()],
            vec![d1.path().to_path_buf(), d2.path().to_path_buf()],
        ))
        .unwrap();

    assert_eq!(report.statistics.total, 2);
    assert_eq!(report.statistics.processed, 2);
    d1.child("Picture/2024/2024-03-15/a.jpg").assert("photo");
    d2.child("Picture/2024/2024-03-15/a.jpg").assert("photo");
}

#[test]
fn dry_run_previews_final_layout() {
    let src = TempDir::new().unwrap();
    src.child("a.jpg").write_binary(b"same").unwrap();
    let dest = TempDir::new().unwrap();
    dest.child("Picture/2024/2024-03-15/a.jpg").write_binary(b"same").unwrap();

    let report = engine()
        .run(&request(src.path(), dest.path()).dry_run(true))
        .unwrap();

    let outcome = &report.outcomes[0];
    assert!(outcome.is_duplicate);
    assert_eq!(outcome.operation, OperationLabel::WouldCopy);
    assert_eq!(
        outcome.target.as_deref(),
        Some(dest.path().join("Picture/duplicate/2024/2024-03-15/a.jpg").as_path())
    );
    dest.child("Picture/duplicate").assert(predicate::path::missing());
}

#[test]
fn empty_directories_are_cleaned_after_run() {
    let src = TempDir::new().unwrap();
    src.child("a.jpg").write_binary(b"photo").unwrap();
    let dest = TempDir::new().unwrap();
    dest.child("old/empty/dir").create_dir_all().unwrap();

    let report = engine().run(&request(src.path(), dest.path())).unwrap();

    assert_eq!(report.directories_removed, 3);
    dest.child("old").assert(predicate::path::missing());
    dest.child("Picture/2024/2024-03-15/a.jpg").assert(predicate::path::exists());
}

#[test]
fn failed_files_do_not_stop_the_run() {
    let src = TempDir::new().unwrap();
    src.child("a.jpg").write_binary(b"photo a").unwrap();
    src.child("b.jpg").write_binary(b"photo b").unwrap();
    let dest = TempDir::new().unwrap();
    // A file where the date directory should be blocks one target tree
    dest.child("Picture/2024").write_str("not a directory").unwrap();
    src.child("c.mov").write_binary(b"video c").unwrap();

    let report = engine().run(&request(src.path(), dest.path())).unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.statistics.errors, 2);
    assert_eq!(report.statistics.processed, 1);
    assert!(src.path().join("a.jpg").exists());
    dest.child("Video/2024/2024-03-15/c.mov").assert("video c");
}

#[test]
fn cancellation_stops_before_next_file() {
    let src = TempDir::new().unwrap();
    for i in 0..20 {
        src.child(format!("IMG_{:04}.JPG", i))
            .write_binary(format!("photo {}", i).as_bytes())
            .unwrap();
    }
    let dest = TempDir::new().unwrap();

    let engine = OrganizationEngine::builder()
        .provider(Arc::new(StaticMetadataProvider::new(march_15(), "Canon")))
        .workers(1)
        .build();
    let token = engine.cancellation_token();

    let (sender, receiver) = EventChannel::bounded(1);
    let watcher = std::thread::spawn(move || {
        for event in receiver.iter() {
            if let Event::Organize(OrganizeEvent::FileCompleted(_)) = event {
                token.cancel();
            }
        }
    });

    let report = engine
        .run_with_events(&request(src.path(), dest.path()), &sender)
        .unwrap();
    drop(sender);
    watcher.join().unwrap();

    assert_eq!(report.state, RunState::Cancelled);
    assert!(report.statistics.processed >= 1);
    assert!(report.statistics.processed < 20);
    assert_eq!(
        files_under(dest.path()).len(),
        report.statistics.processed
    );
    assert_eq!(report.statistics.errors, 0);
}
