use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use zinject_archive::{Error, UnpackOptions, unpack_archive_over};

enum Item<'a> {
    Dir(&'a str),
    File(&'a str, &'a [u8], u32),
    Link(&'a str, &'a str),
    HardLink(&'a str, &'a str),
}

fn tar_gz(items: &[Item<'_>]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for item in items {
        let mut header = tar::Header::new_gnu();
        match item {
            Item::Dir(path) => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_mode(0o755);
                header.set_size(0);
                builder.append_data(&mut header, path, &[][..]).unwrap();
            }
            Item::File(path, content, mode) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_mode(*mode);
                header.set_size(content.len() as u64);
                builder.append_data(&mut header, path, *content).unwrap();
            }
            Item::Link(path, target) => {
                header.set_entry_type(tar::EntryType::Symlink);
                header.set_size(0);
                builder.append_link(&mut header, path, target).unwrap();
            }
            Item::HardLink(path, target) => {
                header.set_entry_type(tar::EntryType::Link);
                header.set_size(0);
                builder.append_link(&mut header, path, target).unwrap();
            }
        }
    }
    builder.into_inner().unwrap().finish().unwrap()
}

fn zip(items: &[Item<'_>]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for item in items {
        match item {
            Item::Dir(path) => {
                let options = zip::write::SimpleFileOptions::default();
                writer.add_directory(*path, options).unwrap();
            }
            Item::File(path, content, mode) => {
                let options = zip::write::SimpleFileOptions::default().unix_permissions(*mode);
                writer.start_file(*path, options).unwrap();
                writer.write_all(content).unwrap();
            }
            Item::Link(path, target) => {
                let options = zip::write::SimpleFileOptions::default();
                writer.add_symlink(*path, *target, options).unwrap();
            }
            Item::HardLink(..) => panic!("zip archives have no hard links"),
        }
    }
    writer.finish().unwrap().into_inner()
}

fn unpack(url: &str, data: Vec<u8>, dest: &Path, options: &UnpackOptions) -> zinject_archive::Result<()> {
    unpack_archive_over(url, Cursor::new(data), dest, options).map(|_| ())
}

#[test]
fn unpacks_tar_gz_guessed_from_url() {
    let dir = tempfile::tempdir().unwrap();
    let data = tar_gz(&[
        Item::Dir("bin"),
        Item::File("bin/run", b"#!/bin/sh\n", 0o755),
        Item::File("README", b"hello", 0o644),
    ]);

    let report = unpack_archive_over(
        "http://example.com/app-1.0.tar.gz",
        Cursor::new(data),
        dir.path(),
        &UnpackOptions::default(),
    )
    .unwrap();

    assert_eq!(report.entry_count, 3);
    assert_eq!(fs::read(dir.path().join("README")).unwrap(), b"hello");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(dir.path().join("bin/run")).unwrap().permissions().mode();
        assert_ne!(mode & 0o111, 0);
        let mode = fs::metadata(dir.path().join("README")).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0);
    }
}

#[test]
fn extract_subdirectory_becomes_root() {
    let dir = tempfile::tempdir().unwrap();
    let data = tar_gz(&[
        Item::Dir("app-1.0"),
        Item::File("app-1.0/main", b"main", 0o644),
        Item::File("other/ignored", b"x", 0o644),
    ]);

    unpack(
        "http://example.com/a.tgz",
        data,
        dir.path(),
        &UnpackOptions::new().extract("app-1.0"),
    )
    .unwrap();

    assert_eq!(fs::read(dir.path().join("main")).unwrap(), b"main");
    assert!(!dir.path().join("other").exists());
    assert!(!dir.path().join("app-1.0").exists());
}

#[test]
fn missing_extract_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let data = tar_gz(&[Item::File("main", b"main", 0o644)]);

    let err = unpack(
        "http://example.com/a.tgz",
        data,
        dir.path(),
        &UnpackOptions::new().extract("app-1.0"),
    )
    .unwrap_err();
    assert!(matches!(err, Error::ExtractNotFound { .. }));
}

#[test]
fn later_archive_overlays_earlier() {
    let dir = tempfile::tempdir().unwrap();
    let first = tar_gz(&[
        Item::Dir("lib"),
        Item::File("lib/a", b"old", 0o644),
        Item::File("lib/b", b"kept", 0o644),
    ]);
    let second = zip(&[
        Item::Dir("lib/"),
        Item::File("lib/a", b"new", 0o644),
        Item::File("lib/c", b"added", 0o644),
    ]);

    unpack("http://example.com/1.tar.gz", first, dir.path(), &UnpackOptions::default()).unwrap();
    unpack("http://example.com/2.zip", second, dir.path(), &UnpackOptions::default()).unwrap();

    assert_eq!(fs::read(dir.path().join("lib/a")).unwrap(), b"new");
    assert_eq!(fs::read(dir.path().join("lib/b")).unwrap(), b"kept");
    assert_eq!(fs::read(dir.path().join("lib/c")).unwrap(), b"added");
}

#[cfg(unix)]
#[test]
fn symlink_over_directory_is_unsafe() {
    let dir = tempfile::tempdir().unwrap();
    let first = tar_gz(&[Item::Dir("data"), Item::File("data/f", b"x", 0o644)]);
    let second = tar_gz(&[Item::File("target", b"t", 0o644), Item::Link("data", "target")]);

    unpack("http://example.com/1.tar.gz", first, dir.path(), &UnpackOptions::default()).unwrap();
    let err = unpack("http://example.com/2.tar.gz", second, dir.path(), &UnpackOptions::default())
        .unwrap_err();

    assert!(matches!(err, Error::UnsafeUnpack { .. }));
    assert!(dir.path().join("data").is_dir());
}

#[cfg(unix)]
#[test]
fn directory_over_symlink_is_unsafe() {
    let dir = tempfile::tempdir().unwrap();
    let first = tar_gz(&[Item::Dir("real"), Item::Link("data", "real")]);
    let second = tar_gz(&[Item::Dir("data")]);

    unpack("http://example.com/1.tar.gz", first, dir.path(), &UnpackOptions::default()).unwrap();
    let err = unpack("http://example.com/2.tar.gz", second, dir.path(), &UnpackOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::UnsafeUnpack { .. }));
}

#[cfg(unix)]
#[test]
fn writing_through_symlinked_parent_is_unsafe() {
    let dir = tempfile::tempdir().unwrap();
    let first = tar_gz(&[Item::Dir("real"), Item::Link("lib", "real")]);
    let second = tar_gz(&[Item::File("lib/evil", b"x", 0o644)]);

    unpack("http://example.com/1.tar.gz", first, dir.path(), &UnpackOptions::default()).unwrap();
    let err = unpack("http://example.com/2.tar.gz", second, dir.path(), &UnpackOptions::default())
        .unwrap_err();

    assert!(matches!(err, Error::UnsafeUnpack { .. }));
    assert!(!dir.path().join("real/evil").exists());
}

#[cfg(unix)]
#[test]
fn zip_symlinks_are_restored() {
    let dir = tempfile::tempdir().unwrap();
    let data = zip(&[Item::File("tool-1.0", b"bin", 0o755), Item::Link("tool", "tool-1.0")]);

    unpack("http://example.com/t.zip", data, dir.path(), &UnpackOptions::default()).unwrap();

    let link = fs::read_link(dir.path().join("tool")).unwrap();
    assert_eq!(link, Path::new("tool-1.0"));
}

#[cfg(unix)]
#[test]
fn escaping_symlink_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let data = tar_gz(&[Item::Link("up", "../../outside")]);

    let err = unpack("http://example.com/a.tar.gz", data, dir.path(), &UnpackOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::SymlinkEscape { .. }));
}

#[test]
fn start_offset_skips_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = b"#!/bin/sh\nexit 0\n".to_vec();
    let offset = data.len() as u64;
    data.extend(tar_gz(&[Item::File("payload", b"p", 0o644)]));

    unpack(
        "http://example.com/installer.sh",
        data,
        dir.path(),
        &UnpackOptions::new()
            .mime_type("application/x-compressed-tar")
            .start_offset(offset),
    )
    .unwrap();

    assert_eq!(fs::read(dir.path().join("payload")).unwrap(), b"p");
}

#[test]
fn corrupt_archive_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = unpack(
        "http://example.com/a.zip",
        b"definitely not a zip".to_vec(),
        dir.path(),
        &UnpackOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Corrupted(_)));
}

#[test]
fn tar_hard_links_are_restored() {
    let dir = tempfile::tempdir().unwrap();
    let data = tar_gz(&[
        Item::File("a.txt", b"hello", 0o644),
        Item::HardLink("b.txt", "a.txt"),
    ]);

    let report = unpack_archive_over(
        "http://example.com/a.tar.gz",
        Cursor::new(data),
        dir.path(),
        &UnpackOptions::default(),
    )
    .unwrap();

    assert_eq!(report.entry_count, 2);
    assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"hello");
    assert_eq!(fs::read(dir.path().join("b.txt")).unwrap(), b"hello");
}

#[test]
fn tar_hard_links_follow_extract() {
    let dir = tempfile::tempdir().unwrap();
    let data = tar_gz(&[
        Item::Dir("app"),
        Item::File("app/run", b"#!/bin/sh\n", 0o755),
        Item::HardLink("app/run-alias", "app/run"),
    ]);

    unpack(
        "http://example.com/a.tar.gz",
        data,
        dir.path(),
        &UnpackOptions::new().extract("app"),
    )
    .unwrap();

    assert_eq!(fs::read(dir.path().join("run-alias")).unwrap(), b"#!/bin/sh\n");
}

#[test]
fn tar_hard_link_to_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let data = tar_gz(&[Item::HardLink("b.txt", "a.txt")]);

    let err = unpack("http://example.com/a.tar.gz", data, dir.path(), &UnpackOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::HardLinkTargetMissing { .. }));
    assert!(!dir.path().join("b.txt").exists());
}
