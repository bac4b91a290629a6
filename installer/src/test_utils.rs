//! Shared test utilities for the installer crate.

use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::{Cursor, Write};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// One entry of an archive built for a test.
#[derive(Debug, Clone, Copy)]
pub enum TestEntry<'a> {
    /// A regular file with contents.
    File(&'a str, &'a [u8]),
    /// A directory.
    Dir(&'a str),
    /// A symbolic link pointing at a target.
    Symlink(&'a str, &'a str),
}

/// A temporary directory with its UTF-8 path.
pub fn utf8_temp_dir() -> (TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
    (temp, path)
}

/// Build a zip archive in memory. Entry names are stored verbatim.
pub fn zip_archive(entries: &[TestEntry<'_>]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().unix_permissions(0o644);
    for entry in entries {
        match *entry {
            TestEntry::File(name, data) => {
                writer.start_file(name, options).expect("start zip file");
                writer.write_all(data).expect("write zip file");
            }
            TestEntry::Dir(name) => writer.add_directory(name, options).expect("zip dir"),
            TestEntry::Symlink(name, target) => writer
                .add_symlink(name, target, options)
                .expect("zip symlink"),
        }
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Build a single-entry zip whose central directory records `mode` as the
/// entry's Unix mode, type bits included.
pub fn zip_with_unix_mode(name: &str, data: &[u8], mode: u32) -> Vec<u8> {
    let mut archive = zip_archive(&[TestEntry::File(name, data)]);
    let header = archive
        .windows(4)
        .position(|window| window == [0x50, 0x4b, 0x01, 0x02])
        .expect("central directory header");
    // External attributes sit 38 bytes into the header; the mode is the high half.
    let attributes = (mode << 16).to_le_bytes();
    archive[header + 38..header + 42].copy_from_slice(&attributes);
    archive
}

/// Build a tar header whose name is written without validation, so
/// traversal paths can be stored.
pub fn raw_tar_header(name: &str, entry_type: tar::EntryType, size: u64) -> tar::Header {
    let mut header = tar::Header::new_old();
    let field = &mut header.as_old_mut().name;
    field[..name.len()].copy_from_slice(name.as_bytes());
    header.set_entry_type(entry_type);
    header.set_size(size);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_cksum();
    header
}

/// Build a gzip-compressed tarball in memory. Entry names are stored
/// verbatim.
pub fn tar_gz_archive(entries: &[TestEntry<'_>]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for entry in entries {
        match *entry {
            TestEntry::File(name, data) => {
                let header = raw_tar_header(name, tar::EntryType::Regular, data.len() as u64);
                builder.append(&header, data).expect("append file");
            }
            TestEntry::Dir(name) => {
                let header = raw_tar_header(name, tar::EntryType::Directory, 0);
                builder.append(&header, std::io::empty()).expect("append dir");
            }
            TestEntry::Symlink(name, target) => {
                let mut header = raw_tar_header(name, tar::EntryType::Symlink, 0);
                header.set_link_name(target).expect("link name");
                header.set_cksum();
                builder.append(&header, std::io::empty()).expect("append link");
            }
        }
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

/// A gzip stream holding only a file header that declares `size` bytes.
pub fn tar_gz_header_only(name: &str, size: u64) -> Vec<u8> {
    let header = raw_tar_header(name, tar::EntryType::Regular, size);
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(header.as_bytes()).expect("write header");
    encoder.finish().expect("finish gzip")
}

/// Every file and directory under `root`, relative and sorted, with
/// directories suffixed by `/`.
pub fn tree(root: &Utf8Path) -> Vec<String> {
    let mut entries: Vec<String> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|entry| {
            let entry = entry.expect("walk entry");
            let relative = entry
                .path()
                .strip_prefix(root)
                .expect("under root")
                .to_str()
                .expect("UTF-8")
                .replace('\\', "/");
            if entry.file_type().is_dir() {
                format!("{relative}/")
            } else {
                relative
            }
        })
        .collect();
    entries.sort();
    entries
}

/// A config whose working, user and root directories live under a fresh
/// temporary directory, for `linux_amd64`.
pub fn test_config() -> (TempDir, crate::config::Config) {
    let (temp, base) = utf8_temp_dir();
    let work = base.join("work");
    let home = base.join("home");
    let root = base.join("home/.tvm");
    for dir in [&work, &home, &root] {
        std::fs::create_dir_all(dir).expect("create test dir");
    }
    let platform = crate::platform::Platform::new("linux", "amd64").expect("platform");
    let config = crate::config::Config::new(
        crate::config::ToolSpec::opentofu(),
        root,
        home,
        work,
        platform,
    );
    (temp, config)
}
