use assert_cmd::Command;
use assert_fs::fixture::ChildPath;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use chrono::{Local, NaiveDate, TimeZone};
use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Binary with its config pointed at a scratch file so the user's own
/// defaults never leak into a test.
pub fn renamer(temp: &TempDir) -> Command {
    let config = temp.child("config.toml");
    if !config.exists() {
        config
            .write_str("use_exiftool = false\n")
            .expect("write config");
    }
    let mut cmd = Command::cargo_bin("date-renamer").expect("binary");
    cmd.env("DATE_RENAMER_CONFIG", config.path())
        .env_remove("RUST_LOG");
    cmd
}

pub fn photo_dir(temp: &TempDir) -> ChildPath {
    let dir = temp.child("photos");
    dir.create_dir_all().expect("create photos dir");
    dir
}

/// Writes `path` with a local modification time of 2024-03-15 at `h:mi:s`.
pub fn write_with_mtime(path: &Path, h: u32, mi: u32, s: u32) {
    fs::write(path, path.to_string_lossy().as_bytes()).expect("write image");
    let naive = NaiveDate::from_ymd_opt(2024, 3, 15)
        .and_then(|v| v.and_hms_opt(h, mi, s))
        .expect("valid date");
    let local = Local
        .from_local_datetime(&naive)
        .single()
        .expect("unambiguous local time");
    set_file_mtime(path, FileTime::from_unix_time(local.timestamp(), 0)).expect("set mtime");
}

/// Bare TIFF stream whose only tag is `DateTimeOriginal`.
pub fn write_tiff_with_date(path: &Path, date: &str) {
    let field = Field {
        tag: Tag::DateTimeOriginal,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![date.as_bytes().to_vec()]),
    };
    let mut writer = Writer::new();
    writer.push_field(&field);
    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, false).expect("encode exif");
    fs::write(path, buf.into_inner()).expect("write tiff");
}

pub fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
