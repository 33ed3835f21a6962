//! Integration tests driving the public API end-to-end.
//!
//! These tests verify that:
//! 1. The trait surface composes and works through `dyn FileSystem`
//! 2. Path handling is case-insensitive, case-preserving and Windows-shaped
//! 3. Each operation enforces the platform's rules and error vocabulary
//! 4. Streams, attributes, timestamps and volumes behave like the real thing

use anyfs_fakes::*;
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

fn all_files(fs: &FakeFileSystem, path: &str, pattern: &str, option: SearchOption) -> Vec<String> {
    let mut found = fs
        .enumerate(path, pattern, option, EnumerationKind::Files)
        .unwrap();
    found.sort();
    found
}

// =============================================================================
// Trait Hierarchy
// =============================================================================

#[test]
fn trait_hierarchy_file_system_works() {
    let fs = FakeFileSystem::new();
    verify_file_system(&fs);
    assert_eq!(fs.read_all_text(r"C:\app\out.txt").unwrap(), "payload");
}

fn verify_file_system(fs: &dyn FileSystem) {
    fs.create_directory(r"C:\app").unwrap();
    fs.write_all_text(r"C:\app\in.txt", "payload").unwrap();
    fs.copy_file(r"C:\app\in.txt", r"C:\app\out.txt", false)
        .unwrap();
    assert!(fs.exists(r"C:\app\out.txt"));
    assert!(fs.directory_exists(r"C:\app"));
    assert_eq!(fs.drives().len(), 1);
}

#[test]
fn generic_function_with_file_bound() {
    fn archive<F: FsFile + FsDirectory>(fs: &F, name: &str) -> Result<(), FsError> {
        fs.create_directory(r"C:\archive")?;
        fs.move_file(name, &format!(r"C:\archive\{name}"))
    }

    let fs = FakeFileSystem::new();
    fs.write_all_text(r"C:\report.txt", "q3").unwrap();
    archive(&fs, "report.txt").unwrap();
    assert!(!fs.file_exists(r"C:\report.txt"));
    assert_eq!(fs.read_all_text(r"C:\archive\report.txt").unwrap(), "q3");
}

#[test]
fn file_system_shared_across_threads() {
    let fs = Arc::new(FakeFileSystem::new());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let fs = Arc::clone(&fs);
            std::thread::spawn(move || {
                fs.create_directory(&format!(r"C:\t{i}")).unwrap();
                fs.write_all_text(&format!(r"C:\t{i}\f.txt"), "x").unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(
        fs.enumerate(r"C:\", "t*", SearchOption::TopDirectoryOnly, EnumerationKind::Directories)
            .unwrap()
            .len(),
        4
    );
}

// =============================================================================
// Paths
// =============================================================================

#[test]
fn mixed_case_lookup_returns_creation_casing() {
    let fs = FakeFileSystem::new();
    fs.create_directory(r"C:\a\b\c").unwrap();
    assert!(fs.directory_exists(r"C:\A\b\C"));
    assert_eq!(fs.metadata(r"c:\A\B\C").unwrap().full_name, r"C:\a\b\c");
}

#[test]
fn normalization_is_idempotent() {
    for text in [r"c:\Dir\.\sub\..\File.TXT  ", r"\\Server\Share\x", r"\\?\d:\x\y", "e:/a//b/"] {
        let once = parse_path(text).unwrap();
        let twice = parse_path(&once.get_text()).unwrap();
        assert_eq!(once, twice, "{text}");
        assert_eq!(once.get_text(), twice.get_text());
    }
    assert_eq!(parse_path(r"c:\c").unwrap().get_text(), r"C:\c");
}

#[test]
fn invalid_paths_are_rejected_with_platform_messages() {
    let fs = FakeFileSystem::new();
    assert_eq!(
        fs.create_directory("").unwrap_err().to_string(),
        "The path is empty."
    );
    assert!(matches!(
        fs.create_directory(r"C:\bad|name"),
        Err(FsError::IllegalCharacters { .. })
    ));
    assert_eq!(
        fs.create_directory(r"C:\nul").unwrap_err().kind(),
        ErrorKind::NotSupported
    );
    assert!(!fs.exists(r"C:\bad<"));
}

#[test]
fn unc_share_requires_mounted_volume() {
    let fs = FakeFileSystem::new();
    assert!(matches!(
        fs.create_directory(r"\\server\share\dir"),
        Err(FsError::NetworkPathNotFound { .. })
    ));

    fs.add_volume(r"\\server\share", VolumeInfo::default()).unwrap();
    fs.create_directory(r"\\SERVER\share\dir").unwrap();
    assert!(fs.directory_exists(r"\\server\SHARE\Dir"));
}

// =============================================================================
// Directories and Enumeration
// =============================================================================

#[test]
fn enumeration_pattern_selects_directory_levels() {
    let fs = FakeFileSystem::new();
    for file in [
        r"C:\root\root.doc",
        r"C:\root\base\more.doc",
        r"C:\root\base\second\other.doc",
        r"C:\root\base\second\deeper\skip.doc",
    ] {
        fs.seed_file(file, "").unwrap();
    }

    assert_eq!(
        all_files(&fs, r"C:\root", r"base\second\*.doc", SearchOption::TopDirectoryOnly),
        [r"C:\root\base\second\other.doc"]
    );
    assert_eq!(
        all_files(&fs, r"C:\root", r"base\second\*.doc", SearchOption::AllDirectories),
        [
            r"C:\root\base\second\deeper\skip.doc",
            r"C:\root\base\second\other.doc",
        ]
    );
    assert_eq!(
        all_files(&fs, r"C:\root", "*.doc", SearchOption::AllDirectories).len(),
        4
    );
}

#[test]
fn enumeration_of_missing_directory_fails() {
    let fs = FakeFileSystem::new();
    assert!(matches!(
        fs.enumerate(r"C:\nope", "*", SearchOption::TopDirectoryOnly, EnumerationKind::All),
        Err(FsError::DirectoryNotFound { .. })
    ));
}

#[test]
fn create_directory_over_file_fails() {
    let fs = FakeFileSystem::new();
    fs.seed_file(r"C:\blocker", "").unwrap();
    let err = fs.create_directory(r"C:\blocker\child").unwrap_err();
    assert_eq!(
        err.to_string(),
        r"Cannot create 'C:\blocker' because a file or directory with the same name already exists."
    );
}

#[test]
fn delete_non_empty_directory_requires_recursive() {
    let fs = FakeFileSystem::new();
    fs.seed_file(r"C:\full\a.txt", "").unwrap();
    let err = fs.delete_directory(r"C:\full", false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DirectoryNotEmpty);
    assert_eq!(err.to_string(), r"The directory is not empty. : 'C:\full'");
    assert!(fs.file_exists(r"C:\full\a.txt"));
}

#[test]
fn recursive_delete_removes_everything_it_can() {
    let fs = FakeFileSystem::new();
    fs.seed_file(r"C:\tree\keep.txt", "").unwrap();
    fs.seed_file(r"C:\tree\gone.txt", "").unwrap();
    fs.seed_file(r"C:\tree\sub\also_gone.txt", "").unwrap();
    fs.set_attributes(r"C:\tree\keep.txt", FileAttributes::READ_ONLY)
        .unwrap();

    let err = fs.delete_directory(r"C:\tree", true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccessDenied);
    assert_eq!(err.to_string(), r"Access to the path 'C:\tree\keep.txt' is denied.");

    assert!(fs.file_exists(r"C:\tree\keep.txt"));
    assert!(!fs.file_exists(r"C:\tree\gone.txt"));
    assert!(!fs.directory_exists(r"C:\tree\sub"));
}

#[test]
fn current_directory_cannot_be_deleted() {
    let fs = FakeFileSystem::new();
    fs.create_directory(r"C:\work\inner").unwrap();
    fs.set_current_directory(r"C:\work\inner").unwrap();
    assert_eq!(
        fs.delete_directory(r"C:\work", true).unwrap_err().kind(),
        ErrorKind::InUse
    );
}

#[test]
fn move_directory_into_descendant_fails() {
    let fs = FakeFileSystem::new();
    fs.create_directory(r"C:\parent\child").unwrap();
    let err = fs
        .move_directory(r"C:\parent", r"C:\parent\child\parent")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InUse);
}

#[test]
fn move_directory_renames_subtree() {
    let fs = FakeFileSystem::new();
    fs.seed_file(r"C:\old\nested\file.txt", "x").unwrap();
    fs.move_directory(r"C:\old", r"C:\New").unwrap();
    assert!(fs.file_exists(r"C:\new\nested\file.txt"));
    assert_eq!(fs.metadata(r"C:\new").unwrap().full_name, r"C:\New");
    assert!(!fs.directory_exists(r"C:\old"));
}

#[test]
fn move_directory_across_volumes_fails() {
    let fs = FakeFileSystem::new();
    fs.add_volume("D:", VolumeInfo::default()).unwrap();
    fs.create_directory(r"C:\src").unwrap();
    assert!(matches!(
        fs.move_directory(r"C:\src", r"D:\src"),
        Err(FsError::CrossVolumeMove)
    ));
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn move_file_onto_itself_is_a_no_op() {
    let fs = FakeFileSystem::new();
    fs.write_all_text(r"C:\same.txt", "data").unwrap();
    fs.move_file(r"C:\same.txt", r"C:\same.txt").unwrap();
    assert_eq!(fs.metadata(r"C:\same.txt").unwrap().full_name, r"C:\same.txt");
}

#[test]
fn move_file_onto_existing_fails() {
    let fs = FakeFileSystem::new();
    fs.seed_file(r"C:\a.txt", "a").unwrap();
    fs.seed_file(r"C:\b.txt", "b").unwrap();
    let err = fs.move_file(r"C:\a.txt", r"C:\b.txt").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(fs.read_all_text(r"C:\b.txt").unwrap(), "b");
}

#[test]
fn move_file_changes_case_in_place() {
    let fs = FakeFileSystem::new();
    fs.seed_file(r"C:\readme.md", "").unwrap();
    fs.move_file(r"C:\readme.md", r"C:\README.md").unwrap();
    assert_eq!(fs.metadata(r"C:\readme.md").unwrap().full_name, r"C:\README.md");
}

#[test]
fn move_missing_file_fails() {
    let fs = FakeFileSystem::new();
    assert_eq!(
        fs.move_file(r"C:\ghost.txt", r"C:\x.txt").unwrap_err().to_string(),
        r"Could not find file 'C:\ghost.txt'."
    );
}

#[test]
fn copy_file_respects_overwrite_flag() {
    let fs = FakeFileSystem::new();
    fs.write_all_text(r"C:\src.txt", "new").unwrap();
    fs.write_all_text(r"C:\dst.txt", "old").unwrap();

    assert!(matches!(
        fs.copy_file(r"C:\src.txt", r"C:\dst.txt", false),
        Err(FsError::FileAlreadyExists { .. })
    ));
    fs.copy_file(r"C:\src.txt", r"C:\dst.txt", true).unwrap();
    assert_eq!(fs.read_all_text(r"C:\dst.txt").unwrap(), "new");
}

#[test]
fn copy_file_onto_directory_fails() {
    let fs = FakeFileSystem::new();
    fs.seed_file(r"C:\src.txt", "").unwrap();
    fs.create_directory(r"C:\dir").unwrap();
    assert!(matches!(
        fs.copy_file(r"C:\src.txt", r"C:\dir", true),
        Err(FsError::TargetIsDirectory { .. })
    ));
}

#[test]
fn delete_missing_file_is_a_no_op() {
    let fs = FakeFileSystem::new();
    fs.delete_file(r"C:\never.txt").unwrap();
}

#[test]
fn delete_read_only_file_is_denied() {
    let fs = FakeFileSystem::new();
    fs.seed_file(r"C:\locked.txt", "").unwrap();
    fs.set_attributes(r"C:\locked.txt", FileAttributes::READ_ONLY)
        .unwrap();
    assert_eq!(
        fs.delete_file(r"C:\locked.txt").unwrap_err().kind(),
        ErrorKind::AccessDenied
    );
}

#[test]
fn replace_file_keeps_backup() {
    let fs = FakeFileSystem::new();
    fs.write_all_text(r"C:\new.cfg", "v2").unwrap();
    fs.write_all_text(r"C:\live.cfg", "v1").unwrap();
    fs.replace_file(r"C:\new.cfg", r"C:\live.cfg", Some(r"C:\live.bak"))
        .unwrap();

    assert!(!fs.file_exists(r"C:\new.cfg"));
    assert_eq!(fs.read_all_text(r"C:\live.cfg").unwrap(), "v2");
    assert_eq!(fs.read_all_text(r"C:\live.bak").unwrap(), "v1");
}

#[test]
fn replace_file_across_volumes_fails() {
    let fs = FakeFileSystem::new();
    fs.add_volume("D:", VolumeInfo::default()).unwrap();
    fs.seed_file(r"C:\a.txt", "").unwrap();
    fs.seed_file(r"D:\b.txt", "").unwrap();
    assert!(matches!(
        fs.replace_file(r"C:\a.txt", r"D:\b.txt", None),
        Err(FsError::UnableToMoveReplacement)
    ));
}

// =============================================================================
// Streams
// =============================================================================

#[test]
fn seek_past_end_then_write_zero_fills() {
    let fs = FakeFileSystem::new();
    fs.seed_file(r"C:\gap.bin", b"abcd").unwrap();
    let mut stream = fs
        .open(r"C:\gap.bin", FileMode::Open, FileAccess::ReadWrite)
        .unwrap();
    let length = stream.len().unwrap();
    stream.seek(SeekFrom::Start(length + 3)).unwrap();
    stream.write_all(b"!").unwrap();
    stream.close().unwrap();

    let data = fs.read_all_bytes(r"C:\gap.bin").unwrap();
    assert_eq!(data.len() as u64, length + 3 + 1);
    assert!(data[4..7].iter().all(|b| *b == 0));
    assert_eq!(data[7], b'!');
}

#[test]
fn writer_excludes_other_handles() {
    let fs = FakeFileSystem::new();
    fs.seed_file(r"C:\shared.txt", "x").unwrap();

    let reader = fs
        .open(r"C:\shared.txt", FileMode::Open, FileAccess::Read)
        .unwrap();
    let second_reader = fs
        .open(r"C:\shared.txt", FileMode::Open, FileAccess::Read)
        .unwrap();
    assert!(matches!(
        fs.open(r"C:\shared.txt", FileMode::Open, FileAccess::Write),
        Err(FsError::FileInUse { .. })
    ));
    drop(reader);
    drop(second_reader);

    let _writer = fs
        .open(r"C:\shared.txt", FileMode::Open, FileAccess::Write)
        .unwrap();
    let err = fs
        .open(r"C:\shared.txt", FileMode::Open, FileAccess::Read)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        r"The process cannot access the file 'C:\shared.txt' because it is being used by another process."
    );
}

#[test]
fn open_mode_and_access_are_validated() {
    let fs = FakeFileSystem::new();
    let err = fs
        .open(r"C:\x.txt", FileMode::Create, FileAccess::Read)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Combining FileMode: Create with FileAccess: Read is invalid."
    );
    assert_eq!(
        fs.open(r"C:\x.txt", FileMode::Append, FileAccess::ReadWrite)
            .unwrap_err()
            .to_string(),
        "Append access can be requested only in write-only mode."
    );
    assert!(matches!(
        fs.open(r"C:\x.txt", FileMode::Open, FileAccess::Read),
        Err(FsError::FileNotFound { .. })
    ));
}

#[test]
fn create_new_on_existing_file_fails() {
    let fs = FakeFileSystem::new();
    fs.seed_file(r"C:\once.txt", "").unwrap();
    assert_eq!(
        fs.open(r"C:\once.txt", FileMode::CreateNew, FileAccess::Write)
            .unwrap_err()
            .to_string(),
        r"The file 'C:\once.txt' already exists."
    );
}

#[test]
fn open_modes_on_missing_file() {
    let fs = FakeFileSystem::new();
    for mode in [FileMode::Open, FileMode::Truncate] {
        let result = fs.open(r"C:\absent.txt", mode, FileAccess::Write);
        assert!(matches!(result, Err(FsError::FileNotFound { .. })), "{mode:?}");
    }
    assert!(!fs.file_exists(r"C:\absent.txt"));

    let mut stream = fs
        .open(r"C:\absent.txt", FileMode::Append, FileAccess::Write)
        .unwrap();
    assert_eq!(stream.position().unwrap(), 0);
    stream.write_all(b"first").unwrap();
    stream.close().unwrap();
    assert_eq!(fs.read_all_text(r"C:\absent.txt").unwrap(), "first");
}

#[test]
fn stream_reads_what_was_written() {
    let fs = FakeFileSystem::new();
    let mut stream = fs
        .open(r"C:\rw.txt", FileMode::CreateNew, FileAccess::ReadWrite)
        .unwrap();
    assert_eq!(stream.name(), r"C:\rw.txt");
    stream.write_all(b"hello world").unwrap();
    stream.seek(SeekFrom::Start(6)).unwrap();
    let mut word = String::new();
    stream.read_to_string(&mut word).unwrap();
    assert_eq!(word, "world");
    assert_eq!(stream.position().unwrap(), 11);
}

// =============================================================================
// Attributes, Times and Encryption
// =============================================================================

#[test]
fn attributes_report_platform_defaults() {
    let fs = FakeFileSystem::new();
    fs.seed_file(r"C:\plain.txt", "").unwrap();
    fs.create_directory(r"C:\folder").unwrap();
    assert_eq!(fs.attributes(r"C:\plain.txt").unwrap(), FileAttributes::ARCHIVE);
    assert!(fs
        .attributes(r"C:\folder")
        .unwrap()
        .contains(FileAttributes::DIRECTORY));

    fs.set_attributes(r"C:\plain.txt", FileAttributes::HIDDEN | FileAttributes::DIRECTORY)
        .unwrap();
    assert_eq!(fs.attributes(r"C:\plain.txt").unwrap(), FileAttributes::HIDDEN);

    fs.set_attributes(r"C:\plain.txt", FileAttributes::EMPTY)
        .unwrap();
    assert_eq!(fs.attributes(r"C:\plain.txt").unwrap(), FileAttributes::NORMAL);
}

#[test]
fn set_time_rejects_volume_roots_and_ancient_times() {
    let fs = FakeFileSystem::new();
    fs.seed_file(r"C:\t.txt", "").unwrap();
    assert!(matches!(
        fs.set_time(r"C:\", TimeKind::Creation, SystemTime::now()),
        Err(FsError::PathIsDrive { .. })
    ));
    let ancient = win32_epoch() - Duration::from_secs(1);
    assert_eq!(
        fs.set_time(r"C:\t.txt", TimeKind::LastWrite, ancient),
        Err(FsError::InvalidFileTime)
    );

    let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000);
    fs.set_time(r"C:\t.txt", TimeKind::LastWrite, stamp).unwrap();
    assert_eq!(fs.time(r"C:\t.txt", TimeKind::LastWrite).unwrap(), stamp);
}

#[test]
fn timestamps_follow_the_injected_clock() {
    let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
    let clock = Arc::new(ManualClock::new(start));
    let fs = FakeFileSystem::with_clock(clock.clone());

    fs.write_all_text(r"C:\log.txt", "a").unwrap();
    clock.advance(Duration::from_secs(60));
    fs.append_all_bytes(r"C:\log.txt", b"b").unwrap();

    let meta = fs.metadata(r"C:\log.txt").unwrap();
    assert_eq!(meta.creation_time_utc, start);
    assert_eq!(meta.last_write_time_utc, start + Duration::from_secs(60));
}

#[test]
fn encryption_requires_ntfs() {
    let mut options = FakeFileSystemOptions::default();
    options.volumes.push(VolumeSpec::new(
        "F:",
        VolumeInfo {
            format: "FAT32".into(),
            ..VolumeInfo::ntfs(1 << 20)
        },
    ));
    let fs = FakeFileSystem::with_options(options).unwrap();
    fs.seed_file(r"C:\secret.txt", "").unwrap();
    fs.seed_file(r"F:\secret.txt", "").unwrap();

    fs.encrypt(r"C:\secret.txt").unwrap();
    assert!(fs
        .attributes(r"C:\secret.txt")
        .unwrap()
        .contains(FileAttributes::ENCRYPTED));
    fs.decrypt(r"C:\secret.txt").unwrap();
    assert!(!fs
        .attributes(r"C:\secret.txt")
        .unwrap()
        .contains(FileAttributes::ENCRYPTED));

    assert_eq!(
        fs.encrypt(r"F:\secret.txt").unwrap_err().to_string(),
        "File encryption support only works on NTFS partition."
    );
}

// =============================================================================
// Volumes and Space
// =============================================================================

#[test]
fn writes_are_charged_to_free_space() {
    let mut options = FakeFileSystemOptions::default();
    options
        .volumes
        .push(VolumeSpec::new("Z:", VolumeInfo::ntfs(16)));
    let fs = FakeFileSystem::with_options(options).unwrap();

    fs.write_all_bytes(r"Z:\fits.bin", &[7; 10]).unwrap();
    let z = fs
        .drives()
        .into_iter()
        .find(|d| d.name == r"Z:\")
        .unwrap();
    assert_eq!(z.info.free_space, 6);

    let err = fs.write_all_bytes(r"Z:\too_big.bin", &[7; 7]).unwrap_err();
    assert!(matches!(err, FsError::NotEnoughSpace { .. }));

    fs.delete_file(r"Z:\fits.bin").unwrap();
    let z = fs
        .drives()
        .into_iter()
        .find(|d| d.name == r"Z:\")
        .unwrap();
    assert_eq!(z.info.free_space, 16);
}

#[test]
fn copy_checks_destination_space_first() {
    let fs = FakeFileSystem::new();
    fs.add_volume("Y:", VolumeInfo::ntfs(4)).unwrap();
    fs.seed_file(r"C:\big.bin", [1u8; 8]).unwrap();
    assert!(matches!(
        fs.copy_file(r"C:\big.bin", r"Y:\big.bin", false),
        Err(FsError::NotEnoughSpace { .. })
    ));
    assert!(!fs.file_exists(r"Y:\big.bin"));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn errors_convert_through_io_error() {
    let original = FsError::FileNotFound {
        path: r"C:\x".into(),
    };
    let io: std::io::Error = original.clone().into();
    assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
    assert_eq!(FsError::from(io), original);
}
