/// Integration tests for batchren
///
/// These tests drive the public library API against real temporary
/// directories, the way a presentation shell would: select files, preview,
/// then commit.
///
/// Test categories:
/// 1. Rule pipeline properties
/// 2. Rename commit and collision handling
/// 3. Move, copy and delete batches
/// 4. Session lifecycle
/// 5. Configuration-driven folder scans
use batchren::{
    AppConfig, BatchOperation, CaseConversion, OperationExecutor, OperationKind, RenameItem,
    RenameSession, RulePipeline, RuleSet, SessionError,
};
use chrono::{DateTime, Local, TimeZone};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary directory with helpers to create and inspect files.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a text file and return its path.
    fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let file_path = self.path().join(name);
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content.as_bytes())
            .expect("Failed to write file content");
        file_path
    }

    fn create_subdir(&self, name: &str) -> PathBuf {
        let dir = self.path().join(name);
        fs::create_dir(&dir).expect("Failed to create subdirectory");
        dir
    }

    fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path().join(name)).expect("Failed to read file")
    }

    fn exists(&self, name: &str) -> bool {
        self.path().join(name).exists()
    }

    /// Sorted names of the regular files in the fixture root.
    fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path())
            .expect("Failed to read dir")
            .flatten()
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn fixed_time() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2025, 3, 22, 9, 15, 0)
        .single()
        .expect("unambiguous local time")
}

fn new_names(original: &[&str], rules: &RuleSet) -> Vec<String> {
    let pipeline = RulePipeline::with_timestamp(rules, fixed_time());
    let mut counter = rules.sequence();
    original
        .iter()
        .map(|name| pipeline.compute_new_name(name, &mut counter))
        .collect()
}

// ============================================================================
// 1. Rule pipeline properties
// ============================================================================

#[test]
fn test_empty_rules_map_names_to_themselves() {
    let names = ["A.JPG", "report.final.pdf", ".env", "no extension", ""];
    assert_eq!(new_names(&names, &RuleSet::default()), names);
}

#[test]
fn test_sequence_numbers_follow_selection_order() {
    let rules = RuleSet {
        template: "img_{n}".to_string(),
        start_number: 5,
        step_number: 10,
        ..Default::default()
    };
    let names = new_names(&["z.png", "a.png", "m.png"], &rules);
    assert_eq!(names, ["img_5.png", "img_15.png", "img_25.png"]);
}

#[test]
fn test_case_conversion_applies_to_new_extension() {
    let rules = RuleSet {
        new_extension: "TXT".to_string(),
        case_conversion: CaseConversion::Lower,
        ..Default::default()
    };
    assert_eq!(new_names(&["Notes.md"], &rules), ["notes.txt"]);
}

#[test]
fn test_full_chain_in_order() {
    let rules = RuleSet {
        regex_remove: r"^IMG_".to_string(),
        find: "-".to_string(),
        replace: "_".to_string(),
        delete_start: 1,
        delete_end: 0,
        date_format: "%Y%m%d".to_string(),
        template: String::new(),
        new_extension: "jpeg".to_string(),
        case_conversion: CaseConversion::Upper,
        ..Default::default()
    };
    // "IMG_0001-beach.jpg" -> "0001-beach.jpg" -> "0001_beach.jpg"
    // -> "001_beach.jpg" -> "001_beach.jpg_20250322" -> "001_beach.jpeg"
    // -> upper-cased
    assert_eq!(new_names(&["IMG_0001-beach.jpg"], &rules), ["001_BEACH.JPEG"]);
}

#[test]
fn test_preview_is_repeatable() {
    let rules = RuleSet {
        template: "f{n}".to_string(),
        date_format: "%S".to_string(),
        ..Default::default()
    };
    let first = new_names(&["a.txt", "b.txt"], &rules);
    let second = new_names(&["a.txt", "b.txt"], &rules);
    assert_eq!(first, second);
}

// ============================================================================
// 2. Rename commit and collision handling
// ============================================================================

#[test]
fn test_two_files_renamed_to_same_name_do_not_overwrite() {
    let fixture = TestFixture::new();
    let first = fixture.create_file("one.txt", "first");
    let second = fixture.create_file("two.txt", "second");

    let items = vec![
        RenameItem::new(&first, "dup.txt"),
        RenameItem::new(&second, "dup.txt"),
    ];
    let result = OperationExecutor::execute(BatchOperation::Rename(&items));

    assert_eq!(result.success_count, 2);
    assert!(result.errors.is_empty());
    assert_eq!(fixture.read("dup.txt"), "first");
    assert_eq!(fixture.read("dup (1).txt"), "second");
    assert_eq!(
        result.committed[1].destination.as_deref(),
        Some(fixture.path().join("dup (1).txt").as_path())
    );
}

#[test]
fn test_collision_counter_skips_taken_suffixes() {
    let fixture = TestFixture::new();
    fixture.create_file("dup.txt", "a");
    fixture.create_file("dup (1).txt", "b");
    let source = fixture.create_file("src.txt", "c");

    let items = vec![RenameItem::new(&source, "dup.txt")];
    let result = OperationExecutor::execute(BatchOperation::Rename(&items));

    assert_eq!(result.success_count, 1);
    assert_eq!(fixture.read("dup (2).txt"), "c");
}

#[test]
fn test_empty_proposed_name_fails_only_that_item() {
    let fixture = TestFixture::new();
    let short = fixture.create_file("ab", "short");
    let long = fixture.create_file("abcdef.txt", "long");

    let mut session = RenameSession::new();
    session.add_files([&short, &long]);
    let rules = RuleSet {
        delete_start: 2,
        ..Default::default()
    };
    let preview = session.generate_preview(&rules);
    assert_eq!(preview.entries[0].new_name, "");
    assert_eq!(preview.entries[1].new_name, "cdef.txt");

    let result = session.apply_rename().expect("apply");
    assert_eq!(result.success_count, 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].path, short);
    assert!(short.exists());
    assert!(fixture.exists("cdef.txt"));
}

#[test]
fn test_rename_failure_does_not_stop_batch() {
    let fixture = TestFixture::new();
    let present = fixture.create_file("here.txt", "x");
    let gone = fixture.path().join("gone.txt");

    let items = vec![
        RenameItem::new(&gone, "a.txt"),
        RenameItem::new(&present, "b.txt"),
    ];
    let result = OperationExecutor::execute(BatchOperation::Rename(&items));

    assert_eq!(result.kind, OperationKind::Rename);
    assert_eq!(result.success_count, 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].path, gone);
    assert!(fixture.exists("b.txt"));
}

// ============================================================================
// 3. Move, copy and delete batches
// ============================================================================

#[test]
fn test_delete_with_one_missing_file() {
    let fixture = TestFixture::new();
    let a = fixture.create_file("a.txt", "");
    let b = fixture.create_file("b.txt", "");
    let missing = fixture.path().join("missing.txt");

    let sources = vec![a.clone(), missing.clone(), b.clone()];
    let result = OperationExecutor::execute(BatchOperation::Delete(&sources));

    assert_eq!(result.success_count, 2);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].path, missing);
    assert!(!a.exists());
    assert!(!b.exists());
}

#[test]
fn test_move_into_directory() {
    let fixture = TestFixture::new();
    let dest = fixture.create_subdir("archive");
    let a = fixture.create_file("a.txt", "A");
    let b = fixture.create_file("b.txt", "B");

    let sources = vec![a.clone(), b.clone()];
    let result = OperationExecutor::execute(BatchOperation::Move {
        sources: &sources,
        destination: &dest,
    });

    assert!(result.is_complete_success());
    assert_eq!(result.success_count, 2);
    assert!(!a.exists());
    assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "A");
    assert_eq!(fs::read_to_string(dest.join("b.txt")).unwrap(), "B");
}

#[test]
fn test_copy_never_overwrites_existing_destination() {
    let fixture = TestFixture::new();
    let dest = fixture.create_subdir("backup");
    fs::write(dest.join("a.txt"), "old backup").unwrap();
    let a = fixture.create_file("a.txt", "new");
    let b = fixture.create_file("b.txt", "bee");

    let sources = vec![a.clone(), b.clone()];
    let result = OperationExecutor::execute(BatchOperation::Copy {
        sources: &sources,
        destination: &dest,
    });

    assert_eq!(result.success_count, 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].path, a);
    assert!(result.errors[0].reason.contains("already exists"));
    assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "old backup");
    assert_eq!(fs::read_to_string(dest.join("b.txt")).unwrap(), "bee");
    assert!(a.exists());
}

#[test]
fn test_move_keeps_selection() {
    let fixture = TestFixture::new();
    let dest = fixture.create_subdir("out");
    let a = fixture.create_file("a.txt", "");

    let mut session = RenameSession::new();
    session.add_files([&a]);
    let result = session.move_to(&dest, |_, _| {});

    assert_eq!(result.success_count, 1);
    assert_eq!(session.len(), 1);
}

// ============================================================================
// 4. Session lifecycle
// ============================================================================

#[test]
fn test_end_to_end_lowercase_rename() {
    let fixture = TestFixture::new();
    let a = fixture.create_file("A.JPG", "a");
    let b = fixture.create_file("B.JPG", "b");

    let mut session = RenameSession::new();
    session.add_files([&a, &b]);
    let rules = RuleSet {
        case_conversion: CaseConversion::Lower,
        ..Default::default()
    };

    let preview = session.generate_preview(&rules);
    let pairs: Vec<(&str, &str)> = preview
        .entries
        .iter()
        .map(|e| (e.original_name.as_str(), e.new_name.as_str()))
        .collect();
    assert_eq!(pairs, [("A.JPG", "a.jpg"), ("B.JPG", "b.jpg")]);

    let result = session.apply_rename().expect("apply");
    assert_eq!(result.success_count, 2);
    assert!(result.is_complete_success());
    assert_eq!(fixture.file_names(), ["a.jpg", "b.jpg"]);
    assert_eq!(fixture.read("a.jpg"), "a");
    assert!(session.is_empty());
    assert!(session.preview().is_none());
}

#[test]
fn test_apply_before_preview_touches_nothing() {
    let fixture = TestFixture::new();
    let a = fixture.create_file("A.JPG", "a");

    let mut session = RenameSession::new();
    session.add_files([&a]);
    assert!(matches!(session.apply_rename(), Err(SessionError::NoPreview)));
    assert_eq!(fixture.file_names(), ["A.JPG"]);
}

#[test]
fn test_selection_change_invalidates_preview() {
    let fixture = TestFixture::new();
    let a = fixture.create_file("a.txt", "");
    let b = fixture.create_file("b.txt", "");

    let mut session = RenameSession::new();
    session.add_files([&a]);
    session.generate_preview(&RuleSet::default());
    session.add_files([&b]);
    assert!(session.preview().is_none());

    session.generate_preview(&RuleSet::default());
    session.clear();
    assert!(session.preview().is_none());
    assert!(session.is_empty());
}

#[test]
fn test_move_then_rename_needs_fresh_preview() {
    let fixture = TestFixture::new();
    let dest = fixture.create_subdir("out");
    let a = fixture.create_file("a.txt", "");

    let mut session = RenameSession::new();
    session.add_files([&a]);
    session.generate_preview(&RuleSet {
        case_conversion: CaseConversion::Upper,
        ..Default::default()
    });
    session.move_to(&dest, |_, _| {});

    assert!(matches!(session.apply_rename(), Err(SessionError::NoPreview)));
    assert!(dest.join("a.txt").exists());
}

#[cfg(target_os = "linux")]
#[test]
fn test_identity_rules_leave_non_utf8_name_alone() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fixture = TestFixture::new();
    let original = fixture.path().join(OsStr::from_bytes(b"caf\xe9.txt"));
    fs::write(&original, "data").unwrap();

    let mut session = RenameSession::new();
    session.add_files([&original]);
    session.generate_preview(&RuleSet::default());
    let result = session.apply_rename().expect("apply");

    assert_eq!(result.success_count, 0);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].reason.contains("not valid UTF-8"));
    assert!(original.exists());
    assert_eq!(fs::read_dir(fixture.path()).unwrap().count(), 1);
}

#[test]
fn test_numbered_rename_on_disk() {
    let fixture = TestFixture::new();
    let dir = fixture.create_subdir("shots");
    for name in ["c.png", "a.png", "b.png"] {
        fs::write(dir.join(name), name).unwrap();
    }

    let mut session = RenameSession::new();
    let filter = AppConfig::default().selection.compile().unwrap();
    session.add_folder(&dir, &filter).expect("scan");
    session.generate_preview(&RuleSet {
        template: "img_{n}".to_string(),
        start_number: 5,
        step_number: 10,
        ..Default::default()
    });
    let result = session.apply_rename().expect("apply");

    assert_eq!(result.success_count, 3);
    assert_eq!(fs::read_to_string(dir.join("img_5.png")).unwrap(), "a.png");
    assert_eq!(fs::read_to_string(dir.join("img_15.png")).unwrap(), "b.png");
    assert_eq!(fs::read_to_string(dir.join("img_25.png")).unwrap(), "c.png");
}

#[test]
fn test_invalid_regex_surfaces_as_preview_warning() {
    let fixture = TestFixture::new();
    let a = fixture.create_file("keep(me).txt", "");

    let mut session = RenameSession::new();
    session.add_files([&a]);
    let preview = session.generate_preview(&RuleSet {
        regex_remove: "(unclosed".to_string(),
        ..Default::default()
    });

    assert_eq!(preview.warnings.len(), 1);
    assert!(preview.warnings[0].to_string().contains("(unclosed"));
    assert_eq!(preview.entries[0].new_name, "keep(me).txt");
}

// ============================================================================
// 5. Configuration-driven folder scans
// ============================================================================

#[test]
fn test_folder_scan_uses_config_filters() {
    let fixture = TestFixture::new();
    let dir = fixture.create_subdir("mixed");
    for name in ["a.jpg", "b.JPG", "c.png", "d.tmp.jpg", ".hidden.jpg"] {
        fs::write(dir.join(name), "").unwrap();
    }
    fs::create_dir(dir.join("nested.jpg")).unwrap();

    let config = AppConfig::from_toml(
        r#"
        [selection]
        include_hidden = false
        extensions = ["jpg"]
        exclude_patterns = ["*.tmp.*"]
        "#,
    )
    .unwrap();
    let filter = config.selection.compile().unwrap();

    let mut session = RenameSession::new();
    let added = session.add_folder(&dir, &filter).expect("scan");

    assert_eq!(added, 2);
    let names: Vec<&str> = session.files().iter().map(|f| f.name()).collect();
    assert_eq!(names, ["a.jpg", "b.JPG"]);
}

#[test]
fn test_config_rules_drive_preview() {
    let fixture = TestFixture::new();
    let config_path = fixture.create_file(
        "batchren.toml",
        "[rules]\nfind = \"draft\"\nreplace = \"final\"\ncase_conversion = \"upper\"\n",
    );
    let config = AppConfig::load(Some(&config_path)).expect("config");
    let doc = fixture.create_file("draft.md", "");

    let mut session = RenameSession::new();
    session.add_files([&doc]);
    let preview = session.generate_preview(&config.rules);
    assert_eq!(preview.entries[0].new_name, "FINAL.MD");
}
