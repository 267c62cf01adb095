//! Tests for writing forcing files to disk.

use std::fs;

use forcing_common::{ExtractedPoint, Shift};
use forcing_writer::{write, Header, OutputFormat, WriterError, DEFAULT_DT};
use test_utils::extracted_step;

fn two_steps() -> Vec<Vec<ExtractedPoint>> {
    vec![extracted_step(&[0.5, 1.25]), extracted_step(&[2.0, 0.0])]
}

#[test]
fn test_block_file_matches_expected_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rain.txt");

    write(
        &[vec![ExtractedPoint::new(5.4, 100.2, 200.7)]],
        "#\n",
        &path,
        None,
        DEFAULT_DT,
        OutputFormat::Block,
    )
    .unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec!["#", "0. 3600. 1", "100. 201. 5."]);
    assert!(text.ends_with('\n'));
}

#[test]
fn test_columnar_file_with_shift() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rain.csv");

    write(
        &two_steps(),
        Header::Minimal.text(),
        &path,
        Some(Shift::new(500.0, -100.0)),
        1800,
        OutputFormat::Columnar,
    )
    .unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        "\n#\n2,2\n-500,100\n500,100\n0,0.50,1.25\n1800,2.00,0.00\n"
    );
}

#[test]
fn test_radar_header_is_written_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("radar.txt");

    write(&two_steps(), Header::Radar.text(), &path, None, DEFAULT_DT, OutputFormat::Block).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with(Header::Radar.text()));
    assert!(text[Header::Radar.text().len()..].starts_with("0. 3600. 2\n"));
}

#[test]
fn test_identical_writes_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.txt");
    let second = dir.path().join("second.txt");

    for path in [&first, &second] {
        write(&two_steps(), "#\n", path, None, DEFAULT_DT, OutputFormat::Block).unwrap();
    }
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_existing_file_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rain.txt");
    fs::write(&path, "stale content that is much longer than the new file\n".repeat(20)).unwrap();

    write(&[Vec::new()], "", &path, None, DEFAULT_DT, OutputFormat::Block).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "0. 3600. 0\n");
}

#[cfg(unix)]
#[test]
fn test_new_file_gets_default_create_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rain.txt");
    // A plain create in the same process shows the mode the umask allows
    let reference = dir.path().join("reference.txt");
    fs::write(&reference, "").unwrap();
    let expected = fs::metadata(&reference).unwrap().permissions().mode() & 0o777;

    write(&two_steps(), "#\n", &path, None, DEFAULT_DT, OutputFormat::Block).unwrap();
    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, expected, "got {:o}, plain create gives {:o}", mode, expected);
}

#[cfg(unix)]
#[test]
fn test_replaced_file_keeps_its_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rain.txt");
    fs::write(&path, "previous\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

    write(&two_steps(), "#\n", &path, None, DEFAULT_DT, OutputFormat::Block).unwrap();
    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o640);
    assert_ne!(fs::read_to_string(&path).unwrap(), "previous\n");
}

#[test]
fn test_failed_write_leaves_target_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rain.txt");
    fs::write(&path, "previous\n").unwrap();

    let misaligned = vec![extracted_step(&[1.0, 2.0]), extracted_step(&[1.0])];
    let err = write(&misaligned, "", &path, None, DEFAULT_DT, OutputFormat::Columnar);

    assert!(matches!(err, Err(WriterError::MisalignedSeries(_))));
    assert_eq!(fs::read_to_string(&path).unwrap(), "previous\n");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_empty_series_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rain.txt");
    let err = write(&[], "", &path, None, DEFAULT_DT, OutputFormat::Block);
    assert!(matches!(err, Err(WriterError::EmptySeries)));
    assert!(!path.exists());
}
