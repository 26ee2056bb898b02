use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CassetteError::writer_open("x")
            .to_string()
            .contains("failed to open video writer:")
    );
    assert!(
        CassetteError::config("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(
        CassetteError::directive("x")
            .to_string()
            .contains("directive error:")
    );
    assert!(CassetteError::render("x").to_string().contains("render error:"));
    assert!(CassetteError::encode("x").to_string().contains("encode error:"));
    assert!(CassetteError::media("x").to_string().contains("media error:"));
    assert_eq!(
        CassetteError::WriterClosed.to_string(),
        "video writer is already released"
    );
}

#[test]
fn file_read_names_the_path() {
    let err = CassetteError::file_read(
        "missing/input.py",
        std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
    );
    let msg = err.to_string();
    assert!(msg.contains("missing/input.py"));
    assert!(msg.contains("no such file"));
}

#[test]
fn shape_mismatch_reports_both_shapes() {
    let err = CassetteError::FrameShapeMismatch {
        got: FrameShape::new(49, 100),
        expected: FrameShape::new(50, 100),
    };
    assert_eq!(
        err.to_string(),
        "frame shape mismatch: got 49x100, expected 50x100"
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CassetteError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
