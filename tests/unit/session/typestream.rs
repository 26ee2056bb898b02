use super::*;
use crate::encode::sink::InMemorySink;
use crate::foundation::core::FrameShape;
use crate::test_support::{GridRasterizer, small_config};

fn stream<'a>(raw: &str, config: &'a Config) -> TypeStream<'a> {
    let code = CodeBuffer::parse(raw).unwrap();
    TypeStream::from_buffer(code, PathBuf::from("unused"), config)
}

fn animate(raw: &str) -> (AnimationStats, InMemorySink) {
    let config = small_config();
    let raster = GridRasterizer::new();
    let renderer = FrameRenderer::new(&config, &raster, None);
    let mut sink = InMemorySink::new(renderer.frame_shape());
    let stats = stream(raw, &config).animate_into(&renderer, &mut sink).unwrap();
    (stats, sink)
}

#[test]
fn one_frame_per_character_including_sentinel() {
    let (stats, sink) = animate("# !!animate\nprint(1)\n");
    assert_eq!(stats.steps, 10);
    assert_eq!(stats.frames_written, 10);
    assert_eq!(stats.frames_skipped, 0);
    assert_eq!(sink.frames().len(), 10);
    assert!(sink.is_released());
    let shape = small_config().em_shape();
    assert!(sink.frames().iter().all(|f| FrameShape::of(f) == shape));
}

#[test]
fn prefixes_ending_in_indentation_are_skipped() {
    // "if x:\n    y\n" + sentinel: prefixes of length 7..=10 end in 1..=4 spaces.
    let (stats, sink) = animate("# !!animate\nif x:\n    y\n");
    assert_eq!(stats.steps, 13);
    assert_eq!(stats.frames_skipped, 4);
    assert_eq!(stats.frames_written, 9);
    assert_eq!(sink.frames().len(), 9);
}

#[test]
fn animation_starts_at_start_directive() {
    let raw = "# !!animate\na = 1\n# !!start\nb = 2\n";
    let config = small_config();
    let raster = GridRasterizer::new();
    let renderer = FrameRenderer::new(&config, &raster, None);
    let mut sink = InMemorySink::new(renderer.frame_shape());
    let ts = stream(raw, &config);
    assert_eq!(ts.code().start_offset(), 6);

    let stats = ts.animate_into(&renderer, &mut sink).unwrap();
    assert_eq!(stats.steps, 7);
    assert_eq!(stats.frames_written, 7);

    let first = renderer.render("a = 1\n\u{258C}").unwrap();
    assert_eq!(sink.frames()[0], first);
}

#[test]
fn frames_show_cumulative_text_with_caret() {
    let raw = "# !!animate\nab\ncd\n";
    let config = small_config();
    let raster = GridRasterizer::new();
    let renderer = FrameRenderer::new(&config, &raster, None);
    let mut sink = InMemorySink::new(renderer.frame_shape());
    let ts = stream(raw, &config);
    ts.animate_into(&renderer, &mut sink).unwrap();

    let last = sink.frames().last().unwrap();
    let expected = renderer.render("ab\ncd\n\u{258C}").unwrap();
    assert_eq!(*last, expected);
    assert_eq!(raster.calls(), sink.frames().len() + 1);
}

#[test]
fn render_errors_stop_the_animation() {
    let config = small_config();
    let raster = GridRasterizer::new();
    let renderer = FrameRenderer::new(&config, &raster, None);
    // Sink expecting the wrong shape rejects the first frame.
    let mut sink = InMemorySink::new(FrameShape::new(2, 2));
    let err = stream("# !!animate\nx\n", &config)
        .animate_into(&renderer, &mut sink)
        .unwrap_err();
    assert!(matches!(err, CassetteError::FrameShapeMismatch { .. }));
    assert!(!sink.is_released());
}

#[test]
fn indentation_rule_only_looks_at_last_line() {
    assert!(is_indent_only_tail("def f():\n    "));
    assert!(is_indent_only_tail(" "));
    assert!(!is_indent_only_tail(""));
    assert!(!is_indent_only_tail("x\n"));
    assert!(!is_indent_only_tail("    x"));
    assert!(!is_indent_only_tail("    \nx"));
    assert!(!is_indent_only_tail("\t"));
}

#[test]
fn image_mode_writes_png_named_after_input() {
    let dir = std::env::temp_dir().join(format!("cassette_typestream_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let input = dir.join("demo.py");
    std::fs::write(&input, "# title\nprint('hi')\n").unwrap();

    let config = small_config();
    let raster = GridRasterizer::new();
    let ts = TypeStream::new(&input, &dir.join("out"), &config).unwrap();
    assert_eq!(ts.stem(), dir.join("out").join("demo_py"));

    let outcome = ts.run(&raster, None).unwrap();
    let path = dir.join("out").join("demo_py.png");
    assert_eq!(outcome, RunOutcome::Image { path: path.clone() });
    let img = image::open(&path).unwrap();
    assert_eq!((img.width(), img.height()), config.em_size());
    assert_eq!(raster.calls(), 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_input_is_a_read_error() {
    let config = small_config();
    let err = TypeStream::new(Path::new("/nonexistent/cassette.py"), Path::new("out"), &config)
        .unwrap_err();
    assert!(matches!(err, CassetteError::FileRead { .. }));
}
