use super::*;

#[test]
fn animate_header_single_line() {
    let buf = CodeBuffer::parse("# !!animate\nprint(1)\n").unwrap();
    assert_eq!(buf.render_mode(), RenderMode::Animate);
    assert_eq!(buf.start_offset(), 0);
    assert_eq!(buf.code(), "print(1)\n\u{a0}");
    assert_eq!(buf.char_len(), 10);
}

#[test]
fn header_without_marker_defaults_to_image_and_is_not_rendered() {
    let buf = CodeBuffer::parse("#!/usr/bin/env python\nx = 1\n").unwrap();
    assert_eq!(buf.render_mode(), RenderMode::Image);
    assert_eq!(buf.code(), "x = 1\n\u{a0}");

    let buf = CodeBuffer::parse("# !!image\nx = 1").unwrap();
    assert_eq!(buf.render_mode(), RenderMode::Image);
    assert_eq!(buf.code(), "x = 1\u{a0}");
}

#[test]
fn unknown_render_mode_is_rejected() {
    let err = CodeBuffer::parse("# !!slideshow\nx = 1\n").unwrap_err();
    assert!(matches!(err, CassetteError::Directive(_)));
}

#[test]
fn directive_lines_are_removed_and_start_is_counted_over_kept_lines() {
    let raw = "# !!animate\na = 1\n# !!ignore\nb = 2\n# !!start\nc = 3\n";
    let buf = CodeBuffer::parse(raw).unwrap();
    assert_eq!(buf.code(), "a = 1\nb = 2\nc = 3\n\u{a0}");
    assert_eq!(buf.start_offset(), "a = 1\nb = 2\n".chars().count());
    assert_eq!(buf.prefix(buf.start_offset()), "a = 1\nb = 2\n");
}

#[test]
fn output_length_accounts_for_directives_and_sentinel() {
    let header = "# !!animate\n";
    let body = "import os\n# !!ignore\nsetup()  # !!ignore\n# !!start\nmain()\n";
    let buf = CodeBuffer::parse(&format!("{header}{body}")).unwrap();

    let directive_chars: usize = body
        .split_inclusive('\n')
        .filter(|l| l.contains(DIRECTIVE_MARKER))
        .map(|l| l.chars().count())
        .sum();
    assert_eq!(
        buf.char_len(),
        body.chars().count() - directive_chars + 1
    );
    assert_eq!(buf.start_offset(), "import os\n".len());
}

#[test]
fn start_offset_ignores_preceding_ignored_lines() {
    let with_ignores = "# !!animate\n# !!ignore\nx = 1\n# !!ignore\n# !!ignore\n# !!start\ny = 2\n";
    let without = "# !!animate\nx = 1\n# !!start\ny = 2\n";
    let a = CodeBuffer::parse(with_ignores).unwrap();
    let b = CodeBuffer::parse(without).unwrap();
    assert_eq!(a.start_offset(), 6);
    assert_eq!(a, b);
}

#[test]
fn last_start_directive_wins_and_unknown_directives_are_dropped() {
    let raw = "# !!animate\na\n# !!start\nb\n# !!bogus\nc\n# !!start\nd\n";
    let buf = CodeBuffer::parse(raw).unwrap();
    assert_eq!(buf.code(), "a\nb\nc\nd\n\u{a0}");
    assert_eq!(buf.start_offset(), 6);
}

#[test]
fn crlf_input_is_normalized() {
    let buf = CodeBuffer::parse("# !!animate\r\nx = 1\r\n# !!start\r\ny\r\n").unwrap();
    assert_eq!(buf.render_mode(), RenderMode::Animate);
    assert_eq!(buf.code(), "x = 1\ny\n\u{a0}");
    assert_eq!(buf.start_offset(), 6);
}

#[test]
fn empty_input_still_has_sentinel() {
    let buf = CodeBuffer::parse("").unwrap();
    assert_eq!(buf.code(), "\u{a0}");
    assert_eq!(buf.char_len(), 1);
    assert_eq!(buf.prefix(0), "");
}

#[test]
fn prefix_counts_characters_not_bytes() {
    let buf = CodeBuffer::parse("# !!animate\ns = \"héllo→\"\n").unwrap();
    assert_eq!(buf.prefix(6), "s = \"h");
    assert_eq!(buf.prefix(7), "s = \"hé");
    assert_eq!(buf.prefix(12), "s = \"héllo→\"");
    assert_eq!(buf.prefix(usize::MAX), buf.code());
}

#[test]
fn render_mode_round_trips_through_display() {
    for mode in [RenderMode::Image, RenderMode::Animate] {
        assert_eq!(mode.to_string().parse::<RenderMode>().unwrap(), mode);
    }
}

#[test]
fn unreadable_file_is_a_file_read_error() {
    let err = read_code_file(Path::new("no/such/input.py")).unwrap_err();
    assert!(matches!(err, CassetteError::FileRead { .. }));
}
