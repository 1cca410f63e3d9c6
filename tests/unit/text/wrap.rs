use super::*;

fn mono(advance_px: f32) -> MonospaceMetrics {
    MonospaceMetrics { advance_px }
}

fn texts(lines: &[WrappedLine]) -> Vec<&str> {
    lines.iter().map(|l| l.text.as_str()).collect()
}

#[test]
fn packs_words_greedily() {
    // 10 px per char, 100 px max => at most 10 chars per line.
    let lines = wrap_words("Get Acme today and save big", 100.0, &mut mono(10.0));
    assert_eq!(texts(&lines), vec!["Get Acme", "today and", "save big"]);
    assert_eq!(lines[0].width, 80.0);
}

#[test]
fn separating_space_is_counted() {
    // "aaaa bbbbb" is exactly 10 chars and fits; one more char does not.
    let lines = wrap_words("aaaa bbbbb", 100.0, &mut mono(10.0));
    assert_eq!(texts(&lines), vec!["aaaa bbbbb"]);
    let lines = wrap_words("aaaa bbbbbb", 100.0, &mut mono(10.0));
    assert_eq!(texts(&lines), vec!["aaaa", "bbbbbb"]);
}

#[test]
fn oversized_word_is_emitted_alone_unbroken() {
    let lines = wrap_words("hi incomprehensibilities ok", 50.0, &mut mono(10.0));
    assert_eq!(texts(&lines), vec!["hi", "incomprehensibilities", "ok"]);
    assert!(lines[1].width > 50.0);
}

#[test]
fn no_line_exceeds_max_width_unless_single_word() {
    let text = "Introducing the all new Acme rocket skates with turbo boost and unbelievably \
                comfortable padding for every coyote on the go";
    for max in [40.0f32, 90.0, 150.0, 333.0, 1000.0] {
        let lines = wrap_words(text, max, &mut mono(7.0));
        for l in &lines {
            let single_word = !l.text.contains(' ');
            assert!(l.width <= max || single_word, "{max}: {:?}", l);
        }
        let rejoined = texts(&lines).join(" ");
        assert_eq!(rejoined, text.split_whitespace().collect::<Vec<_>>().join(" "));
    }
}

#[test]
fn empty_and_whitespace_text_yield_no_lines() {
    assert!(wrap_words("", 100.0, &mut mono(10.0)).is_empty());
    assert!(wrap_words("   \t\n ", 100.0, &mut mono(10.0)).is_empty());
    assert!(layout_block("  ", 100.0, &mut mono(10.0), 490.0, 60.0).is_empty());
}

#[test]
fn collapses_runs_of_whitespace() {
    let lines = wrap_words("  Get   Acme\ttoday ", 1000.0, &mut mono(10.0));
    assert_eq!(texts(&lines), vec!["Get Acme today"]);
}

#[test]
fn wrapping_is_idempotent() {
    let text = "Fast. Reliable. Acme.";
    let a = wrap_words(text, 80.0, &mut mono(9.0));
    let b = wrap_words(text, 80.0, &mut mono(9.0));
    assert_eq!(a, b);
}

#[test]
fn layout_block_centers_lines_on_anchor() {
    let one = layout_block("Acme", 1000.0, &mut mono(10.0), 490.0, 60.0);
    assert_eq!(one.lines.len(), 1);
    assert_eq!(one.lines[0].baseline_y, 490.0);

    let three = layout_block("aaaa bbbb cccc", 40.0, &mut mono(10.0), 490.0, 60.0);
    let ys: Vec<f32> = three.lines.iter().map(|l| l.baseline_y).collect();
    assert_eq!(ys, vec![430.0, 490.0, 550.0]);
}
