use super::*;
use crate::text::wrap::wrap_words;

fn style(size_px: f32, bold: bool) -> TextStyle {
    TextStyle {
        size_px,
        bold,
        color: Rgba8::rgb(255, 255, 255),
    }
}

#[test]
fn block_face_measures_fixed_advance() {
    let mut face = BlockFace::default();
    assert_eq!(face.measure("", &style(48.0, false)), 0.0);
    assert_eq!(face.measure("abc", &style(10.0, false)), 18.0);
    assert_eq!(face.measure("a c", &style(10.0, true)), 18.0);
}

#[test]
fn styled_measure_drives_wrap() {
    let mut face = BlockFace { advance_em: 1.0 };
    let mut m = StyledMeasure::new(&mut face, style(10.0, false));
    let lines = wrap_words("aa bb cc", 50.0, &mut m);
    let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["aa bb", "cc"]);
}

#[test]
fn block_face_fills_visible_glyphs_only() {
    let mut face = BlockFace { advance_em: 1.0 };
    let mut ctx = vello_cpu::RenderContext::new(40, 20);
    face.fill_line(&mut ctx, "a b", &style(10.0, true), 0.0, 15.0)
        .unwrap();
    let mut pixmap = vello_cpu::Pixmap::new(40, 20);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);

    let px = |x: usize, y: usize| pixmap.data_as_u8_slice()[(y * 40 + x) * 4 + 3];
    // Center of the first and third cell is inked, the space cell is not.
    assert_eq!(px(5, 12), 255);
    assert_eq!(px(15, 12), 0);
    assert_eq!(px(25, 12), 255);
    // Nothing beyond the line.
    assert_eq!(px(35, 12), 0);
}

#[test]
fn parley_face_rejects_non_font_bytes() {
    let err = ParleyFace::from_bytes(b"definitely not a font".to_vec())
        .err()
        .unwrap();
    assert!(matches!(err, ReelError::Render(_)));
}

#[test]
fn parley_face_missing_file_is_render_error() {
    let err = ParleyFace::from_path("no/such/font.ttf").err().unwrap();
    assert!(matches!(err, ReelError::Render(_)));
}

const SYSTEM_FONT_PAIRS: &[(&str, &str)] = &[
    (
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    ),
];

/// Regular and bold bytes of the first installed font pair, if any.
fn system_font_pair() -> Option<(Vec<u8>, Vec<u8>)> {
    SYSTEM_FONT_PAIRS.iter().find_map(|(regular, bold)| {
        let regular = std::fs::read(regular).ok()?;
        let bold = std::fs::read(bold).ok()?;
        Some((regular, bold))
    })
}

/// Inclusive bounding box `(x0, y0, x1, y1)` of every pixel with non-zero alpha.
fn ink_bounds(pixmap: &vello_cpu::Pixmap) -> Option<(u32, u32, u32, u32)> {
    let w = u32::from(pixmap.width());
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (i, px) in pixmap.data_as_u8_slice().chunks_exact(4).enumerate() {
        if px[3] == 0 {
            continue;
        }
        let (x, y) = (i as u32 % w, i as u32 / w);
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds
}

#[test]
fn parley_face_ink_stays_within_measured_advance() {
    let Some((regular, _)) = system_font_pair() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let mut face = ParleyFace::from_bytes(regular).unwrap();
    let st = style(32.0, false);
    let (x, baseline) = (20.0, 60.0);

    let m = face.measure("Hello world", &st);
    assert!(m > 0.0 && x + f64::from(m) < 400.0, "{m}");

    let mut ctx = vello_cpu::RenderContext::new(400, 100);
    face.fill_line(&mut ctx, "Hello world", &st, x, baseline)
        .unwrap();
    let mut pixmap = vello_cpu::Pixmap::new(400, 100);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);

    let (x0, y0, x1, y1) = ink_bounds(&pixmap).expect("line drew no ink");
    assert!(f64::from(x0) >= x.floor(), "ink starts at {x0}");
    assert!(
        f64::from(x1 + 1) <= (x + f64::from(m)).ceil(),
        "ink ends at {x1}, advance ends at {}",
        x + f64::from(m)
    );
    // No descenders: the ink bottoms out on the baseline (round glyphs may overshoot by a pixel).
    assert!(f64::from(y1) >= baseline - 2.0 && f64::from(y1) <= baseline, "ink bottom {y1}");
    assert!(f64::from(y0) >= baseline - 32.0, "ink top {y0}");
}

#[test]
fn parley_face_bold_style_uses_registered_bold_face() {
    let Some((regular, bold)) = system_font_pair() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let face = ParleyFace::from_bytes(regular).unwrap();
    let bold_style = style(32.0, true);
    assert!(std::ptr::eq(face.face_for(&bold_style), &face.regular));

    let mut face = face.with_bold_bytes(bold).unwrap();
    assert!(std::ptr::eq(
        face.face_for(&bold_style),
        face.bold.as_ref().unwrap()
    ));
    assert!(std::ptr::eq(face.face_for(&style(32.0, false)), &face.regular));

    let regular_w = face.measure("Hello world", &style(32.0, false));
    let bold_w = face.measure("Hello world", &bold_style);
    assert!(bold_w > regular_w, "bold {bold_w} vs regular {regular_w}");
}
