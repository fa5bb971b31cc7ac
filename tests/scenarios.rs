use paint_surface::{
    Applied, Color, EditorSettings, FillOutcome, MAX_HISTORY, NoOpReason, Session, SessionError,
    Snapshot, Tool,
};

const RED: Color = Color::rgb(255, 0, 0);

fn session(w: u32, h: u32) -> Session {
    let settings = EditorSettings {
        canvas_width: w,
        canvas_height: h,
        brush_size: 1.0,
        ..Default::default()
    };
    Session::new(&settings).unwrap()
}

fn all_pixels(s: &Session) -> Vec<Color> {
    let (w, h) = s.surface().dimensions();
    let mut out = Vec::new();
    for y in 0..h {
        for x in 0..w {
            out.push(s.surface().get_pixel(x, y).unwrap());
        }
    }
    out
}

/// Paint one pixel as a complete stroke gesture.
fn dab(s: &mut Session, x: u32, y: u32, color: Color) {
    s.begin_stroke(x as f32 + 0.5, y as f32 + 0.5, color, 1.0);
    s.end_stroke();
}

#[test]
fn fill_white_canvas_black_then_fill_again_is_no_op() {
    let mut s = session(3, 3);
    let out = s.request_fill(1, 1, Color::BLACK).unwrap();
    assert_eq!(out.filled_pixels(), 9);
    assert!(all_pixels(&s).iter().all(|c| *c == Color::BLACK));

    let before = s.surface().capture();
    let out = s.request_fill(1, 1, Color::BLACK).unwrap();
    assert_eq!(out, FillOutcome::Unchanged(NoOpReason::SameColor));
    assert_eq!(s.surface().capture(), before);
}

#[test]
fn fill_stops_at_one_pixel_wall() {
    let mut s = session(5, 4);
    s.begin_stroke(2.5, 0.5, Color::BLACK, 1.0);
    s.extend_stroke(2.5, 0.5, 2.5, 3.5, Color::BLACK, 1.0);
    s.end_stroke();

    s.request_fill(0, 2, RED).unwrap();
    for y in 0..4 {
        assert_eq!(s.surface().get_pixel(0, y).unwrap(), RED);
        assert_eq!(s.surface().get_pixel(1, y).unwrap(), RED);
        assert_eq!(s.surface().get_pixel(2, y).unwrap(), Color::BLACK);
        assert_eq!(s.surface().get_pixel(3, y).unwrap(), Color::WHITE);
        assert_eq!(s.surface().get_pixel(4, y).unwrap(), Color::WHITE);
    }
}

#[test]
fn undo_redo_then_commit_prunes_branch() {
    let mut s = session(1, 1);
    let colors = [Color::rgb(1, 0, 0), Color::rgb(2, 0, 0), Color::rgb(3, 0, 0)];
    for c in colors {
        dab(&mut s, 0, 0, c); // A, B, C
    }

    assert!(s.request_undo().unwrap());
    assert_eq!(s.surface().get_pixel(0, 0).unwrap(), colors[1]);
    assert!(s.request_undo().unwrap());
    assert_eq!(s.surface().get_pixel(0, 0).unwrap(), colors[0]);
    assert!(s.request_redo().unwrap());
    assert_eq!(s.surface().get_pixel(0, 0).unwrap(), colors[1]);

    let d = Color::rgb(4, 0, 0);
    dab(&mut s, 0, 0, d);
    // Seed + [A, B, D]
    let tail: Vec<Color> = s
        .history()
        .entries()
        .skip(1)
        .map(|snap| snap.pixel(0, 0).unwrap())
        .collect();
    assert_eq!(tail, vec![colors[0], colors[1], d]);

    assert!(!s.can_redo());
    assert!(!s.request_redo().unwrap());
    assert_eq!(s.surface().get_pixel(0, 0).unwrap(), d);
}

#[test]
fn commit_commit_undo_commit_leaves_no_redo() {
    let mut s = session(2, 2);
    dab(&mut s, 0, 0, Color::BLACK);
    dab(&mut s, 1, 0, Color::BLACK);
    s.request_undo().unwrap();
    s.request_fill(1, 1, RED).unwrap();
    assert!(!s.can_redo());
}

#[test]
fn n_undos_then_n_redos_restore_the_tip() {
    let n = MAX_HISTORY - 1;
    let mut s = session(4, 4);
    for i in 0..n {
        dab(&mut s, (i % 4) as u32, (i / 4 % 4) as u32, Color::rgb(i as u8, 7, 9));
    }
    let tip: Snapshot = s.surface().capture();

    for _ in 0..n {
        assert!(s.request_undo().unwrap());
    }
    assert!(!s.can_undo());
    assert!(all_pixels(&s).iter().all(|c| *c == Color::WHITE));

    for _ in 0..n {
        assert!(s.request_redo().unwrap());
    }
    assert!(!s.can_redo());
    assert_eq!(s.surface().capture(), tip);
}

#[test]
fn history_never_exceeds_the_limit() {
    let mut s = session(2, 2);
    for i in 0..(MAX_HISTORY + 20) {
        dab(&mut s, 0, 0, Color::rgb(i as u8, 0, 0));
        assert!(s.history().len() <= MAX_HISTORY);
    }
    assert_eq!(s.history().len(), MAX_HISTORY);

    let mut undos = 0;
    while s.request_undo().unwrap() {
        undos += 1;
    }
    assert_eq!(undos, MAX_HISTORY - 1);
    // Oldest retained state is the 21st dab (index 20).
    assert_eq!(s.surface().get_pixel(0, 0).unwrap(), Color::rgb(20, 0, 0));
}

#[test]
fn clear_and_resize_reset_history() {
    let mut s = session(3, 3);
    dab(&mut s, 1, 1, Color::BLACK);
    assert!(s.can_undo());

    assert_eq!(s.request_clear().unwrap(), Applied::Now);
    assert!(!s.can_undo());
    assert!(all_pixels(&s).iter().all(|c| *c == Color::WHITE));

    dab(&mut s, 1, 1, Color::BLACK);
    s.request_resize(5, 2).unwrap();
    assert_eq!(s.surface().dimensions(), (5, 2));
    assert_eq!(s.history().len(), 1);
    assert!(!s.can_undo());
    assert!(!s.request_undo().unwrap());
}

#[test]
fn import_draws_at_origin_and_resets_history() {
    let png = red_square_png();

    let mut s = session(4, 3);
    dab(&mut s, 3, 2, Color::BLACK);
    assert_eq!(s.request_import(&png).unwrap(), Applied::Now);

    assert_eq!(s.surface().dimensions(), (4, 3));
    assert_eq!(s.surface().get_pixel(0, 0).unwrap(), RED);
    assert_eq!(s.surface().get_pixel(1, 1).unwrap(), RED);
    assert_eq!(s.surface().get_pixel(2, 0).unwrap(), Color::WHITE);
    assert_eq!(s.surface().get_pixel(3, 2).unwrap(), Color::BLACK);
    assert_eq!(s.history().len(), 1);
}

fn red_square_png() -> Vec<u8> {
    let mut src = session(2, 2);
    src.request_fill(0, 0, RED).unwrap();
    src.export_raster().unwrap()
}

#[test]
fn queued_replacements_run_in_request_order() {
    let png = red_square_png();
    let mut s = session(4, 3);
    s.begin_stroke(3.5, 2.5, Color::BLACK, 1.0);
    assert_eq!(s.request_clear().unwrap(), Applied::Queued);
    assert_eq!(s.request_import(&png).unwrap(), Applied::Queued);
    assert_eq!(s.request_resize(3, 2).unwrap(), Applied::Queued);
    assert_eq!(s.pending_replacements(), 3);
    assert_eq!(s.surface().dimensions(), (4, 3));

    s.end_stroke();
    assert_eq!(s.pending_replacements(), 0);
    // The resize ran last and reallocated over the imported square.
    assert_eq!(s.surface().dimensions(), (3, 2));
    assert!(all_pixels(&s).iter().all(|c| *c == Color::WHITE));
    assert_eq!(s.history().len(), 1);
    assert_eq!(s.history().current(), &s.surface().capture());
    assert!(!s.can_undo());
    assert!(!s.can_redo());
}

#[test]
fn queued_import_after_resize_lands_on_the_new_surface() {
    let png = red_square_png();
    let mut s = session(4, 3);
    s.begin_stroke(3.5, 2.5, Color::BLACK, 1.0);
    s.request_clear().unwrap();
    s.request_resize(3, 2).unwrap();
    s.request_import(&png).unwrap();
    s.end_stroke();

    assert_eq!(s.surface().dimensions(), (3, 2));
    for y in 0..2 {
        assert_eq!(s.surface().get_pixel(0, y).unwrap(), RED);
        assert_eq!(s.surface().get_pixel(1, y).unwrap(), RED);
        assert_eq!(s.surface().get_pixel(2, y).unwrap(), Color::WHITE);
    }
    assert_eq!(s.history().len(), 1);
    assert_eq!(s.history().current(), &s.surface().capture());
    assert!(!s.can_undo());
}

#[test]
fn failed_import_leaves_everything_intact() {
    let mut s = session(3, 3);
    dab(&mut s, 1, 1, Color::BLACK);
    let before = s.surface().capture();
    let err = s.request_import(b"not an image").unwrap_err();
    assert!(matches!(
        err,
        SessionError::Raster(paint_surface::RasterError::InvalidImportSource(_))
    ));
    assert_eq!(s.surface().capture(), before);
    assert_eq!(s.history().len(), 2);
    assert!(s.can_undo());
}

#[test]
fn export_is_a_pure_read() {
    let mut s = session(3, 2);
    dab(&mut s, 2, 1, RED);
    let len = s.history().len();
    let bytes = s.export_raster().unwrap();
    assert_eq!(s.history().len(), len);

    let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(&decoded, s.surface().as_image());
}

#[test]
fn pointer_gestures_follow_the_active_tool() {
    let mut s = session(6, 6);
    s.set_brush_color(RED);

    s.pointer_down(0.5, 0.5).unwrap();
    s.pointer_move(5.5, 0.5);
    s.pointer_move(5.5, 5.5);
    s.pointer_up();
    assert_eq!(s.surface().get_pixel(3, 0).unwrap(), RED);
    assert_eq!(s.surface().get_pixel(5, 3).unwrap(), RED);
    assert_eq!(s.history().len(), 2);

    // Releasing again without a gesture commits nothing.
    s.pointer_up();
    assert_eq!(s.history().len(), 2);

    s.select_tool(Tool::Fill);
    s.set_brush_color(Color::BLACK);
    s.pointer_down(0.2, 5.9).unwrap();
    s.pointer_up();
    assert_eq!(s.surface().get_pixel(0, 5).unwrap(), Color::BLACK);
    assert_eq!(s.surface().get_pixel(5, 5).unwrap(), RED);
    assert_eq!(s.history().len(), 3);
}
