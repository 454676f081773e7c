//! End-to-end behavior of the font test window, driven through the headless host.

use std::time::{Duration, Instant};

use glyphsize::app::{DEFAULT_FONT_SIZE, FontTestApp, GLYPH_TEXT, REPEAT_INTERVAL};
use glyphsize::draw::{DrawCommand, Frame};
use glyphsize::ui::click::ButtonId;
use glyphsize::ui::host::{Host, HostConfig, WindowState};

fn pushed() -> (Host<FontTestApp>, Instant) {
    let mut host = Host::new(FontTestApp::new(), HostConfig::default());
    let t0 = Instant::now();
    host.push_window(false, t0);
    (host, t0)
}

fn press(host: &mut Host<FontTestApp>, button: ButtonId, now: Instant) {
    host.button_down(button, now);
    host.button_up(button, now);
}

fn label(frame: &Frame) -> Vec<&str> {
    frame.texts().collect()
}

fn em_heights(frame: &Frame) -> Vec<i32> {
    frame.glyph_runs().map(|r| r.em_height).collect()
}

#[test]
fn first_paint_shows_the_default_size() {
    let (mut host, t0) = pushed();
    let frame = host.paint(t0).expect("window is pushed");
    assert_eq!(label(&frame), vec!["50"]);
    assert_eq!(em_heights(&frame), vec![DEFAULT_FONT_SIZE]);
    assert!(!host.needs_paint(), "label refresh is absorbed by the same pass");
}

#[test]
fn up_once_grows_to_51() {
    let (mut host, t0) = pushed();
    host.paint(t0);
    press(&mut host, ButtonId::Up, t0);
    assert!(host.needs_paint());

    let frame = host.paint(t0).unwrap();
    assert_eq!(label(&frame), vec!["51"]);
    assert_eq!(em_heights(&frame), vec![51]);
}

#[test]
fn down_51_times_goes_negative() {
    let (mut host, t0) = pushed();
    for i in 0..51 {
        press(&mut host, ButtonId::Down, t0 + Duration::from_millis(i));
    }
    assert_eq!(host.handler().font_size(), Some(-1));

    let frame = host.paint(t0).unwrap();
    assert_eq!(label(&frame), vec!["-1"]);
    assert_eq!(em_heights(&frame), vec![-1]);
}

#[test]
fn label_tracks_the_running_sum() {
    let (mut host, t0) = pushed();
    let presses = [
        ButtonId::Up,
        ButtonId::Up,
        ButtonId::Down,
        ButtonId::Up,
        ButtonId::Down,
        ButtonId::Down,
        ButtonId::Down,
        ButtonId::Up,
        ButtonId::Up,
        ButtonId::Up,
    ];
    let mut expected = DEFAULT_FONT_SIZE;
    for (i, button) in presses.into_iter().enumerate() {
        let now = t0 + Duration::from_millis(10 * i as u64);
        press(&mut host, button, now);
        expected += if button == ButtonId::Up { 1 } else { -1 };

        let frame = host.paint(now).unwrap();
        assert_eq!(label(&frame), vec![expected.to_string().as_str()]);
        assert_eq!(em_heights(&frame), vec![expected]);
    }
}

#[test]
fn drawn_string_is_always_ab1() {
    let (mut host, t0) = pushed();
    for i in 0..60 {
        let frame = host.paint(t0).unwrap();
        assert!(frame.glyph_runs().all(|r| r.text == GLYPH_TEXT));
        if i < 55 {
            press(&mut host, ButtonId::Down, t0);
        } else {
            press(&mut host, ButtonId::Up, t0);
        }
    }
    assert_eq!(host.handler().font_size(), Some(0));
    let frame = host.paint(t0).unwrap();
    assert_eq!(frame.glyph_runs().map(|r| r.text.as_str()).collect::<Vec<_>>(), [GLYPH_TEXT]);
}

#[test]
fn one_fill_per_draw_callback() {
    let (mut host, t0) = pushed();
    for _ in 0..3 {
        let frame = host.paint(t0).unwrap();
        let fills = frame
            .commands()
            .filter(|c| matches!(c, DrawCommand::Fill { .. }))
            .count();
        assert_eq!(fills, 1);
        press(&mut host, ButtonId::Up, t0);
    }
}

#[test]
fn holding_repeats_one_plus_n_times() {
    let (mut host, t0) = pushed();
    let n = 7;
    host.button_down(ButtonId::Up, t0);
    for step in 1..=n {
        host.tick(t0 + REPEAT_INTERVAL * step);
    }
    host.button_up(ButtonId::Up, t0 + REPEAT_INTERVAL * n);
    assert_eq!(host.handler().font_size(), Some(DEFAULT_FONT_SIZE + 1 + n as i32));

    // Released: nothing more fires.
    host.tick(t0 + REPEAT_INTERVAL * (n + 5));
    assert_eq!(host.handler().font_size(), Some(DEFAULT_FONT_SIZE + 1 + n as i32));
}

#[test]
fn load_then_unload_leaves_only_the_root() {
    let (mut host, _) = pushed();
    assert_eq!(host.layers().live_count(), 3);
    host.pop_window();
    assert_eq!(host.state(), WindowState::Unloaded);
    assert_eq!(host.layers().live_count(), 1);
    assert!(host.layers().contains(host.root_layer()));
    assert_eq!(host.handler().font_size(), None);
}

#[test]
fn pushing_again_registers_a_new_font_and_keeps_the_old_one() {
    let (mut host, t0) = pushed();
    let first = host.paint(t0).unwrap().glyph_runs().map(|r| r.font).collect::<Vec<_>>();
    host.pop_window();
    host.push_window(false, t0);
    let second = host.paint(t0).unwrap().glyph_runs().map(|r| r.font).collect::<Vec<_>>();

    assert_eq!(host.fonts().len(), 3);
    assert_ne!(first, second);
    assert_eq!(host.fonts().resource(first[0]), host.fonts().resource(second[0]));
}

#[test]
fn back_pops_and_deinit_destroys() {
    let (mut host, t0) = pushed();
    press(&mut host, ButtonId::Back, t0);
    assert!(!host.is_running());
    assert!(host.paint(t0).is_none());

    host.deinit();
    assert_eq!(host.state(), WindowState::Destroyed);
    assert_eq!(host.layers().live_count(), 0);
}

#[test]
fn animated_push_still_paints_the_content() {
    let mut host = Host::new(FontTestApp::new(), HostConfig::default());
    let t0 = Instant::now();
    host.push_window(true, t0);

    let first = host.paint(t0).unwrap();
    assert!(first.offset_x > 0.0);
    assert_eq!(label(&first), vec!["50"]);

    let settled = host.paint(t0 + Duration::from_secs(1)).unwrap();
    assert_eq!(settled.offset_x, 0.0);
    assert!(!host.needs_paint());
}
