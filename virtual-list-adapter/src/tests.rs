use crate::*;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use virtual_list::{BatchConfig, Navigation, ScrollInput, VirtualListOptions};

const ROW: u32 = 16;
const ROWS: usize = 1024;

type TextController = Controller<TextSurface, TextItem<usize>>;

fn text_items(count: usize) -> Vec<TextItem<usize>> {
    (0..count).map(|i| TextItem::new(i, ROW)).collect()
}

fn controller_with(options: VirtualListOptions, viewport: i32) -> TextController {
    let mut c = Controller::new(TextSurface::new(), options);
    c.list_mut().set_items(text_items(ROWS), ROWS);
    c.handle(InputEvent::Resize { height: viewport }, 0);
    c.flush(0);
    c
}

fn controller(viewport: i32) -> TextController {
    controller_with(VirtualListOptions::new(ROW).with_buffer_items(2), viewport)
}

fn lines(c: &TextController) -> Vec<String> {
    render_visible(c.list())
}

#[test]
fn wheel_deltas_normalize_to_notches() {
    assert_eq!(wheel_notches(0), 0);
    assert_eq!(wheel_notches(120), -1);
    assert_eq!(wheel_notches(-120), 1);
    assert_eq!(wheel_notches(-360), 3);
    // High-resolution wheels report fractions of a notch.
    assert_eq!(wheel_notches(30), -1);
    assert_eq!(wheel_notches(-1), 1);
    assert!(wheel_notches(i32::MIN) > 0);

    assert_eq!(x11_button_notches(X11_WHEEL_UP), Some(-1));
    assert_eq!(x11_button_notches(X11_WHEEL_DOWN), Some(1));
    assert_eq!(x11_button_notches(1), None);
}

#[test]
fn events_map_to_scroll_inputs_and_navigation() {
    assert_eq!(InputEvent::Wheel { delta: 0 }.scroll_input(), None);
    assert_eq!(
        InputEvent::Wheel { delta: -240 }.scroll_input(),
        Some(ScrollInput::Wheel(2))
    );
    assert_eq!(
        InputEvent::WheelButton(X11_WHEEL_UP).scroll_input(),
        Some(ScrollInput::Wheel(-1))
    );
    assert_eq!(InputEvent::WheelButton(2).scroll_input(), None);
    assert_eq!(
        InputEvent::ScrollbarMoveTo(0.25).scroll_input(),
        Some(ScrollInput::MoveTo(0.25))
    );
    assert_eq!(InputEvent::Key(Key::Down).scroll_input(), None);
    assert_eq!(InputEvent::Press { y: 3.0 }.scroll_input(), None);

    assert_eq!(Key::PageDown.navigation(), Some(Navigation::PageDown));
    assert_eq!(Key::Home.navigation(), Some(Navigation::Home));
    assert_eq!(Key::Enter.navigation(), None);
}

#[test]
fn text_surface_tracks_rows_and_content_height() {
    let mut c = controller(64);
    assert_eq!(c.list().viewport_height(), 64);
    assert_eq!(c.list().container().content_height(), ROWS as u64 * ROW as u64);
    // Four rows on screen plus two below; nothing above the first row.
    assert_eq!(c.list().visible_indices(), (0, 6));
    assert_eq!(c.list().container().live_rows(), 6);
    assert_eq!(lines(&c), vec!["  0", "  1", "  2", "  3"]);

    c.list_mut().set_items(text_items(10), 10);
    assert_eq!(c.list().container().live_rows(), 0);
    assert_eq!(c.list().container().discarded_rows(), 6);
    assert_eq!(c.list().container().content_height(), 10 * ROW as u64);

    c.flush(1);
    assert_eq!(c.list().container().live_rows(), 6);
    assert_eq!(lines(&c), vec!["  0", "  1", "  2", "  3"]);
}

#[test]
fn wheel_scrolls_one_row_per_notch() {
    let mut c = controller(64);
    assert!(c.handle(InputEvent::Wheel { delta: -120 }, 10));
    assert_eq!(c.list().scroll_offset(), 16.0);
    c.flush(10);
    assert_eq!(lines(&c), vec!["  1", "  2", "  3", "  4"]);

    assert!(c.handle(InputEvent::WheelButton(X11_WHEEL_UP), 20));
    assert_eq!(c.list().scroll_offset(), 0.0);
    // Already at the top.
    assert!(!c.handle(InputEvent::Wheel { delta: 120 }, 30));
}

#[test]
fn keys_move_the_selection_and_keep_it_in_view() {
    let mut c = controller(64);
    assert!(c.handle(InputEvent::Press { y: 0.0 }, 5));
    assert_eq!(c.list().selected_index(), Some(0));
    assert_eq!(lines(&c)[0], "> 0");

    assert!(c.handle(InputEvent::Key(Key::Down), 10));
    assert_eq!(c.list().selected_index(), Some(1));
    assert_eq!(lines(&c)[..2], ["  0", "> 1"]);

    assert!(c.handle(InputEvent::Key(Key::End), 20));
    c.flush(20);
    assert_eq!(c.list().selected_index(), Some(ROWS - 1));
    assert_eq!(lines(&c), vec!["  1020", "  1021", "  1022", "> 1023"]);

    assert!(c.handle(InputEvent::Key(Key::Home), 30));
    c.flush(30);
    assert_eq!(c.list().selected_index(), Some(0));
    assert_eq!(c.list().scroll_offset(), 0.0);
}

#[test]
fn enter_and_double_press_activate() {
    let activated = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&activated);
    let options = VirtualListOptions::new(ROW)
        .with_buffer_items(2)
        .with_on_activate(move |index| sink.lock().unwrap().push(index));
    let mut c = controller_with(options, 64);

    // Nothing selected yet.
    assert!(!c.handle(InputEvent::Key(Key::Enter), 1));
    assert!(activated.lock().unwrap().is_empty());

    assert!(c.handle(InputEvent::DoublePress { y: 20.0 }, 2));
    assert_eq!(c.list().selected_index(), Some(1));
    assert!(c.handle(InputEvent::Key(Key::Enter), 3));
    assert_eq!(*activated.lock().unwrap(), vec![1, 1]);

    // Below the last row of a short list.
    c.list_mut().set_items(text_items(2), 2);
    c.flush(4);
    assert!(!c.handle(InputEvent::DoublePress { y: 40.0 }, 5));
    assert_eq!(*activated.lock().unwrap(), vec![1, 1]);
}

#[test]
fn resize_storms_apply_only_the_last_height() {
    let mut c = controller(64);

    assert!(!c.handle(InputEvent::Resize { height: 128 }, 100));
    assert_eq!(c.pending_resize(), Some(128));
    assert_eq!(c.tick(105), Some(110));
    assert_eq!(c.list().viewport_height(), 64);

    assert!(!c.handle(InputEvent::Resize { height: 96 }, 108));
    assert_eq!(c.tick(110), Some(118));
    assert_eq!(c.list().viewport_height(), 64);

    assert_eq!(c.tick(118), None);
    assert_eq!(c.pending_resize(), None);
    assert_eq!(c.list().viewport_height(), 96);
    assert_eq!(lines(&c).len(), 6);

    // Transient non-positive heights collapse the viewport.
    c.handle(InputEvent::Resize { height: -5 }, 200);
    c.tick(210);
    assert_eq!(c.list().viewport_height(), 0);
    assert_eq!(c.list().rendered_indices().count(), 0);
    assert!(lines(&c).is_empty());
}

#[test]
fn scrollbar_drag_moves_to_a_position() {
    let mut c = controller(64);
    assert!(c.handle(InputEvent::ScrollbarMoveTo(0.5), 10));
    c.flush(10);
    assert_eq!(c.list().scroll_offset(), 8192.0);
    assert_eq!(lines(&c), vec!["  512", "  513", "  514", "  515"]);
}

#[test]
fn batch_preparation_formats_labels_off_thread() {
    let mut c = controller(64);
    assert!(c.list().items().iter().all(|item| item.label().is_none()));

    c.list_mut().enable_batch_preparation(BatchConfig {
        batch_size: 100,
        max_workers: 2,
    });

    let mut now = 1;
    while c.list().is_preparing() && now < 5_000 {
        std::thread::sleep(Duration::from_millis(1));
        c.tick(now);
        now += 1;
    }
    c.tick(now);

    assert!(!c.list().is_preparing());
    for item in c.list().items() {
        assert_eq!(item.label(), Some(item.value().to_string().as_str()));
    }
}

#[test]
fn shutdown_ignores_later_events() {
    let mut c = controller(64);
    c.handle(InputEvent::Resize { height: 200 }, 1);
    c.shutdown();

    assert_eq!(c.pending_resize(), None);
    assert_eq!(c.list().container().live_rows(), 0);
    assert!(!c.handle(InputEvent::Wheel { delta: -120 }, 2));
    assert!(!c.handle(InputEvent::Key(Key::Down), 3));
    assert_eq!(c.tick(4), None);
}
