// Example: drive a list from raw toolkit events and print the visible text rows.
use virtual_list::{BatchConfig, VirtualListOptions};
use virtual_list_adapter::{Controller, InputEvent, Key, TextItem, TextSurface, render_visible};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let options = VirtualListOptions::new(20)
        .with_buffer_items(3)
        .with_on_activate(|index| println!("activated {index}"));
    let mut c = Controller::new(TextSurface::new(), options);

    let items: Vec<_> = (0..5_000)
        .map(|i| TextItem::new(format!("song #{i}"), 20))
        .collect();
    c.list_mut().set_items(items, 5_000);
    c.list_mut().enable_batch_preparation(BatchConfig::default());

    let events = [
        InputEvent::Resize { height: 100 },
        InputEvent::Resize { height: 120 },
        InputEvent::Wheel { delta: -360 },
        InputEvent::Press { y: 30.0 },
        InputEvent::Key(Key::PageDown),
        InputEvent::Key(Key::Enter),
        InputEvent::ScrollbarMoveTo(0.5),
    ];

    let mut now = 0;
    for event in events {
        c.handle(event, now);
        now += 16;
        while let Some(wake) = c.tick(now) {
            if wake > now + 16 {
                break;
            }
            now = wake.max(now + 1);
        }
        println!("after {event:?}:");
        for line in render_visible(c.list()) {
            println!("  {line}");
        }
    }

    println!("{:#?}", c.list().snapshot());
    c.shutdown();
}
