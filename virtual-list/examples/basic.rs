// Example: a minimal host container and the scroll/select/tick loop.
use virtual_list::{
    Container, ItemError, Navigation, Placement, RenderableItem, ScrollInput, VirtualList,
    VirtualListOptions,
};

#[derive(Default)]
struct Rows {
    created: usize,
}

struct Row {
    top: u64,
    text: String,
}

impl Container for Rows {
    type Handle = Row;

    fn place(&mut self, row: &mut Row, placement: Placement) {
        row.top = placement.top;
    }

    fn hide(&mut self, _row: &mut Row) {}
}

struct Track {
    title: String,
}

impl RenderableItem<Rows> for Track {
    fn create(&self, rows: &mut Rows) -> Result<Row, ItemError> {
        rows.created += 1;
        Ok(Row {
            top: 0,
            text: String::new(),
        })
    }

    fn update(&self, row: &mut Row, is_selected: bool) -> Result<(), ItemError> {
        let marker = if is_selected { '>' } else { ' ' };
        row.text = format!("{marker} {}", self.title);
        Ok(())
    }

    fn height(&self) -> u32 {
        56
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let options = VirtualListOptions::default()
        .with_on_select(|index| println!("selected {index}"))
        .with_on_load_more(|| println!("near the end, load the next page"));
    let mut list = VirtualList::new(Rows::default(), options);

    let tracks: Vec<Track> = (0..100_000)
        .map(|i| Track {
            title: format!("track {i:06}"),
        })
        .collect();
    list.set_items(tracks, 100_000);
    list.set_viewport_height(600, 0);
    println!("visible={:?} created={}", list.visible_indices(), list.container().created);

    let mut now = 16;
    list.scroll(ScrollInput::Wheel(3), now);
    list.navigate(Navigation::Down, now);
    list.scroll(ScrollInput::End, now);
    while let Some(wake) = list.tick(now) {
        now = wake.max(now + 1);
    }

    for (index, row) in list.rendered().take(3) {
        println!("{index:>6} @{:>8}: {}", row.top, row.text);
    }
    println!("render={:?}", list.stats());
    println!("pool={:?}", list.pool_stats());

    list.shutdown();
}
