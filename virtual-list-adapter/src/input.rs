use virtual_list::{Navigation, ScrollInput};

/// Wheel delta reported for one notch by most platforms.
pub const WHEEL_DELTA: i32 = 120;

/// X11 reports wheel motion as presses of these buttons.
pub const X11_WHEEL_UP: u8 = 4;
pub const X11_WHEEL_DOWN: u8 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Key {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Enter,
}

impl Key {
    /// The selection movement bound to this key. `Enter` activates instead.
    pub fn navigation(self) -> Option<Navigation> {
        match self {
            Self::Up => Some(Navigation::Up),
            Self::Down => Some(Navigation::Down),
            Self::PageUp => Some(Navigation::PageUp),
            Self::PageDown => Some(Navigation::PageDown),
            Self::Home => Some(Navigation::Home),
            Self::End => Some(Navigation::End),
            Self::Enter => None,
        }
    }
}

/// A raw toolkit event, before normalization.
///
/// Coordinates are viewport-relative pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InputEvent {
    /// A wheel delta in platform units; positive is away from the user (scroll up).
    Wheel { delta: i32 },
    /// An X11 wheel button press.
    WheelButton(u8),
    Key(Key),
    Press { y: f64 },
    DoublePress { y: f64 },
    /// A scrollbar drag to a normalized position in `[0, 1]`.
    ScrollbarMoveTo(f64),
    /// The toolkit may report transient non-positive heights while laying out.
    Resize { height: i32 },
}

impl InputEvent {
    /// The scroll this event stands for, if any.
    pub fn scroll_input(&self) -> Option<ScrollInput> {
        match *self {
            Self::Wheel { delta } => match wheel_notches(delta) {
                0 => None,
                notches => Some(ScrollInput::Wheel(notches)),
            },
            Self::WheelButton(button) => x11_button_notches(button).map(ScrollInput::Wheel),
            Self::ScrollbarMoveTo(position) => Some(ScrollInput::MoveTo(position)),
            _ => None,
        }
    }
}

/// Converts a platform wheel delta to notches, positive scrolling down.
///
/// Deltas smaller than one notch (touchpads, high-resolution wheels) still move by one.
pub fn wheel_notches(delta: i32) -> i32 {
    if delta == 0 {
        return 0;
    }
    if delta.unsigned_abs() < WHEEL_DELTA.unsigned_abs() {
        return -delta.signum();
    }
    -(delta / WHEEL_DELTA)
}

/// Notches for an X11 wheel button; `None` for any other button.
pub fn x11_button_notches(button: u8) -> Option<i32> {
    match button {
        X11_WHEEL_UP => Some(-1),
        X11_WHEEL_DOWN => Some(1),
        _ => None,
    }
}
