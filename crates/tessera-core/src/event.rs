//! The generic event model.
//!
//! Every backend translates its native notifications into [`Event`]. Each
//! variant carries only the fields relevant to its type, so handlers never
//! need to look at native state.

use std::time::Duration;

use crate::geometry::Rect;

bitflags::bitflags! {
    /// Keyboard modifiers held while an input event occurred.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const SUPER = 1 << 3;
        const NUM_LOCK = 1 << 4;
        const SCROLL_LOCK = 1 << 5;
        const CAPS_LOCK = 1 << 6;
    }
}

bitflags::bitflags! {
    /// Where an event came from.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct EventFlags: u32 {
        /// Sent by another client rather than the windowing system.
        const IS_SEND_EVENT = 1 << 0;
        /// A motion hint: the position may be stale and should be queried.
        const IS_HINT = 1 << 1;
    }
}

bitflags::bitflags! {
    /// Window manager state of a view, reported with configure events.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct ViewStyle: u32 {
        const MAPPED = 1 << 0;
        const MODAL = 1 << 1;
        const ABOVE = 1 << 2;
        const BELOW = 1 << 3;
        const HIDDEN = 1 << 4;
        const TALL = 1 << 5;
        const WIDE = 1 << 6;
        const FULLSCREEN = 1 << 7;
        const RESIZING = 1 << 8;
        const DEMANDING = 1 << 9;
    }
}

/// The closed set of event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Nothing,
    Realize,
    Unrealize,
    Configure,
    Update,
    Expose,
    Close,
    FocusIn,
    FocusOut,
    KeyPress,
    KeyRelease,
    Text,
    PointerIn,
    PointerOut,
    ButtonPress,
    ButtonRelease,
    Motion,
    Scroll,
    Client,
    Timer,
    LoopEnter,
    LoopLeave,
    DataOffer,
    Data,
}

impl EventType {
    /// Configure and expose are the only types delivered inside the graphics context.
    pub const fn is_context_event(self) -> bool {
        matches!(self, EventType::Configure | EventType::Expose)
    }
}

/// How a focus or pointer crossing came about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CrossingMode {
    #[default]
    Normal,
    /// The crossing was caused by a pointer grab.
    Grab,
    /// The crossing was caused by releasing a pointer grab.
    Ungrab,
}

/// Keys that have no text representation of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    Backspace,
    Tab,
    Enter,
    Escape,
    Delete,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Left,
    Up,
    Right,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Insert,
    ShiftLeft,
    ShiftRight,
    CtrlLeft,
    CtrlRight,
    AltLeft,
    AltRight,
    SuperLeft,
    SuperRight,
    Menu,
    CapsLock,
    ScrollLock,
    NumLock,
    PrintScreen,
    Pause,
}

/// The key of a key event, independent of keyboard layout modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Key {
    /// A key that produces this character when pressed without modifiers.
    Character(char),
    Special(SpecialKey),
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
    /// Continuous scrolling; use the deltas.
    #[default]
    Smooth,
}

/// Position or size of the view changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigureEvent {
    pub flags: EventFlags,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub style: ViewStyle,
}

impl ConfigureEvent {
    pub fn new(frame: Rect, style: ViewStyle) -> Self {
        Self {
            flags: EventFlags::empty(),
            x: frame.x,
            y: frame.y,
            width: frame.width,
            height: frame.height,
            style,
        }
    }

    pub fn frame(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// A region of the view must be redrawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExposeEvent {
    pub flags: EventFlags,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ExposeEvent {
    pub fn new(region: Rect) -> Self {
        Self {
            flags: EventFlags::empty(),
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
        }
    }

    pub fn region(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.region().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusEvent {
    pub mode: CrossingMode,
}

/// A key was pressed or released.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KeyEvent {
    pub flags: EventFlags,
    pub time: Duration,
    pub x: f64,
    pub y: f64,
    pub state: Modifiers,
    /// Raw scancode from the native system.
    pub keycode: u32,
    pub key: Key,
}

/// Character input, after layout and input-method processing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextEvent {
    pub flags: EventFlags,
    pub time: Duration,
    pub x: f64,
    pub y: f64,
    pub state: Modifiers,
    pub keycode: u32,
    pub character: char,
}

impl Default for TextEvent {
    fn default() -> Self {
        Self {
            flags: EventFlags::empty(),
            time: Duration::ZERO,
            x: 0.0,
            y: 0.0,
            state: Modifiers::empty(),
            keycode: 0,
            character: char::REPLACEMENT_CHARACTER,
        }
    }
}

impl TextEvent {
    /// The character as UTF-8.
    pub fn as_str<'a>(&self, buf: &'a mut [u8; 4]) -> &'a str {
        self.character.encode_utf8(buf)
    }
}

/// The pointer entered or left the view.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CrossingEvent {
    pub flags: EventFlags,
    pub time: Duration,
    pub x: f64,
    pub y: f64,
    pub state: Modifiers,
    pub mode: CrossingMode,
}

/// A pointer button was pressed or released.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ButtonEvent {
    pub flags: EventFlags,
    pub time: Duration,
    pub x: f64,
    pub y: f64,
    pub state: Modifiers,
    /// 0 is the primary button, 1 the secondary, 2 the middle.
    pub button: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionEvent {
    pub flags: EventFlags,
    pub time: Duration,
    pub x: f64,
    pub y: f64,
    pub state: Modifiers,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollEvent {
    pub flags: EventFlags,
    pub time: Duration,
    pub x: f64,
    pub y: f64,
    pub state: Modifiers,
    pub direction: ScrollDirection,
    pub dx: f64,
    pub dy: f64,
}

/// Application-defined payload sent to a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientEvent {
    pub data1: usize,
    pub data2: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerEvent {
    pub id: usize,
}

/// Data is being offered by a clipboard or drag source.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DataOfferEvent {
    pub time: Duration,
}

/// Offered data of the type at `type_index` has arrived.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DataEvent {
    pub time: Duration,
    pub type_index: u32,
}

/// A platform-independent event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// No event; dispatching it does nothing.
    Nothing,
    /// The view was realized and its native window exists.
    Realize,
    /// The view is about to lose its native window.
    Unrealize,
    Configure(ConfigureEvent),
    /// The view is about to be exposed; last chance to post redisplays.
    Update,
    Expose(ExposeEvent),
    /// The user asked to close the view.
    Close,
    FocusIn(FocusEvent),
    FocusOut(FocusEvent),
    KeyPress(KeyEvent),
    KeyRelease(KeyEvent),
    Text(TextEvent),
    PointerIn(CrossingEvent),
    PointerOut(CrossingEvent),
    ButtonPress(ButtonEvent),
    ButtonRelease(ButtonEvent),
    Motion(MotionEvent),
    Scroll(ScrollEvent),
    Client(ClientEvent),
    Timer(TimerEvent),
    /// A modal event loop (such as a native resize) started.
    LoopEnter,
    LoopLeave,
    DataOffer(DataOfferEvent),
    Data(DataEvent),
}

impl Event {
    /// An event of type `event_type` with every payload field at its default.
    pub fn simple(event_type: EventType) -> Self {
        match event_type {
            EventType::Nothing => Event::Nothing,
            EventType::Realize => Event::Realize,
            EventType::Unrealize => Event::Unrealize,
            EventType::Configure => Event::Configure(ConfigureEvent::default()),
            EventType::Update => Event::Update,
            EventType::Expose => Event::Expose(ExposeEvent::default()),
            EventType::Close => Event::Close,
            EventType::FocusIn => Event::FocusIn(FocusEvent::default()),
            EventType::FocusOut => Event::FocusOut(FocusEvent::default()),
            EventType::KeyPress => Event::KeyPress(KeyEvent::default()),
            EventType::KeyRelease => Event::KeyRelease(KeyEvent::default()),
            EventType::Text => Event::Text(TextEvent::default()),
            EventType::PointerIn => Event::PointerIn(CrossingEvent::default()),
            EventType::PointerOut => Event::PointerOut(CrossingEvent::default()),
            EventType::ButtonPress => Event::ButtonPress(ButtonEvent::default()),
            EventType::ButtonRelease => Event::ButtonRelease(ButtonEvent::default()),
            EventType::Motion => Event::Motion(MotionEvent::default()),
            EventType::Scroll => Event::Scroll(ScrollEvent::default()),
            EventType::Client => Event::Client(ClientEvent::default()),
            EventType::Timer => Event::Timer(TimerEvent::default()),
            EventType::LoopEnter => Event::LoopEnter,
            EventType::LoopLeave => Event::LoopLeave,
            EventType::DataOffer => Event::DataOffer(DataOfferEvent::default()),
            EventType::Data => Event::Data(DataEvent::default()),
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            Event::Nothing => EventType::Nothing,
            Event::Realize => EventType::Realize,
            Event::Unrealize => EventType::Unrealize,
            Event::Configure(_) => EventType::Configure,
            Event::Update => EventType::Update,
            Event::Expose(_) => EventType::Expose,
            Event::Close => EventType::Close,
            Event::FocusIn(_) => EventType::FocusIn,
            Event::FocusOut(_) => EventType::FocusOut,
            Event::KeyPress(_) => EventType::KeyPress,
            Event::KeyRelease(_) => EventType::KeyRelease,
            Event::Text(_) => EventType::Text,
            Event::PointerIn(_) => EventType::PointerIn,
            Event::PointerOut(_) => EventType::PointerOut,
            Event::ButtonPress(_) => EventType::ButtonPress,
            Event::ButtonRelease(_) => EventType::ButtonRelease,
            Event::Motion(_) => EventType::Motion,
            Event::Scroll(_) => EventType::Scroll,
            Event::Client(_) => EventType::Client,
            Event::Timer(_) => EventType::Timer,
            Event::LoopEnter => EventType::LoopEnter,
            Event::LoopLeave => EventType::LoopLeave,
            Event::DataOffer(_) => EventType::DataOffer,
            Event::Data(_) => EventType::Data,
        }
    }

    pub fn flags(&self) -> EventFlags {
        match self {
            Event::Configure(e) => e.flags,
            Event::Expose(e) => e.flags,
            Event::KeyPress(e) | Event::KeyRelease(e) => e.flags,
            Event::Text(e) => e.flags,
            Event::PointerIn(e) | Event::PointerOut(e) => e.flags,
            Event::ButtonPress(e) | Event::ButtonRelease(e) => e.flags,
            Event::Motion(e) => e.flags,
            Event::Scroll(e) => e.flags,
            _ => EventFlags::empty(),
        }
    }

    /// Modifier state carried by input events.
    pub fn modifiers(&self) -> Option<Modifiers> {
        match self {
            Event::KeyPress(e) | Event::KeyRelease(e) => Some(e.state),
            Event::Text(e) => Some(e.state),
            Event::PointerIn(e) | Event::PointerOut(e) => Some(e.state),
            Event::ButtonPress(e) | Event::ButtonRelease(e) => Some(e.state),
            Event::Motion(e) => Some(e.state),
            Event::Scroll(e) => Some(e.state),
            _ => None,
        }
    }

    pub fn is_context_event(&self) -> bool {
        self.event_type().is_context_event()
    }
}

static_assertions::assert_impl_all!(Event: Send, Sync, Clone);
