//! Translation of winit window events into Tessera events.

use std::time::Duration;

use tessera_core::event::{
    ButtonEvent, ConfigureEvent, CrossingEvent, DataEvent, DataOfferEvent, Event, EventFlags,
    ExposeEvent, FocusEvent, Key, KeyEvent, Modifiers, MotionEvent, ScrollDirection, ScrollEvent,
    SpecialKey, TextEvent, ViewStyle,
};
use tessera_core::geometry::{Pos, Rect};
use tessera_core::utf8::{decode_all, decode_utf8};
pub use winit::event::{ElementState, Ime, MouseButton, MouseScrollDelta, WindowEvent as WinitEvent};
use winit::keyboard::{Key as WinitKey, KeyLocation, ModifiersState, NamedKey, NativeKeyCode, PhysicalKey};

/// What the translator knows about a view between native events.
///
/// winit reports most state as deltas: a resize carries no position, a button
/// press carries no pointer location. [`Translation::observe`] folds each event
/// into this record before [`translate`] builds the generic events from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Translation {
    /// Timestamp given to every translated event.
    pub time: Duration,
    /// Current frame in physical pixels.
    pub frame: Rect,
    pub style: ViewStyle,
    /// Last known pointer position relative to the view.
    pub pointer: Pos<f64>,
    pub modifiers: Modifiers,
}

impl Translation {
    pub fn new(frame: Rect) -> Self {
        Self {
            time: Duration::ZERO,
            frame,
            style: ViewStyle::MAPPED,
            pointer: Pos::default(),
            modifiers: Modifiers::empty(),
        }
    }

    /// Updates the tracked state from `event`. Call before [`translate`].
    pub fn observe(&mut self, event: &WinitEvent) {
        match event {
            WinitEvent::Resized(size) => {
                self.frame.width = size.width;
                self.frame.height = size.height;
            }
            WinitEvent::Moved(pos) => {
                self.frame.x = pos.x;
                self.frame.y = pos.y;
            }
            WinitEvent::CursorMoved { position, .. } => {
                self.pointer = Pos::new(position.x, position.y);
            }
            WinitEvent::ModifiersChanged(modifiers) => {
                self.modifiers = map_modifiers(modifiers.state());
            }
            WinitEvent::Occluded(occluded) => {
                self.style.set(ViewStyle::HIDDEN, *occluded);
            }
            _ => {}
        }
    }

    fn configure(&self) -> Event {
        Event::Configure(ConfigureEvent::new(self.frame, self.style))
    }

    fn crossing(&self) -> CrossingEvent {
        CrossingEvent {
            time: self.time,
            x: self.pointer.x,
            y: self.pointer.y,
            state: self.modifiers,
            ..Default::default()
        }
    }
}

/// Translates a native window event into zero or more generic events.
///
/// Key presses that produce text yield a key event followed by one text event
/// per character. Events with no generic counterpart yield nothing.
pub fn translate(event: &WinitEvent, translation: &Translation) -> Vec<Event> {
    let t = translation;

    match event {
        WinitEvent::Resized(_) | WinitEvent::Moved(_) | WinitEvent::Occluded(_) => {
            vec![t.configure()]
        }
        WinitEvent::RedrawRequested => {
            let region = Rect::new(0, 0, t.frame.width, t.frame.height);
            vec![Event::Expose(ExposeEvent::new(region))]
        }
        WinitEvent::CloseRequested => vec![Event::Close],
        WinitEvent::Destroyed => vec![Event::Unrealize],

        WinitEvent::Focused(true) => vec![Event::FocusIn(FocusEvent::default())],
        WinitEvent::Focused(false) => vec![Event::FocusOut(FocusEvent::default())],

        WinitEvent::CursorEntered { .. } => vec![Event::PointerIn(t.crossing())],
        WinitEvent::CursorLeft { .. } => vec![Event::PointerOut(t.crossing())],
        WinitEvent::CursorMoved { .. } => vec![Event::Motion(MotionEvent {
            time: t.time,
            x: t.pointer.x,
            y: t.pointer.y,
            state: t.modifiers,
            ..Default::default()
        })],

        WinitEvent::MouseInput { state, button, .. } => {
            let button = ButtonEvent {
                time: t.time,
                x: t.pointer.x,
                y: t.pointer.y,
                state: t.modifiers,
                button: map_button(*button),
                ..Default::default()
            };
            match state {
                ElementState::Pressed => vec![Event::ButtonPress(button)],
                ElementState::Released => vec![Event::ButtonRelease(button)],
            }
        }

        WinitEvent::MouseWheel { delta, .. } => {
            let (direction, dx, dy) = map_scroll(*delta);
            vec![Event::Scroll(ScrollEvent {
                time: t.time,
                x: t.pointer.x,
                y: t.pointer.y,
                state: t.modifiers,
                direction,
                dx,
                dy,
                ..Default::default()
            })]
        }

        WinitEvent::KeyboardInput {
            event,
            is_synthetic,
            ..
        } => {
            let flags = if *is_synthetic {
                EventFlags::IS_SEND_EVENT
            } else {
                EventFlags::empty()
            };
            let key = KeyEvent {
                flags,
                time: t.time,
                x: t.pointer.x,
                y: t.pointer.y,
                state: t.modifiers,
                keycode: native_keycode(&event.physical_key),
                key: map_key(&event.logical_key, event.location),
            };

            match event.state {
                ElementState::Released => vec![Event::KeyRelease(key)],
                ElementState::Pressed => {
                    let mut events = vec![Event::KeyPress(key)];
                    if let Some(text) = &event.text {
                        events.extend(text_events(text.as_bytes(), &key));
                    }
                    events
                }
            }
        }

        WinitEvent::Ime(Ime::Commit(text)) => text_events(text.as_bytes(), &KeyEvent {
            time: t.time,
            x: t.pointer.x,
            y: t.pointer.y,
            state: t.modifiers,
            ..Default::default()
        })
        .collect(),
        WinitEvent::Ime(_) => Vec::new(),

        WinitEvent::HoveredFile(_) => vec![Event::DataOffer(DataOfferEvent { time: t.time })],
        WinitEvent::DroppedFile(_) => vec![Event::Data(DataEvent {
            time: t.time,
            type_index: 0,
        })],

        // Folded into the translation state
        WinitEvent::ModifiersChanged(_) | WinitEvent::ScaleFactorChanged { .. } => Vec::new(),
        // we explicity ignore these
        WinitEvent::HoveredFileCancelled
        | WinitEvent::TouchpadPressure { .. }
        | WinitEvent::ThemeChanged(_) => Vec::new(),

        unknown => {
            tracing::warn!("unhandled window event: {:?}", unknown);
            Vec::new()
        }
    }
}

/// One text event per printable character of `text`.
///
/// Invalid UTF-8 becomes U+FFFD. Control characters are dropped; they are
/// already reported through the key event.
pub fn text_events<'a>(text: &'a [u8], key: &KeyEvent) -> impl Iterator<Item = Event> + 'a {
    let KeyEvent {
        flags,
        time,
        x,
        y,
        state,
        keycode,
        ..
    } = *key;

    decode_all(text)
        .filter(|c| !c.is_control())
        .map(move |character| {
            Event::Text(TextEvent {
                flags,
                time,
                x,
                y,
                state,
                keycode,
                character,
            })
        })
}

pub fn map_modifiers(state: ModifiersState) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    modifiers.set(Modifiers::SHIFT, state.shift_key());
    modifiers.set(Modifiers::CTRL, state.control_key());
    modifiers.set(Modifiers::ALT, state.alt_key());
    modifiers.set(Modifiers::SUPER, state.super_key());
    modifiers
}

/// Button numbers: 0 primary, 1 secondary, 2 middle, then extra buttons.
pub fn map_button(button: MouseButton) -> u32 {
    match button {
        MouseButton::Left => 0,
        MouseButton::Right => 1,
        MouseButton::Middle => 2,
        MouseButton::Back => 3,
        MouseButton::Forward => 4,
        MouseButton::Other(n) => u32::from(n),
    }
}

/// Line deltas along a single axis become discrete scrolls, anything else is
/// smooth.
pub fn map_scroll(delta: MouseScrollDelta) -> (ScrollDirection, f64, f64) {
    match delta {
        MouseScrollDelta::LineDelta(dx, dy) => {
            let (dx, dy) = (f64::from(dx), f64::from(dy));
            let direction = match (dx, dy) {
                (x, y) if x == 0.0 && y > 0.0 => ScrollDirection::Up,
                (x, y) if x == 0.0 && y < 0.0 => ScrollDirection::Down,
                (x, y) if y == 0.0 && x > 0.0 => ScrollDirection::Right,
                (x, y) if y == 0.0 && x < 0.0 => ScrollDirection::Left,
                _ => ScrollDirection::Smooth,
            };
            (direction, dx, dy)
        }
        MouseScrollDelta::PixelDelta(pos) => (ScrollDirection::Smooth, pos.x, pos.y),
    }
}

pub fn map_key(key: &WinitKey, location: KeyLocation) -> Key {
    let right = location == KeyLocation::Right;

    match key {
        WinitKey::Character(text) => Key::Character(decode_utf8(text.as_bytes())),
        WinitKey::Named(NamedKey::Space) => Key::Character(' '),
        WinitKey::Named(named) => {
            let special = match named {
                NamedKey::Backspace => SpecialKey::Backspace,
                NamedKey::Tab => SpecialKey::Tab,
                NamedKey::Enter => SpecialKey::Enter,
                NamedKey::Escape => SpecialKey::Escape,
                NamedKey::Delete => SpecialKey::Delete,
                NamedKey::F1 => SpecialKey::F1,
                NamedKey::F2 => SpecialKey::F2,
                NamedKey::F3 => SpecialKey::F3,
                NamedKey::F4 => SpecialKey::F4,
                NamedKey::F5 => SpecialKey::F5,
                NamedKey::F6 => SpecialKey::F6,
                NamedKey::F7 => SpecialKey::F7,
                NamedKey::F8 => SpecialKey::F8,
                NamedKey::F9 => SpecialKey::F9,
                NamedKey::F10 => SpecialKey::F10,
                NamedKey::F11 => SpecialKey::F11,
                NamedKey::F12 => SpecialKey::F12,
                NamedKey::ArrowLeft => SpecialKey::Left,
                NamedKey::ArrowUp => SpecialKey::Up,
                NamedKey::ArrowRight => SpecialKey::Right,
                NamedKey::ArrowDown => SpecialKey::Down,
                NamedKey::PageUp => SpecialKey::PageUp,
                NamedKey::PageDown => SpecialKey::PageDown,
                NamedKey::Home => SpecialKey::Home,
                NamedKey::End => SpecialKey::End,
                NamedKey::Insert => SpecialKey::Insert,
                NamedKey::Shift if right => SpecialKey::ShiftRight,
                NamedKey::Shift => SpecialKey::ShiftLeft,
                NamedKey::Control if right => SpecialKey::CtrlRight,
                NamedKey::Control => SpecialKey::CtrlLeft,
                NamedKey::Alt | NamedKey::AltGraph if right => SpecialKey::AltRight,
                NamedKey::Alt => SpecialKey::AltLeft,
                NamedKey::AltGraph => SpecialKey::AltRight,
                NamedKey::Super | NamedKey::Meta if right => SpecialKey::SuperRight,
                NamedKey::Super | NamedKey::Meta => SpecialKey::SuperLeft,
                NamedKey::ContextMenu => SpecialKey::Menu,
                NamedKey::CapsLock => SpecialKey::CapsLock,
                NamedKey::ScrollLock => SpecialKey::ScrollLock,
                NamedKey::NumLock => SpecialKey::NumLock,
                NamedKey::PrintScreen => SpecialKey::PrintScreen,
                NamedKey::Pause => SpecialKey::Pause,
                _ => return Key::Unknown,
            };
            Key::Special(special)
        }
        WinitKey::Unidentified(_) | WinitKey::Dead(_) => Key::Unknown,
    }
}

/// Native scancode for keys winit could not identify, zero otherwise.
fn native_keycode(key: &PhysicalKey) -> u32 {
    match key {
        PhysicalKey::Unidentified(NativeKeyCode::Xkb(code)) => *code,
        PhysicalKey::Unidentified(NativeKeyCode::Windows(code))
        | PhysicalKey::Unidentified(NativeKeyCode::MacOS(code)) => u32::from(*code),
        PhysicalKey::Unidentified(NativeKeyCode::Android(code)) => *code,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::event::EventType;
    use winit::dpi::{PhysicalPosition, PhysicalSize};
    use winit::event::DeviceId;

    fn device() -> DeviceId {
        // SAFETY: the dummy id is only compared, never handed to winit.
        unsafe { DeviceId::dummy() }
    }

    fn types(events: &[Event]) -> Vec<EventType> {
        events.iter().map(Event::event_type).collect()
    }

    fn observe_and_translate(translation: &mut Translation, event: WinitEvent) -> Vec<Event> {
        translation.observe(&event);
        translate(&event, translation)
    }

    #[test]
    fn test_resize_and_move_become_configure() {
        let mut t = Translation::new(Rect::new(10, 20, 640, 480));

        let events = observe_and_translate(&mut t, WinitEvent::Resized(PhysicalSize::new(800, 600)));
        assert_eq!(
            events,
            vec![Event::Configure(ConfigureEvent::new(
                Rect::new(10, 20, 800, 600),
                ViewStyle::MAPPED
            ))]
        );

        let events = observe_and_translate(&mut t, WinitEvent::Moved(PhysicalPosition::new(-5, 7)));
        match &events[..] {
            [Event::Configure(c)] => assert_eq!(c.frame(), Rect::new(-5, 7, 800, 600)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_occlusion_sets_hidden_style() {
        let mut t = Translation::new(Rect::new(0, 0, 100, 100));
        let events = observe_and_translate(&mut t, WinitEvent::Occluded(true));
        match &events[..] {
            [Event::Configure(c)] => assert!(c.style.contains(ViewStyle::HIDDEN)),
            other => panic!("unexpected {:?}", other),
        }

        observe_and_translate(&mut t, WinitEvent::Occluded(false));
        assert!(!t.style.contains(ViewStyle::HIDDEN));
    }

    #[test]
    fn test_redraw_exposes_whole_view() {
        let t = Translation::new(Rect::new(30, 40, 320, 240));
        let events = translate(&WinitEvent::RedrawRequested, &t);
        assert_eq!(
            events,
            vec![Event::Expose(ExposeEvent::new(Rect::new(0, 0, 320, 240)))]
        );
    }

    #[test]
    fn test_pointer_events_carry_position_and_modifiers() {
        let mut t = Translation::new(Rect::new(0, 0, 100, 100));
        t.modifiers = Modifiers::CTRL;

        let events = observe_and_translate(
            &mut t,
            WinitEvent::CursorMoved {
                device_id: device(),
                position: PhysicalPosition::new(12.5, 7.0),
            },
        );
        assert_eq!(
            events,
            vec![Event::Motion(MotionEvent {
                x: 12.5,
                y: 7.0,
                state: Modifiers::CTRL,
                ..Default::default()
            })]
        );

        let events = translate(
            &WinitEvent::MouseInput {
                device_id: device(),
                state: ElementState::Pressed,
                button: MouseButton::Right,
            },
            &t,
        );
        match &events[..] {
            [Event::ButtonPress(b)] => {
                assert_eq!(b.button, 1);
                assert_eq!((b.x, b.y), (12.5, 7.0));
            }
            other => panic!("unexpected {:?}", other),
        }

        let events = translate(&WinitEvent::CursorLeft { device_id: device() }, &t);
        assert_eq!(types(&events), vec![EventType::PointerOut]);
    }

    #[test]
    fn test_simple_events() {
        let t = Translation::new(Rect::default());
        assert_eq!(translate(&WinitEvent::CloseRequested, &t), vec![Event::Close]);
        assert_eq!(translate(&WinitEvent::Destroyed, &t), vec![Event::Unrealize]);
        assert_eq!(
            types(&translate(&WinitEvent::Focused(true), &t)),
            vec![EventType::FocusIn]
        );
        assert!(translate(&WinitEvent::HoveredFileCancelled, &t).is_empty());
    }

    #[test]
    fn test_ime_commit_becomes_text() {
        let t = Translation::new(Rect::default());
        let events = translate(&WinitEvent::Ime(Ime::Commit("né".to_string())), &t);

        let chars: Vec<char> = events
            .iter()
            .map(|e| match e {
                Event::Text(text) => text.character,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(chars, vec!['n', 'é']);
    }

    #[test]
    fn test_text_events_skip_control_and_replace_invalid() {
        let key = KeyEvent {
            keycode: 38,
            state: Modifiers::SHIFT,
            ..Default::default()
        };
        let events: Vec<Event> = text_events(b"A\r\xFF", &key).collect();

        assert_eq!(events.len(), 2);
        match (&events[0], &events[1]) {
            (Event::Text(a), Event::Text(b)) => {
                assert_eq!(a.character, 'A');
                assert_eq!(a.keycode, 38);
                assert_eq!(a.state, Modifiers::SHIFT);
                assert_eq!(b.character, char::REPLACEMENT_CHARACTER);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_map_key() {
        assert_eq!(
            map_key(&WinitKey::Character("é".into()), KeyLocation::Standard),
            Key::Character('é')
        );
        assert_eq!(
            map_key(&WinitKey::Named(NamedKey::Shift), KeyLocation::Right),
            Key::Special(SpecialKey::ShiftRight)
        );
        assert_eq!(
            map_key(&WinitKey::Named(NamedKey::Control), KeyLocation::Left),
            Key::Special(SpecialKey::CtrlLeft)
        );
        assert_eq!(
            map_key(&WinitKey::Named(NamedKey::Space), KeyLocation::Standard),
            Key::Character(' ')
        );
        assert_eq!(
            map_key(&WinitKey::Named(NamedKey::MediaPlay), KeyLocation::Standard),
            Key::Unknown
        );
    }

    #[test]
    fn test_map_modifiers() {
        let state = ModifiersState::SHIFT | ModifiersState::SUPER;
        assert_eq!(map_modifiers(state), Modifiers::SHIFT | Modifiers::SUPER);
        assert_eq!(map_modifiers(ModifiersState::empty()), Modifiers::empty());
    }

    #[test]
    fn test_map_scroll() {
        assert_eq!(
            map_scroll(MouseScrollDelta::LineDelta(0.0, 1.0)),
            (ScrollDirection::Up, 0.0, 1.0)
        );
        assert_eq!(
            map_scroll(MouseScrollDelta::LineDelta(-2.0, 0.0)),
            (ScrollDirection::Left, -2.0, 0.0)
        );
        assert_eq!(
            map_scroll(MouseScrollDelta::LineDelta(1.0, 1.0)).0,
            ScrollDirection::Smooth
        );
        assert_eq!(
            map_scroll(MouseScrollDelta::PixelDelta(PhysicalPosition::new(3.0, -4.0))),
            (ScrollDirection::Smooth, 3.0, -4.0)
        );
    }
}
