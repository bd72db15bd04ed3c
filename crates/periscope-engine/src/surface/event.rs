//! Platform-agnostic surface events.
//!
//! The runtime translates winit window events into these; surfaces consume
//! them without seeing platform types.

use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// One of the six camera movement keys.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MoveKey {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Window lifecycle and input events a surface reacts to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceEvent {
    Shown,
    Hidden,
    FocusGained,
    FocusLost,
    PointerEntered,
    PointerLeft,
    CloseRequested,
    Move(MoveKey),
}

/// Translates a winit window event into a surface event, if it carries one.
///
/// Movement keys fire on press only; key repeats pass through so held keys
/// keep moving the camera.
pub fn translate_window_event(event: &WindowEvent) -> Option<SurfaceEvent> {
    match event {
        WindowEvent::Focused(true) => Some(SurfaceEvent::FocusGained),
        WindowEvent::Focused(false) => Some(SurfaceEvent::FocusLost),

        // Occlusion is the closest winit signal to shown/hidden.
        WindowEvent::Occluded(true) => Some(SurfaceEvent::Hidden),
        WindowEvent::Occluded(false) => Some(SurfaceEvent::Shown),

        WindowEvent::CursorEntered { .. } => Some(SurfaceEvent::PointerEntered),
        WindowEvent::CursorLeft { .. } => Some(SurfaceEvent::PointerLeft),

        WindowEvent::CloseRequested => Some(SurfaceEvent::CloseRequested),

        WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
            let PhysicalKey::Code(code) = event.physical_key else {
                return None;
            };
            map_move_key(code).map(SurfaceEvent::Move)
        }

        _ => None,
    }
}

fn map_move_key(code: KeyCode) -> Option<MoveKey> {
    match code {
        KeyCode::KeyW => Some(MoveKey::Forward),
        KeyCode::KeyS => Some(MoveKey::Backward),
        KeyCode::KeyA => Some(MoveKey::Left),
        KeyCode::KeyD => Some(MoveKey::Right),
        KeyCode::KeyE => Some(MoveKey::Up),
        KeyCode::KeyQ => Some(MoveKey::Down),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_keys_map_to_camera_axes() {
        assert_eq!(map_move_key(KeyCode::KeyW), Some(MoveKey::Forward));
        assert_eq!(map_move_key(KeyCode::KeyS), Some(MoveKey::Backward));
        assert_eq!(map_move_key(KeyCode::KeyA), Some(MoveKey::Left));
        assert_eq!(map_move_key(KeyCode::KeyD), Some(MoveKey::Right));
        assert_eq!(map_move_key(KeyCode::KeyE), Some(MoveKey::Up));
        assert_eq!(map_move_key(KeyCode::KeyQ), Some(MoveKey::Down));
    }

    #[test]
    fn non_movement_keys_are_ignored() {
        assert_eq!(map_move_key(KeyCode::Space), None);
        assert_eq!(map_move_key(KeyCode::Escape), None);
        assert_eq!(map_move_key(KeyCode::ArrowUp), None);
    }

    #[test]
    fn lifecycle_events_translate() {
        assert_eq!(
            translate_window_event(&WindowEvent::Focused(true)),
            Some(SurfaceEvent::FocusGained)
        );
        assert_eq!(
            translate_window_event(&WindowEvent::Occluded(true)),
            Some(SurfaceEvent::Hidden)
        );
        assert_eq!(
            translate_window_event(&WindowEvent::CloseRequested),
            Some(SurfaceEvent::CloseRequested)
        );
    }
}
