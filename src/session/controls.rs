//! Pointer-lock camera controls.
//!
//! A two-state machine: Unlocked (keys ignored, start affordance shown) and
//! Locked (WASD displaces the camera, affordance hidden). The controller
//! holds no camera reference; displacements are applied through the camera
//! passed per event, and the whole rig is rebuilt when a scene load replaces
//! the camera.

use winit::keyboard::KeyCode;

use crate::scene::Camera;

/// Fixed displacement per directional key event, in scene units.
pub const KEY_STEP: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Unlocked,
    Locked,
}

pub struct PointerLockControls {
    mode: ControlMode,
    affordance_visible: bool,
    step: f32,
}

impl PointerLockControls {
    pub fn new() -> Self {
        Self {
            mode: ControlMode::Unlocked,
            affordance_visible: true,
            step: KEY_STEP,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn is_locked(&self) -> bool {
        self.mode == ControlMode::Locked
    }

    /// Whether the "click to start" affordance should be shown.
    pub fn affordance_visible(&self) -> bool {
        self.affordance_visible
    }

    /// Explicit user-initiated lock request. Returns true on a transition.
    pub fn lock(&mut self) -> bool {
        if self.mode == ControlMode::Locked {
            return false;
        }
        self.mode = ControlMode::Locked;
        self.affordance_visible = false;
        true
    }

    /// Explicit unlock signal (escape key, focus loss). Returns true on a
    /// transition.
    pub fn unlock(&mut self) -> bool {
        if self.mode == ControlMode::Unlocked {
            return false;
        }
        self.mode = ControlMode::Unlocked;
        self.affordance_visible = true;
        true
    }

    /// Translates one key event into camera displacement. Each event moves
    /// the camera by the fixed step; holding a key only repeats if the host
    /// key-repeat resends events. Returns whether the key was consumed.
    pub fn process_key(&mut self, key: KeyCode, camera: &mut Camera) -> bool {
        if self.mode != ControlMode::Locked {
            return false;
        }
        match key {
            KeyCode::KeyW => camera.move_forward(self.step),
            KeyCode::KeyS => camera.move_forward(-self.step),
            KeyCode::KeyA => camera.move_right(-self.step),
            KeyCode::KeyD => camera.move_right(self.step),
            _ => return false,
        }
        true
    }
}

impl Default for PointerLockControls {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unlocked_with_affordance_shown() {
        let controls = PointerLockControls::new();
        assert_eq!(controls.mode(), ControlMode::Unlocked);
        assert!(controls.affordance_visible());
    }

    #[test]
    fn lock_unlock_cycle_toggles_affordance() {
        let mut controls = PointerLockControls::new();

        assert!(controls.lock());
        assert_eq!(controls.mode(), ControlMode::Locked);
        assert!(!controls.affordance_visible());
        assert!(!controls.lock()); // already locked

        assert!(controls.unlock());
        assert_eq!(controls.mode(), ControlMode::Unlocked);
        assert!(controls.affordance_visible());
        assert!(!controls.unlock());
    }

    #[test]
    fn keys_displace_only_while_locked() {
        let mut controls = PointerLockControls::new();
        let mut camera = Camera::default();
        let start = camera.position;

        // Unlocked: directional keys have no camera effect.
        assert!(!controls.process_key(KeyCode::KeyW, &mut camera));
        assert_eq!(camera.position, start);

        controls.lock();
        assert!(controls.process_key(KeyCode::KeyW, &mut camera));
        assert!((camera.position[2] - (start[2] - KEY_STEP)).abs() < 1e-5);

        assert!(controls.process_key(KeyCode::KeyD, &mut camera));
        assert!((camera.position[0] - KEY_STEP).abs() < 1e-5);

        // Back and strafe-left reverse the displacements exactly.
        assert!(controls.process_key(KeyCode::KeyS, &mut camera));
        assert!(controls.process_key(KeyCode::KeyA, &mut camera));
        assert!((camera.position[0] - start[0]).abs() < 1e-5);
        assert!((camera.position[2] - start[2]).abs() < 1e-5);

        // Unlock again: keys go dead.
        controls.unlock();
        let held = camera.position;
        assert!(!controls.process_key(KeyCode::KeyW, &mut camera));
        assert_eq!(camera.position, held);
    }

    #[test]
    fn unbound_keys_are_not_consumed() {
        let mut controls = PointerLockControls::new();
        let mut camera = Camera::default();
        controls.lock();
        assert!(!controls.process_key(KeyCode::KeyQ, &mut camera));
    }
}
