use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTransition {
    Unchanged,
    EnteredMobile,
    EnteredDesktop,
}

/// How the sidebar renders right now. Docked reflects the persisted
/// per-workspace flag; Drawer reflects the transient overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SidebarPresentation {
    Docked { open: bool },
    Drawer { open: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayTrigger {
    MenuButton,
    ExternalEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayCloseReason {
    Backdrop,
    Explicit,
    RouteChange,
    LeftMobile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResponsiveState {
    pub is_mobile: bool,
    pub overlay_open: bool,
}

/// Desktop/mobile breakpoint and the mobile overlay drawer. Never touches
/// persisted layout.
#[derive(Debug, Clone)]
pub struct ResponsiveController {
    breakpoint: u32,
    is_mobile: bool,
    overlay_open: bool,
}

impl ResponsiveController {
    pub fn new(breakpoint: u32, viewport_width: f64) -> Self {
        Self {
            breakpoint,
            is_mobile: is_mobile_width(breakpoint, viewport_width),
            overlay_open: false,
        }
    }

    pub fn is_mobile(&self) -> bool {
        self.is_mobile
    }

    pub fn overlay_open(&self) -> bool {
        self.overlay_open
    }

    pub fn state(&self) -> ResponsiveState {
        ResponsiveState {
            is_mobile: self.is_mobile,
            overlay_open: self.overlay_open,
        }
    }

    /// Either crossing of the breakpoint closes the overlay.
    pub fn viewport_resized(&mut self, viewport_width: f64) -> ModeTransition {
        let is_mobile = is_mobile_width(self.breakpoint, viewport_width);
        if is_mobile == self.is_mobile {
            return ModeTransition::Unchanged;
        }
        self.is_mobile = is_mobile;
        self.overlay_open = false;
        if is_mobile {
            tracing::debug!(viewport_width, "entered mobile layout");
            ModeTransition::EnteredMobile
        } else {
            tracing::debug!(viewport_width, "entered desktop layout");
            ModeTransition::EnteredDesktop
        }
    }

    /// Ignored on desktop. Returns whether the overlay is now open.
    pub fn open_overlay(&mut self, trigger: OverlayTrigger) -> bool {
        if !self.is_mobile {
            tracing::debug!(?trigger, "ignoring overlay open on desktop");
            return false;
        }
        self.overlay_open = true;
        true
    }

    /// Returns whether the overlay was open.
    pub fn close_overlay(&mut self, reason: OverlayCloseReason) -> bool {
        let was_open = self.overlay_open;
        self.overlay_open = false;
        if was_open {
            tracing::debug!(?reason, "overlay closed");
        }
        was_open
    }

    pub fn toggle_overlay(&mut self, trigger: OverlayTrigger) -> bool {
        if self.overlay_open {
            self.close_overlay(OverlayCloseReason::Explicit);
            false
        } else {
            self.open_overlay(trigger)
        }
    }

    pub fn route_changed(&mut self) -> bool {
        self.close_overlay(OverlayCloseReason::RouteChange)
    }

    pub fn presentation(&self, persisted_open: bool) -> SidebarPresentation {
        if self.is_mobile {
            SidebarPresentation::Drawer {
                open: self.overlay_open,
            }
        } else {
            SidebarPresentation::Docked {
                open: persisted_open,
            }
        }
    }
}

fn is_mobile_width(breakpoint: u32, viewport_width: f64) -> bool {
    viewport_width < f64::from(breakpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrinking_to_mobile_keeps_overlay_closed_until_menu_tap() {
        let mut controller = ResponsiveController::new(768, 900.0);
        assert_eq!(
            controller.presentation(true),
            SidebarPresentation::Docked { open: true }
        );

        assert_eq!(
            controller.viewport_resized(320.0),
            ModeTransition::EnteredMobile
        );
        assert_eq!(
            controller.presentation(true),
            SidebarPresentation::Drawer { open: false }
        );

        assert!(controller.open_overlay(OverlayTrigger::MenuButton));
        assert_eq!(
            controller.presentation(true),
            SidebarPresentation::Drawer { open: true }
        );
    }

    #[test]
    fn breakpoint_is_exclusive() {
        assert!(ResponsiveController::new(768, 767.9).is_mobile());
        assert!(!ResponsiveController::new(768, 768.0).is_mobile());
    }

    #[test]
    fn open_requests_on_desktop_are_ignored() {
        let mut controller = ResponsiveController::new(768, 1280.0);
        assert!(!controller.open_overlay(OverlayTrigger::ExternalEvent));
        assert!(!controller.overlay_open());
        assert_eq!(
            controller.presentation(false),
            SidebarPresentation::Docked { open: false }
        );
    }

    #[test]
    fn route_change_and_desktop_transition_close_overlay() {
        let mut controller = ResponsiveController::new(768, 400.0);
        controller.open_overlay(OverlayTrigger::MenuButton);
        assert!(controller.route_changed());
        assert!(!controller.route_changed());

        controller.toggle_overlay(OverlayTrigger::MenuButton);
        assert!(controller.overlay_open());
        assert_eq!(
            controller.viewport_resized(1024.0),
            ModeTransition::EnteredDesktop
        );
        assert!(!controller.overlay_open());
        assert_eq!(controller.viewport_resized(1100.0), ModeTransition::Unchanged);
    }

    #[test]
    fn presentation_serializes_with_mode_tag() {
        let json = serde_json::to_value(SidebarPresentation::Drawer { open: true })
            .expect("serialize presentation");
        assert_eq!(json, serde_json::json!({ "mode": "drawer", "open": true }));
    }
}
