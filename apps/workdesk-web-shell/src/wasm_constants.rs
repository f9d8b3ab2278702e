pub(crate) const POPSTATE_EVENT: &str = "popstate";
pub(crate) const RESIZE_EVENT: &str = "resize";
pub(crate) const STORAGE_EVENT: &str = "storage";
pub(crate) const CLICK_EVENT: &str = "click";
pub(crate) const POINTER_MOVE_EVENT: &str = "pointermove";
pub(crate) const POINTER_UP_EVENT: &str = "pointerup";
pub(crate) const POINTER_CANCEL_EVENT: &str = "pointercancel";
pub(crate) const FALLBACK_VIEWPORT_WIDTH: f64 = 1280.0;
