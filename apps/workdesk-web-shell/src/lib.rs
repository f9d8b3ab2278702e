#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod bridge;
#[cfg(target_arch = "wasm32")]
mod wasm_constants;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde::Serialize;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use workdesk_shell_core::{
        Location, OverlayCloseReason, OverlayTrigger, ShellConfig, ShellEvent, ShellState,
    };

    use crate::bridge::parse_patch;
    use crate::wasm_constants::*;

    mod drag;
    mod routing;
    mod storage;

    use drag::*;
    use routing::*;
    use storage::LocalLayoutStore;

    type WebShell = ShellState<Rc<LocalLayoutStore>>;
    type EventHandler = Closure<dyn FnMut(web_sys::Event)>;

    thread_local! {
        static SHELL: RefCell<Option<WebShell>> = const { RefCell::new(None) };
        static STORE: RefCell<Option<Rc<LocalLayoutStore>>> = const { RefCell::new(None) };
        static DIAGNOSTICS: RefCell<ShellDiagnostics> = RefCell::new(ShellDiagnostics::default());
        static CHANGE_CALLBACK: RefCell<Option<js_sys::Function>> = const { RefCell::new(None) };
        static POPSTATE_HANDLER: RefCell<Option<EventHandler>> = const { RefCell::new(None) };
        static LINK_CLICK_HANDLER: RefCell<Option<EventHandler>> = const { RefCell::new(None) };
        static RESIZE_HANDLER: RefCell<Option<EventHandler>> = const { RefCell::new(None) };
        static STORAGE_HANDLER: RefCell<Option<EventHandler>> = const { RefCell::new(None) };
        static SHELL_EVENT_HANDLERS: RefCell<Vec<(&'static str, EventHandler)>> = const { RefCell::new(Vec::new()) };
        static DRAG_MOVE_HANDLER: RefCell<Option<EventHandler>> = const { RefCell::new(None) };
        static DRAG_UP_HANDLER: RefCell<Option<EventHandler>> = const { RefCell::new(None) };
        static DRAG_CANCEL_HANDLER: RefCell<Option<EventHandler>> = const { RefCell::new(None) };
    }

    #[derive(Debug, Clone, Serialize)]
    struct ShellDiagnostics {
        phase: String,
        detail: String,
        storage_available: bool,
        last_error: Option<String>,
    }

    impl Default for ShellDiagnostics {
        fn default() -> Self {
            Self {
                phase: "idle".to_string(),
                detail: "shell not mounted".to_string(),
                storage_available: false,
                last_error: None,
            }
        }
    }

    fn set_phase(phase: &str, detail: &str) {
        DIAGNOSTICS.with(|diagnostics| {
            let mut diagnostics = diagnostics.borrow_mut();
            diagnostics.phase = phase.to_string();
            diagnostics.detail = detail.to_string();
        });
    }

    pub(super) fn record_error(error: impl ToString) {
        let message = error.to_string();
        web_sys::console::warn_1(&JsValue::from_str(&message));
        DIAGNOSTICS.with(|diagnostics| diagnostics.borrow_mut().last_error = Some(message));
    }

    /// Runs `action` against the mounted shell and notifies the renderer.
    pub(super) fn update_shell<R>(action: impl FnOnce(&mut WebShell) -> R) -> Option<R> {
        let result = SHELL.with(|shell| shell.borrow_mut().as_mut().map(action));
        if result.is_some() {
            emit_change();
        }
        result
    }

    fn read_shell<R>(action: impl FnOnce(&WebShell) -> R) -> Option<R> {
        SHELL.with(|shell| shell.borrow().as_ref().map(action))
    }

    pub(super) fn emit_change() {
        let Some(snapshot) = read_shell(|shell| shell.snapshot()) else {
            return;
        };
        let Some(callback) = CHANGE_CALLBACK.with(|slot| slot.borrow().clone()) else {
            return;
        };
        let payload = match serde_json::to_string(&snapshot) {
            Ok(payload) => payload,
            Err(error) => {
                record_error(format!("snapshot serialization failed: {error}"));
                return;
            }
        };
        if let Err(error) = callback.call1(&JsValue::NULL, &JsValue::from_str(&payload)) {
            record_error(format!("shell change callback failed: {error:?}"));
        }
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        set_phase("mounting", "reading location and layout preferences");

        let store = Rc::new(LocalLayoutStore::new());
        DIAGNOSTICS.with(|diagnostics| {
            diagnostics.borrow_mut().storage_available = store.is_available();
        });
        STORE.with(|slot| *slot.borrow_mut() = Some(Rc::clone(&store)));

        let shell = ShellState::mount(
            store,
            ShellConfig::default(),
            viewport_width(),
            current_location(),
        );
        let landing = shell.landing_location();
        SHELL.with(|slot| *slot.borrow_mut() = Some(shell));

        if let Some(landing) = landing {
            replace_browser_location(&landing);
            update_shell(|shell| shell.navigate(landing));
        }

        install_browser_handlers();
        set_phase("ready", "shell mounted");
        emit_change();
    }

    #[wasm_bindgen]
    pub fn shell_snapshot_json() -> String {
        read_shell(|shell| serde_json::to_string(&shell.snapshot()))
            .and_then(Result::ok)
            .unwrap_or_else(|| "null".to_string())
    }

    #[wasm_bindgen]
    pub fn shell_diagnostics_json() -> String {
        DIAGNOSTICS.with(|state| {
            serde_json::to_string(&*state.borrow()).unwrap_or_else(|_| {
                "{\"phase\":\"error\",\"detail\":\"diagnostics serialization failed\"}".to_string()
            })
        })
    }

    #[wasm_bindgen]
    pub fn on_shell_change(callback: js_sys::Function) {
        CHANGE_CALLBACK.with(|slot| *slot.borrow_mut() = Some(callback));
    }

    #[wasm_bindgen]
    pub fn shell_navigate(href: String) {
        let location = Location::parse(&href);
        push_browser_location(&location);
        update_shell(|shell| shell.navigate(location));
    }

    #[wasm_bindgen]
    pub fn shell_menu_button() {
        update_shell(|shell| shell.toggle_sidebar(OverlayTrigger::MenuButton));
    }

    #[wasm_bindgen]
    pub fn shell_backdrop_click() {
        update_shell(|shell| shell.close_overlay(OverlayCloseReason::Backdrop));
    }

    #[wasm_bindgen]
    pub fn shell_close_sidebar_overlay() {
        update_shell(|shell| shell.close_overlay(OverlayCloseReason::Explicit));
    }

    /// Pointer down on the resize handle. Drag listeners stay attached until
    /// release or cancel.
    #[wasm_bindgen]
    pub fn sidebar_resize_start() -> bool {
        let started = update_shell(|shell| shell.sidebar_pointer_down()).unwrap_or(false);
        if started {
            attach_drag_listeners();
        }
        started
    }

    #[wasm_bindgen]
    pub fn filter_panel_open() -> Option<String> {
        update_shell(|shell| shell.open_filter_panel())
            .flatten()
            .map(|domain| domain.as_str().to_string())
    }

    #[wasm_bindgen]
    pub fn filter_draft_update(patch_json: String) -> bool {
        let patch = match parse_patch(&patch_json) {
            Ok(patch) => patch,
            Err(error) => {
                record_error(format!("invalid filter patch: {error}"));
                return false;
            }
        };
        update_shell(|shell| shell.update_filter_draft(&patch)).unwrap_or(false)
    }

    #[wasm_bindgen]
    pub fn filters_apply() -> Option<String> {
        let next = update_shell(|shell| shell.apply_filters()).flatten()?;
        push_browser_location(&next);
        Some(next.to_href())
    }

    #[wasm_bindgen]
    pub fn filters_clear() -> Option<String> {
        let next = update_shell(|shell| shell.clear_filters()).flatten()?;
        push_browser_location(&next);
        Some(next.to_href())
    }

    #[wasm_bindgen]
    pub fn filter_draft_discard() -> bool {
        update_shell(|shell| shell.discard_filter_changes()).unwrap_or(false)
    }

    #[wasm_bindgen]
    pub fn filter_panel_close() -> bool {
        update_shell(|shell| shell.close_filter_panel()).unwrap_or(false)
    }

    fn install_browser_handlers() {
        install_navigation_handlers();
        install_viewport_handler();
        install_storage_handler();
        install_shell_event_handlers();
    }

    fn install_shell_event_handlers() {
        let Some(window) = web_sys::window() else {
            return;
        };
        SHELL_EVENT_HANDLERS.with(|slot| {
            let mut handlers = slot.borrow_mut();
            if !handlers.is_empty() {
                return;
            }
            for event in ShellEvent::ALL {
                let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(
                    move |_event: web_sys::Event| {
                        update_shell(|shell| shell.handle_event(event));
                    },
                ));
                if let Err(error) = window
                    .add_event_listener_with_callback(event.name(), callback.as_ref().unchecked_ref())
                {
                    record_error(format!("failed to listen for {}: {error:?}", event.name()));
                }
                handlers.push((event.name(), callback));
            }
        });
    }

    fn install_viewport_handler() {
        let Some(window) = web_sys::window() else {
            return;
        };
        RESIZE_HANDLER.with(|slot| {
            if slot.borrow().is_some() {
                return;
            }
            let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
                let width = viewport_width();
                update_shell(|shell| shell.viewport_resized(width));
                let still_resizing = read_shell(|shell| shell.layout().is_resizing()).unwrap_or(false);
                if !still_resizing {
                    detach_drag_listeners();
                }
            }));
            let _ = window.add_event_listener_with_callback(RESIZE_EVENT, callback.as_ref().unchecked_ref());
            *slot.borrow_mut() = Some(callback);
        });
    }

    fn install_storage_handler() {
        let Some(window) = web_sys::window() else {
            return;
        };
        STORAGE_HANDLER.with(|slot| {
            if slot.borrow().is_some() {
                return;
            }
            let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |event: web_sys::Event| {
                let Some(event) = event.dyn_ref::<web_sys::StorageEvent>() else {
                    return;
                };
                let Some(store) = STORE.with(|slot| slot.borrow().clone()) else {
                    return;
                };
                store.apply_external_change(event.key(), event.new_value());
                emit_change();
            }));
            let _ = window.add_event_listener_with_callback(STORAGE_EVENT, callback.as_ref().unchecked_ref());
            *slot.borrow_mut() = Some(callback);
        });
    }

    pub(super) fn viewport_width() -> f64 {
        web_sys::window()
            .and_then(|window| window.inner_width().ok())
            .and_then(|width| width.as_f64())
            .unwrap_or(FALLBACK_VIEWPORT_WIDTH)
    }
}
