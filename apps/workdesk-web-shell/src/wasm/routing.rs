use web_sys::{HtmlAnchorElement, MouseEvent};
use workdesk_shell_core::WorkspaceRegistry;

use super::*;
use crate::bridge::routable_location;

pub(super) fn current_location() -> Location {
    let Some(window) = web_sys::window() else {
        return Location::parse("/");
    };
    let location = window.location();
    let pathname = location.pathname().unwrap_or_else(|_| "/".to_string());
    let search = location.search().unwrap_or_default();
    Location::parse(&format!("{pathname}{search}"))
}

pub(super) fn push_browser_location(location: &Location) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(history) = window.history() else {
        return;
    };
    let href = location.to_href();
    if current_location().to_href() == href {
        return;
    }
    if let Err(error) = history.push_state_with_url(&JsValue::NULL, "", Some(&href)) {
        record_error(format!("history push failed: {error:?}"));
    }
}

pub(super) fn replace_browser_location(location: &Location) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(history) = window.history() else {
        return;
    };
    let href = location.to_href();
    if let Err(error) = history.replace_state_with_url(&JsValue::NULL, "", Some(&href)) {
        record_error(format!("history replace failed: {error:?}"));
    }
}

pub(super) fn install_navigation_handlers() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };

    POPSTATE_HANDLER.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
            let location = current_location();
            update_shell(|shell| shell.navigate(location));
        }));
        let _ = window
            .add_event_listener_with_callback(POPSTATE_EVENT, callback.as_ref().unchecked_ref());
        *slot.borrow_mut() = Some(callback);
    });

    LINK_CLICK_HANDLER.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |event| {
            intercept_internal_link_click(event);
        }));
        let _ = document.add_event_listener_with_callback_and_bool(
            CLICK_EVENT,
            callback.as_ref().unchecked_ref(),
            true,
        );
        *slot.borrow_mut() = Some(callback);
    });
}

fn intercept_internal_link_click(event: web_sys::Event) {
    if event.default_prevented() {
        return;
    }
    let Some(mouse_event) = event.dyn_ref::<MouseEvent>() else {
        return;
    };
    if mouse_event.button() != 0
        || mouse_event.meta_key()
        || mouse_event.ctrl_key()
        || mouse_event.shift_key()
        || mouse_event.alt_key()
    {
        return;
    }
    let Some(anchor) = anchor_from_event(&event) else {
        return;
    };
    if anchor.has_attribute("download") {
        return;
    }
    let target = anchor.target();
    if !target.is_empty() && target != "_self" {
        return;
    }
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(origin) = window.location().origin() else {
        return;
    };

    let registry = WorkspaceRegistry::builtin();
    let Some(location) = routable_location(&anchor.href(), &origin, &registry) else {
        return;
    };
    event.prevent_default();
    push_browser_location(&location);
    update_shell(|shell| shell.navigate(location));
}

fn anchor_from_event(event: &web_sys::Event) -> Option<HtmlAnchorElement> {
    let composed_path = event.composed_path();
    for index in 0..composed_path.length() {
        let value = composed_path.get(index);
        if let Ok(anchor) = value.dyn_into::<HtmlAnchorElement>() {
            return Some(anchor);
        }
    }
    None
}
