use web_sys::MouseEvent;

use super::*;

fn ensure_drag_handlers() {
    DRAG_MOVE_HANDLER.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |event: web_sys::Event| {
            let Some(pointer) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let pointer_x = f64::from(pointer.client_x());
            update_shell(|shell| shell.sidebar_pointer_move(pointer_x));
        }));
        *slot.borrow_mut() = Some(callback);
    });
    DRAG_UP_HANDLER.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
            detach_drag_listeners();
            update_shell(|shell| shell.sidebar_pointer_up());
        }));
        *slot.borrow_mut() = Some(callback);
    });
    DRAG_CANCEL_HANDLER.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
            detach_drag_listeners();
            update_shell(|shell| shell.sidebar_pointer_abort());
        }));
        *slot.borrow_mut() = Some(callback);
    });
}

fn drag_listeners() -> [(&'static str, &'static std::thread::LocalKey<RefCell<Option<EventHandler>>>); 3] {
    [
        (POINTER_MOVE_EVENT, &DRAG_MOVE_HANDLER),
        (POINTER_UP_EVENT, &DRAG_UP_HANDLER),
        (POINTER_CANCEL_EVENT, &DRAG_CANCEL_HANDLER),
    ]
}

/// Handlers are created once and only registered for the duration of a drag.
pub(super) fn attach_drag_listeners() {
    let Some(window) = web_sys::window() else {
        return;
    };
    ensure_drag_handlers();
    for (event_name, handler) in drag_listeners() {
        handler.with(|slot| {
            if let Some(callback) = slot.borrow().as_ref()
                && let Err(error) = window
                    .add_event_listener_with_callback(event_name, callback.as_ref().unchecked_ref())
            {
                record_error(format!("failed to attach {event_name} listener: {error:?}"));
            }
        });
    }
}

pub(super) fn detach_drag_listeners() {
    let Some(window) = web_sys::window() else {
        return;
    };
    for (event_name, handler) in drag_listeners() {
        handler.with(|slot| {
            if let Some(callback) = slot.borrow().as_ref() {
                let _ = window.remove_event_listener_with_callback(
                    event_name,
                    callback.as_ref().unchecked_ref(),
                );
            }
        });
    }
}
