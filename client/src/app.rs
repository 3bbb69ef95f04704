use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use doodleguess_shared::ChannelKind;
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Element, Event, HtmlButtonElement, HtmlCanvasElement,
    HtmlInputElement, KeyboardEvent, PointerEvent, Storage, Window,
};

use crate::canvas::CanvasSurface;
use crate::channel::Channel;
use crate::config::ClientConfig;
use crate::dom::{container_extent, debug_enabled, event_to_point, get_element, redirect, set_text};
use crate::game::GameView;
use crate::logger;
use crate::net::websocket_url;
use crate::reconnect::{Disconnect, Recovery};
use crate::session::ClientSession;
use crate::surface::Surface;
use crate::token::{LocalStorageTokenStore, TokenStore};
use crate::ws::{connect_ws, WsChannel, WsEvent};

/// sessionStorage key holding the reconnect attempt across page reloads.
const ATTEMPT_KEY: &str = "reconnectAttempt";

type Session = ClientSession<CanvasSurface, WsChannel, LocalStorageTokenStore>;
type SessionSlot = Rc<RefCell<Option<Session>>>;

#[derive(Clone)]
struct Ui {
    window: Window,
    word: Element,
    transcript: Element,
    notice: Element,
    clear_button: HtmlButtonElement,
    next_button: HtmlButtonElement,
}

impl Ui {
    fn render(&self, game: &GameView) {
        set_text(&self.word, game.word());
        set_text(&self.transcript, &game.transcript().join("\n"));
        self.transcript.set_scroll_top(self.transcript.scroll_height());
        set_text(&self.notice, game.notice().unwrap_or_default());
        let drawer = game.is_drawer();
        self.clear_button.set_disabled(!drawer);
        self.next_button.set_disabled(!drawer);
    }
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    logger::init(debug_enabled(&window));
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let config = ClientConfig::default();

    let tokens = LocalStorageTokenStore::new(&window, &config.token_key)?;
    if tokens.load().is_none() {
        info!("no session token, returning to login");
        redirect(&window, &config.login_route);
        return Ok(());
    }

    let canvas: HtmlCanvasElement = get_element(&document, "board")?;
    let container: Element = get_element(&document, "boardContainer")?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing canvas context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    let mut surface = CanvasSurface::new(canvas.clone(), ctx);
    surface.resize(container_extent(&container));

    let ui = Ui {
        window: window.clone(),
        word: get_element(&document, "word")?,
        transcript: get_element(&document, "transcript")?,
        notice: get_element(&document, "notice")?,
        clear_button: get_element(&document, "clear")?,
        next_button: get_element(&document, "nextWord")?,
    };
    let chat_input: HtmlInputElement = get_element(&document, "chatInput")?;

    let slot: SessionSlot = Rc::new(RefCell::new(None));
    let draw = connect_ws(
        &websocket_url(&window, &config.app_name, ChannelKind::Draw)?,
        event_handler(slot.clone(), ui.clone(), ChannelKind::Draw),
    )?;
    let chat_url = websocket_url(&window, &config.app_name, ChannelKind::Chat)?;
    let chat = match connect_ws(
        &chat_url,
        event_handler(slot.clone(), ui.clone(), ChannelKind::Chat),
    ) {
        Ok(chat) => chat,
        Err(error) => {
            draw.close();
            return Err(error);
        }
    };
    let attempt = load_attempt(&window);
    debug!("connecting, attempt {attempt}");
    *slot.borrow_mut() = Some(ClientSession::new(
        config, surface, draw, chat, tokens, attempt,
    ));
    ui.render(&GameView::default());

    on_pointer(&canvas, &slot, "pointerdown", |session, event| {
        session.pointer_down(event_to_point(event));
    })?;
    on_pointer(&canvas, &slot, "pointermove", |session, event| {
        session.pointer_move(event_to_point(event));
    })?;
    for name in ["pointerup", "pointercancel"] {
        on_pointer(&canvas, &slot, name, |session, _| session.pointer_up())?;
    }
    on_pointer(&canvas, &slot, "pointerleave", |session, _| {
        session.pointer_leave();
    })?;

    {
        let slot = slot.clone();
        let input = chat_input.clone();
        let onkeydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            if event.key() != "Enter" {
                return;
            }
            event.prevent_default();
            if let Some(session) = slot.borrow_mut().as_mut() {
                session.submit_chat(&input.value());
            }
            input.set_value("");
        });
        chat_input.add_event_listener_with_callback("keydown", onkeydown.as_ref().unchecked_ref())?;
        onkeydown.forget();
    }

    on_click(&ui.clear_button, &slot, |session| {
        session.request_clear();
    })?;
    on_click(&ui.next_button, &slot, |session| {
        session.request_next_word();
    })?;

    {
        let slot = slot.clone();
        let onresize = Closure::<dyn FnMut(Event)>::new(move |_| {
            if let Some(session) = slot.borrow_mut().as_mut() {
                session.resize(container_extent(&container));
            }
        });
        window.add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }

    {
        let slot = slot.clone();
        let onbeforeunload = Closure::<dyn FnMut(Event)>::new(move |_| {
            if let Some(session) = slot.borrow_mut().take() {
                debug!("page unloading, closing channels");
                session.shutdown();
            }
        });
        window.add_event_listener_with_callback(
            "beforeunload",
            onbeforeunload.as_ref().unchecked_ref(),
        )?;
        onbeforeunload.forget();
    }

    Ok(())
}

fn event_handler(slot: SessionSlot, ui: Ui, kind: ChannelKind) -> impl FnMut(WsEvent) {
    move |event| handle_event(&slot, &ui, kind, event)
}

fn handle_event(slot: &SessionSlot, ui: &Ui, kind: ChannelKind, event: WsEvent) {
    let recovery = {
        let mut guard = slot.borrow_mut();
        let Some(session) = guard.as_mut() else {
            return;
        };
        match event {
            WsEvent::Open => {
                let recovery = session.on_open(kind);
                if recovery.is_none() && session.is_connected() {
                    store_attempt(&ui.window, None);
                }
                recovery
            }
            WsEvent::Text(text) => {
                session.on_text(kind, &text);
                if kind == ChannelKind::Chat {
                    ui.render(session.game());
                }
                None
            }
            WsEvent::Close { code, reason } => Some(session.on_disconnect(Disconnect {
                channel: kind,
                code: Some(code),
                reason,
            })),
            WsEvent::Error => Some(session.on_disconnect(Disconnect {
                channel: kind,
                code: None,
                reason: String::new(),
            })),
        }
    };
    if let Some(recovery) = recovery {
        teardown(slot, &ui.window, recovery);
    }
}

/// Both channels go down together; the page either returns to login or
/// reloads after the backoff delay.
fn teardown(slot: &SessionSlot, window: &Window, recovery: Recovery) {
    let Some(session) = slot.borrow_mut().take() else {
        return;
    };
    let login_route = session.config().login_route.clone();
    let attempt = session.attempt();
    session.shutdown();
    match recovery {
        Recovery::ReturnToLogin => {
            store_attempt(window, None);
            redirect(window, &login_route);
        }
        Recovery::RetryAfter(delay) => {
            info!("reconnecting in {delay:?}");
            store_attempt(window, Some(attempt.saturating_add(1)));
            schedule_reload(window, delay);
        }
    }
}

fn schedule_reload(window: &Window, delay: Duration) {
    let location = window.location();
    let reload = Closure::<dyn FnMut()>::new(move || {
        if let Err(error) = location.reload() {
            warn!("reload failed: {error:?}");
        }
    });
    let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
    if let Err(error) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        reload.as_ref().unchecked_ref(),
        millis,
    ) {
        warn!("could not schedule reconnect: {error:?}");
    }
    reload.forget();
}

fn on_pointer(
    canvas: &HtmlCanvasElement,
    slot: &SessionSlot,
    name: &str,
    mut handler: impl FnMut(&mut Session, &PointerEvent) + 'static,
) -> Result<(), JsValue> {
    let slot = slot.clone();
    let callback = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
        if let Some(session) = slot.borrow_mut().as_mut() {
            handler(session, &event);
        }
    });
    canvas.add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())?;
    callback.forget();
    Ok(())
}

fn on_click(
    button: &HtmlButtonElement,
    slot: &SessionSlot,
    mut handler: impl FnMut(&mut Session) + 'static,
) -> Result<(), JsValue> {
    let slot = slot.clone();
    let callback = Closure::<dyn FnMut(Event)>::new(move |_| {
        if let Some(session) = slot.borrow_mut().as_mut() {
            handler(session);
        }
    });
    button.add_event_listener_with_callback("click", callback.as_ref().unchecked_ref())?;
    callback.forget();
    Ok(())
}

fn session_storage(window: &Window) -> Option<Storage> {
    window.session_storage().ok().flatten()
}

fn load_attempt(window: &Window) -> u32 {
    session_storage(window)
        .and_then(|storage| storage.get_item(ATTEMPT_KEY).ok().flatten())
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

fn store_attempt(window: &Window, attempt: Option<u32>) {
    let Some(storage) = session_storage(window) else {
        return;
    };
    let result = match attempt {
        Some(attempt) => storage.set_item(ATTEMPT_KEY, &attempt.to_string()),
        None => storage.remove_item(ATTEMPT_KEY),
    };
    if let Err(error) = result {
        warn!("could not persist reconnect attempt: {error:?}");
    }
}
