use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

use crate::channel::{Channel, ChannelError, ReadyState};

#[derive(Debug)]
pub enum WsEvent {
    Open,
    Close { code: u16, reason: String },
    Error,
    Text(String),
}

pub struct WsChannel {
    socket: WebSocket,
}

impl Channel for WsChannel {
    fn ready_state(&self) -> ReadyState {
        ReadyState::from_code(self.socket.ready_state())
    }

    fn send_text(&self, text: &str) -> Result<(), ChannelError> {
        self.socket
            .send_with_str(text)
            .map_err(|error| ChannelError::Send(format!("{error:?}")))
    }

    /// Detaches every handler before closing, so a torn-down session hears
    /// nothing more from this socket.
    fn close(&self) {
        self.socket.set_onopen(None);
        self.socket.set_onclose(None);
        self.socket.set_onerror(None);
        self.socket.set_onmessage(None);
        let _ = self.socket.close();
    }
}

pub fn connect_ws(url: &str, on_event: impl 'static + FnMut(WsEvent)) -> Result<WsChannel, JsValue> {
    let socket = WebSocket::new(url)?;
    let on_event = Rc::new(RefCell::new(on_event));

    {
        let on_event = on_event.clone();
        let onopen = Closure::<dyn FnMut(Event)>::new(move |_| {
            on_event.borrow_mut()(WsEvent::Open);
        });
        socket.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        onopen.forget();
    }

    {
        let on_event = on_event.clone();
        let onclose = Closure::<dyn FnMut(CloseEvent)>::new(move |event: CloseEvent| {
            on_event.borrow_mut()(WsEvent::Close {
                code: event.code(),
                reason: event.reason(),
            });
        });
        socket.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        onclose.forget();
    }

    {
        let on_event = on_event.clone();
        let onerror = Closure::<dyn FnMut(Event)>::new(move |_| {
            on_event.borrow_mut()(WsEvent::Error);
        });
        socket.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();
    }

    {
        let on_event = on_event.clone();
        let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            match event.data().as_string() {
                Some(text) => on_event.borrow_mut()(WsEvent::Text(text)),
                None => log::warn!("ignoring non-text websocket frame"),
            }
        });
        socket.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        onmessage.forget();
    }

    Ok(WsChannel { socket })
}
