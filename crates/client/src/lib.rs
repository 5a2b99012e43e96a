// WASM client entry point for starlance
// Wires browser events to the game loop. Event handlers only enqueue data or
// flip flags; all real work happens inside GameClient::update on the
// animation tick.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;
use js_sys::{ArrayBuffer, Uint8Array};
use wasm_bindgen::prelude::*;
use web_sys::{
    CloseEvent, Element, HtmlCanvasElement, HtmlInputElement, KeyboardEvent, MessageEvent,
    MouseEvent, WebSocket, WheelEvent, window,
};

use protocol::Command;

mod camera;
mod effects;
mod game;
mod input;
mod lighting;
mod network;
mod render;
mod scanner;
mod theme;
mod ui;
mod utils;
mod world;

pub use game::GameClient;

use crate::input::Input;
use crate::network::RECONNECT_DELAY_MS;

/// Initialize panic reporting and console logging once.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Create and return a GameClient that JS can interact with
#[wasm_bindgen]
pub struct GameClientWrapper {
    client: Rc<RefCell<GameClient>>,
}

#[wasm_bindgen]
impl GameClientWrapper {
    /// Create a new game client. `server_url` may be omitted to derive the
    /// endpoint from the page location.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, server_url: Option<String>) -> Result<GameClientWrapper, JsValue> {
        init();

        let client = GameClient::new(canvas_id, server_url.as_deref())?;
        let client_rc = Rc::new(RefCell::new(client));

        setup_websocket_handler(client_rc.clone())?;
        setup_animation_loop(client_rc.clone())?;
        setup_key_handlers(client_rc.clone())?;
        setup_pointer_handlers(client_rc.clone())?;
        setup_chat_handlers(client_rc.clone())?;
        setup_hud_handlers(client_rc.clone())?;
        setup_resize_handler(canvas_id)?;

        Ok(GameClientWrapper { client: client_rc })
    }

    /// True once the player is spawned and not rebooting.
    pub fn is_alive(&self) -> bool {
        self.client.borrow().is_alive()
    }

    /// Send a chat message to the server.
    pub fn send_chat(&self, message: &str) {
        self.client.borrow().send(&Command::Chat(message.to_string()));
    }

    /// Request a shop purchase by item identifier.
    pub fn buy(&self, item: &str) {
        self.client.borrow().send(&Command::Buy(item.to_string()));
    }

    pub fn change_name(&self, name: &str) {
        self.client
            .borrow()
            .send(&Command::ChangeName(name.to_string()));
    }

    pub fn change_color(&self) {
        self.client.borrow().send(&Command::ChangeColor);
    }

    /// Scanner toggle entry point for touch controls.
    pub fn trigger_scan(&self) {
        self.client.borrow_mut().toggle_scanner(utils::now());
    }

    /// Latest server debug payload, if any, as a plain JS object.
    pub fn debug_data(&self) -> JsValue {
        match self.client.borrow().debug_data() {
            Some(value) => serde_wasm_bindgen::to_value(&value).unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    /// Get the underlying WebSocket for connection status checks.
    pub fn websocket(&self) -> WebSocket {
        self.client.borrow().websocket()
    }
}

struct ReconnectState {
    scheduled: bool,
}

fn attach_websocket_handlers(
    client: Rc<RefCell<GameClient>>,
    ws: WebSocket,
    reconnect_state: Rc<RefCell<ReconnectState>>,
) -> Result<(), JsValue> {
    // Shared handles that don't require borrowing the client later.
    let packet_queue = client.borrow().packet_queue();
    let ws_open_flag = client.borrow().ws_open_flag();
    let ws_close_flag = client.borrow().ws_close_flag();

    // onmessage - queue the raw frame; the tick decodes it. Binary frames
    // are the norm, text frames carry the JSON fallback encoding.
    let onmessage = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Ok(buffer) = event.data().dyn_into::<ArrayBuffer>() {
            let array = Uint8Array::new(&buffer);
            let mut data = vec![0u8; array.length() as usize];
            array.copy_to(&mut data);
            packet_queue.borrow_mut().push(data);
        } else if let Some(text) = event.data().as_string() {
            packet_queue.borrow_mut().push(text.into_bytes());
        }
    }) as Box<dyn FnMut(MessageEvent)>);
    ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget();

    // onopen - flag for the game loop.
    let onopen_state = reconnect_state.clone();
    let onopen = Closure::wrap(Box::new(move |_event: JsValue| {
        log::info!("WebSocket connected");
        ws_open_flag.set(true);
        if let Ok(mut state) = onopen_state.try_borrow_mut() {
            state.scheduled = false;
        }
    }) as Box<dyn FnMut(JsValue)>);
    ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
    onopen.forget();

    // onerror - diagnostics only; reconnects are driven by onclose.
    let onerror = Closure::wrap(Box::new(move |e: JsValue| {
        log::error!("WebSocket error: {e:?}");
    }) as Box<dyn FnMut(JsValue)>);
    ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onerror.forget();

    // onclose - schedule exactly one reconnect attempt at the fixed delay.
    // Repeats indefinitely; there is no backoff growth or retry cap.
    let client_weak: Weak<RefCell<GameClient>> = Rc::downgrade(&client);
    let onclose_state = reconnect_state;
    let onclose = Closure::wrap(Box::new(move |event: CloseEvent| {
        log::info!("WebSocket closed: {}", event.code());
        ws_close_flag.set(true);

        {
            let mut state = onclose_state.borrow_mut();
            if state.scheduled {
                return;
            }
            state.scheduled = true;
        }

        if let Some(window) = web_sys::window() {
            let attempt_client = client_weak.clone();
            let attempt_state = onclose_state.clone();
            let callback = Closure::wrap(Box::new(move || {
                let Some(client_rc) = attempt_client.upgrade() else {
                    return;
                };
                match client_rc.try_borrow_mut() {
                    Ok(mut client) => match client.reconnect() {
                        Ok(new_ws) => {
                            drop(client);
                            let fresh_state =
                                Rc::new(RefCell::new(ReconnectState { scheduled: false }));
                            if let Err(e) =
                                attach_websocket_handlers(client_rc.clone(), new_ws, fresh_state)
                            {
                                log::error!("Failed to attach handlers: {e:?}");
                            }
                        }
                        Err(e) => {
                            log::error!("Reconnect failed: {e:?}");
                            if let Ok(mut state) = attempt_state.try_borrow_mut() {
                                state.scheduled = false;
                            }
                        }
                    },
                    Err(_) => {
                        log::info!("Reconnect deferred: client busy");
                        if let Ok(mut state) = attempt_state.try_borrow_mut() {
                            state.scheduled = false;
                        }
                    }
                }
            }) as Box<dyn FnMut()>);
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                RECONNECT_DELAY_MS,
            );
            callback.forget();
        }
    }) as Box<dyn FnMut(CloseEvent)>);
    ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
    onclose.forget();

    Ok(())
}

fn setup_websocket_handler(client: Rc<RefCell<GameClient>>) -> Result<(), JsValue> {
    let ws = client.borrow().websocket();
    let reconnect_state = Rc::new(RefCell::new(ReconnectState { scheduled: false }));
    attach_websocket_handlers(client, ws, reconnect_state)
}

fn setup_animation_loop(client: Rc<RefCell<GameClient>>) -> Result<(), JsValue> {
    let window = window().ok_or("No window")?;

    let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();

    let client_clone = client.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        if let Err(e) = client_clone.borrow_mut().update() {
            log::error!("Update error: {e:?}");
        }
        if let Some(win) = web_sys::window() {
            win.request_animation_frame(f.borrow().as_ref().unwrap().as_ref().unchecked_ref())
                .ok();
        }
    }) as Box<dyn FnMut()>));

    window.request_animation_frame(g.borrow().as_ref().unwrap().as_ref().unchecked_ref())?;
    Ok(())
}

/// Returns true when a text input element has focus (chat input). Used to
/// suppress game key bindings while the user is typing.
fn is_text_input_focused() -> bool {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.active_element())
        .map(|el| el.tag_name().eq_ignore_ascii_case("INPUT"))
        .unwrap_or(false)
}

fn setup_key_handlers(client: Rc<RefCell<GameClient>>) -> Result<(), JsValue> {
    let window = window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;

    let input_state = client.borrow().input_state();

    // Keydown
    {
        let input = input_state.clone();
        let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            if is_text_input_focused() {
                return;
            }
            let key = event.key();
            let mut input = input.borrow_mut();
            if let Some(direction) = Input::direction_for_key(&key) {
                input.direction_state(direction).pressed = true;
                return;
            }
            match key.as_str() {
                " " => {
                    event.prevent_default();
                    input.shoot.pressed = true;
                }
                "c" | "C" => input.scan.pressed = true,
                "t" | "T" | "Enter" => {
                    event.prevent_default();
                    input.enter.pressed = true;
                }
                _ => {}
            }
        }) as Box<dyn FnMut(_)>);
        document.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Keyup
    {
        let input = input_state.clone();
        let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            let key = event.key();
            let mut input = input.borrow_mut();
            if let Some(direction) = Input::direction_for_key(&key) {
                input.direction_state(direction).pressed = false;
                return;
            }
            match key.as_str() {
                " " => input.shoot.pressed = false,
                "c" | "C" => input.scan.pressed = false,
                "t" | "T" | "Enter" => input.enter.pressed = false,
                _ => {}
            }
        }) as Box<dyn FnMut(_)>);
        document.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    Ok(())
}

fn setup_pointer_handlers(client: Rc<RefCell<GameClient>>) -> Result<(), JsValue> {
    let window = window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;

    // Mouse move - feeds the camera's parallax pan.
    {
        let client = client.clone();
        let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
            let pos = Vec2::new(event.client_x() as f32, event.client_y() as f32);
            client.borrow().note_pointer(pos);
        }) as Box<dyn FnMut(_)>);
        document.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Mouse down - targeted fire, unless the click landed on a HUD panel.
    {
        let client = client.clone();
        let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
            if let Some(target) = event.target() {
                if let Ok(element) = target.dyn_into::<Element>() {
                    if element.closest(".hud-panel").ok().flatten().is_some() {
                        return;
                    }
                }
            }
            let pos = Vec2::new(event.client_x() as f32, event.client_y() as f32);
            client.borrow().input_state().borrow_mut().pending_click = Some(pos);
        }) as Box<dyn FnMut(_)>);
        document.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Wheel - discrete zoom steps.
    {
        let closure = Closure::wrap(Box::new(move |event: WheelEvent| {
            if is_text_input_focused() {
                return;
            }
            let mut client = client.borrow_mut();
            if event.delta_y() < 0.0 {
                client.zoom_in();
            } else {
                client.zoom_out();
            }
        }) as Box<dyn FnMut(_)>);
        document.add_event_listener_with_callback("wheel", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    Ok(())
}

fn setup_chat_handlers(client: Rc<RefCell<GameClient>>) -> Result<(), JsValue> {
    let window = window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;

    let Some(chat_input) = document.get_element_by_id("chat-input") else {
        return Ok(()); // page variant without chat
    };
    let chat_input = chat_input.dyn_into::<HtmlInputElement>()?;

    let chat_outer = chat_input.clone();
    let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
        event.stop_propagation();
        match event.key().as_str() {
            "Enter" => {
                event.prevent_default();
                let message = chat_input.value().trim().to_string();
                if !message.is_empty() {
                    client.borrow().send(&Command::Chat(message));
                }
                chat_input.set_value("");
                let _ = chat_input.blur();
            }
            "Escape" => {
                event.prevent_default();
                chat_input.set_value("");
                let _ = chat_input.blur();
            }
            _ => {}
        }
    }) as Box<dyn FnMut(_)>);
    chat_outer.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
    closure.forget();

    Ok(())
}

fn setup_hud_handlers(client: Rc<RefCell<GameClient>>) -> Result<(), JsValue> {
    let window = window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;

    // Click on the player name: rename prompt.
    if let Some(name_el) = document.get_element_by_id("player-name") {
        let client = client.clone();
        let closure = Closure::wrap(Box::new(move |_: JsValue| {
            let name = web_sys::window()
                .and_then(|w| w.prompt_with_message("Enter new agent name:").ok())
                .flatten();
            if let Some(name) = name {
                let name = name.trim().to_string();
                if !name.is_empty() {
                    client.borrow().send(&Command::ChangeName(name));
                }
            }
        }) as Box<dyn FnMut(JsValue)>);
        name_el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Click on the color indicator: reroll color.
    if let Some(color_el) = document.get_element_by_id("player-color-indicator") {
        let client = client.clone();
        let closure = Closure::wrap(Box::new(move |_: JsValue| {
            client.borrow().send(&Command::ChangeColor);
        }) as Box<dyn FnMut(JsValue)>);
        color_el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Theme selector cycles the palette.
    if let Some(theme_el) = document.get_element_by_id("theme-selector") {
        let closure = Closure::wrap(Box::new(move |_: JsValue| {
            client.borrow_mut().cycle_theme();
        }) as Box<dyn FnMut(JsValue)>);
        theme_el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    Ok(())
}

/// Resize the canvas when the browser window is resized.
fn setup_resize_handler(canvas_id: &str) -> Result<(), JsValue> {
    let win = window().ok_or("No window")?;
    let id = canvas_id.to_string();

    let closure = Closure::wrap(Box::new(move || {
        if let (Some(win), Some(doc)) = (
            web_sys::window(),
            web_sys::window().and_then(|w| w.document()),
        ) {
            if let Some(canvas_el) = doc.get_element_by_id(&id) {
                if let Ok(canvas) = canvas_el.dyn_into::<HtmlCanvasElement>() {
                    if let Ok(w) = win.inner_width() {
                        canvas.set_width(w.as_f64().unwrap_or(800.0) as u32);
                    }
                    if let Ok(h) = win.inner_height() {
                        canvas.set_height(h.as_f64().unwrap_or(600.0) as u32);
                    }
                }
            }
        }
    }) as Box<dyn FnMut()>);

    win.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
    closure.forget();

    Ok(())
}
