//! Browser smoke test, run with `wasm-pack test --headless --chrome`.
//! The logic coverage lives in the native `#[cfg(test)]` modules; this only
//! proves the client boots against a real DOM.

#![cfg(target_arch = "wasm32")]

use client::GameClient;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn mount_canvas(id: &str) {
    let document = web_sys::window().unwrap().document().unwrap();
    let canvas = document.create_element("canvas").unwrap();
    canvas.set_id(id);
    document.body().unwrap().append_child(&canvas).unwrap();
}

#[wasm_bindgen_test]
fn client_boots_and_ticks_against_a_real_dom() {
    mount_canvas("gameCanvas");
    mount_canvas("minimapCanvas");

    let mut client = GameClient::new("gameCanvas", Some("ws://localhost:9999/game"))
        .expect("client construction");
    // A few ticks with no server traffic: nothing to draw but the shell
    // must not error.
    for _ in 0..3 {
        client.update().expect("update");
    }
    assert!(!client.is_alive());
}
