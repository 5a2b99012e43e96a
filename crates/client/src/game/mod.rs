// Game orchestration - per-tick update, inbound message handling, frame
// compositing
//
// One cooperative execution context: network callbacks only enqueue raw
// frames and flip flags; everything is decoded, applied and drawn inside
// update(), so the render pass never observes a half-applied snapshot.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlCanvasElement, window};

use protocol::{Command, ServerMessage, StateSnapshot, decode_frame};

use crate::camera::Camera;
use crate::effects::{Flashes, ParticleSystem};
use crate::input::Input;
use crate::lighting::LightMask;
use crate::network::Connection;
use crate::render::{Minimap, Renderer, Starfield};
use crate::scanner::Scanner;
use crate::theme::{self, Theme};
use crate::ui::Ui;
use crate::utils;
use crate::world::World;

/// Radial particle pulse emitted when the scanner powers on.
const SCANNER_PULSE_COUNT: usize = 20;

pub struct GameClient {
    connection: Rc<RefCell<Connection>>,
    renderer: Renderer,
    minimap: Minimap,
    light_mask: LightMask,
    camera: Camera,
    world: World,
    particles: ParticleSystem,
    flashes: Flashes,
    scanner: Scanner,
    starfield: Starfield,
    input_state: Rc<RefCell<Input>>,
    ui: Ui,
    theme: &'static Theme,

    // Handoff from WebSocket callbacks to the tick.
    packet_queue: Rc<RefCell<Vec<Vec<u8>>>>,
    ws_open_flag: Rc<Cell<bool>>,
    ws_close_flag: Rc<Cell<bool>>,

    frame: u64,
    fps_frames: u32,
    last_fps_update: f64,
    last_snapshot_received: f64,
    light_mask_size: (u32, u32),
}

impl GameClient {
    pub fn new(canvas_id: &str, server_url: Option<&str>) -> Result<GameClient, JsValue> {
        let window = window().ok_or("No window")?;
        let document = window.document().ok_or("No document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or("Canvas not found")?
            .dyn_into::<HtmlCanvasElement>()?;

        canvas.set_width(window.inner_width()?.as_f64().unwrap_or(800.0) as u32);
        canvas.set_height(window.inner_height()?.as_f64().unwrap_or(600.0) as u32);

        let renderer = Renderer::new(canvas)?;
        let minimap = Minimap::new()?;
        let light_mask = LightMask::new(&document)?;
        let connection = Connection::new(server_url)?;
        let ui = Ui::new(document);

        let theme = theme::by_id(&theme::load_persisted_id());
        ui.apply_theme(theme)?;
        ui.set_status("CONNECTING", false);

        let now = utils::now();
        Ok(Self {
            connection: Rc::new(RefCell::new(connection)),
            renderer,
            minimap,
            light_mask,
            camera: Camera::new(),
            world: World::new(),
            particles: ParticleSystem::new(),
            flashes: Flashes::default(),
            scanner: Scanner::new(),
            starfield: Starfield::new(),
            input_state: Rc::new(RefCell::new(Input::new())),
            ui,
            theme,
            packet_queue: Rc::new(RefCell::new(Vec::new())),
            ws_open_flag: Rc::new(Cell::new(false)),
            ws_close_flag: Rc::new(Cell::new(false)),
            frame: 0,
            fps_frames: 0,
            last_fps_update: now,
            last_snapshot_received: 0.0,
            light_mask_size: (0, 0),
        })
    }

    // -- shared handles for the lib.rs event wiring --------------------------

    pub(crate) fn packet_queue(&self) -> Rc<RefCell<Vec<Vec<u8>>>> {
        self.packet_queue.clone()
    }

    pub(crate) fn input_state(&self) -> Rc<RefCell<Input>> {
        self.input_state.clone()
    }

    pub(crate) fn ws_open_flag(&self) -> Rc<Cell<bool>> {
        self.ws_open_flag.clone()
    }

    pub(crate) fn ws_close_flag(&self) -> Rc<Cell<bool>> {
        self.ws_close_flag.clone()
    }

    pub fn websocket(&self) -> web_sys::WebSocket {
        self.connection.borrow().websocket().clone()
    }

    pub(crate) fn reconnect(&mut self) -> Result<web_sys::WebSocket, JsValue> {
        self.connection.borrow_mut().reconnect()
    }

    pub fn is_alive(&self) -> bool {
        self.world.is_local_alive()
    }

    pub fn send(&self, command: &Command) {
        self.connection.borrow().send(command);
    }

    pub fn debug_data(&self) -> Option<serde_json::Value> {
        self.world.debug_data().cloned()
    }

    pub(crate) fn zoom_in(&mut self) {
        self.camera.zoom_in();
    }

    pub(crate) fn zoom_out(&mut self) {
        self.camera.zoom_out();
    }

    /// Switch to the next theme: persist it, restyle the page and drop every
    /// cached sprite so glyphs regenerate with the new palette.
    pub(crate) fn cycle_theme(&mut self) {
        self.theme = theme::by_id(theme::next_id(self.theme.id));
        theme::persist_id(self.theme.id);
        if let Err(e) = self.ui.apply_theme(self.theme) {
            log::warn!("Failed to apply theme: {e:?}");
        }
        self.renderer.invalidate_sprites();
    }

    /// Scanner toggle entry point for the input layer. Announces the new
    /// state to the server and spawns the activation visuals.
    pub(crate) fn toggle_scanner(&mut self, now: f64) {
        let Some(pos) = self.world.local().map(|e| e.position.to_vec2()) else {
            return;
        };
        match self.scanner.toggle(now) {
            Some(true) => {
                self.connection.borrow().send(&Command::ScannerState(true));
                self.particles.spawn_ring(pos, self.theme.accent);
                self.particles
                    .spawn_pulse(pos, self.theme.accent, SCANNER_PULSE_COUNT);
            }
            Some(false) => {
                self.connection.borrow().send(&Command::ScannerState(false));
            }
            None => {}
        }
    }

    // -- per-tick update -----------------------------------------------------

    /// Main update, called once per animation frame.
    pub fn update(&mut self) -> Result<(), JsValue> {
        let now = utils::now();
        self.frame += 1;

        if self.ws_open_flag.get() {
            self.ws_open_flag.set(false);
            self.ui.set_status("CONNECTED", true);
            self.ui.log("Uplink established.");
        }
        if self.ws_close_flag.get() {
            self.ws_close_flag.set(false);
            self.ui.set_status("DISCONNECTED", false);
            self.ui.log("Uplink lost. Retrying...");
        }

        // Drain frames queued by the WebSocket callback. Decode, replace,
        // then derive effects - strictly in that order per frame.
        let frames: Vec<Vec<u8>> = self.packet_queue.borrow_mut().drain(..).collect();
        for frame in frames {
            self.handle_frame(&frame, now);
        }

        self.process_input(now);

        let focus = self.world.local().map(|e| e.position.to_vec2());
        self.camera.update(focus, self.renderer.screen(), now / 1000.0);

        self.scanner.refresh(&self.world, now);
        self.particles.tick();
        self.flashes.tick();

        self.render(now)?;

        // FPS readout once per second.
        self.fps_frames += 1;
        if now - self.last_fps_update >= 1000.0 {
            self.ui.set_fps(self.fps_frames);
            self.fps_frames = 0;
            self.last_fps_update = now;
        }

        Ok(())
    }

    fn handle_frame(&mut self, data: &[u8], now: f64) {
        match decode_frame(data) {
            Err(e) => log::warn!("Dropping undecodable frame: {e}"),
            Ok(ServerMessage::Welcome(welcome)) => {
                self.ui.set_player_name(&welcome.player_name);
                self.ui
                    .log(&format!("Welcome, agent [#58a6ff]{}", welcome.player_name));
                self.world.set_local(welcome.player_id, welcome.player_name);
            }
            Ok(ServerMessage::State(state)) => self.apply_state(state, now),
        }
    }

    fn apply_state(&mut self, state: StateSnapshot, now: f64) {
        // Inter-snapshot gap doubles as the latency readout.
        if self.last_snapshot_received > 0.0 {
            self.ui.set_latency(now - self.last_snapshot_received);
        }
        self.last_snapshot_received = now;

        let StateSnapshot {
            objects,
            events,
            effects,
            debug_data,
            vibration,
            ..
        } = state;

        self.world.set_debug_data(debug_data);
        self.world.apply_objects(objects, now);

        for event in &events {
            self.ui.log(event);
        }

        // Compare against the pre-replace hp captured by the store: a drop
        // raises the damage flash within this same update cycle.
        let damage = self.world.local_damage();
        if damage > 0.0 {
            self.flashes.trigger_damage(damage);
            self.camera.add_shake(2.0 + damage as f32);
        }
        if let Some(vibration) = vibration {
            self.camera.add_shake(vibration as f32);
        }

        // Effects spawn strictly after the snapshot replace, so their
        // profiles see fresh entity data.
        for effect in &effects {
            let impulse = self.particles.apply_effect(effect);
            self.flashes.apply_impulse(&impulse);
            if impulse.shake > 0.0 {
                self.camera.add_shake(impulse.shake);
            }
        }

        if let Some(me) = self.world.local() {
            self.ui.update_player_panel(me);
        }
        self.ui.update_player_list(&self.world);
    }

    fn process_input(&mut self, now: f64) {
        let (started, stopped, shoot, scan, enter, click) = {
            let mut input = self.input_state.borrow_mut();
            let started = input.started_directions();
            let stopped = input.stopped_directions();
            let shoot = input.shoot.just_pressed();
            let scan = input.scan.just_pressed();
            let enter = input.enter.just_pressed();
            let click = input.pending_click.take();
            self.camera.pointer = input.mouse_pos;
            input.roll_previous();
            (started, stopped, shoot, scan, enter, click)
        };

        {
            let connection = self.connection.borrow();
            for direction in started {
                connection.send(&Command::MoveStart(direction));
            }
            for direction in stopped {
                connection.send(&Command::MoveStop(direction));
            }
            // Firing is suppressed while the scanner draws power.
            if shoot && !self.scanner.is_active() {
                connection.send(&Command::Shoot(None));
            }
            if let Some(screen_pos) = click {
                if !self.scanner.is_active() && self.world.local().is_some() {
                    let target = self.camera.screen_to_world(screen_pos);
                    connection.send(&Command::Shoot(Some((target.x as f64, target.y as f64))));
                }
            }
        }

        if enter {
            self.ui.focus_chat_input();
        }
        if scan {
            self.toggle_scanner(now);
        }
    }

    // -- frame compositing ---------------------------------------------------

    /// Fixed layer order; each layer assumes the previous one is painted.
    fn render(&mut self, now: f64) -> Result<(), JsValue> {
        let screen = self.renderer.screen();
        let size = (screen.x as u32, screen.y as u32);
        if size != self.light_mask_size {
            self.light_mask.resize(size.0, size.1);
            self.light_mask_size = size;
        }

        self.renderer.clear(self.theme.bg);
        self.renderer.draw_resource_cells(&self.world, &self.camera);
        self.renderer.draw_grid(&self.camera, self.theme)?;
        self.renderer.draw_stars(&mut self.starfield, &self.camera);
        self.renderer
            .draw_wormhole_links(&self.world, &self.camera, self.theme);
        self.renderer.draw_entities(
            &self.world,
            &self.camera,
            &mut self.particles,
            self.frame,
            self.theme,
        );
        self.renderer.draw_beams(self.particles.beams(), &self.camera);
        self.renderer.draw_rings(self.particles.rings(), &self.camera);

        // Fog of war only restricts a living viewer; the scan overlay sits
        // directly on top of the dark.
        if self.world.is_local_alive() {
            self.light_mask.compose(
                self.renderer.ctx(),
                &self.world,
                &self.camera,
                self.starfield.stars(),
                self.theme,
                screen,
            )?;
            self.renderer
                .draw_scan_overlay(&self.scanner, &self.world, &self.camera, self.theme, now)?;
        }

        // Particles go above the fog so they stay visible in the dark.
        self.renderer
            .draw_particles(self.particles.particles(), &self.camera);

        if self.world.local().is_some_and(|e| e.is_inert()) {
            self.renderer.draw_death_overlay(self.theme, now);
        }

        self.renderer.draw_flashes(&self.flashes, self.theme);
        self.renderer.draw_glitch(self.flashes.glitch_level());

        self.minimap.draw(&self.world, self.theme, now);
        Ok(())
    }
}

// Pointer helper shared by the click handler in lib.rs.
impl GameClient {
    pub(crate) fn note_pointer(&self, pos: Vec2) {
        self.input_state.borrow_mut().mouse_pos = pos;
    }
}
