//! Wayland client bootstrap and protocol glue
//!
//! Binds the globals the client needs, creates the xdg toplevel and runs a
//! blocking dispatch loop until the session closes. Each protocol listener
//! is a `Dispatch` impl on [`ClientState`] that forwards into [`Session`].

use crate::buffer::BufferSlot;
use crate::config::PlaygroundConfig;
use crate::frame::FrameStats;
use crate::input::ButtonState;
use crate::session::{Session, SurfaceBackend};
use crate::shm::SharedMemory;
use anyhow::{Context, Result};
use log::{debug, error, info, trace, warn};
use std::os::fd::AsFd;
use wayland_client::{
    delegate_noop,
    protocol::{
        wl_buffer, wl_callback, wl_compositor, wl_pointer, wl_registry, wl_seat, wl_shm,
        wl_shm_pool, wl_surface,
    },
    Connection, Dispatch, Proxy, QueueHandle, WEnum,
};
use wayland_protocols::xdg::shell::client::{xdg_surface, xdg_toplevel, xdg_wm_base};

/// Highest global versions this client speaks
const COMPOSITOR_VERSION: u32 = 4;
const SHM_VERSION: u32 = 1;
const SEAT_VERSION: u32 = 5;
const WM_BASE_VERSION: u32 = 3;

/// Protocol objects owned by the session
pub struct WaylandBackend {
    qh: QueueHandle<ClientState>,
    compositor: Option<wl_compositor::WlCompositor>,
    shm: Option<wl_shm::WlShm>,
    seat: Option<wl_seat::WlSeat>,
    pointer: Option<wl_pointer::WlPointer>,
    wm_base: Option<xdg_wm_base::XdgWmBase>,
    surface: Option<wl_surface::WlSurface>,
    xdg_surface: Option<xdg_surface::XdgSurface>,
    toplevel: Option<xdg_toplevel::XdgToplevel>,
}

impl std::fmt::Debug for WaylandBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaylandBackend")
            .field("compositor", &self.compositor.as_ref().map(|p| p.id()))
            .field("shm", &self.shm.as_ref().map(|p| p.id()))
            .field("seat", &self.seat.as_ref().map(|p| p.id()))
            .field("wm_base", &self.wm_base.as_ref().map(|p| p.id()))
            .field("surface", &self.surface.as_ref().map(|p| p.id()))
            .finish()
    }
}

impl WaylandBackend {
    pub fn new(qh: QueueHandle<ClientState>) -> Self {
        Self {
            qh,
            compositor: None,
            shm: None,
            seat: None,
            pointer: None,
            wm_base: None,
            surface: None,
            xdg_surface: None,
            toplevel: None,
        }
    }

    /// Bind a global if it is one we use
    fn bind_global(
        &mut self,
        registry: &wl_registry::WlRegistry,
        name: u32,
        interface: &str,
        version: u32,
    ) {
        let qh = self.qh.clone();
        match interface {
            "wl_compositor" => {
                info!("🧩 Binding compositor...");
                let version = version.min(COMPOSITOR_VERSION);
                self.compositor = Some(registry.bind(name, version, &qh, ()));
            }
            "wl_shm" => {
                info!("🧩 Binding shm...");
                self.shm = Some(registry.bind(name, version.min(SHM_VERSION), &qh, ()));
            }
            "xdg_wm_base" => {
                info!("🧩 Binding XDG WM base...");
                self.wm_base = Some(registry.bind(name, version.min(WM_BASE_VERSION), &qh, ()));
            }
            "wl_seat" => {
                info!("🧩 Binding seat...");
                self.seat = Some(registry.bind(name, version.min(SEAT_VERSION), &qh, ()));
            }
            _ => {}
        }
    }

    /// Create surface, xdg surface and toplevel, then do the initial commit
    fn create_window(&mut self, title: &str, app_id: &str) -> Result<()> {
        let compositor = self
            .compositor
            .as_ref()
            .context("Compositor did not advertise wl_compositor")?;
        let wm_base = self
            .wm_base
            .as_ref()
            .context("Compositor did not advertise xdg_wm_base")?;
        if self.shm.is_none() {
            anyhow::bail!("Compositor did not advertise wl_shm");
        }

        info!("🖼️ Creating surface...");
        let surface = compositor.create_surface(&self.qh, ());

        info!("🖼️ Creating XDG surface...");
        let xdg_surface = wm_base.get_xdg_surface(&surface, &self.qh, ());

        info!("🖼️ Setting XDG toplevel...");
        let toplevel = xdg_surface.get_toplevel(&self.qh, ());
        toplevel.set_title(title.to_string());
        toplevel.set_app_id(app_id.to_string());

        info!("🖼️ Committing surface...");
        surface.commit();

        self.surface = Some(surface);
        self.xdg_surface = Some(xdg_surface);
        self.toplevel = Some(toplevel);
        Ok(())
    }

    fn update_pointer(&mut self, seat: &wl_seat::WlSeat, has_pointer: bool) {
        match (has_pointer, self.pointer.take()) {
            (true, None) => {
                debug!("Seat gained a pointer");
                self.pointer = Some(seat.get_pointer(&self.qh, ()));
            }
            (false, Some(pointer)) => {
                debug!("Seat lost its pointer");
                if pointer.version() >= 3 {
                    pointer.release();
                }
            }
            (_, existing) => self.pointer = existing,
        }
    }
}

impl SurfaceBackend for WaylandBackend {
    type Buffer = wl_buffer::WlBuffer;

    fn ack_configure(&mut self, serial: u32) {
        if let Some(xdg_surface) = &self.xdg_surface {
            xdg_surface.ack_configure(serial);
        }
    }

    fn create_buffer(
        &mut self,
        shm: &SharedMemory,
        pool_size: i32,
        slot: &BufferSlot,
    ) -> Result<Self::Buffer> {
        let wl_shm = self.shm.as_ref().context("wl_shm is not bound")?;
        let pool = wl_shm.create_pool(shm.as_fd(), pool_size, &self.qh, ());
        let buffer = pool.create_buffer(
            slot.offset,
            slot.width,
            slot.height,
            slot.stride,
            wl_shm::Format::Xrgb8888,
            &self.qh,
            (),
        );
        pool.destroy();
        Ok(buffer)
    }

    fn attach(&mut self, buffer: &Self::Buffer) {
        if let Some(surface) = &self.surface {
            surface.attach(Some(buffer), 0, 0);
        }
    }

    fn damage_all(&mut self) {
        if let Some(surface) = &self.surface {
            if surface.version() >= 4 {
                surface.damage_buffer(0, 0, i32::MAX, i32::MAX);
            } else {
                surface.damage(0, 0, i32::MAX, i32::MAX);
            }
        }
    }

    fn commit(&mut self) {
        if let Some(surface) = &self.surface {
            surface.commit();
        }
    }

    fn request_frame(&mut self) {
        if let Some(surface) = &self.surface {
            surface.frame(&self.qh, ());
        }
    }

    fn start_move(&mut self, serial: u32) {
        match (&self.toplevel, &self.seat) {
            (Some(toplevel), Some(seat)) => toplevel._move(seat, serial),
            _ => warn!("Cannot start move without a toplevel and a seat"),
        }
    }

    fn destroy_toplevel(&mut self) {
        if let Some(toplevel) = self.toplevel.take() {
            toplevel.destroy();
        }
    }

    fn destroy_xdg_surface(&mut self) {
        if let Some(xdg_surface) = self.xdg_surface.take() {
            xdg_surface.destroy();
        }
    }

    fn destroy_wm_base(&mut self) {
        if let Some(wm_base) = self.wm_base.take() {
            wm_base.destroy();
        }
    }

    fn destroy_surface(&mut self) {
        if let Some(surface) = self.surface.take() {
            surface.destroy();
        }
    }
}

/// State handed to every `Dispatch` impl
#[derive(Debug)]
pub struct ClientState {
    pub session: Session<WaylandBackend>,
}

impl Dispatch<wl_registry::WlRegistry, ()> for ClientState {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                debug!("Global name: {}, interface: '{}', version: {}", name, interface, version);
                state.session.backend_mut().bind_global(registry, name, &interface, version);
            }
            wl_registry::Event::GlobalRemove { name } => {
                debug!("Global {} removed", name);
            }
            _ => {}
        }
    }
}

impl Dispatch<xdg_wm_base::XdgWmBase, ()> for ClientState {
    fn event(
        _: &mut Self,
        wm_base: &xdg_wm_base::XdgWmBase,
        event: xdg_wm_base::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            trace!("Ping {}", serial);
            wm_base.pong(serial);
        }
    }
}

impl Dispatch<xdg_surface::XdgSurface, ()> for ClientState {
    fn event(
        state: &mut Self,
        _: &xdg_surface::XdgSurface,
        event: xdg_surface::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            state.session.on_configure(serial);
        }
    }
}

impl Dispatch<xdg_toplevel::XdgToplevel, ()> for ClientState {
    fn event(
        state: &mut Self,
        _: &xdg_toplevel::XdgToplevel,
        event: xdg_toplevel::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            xdg_toplevel::Event::Configure { width, height, .. } => {
                // Buffer size is fixed; the suggestion is only logged
                trace!("Toplevel suggested size {}x{}", width, height);
            }
            xdg_toplevel::Event::Close => {
                info!("Compositor asked the window to close");
                state.session.close();
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_callback::WlCallback, ()> for ClientState {
    fn event(
        state: &mut Self,
        _: &wl_callback::WlCallback,
        event: wl_callback::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_callback::Event::Done { callback_data } = event {
            state.session.on_frame_done(callback_data);
        }
    }
}

impl Dispatch<wl_buffer::WlBuffer, ()> for ClientState {
    fn event(
        _: &mut Self,
        buffer: &wl_buffer::WlBuffer,
        event: wl_buffer::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_buffer::Event::Release = event {
            trace!("Buffer released by compositor");
            buffer.destroy();
        }
    }
}

/// Newer seats may advertise bits this binding does not know; the pointer
/// bit is still meaningful then.
fn seat_has_pointer(capabilities: WEnum<wl_seat::Capability>) -> bool {
    let bits = match capabilities {
        WEnum::Value(caps) => caps.bits(),
        WEnum::Unknown(raw) => raw,
    };
    bits & wl_seat::Capability::Pointer.bits() != 0
}

impl Dispatch<wl_seat::WlSeat, ()> for ClientState {
    fn event(
        state: &mut Self,
        seat: &wl_seat::WlSeat,
        event: wl_seat::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            wl_seat::Event::Capabilities { capabilities } => {
                let has_pointer = seat_has_pointer(capabilities);
                state.session.backend_mut().update_pointer(seat, has_pointer);
            }
            wl_seat::Event::Name { name } => debug!("Seat name: {}", name),
            _ => {}
        }
    }
}

impl Dispatch<wl_pointer::WlPointer, ()> for ClientState {
    fn event(
        state: &mut Self,
        _: &wl_pointer::WlPointer,
        event: wl_pointer::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_pointer::Event::Button {
            serial,
            button,
            state: button_state,
            ..
        } = event
        {
            let button_state = match button_state {
                WEnum::Value(wl_pointer::ButtonState::Pressed) => ButtonState::Pressed,
                _ => ButtonState::Released,
            };
            state.session.on_pointer_button(serial, button, button_state);
        }
    }
}

impl Dispatch<wl_shm::WlShm, ()> for ClientState {
    fn event(
        _: &mut Self,
        _: &wl_shm::WlShm,
        event: wl_shm::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_shm::Event::Format { format } = event {
            trace!("wl_shm supports {:?}", format);
        }
    }
}

// No events we care about from these.
delegate_noop!(ClientState: ignore wl_compositor::WlCompositor);
delegate_noop!(ClientState: ignore wl_surface::WlSurface);
delegate_noop!(ClientState: ignore wl_shm_pool::WlShmPool);

/// Connect, map the window, and animate until it is closed
pub fn run(config: &PlaygroundConfig) -> Result<FrameStats> {
    let conn = Connection::connect_to_env().map_err(|e| {
        error!("❌ Cannot connect to wayland display: {}", e);
        anyhow::Error::new(e).context("Cannot connect to wayland display")
    })?;

    let mut event_queue = conn.new_event_queue::<ClientState>();
    let qh = event_queue.handle();
    conn.display().get_registry(&qh, ());

    let mut state = ClientState {
        session: Session::from_config(WaylandBackend::new(qh), config),
    };

    info!("🔄 Roundtrip...");
    event_queue
        .roundtrip(&mut state)
        .context("Initial registry roundtrip failed")?;

    let backend = state.session.backend_mut();
    backend.create_window(&config.window.title, &config.window.app_id)?;
    backend.request_frame();

    while !state.session.is_closed() {
        event_queue
            .blocking_dispatch(&mut state)
            .context("Wayland dispatch failed")?;
        trace!("Messages dispatched");
    }

    // Push the destroy requests out before the connection drops
    if let Err(e) = conn.flush() {
        warn!("Failed to flush on shutdown: {}", e);
    }

    let stats = state.session.stats().clone();
    info!(
        "✨ Session closed after {} frames ({} skipped)",
        stats.frames_drawn, stats.frames_skipped
    );
    Ok(stats)
}
