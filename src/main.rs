use anyhow::Result;
use clap::{Parser, ValueEnum};
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        MouseEventKind,
    },
    execute, queue,
    style::Print,
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::{
    f32::consts::TAU,
    io::{self, Stdout, Write},
    thread,
    time::{Duration, Instant},
};

// Dimmest to brightest; the whole renderer is monochrome glyphs.
const RAMP: [char; 12] = ['.', ',', '-', '~', ':', ';', '=', '!', '*', '#', '$', '@'];

// Terminal cells are roughly twice as tall as wide.
const ASPECT_Y: f32 = 0.5;

// Points closer than this to the eye plane are dropped instead of divided.
const NEAR_PLANE: f32 = 0.25;

// Donut geometry
const TORUS_R1: f32 = 1.0; // tube radius
const TORUS_R2: f32 = 1.6; // ring radius
const TORUS_THETA_STEP: f32 = 0.03;
const TORUS_PHI_STEP: f32 = 0.01;

// Accretion disk geometry
const DISK_R_IN: f32 = 1.8;
const DISK_R_OUT: f32 = 4.2;
const DISK_R_STEP: f32 = 0.06;
const DISK_THETA_STEP: f32 = 0.015;
const SHADOW_R: f32 = 1.0;
const DOPPLER_K: f32 = 0.55;

// Far-side light is pulled toward the shadow edge instead of traced.
const LENS_PULL: f32 = 0.3;
const LENS_NEAR_Z: f32 = 0.2;
const ARC_DIM: f32 = 0.7;

// Draw-priority biases added to 1/depth. The near plane caps the main
// disk's 1/depth at 4.0, so arc beats disk and ring beats both, ties included.
const BIAS_ARC: f32 = 4.5;
const BIAS_RING: f32 = 6.0;
const RING_OFFSET: f32 = 1.5; // cells outside the shadow edge
const RING_STEP: f32 = 0.008;

// Pointer position to angular velocity (black hole scene).
const TILT_RATE: f32 = 0.05;
const SPIN_RATE: f32 = 0.12;

// One wheel notch, in browser-style delta units.
const WHEEL_NOTCH: f32 = 100.0;

const DONUT_GRID_W: usize = 120;
const DONUT_GRID_H: usize = 35;

// -------------------- Scenes --------------------

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum SceneKind {
    Donut,
    BlackHole,
}

impl SceneKind {
    fn next(self) -> Self {
        match self {
            SceneKind::Donut => SceneKind::BlackHole,
            SceneKind::BlackHole => SceneKind::Donut,
        }
    }
}

#[derive(Clone, Copy)]
struct SceneConfig {
    name: &'static str,
    zoom_min: f32,
    zoom_max: f32,
    zoom_speed: f32,
    bright_scale: f32,
    pointer_sets_angles: bool,
    defaults: ViewState,
}

fn scene_config(scene: SceneKind) -> SceneConfig {
    match scene {
        SceneKind::Donut => SceneConfig {
            name: "donut",
            zoom_min: 2.0,
            zoom_max: 15.0,
            zoom_speed: 0.006,
            bright_scale: 1.5,
            pointer_sets_angles: true,
            defaults: ViewState {
                rot_x: 1.0,
                rot_z: 1.0,
                vel_x: 0.03,
                vel_z: 0.013,
                zoom: 5.0,
            },
        },
        SceneKind::BlackHole => SceneConfig {
            name: "black hole",
            zoom_min: 2.0,
            zoom_max: 12.0,
            zoom_speed: 0.005,
            bright_scale: 1.65,
            pointer_sets_angles: false,
            defaults: ViewState {
                rot_x: 0.4,
                rot_z: 0.0,
                vel_x: 0.0,
                vel_z: 0.02,
                zoom: 6.0,
            },
        },
    }
}

// Projection scale, from whichever grid axis is tighter.
fn scene_scale(scene: SceneKind, w: usize, h: usize) -> f32 {
    let fit = (w as f32).min(h as f32 * 2.0);
    match scene {
        SceneKind::Donut => fit * 0.8,
        SceneKind::BlackHole => fit * 0.55,
    }
}

fn grid_size(scene: SceneKind, term_w: u16, term_h: u16, hud: bool) -> (usize, usize) {
    let w = term_w as usize;
    let h = (term_h as usize).saturating_sub(hud as usize);
    match scene {
        // the donut runs on a fixed stage, cropped to whatever fits
        SceneKind::Donut => (w.min(DONUT_GRID_W).max(10), h.min(DONUT_GRID_H).max(6)),
        SceneKind::BlackHole => (w.clamp(40, 280), h.clamp(20, 90)),
    }
}

// -------------------- View state --------------------

#[derive(Clone, Copy, Debug)]
struct ViewState {
    rot_x: f32,
    rot_z: f32,
    vel_x: f32,
    vel_z: f32,
    zoom: f32,
}

impl ViewState {
    // Angles are unbounded; trig wraps them.
    fn advance(&mut self) {
        self.rot_x += self.vel_x;
        self.rot_z += self.vel_z;
    }

    fn apply_pointer(&mut self, cfg: &SceneConfig, nx: f32, ny: f32) {
        let nx = nx.clamp(0.0, 1.0);
        let ny = ny.clamp(0.0, 1.0);
        if cfg.pointer_sets_angles {
            self.rot_x = ny * TAU;
            self.rot_z = nx * TAU;
        } else {
            self.vel_x = (ny - 0.5) * TILT_RATE;
            self.vel_z = (nx - 0.5) * SPIN_RATE;
        }
    }

    fn apply_scroll(&mut self, cfg: &SceneConfig, delta_y: f32) {
        self.zoom = (self.zoom + delta_y * cfg.zoom_speed).clamp(cfg.zoom_min, cfg.zoom_max);
    }
}

// -------------------- Frame buffer --------------------

struct Frame {
    w: usize,
    h: usize,
    glyphs: Vec<char>,
    depth: Vec<f32>,
}

impl Frame {
    fn new(w: usize, h: usize) -> Self {
        Frame {
            w,
            h,
            glyphs: vec![' '; w * h],
            depth: vec![0.0; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.glyphs.resize(w * h, ' ');
        self.depth.resize(w * h, 0.0);
        self.clear();
    }

    fn clear(&mut self) {
        self.glyphs.fill(' ');
        self.depth.fill(0.0);
    }

    // Depth-tested write: the largest key seen this frame keeps the cell.
    fn plot(&mut self, x: i32, y: i32, depth_key: f32, glyph: char) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.w || y >= self.h {
            return;
        }
        let i = y * self.w + x;
        if depth_key > self.depth[i] {
            self.depth[i] = depth_key;
            self.glyphs[i] = glyph;
        }
    }

    fn to_text(&self) -> String {
        let mut s = String::with_capacity(self.w * self.h + self.h);
        for row in self.glyphs.chunks(self.w) {
            s.extend(row.iter());
            s.push('\n');
        }
        s
    }
}

// -------------------- Projection --------------------

/// View rotation and perspective for one frame; trig is computed once here,
/// not per point. Shared by the donut and all three disk passes.
#[derive(Clone, Copy)]
struct Projector {
    sin_x: f32,
    cos_x: f32,
    sin_z: f32,
    cos_z: f32,
    zoom: f32,
    cx: f32,
    cy: f32,
    scale: f32,
}

impl Projector {
    fn new(view: &ViewState, w: usize, h: usize, scale: f32) -> Self {
        Projector {
            sin_x: view.rot_x.sin(),
            cos_x: view.rot_x.cos(),
            sin_z: view.rot_z.sin(),
            cos_z: view.rot_z.cos(),
            zoom: view.zoom,
            cx: w as f32 / 2.0,
            cy: h as f32 / 2.0,
            scale,
        }
    }

    // rotate about z (spin), then about x (tilt)
    fn rotate(&self, x: f32, y: f32, z: f32) -> (f32, f32, f32) {
        let x1 = x * self.cos_z - y * self.sin_z;
        let y1 = x * self.sin_z + y * self.cos_z;
        let y2 = y1 * self.cos_x - z * self.sin_x;
        let z2 = y1 * self.sin_x + z * self.cos_x;
        (x1, y2, z2)
    }

    /// Perspective-project an already-rotated point to float screen
    /// coordinates plus 1/depth; None once it crosses the near plane.
    fn project(&self, x: f32, y: f32, z: f32) -> Option<(f32, f32, f32)> {
        let depth = z + self.zoom;
        if depth < NEAR_PLANE {
            return None;
        }
        let inv = 1.0 / depth;
        let sx = self.cx + x * inv * self.scale;
        let sy = self.cy + y * inv * self.scale * ASPECT_Y;
        Some((sx, sy, inv))
    }

    // Screen radius of the hole's silhouette, in cell-width units. The
    // rotation leaves the origin fixed, so its depth is just the zoom.
    fn shadow_radius(&self) -> f32 {
        SHADOW_R / self.zoom * self.scale
    }
}

fn luminance_glyph(brightness: f32, scale: f32) -> char {
    let idx = (brightness * RAMP.len() as f32 / scale) as i32;
    RAMP[idx.clamp(0, RAMP.len() as i32 - 1) as usize]
}

// -------------------- Donut scene --------------------

fn sample_donut(p: &Projector, bright_scale: f32, frame: &mut Frame) {
    let theta_steps = (TAU / TORUS_THETA_STEP) as usize;
    let phi_steps = (TAU / TORUS_PHI_STEP) as usize;

    for ti in 0..theta_steps {
        let theta = ti as f32 * TORUS_THETA_STEP;
        let (sin_t, cos_t) = theta.sin_cos();
        let ring = TORUS_R2 + TORUS_R1 * cos_t;

        for pi in 0..phi_steps {
            let phi = pi as f32 * TORUS_PHI_STEP;
            let (sin_p, cos_p) = phi.sin_cos();

            let (x, y, z) = p.rotate(ring * cos_p, ring * sin_p, TORUS_R1 * sin_t);
            let Some((sx, sy, inv)) = p.project(x, y, z) else {
                continue;
            };

            // Lambert-ish term against a light behind and above the viewer;
            // unlit backsides clamp to the dimmest glyph rather than vanish.
            let (_, ny, nz) = p.rotate(cos_t * cos_p, cos_t * sin_p, sin_t);
            let lum = ny - nz;

            frame.plot(
                sx.floor() as i32,
                sy.floor() as i32,
                inv,
                luminance_glyph(lum, bright_scale),
            );
        }
    }
}

// -------------------- Black hole scene --------------------

// Disk, lensed far-side image, and photon ring share one enumeration; the
// depth biases keep the layering fixed no matter the draw order.
fn sample_black_hole(p: &Projector, view: &ViewState, bright_scale: f32, frame: &mut Frame) {
    let shadow_r = p.shadow_radius();
    let shadow_r2 = shadow_r * shadow_r;

    // The disk is flat, so the diffuse term is per-frame, not per-sample.
    let diffuse = 0.3 + 0.7 * p.cos_x.abs();

    let r_steps = ((DISK_R_OUT - DISK_R_IN) / DISK_R_STEP) as usize;
    let theta_steps = (TAU / DISK_THETA_STEP) as usize;

    for ri in 0..r_steps {
        let r = DISK_R_IN + ri as f32 * DISK_R_STEP;
        let heat = (DISK_R_IN / r).powf(1.5);

        for ti in 0..theta_steps {
            let theta = ti as f32 * DISK_THETA_STEP;
            let (sin_t, cos_t) = theta.sin_cos();

            let (x, y, z) = p.rotate(r * cos_t, r * sin_t, 0.0);
            let Some((sx, sy, inv)) = p.project(x, y, z) else {
                continue;
            };

            // sin of the spun azimuth; the bright (approaching) side stays
            // fixed on screen while the disk turns under it
            let sin_spun = sin_t * p.cos_z + cos_t * p.sin_z;
            let lum = heat * (1.0 + DOPPLER_K * sin_spun) * diffuse;

            // screen offset in aspect-normalized units
            let dx = sx - p.cx;
            let dy = (sy - p.cy) / ASPECT_Y;
            let d2 = dx * dx + dy * dy;

            // main disk; the far side is hidden where it passes behind the hole
            if !(z > 0.0 && d2 < shadow_r2) {
                frame.plot(
                    sx.floor() as i32,
                    sy.floor() as i32,
                    inv,
                    luminance_glyph(lum, bright_scale),
                );
            }

            // lensed arc: far-side light bent around the shadow edge,
            // never inside it
            if z > LENS_NEAR_Z {
                let d = d2.sqrt();
                if d > shadow_r {
                    let bent = shadow_r + (d - shadow_r) * LENS_PULL;
                    let bx = p.cx + dx / d * bent;
                    let by = p.cy + dy / d * bent * ASPECT_Y;
                    frame.plot(
                        bx.floor() as i32,
                        by.floor() as i32,
                        inv + BIAS_ARC,
                        luminance_glyph(lum * ARC_DIM, bright_scale),
                    );
                }
            }
        }
    }

    // photon ring, just outside the shadow edge, on top of everything
    let ring_r = shadow_r + RING_OFFSET;
    let ring_key = 1.0 / p.zoom + BIAS_RING;
    let ring_steps = (TAU / RING_STEP) as usize;

    for i in 0..ring_steps {
        let psi = i as f32 * RING_STEP;
        let (s, c) = psi.sin_cos();
        let sx = p.cx + c * ring_r;
        let sy = p.cy + s * ring_r * ASPECT_Y;
        let lum = 1.25 + 0.3 * (2.0 * psi + 3.0 * view.rot_z).sin();
        frame.plot(
            sx.floor() as i32,
            sy.floor() as i32,
            ring_key,
            luminance_glyph(lum, bright_scale),
        );
    }
}

// -------------------- Frame composition --------------------

/// One full render pass into an already-sized frame. This is the whole
/// pipeline; the event loop and the tests both drive it.
fn compose_frame(scene: SceneKind, view: &ViewState, frame: &mut Frame) {
    frame.clear();
    let cfg = scene_config(scene);
    let p = Projector::new(view, frame.w, frame.h, scene_scale(scene, frame.w, frame.h));
    match scene {
        SceneKind::Donut => sample_donut(&p, cfg.bright_scale, frame),
        SceneKind::BlackHole => sample_black_hole(&p, view, cfg.bright_scale, frame),
    }
}

// -------------------- Frame clock --------------------

// Fixed-rate pacing. A slow frame delays the next tick; no catch-up burst.
struct FrameClock {
    period: Duration,
    next: Instant,
}

impl FrameClock {
    fn new(period: Duration) -> Self {
        FrameClock {
            period,
            next: Instant::now() + period,
        }
    }

    fn wait(&mut self) {
        let now = Instant::now();
        if let Some(remaining) = self.next.checked_duration_since(now) {
            thread::sleep(remaining);
            self.next += self.period;
        } else {
            self.next = now + self.period;
        }
    }
}

// -------------------- Terminal --------------------

fn draw(out: &mut Stdout, text: &str, hud: Option<&str>) -> io::Result<()> {
    queue!(out, BeginSynchronizedUpdate)?;

    let mut row = 0u16;
    if let Some(line) = hud {
        queue!(
            out,
            cursor::MoveTo(0, 0),
            Clear(ClearType::CurrentLine),
            Print(line)
        )?;
        row = 1;
    }
    for line in text.lines() {
        queue!(out, cursor::MoveTo(0, row), Print(line))?;
        row += 1;
    }

    queue!(out, EndSynchronizedUpdate)?;
    out.flush()
}

fn hud_line(cfg: &SceneConfig, view: &ViewState, fps: u32, paused: bool, w: usize) -> String {
    let state = if paused { "paused" } else { "live" };
    let line = format!(
        "{} | fps {:>2} | zoom {:>4.1} | {} | mouse rotate  wheel zoom  tab scene  space pause  r reset  h hud  q quit",
        cfg.name, fps, view.zoom, state
    );
    line.chars().take(w).collect()
}

// -------------------- Main loop --------------------

#[derive(Parser, Debug)]
struct Args {
    /// scene shown on startup
    #[arg(long, value_enum, default_value_t = SceneKind::Donut)]
    scene: SceneKind,

    /// ms per frame
    #[arg(long, default_value_t = 50)]
    ms: u64,

    /// start with the HUD hidden
    #[arg(long, default_value_t = false)]
    no_hud: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut out = io::stdout();

    execute!(
        out,
        EnterAlternateScreen,
        cursor::Hide,
        DisableLineWrap,
        EnableMouseCapture
    )?;
    terminal::enable_raw_mode()?;

    let res = run(&mut out, &args);

    terminal::disable_raw_mode().ok();
    execute!(
        out,
        DisableMouseCapture,
        EnableLineWrap,
        cursor::Show,
        LeaveAlternateScreen
    )
    .ok();

    res
}

fn run(out: &mut Stdout, args: &Args) -> Result<()> {
    let mut scene = args.scene;
    let mut cfg = scene_config(scene);
    let mut view = cfg.defaults;
    let mut show_hud = !args.no_hud;
    let mut paused = false;

    // keyboard stand-in for the mouse, normalized to [0,1]^2
    let mut ptr = (0.5f32, 0.5f32);

    let (mut term_w, mut term_h) = terminal::size()?;
    let (mut gw, mut gh) = grid_size(scene, term_w, term_h, show_hud);
    let mut frame = Frame::new(gw, gh);

    let mut clock = FrameClock::new(Duration::from_millis(args.ms.max(1)));
    let mut fps = 0u32;
    let mut fps_count = 0u32;
    let mut fps_stamp = Instant::now();

    execute!(out, Clear(ClearType::All))?;

    loop {
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind == KeyEventKind::Press => match k.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char(' ') => paused = !paused,
                    KeyCode::Char('r') => {
                        view = cfg.defaults;
                        ptr = (0.5, 0.5);
                    }
                    KeyCode::Char('h') => {
                        show_hud = !show_hud;
                        (gw, gh) = grid_size(scene, term_w, term_h, show_hud);
                        frame.resize(gw, gh);
                        execute!(out, Clear(ClearType::All))?;
                    }
                    KeyCode::Tab => {
                        scene = scene.next();
                        cfg = scene_config(scene);
                        view = cfg.defaults;
                        ptr = (0.5, 0.5);
                        (gw, gh) = grid_size(scene, term_w, term_h, show_hud);
                        frame.resize(gw, gh);
                        execute!(out, Clear(ClearType::All))?;
                    }
                    KeyCode::Char('+') | KeyCode::Char('=') => {
                        view.apply_scroll(&cfg, -WHEEL_NOTCH)
                    }
                    KeyCode::Char('-') | KeyCode::Char('_') => {
                        view.apply_scroll(&cfg, WHEEL_NOTCH)
                    }
                    KeyCode::Left => {
                        ptr.0 = (ptr.0 - 0.05).max(0.0);
                        view.apply_pointer(&cfg, ptr.0, ptr.1);
                    }
                    KeyCode::Right => {
                        ptr.0 = (ptr.0 + 0.05).min(1.0);
                        view.apply_pointer(&cfg, ptr.0, ptr.1);
                    }
                    KeyCode::Up => {
                        ptr.1 = (ptr.1 - 0.05).max(0.0);
                        view.apply_pointer(&cfg, ptr.0, ptr.1);
                    }
                    KeyCode::Down => {
                        ptr.1 = (ptr.1 + 0.05).min(1.0);
                        view.apply_pointer(&cfg, ptr.0, ptr.1);
                    }
                    _ => {}
                },
                Event::Mouse(m) => match m.kind {
                    MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                        let nx = m.column as f32 / term_w.max(1) as f32;
                        let ny = m.row as f32 / term_h.max(1) as f32;
                        ptr = (nx, ny);
                        view.apply_pointer(&cfg, nx, ny);
                    }
                    MouseEventKind::ScrollDown => view.apply_scroll(&cfg, WHEEL_NOTCH),
                    MouseEventKind::ScrollUp => view.apply_scroll(&cfg, -WHEEL_NOTCH),
                    _ => {}
                },
                Event::Resize(nw, nh) => {
                    term_w = nw;
                    term_h = nh;
                    (gw, gh) = grid_size(scene, term_w, term_h, show_hud);
                    frame.resize(gw, gh);
                    execute!(out, Clear(ClearType::All))?;
                }
                _ => {}
            }
        }

        if !paused {
            view.advance();
        }
        compose_frame(scene, &view, &mut frame);
        let text = frame.to_text();

        fps_count += 1;
        let since = fps_stamp.elapsed();
        if since >= Duration::from_millis(500) {
            fps = (fps_count as f32 / since.as_secs_f32()).round() as u32;
            fps_count = 0;
            fps_stamp = Instant::now();
        }

        let hud = if show_hud {
            Some(hud_line(&cfg, &view, fps, paused, term_w as usize))
        } else {
            None
        };
        draw(out, &text, hud.as_deref())?;

        clock.wait();
    }
}

// -------------------- Tests --------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn center_glyph(frame: &Frame) -> char {
        frame.glyphs[(frame.h / 2) * frame.w + frame.w / 2]
    }

    #[test]
    fn ramp_runs_dim_to_bright() {
        let ramp: String = RAMP.iter().collect();
        assert_eq!(ramp, ".,-~:;=!*#$@");
    }

    #[test]
    fn luminance_index_always_valid() {
        for &b in &[-1.0e9f32, -2.0, -0.0001, 0.0, 0.3, 1.4, 7.0, 1.0e9, f32::NAN] {
            let g = luminance_glyph(b, 1.5);
            assert!(RAMP.contains(&g));
        }
        assert_eq!(luminance_glyph(-5.0, 1.5), '.');
        assert_eq!(luminance_glyph(1.0e9, 1.5), '@');
    }

    #[test]
    fn zoom_clamps_on_every_mutation() {
        for scene in [SceneKind::Donut, SceneKind::BlackHole] {
            let cfg = scene_config(scene);
            let mut view = cfg.defaults;

            view.apply_scroll(&cfg, 1.0e7);
            assert_eq!(view.zoom, cfg.zoom_max);

            // re-clamping in range is a no-op
            view.apply_scroll(&cfg, 0.0);
            assert_eq!(view.zoom, cfg.zoom_max);

            view.apply_scroll(&cfg, -1.0e7);
            assert_eq!(view.zoom, cfg.zoom_min);
        }
    }

    #[test]
    fn monotone_scroll_runs_are_path_independent() {
        let cfg = scene_config(SceneKind::BlackHole);

        let mut a = cfg.defaults;
        a.apply_scroll(&cfg, 1000.0);
        a.apply_scroll(&cfg, -1000.0);

        let mut b = cfg.defaults;
        for _ in 0..4 {
            b.apply_scroll(&cfg, 250.0);
        }
        for _ in 0..4 {
            b.apply_scroll(&cfg, -250.0);
        }

        assert!((a.zoom - b.zoom).abs() < 1e-5);
    }

    #[test]
    fn advance_adds_angular_velocity() {
        let cfg = scene_config(SceneKind::Donut);
        let mut view = cfg.defaults;
        let (rx, rz) = (view.rot_x, view.rot_z);
        view.advance();
        assert!((view.rot_x - rx - view.vel_x).abs() < 1e-6);
        assert!((view.rot_z - rz - view.vel_z).abs() < 1e-6);
    }

    #[test]
    fn pointer_mapping_is_bounded() {
        let cfg = scene_config(SceneKind::BlackHole);
        let mut view = cfg.defaults;
        for &(nx, ny) in &[(0.0, 0.0), (1.0, 1.0), (5.0, -3.0), (0.5, 0.5)] {
            view.apply_pointer(&cfg, nx, ny);
            assert!(view.vel_x.abs() <= TILT_RATE / 2.0 + 1e-6);
            assert!(view.vel_z.abs() <= SPIN_RATE / 2.0 + 1e-6);
        }

        let cfg = scene_config(SceneKind::Donut);
        let mut view = cfg.defaults;
        view.apply_pointer(&cfg, 7.0, -1.0);
        assert!(view.rot_x >= 0.0 && view.rot_x <= TAU);
        assert!(view.rot_z >= 0.0 && view.rot_z <= TAU);
    }

    #[test]
    fn depth_test_keeps_largest_key() {
        let mut frame = Frame::new(4, 4);
        frame.plot(1, 1, 0.5, 'a');
        frame.plot(1, 1, 0.3, 'b'); // farther, loses
        assert_eq!(frame.glyphs[5], 'a');

        frame.plot(1, 1, 0.5, 'c'); // tie, loses
        assert_eq!(frame.glyphs[5], 'a');

        frame.plot(1, 1, 0.9, 'd');
        assert_eq!(frame.glyphs[5], 'd');

        // off-grid writes are silently discarded
        frame.plot(-1, 0, 9.0, 'x');
        frame.plot(4, 0, 9.0, 'x');
        frame.plot(0, 4, 9.0, 'x');
        assert!(!frame.glyphs.contains(&'x'));
    }

    #[test]
    fn resize_reallocates_and_serialization_is_exact() {
        let mut frame = Frame::new(7, 3);
        frame.resize(5, 4);
        assert_eq!(frame.glyphs.len(), 5 * 4);
        assert_eq!(frame.depth.len(), 5 * 4);

        let text = frame.to_text();
        assert_eq!(text.len(), 5 * 4 + 4);
        assert!(text.ends_with('\n'));
        for line in text.lines() {
            assert_eq!(line.chars().count(), 5);
        }
    }

    #[test]
    fn near_plane_rejects_instead_of_dividing() {
        let cfg = scene_config(SceneKind::Donut);
        let mut view = cfg.defaults;
        view.zoom = 5.0;
        let p = Projector::new(&view, 120, 35, 56.0);

        assert!(p.project(0.0, 0.0, -5.0).is_none());
        assert!(p.project(0.0, 0.0, -4.8).is_none()); // inside the guard band
        assert!(p.project(0.0, 0.0, -4.7).is_some());
        assert!(p.project(0.0, 0.0, 0.0).is_some());
    }

    #[test]
    fn donut_covers_screen_center_at_default_view() {
        let cfg = scene_config(SceneKind::Donut);
        let mut frame = Frame::new(DONUT_GRID_W, DONUT_GRID_H);
        compose_frame(SceneKind::Donut, &cfg.defaults, &mut frame);
        assert_ne!(center_glyph(&frame), ' ');
    }

    #[test]
    fn black_hole_keeps_screen_center_dark() {
        let cfg = scene_config(SceneKind::BlackHole);
        for zoom in 2..=12 {
            let mut view = cfg.defaults;
            view.zoom = zoom as f32;
            let mut frame = Frame::new(120, 35);
            compose_frame(SceneKind::BlackHole, &view, &mut frame);

            assert_eq!(center_glyph(&frame), ' ', "zoom {zoom}");
            // the scene itself still renders
            assert!(frame.glyphs.iter().any(|&g| g != ' '), "zoom {zoom}");
        }
    }

    #[test]
    fn disk_layers_order_ring_over_arc_over_disk() {
        // depth keys, not draw order, decide layering; check the key ranges
        // stay disjoint across the whole zoom interval
        let cfg = scene_config(SceneKind::BlackHole);
        let mut zoom = cfg.zoom_min;
        while zoom <= cfg.zoom_max {
            let disk_max = 1.0 / NEAR_PLANE;
            let arc_min = BIAS_ARC + 1.0 / (zoom + DISK_R_OUT);
            let arc_max = BIAS_ARC + 1.0 / (zoom + LENS_NEAR_Z);
            let ring = BIAS_RING + 1.0 / zoom;
            assert!(disk_max < arc_min, "zoom {zoom}");
            assert!(arc_max < ring, "zoom {zoom}");
            zoom += 0.5;
        }
    }

    #[test]
    fn grid_size_honors_scene_bounds() {
        // fixed stage, cropped by the terminal
        assert_eq!(grid_size(SceneKind::Donut, 300, 100, false), (120, 35));
        assert_eq!(grid_size(SceneKind::Donut, 80, 24, true), (80, 23));

        // adaptive stage, clamped both ways
        assert_eq!(grid_size(SceneKind::BlackHole, 300, 100, false), (280, 90));
        assert_eq!(grid_size(SceneKind::BlackHole, 10, 10, false), (40, 20));
        let (w, h) = grid_size(SceneKind::BlackHole, 120, 36, true);
        assert_eq!((w, h), (120, 35));
    }

    #[test]
    fn frame_clock_holds_the_period() {
        let period = Duration::from_millis(10);
        let mut clock = FrameClock::new(period);
        let start = Instant::now();
        clock.wait();
        clock.wait();
        assert!(start.elapsed() >= period);
    }
}
