//! faro-app: deals a small card table and renders it.
//!
//! Host responsibilities only: build the board, create render resources
//! once, own the camera, and issue `render` calls each frame. Everything
//! GPU-shaped lives in `faro-engine`.

use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

use anyhow::{Context, Result};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};

use faro_engine::assets::{BinaryReader, Endian, FontData};
use faro_engine::board::{standard_deck, Board, Card, CardSuit};
use faro_engine::device::GpuInit;
use faro_engine::logging::{init_logging, LoggingConfig};
use faro_engine::math::{Quat, Transform, Vec3};
use faro_engine::presenter::{
    Camera, FaceInfo, RenderResource, RenderResourceData, Renderer, ResourceDataError,
    TextureData, VertexData,
};
use faro_engine::window::{App, AppControl, FrameCtx, Runtime, RuntimeConfig};

/// Packed bitmap font with one glyph per suit, in `CardSuit` order.
const PIP_FONT: &[u8] = include_bytes!("../assets/pips.fnt");

const BOARD_COLUMNS: usize = 4;
const BOARD_ROWS: usize = 3;

const CARD_WIDTH: f32 = 0.9;
const CARD_HEIGHT: f32 = 1.3;
const CARD_GAP: f32 = 0.25;

/// Distance from the camera plane to the board.
const BOARD_Z: f32 = 6.0;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut reader = BinaryReader::new(Cursor::new(PIP_FONT), Endian::Little);
    let pip_font =
        FontData::read_from(&mut reader).context("embedded pip font is malformed")?;

    let mut board = Board::new(BOARD_COLUMNS, BOARD_ROWS);
    board.card_deck = standard_deck();
    deal(&mut board);

    Runtime::run(
        RuntimeConfig::new("faro", 1280.0, 720.0),
        GpuInit::default(),
        TableApp::new(board, pip_font),
    )
}

/// Places a card on every other block, straight off the top of the deck.
fn deal(board: &mut Board) {
    for column in 0..board.columns() {
        for row in 0..board.rows() {
            if (column + row) % 2 == 0 {
                if let Some(card) = board.draw_from_deck() {
                    board.place(column, row, card);
                }
            }
        }
    }
}

struct PlacedCard {
    column: usize,
    row: usize,
    resource: RenderResource,
}

struct TableAssets {
    backdrop: RenderResource,
    cards: Vec<PlacedCard>,
}

struct TableApp {
    board: Board,
    pip_font: FontData,
    camera: Rc<RefCell<Camera>>,
    camera_bound: bool,
    assets: Option<TableAssets>,
    spin: f32,
}

impl TableApp {
    fn new(board: Board, pip_font: FontData) -> Self {
        let eye = Vec3::new(0.0, 3.0, 0.5);
        let target = Vec3::new(0.0, 0.0, BOARD_Z);
        let camera = Camera::new(eye, (target - eye).normalize(), 16.0 / 9.0);

        Self {
            board,
            pip_font,
            camera: Rc::new(RefCell::new(camera)),
            camera_bound: false,
            assets: None,
            spin: 0.0,
        }
    }
}

impl App for TableApp {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if event.state == ElementState::Pressed
                && event.logical_key == Key::Named(NamedKey::Escape)
            {
                return AppControl::Exit;
            }
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if !self.camera_bound {
            ctx.renderer.use_camera(Rc::downgrade(&self.camera));
            self.camera_bound = true;
        }

        // Keep the camera's aspect in step with the window.
        {
            let rect = ctx.renderer.client_rect();
            self.camera.borrow_mut().aspect = rect.width().max(1.0) / rect.height().max(1.0);
        }

        if self.assets.is_none() {
            match build_assets(&self.board, &self.pip_font, &*ctx.renderer) {
                Ok(assets) => {
                    log::info!("uploaded {} card resources", assets.cards.len());
                    self.assets = Some(assets);
                }
                Err(e) => {
                    log::error!("failed to build table resources: {e}");
                    return AppControl::Exit;
                }
            }
        }
        let Some(assets) = self.assets.as_ref() else {
            return AppControl::Continue;
        };

        self.spin += ctx.time.dt;

        ctx.renderer.render(
            &assets.backdrop,
            &Transform {
                translation: Vec3::new(0.0, -0.2, BOARD_Z + 1.0),
                rotation: Quat::IDENTITY,
                scale: Vec3::ONE,
            },
        );

        for placed in &assets.cards {
            let transform = card_transform(placed.column, placed.row, self.spin);
            ctx.renderer.render(&placed.resource, &transform);
        }

        AppControl::Continue
    }
}

/// Lays the grid out centered on the camera axis, cards swaying gently.
fn card_transform(column: usize, row: usize, spin: f32) -> Transform {
    let x_span = CARD_WIDTH + CARD_GAP;
    let y_span = CARD_HEIGHT + CARD_GAP;

    let x = (column as f32 - (BOARD_COLUMNS as f32 - 1.0) / 2.0) * x_span;
    let y = ((BOARD_ROWS as f32 - 1.0) / 2.0 - row as f32) * y_span;

    let phase = (column * BOARD_ROWS + row) as f32 * 0.7;
    let sway = ((spin * 0.8 + phase).sin()) * 0.15;

    Transform {
        translation: Vec3::new(x, y, BOARD_Z),
        rotation: Quat::from_rotation_y(sway),
        scale: Vec3::ONE,
    }
}

/// Uploads one backdrop quad plus one resource per placed card.
///
/// Goes through `&dyn Renderer` deliberately; the host only ever needs the
/// contract.
fn build_assets(
    board: &Board,
    pip_font: &FontData,
    renderer: &dyn Renderer,
) -> Result<TableAssets, ResourceDataError> {
    let backdrop = renderer.create_render_resource(&backdrop_descriptor())?;

    let mut cards = Vec::new();
    for (column, row, card) in board.placed_cards() {
        let resource = renderer.create_render_resource(&card_descriptor(card, pip_font))?;
        cards.push(PlacedCard { column, row, resource });
    }

    Ok(TableAssets { backdrop, cards })
}

fn quad_vertices(width: f32, height: f32) -> [VertexData; 4] {
    let hw = width / 2.0;
    let hh = height / 2.0;
    [
        VertexData { position: [-hw, -hh, 0.0], tex_coord: [0.0, 1.0] },
        VertexData { position: [hw, -hh, 0.0], tex_coord: [1.0, 1.0] },
        VertexData { position: [hw, hh, 0.0], tex_coord: [1.0, 0.0] },
        VertexData { position: [-hw, hh, 0.0], tex_coord: [0.0, 0.0] },
    ]
}

/// Indexed, textured quad: one face group covering all six indices.
fn card_descriptor(card: Card, pip_font: &FontData) -> RenderResourceData {
    RenderResourceData {
        vertices: quad_vertices(CARD_WIDTH, CARD_HEIGHT).to_vec(),
        indices: vec![0, 1, 2, 0, 2, 3],
        textures: vec![card_face_texture(card, pip_font)],
        faces: vec![FaceInfo {
            index_offset: 0,
            index_count: 6,
            textured: true,
            texture_index: 0,
        }],
    }
}

/// Non-indexed, untextured quad; draws with the backend's fallback binding.
fn backdrop_descriptor() -> RenderResourceData {
    let [v0, v1, v2, v3] = quad_vertices(
        BOARD_COLUMNS as f32 * (CARD_WIDTH + CARD_GAP) + 1.0,
        BOARD_ROWS as f32 * (CARD_HEIGHT + CARD_GAP) + 1.0,
    );
    RenderResourceData {
        vertices: vec![v0, v1, v2, v0, v2, v3],
        indices: Vec::new(),
        textures: Vec::new(),
        faces: vec![FaceInfo {
            index_offset: 0,
            index_count: 6,
            textured: false,
            texture_index: 0,
        }],
    }
}

const CARD_TEXTURE_WIDTH: u32 = 32;
const CARD_TEXTURE_HEIGHT: u32 = 48;

fn suit_color(suit: CardSuit) -> [u8; 3] {
    match suit {
        CardSuit::Spade => [38, 38, 56],
        CardSuit::Club => [30, 66, 44],
        CardSuit::Diamond => [196, 88, 48],
        CardSuit::Heart => [188, 42, 60],
    }
}

fn suit_glyph_index(suit: CardSuit) -> usize {
    match suit {
        CardSuit::Spade => 0,
        CardSuit::Club => 1,
        CardSuit::Diamond => 2,
        CardSuit::Heart => 3,
    }
}

/// Procedural stand-in for card art: suit-colored face, light border, one
/// pip row per rank step, and the suit glyph stamped in the middle.
fn card_face_texture(card: Card, pip_font: &FontData) -> TextureData {
    let (w, h) = (CARD_TEXTURE_WIDTH as usize, CARD_TEXTURE_HEIGHT as usize);
    let [r, g, b] = suit_color(card.suit);
    let pips = (card.rank as i8).unsigned_abs() as usize;

    let mut pixels = Vec::with_capacity(w * h * 4);
    for y in 0..h {
        for x in 0..w {
            let border = x < 2 || y < 2 || x >= w - 2 || y >= h - 2;
            let pip_row = y >= 4 && (y - 4) % 3 == 0 && (y - 4) / 3 < pips;
            let pip = pip_row && x >= 6 && x < w - 6;

            let px = if border {
                [230, 230, 220, 255]
            } else if pip {
                [250, 250, 245, 255]
            } else {
                [r, g, b, 255]
            };
            pixels.extend_from_slice(&px);
        }
    }

    if let Some(glyph) = pip_font.glyph(suit_glyph_index(card.suit)) {
        stamp_glyph(&mut pixels, w, h, &glyph);
    } else {
        log::warn!("pip font has no glyph for {:?}", card.suit);
    }

    TextureData {
        width: CARD_TEXTURE_WIDTH,
        height: CARD_TEXTURE_HEIGHT,
        pixels,
    }
}

/// Blits the glyph at 2x scale into the center of an RGBA face.
fn stamp_glyph(pixels: &mut [u8], w: usize, h: usize, glyph: &faro_engine::assets::Glyph<'_>) {
    let scale = 2;
    let gw = glyph.width as usize * scale;
    let gh = glyph.height as usize * scale;
    let x0 = w.saturating_sub(gw) / 2;
    let y0 = h.saturating_sub(gh) / 2;

    for dy in 0..gh.min(h - y0) {
        for dx in 0..gw.min(w - x0) {
            let coverage = glyph.alpha[(dy / scale) * glyph.width as usize + dx / scale];
            if coverage == 0 {
                continue;
            }
            let i = ((y0 + dy) * w + x0 + dx) * 4;
            pixels[i..i + 4].copy_from_slice(&[245, 240, 230, 255]);
        }
    }
}
