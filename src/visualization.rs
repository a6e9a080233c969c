//! Debug trace output in the gv plain-text format.
//!
//! A trace is a sequence of frames, each made of filled rectangles and text
//! labels in board coordinates:
//! - `p <rgb> x0 y0 x1 y1 x2 y2 x3 y3` draws a polygon
//! - `t <x> <y> <rgb> <size> <text>` draws a label
//! - `n` starts the next frame
//!
//! Tracing is never needed for a result; [`NullSink`] drops everything.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::geometry::{BOARD_CELLS, BOARD_DIM};
use crate::grid::StoneId;
use crate::rules::Rules;
use crate::state::GameState;
use crate::zobrist::MAX_STONE_CELLS;

/// A colour as `0xRRGGBB`.
pub type Rgb = u32;

pub const BLACK: Rgb = 0x000000;
const BLOCKED: Rgb = 0x800000;
const PANEL: Rgb = 0xeeeeee;

/// Stone colours, cycled by id.
pub const PALETTE: [Rgb; 16] = [
    0x000080, 0x0000ee, 0x008000, 0x008080, 0x0080ee, 0x00ee00, 0x00ee80, 0x00eeee, 0xee0000,
    0xee0080, 0xee00ee, 0xee8000, 0xee8080, 0xee80ee, 0xaaaa00, 0xaaaa80,
];

pub fn stone_color(stone: StoneId) -> Rgb {
    PALETTE[stone as usize % PALETTE.len()]
}

/// Receiver of trace events.
pub trait TraceSink {
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, rgb: Rgb);
    fn text(&mut self, x: f64, y: f64, size: f64, rgb: Rgb, text: &str);
    fn new_frame(&mut self);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn rect(&mut self, _x: f64, _y: f64, _w: f64, _h: f64, _rgb: Rgb) {}
    fn text(&mut self, _x: f64, _y: f64, _size: f64, _rgb: Rgb, _text: &str) {}
    fn new_frame(&mut self) {}
}

/// Writes gv text to `W`. The first write error is logged and turns the
/// writer into a no-op.
pub struct GvWriter<W: Write> {
    out: Option<W>,
}

impl GvWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> GvWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out: Some(out) }
    }

    pub fn is_enabled(&self) -> bool {
        self.out.is_some()
    }

    /// The underlying writer, unless an error disabled it.
    pub fn into_inner(self) -> Option<W> {
        self.out
    }

    fn emit(&mut self, write: impl FnOnce(&mut W) -> io::Result<()>) {
        let Some(out) = self.out.as_mut() else {
            return;
        };
        if let Err(err) = write(out) {
            log::warn!("trace output failed, tracing disabled: {err}");
            self.out = None;
        }
    }
}

impl<W: Write> TraceSink for GvWriter<W> {
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, rgb: Rgb) {
        self.emit(|out| {
            writeln!(
                out,
                "p {rgb} {x} {y} {} {y} {} {} {x} {}",
                x + w,
                x + w,
                y + h,
                y + h
            )
        });
    }

    fn text(&mut self, x: f64, y: f64, size: f64, rgb: Rgb, text: &str) {
        self.emit(|out| writeln!(out, "t {x} {y} {rgb} {size} {text}"));
    }

    fn new_frame(&mut self) {
        self.emit(|out| {
            writeln!(out, "n")?;
            out.flush()
        });
    }
}

/// Draws one board: blocked cells, stones labelled with their ids, the
/// empty-cell counter and a side panel with the unused stones per size.
pub fn render_state(sink: &mut dyn TraceSink, rules: &Rules, state: &GameState) {
    for y in 0..BOARD_DIM as i32 {
        for x in 0..BOARD_DIM as i32 {
            let (fx, fy) = (x as f64, y as f64);
            if state.is_blocked(rules, x, y) {
                sink.rect(fx, fy, 1.0, 1.0, BLOCKED);
            } else if let Some(stone) = state.stone_at(x, y) {
                sink.rect(fx, fy, 1.0, 1.0, stone_color(stone));
                sink.text(fx + 0.5, fy + 0.5, 0.2, BLACK, &stone.to_string());
            }
        }
    }
    sink.text(
        10.0,
        -1.0,
        0.5,
        BLACK,
        &format!("{}/{}", state.empty_count(), BOARD_CELLS),
    );

    sink.rect(-20.0, 0.0, 19.0, BOARD_DIM as f64, PANEL);
    let mut lines = vec![
        format!("stones used = {}", state.used_count()),
        format!("orientation = {}", state.orientation().index()),
    ];
    let mut remaining = [0usize; MAX_STONE_CELLS + 1];
    for stone in 0..rules.stone_count() {
        if !state.is_used(stone as StoneId) {
            remaining[rules.patterns.cell_count(stone as StoneId)] += 1;
        }
    }
    lines.extend(
        remaining
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(size, count)| format!("{size:2} {count:3}")),
    );
    for (row, line) in lines.iter().enumerate() {
        sink.text(-10.0, row as f64, 0.5, BLACK, line);
    }
}

/// Draws the final board, then rebuilds it one stone per frame.
pub fn render_replay(sink: &mut dyn TraceSink, rules: &Rules, best: &GameState) {
    let mut best = best.clone();
    best.transform_to_default(rules);
    render_state(sink, rules, &best);
    sink.new_frame();

    let mut board = GameState::new(rules);
    for put in best.placements(rules) {
        board.put(rules, put);
        render_state(sink, rules, &board);
        sink.new_frame();
    }
}
