//! Terminal renderer: star placements behind page text, composed into a
//! cell grid and written out as truecolor escape sequences.

use std::io::Write;

use crate::config::{Rgb, Theme};
use crate::field::Placement;
use crate::page::{Page, RowKind};

// Glyphs by star size band: [1, 2), [2, 3), [3, ..)
const STAR_GLYPHS: [char; 3] = ['·', '+', '*'];
const TEXT_MARGIN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Rgb,
    /// Star opacity behind this cell, used to keep the brightest star when
    /// several land on it.
    weight: f64,
}

impl Cell {
    fn blank(theme: &Theme) -> Self {
        Self {
            ch: ' ',
            fg: theme.background,
            weight: 0.0,
        }
    }
}

pub struct Frame {
    cols: usize,
    rows: usize,
    cells: Vec<Cell>,
}

impl Frame {
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<&Cell> {
        if col < self.cols && row < self.rows {
            self.cells.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// The characters of one row, for inspection.
    pub fn row_text(&self, row: usize) -> String {
        if row >= self.rows {
            return String::new();
        }
        self.cells[row * self.cols..(row + 1) * self.cols].iter().map(|c| c.ch).collect()
    }
}

pub struct Renderer {
    theme: Theme,
    cell_width: f64,
    cell_height: f64,
    frame: Frame,
    output_buf: Vec<u8>,
}

impl Renderer {
    pub fn new(theme: Theme, cell_width: f64, cell_height: f64) -> Self {
        Self {
            theme,
            cell_width,
            cell_height,
            frame: Frame {
                cols: 0,
                rows: 0,
                cells: Vec::new(),
            },
            output_buf: Vec::new(),
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Builds the next frame: stars first, then page text on top.
    pub fn compose(&mut self, cols: u16, rows: u16, placements: &[Placement], page: &Page, scroll_y: f64) {
        let cols = cols as usize;
        let rows = rows as usize;
        self.frame.cols = cols;
        self.frame.rows = rows;
        self.frame.cells.clear();
        self.frame.cells.resize(cols * rows, Cell::blank(&self.theme));

        self.draw_stars(placements);
        self.draw_page(page, scroll_y);
    }

    fn draw_stars(&mut self, placements: &[Placement]) {
        let (cols, rows) = (self.frame.cols, self.frame.rows);
        for star in placements {
            let col = (star.x as f64 / self.cell_width).floor();
            let row = ((star.y as f64 + star.translate_y) / self.cell_height).floor();
            // Translated past an edge: clipped like an overflow-hidden backdrop
            if col < 0.0 || row < 0.0 || col >= cols as f64 || row >= rows as f64 {
                continue;
            }

            let idx = row as usize * cols + col as usize;
            let cell = &mut self.frame.cells[idx];
            if star.opacity <= cell.weight {
                continue;
            }
            let band = ((star.size - 1.0).max(0.0) as usize).min(STAR_GLYPHS.len() - 1);
            *cell = Cell {
                ch: STAR_GLYPHS[band],
                fg: self.theme.background.blend(self.theme.star, star.opacity),
                weight: star.opacity,
            };
        }
    }

    fn draw_page(&mut self, page: &Page, scroll_y: f64) {
        let (cols, rows) = (self.frame.cols, self.frame.rows);
        let first_row = (scroll_y.max(0.0) / self.cell_height).floor() as usize;

        for screen_row in 0..rows {
            let Some(row) = page.rows().get(first_row + screen_row) else {
                break;
            };
            if row.kind == RowKind::Blank {
                continue;
            }
            let opacity = page.opacity(row.section) as f64;
            if opacity <= 0.0 {
                continue;
            }

            let base = match row.kind {
                RowKind::Title => self.theme.accent,
                _ => self.theme.text,
            };
            let fg = self.theme.background.blend(base, opacity);

            for (i, ch) in row.text.chars().enumerate() {
                let col = TEXT_MARGIN + i;
                if col >= cols {
                    break;
                }
                if ch == ' ' {
                    continue;
                }
                self.frame.cells[screen_row * cols + col] = Cell {
                    ch,
                    fg,
                    weight: f64::INFINITY,
                };
            }
        }
    }

    /// Writes the composed frame, emitting color codes only on change.
    pub fn write<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        self.output_buf.clear();
        self.output_buf.extend_from_slice(b"\x1b[H"); // Move to home

        let bg = self.theme.background;
        let mut prev_fg: Option<Rgb> = None;
        let cols = self.frame.cols;

        for y in 0..self.frame.rows {
            write!(self.output_buf, "\x1b[48;2;{};{};{}m", bg.0, bg.1, bg.2)?;
            for cell in &self.frame.cells[y * cols..(y + 1) * cols] {
                if cell.ch != ' ' && prev_fg != Some(cell.fg) {
                    write!(self.output_buf, "\x1b[38;2;{};{};{}m", cell.fg.0, cell.fg.1, cell.fg.2)?;
                    prev_fg = Some(cell.fg);
                }
                let mut utf8 = [0u8; 4];
                self.output_buf.extend_from_slice(cell.ch.encode_utf8(&mut utf8).as_bytes());
            }
            self.output_buf.extend_from_slice(b"\x1b[0m");
            prev_fg = None;
            if y + 1 < self.frame.rows {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }

        out.write_all(&self.output_buf)?;
        out.flush()?;
        Ok(())
    }
}
