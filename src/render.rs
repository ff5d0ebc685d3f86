//! Draws dendrogram layouts next to an empty matrix grid, as PNG or SVG.
//!
//! The figure is split into a top strip (column dendrogram), a left strip
//! (row dendrogram), the matrix grid, and label margins to the right and
//! below the grid. Labels are only drawn in SVG output.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use image::{Rgb, RgbImage};
use log::info;

use crate::error::IoError;
use crate::layout::LayoutLine;

const DENDROGRAM_FRACTION: f64 = 0.2;
const LABEL_FRACTION: f64 = 0.15;
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const GRID: Rgb<u8> = Rgb([204, 204, 204]);

/// Everything needed to draw one figure. Labels are in display order.
pub struct Figure<'a> {
    pub width: u32,
    pub height: u32,
    pub row_lines: &'a [LayoutLine],
    pub column_lines: &'a [LayoutLine],
    pub row_labels: &'a [String],
    pub column_labels: &'a [String],
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl Rect {
    fn map(&self, line: &LayoutLine) -> (f64, f64, f64, f64) {
        (
            self.x + line.x1 * self.w,
            self.y + line.y1 * self.h,
            self.x + line.x2 * self.w,
            self.y + line.y2 * self.h,
        )
    }
}

struct Panels {
    side: Rect,
    top: Rect,
    grid: Rect,
}

impl Figure<'_> {
    fn panels(&self) -> Panels {
        let (w, h) = (self.width as f64, self.height as f64);
        let left = w * DENDROGRAM_FRACTION;
        let top = h * DENDROGRAM_FRACTION;
        let grid_w = w - left - w * LABEL_FRACTION;
        let grid_h = h - top - h * LABEL_FRACTION;
        Panels {
            side: Rect {
                x: 0.0,
                y: top,
                w: left,
                h: grid_h,
            },
            top: Rect {
                x: left,
                y: 0.0,
                w: grid_w,
                h: top,
            },
            grid: Rect {
                x: left,
                y: top,
                w: grid_w,
                h: grid_h,
            },
        }
    }

    /// Grid lines as `(x1, y1, x2, y2)` pixel coordinates.
    fn grid_lines(&self, grid: Rect) -> Vec<(f64, f64, f64, f64)> {
        let rows = self.row_labels.len();
        let cols = self.column_labels.len();
        let mut lines = Vec::with_capacity(rows + cols + 2);
        if rows == 0 || cols == 0 {
            return lines;
        }
        for r in 0..=rows {
            let y = grid.y + grid.h * r as f64 / rows as f64;
            lines.push((grid.x, y, grid.x + grid.w, y));
        }
        for c in 0..=cols {
            let x = grid.x + grid.w * c as f64 / cols as f64;
            lines.push((x, grid.y, x, grid.y + grid.h));
        }
        lines
    }
}

fn draw_line(img: &mut RgbImage, (x1, y1, x2, y2): (f64, f64, f64, f64), color: Rgb<u8>) {
    if img.width() == 0 || img.height() == 0 {
        return;
    }
    let max_x = (img.width() - 1) as f64;
    let max_y = (img.height() - 1) as f64;
    let px = |v: f64, max: f64| v.round().clamp(0.0, max) as u32;

    // layout lines are axis aligned, so the bounding box is the line
    let (xa, xb) = (px(x1.min(x2), max_x), px(x1.max(x2), max_x));
    let (ya, yb) = (px(y1.min(y2), max_y), px(y1.max(y2), max_y));
    for x in xa..=xb {
        for y in ya..=yb {
            img.put_pixel(x, y, color);
        }
    }
}

pub fn render_png(figure: &Figure) -> RgbImage {
    let mut img = RgbImage::from_pixel(figure.width, figure.height, WHITE);
    let panels = figure.panels();

    for line in figure.grid_lines(panels.grid) {
        draw_line(&mut img, line, GRID);
    }
    for line in figure.row_lines {
        draw_line(&mut img, panels.side.map(line), BLACK);
    }
    for line in figure.column_lines {
        draw_line(&mut img, panels.top.map(line), BLACK);
    }
    img
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub fn render_svg(figure: &Figure) -> String {
    let panels = figure.panels();
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = figure.width,
        h = figure.height
    );
    svg.push('\n');
    svg.push_str(&format!(
        r#"<rect width="{}" height="{}" fill="white"/>"#,
        figure.width, figure.height
    ));
    svg.push('\n');

    let mut push_line = |(x1, y1, x2, y2): (f64, f64, f64, f64), stroke: &str| {
        svg.push_str(&format!(
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="1"/>"#,
            x1, y1, x2, y2, stroke
        ));
        svg.push('\n');
    };
    for line in figure.grid_lines(panels.grid) {
        push_line(line, "#cccccc");
    }
    for line in figure.row_lines {
        push_line(panels.side.map(line), "black");
    }
    for line in figure.column_lines {
        push_line(panels.top.map(line), "black");
    }

    let grid = panels.grid;
    let rows = figure.row_labels.len().max(1) as f64;
    for (i, label) in figure.row_labels.iter().enumerate() {
        let y = grid.y + grid.h * (i as f64 + 0.5) / rows;
        svg.push_str(&format!(
            r#"<text x="{:.2}" y="{:.2}" font-family="monospace" font-size="10" dominant-baseline="middle">{}</text>"#,
            grid.x + grid.w + 4.0,
            y,
            escape_xml(label)
        ));
        svg.push('\n');
    }
    let cols = figure.column_labels.len().max(1) as f64;
    for (j, label) in figure.column_labels.iter().enumerate() {
        let x = grid.x + grid.w * (j as f64 + 0.5) / cols;
        let y = grid.y + grid.h + 4.0;
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" font-family="monospace" font-size="10" transform="rotate(90 {x:.2} {y:.2})">{}</text>"#,
            escape_xml(label)
        ));
        svg.push('\n');
    }

    svg.push_str("</svg>\n");
    svg
}

/// Write the figure as SVG when `path` ends in `.svg`, PNG otherwise.
pub fn save(path: &Path, figure: &Figure) -> Result<(), IoError> {
    let is_svg = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);

    if is_svg {
        info!("Rendering SVG...");
        let content = render_svg(figure);
        let mut file = File::create(path).map_err(|e| IoError::io(path, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| IoError::io(path, e))?;
    } else {
        info!("Rendering image...");
        render_png(figure).save(path)?;
    }
    info!("Saved dendrogram plot to {:?}", path);
    Ok(())
}
