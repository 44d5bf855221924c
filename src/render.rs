use crate::compose::{Canvas, Element};
use crate::error::{CardError, Result};
use crate::geometry::Point;
use crate::text_metrics::FontBook;
use resvg::tiny_skia::{Pixmap, Transform};
use std::fmt::Write;
use std::path::Path;

/// Serializes the canvas to SVG, one node per element in paint order.
pub fn render_svg(canvas: &Canvas, fonts: &FontBook) -> String {
    let (width, height) = (canvas.width, canvas.height);
    let mut svg = String::new();
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    );

    for element in canvas.elements() {
        match element {
            Element::Fill { color } => {
                let _ = write!(svg, "<rect width=\"100%\" height=\"100%\" fill=\"{color}\"/>");
            }
            Element::Image {
                x,
                y,
                width,
                height,
                image,
                ..
            } => {
                let _ = write!(
                    svg,
                    "<image x=\"{x:.2}\" y=\"{y:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" preserveAspectRatio=\"none\" xlink:href=\"{}\"/>",
                    image.data_uri()
                );
            }
            Element::Line {
                from,
                to,
                thickness,
                color,
            } => {
                let _ = write!(
                    svg,
                    "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{color}\" stroke-width=\"{thickness:.2}\"/>",
                    from.0, from.1, to.0, to.1
                );
            }
            Element::Medallion {
                medallion,
                fill,
                ring_color,
            } => {
                // SVG strokes straddle the path; pull the circle in so the
                // ring's outer edge lands on the medallion radius.
                let r = (medallion.radius - medallion.ring / 2.0).max(0.0);
                let _ = write!(
                    svg,
                    "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{r:.2}\" fill=\"{fill}\" stroke=\"{ring_color}\" stroke-width=\"{:.2}\"/>",
                    medallion.cx, medallion.cy, medallion.ring
                );
            }
            Element::Polygon {
                points,
                stroke,
                stroke_width,
            } => {
                let _ = write!(
                    svg,
                    "<polygon points=\"{}\" fill=\"none\" stroke=\"{stroke}\" stroke-width=\"{stroke_width:.2}\" stroke-linejoin=\"miter\"/>",
                    points_attr(points)
                );
            }
            Element::Text {
                x,
                baseline,
                text,
                style,
                color,
            } => {
                let _ = write!(
                    svg,
                    "<text x=\"{x:.2}\" y=\"{baseline:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{color}\" xml:space=\"preserve\">{}</text>",
                    escape_xml(fonts.family(*style)),
                    fonts.size(*style),
                    escape_xml(text)
                );
            }
        }
    }

    svg.push_str("</svg>");
    svg
}

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{x:.2},{y:.2}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rasterizes the canvas. Anything drawn outside the canvas is clipped.
pub fn rasterize(canvas: &Canvas, fonts: &FontBook) -> Result<Pixmap> {
    let svg = render_svg(canvas, fonts);
    let mut opt = usvg::Options::default();
    opt.fontdb = fonts.database();

    let tree = usvg::Tree::from_str(&svg, &opt).map_err(|err| CardError::Raster(err.to_string()))?;
    let mut pixmap = Pixmap::new(canvas.width, canvas.height)
        .ok_or_else(|| CardError::Raster(format!("cannot allocate {}x{} pixmap", canvas.width, canvas.height)))?;
    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());
    Ok(pixmap)
}

pub fn encode_png(canvas: &Canvas, fonts: &FontBook) -> Result<Vec<u8>> {
    rasterize(canvas, fonts)?
        .encode_png()
        .map_err(|err| CardError::Raster(err.to_string()))
}

pub fn write_png(canvas: &Canvas, fonts: &FontBook, output: &Path) -> Result<()> {
    let png = encode_png(canvas, fonts)?;
    std::fs::write(output, png)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
