use crate::config::RenderConfig;
use crate::ir::Shape;
use crate::layout::{Connector, ConnectorKind, Layout, PositionedPerson};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

const EGO_RING_GAP: f32 = 6.0;
const MIN_CANVAS: f32 = 200.0;

pub fn render_svg(layout: &Layout, theme: &Theme, config: &RenderConfig) -> String {
    let half = config.symbol_size / 2.0;
    let label_room = theme.font_size * 2.0;
    let (min_x, min_y, max_x, max_y) = match layout.bounds() {
        Some(b) => (
            b.min_x - half - EGO_RING_GAP,
            b.min_y - half - EGO_RING_GAP,
            b.max_x + half + EGO_RING_GAP,
            b.max_y + half + label_room,
        ),
        None => (0.0, 0.0, 0.0, 0.0),
    };
    let width = (max_x - min_x + config.margin * 2.0).max(MIN_CANVAS);
    let height = (max_y - min_y + config.margin * 2.0).max(MIN_CANVAS);
    let tx = config.margin - min_x;
    let ty = config.margin - min_y;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));
    svg.push_str(&format!("<g transform=\"translate({tx:.2} {ty:.2})\">"));

    // Lines go first so symbols cover the line ends.
    for connector in &layout.connectors {
        svg.push_str(&connector_svg(connector, theme, config));
    }
    for person in &layout.people {
        svg.push_str(&person_svg(person, theme, config));
    }

    svg.push_str("</g></svg>");
    svg
}

fn connector_svg(connector: &Connector, theme: &Theme, config: &RenderConfig) -> String {
    let (color, stroke_width) = match connector.kind {
        ConnectorKind::Partner => (
            theme.partner_color(connector.status),
            config.partner_stroke_width,
        ),
        _ => (theme.line_color.as_str(), config.line_stroke_width),
    };
    let dash = connector
        .stroke
        .dash_array()
        .map(|d| format!(" stroke-dasharray=\"{d}\""))
        .unwrap_or_default();

    let mut out = String::new();
    out.push_str(&format!("<g class=\"{}\"{}>", connector.kind.as_str(), data_attrs(connector)));
    let points: Vec<(f32, f32)> = connector.points().iter().map(|p| (p.x, p.y)).collect();
    out.push_str(&format!(
        "<path d=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{stroke_width}\"{dash}/>",
        points_to_path(&points)
    ));
    for mark in &connector.decorations {
        out.push_str(&format!(
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{color}\" stroke-width=\"{stroke_width}\"/>",
            mark.from.x, mark.from.y, mark.to.x, mark.to.y
        ));
    }
    out.push_str("</g>");
    out
}

fn data_attrs(connector: &Connector) -> String {
    let mut attrs = String::new();
    for (name, value) in [
        ("data-id", &connector.id),
        ("data-from", &connector.from_id),
        ("data-to", &connector.to_id),
    ] {
        if let Some(value) = value {
            attrs.push_str(&format!(" {name}=\"{}\"", escape_xml(value)));
        }
    }
    attrs
}

fn person_svg(person: &PositionedPerson, theme: &Theme, config: &RenderConfig) -> String {
    let (fill, stroke) = theme.symbol_colors(person.shape);
    let half = config.symbol_size / 2.0;
    let (x, y) = (person.x, person.y);

    let mut out = String::new();
    out.push_str(&format!(
        "<g class=\"person\" data-id=\"{}\">",
        escape_xml(&person.id)
    ));
    if person.is_ego {
        out.push_str(&symbol(person.shape, x, y, half + EGO_RING_GAP, "none", stroke, config.line_stroke_width));
    }
    out.push_str(&symbol(person.shape, x, y, half, fill, stroke, config.line_stroke_width));

    if person.is_deceased {
        let reach = match person.shape {
            Shape::Rect => half,
            Shape::Circle => half * std::f32::consts::FRAC_1_SQRT_2,
        };
        for (dx, dy) in [(reach, reach), (reach, -reach)] {
            out.push_str(&format!(
                "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{stroke}\" stroke-width=\"{}\"/>",
                x - dx,
                y - dy,
                x + dx,
                y + dy,
                config.line_stroke_width
            ));
        }
    }

    let label_y = y + half + theme.font_size + 4.0;
    out.push_str(&format!(
        "<text x=\"{x:.2}\" y=\"{label_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
        theme.font_family,
        theme.font_size,
        theme.text_color,
        escape_xml(&person.name)
    ));
    out.push_str("</g>");
    out
}

fn symbol(shape: Shape, x: f32, y: f32, half: f32, fill: &str, stroke: &str, stroke_width: f32) -> String {
    match shape {
        Shape::Circle => format!(
            "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{half:.2}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>"
        ),
        Shape::Rect => format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>",
            x - half,
            y - half,
            half * 2.0,
            half * 2.0
        ),
    }
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].0, points[0].1));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
    }
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme
        .font_family
        .split(',')
        .next()
        .map(str::trim)
        .unwrap_or("sans-serif")
        .to_string();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
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
