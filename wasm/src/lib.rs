use genogram_layout::config::LayoutEngine;
use genogram_layout::{RenderOptions, layout_dump, layout_source, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenogramRenderOptions {
    theme: Option<String>,
    engine: Option<LayoutEngine>,
    font_family: Option<String>,
    font_size: Option<f32>,
    symbol_size: Option<f32>,
}

fn build_render_options(options: GenogramRenderOptions) -> RenderOptions {
    let mut render_options = if options.theme.as_deref() == Some("modern") {
        RenderOptions::modern()
    } else {
        RenderOptions::classic()
    };

    if let Some(engine) = options.engine {
        render_options.layout.engine = engine;
    }
    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        render_options.theme.font_size = font_size;
    }
    if let Some(symbol_size) = options.symbol_size {
        render_options.render.symbol_size = symbol_size;
    }

    render_options
}

fn parse_options(options_json: Option<String>) -> Result<GenogramRenderOptions, JsValue> {
    match options_json {
        Some(raw_options) => serde_json::from_str::<GenogramRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string())),
        None => Ok(GenogramRenderOptions::default()),
    }
}

#[wasm_bindgen]
pub fn render_genogram_svg(source: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let render_options = build_render_options(parse_options(options_json)?);
    render_with_options(source, render_options).map_err(|error| JsValue::from_str(&format!("{error:#}")))
}

/// Positioned people and connectors as JSON, for callers that draw themselves.
#[wasm_bindgen]
pub fn layout_genogram_json(source: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let render_options = build_render_options(parse_options(options_json)?);
    let (layout, _) =
        layout_source(source, render_options).map_err(|error| JsValue::from_str(&format!("{error:#}")))?;
    layout_dump::to_json_string(&layout).map_err(|error| JsValue::from_str(&error.to_string()))
}
