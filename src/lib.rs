#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, LayoutEngine, RenderConfig};
pub use error::{LayoutError, ParseError};
pub use ir::LayoutInput;
pub use layout::{Layout, compute_layout};
pub use theme::Theme;

/// Everything needed to turn a source document into a picture.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl RenderOptions {
    pub fn classic() -> Self {
        Self {
            theme: Theme::classic(),
            layout: LayoutConfig::default(),
            render: RenderConfig::default(),
        }
    }

    pub fn modern() -> Self {
        Self {
            theme: Theme::modern(),
            ..Self::classic()
        }
    }

    fn into_config(self) -> Config {
        Config {
            theme: self.theme,
            layout: self.layout,
            render: self.render,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::classic()
    }
}

/// Parses `source` (notation or JSON), applies any init directive and lays it out.
pub fn layout_source(source: &str, options: RenderOptions) -> anyhow::Result<(Layout, Config)> {
    let parsed = parser::parse_source(source)?;
    let mut config = options.into_config();
    if let Some(init) = parsed.init_config {
        config = config::merge_init_config(config, init);
    }
    let layout = compute_layout(&parsed.input, &config.layout)?;
    Ok((layout, config))
}

pub fn render_with_options(source: &str, options: RenderOptions) -> anyhow::Result<String> {
    let (layout, config) = layout_source(source, options)?;
    Ok(render::render_svg(&layout, &config.theme, &config.render))
}

pub fn render(source: &str) -> anyhow::Result<String> {
    render_with_options(source, RenderOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_notation_end_to_end() {
        let svg = render("genogram\ndad === mom\nstyle mom female\ndad --> kid\nmom --> kid").unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains(">kid</text>"));
    }

    #[test]
    fn init_directive_reaches_layout() {
        let source = "%%{init: {\"layout\": {\"generationSpacing\": 60}}}%%\na --> b";
        let (layout, config) = layout_source(source, RenderOptions::modern()).unwrap();
        assert_eq!(config.layout.generation_spacing, 60.0);
        assert_eq!(layout.person("b").unwrap().y, 60.0);
    }

    #[test]
    fn layout_errors_surface() {
        let err = render(r#"{"persons": [{"id": "a", "sex": "male"}, {"id": "a", "sex": "female"}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("duplicate person id"));
    }
}
