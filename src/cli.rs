use crate::config::{Config, LayoutEngine, load_config, merge_init_config};
use crate::layout::compute_layout;
use crate::layout_dump::write_layout_json;
use crate::parser::parse_source;
use crate::render::{render_svg, write_output_svg};
use crate::theme::Theme;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "genogram", version, about = "Genogram layout engine and renderer")]
pub struct Args {
    /// Input file (.geno, .json, .md) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. SVG and JSON default to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON/JSON5 file (theme, themeVariables, layout, render)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Layout engine, overrides the config file
    #[arg(long = "engine", value_enum)]
    pub engine: Option<EngineArg>,

    /// Theme name, overrides the config file
    #[arg(short = 't', long = "theme", value_enum)]
    pub theme: Option<ThemeArg>,

    /// PNG width, overrides the config file
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// PNG height, overrides the config file
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Debug logging on stderr (otherwise GENOGRAM_LOG, default warn)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Json => "json",
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineArg {
    Planner,
    Hierarchical,
}

impl From<EngineArg> for LayoutEngine {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Planner => LayoutEngine::Planner,
            EngineArg::Hierarchical => LayoutEngine::Hierarchical,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeArg {
    Classic,
    Modern,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let base_config = apply_overrides(load_config(args.config.as_deref())?, &args);

    let (input, is_markdown) = read_input(args.input.as_deref())?;
    let documents = if is_markdown {
        extract_genogram_blocks(&input)
    } else {
        vec![input]
    };

    if documents.is_empty() {
        return Err(anyhow::anyhow!("No genogram blocks found in input"));
    }

    if documents.len() == 1 {
        return render_document(&documents[0], &base_config, args.output_format, args.output.as_deref());
    }

    let outputs = resolve_multi_outputs(args.output.as_deref(), args.output_format, documents.len())?;
    for (document, output) in documents.iter().zip(&outputs) {
        render_document(document, &base_config, args.output_format, Some(output.as_path()))?;
    }
    Ok(())
}

/// Command-line flags win over the config file, but only when given.
fn apply_overrides(mut config: Config, args: &Args) -> Config {
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    if let Some(engine) = args.engine {
        config.layout.engine = engine.into();
    }
    match args.theme {
        Some(ThemeArg::Classic) => config.theme = Theme::classic(),
        Some(ThemeArg::Modern) => config.theme = Theme::modern(),
        None => {}
    }
    config
}

fn render_document(
    source: &str,
    base_config: &Config,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let parsed = parse_source(source)?;
    let mut config = base_config.clone();
    if let Some(init_cfg) = parsed.init_config {
        config = merge_init_config(config, init_cfg);
    }
    let layout = compute_layout(&parsed.input, &config.layout)?;
    tracing::debug!(
        people = layout.people.len(),
        connectors = layout.connectors.len(),
        "layout computed"
    );

    match format {
        OutputFormat::Json => write_layout_json(output, &layout),
        OutputFormat::Svg => {
            let svg = render_svg(&layout, &config.theme, &config.render);
            write_output_svg(&svg, output)
        }
        OutputFormat::Png => {
            let output = ensure_output(output, format)?;
            let svg = render_svg(&layout, &config.theme, &config.render);
            write_png(&svg, output, &config)
        }
    }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    crate::render::write_output_png(svg, output, &config.render, &config.theme)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("GENOGRAM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<(String, bool)> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok((buf, false));
        }
        let content = std::fs::read_to_string(path)?;
        let is_md = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| matches!(ext, "md" | "markdown"))
            .unwrap_or(false);
        return Ok((content, is_md));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, false))
}

fn ensure_output(output: Option<&Path>, format: OutputFormat) -> Result<&Path> {
    output.ok_or_else(|| anyhow::anyhow!("Output path required for {} output", format.extension()))
}

fn extract_genogram_blocks(input: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut in_block = false;
    let mut current = Vec::new();
    let mut fence = String::new();

    for line in input.lines() {
        let trimmed = line.trim();
        if !in_block {
            if let Some(start_fence) = detect_genogram_fence(trimmed) {
                in_block = true;
                fence = start_fence;
            }
            continue;
        }
        if is_fence_end(trimmed, &fence) {
            in_block = false;
            blocks.push(current.join("\n"));
            current.clear();
            continue;
        }
        current.push(line.to_string());
    }

    blocks
}

fn detect_genogram_fence(line: &str) -> Option<String> {
    for fence in ["```", "~~~"] {
        if let Some(rest) = line.strip_prefix(fence) {
            let rest = rest.trim_start_matches(fence.chars().next()?).trim();
            if rest.starts_with("genogram") {
                return Some(fence.to_string());
            }
        }
    }
    None
}

fn is_fence_end(line: &str, fence: &str) -> bool {
    if !line.starts_with(fence) {
        return false;
    }
    line[fence.len()..].trim().is_empty()
}

fn resolve_multi_outputs(
    output: Option<&Path>,
    format: OutputFormat,
    count: usize,
) -> Result<Vec<PathBuf>> {
    let ext = format.extension();
    let base = output.ok_or_else(|| anyhow::anyhow!("Output path required for markdown input"))?;
    if base.is_dir() {
        return Ok((0..count)
            .map(|idx| base.join(format!("genogram-{}.{}", idx + 1, ext)))
            .collect());
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("genogram");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    Ok((0..count)
        .map(|idx| parent.join(format!("{}-{}.{}", stem, idx + 1, ext)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_genogram_blocks() {
        let input = r#"
text
``` genogram
a --> b
```
more
~~~genogram
x === y
~~~
```rust
fn main() {}
```
"#;
        let blocks = extract_genogram_blocks(input);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("a --> b"));
        assert!(blocks[1].contains("x === y"));
    }

    #[test]
    fn multi_outputs_are_numbered() {
        let outputs =
            resolve_multi_outputs(Some(Path::new("out/family.svg")), OutputFormat::Svg, 2).unwrap();
        assert_eq!(outputs[0], PathBuf::from("out/family-1.svg"));
        assert_eq!(outputs[1], PathBuf::from("out/family-2.svg"));
        assert!(resolve_multi_outputs(None, OutputFormat::Json, 2).is_err());
    }

    #[test]
    fn args_parse_engine_and_format() {
        let args = Args::try_parse_from([
            "genogram",
            "-i",
            "family.geno",
            "-e",
            "json",
            "--engine",
            "hierarchical",
            "-v",
        ])
        .unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
        assert_eq!(args.engine.map(LayoutEngine::from), Some(LayoutEngine::Hierarchical));
        assert!(args.verbose);
    }

    #[test]
    fn size_flags_only_override_when_given() {
        let mut config = Config::default();
        config.render.width = 640.0;
        config.render.height = 480.0;

        let args = Args::try_parse_from(["genogram", "-H", "300"]).unwrap();
        let config = apply_overrides(config, &args);
        assert_eq!(config.render.width, 640.0);
        assert_eq!(config.render.height, 300.0);
        assert_eq!(config.layout.engine, LayoutEngine::Planner);
    }

    #[test]
    fn png_needs_an_output_path() {
        assert!(ensure_output(None, OutputFormat::Png).is_err());
    }
}
