use anyhow::{Context, Result};
use apiblueprint_config::Config;
use apiblueprint_engine::{Annotation, ParseOptions, ParseResult, parse};
use apiblueprint_markdown::CharacterIndex;
use clap::Parser;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Parse an API Blueprint document and report what was found.
#[derive(Debug, Parser)]
#[command(name = "apiblueprint", version, about)]
struct Cli {
    /// Config file to read instead of ~/.config/apiblueprint/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Treat a missing API name as an error
    #[arg(long)]
    require_name: bool,

    /// Include the source map in JSON output
    #[arg(long)]
    source_map: bool,

    /// Render descriptions to HTML
    #[arg(long)]
    render: bool,

    /// Print the AST, source map and report as JSON
    #[arg(long)]
    json: bool,

    /// Blueprint file to parse
    file: PathBuf,
}

impl Cli {
    /// Command line switches can only turn options on.
    fn parse_options(&self, config: &Config) -> ParseOptions {
        let mut options = config.parse_options();
        options.require_blueprint_name |= self.require_name;
        options.export_source_map |= self.source_map;
        options.render_descriptions |= self.render;
        options
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            let path = Config::expand_path(path).unwrap_or_else(|| path.to_path_buf());
            Config::load_from_path(&path)?
                .with_context(|| format!("config file {} does not exist", path.display()))?
        }
        None => Config::load()?.unwrap_or_default(),
    };
    Ok(config)
}

/// `line:column` of the first byte an annotation points at.
fn location<C>(annotation: &Annotation<C>, index: &CharacterIndex) -> String {
    match annotation.location.first() {
        Some(range) => {
            let position = index.line_column(range.start);
            format!("{}:{}", position.line, position.column)
        }
        None => "-".to_string(),
    }
}

fn format_report(result: &ParseResult, source: &str, file: &Path) -> String {
    let index = CharacterIndex::new(source);
    let mut out = String::new();
    let report = &result.report;
    if let Some(error) = &report.error {
        let _ = writeln!(
            out,
            "{}:{}: error({}): {}",
            file.display(),
            location(error, &index),
            error.code.name(),
            error.message
        );
    }
    for warning in &report.warnings {
        let _ = writeln!(
            out,
            "{}:{}: warning({}): {}",
            file.display(),
            location(warning, &index),
            warning.code.name(),
            warning.message
        );
    }
    out
}

fn summary(result: &ParseResult) -> String {
    let blueprint = &result.blueprint;
    let resources: usize = blueprint
        .resource_groups
        .iter()
        .map(|group| group.resources.len())
        .sum();
    let actions: usize = blueprint
        .resource_groups
        .iter()
        .flat_map(|group| &group.resources)
        .map(|resource| resource.actions.len())
        .sum();
    let name = if blueprint.name.is_empty() {
        "<unnamed>"
    } else {
        blueprint.name.as_str()
    };
    format!(
        "{name}: {} group(s), {resources} resource(s), {actions} action(s)",
        blueprint.resource_groups.len()
    )
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;
    let options = cli.parse_options(&config);
    log::info!("parsing {} with {options:?}", cli.file.display());

    let source = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    let result = parse(&source, options);

    eprint!("{}", format_report(&result, &source, &cli.file));
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", summary(&result));
    }

    Ok(if result.report.has_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    run(&cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn flags_are_or_ed_with_config() {
        let cli = Cli::parse_from(["apiblueprint", "--source-map", "api.apib"]);
        let config = Config {
            render_descriptions: true,
            ..Config::default()
        };

        let options = cli.parse_options(&config);

        assert!(options.export_source_map);
        assert!(options.render_descriptions);
        assert!(!options.require_blueprint_name);
    }

    #[test]
    fn report_lines_carry_line_and_column() {
        let source = "# API\n\n# /message\n\n# /message\n";
        let result = parse(source, ParseOptions::default());

        let text = format_report(&result, source, Path::new("api.apib"));

        assert_eq!(
            text,
            "api.apib:5:1: warning(duplicate): the resource '/message' is already defined\n"
        );
    }

    #[test]
    fn summary_counts_entities() {
        let source = "# Notes API\n\n# /notes\n\n## GET\n\n+ Response 200\n\n## POST\n\n+ Response 201\n";
        let result = parse(source, ParseOptions::default());

        assert_eq!(
            summary(&result),
            "Notes API: 1 group(s), 1 resource(s), 2 action(s)"
        );
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.toml");

        assert!(load_config(Some(missing.as_path())).is_err());
    }

    #[test]
    fn explicit_config_is_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "require_blueprint_name = true\n").unwrap();

        let config = load_config(Some(path.as_path())).unwrap();

        assert!(config.require_blueprint_name);
    }
}
