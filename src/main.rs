//! overlay-report
//!
//! Loads a persisted annotation file, rebuilds every shape through the
//! overlay engine and prints each shape's label lines.
//!
//! ```text
//! overlay-report <ATTRS> [--pixel-size <PIXEL_SIZE>] [--config <CONFIG>]
//! ```

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    let cli = report::Cli::parse();
    if let Err(e) = report::run(&cli) {
        eprintln!("overlay-report: {}", e);
        std::process::exit(1);
    }
}

// The report tool reads local files; there is nothing to run on the web
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod report {
    use std::path::PathBuf;

    use clap::Parser;
    use slide_overlay::{
        AttrError, ConfigError, OverlayConfig, OverlayEngine, SimpleViewport, Size,
    };
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum ReportError {
        #[error("Failed to read {path:?}: {source}")]
        Read {
            path: PathBuf,
            source: std::io::Error,
        },

        #[error(transparent)]
        Attr(#[from] AttrError),

        #[error(transparent)]
        Config(#[from] ConfigError),
    }

    #[derive(Parser, Debug, Clone, PartialEq)]
    #[command(
        name = "overlay-report",
        about = "Print the measurement labels of a persisted annotation file"
    )]
    pub struct Cli {
        /// Persisted shape attrs (JSON array)
        pub attrs: PathBuf,

        /// Physical size of one image pixel, in micrometres
        #[arg(long, allow_negative_numbers = true, value_parser = parse_pixel_size)]
        pub pixel_size: Option<f64>,

        /// Config file to use instead of the default location
        #[arg(long)]
        pub config: Option<PathBuf>,
    }

    fn parse_pixel_size(value: &str) -> Result<f64, String> {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| format!("expected a positive number, got '{}'", value))
    }

    fn load_config(cli: &Cli) -> Result<OverlayConfig, ReportError> {
        let mut config = match &cli.config {
            Some(path) => OverlayConfig::load_from_path(path)?,
            None => OverlayConfig::load_from_default_path().unwrap_or_default(),
        };
        if let Some(pixel_size) = cli.pixel_size {
            config.label.pixel_size_per_world_unit = pixel_size;
        }
        Ok(config)
    }

    fn init_logging(config: &OverlayConfig) {
        // RUST_LOG overrides the configured level
        env_logger::Builder::new()
            .filter_level(config.log_level.to_level_filter())
            .parse_default_env()
            .init();
    }

    pub fn run(cli: &Cli) -> Result<(), ReportError> {
        let config = load_config(cli)?;
        init_logging(&config);

        let json = std::fs::read_to_string(&cli.attrs).map_err(|source| ReportError::Read {
            path: cli.attrs.clone(),
            source,
        })?;

        // Unit zoom: world and screen coincide, which is all a report needs
        let viewport = SimpleViewport::new(Size::new(1.0, 1.0), Size::new(1.0, 1.0));
        let mut engine = OverlayEngine::new(viewport, config);
        engine.set_shapes_attr_json(&json)?;
        log::info!("Loaded {} shapes from {:?}", engine.shapes().count(), cli.attrs);

        for shape in engine.shapes() {
            println!("{} [{}]", shape.id, shape.kind().name());
            for line in engine.label_lines(&shape.id).unwrap_or_default() {
                println!("    {}", line);
            }
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
            Cli::try_parse_from(std::iter::once("overlay-report").chain(args.iter().copied()))
        }

        #[test]
        fn test_parse_all_flags() {
            let parsed =
                parse(&["shapes.json", "--pixel-size", "0.25", "--config", "c.json"]).unwrap();
            assert_eq!(
                parsed,
                Cli {
                    attrs: PathBuf::from("shapes.json"),
                    pixel_size: Some(0.25),
                    config: Some(PathBuf::from("c.json")),
                }
            );
        }

        #[test]
        fn test_missing_file_is_rejected() {
            let err = parse(&[]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
        }

        #[test]
        fn test_rejects_bad_pixel_size() {
            for bad in ["0", "-1", "abc", "NaN", "inf"] {
                let err = parse(&["a.json", "--pixel-size", bad]).unwrap_err();
                assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation, "{bad}");
            }
        }

        #[test]
        fn test_rejects_second_positional() {
            assert!(parse(&["a.json", "b.json"]).is_err());
        }
    }
}
