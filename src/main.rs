use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Arg, ArgAction, Command, value_parser};
use log::{info, warn};
use pixelator::core_modules::color_math::display_hex;
use pixelator::core_modules::pointer::SystemClipboard;
use pixelator::core_modules::records::{ExportStore, offset_records_with, to_json};
use pixelator::core_modules::utils::image_helper::image_helper;
use pixelator::{GridSize, PIXELS_PER_GRID, Pixelator, RenderConfig, RenderOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("pixelator")
        .version("0.1")
        .about("Pixelate an image onto a grid of flat-colored blocks.")
        .arg(
            Arg::new("input")
                .help("Sets the input image (PNG, GIF or JPG)")
                .required(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Where to save the rendered PNG"),
        )
        .arg(
            Arg::new("grid")
                .short('g')
                .long("grid")
                .value_name("X,Y")
                .default_value("1,1")
                .help("Grid size in grid units"),
        )
        .arg(
            Arg::new("display")
                .short('d')
                .long("display")
                .value_name("W,H")
                .default_value("500,500")
                .help("Display box to render into"),
        )
        .arg(
            Arg::new("blur")
                .short('b')
                .long("blur")
                .value_name("PERCENT")
                .default_value("0")
                .value_parser(value_parser!(u8).range(0..=100))
                .help("Neighbourhood blur, 0-100"),
        )
        .arg(
            Arg::new("no_pixelate")
                .long("no-pixelate")
                .action(ArgAction::SetTrue)
                .help("Draw the image without pixelating it"),
        )
        .arg(
            Arg::new("lined")
                .long("lined")
                .action(ArgAction::SetTrue)
                .help("Draw grid lines over the output"),
        )
        .arg(
            Arg::new("pixels_per_grid")
                .long("pixels-per-grid")
                .value_name("UINT")
                .default_value("25")
                .value_parser(value_parser!(u32).range(1..))
                .help("Cells along one edge of a grid unit"),
        )
        .arg(
            Arg::new("records")
                .long("records")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Write the pixel records as JSON"),
        )
        .arg(
            Arg::new("probe")
                .long("probe")
                .value_name("X,Y")
                .help("Print the color and cell at a display position"),
        )
        .arg(
            Arg::new("copy")
                .long("copy")
                .requires("probe")
                .action(ArgAction::SetTrue)
                .help("Copy the probed color to the system clipboard"),
        )
        .arg(
            Arg::new("square")
                .long("square")
                .value_name("N")
                .value_parser(value_parser!(u32).range(1..))
                .requires("squares_per_row")
                .requires("store")
                .help("1-based square to place the records in"),
        )
        .arg(
            Arg::new("squares_per_row")
                .long("squares-per-row")
                .value_name("UINT")
                .value_parser(value_parser!(u32).range(1..))
                .help("Squares per row of the target canvas"),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .requires("square")
                .help("JSON list the offset records are appended to"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Prints debug information verbosely."),
        )
        .get_matches();

    let default_level = if matches.get_flag("verbose") { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let input_path = matches
        .get_one::<PathBuf>("input")
        .context("input is required")?;
    let (grid_x, grid_y) = parse_pair(string_arg(&matches, "grid")?).context("invalid --grid")?;
    let (width, height) = parse_pair(string_arg(&matches, "display")?).context("invalid --display")?;
    let pixels_per_grid = matches
        .get_one::<u32>("pixels_per_grid")
        .copied()
        .unwrap_or(PIXELS_PER_GRID);

    let config = RenderConfig::default()
        .with_display_size(width, height)
        .with_grid_size(Some(GridSize::new(grid_x, grid_y)?))
        .with_blur(matches.get_one::<u8>("blur").copied().unwrap_or(0))
        .with_pixelate(!matches.get_flag("no_pixelate"))
        .with_lined(matches.get_flag("lined"))
        .with_pixels_per_grid(pixels_per_grid);

    info!("Using input file: {}", input_path.display());
    let bytes = tokio::fs::read(input_path)
        .await
        .with_context(|| format!("unable to read {}", input_path.display()))?;

    let mut pixelator = Pixelator::with_config(config);
    match pixelator.load(bytes).await {
        RenderOutcome::Rendered { records } => info!("Rendered {records} cells"),
        RenderOutcome::Failed(err) => return Err(err.into()),
        other => bail!("nothing was rendered: {other:?}"),
    }
    if let Some(warning) = pixelator.validity().and_then(|validity| validity.warning()) {
        warn!("{warning}");
    }

    if let Some(output) = matches.get_one::<PathBuf>("output") {
        let surface = pixelator.surface().context("no visible surface")?;
        image_helper::save(output, surface)?;
        info!("Output saved to {}", output.display());
    }

    if let Some(path) = matches.get_one::<PathBuf>("records") {
        std::fs::write(path, to_json(pixelator.records())?)?;
        info!("Wrote {} records to {}", pixelator.records().len(), path.display());
    }

    if let Some(position) = matches.get_one::<String>("probe") {
        let (x, y) = parse_pair(position).context("invalid --probe")?;
        let (x, y) = (x as f64, y as f64);
        let probe = pixelator.probe(x, y).context("probe is outside the surface")?;
        match probe.cell {
            Some(cell) => println!("{} at cell ({}, {})", display_hex(&probe.color_hex), cell.x, cell.y),
            None => println!("{}", display_hex(&probe.color_hex)),
        }
        if matches.get_flag("copy") {
            let outcome = pixelator.pointer_click(x, y, &mut SystemClipboard);
            if outcome.is_some_and(|outcome| outcome.copied) {
                info!("Copied {} to the clipboard", display_hex(&probe.color_hex));
            }
        }
    }

    if let (Some(square), Some(squares_per_row), Some(store)) = (
        matches.get_one::<u32>("square"),
        matches.get_one::<u32>("squares_per_row"),
        matches.get_one::<PathBuf>("store"),
    ) {
        let shifted = offset_records_with(pixelator.records(), *square, *squares_per_row, pixels_per_grid)?;
        let total = ExportStore::new(store).append(&shifted)?;
        info!("Appended {} records to {} ({total} stored)", shifted.len(), store.display());
    }

    Ok(())
}

fn string_arg<'a>(matches: &'a clap::ArgMatches, id: &str) -> anyhow::Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("--{id} is required"))
}

fn parse_pair(pair: &str) -> anyhow::Result<(u32, u32)> {
    let parts: Vec<&str> = pair.split(',').collect();
    if parts.len() != 2 {
        bail!("Provide the value in the format a,b.");
    }
    let first = parts[0].trim().parse::<u32>().context("invalid first value")?;
    let second = parts[1].trim().parse::<u32>().context("invalid second value")?;
    Ok((first, second))
}
