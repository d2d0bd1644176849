use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use depthmap::api::{DataSource, HttpDataSource, MeasurementUpdate};
use depthmap::core::{Bounds, LatLng, MeasurementFilter, PositionId, TripId};
use depthmap::feeds::{DepthFeed, DepthFeedSettings, MapSession, TripFeed};
use depthmap::gradient::DepthGradient;
use depthmap::map::{FileStore, HeadlessMap, MapView, MapWidget, MemoryStore, ViewportStore};
use depthmap::utils::{ConfigurationManager, ViewerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Marine depth map viewer", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the depth legend table as HTML
    Legend,
    /// Print the color of every gradient slot
    Gradient,
    /// Fetch the depth measurements of an area
    Depths(DepthsArgs),
    /// List the available trips
    Trips,
    /// Fetch the points of one trip inside an area
    Trip(TripArgs),
    /// Mark a measurement as valid or erroneous
    Flag(FlagArgs),
}

#[derive(Args, Debug)]
struct AreaArgs {
    #[arg(long, allow_hyphen_values = true)]
    lat0: f64,
    #[arg(long, allow_hyphen_values = true)]
    lon0: f64,
    #[arg(long, allow_hyphen_values = true)]
    lat1: f64,
    #[arg(long, allow_hyphen_values = true)]
    lon1: f64,
    /// Zoom level used for the sampling density
    #[arg(long)]
    zoom: Option<u8>,
}

#[derive(Args, Debug)]
struct DepthsArgs {
    #[command(flatten)]
    area: AreaArgs,

    /// Which measurements to report: all, valid or erroneous (0/1/2)
    #[arg(long)]
    filter: Option<MeasurementFilter>,

    /// Write the depth histogram as SVG
    #[arg(long, value_hint = ValueHint::FilePath)]
    svg: Option<PathBuf>,

    /// Save the viewport of this run to this file. The area given on the
    /// command line always replaces a viewport stored there.
    #[arg(long, value_hint = ValueHint::FilePath)]
    viewport_store: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TripArgs {
    trip_id: String,

    #[command(flatten)]
    area: AreaArgs,
}

#[derive(Args, Debug)]
struct FlagArgs {
    position_id: String,

    /// New value of the erroneous flag
    #[arg(long, action = ArgAction::Set)]
    erroneous: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigurationManager::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ConfigurationManager::new(),
    };
    let config = manager.config().clone();

    let default_level = if cli.verbose { "debug" } else { config.log_level.as_filter() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Legend => {
            println!("{}", DepthGradient::new(&config.gradient).legend().to_html());
            Ok(())
        }
        Command::Gradient => {
            let gradient = DepthGradient::new(&config.gradient);
            for (index, color) in gradient.colors().iter().enumerate() {
                println!("{:>3} {}", index, color.css());
            }
            Ok(())
        }
        Command::Depths(args) => handle_depths(&config, args),
        Command::Trips => handle_trips(&config),
        Command::Trip(args) => handle_trip(&config, args),
        Command::Flag(args) => handle_flag(&config, args),
    }
}

fn data_source(config: &ViewerConfig) -> Result<HttpDataSource> {
    HttpDataSource::new(&config.api).context("creating HTTP client")
}

/// Headless view showing exactly the requested area
fn area_view(config: &ViewerConfig, area: &AreaArgs, store: Box<dyn ViewportStore>) -> Result<MapView<HeadlessMap>> {
    if area.lat0 >= area.lat1 || area.lon0 >= area.lon1 {
        return Err(anyhow!("area must satisfy lat0 < lat1 and lon0 < lon1"));
    }
    let bounds = Bounds::new(LatLng::new(area.lat0, area.lon0), LatLng::new(area.lat1, area.lon1));

    let mut view = MapView::new(HeadlessMap::from_settings(&config.map), store, config.cookie.clone(), &config.map);
    // The explicit area overrides whatever the store restored.
    let zoom = area.zoom.unwrap_or(config.map.default_zoom);
    view.widget_mut().set_view(bounds.center(), zoom);
    view.widget_mut().set_bounds(Some(bounds));
    Ok(view)
}

fn handle_depths(config: &ViewerConfig, args: DepthsArgs) -> Result<()> {
    let store: Box<dyn ViewportStore> = match &args.viewport_store {
        Some(path) => Box::new(FileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    };
    let view = area_view(config, &args.area, store)?;

    let settings = DepthFeedSettings {
        initial_filter: args.filter.unwrap_or(config.depth_feed.initial_filter),
        ..config.depth_feed.clone()
    };
    let feed = DepthFeed::new(DepthGradient::new(&config.gradient), &config.histogram, &settings);
    let mut session = MapSession::new(view, feed, Box::new(data_source(config)?));
    session.start().context("fetching depth data")?;

    let feed = session.feed();
    let filter = feed.filter();
    let mut shown = 0;
    for tracked in feed.markers().iter() {
        if !filter.matches(tracked.point.depth_erroneous) {
            continue;
        }
        shown += 1;
        let depth = tracked.point.depth.map(|d| format!("{:.1}", d)).unwrap_or_else(|| "-".to_string());
        println!(
            "{}\t{:.6}\t{:.6}\t{}\t{}",
            tracked.point.position_id,
            tracked.point.latitude,
            tracked.point.longitude,
            depth,
            feed.gradient().color(tracked.point.depth.unwrap_or(0.0)).css()
        );
    }
    info!(shown, tracked = feed.markers().len(), %filter, "depth listing done");

    if let Some(path) = &args.svg {
        match feed.histogram_svg() {
            Some(svg) => {
                let svg = svg.context("rendering histogram")?;
                fs::write(path, svg).with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), "histogram written");
            }
            None => warn!("histogram is disabled in the configuration"),
        }
    }
    Ok(())
}

fn handle_trips(config: &ViewerConfig) -> Result<()> {
    let mut source = data_source(config)?;
    let mut feed = TripFeed::new(config.depth_feed.discard_stale_responses);
    for trip in feed.load_trips(&mut source).context("fetching trip list")? {
        println!("{}\t{}\t{}\t{}", trip.trip_id, trip.vessel_name, trip.trip_date, trip.trip_name);
    }
    Ok(())
}

fn handle_trip(config: &ViewerConfig, args: TripArgs) -> Result<()> {
    let mut source = data_source(config)?;
    let mut view = area_view(config, &args.area, Box::new(MemoryStore::new()))?;
    let mut feed = TripFeed::new(config.depth_feed.discard_stale_responses);
    feed.load_trips(&mut source).context("fetching trip list")?;

    let trip_id = TripId::new(args.trip_id);
    let created = feed
        .show_trip(&mut view, &mut source, &trip_id)
        .with_context(|| format!("showing trip {}", trip_id))?;

    for tracked in feed.markers().iter() {
        let point = &tracked.point;
        let speed = |v: Option<f64>| v.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".to_string());
        println!(
            "{}\t{}\t{:.6}\t{:.6}\tws={}\tgs={}\tcourse={}",
            point.position_id,
            point.timestamp_utc,
            point.latitude,
            point.longitude,
            speed(point.water_speed),
            speed(point.ground_speed),
            speed(point.course),
        );
    }
    info!(%trip_id, created, attached = view.widget().attached_count(), "trip listing done");
    Ok(())
}

fn handle_flag(config: &ViewerConfig, args: FlagArgs) -> Result<()> {
    let mut source = data_source(config)?;
    let position_id = PositionId::new(args.position_id);
    source
        .update_measurement(&position_id, &MeasurementUpdate { depth_erroneous: args.erroneous })
        .with_context(|| format!("updating measurement {}", position_id))?;
    info!(%position_id, erroneous = args.erroneous, "measurement updated");
    Ok(())
}
