use std::rc::Rc;

use anyhow::{Context, Result, bail};
use cache::{MemoryStore, TtlCache};
use clap::{Args, Parser, Subcommand};
use formats::{FetchOptions, derive_bounds};
use foundation::SystemClock;
use layers::{RecordingFactory, RecordingSurface, Services, ServicesConfig};
use repository::{HttpTransport, Transport};
use runtime::TokioSpawner;
use serde_json::{Value, json};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fetch, cache and compose gazetteer records from the command line")]
struct Cli {
    /// Record store root URL
    #[arg(long, env = "SPELUNKER_ROOT_URL", default_value = "https://spelunker.whosonfirst.org")]
    root_url: String,

    /// Cache entry lifetime in seconds
    #[arg(long, env = "SPELUNKER_CACHE_TTL_SECS", default_value_t = 30)]
    ttl_secs: u64,

    /// Map configuration path, relative to the root URL
    #[arg(long, default_value = formats::MAP_CONFIG_PATH)]
    map_config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
struct AltArgs {
    /// Alternate geometry source
    #[arg(long)]
    alt_source: Option<String>,

    #[arg(long, requires = "alt_source")]
    alt_function: Option<String>,

    #[arg(long, requires = "alt_source")]
    alt_extra: Option<String>,
}

impl AltArgs {
    fn options(&self) -> FetchOptions {
        match &self.alt_source {
            Some(source) => {
                FetchOptions::alternate(source.clone(), self.alt_function.clone(), self.alt_extra.clone())
            }
            None => FetchOptions::default(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a record as GeoJSON
    Fetch {
        id: i64,
        #[command(flatten)]
        alt: AltArgs,
    },

    /// Print the (south-west, north-east) extent of a record
    Bounds {
        id: i64,
        #[command(flatten)]
        alt: AltArgs,
    },

    /// Compose a record onto an off-screen map and print every draw call
    Compose {
        id: i64,
        /// Mount point id
        #[arg(long, default_value = "map")]
        mount: String,
        #[command(flatten)]
        alt: AltArgs,
    },

    /// Print a record's display label
    Label { id: i64 },

    /// Print facet counts for a listing path (e.g. /placetypes/locality)
    Facets { path: String, facet: String },
}

/// What a command produced. Surfaces are read only after background work
/// (parent outlines) has drained.
enum Report {
    Json(Value),
    Text(String),
    Surface(Rc<RecordingSurface>),
}

impl Report {
    fn render(&self) -> Result<String> {
        Ok(match self {
            Report::Json(v) => serde_json::to_string_pretty(v)?,
            Report::Text(s) => s.clone(),
            Report::Surface(s) => serde_json::to_string_pretty(&s.events())?,
        })
    }
}

fn main() -> Result<()> {
    runtime::logging::init(runtime::logging::DEFAULT_FILTER);

    let cli = Cli::parse();
    let transport: Rc<dyn Transport> = Rc::new(HttpTransport::new(cli.root_url.clone()));

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building runtime")?;
    let local = tokio::task::LocalSet::new();
    let report = local.block_on(&rt, run(&cli, transport))?;
    rt.block_on(local);

    println!("{}", report.render()?);
    Ok(())
}

async fn run(cli: &Cli, transport: Rc<dyn Transport>) -> Result<Report> {
    let config = ServicesConfig {
        ttl_secs: cli.ttl_secs,
        map_config_path: cli.map_config.clone(),
    };
    let cache = TtlCache::new(Rc::new(MemoryStore::new()), Rc::new(SystemClock));
    let surfaces = Rc::new(RecordingFactory::new());
    let services = Services::new(
        &config,
        cache,
        transport,
        surfaces.clone(),
        Rc::new(TokioSpawner),
    );

    match &cli.command {
        Command::Fetch { id, alt } => {
            let feature = services.repository.fetch(*id, &alt.options()).await?;
            Ok(Report::Json(serde_json::to_value(&feature)?))
        }
        Command::Bounds { id, alt } => {
            let feature = services.repository.fetch(*id, &alt.options()).await?;
            let Some(bounds) = derive_bounds(&feature) else {
                bail!("record {id} has no positions");
            };
            Ok(Report::Json(json!({
                "south_west": [bounds.south_west.lat, bounds.south_west.lng],
                "north_east": [bounds.north_east.lat, bounds.north_east.lng],
                "degenerate": bounds.is_degenerate(),
            })))
        }
        Command::Compose { id, mount, alt } => {
            let map = services
                .compositor
                .render(mount, *id, &alt.options())
                .await
                .with_context(|| format!("composing record {id} on {mount:?}"))?;
            info!(mount = %map.mount_id(), state = ?map.state(), "composed");
            let surface = surfaces
                .surface(mount)
                .context("compositor did not create a surface")?;
            Ok(Report::Surface(surface))
        }
        Command::Label { id } => match services.repository.fetch_label(*id).await? {
            Some(label) => Ok(Report::Text(label)),
            None => bail!("record {id} has no label"),
        },
        Command::Facets { path, facet } => {
            let facets = services.repository.fetch_facets(path, facet).await?;
            Ok(Report::Json(serde_json::to_value(&facets)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AltArgs, Cli, Command, Report, run};
    use clap::{CommandFactory, Parser};
    use formats::FetchOptions;
    use layers::{PaneKind, SurfaceEvent};
    use pretty_assertions::assert_eq;
    use repository::MemoryTransport;
    use std::rc::Rc;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_alternate_geometry_flags() {
        let cli = Cli::try_parse_from([
            "spelunker",
            "--root-url",
            "http://localhost:8080",
            "fetch",
            "101736545",
            "--alt-source",
            "quattroshapes",
            "--alt-function",
            "display",
        ])
        .unwrap();
        assert_eq!(cli.root_url, "http://localhost:8080");
        match cli.command {
            Command::Fetch { id, alt } => {
                assert_eq!(id, 101736545);
                assert_eq!(
                    alt.options(),
                    FetchOptions::alternate("quattroshapes", Some("display".to_string()), None)
                );
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn alt_function_requires_source() {
        assert!(Cli::try_parse_from(["spelunker", "bounds", "1", "--alt-function", "x"]).is_err());
        assert_eq!(AltArgs::default().options(), FetchOptions::default());
    }

    #[test]
    fn negative_ids_parse_and_are_rejected_later() {
        let cli = Cli::try_parse_from(["spelunker", "label", "--", "-1"]).unwrap();
        assert!(matches!(cli.command, Command::Label { id: -1 }));
    }

    fn transport() -> Rc<MemoryTransport> {
        let t = Rc::new(MemoryTransport::new());
        t.insert(
            "/maps.json",
            r#"{"provider":"tile","tile_url":"http://x/{z}/{x}/{y}.png"}"#,
        );
        t.insert(
            "/id/42/geojson",
            r#"{"type":"Feature",
                "geometry":{"type":"Polygon","coordinates":[[[0,0],[0,2],[2,2],[2,0],[0,0]]]},
                "properties":{"wof:id":42,"wof:label":"Gotham (city)","wof:parent_id":7,
                              "lbl:longitude":10,"lbl:latitude":20}}"#,
        );
        t.insert(
            "/id/7/geojson",
            r#"{"type":"Feature",
                "geometry":{"type":"Polygon","coordinates":[[[-5,-5],[-5,5],[5,5],[5,-5],[-5,-5]]]},
                "properties":{"wof:id":7}}"#,
        );
        t
    }

    #[tokio::test]
    async fn compose_reports_parent_after_draining() {
        let cli = Cli::try_parse_from(["spelunker", "compose", "42"]).unwrap();
        let t = transport();

        let local = tokio::task::LocalSet::new();
        let report = local.run_until(run(&cli, t.clone())).await.unwrap();
        local.await;

        let Report::Surface(surface) = report else {
            panic!("compose should report a surface");
        };
        let panes: Vec<PaneKind> = surface
            .events()
            .into_iter()
            .filter_map(|e| match e {
                SurfaceEvent::Draw { command } => Some(command.pane()),
                _ => None,
            })
            .collect();
        assert_eq!(
            panes,
            vec![
                PaneKind::BoundingBox,
                PaneKind::Polygon,
                PaneKind::Centroids,
                PaneKind::Parent
            ]
        );
        assert_eq!(t.request_count("/id/7/geojson"), 1);
    }

    #[tokio::test]
    async fn bounds_and_label_commands() {
        let t = transport();

        let cli = Cli::try_parse_from(["spelunker", "bounds", "42"]).unwrap();
        let out = run(&cli, t.clone()).await.unwrap().render().unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["south_west"], serde_json::json!([0.0, 0.0]));
        assert_eq!(v["north_east"], serde_json::json!([2.0, 2.0]));
        assert_eq!(v["degenerate"], serde_json::json!(false));

        let cli = Cli::try_parse_from(["spelunker", "label", "42"]).unwrap();
        let out = run(&cli, t.clone()).await.unwrap().render().unwrap();
        assert_eq!(out, "Gotham (city)");
    }

    #[tokio::test]
    async fn invalid_id_is_an_error() {
        let cli = Cli::try_parse_from(["spelunker", "fetch", "0"]).unwrap();
        let err = run(&cli, transport()).await.err().unwrap();
        assert!(err.to_string().contains("not a valid record identifier"));
    }
}
