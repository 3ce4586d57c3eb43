use clap::Parser;
use tracing::{error, info};

use wmts_pruner::{
    CrawlConfig, Crawler, FetchPolicy, HttpClient, HttpConfig, MockClient, ReqwestClient,
    find_layer, get_capabilities,
};

#[derive(Parser)]
#[command(name = "prune-layer")]
#[command(about = "Discover the non-empty extent of a WMTS layer by quadtree pruning")]
struct Args {
    /// WMTS base endpoint (defaults to the Finnish nautical chart service)
    #[arg(long)]
    base_url: Option<String>,

    /// Layer identifier to crawl
    #[arg(short, long)]
    layer: Option<String>,

    /// Projection prefix whose matrix set drives the crawl
    #[arg(short, long)]
    projection: Option<String>,

    /// Deepest zoom level to fetch
    #[arg(short, long)]
    stop_after_zoom: Option<u32>,

    /// Known blank-tile byte lengths (classified empty without decoding)
    #[arg(long)]
    blank_length: Vec<usize>,

    /// Retry failed tile fetches this many times instead of failing fast
    #[arg(long)]
    retries: Option<u32>,

    /// Use the offline mock transport instead of real HTTP
    #[arg(long)]
    mock: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

const DEMO_CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Capabilities xmlns="http://www.opengis.net/wmts/1.0"
              xmlns:ows="http://www.opengis.net/ows/1.1">
  <Contents>
    <Layer>
      <ows:Title>Demo layer</ows:Title>
      <ows:Identifier>demo:layer</ows:Identifier>
      <Format>image/png</Format>
      <TileMatrixSetLink>
        <TileMatrixSet>EPSG:3395_FTA</TileMatrixSet>
        <TileMatrixSetLimits>
          <TileMatrixLimits>
            <TileMatrix>EPSG:3395_FTA:5</TileMatrix>
            <MinTileRow>0</MinTileRow>
            <MaxTileRow>1</MaxTileRow>
            <MinTileCol>0</MinTileCol>
            <MaxTileCol>1</MaxTileCol>
          </TileMatrixLimits>
        </TileMatrixSetLimits>
      </TileMatrixSetLink>
    </Layer>
  </Contents>
</Capabilities>"#;

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let mut config = CrawlConfig::default();
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(layer) = args.layer {
        config.layer_id = layer;
    }
    if let Some(projection) = args.projection {
        config = config.with_projection(projection);
    }
    if let Some(zoom) = args.stop_after_zoom {
        config = config.with_stop_after_zoom(zoom);
    }
    if !args.blank_length.is_empty() {
        config = config.with_blank_tile_lengths(args.blank_length.clone());
    }
    if let Some(attempts) = args.retries {
        config = config.with_fetch_policy(FetchPolicy::Retry { attempts });
    }
    config.validate().map_err(|e| e.to_string())?;

    info!("🗺️  WMTS pruning crawler starting");
    info!("🔗 Service: {}", config.base_url);
    info!("📄 Layer: {}", config.layer_id);
    info!(
        "🔍 Projection {} up to zoom {}",
        config.projection, config.stop_after_zoom
    );

    let client: Box<dyn HttpClient> = if args.mock {
        // Offline fixture: one layer, a 2x2 extent at zoom 5, every tile
        // blank, so the whole pyramid prunes at the first level.
        if config.layer_id == CrawlConfig::default().layer_id {
            config.layer_id = "demo:layer".to_string();
        }
        Box::new(
            MockClient::new()
                .with_route("request=getcapabilities", DEMO_CAPABILITIES.as_bytes().to_vec()),
        )
    } else {
        let http_config =
            HttpConfig::default().with_timeout(std::time::Duration::from_secs(config.timeout_seconds));
        Box::new(ReqwestClient::with_config(http_config).map_err(|e| e.to_string())?)
    };

    let layers = get_capabilities(client.as_ref(), &config)
        .await
        .map_err(|e| {
            error!("Failed to load capabilities: {}", e);
            e.to_string()
        })?;

    let layer = find_layer(&layers, &config.layer_id).ok_or_else(|| {
        error!(
            "Layer '{}' not found; service advertises {} layer(s)",
            config.layer_id,
            layers.len()
        );
        "layer not found".to_string()
    })?;

    let crawler = Crawler::new(client.as_ref(), &config);
    let report = crawler.crawl(layer).await.map_err(|e| {
        error!("Crawl failed: {}", e);
        e.to_string()
    })?;

    info!(
        "✅ Crawl halted ({:?}): {} fetched, {} pruned, {} expanded",
        report.halt, report.tiles_fetched, report.tiles_pruned, report.tiles_expanded
    );
    if let Some(naive) = report.naive_next_zoom_tiles {
        info!(
            "Naive getter would fetch {} tiles at zoom {}; only {} still contain stuff",
            naive,
            config.stop_after_zoom + 1,
            report.unexplored.len()
        );
    }
    if !report.unexplored.is_empty() {
        println!(
            "{}",
            serde_json::to_string_pretty(&report.unexplored).map_err(|e| e.to_string())?
        );
    }

    Ok(())
}
