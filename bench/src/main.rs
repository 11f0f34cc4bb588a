use lineage_core::{
    analyze_impact, ancestors_of, build_graph, compute_view, descendants_of, direct_counts,
    filter_view, layout_with_levels, AssetRecord, EngineConfig, Graph, LayoutConfig,
    RelationshipRecord, ViewMode,
};
use std::time::Instant;
use tracing::info;

type Snapshot = (Vec<AssetRecord>, Vec<RelationshipRecord>);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,lineage_bench=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mode = args.get(1).map(|s| s.as_str()).unwrap_or("all");
    let asset_count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(50_000);

    if mode == "help" || mode == "--help" {
        println!("Usage: lineage-bench [mode] [asset_count]");
        println!();
        println!("Modes:");
        println!("  all       Run all generators and benchmark each (default)");
        println!("  chain     Single linear pipeline (deepest levels)");
        println!("  fanout    One source feeding a wide tree (widest levels)");
        println!("  mesh      Preferential-attachment DAG (hub-and-spoke)");
        println!("  cycle     Chains closed into rings (no roots, fallback leveling)");
        println!("  catalogs  Many catalogs with storage containers/folders");
        println!();
        println!("Default asset_count: 50000");
        return;
    }

    println!("lineage-bench");
    println!("=============");
    println!();

    let generators: Vec<(&str, fn(u64) -> Snapshot)> = match mode {
        "chain" => vec![("Linear chain", gen_chain)],
        "fanout" => vec![("Fan-out tree", gen_fanout)],
        "mesh" => vec![("Preferential-attachment mesh", gen_mesh)],
        "cycle" => vec![("Cyclic rings", gen_cycle)],
        "catalogs" => vec![("Catalogs with storage hierarchy", gen_catalogs)],
        "all" => vec![
            ("Linear chain", gen_chain as fn(u64) -> Snapshot),
            ("Fan-out tree", gen_fanout),
            ("Preferential-attachment mesh", gen_mesh),
            ("Cyclic rings", gen_cycle),
            ("Catalogs with storage hierarchy", gen_catalogs),
        ],
        _ => {
            eprintln!("Unknown mode: {}. Use --help for options.", mode);
            return;
        }
    };

    for (name, generator) in generators {
        run_benchmark(name, generator, asset_count);
    }
}

fn ms(t: Instant) -> f64 {
    t.elapsed().as_secs_f64() * 1000.0
}

fn run_benchmark(name: &str, generator: fn(u64) -> Snapshot, asset_count: u64) {
    println!("--- {} ---", name);
    println!("Target: {} assets", asset_count);

    let t = Instant::now();
    let (assets, relationships) = generator(asset_count);
    println!(
        "Generated in {:.1}ms: {} assets, {} relationships",
        ms(t),
        assets.len(),
        relationships.len()
    );

    let t = Instant::now();
    let graph = build_graph(&assets, &relationships);
    let build_ms = ms(t);

    println!();
    println!("{:>14} {:>10} {:>10} {:>10}", "stage", "nodes", "edges", "time");
    println!("{:->14} {:->10} {:->10} {:->10}", "", "", "", "");
    println!(
        "{:>14} {:>10} {:>10} {:>8.1}ms",
        "build",
        graph.node_count(),
        graph.edge_count(),
        build_ms
    );

    for mode in [ViewMode::Hierarchical, ViewMode::Actual] {
        let t = Instant::now();
        let filtered = filter_view(&graph, mode);
        let filter_ms = ms(t);
        println!(
            "{:>14} {:>10} {:>10} {:>8.1}ms",
            format!("filter/{}", mode),
            filtered.node_count(),
            filtered.edge_count(),
            filter_ms
        );

        let t = Instant::now();
        let (positioned, levels) =
            layout_with_levels(&filtered.nodes, &filtered.edges, &LayoutConfig::default());
        let layout_ms = ms(t);
        let depth = levels.values().copied().max().unwrap_or(0);
        println!(
            "{:>14} {:>10} {:>10} {:>8.1}ms  (max level {})",
            format!("layout/{}", mode),
            positioned.len(),
            filtered.edge_count(),
            layout_ms,
            depth
        );
    }

    // Traversal from the first asset (a root or hub in every generator)
    let Some(focal) = assets.first().map(|a| a.id.clone()) else {
        println!();
        return;
    };
    let index = Graph::from_lineage(&graph.nodes, &graph.edges);

    let t = Instant::now();
    let up = ancestors_of(&index, &focal);
    let up_ms = ms(t);
    let t = Instant::now();
    let down = descendants_of(&index, &focal);
    let down_ms = ms(t);
    println!("{:>14} {:>10} {:>10} {:>8.1}ms", "ancestors", up.len(), "", up_ms);
    println!("{:>14} {:>10} {:>10} {:>8.1}ms", "descendants", down.len(), "", down_ms);

    let t = Instant::now();
    let report = analyze_impact(&focal, &graph.nodes, &graph.edges, direct_counts(&focal, &graph.edges));
    println!(
        "{:>14} {:>10} {:>10} {:>8.1}ms",
        "impact",
        report.impacted_assets.len(),
        report.dependencies.len(),
        ms(t)
    );

    let t = Instant::now();
    let view = compute_view(&graph, ViewMode::Hierarchical, Some(focal.as_str()), &EngineConfig::default());
    let view_ms = ms(t);
    println!(
        "{:>14} {:>10} {:>10} {:>8.1}ms",
        "compute_view",
        view.nodes.len(),
        view.edges.len(),
        view_ms
    );

    info!(
        generator = name,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        build_ms,
        view_ms,
        "benchmark complete"
    );
    println!();
}

// ---------------------------------------------------------------------------
// Generators: O(n) or O(n + relationships), single-threaded, deterministic
// ---------------------------------------------------------------------------

/// Simple LCG for deterministic, fast pseudo-random numbers.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }
}

const METHODS: [&str; 5] = ["sql_parsing", "dbt", "etl_metadata", "view_definition", "manual"];
const CATALOGS: [&str; 6] = ["crm", "staging", "warehouse", "analytics", "finance", "ops"];
const CONNECTORS: [&str; 4] = ["postgres_main", "snowflake_prod", "etl_pipeline", "azure_blob_raw"];

fn asset(i: u64, rng: &mut FastRng) -> AssetRecord {
    let catalog = CATALOGS[rng.next(CATALOGS.len() as u64) as usize];
    AssetRecord::new(format!("asset_{}", i))
        .with_type("table")
        .with_catalog(catalog, "public")
        .with_connector(CONNECTORS[rng.next(CONNECTORS.len() as u64) as usize])
}

fn rel(from: u64, to: u64, rng: &mut FastRng) -> RelationshipRecord {
    RelationshipRecord::new(
        &format!("asset_{}", from),
        &format!("asset_{}", to),
        METHODS[rng.next(METHODS.len() as u64) as usize],
    )
}

/// Linear pipeline a0 → a1 → … → an. One asset per level.
fn gen_chain(asset_count: u64) -> Snapshot {
    let mut rng = FastRng::new(42);
    let assets = (0..asset_count).map(|i| asset(i, &mut rng)).collect();
    let rels = (1..asset_count).map(|i| rel(i - 1, i, &mut rng)).collect();
    (assets, rels)
}

/// Breadth-first tree: each asset feeds 4 children. Few, very wide levels.
fn gen_fanout(asset_count: u64) -> Snapshot {
    let branching = 4u64;
    let mut rng = FastRng::new(12345);
    let assets = (0..asset_count).map(|i| asset(i, &mut rng)).collect();
    let rels = (1..asset_count)
        .map(|child| rel((child - 1) / branching, child, &mut rng))
        .collect();
    (assets, rels)
}

/// Preferential attachment, edges always point from older to newer assets
/// so the result is acyclic with a few heavily-consumed hubs.
fn gen_mesh(asset_count: u64) -> Snapshot {
    let per_asset = 3u64;
    let mut rng = FastRng::new(67890);
    let assets = (0..asset_count).map(|i| asset(i, &mut rng)).collect();

    let mut endpoints: Vec<u64> = Vec::with_capacity((asset_count * per_asset * 2) as usize);
    let mut rels = Vec::with_capacity((asset_count * per_asset) as usize);
    endpoints.push(0);
    for new in 1..asset_count {
        for _ in 0..per_asset.min(new) {
            // Pick a random endpoint: proportional to degree
            let upstream = endpoints[rng.next(endpoints.len() as u64) as usize];
            rels.push(rel(upstream, new, &mut rng));
            endpoints.push(upstream);
        }
        endpoints.push(new);
    }
    (assets, rels)
}

/// Rings of 100 assets each closed back on themselves, plus sparse
/// cross-links. No asset lacks a parent, so leveling takes the fallback path.
fn gen_cycle(asset_count: u64) -> Snapshot {
    let ring = 100u64;
    let mut rng = FastRng::new(54321);
    let assets = (0..asset_count).map(|i| asset(i, &mut rng)).collect();
    let mut rels = Vec::with_capacity(asset_count as usize + asset_count as usize / 10);
    for i in 0..asset_count {
        let ring_start = i - i % ring;
        let ring_end = (ring_start + ring).min(asset_count);
        let next = if i + 1 == ring_end { ring_start } else { i + 1 };
        if next != i {
            rels.push(rel(i, next, &mut rng));
        }
        if rng.next(10) == 0 {
            rels.push(rel(i, rng.next(asset_count), &mut rng));
        }
    }
    (assets, rels)
}

/// Many catalogs, every asset stored in a container and most in a folder,
/// so the hierarchical view carries a large structural layer.
fn gen_catalogs(asset_count: u64) -> Snapshot {
    let containers = 20u64;
    let folders = 10u64;
    let mut rng = FastRng::new(99999);
    let assets = (0..asset_count)
        .map(|i| {
            let container = format!("bucket{}", rng.next(containers));
            let folder = match rng.next(folders + 1) {
                0 => None,
                f => Some(format!("zone{}/raw", f)),
            };
            asset(i, &mut rng).with_storage(&container, folder.as_deref())
        })
        .collect();
    let rels = (1..asset_count)
        .map(|i| rel(rng.next(i), i, &mut rng))
        .collect();
    (assets, rels)
}
