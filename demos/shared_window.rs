//! One simulated window sharing a roster with other processes
//!
//! Run with: cargo run --example shared_window [OPTIONS]
//!
//! Start several in separate terminals against the same directory and watch each
//! one pick up the others. Kill one with Ctrl+C to see it leave cleanly, or with
//! `kill -9` to see the survivors prune it once it goes stale.
//!
//! Examples:
//!   cargo run --example shared_window                          # window at 0,0
//!   cargo run --example shared_window -- --x 900 --drift 5      # moving window
//!   cargo run --example shared_window -- --clear                # wipe the roster and exit

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use window_mesh::shared::{FileBackend, RegistryStore};
use window_mesh::{RegistryConfig, SharedShape, WindowRegistry, WindowShape};

struct Options {
    dir: PathBuf,
    shape: WindowShape,
    drift: f64,
    clear: bool,
}

fn print_usage() {
    println!("Usage: shared_window [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --dir <PATH>    Shared store directory (default: $TMPDIR/window-mesh)");
    println!("  --x <N>         Window left edge (default: 0)");
    println!("  --y <N>         Window top edge (default: 0)");
    println!("  --w <N>         Window width (default: 800)");
    println!("  --h <N>         Window height (default: 600)");
    println!("  --drift <N>     Move right by N pixels every second (default: 0)");
    println!("  --clear         Remove the shared roster and exit");
    println!("  -h, --help      Show this help");
}

fn parse_args(args: &[String]) -> Result<Options, Box<dyn std::error::Error>> {
    let mut options = Options {
        dir: std::env::temp_dir().join("window-mesh"),
        shape: WindowShape::new(0.0, 0.0, 800.0, 600.0),
        drift: 0.0,
        clear: false,
    };

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = || {
            iter.next()
                .ok_or_else(|| format!("missing value for {}", arg))
        };
        match arg.as_str() {
            "--dir" => options.dir = PathBuf::from(value()?),
            "--x" => options.shape.x = value()?.parse()?,
            "--y" => options.shape.y = value()?.parse()?,
            "--w" => options.shape.w = value()?.parse()?,
            "--h" => options.shape.h = value()?.parse()?,
            "--drift" => options.drift = value()?.parse()?,
            "--clear" => options.clear = true,
            other => return Err(format!("unknown argument: {}", other).into()),
        }
    }

    Ok(options)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }
    let options = parse_args(&args)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("window_mesh=info".parse()?)
                .add_directive("shared_window=info".parse()?),
        )
        .init();

    let config = RegistryConfig::default();
    let backend = Arc::new(FileBackend::open(&options.dir)?);

    if options.clear {
        RegistryStore::new(backend, config.storage_key.clone()).clear()?;
        tracing::info!(dir = %options.dir.display(), "Shared roster cleared");
        return Ok(());
    }

    let shape = SharedShape::new(options.shape);
    let registry = Arc::new(WindowRegistry::with_config(
        backend,
        shape.clone(),
        config,
    ));

    let observer = Arc::downgrade(&registry);
    registry.set_win_change_callback(move || {
        let Some(registry) = observer.upgrade() else {
            return;
        };
        let windows = registry.get_windows();
        tracing::info!(count = windows.len(), "Roster changed");
        for (i, window) in windows.iter().enumerate() {
            let (cx, cy) = window.shape.center();
            tracing::info!(
                slot = i,
                id = %window.id,
                center_x = cx,
                center_y = cy,
                metadata = %window.metadata,
                "  window"
            );
        }
    });

    let observer = Arc::downgrade(&registry);
    registry.set_win_shape_change_callback(move || {
        if let Some(registry) = observer.upgrade() {
            if let Some(me) = registry
                .local_id()
                .and_then(|id| registry.get_windows().into_iter().find(|w| w.id == id))
            {
                let (ox, oy) = me.shape.scene_offset();
                tracing::info!(offset_x = ox, offset_y = oy, "Scene offset target moved");
            }
        }
    });

    let id = registry.init(serde_json::json!({ "pid": std::process::id() }))?;
    tracing::info!(window_id = %id, dir = %options.dir.display(), "Window open");

    let ticker = registry.spawn_tick_task();

    let mut drift = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = drift.tick() => {
                if options.drift != 0.0 {
                    let current = shape.get();
                    shape.move_to(current.x + options.drift, current.y);
                }
            }
        }
    }

    registry.close();
    ticker.await?;

    Ok(())
}
