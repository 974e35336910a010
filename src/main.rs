//! The binary's entrypoint file.
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};

use nopal::args::{self, Args, Command, DimensionArg};
use nopal::config::Settings;
use nopal::consts::messages;
use nopal::convert::block_mapping::BlockMapping;
use nopal::convert::item_dictionary::ItemDictionaries;
use nopal::convert::protocol::{sort_by_protocol, MappingProtocol};
use nopal::generate_overworld::superflat;
use nopal::net::compression::ZlibCompressor;
use nopal::net::promise::CompressBatchPromise;
use nopal::task::{AsyncPool, ChunkRequestTask, EncodingResources, ErrorHook};
use nopal::{fs_manager, logging};

#[tokio::main]
async fn main() {
    let args = args::init();

    // This must executes as early as possible
    logging::init(args.log_level.into());
    info!("{}", *messages::SERVER_STARTING);
    greet();

    let settings = match init(&args) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to start, error in initialization: {e}. \nExiting...");
            gracefully_exit(ExitCode::Failure);
        }
    };

    let resources = match load_resources(&settings) {
        Ok(resources) => resources,
        Err(e) => {
            error!("Failed to load the block and item tables: {e}. \nExiting...");
            gracefully_exit(ExitCode::Failure);
        }
    };
    info!("{}", *messages::MAPPINGS_LOADED);

    let result = match args.command {
        Command::Check => check(&resources),
        Command::Encode {
            x,
            z,
            dimension,
            protocols,
            out,
            timeout,
        } => {
            let request = EncodeRequest {
                x,
                z,
                dimension,
                protocols,
                out,
                timeout: Duration::from_secs(timeout),
            };
            encode(&resources, &settings, request).await
        }
    };

    if let Err(e) = result {
        error!("{e}");
        gracefully_exit(ExitCode::Failure);
    }
    gracefully_exit(ExitCode::Success);
}

/// Makes sure the config file exists and applies the command line overrides.
fn init(args: &Args) -> Result<Settings, Box<dyn Error>> {
    fs_manager::init(&args.config)?;

    let mut settings = Settings::load(&args.config)?;
    if let Some(data_path) = &args.data_path {
        settings.data_path = data_path.clone();
    }
    if let Some(workers) = args.workers {
        settings.worker_threads = workers;
    }
    settings.validate()?;

    fs_manager::create_dirs(&settings.data_path);
    Ok(settings)
}

fn load_resources(settings: &Settings) -> Result<EncodingResources, Box<dyn Error>> {
    info!(
        "Loading block and item tables from {}",
        settings.data_path.display()
    );
    let block_mapping = Arc::new(BlockMapping::load(&settings.data_path)?);
    let item_dictionaries = Arc::new(ItemDictionaries::load(&settings.data_path)?);
    let compressor = ZlibCompressor::new(
        settings.compression_level,
        settings.max_decompression_size,
    )?;
    debug!(
        "Compressing batches at level {}, inflating at most {} bytes",
        compressor.level(),
        compressor.max_decompression_size()
    );
    let compressor = Arc::new(compressor);

    Ok(EncodingResources {
        block_mapping,
        item_dictionaries,
        compressor,
    })
}

/// Reports the size of every protocol's tables.
fn check(resources: &EncodingResources) -> Result<(), Box<dyn Error>> {
    for protocol in MappingProtocol::ALL {
        let states = resources.block_mapping.known_states(protocol).len();
        let mapped = (0..states as u32)
            .filter(|runtime_id| {
                resources
                    .block_mapping
                    .from_runtime_id(*runtime_id, protocol)
                    .is_some()
            })
            .count();
        let items = resources.item_dictionaries.dictionary(protocol).len();

        info!("{protocol}: {states} block states, {mapped} mapped, {items} item types");
    }
    Ok(())
}

struct EncodeRequest {
    x: i32,
    z: i32,
    dimension: DimensionArg,
    protocols: Vec<u32>,
    out: Option<PathBuf>,
    timeout: Duration,
}

/// Encodes one superflat chunk for every requested protocol, once per protocol.
async fn encode(
    resources: &EncodingResources,
    settings: &Settings,
    request: EncodeRequest,
) -> Result<(), Box<dyn Error>> {
    let EncodeRequest {
        x,
        z,
        dimension,
        protocols,
        out,
        timeout,
    } = request;

    let mut chunk = superflat::generate_chunk(x, z, dimension.into());
    chunk.collect_garbage();

    let viewers = sort_by_protocol(protocols, |protocol_id| *protocol_id)?;
    let pool = AsyncPool::new(settings.worker_threads);
    debug!("Encoding on {} worker(s)", pool.size());

    let mut pending = Vec::with_capacity(viewers.len());
    for (protocol, viewers) in viewers {
        let promise = CompressBatchPromise::new();
        let on_error: ErrorHook =
            Box::new(move || warn!("Chunk {x} {z} could not be encoded for {protocol}"));
        let task = ChunkRequestTask::new(
            &chunk,
            protocol,
            resources.clone(),
            promise.clone(),
            Some(on_error),
        )?;

        info!(
            "Encoding chunk {x} {z} for {} viewer(s) on {}",
            viewers.len(),
            task.protocol()
        );
        pending.push((task.protocol(), promise));
        task.submit(&pool);
    }

    let mut failed = 0;
    for (protocol, promise) in pending {
        match promise.wait_timeout(timeout).await {
            Ok(batch) => {
                info!("{protocol}: {} compressed bytes", batch.len());
                if let Some(dir) = &out {
                    let file_name = format!("chunk_{x}_{z}_{}.bin", protocol.protocol_id());
                    let path = fs_manager::write_output(dir, &file_name, &batch)?;
                    info!("Wrote {}", path.display());
                }
            }
            Err(e) => {
                error!("No batch for {protocol}: {e}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("{failed} protocol(s) could not be encoded").into());
    }
    Ok(())
}

/// Prints the starting greetings
fn greet() {
    info!("{}", *messages::GREET);
}

/// Enum representing standardized exit codes.
pub enum ExitCode {
    Success,
    Failure,
}

/// Gracefully exits with an exit code.
pub fn gracefully_exit(exit_code: ExitCode) -> ! {
    let numerical_exit_code: i32 = match exit_code {
        ExitCode::Success => {
            info!("{}", *messages::SERVER_SHUTDOWN_SUCCESS);
            // 0 means success
            0
        }
        ExitCode::Failure => {
            warn!("{}", *messages::SERVER_SHUTDOWN_ERROR);
            // 1 mean general error
            1
        }
    };
    if numerical_exit_code != 0 {
        info!("{}", messages::server_shutdown_code(numerical_exit_code));
    }

    std::process::exit(numerical_exit_code);
}
