//! Off-thread chunk encoding.
//!
//! A [`ChunkRequestTask`] snapshots a chunk on the calling thread, then encodes and compresses it
//! on the [`AsyncPool`] for one protocol. The chunk itself never leaves the caller.
use std::sync::Arc;

use bytes::Bytes;
use log::{debug, warn};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::convert::block_mapping::BlockMapping;
use crate::convert::item_dictionary::ItemDictionaries;
use crate::convert::protocol::MappingProtocol;
use crate::net::compression::{CompressionError, Compressor};
use crate::net::packet::batch::PacketBatch;
use crate::net::packet::data_types::CodecError;
use crate::net::packet::level_chunk::LevelChunkPacket;
use crate::net::packet::SerializerContext;
use crate::net::promise::CompressBatchPromise;
use crate::serializer::chunk::{padded_sub_chunk_count, serialize_full_chunk};
use crate::serializer::fast::{deserialize_terrain, serialize_terrain, serialize_tiles};
use crate::serializer::SerializerError;
use crate::world::Chunk;

/// Called without arguments when a task fails.
pub type ErrorHook = Box<dyn FnOnce() + Send>;

#[derive(Error, Debug)]
pub enum ChunkTaskError {
    #[error("Failed to serialize tile entities: {0}")]
    Tiles(#[from] CodecError),

    #[error("Failed to rebuild the chunk: {0}")]
    Snapshot(#[from] SerializerError),

    #[error("Failed to compress the batch: {0}")]
    Compression(#[from] CompressionError),

    #[error("Worker panicked: {0}")]
    Panicked(String),

    #[error("Worker pool is closed")]
    PoolClosed,
}

/// Shared, read-only data every task needs.
#[derive(Clone)]
pub struct EncodingResources {
    pub block_mapping: Arc<BlockMapping>,
    pub item_dictionaries: Arc<ItemDictionaries>,
    pub compressor: Arc<dyn Compressor>,
}

/// Runs blocking work on tokio's blocking threads, at most `size` jobs at a time.
#[derive(Clone)]
pub struct AsyncPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl AsyncPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Queues `work`. Must be called from within a tokio runtime.
    pub fn execute<F, T>(&self, work: F) -> JoinHandle<Result<T, ChunkTaskError>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| ChunkTaskError::PoolClosed)?;

            tokio::task::spawn_blocking(work)
                .await
                .map_err(|e| ChunkTaskError::Panicked(e.to_string()))
        })
    }

    /// Stops accepting work. Queued jobs fail with [`ChunkTaskError::PoolClosed`].
    pub fn close(&self) {
        self.permits.close();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    Failed,
}

/// What to do with the result: resolve the promise, or report the failure.
struct TaskContext {
    promise: CompressBatchPromise,
    on_error: Option<ErrorHook>,
}

/// Everything the worker needs, none of it tied to the live chunk.
struct EncodeJob {
    chunk_x: i32,
    chunk_z: i32,
    terrain: Bytes,
    tiles: Bytes,
    protocol: MappingProtocol,
    resources: EncodingResources,
}

impl EncodeJob {
    fn run(&self) -> Result<Bytes, ChunkTaskError> {
        let chunk = deserialize_terrain(&self.terrain)?;
        let sub_chunk_count =
            padded_sub_chunk_count(chunk.sub_chunk_count(), self.protocol, chunk.dimension());
        let context = SerializerContext::new(
            self.resources
                .item_dictionaries
                .dictionary(self.protocol.dictionary_protocol()),
        );

        let payload = serialize_full_chunk(
            &chunk,
            &self.resources.block_mapping,
            &context,
            self.protocol,
            &self.tiles,
        );
        let packet = LevelChunkPacket::new(
            chunk.x(),
            chunk.z(),
            sub_chunk_count as u32,
            payload,
        );
        let batch = PacketBatch::from_packets(&context, &[packet]);

        Ok(Bytes::from(
            self.resources.compressor.compress(batch.buffer())?,
        ))
    }
}

pub struct ChunkRequestTask {
    job: EncodeJob,
    context: TaskContext,
}

impl ChunkRequestTask {
    /// Snapshots `chunk`. Later changes to it do not affect the task.
    pub fn new(
        chunk: &Chunk,
        protocol: MappingProtocol,
        resources: EncodingResources,
        promise: CompressBatchPromise,
        on_error: Option<ErrorHook>,
    ) -> Result<Self, ChunkTaskError> {
        Ok(Self {
            job: EncodeJob {
                chunk_x: chunk.x(),
                chunk_z: chunk.z(),
                terrain: serialize_terrain(chunk),
                tiles: serialize_tiles(chunk)?,
                protocol,
                resources,
            },
            context: TaskContext { promise, on_error },
        })
    }

    pub fn protocol(&self) -> MappingProtocol {
        self.job.protocol
    }

    /// Encodes on the current thread and settles the promise.
    pub fn run(self) -> TaskOutcome {
        let result = self.job.run();
        Self::complete(&self.job, self.context, result)
    }

    /// Encodes on `pool`. The returned handle reports how the task ended, the promise carries the
    /// data.
    pub fn submit(self, pool: &AsyncPool) -> JoinHandle<TaskOutcome> {
        let ChunkRequestTask { job, context } = self;
        let job = Arc::new(job);

        let worker_job = Arc::clone(&job);
        let handle = pool.execute(move || worker_job.run());

        tokio::spawn(async move {
            let result = match handle.await {
                Ok(result) => result.and_then(|encoded| encoded),
                Err(e) => Err(ChunkTaskError::Panicked(e.to_string())),
            };
            Self::complete(&job, context, result)
        })
    }

    fn complete(
        job: &EncodeJob,
        context: TaskContext,
        result: Result<Bytes, ChunkTaskError>,
    ) -> TaskOutcome {
        match result {
            Ok(encoded) => {
                debug!(
                    "Encoded chunk {} {} for {} ({} bytes)",
                    job.chunk_x,
                    job.chunk_z,
                    job.protocol,
                    encoded.len()
                );
                if let Err(e) = context.promise.resolve(encoded) {
                    warn!(
                        "Could not hand over chunk {} {}: {e}",
                        job.chunk_x, job.chunk_z
                    );
                }
                TaskOutcome::Completed
            }
            Err(e) => {
                warn!(
                    "Failed to encode chunk {} {} for {}: {e}",
                    job.chunk_x, job.chunk_z, job.protocol
                );
                context.promise.fail();
                if let Some(on_error) = context.on_error {
                    on_error();
                }
                TaskOutcome::Failed
            }
        }
    }
}
