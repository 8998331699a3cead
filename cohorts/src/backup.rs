/// The backup provider lets cohort assignments load from a previously
/// stored copy when the control plane is unavailable at startup.
use crate::types::CohortSnapshot;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum BackupError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

pub trait BackupProvider: Send + Sync {
    fn load(&self) -> Result<CohortSnapshot, BackupError>;
    fn store(&self, snapshot: &CohortSnapshot) -> Result<(), BackupError>;
}

#[derive(Clone)]
enum Compression {
    #[allow(dead_code)]
    None,
    // zstd with compression level
    Zstd(i32),
}

struct Codec {
    compression: Compression,
    config: bincode::config::Configuration,
}

impl Codec {
    fn new(compression: Compression) -> Self {
        Codec {
            compression,
            // standard defaults to little-endian + varint
            config: bincode::config::standard(),
        }
    }

    fn write<W: Write>(&self, writer: &mut W, data: &CohortSnapshot) -> Result<usize, BackupError> {
        match self.compression {
            Compression::None => {
                let size = bincode::encode_into_std_write(data, writer, self.config)?;
                writer.flush()?;
                Ok(size)
            }
            Compression::Zstd(level) => {
                let mut encoder = zstd::stream::write::Encoder::new(writer, level)?;
                let size = bincode::encode_into_std_write(data, &mut encoder, self.config)?;
                encoder.finish()?;
                Ok(size)
            }
        }
    }

    fn read<R: Read>(&self, mut reader: R) -> Result<CohortSnapshot, BackupError> {
        match self.compression {
            Compression::None => {
                let value: CohortSnapshot = bincode::decode_from_std_read(&mut reader, self.config)?;
                Ok(value)
            }
            Compression::Zstd(_) => {
                let mut decoder = zstd::stream::read::Decoder::new(reader)?;
                let decoded: CohortSnapshot =
                    bincode::decode_from_std_read(&mut decoder, self.config)?;
                Ok(decoded)
            }
        }
    }
}

pub struct FilesystemProvider {
    path: PathBuf,
    codec: Codec,
}

impl FilesystemProvider {
    pub fn new(base_dir: &str, filename: &str) -> Self {
        FilesystemProvider {
            path: Path::new(base_dir).join(filename),
            codec: Codec::new(Compression::Zstd(1)),
        }
    }
}

impl BackupProvider for FilesystemProvider {
    fn load(&self) -> Result<CohortSnapshot, BackupError> {
        let file = File::open(&self.path)?;
        let reader = io::BufReader::new(file);
        self.codec.read(reader)
    }

    fn store(&self, snapshot: &CohortSnapshot) -> Result<(), BackupError> {
        // Create or overwrite file
        let file = File::create(&self.path)?;
        let mut writer = io::BufWriter::new(file);

        let size = self.codec.write(&mut writer, snapshot)?;
        tracing::debug!(path = %self.path.display(), bytes = size, "stored cohort backup");

        Ok(())
    }
}

/// Backup provider that never has anything stored. Lookup services running
/// with this provider cannot start while the control plane is down.
pub struct NoopProvider;

impl BackupProvider for NoopProvider {
    fn load(&self) -> Result<CohortSnapshot, BackupError> {
        tracing::warn!("loading cohort backup from the no-op provider; starting with empty tables");
        Ok(CohortSnapshot::default())
    }

    fn store(&self, _snapshot: &CohortSnapshot) -> Result<(), BackupError> {
        Ok(())
    }
}

/// In-memory provider for tests: serves a fixed snapshot and records the
/// last stored one.
#[derive(Default)]
pub struct MemoryProvider {
    snapshot: Mutex<CohortSnapshot>,
}

impl MemoryProvider {
    pub fn new(snapshot: CohortSnapshot) -> Self {
        MemoryProvider {
            snapshot: Mutex::new(snapshot),
        }
    }

    pub fn stored(&self) -> CohortSnapshot {
        self.snapshot.lock().clone()
    }
}

impl BackupProvider for MemoryProvider {
    fn load(&self) -> Result<CohortSnapshot, BackupError> {
        Ok(self.snapshot.lock().clone())
    }

    fn store(&self, snapshot: &CohortSnapshot) -> Result<(), BackupError> {
        *self.snapshot.lock() = snapshot.clone();
        Ok(())
    }
}
