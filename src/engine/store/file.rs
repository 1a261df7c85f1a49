use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::engine::errors::StoreError;
use crate::engine::store::codec::Codec;
use crate::engine::store::format::FileHeader;
use crate::engine::store::object::{StoredObject, StoredTable};

/// A fully loaded dataset file.
///
/// Layout on disk: fixed header, bincode-encoded object list, CRC-32 of the
/// object bytes as a little-endian footer.
#[derive(Debug)]
pub struct DatasetFile {
    pub path: PathBuf,
    pub settings: u32,
    pub byte_size: u64,
    objects: Vec<StoredObject>,
}

impl DatasetFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let mut bytes = Vec::new();
        File::open(path)?.read_to_end(&mut bytes)?;
        if bytes.len() < FileHeader::LEN + 4 {
            return Err(StoreError::BadMagic);
        }
        let header = FileHeader::read_from(&bytes)?;
        let body = &bytes[FileHeader::LEN..bytes.len() - 4];
        let mut crc = [0u8; 4];
        crc.copy_from_slice(&bytes[bytes.len() - 4..]);
        if crc32fast::hash(body) != u32::from_le_bytes(crc) {
            return Err(StoreError::Checksum);
        }
        let objects: Vec<StoredObject> = bincode::deserialize(body)?;
        debug!(
            target: "store::file",
            path = %path.display(),
            settings = header.settings,
            objects = objects.len(),
            "Opened dataset file"
        );
        Ok(Self {
            path: path.to_path_buf(),
            settings: header.settings,
            byte_size: bytes.len() as u64,
            objects,
        })
    }

    pub fn objects(&self) -> &[StoredObject] {
        &self.objects
    }

    pub fn object(&self, name: &str) -> Option<&StoredObject> {
        self.objects.iter().find(|o| o.name() == name)
    }

    pub fn table(&self, name: &str) -> Option<&StoredTable> {
        self.objects.iter().find_map(|o| match o {
            StoredObject::Table(t) if t.name == name => Some(t),
            _ => None,
        })
    }

    pub fn codec(&self) -> Result<Codec, StoreError> {
        Codec::from_settings(self.settings)
    }
}

/// Writes a dataset file. The target is opened with create-new semantics up
/// front, so clobbering an existing output fails before any work is done.
#[derive(Debug)]
pub struct DatasetWriter {
    path: PathBuf,
    file: File,
    settings: u32,
    objects: Vec<StoredObject>,
}

impl DatasetWriter {
    pub fn create(path: impl AsRef<Path>, settings: u32) -> Result<Self, StoreError> {
        let path = path.as_ref();
        // Validate the settings id before writing anything.
        Codec::from_settings(settings)?;
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            settings,
            objects: Vec::new(),
        })
    }

    pub fn codec(&self) -> Codec {
        // Settings were validated in `create`.
        Codec::from_settings(self.settings).unwrap_or(Codec::Lz4)
    }

    pub fn append(&mut self, object: StoredObject) {
        self.objects.push(object);
    }

    /// Writes header, objects and checksum; returns the output byte size.
    pub fn finish(mut self) -> Result<u64, StoreError> {
        let body = bincode::serialize(&self.objects)?;
        let mut out = Vec::with_capacity(FileHeader::LEN + body.len() + 4);
        FileHeader::new(self.settings).write_to(&mut out);
        out.extend_from_slice(&body);
        out.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
        self.file.write_all(&out)?;
        self.file.sync_all()?;
        debug!(
            target: "store::file",
            path = %self.path.display(),
            bytes = out.len(),
            "Wrote dataset file"
        );
        Ok(out.len() as u64)
    }
}
