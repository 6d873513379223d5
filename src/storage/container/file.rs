//! Single-file array container.
//!
//! # File Structure
//!
//! ```text
//! Offset   Size    Type        Description
//! ─────────────────────────────────────────────
//! 0x00     8       [u8; 8]     Magic: "VECDB001"
//! 0x08     4       u32 LE      D: Dimensions
//! 0x0C     4       u32 LE      C: Number of collections
//! 0x10     ...     Block × C   Collection blocks, in creation order
//!
//! Block:
//! 0x00     2       u16 LE      L: Name length
//! 0x02     L       utf-8       Name
//! 0x02+L   8       u64 LE      N: Number of rows
//! 0x0A+L   N*D*4   [f32 LE]    Row data
//! ```
//!
//! Appending to the last block extends the file. Appending to an earlier block
//! moves every later block towards the end of the file.
//!
//! Each operation opens the file for its own duration only: read-only for
//! reads, read-write for mutations. Nothing is cached between calls.

use crate::models::Matrix;
use crate::storage::traits::ArrayBackend;
use crate::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Magic bytes identifying a container file.
pub const MAGIC: [u8; 8] = *b"VECDB001";

/// Header size in bytes: 8 (magic) + 4 (dims) + 4 (collection count).
pub const HEADER_SIZE: u64 = 16;

const COLLECTION_COUNT_OFFSET: u64 = 12;
const F32_SIZE: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    ReadWrite,
}

/// Location of one collection block.
#[derive(Debug)]
struct Block {
    name: String,
    count_offset: u64,
    data_offset: u64,
    rows: u64,
}

/// Parsed header and block table.
#[derive(Debug)]
struct Catalog {
    dimensions: usize,
    blocks: Vec<Block>,
    file_len: u64,
}

impl Catalog {
    fn find(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.name == name)
    }

    fn require(&self, name: &str) -> Result<&Block> {
        self.find(name)
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }

    const fn row_bytes(&self) -> u64 {
        self.dimensions as u64 * F32_SIZE
    }
}

/// Array container persisted as one binary file.
#[derive(Debug, Clone)]
pub struct FileContainer {
    path: PathBuf,
    dimensions: usize,
}

impl FileContainer {
    /// Attaches to the container at `path`, creating an empty one if missing.
    ///
    /// The width stored in an existing file is not checked here; a mismatch
    /// surfaces as [`Error::DimensionMismatch`] on first access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `dimensions` is zero or does not fit
    /// the header, and [`Error::StorageIo`] if a new file cannot be created.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::InvalidInput(
                "embedding dimension must be positive".to_string(),
            ));
        }
        let stored_dims = u32::try_from(dimensions).map_err(|_| {
            Error::InvalidInput(format!("embedding dimension {dimensions} is too large"))
        })?;

        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            Self::create_empty(&path, stored_dims)?;
            tracing::info!(path = %path.display(), dimensions, "Created empty container");
        }

        Ok(Self { path, dimensions })
    }

    /// Returns the container path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create_empty(path: &Path, dimensions: u32) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::storage("create_container_dir", e))?;
            }
        }

        let mut header = [0u8; HEADER_SIZE as usize];
        header[0..8].copy_from_slice(&MAGIC);
        header[8..12].copy_from_slice(&dimensions.to_le_bytes());
        header[12..16].copy_from_slice(&0u32.to_le_bytes());

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| Error::storage("create_container", format!("{}: {e}", path.display())))?;
        file.write_all(&header)
            .map_err(|e| Error::storage("write_header", e))?;
        file.sync_all()
            .map_err(|e| Error::storage("sync_container", e))
    }

    /// Opens the file for the duration of one operation.
    fn acquire(&self, access: Access) -> Result<File> {
        OpenOptions::new()
            .read(true)
            .write(access == Access::ReadWrite)
            .open(&self.path)
            .map_err(|e| {
                Error::storage(
                    "open_container",
                    format!("{}: {e}", self.path.display()),
                )
            })
    }

    /// Reads the header and walks the block table.
    fn catalog(&self, file: &mut File) -> Result<Catalog> {
        let file_len = file
            .metadata()
            .map_err(|e| Error::storage("stat_container", e))?
            .len();
        self.read_catalog(file, file_len)
    }

    fn read_catalog<F: Read + Seek>(&self, file: &mut F, file_len: u64) -> Result<Catalog> {
        if file_len < HEADER_SIZE {
            return Err(Error::storage("read_header", "file too small for header"));
        }

        let mut header = [0u8; HEADER_SIZE as usize];
        file.seek(SeekFrom::Start(0))
            .map_err(|e| Error::storage("read_header", e))?;
        file.read_exact(&mut header)
            .map_err(|e| Error::storage("read_header", e))?;
        if header[0..8] != MAGIC {
            return Err(Error::storage(
                "read_header",
                "invalid magic bytes: expected VECDB001",
            ));
        }
        let dimensions = u32::from_le_bytes([header[8], header[9], header[10], header[11]]) as usize;
        let count = u32::from_le_bytes([header[12], header[13], header[14], header[15]]);

        if dimensions != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: dimensions,
            });
        }

        let row_bytes = dimensions as u64 * F32_SIZE;
        let mut blocks = Vec::new();
        let mut offset = HEADER_SIZE;
        for _ in 0..count {
            let mut len_buf = [0u8; 2];
            file.read_exact(&mut len_buf)
                .map_err(|e| Error::storage("read_block", e))?;
            let name_len = u16::from_le_bytes(len_buf);

            let mut name_buf = vec![0u8; usize::from(name_len)];
            file.read_exact(&mut name_buf)
                .map_err(|e| Error::storage("read_block", e))?;
            let name = String::from_utf8(name_buf)
                .map_err(|e| Error::storage("read_block", format!("collection name: {e}")))?;

            let mut rows_buf = [0u8; 8];
            file.read_exact(&mut rows_buf)
                .map_err(|e| Error::storage("read_block", e))?;
            let rows = u64::from_le_bytes(rows_buf);

            let count_offset = offset + 2 + u64::from(name_len);
            let data_offset = count_offset + 8;
            let end = rows
                .checked_mul(row_bytes)
                .and_then(|len| len.checked_add(data_offset))
                .filter(|end| *end <= file_len)
                .ok_or_else(|| {
                    Error::storage(
                        "read_block",
                        format!("collection '{name}' extends past end of file"),
                    )
                })?;

            file.seek(SeekFrom::Start(end))
                .map_err(|e| Error::storage("read_block", e))?;
            blocks.push(Block {
                name,
                count_offset,
                data_offset,
                rows,
            });
            offset = end;
        }

        Ok(Catalog {
            dimensions,
            blocks,
            file_len,
        })
    }

    fn check_index(block: &Block, index: usize) -> Result<()> {
        if index as u64 >= block.rows {
            return Err(Error::IndexOutOfRange {
                index,
                row_count: to_usize(block.rows)?,
            });
        }
        Ok(())
    }

    fn append_block(file: &mut File, name: &str, rows: &Matrix, collections: usize) -> Result<()> {
        let name_len = u16::try_from(name.len()).map_err(|_| {
            Error::InvalidInput(format!(
                "collection name is {} bytes, at most {} allowed",
                name.len(),
                u16::MAX
            ))
        })?;
        let new_count = u32::try_from(collections + 1)
            .map_err(|_| Error::storage("create_collection", "too many collections"))?;

        let mut block = Vec::with_capacity(2 + name.len() + 8 + rows.as_slice().len() * 4);
        block.extend_from_slice(&name_len.to_le_bytes());
        block.extend_from_slice(name.as_bytes());
        block.extend_from_slice(&(rows.rows() as u64).to_le_bytes());
        block.extend_from_slice(&encode(rows.as_slice()));

        file.seek(SeekFrom::End(0))
            .map_err(|e| Error::storage("create_collection", e))?;
        file.write_all(&block)
            .map_err(|e| Error::storage("create_collection", e))?;
        file.seek(SeekFrom::Start(COLLECTION_COUNT_OFFSET))
            .map_err(|e| Error::storage("create_collection", e))?;
        file.write_all(&new_count.to_le_bytes())
            .map_err(|e| Error::storage("create_collection", e))
    }

    /// Appends rows to an existing block, moving every later block down.
    ///
    /// Later blocks are moved and the row count committed before the new rows
    /// are written, so a failed row write leaves other collections readable.
    fn grow_block<F: Read + Write + Seek>(
        file: &mut F,
        catalog: &Catalog,
        block: &Block,
        rows: &Matrix,
    ) -> Result<u64> {
        let end = block.data_offset + block.rows * catalog.row_bytes();
        let added = encode(rows.as_slice());

        let mut tail = Vec::new();
        if end < catalog.file_len {
            file.seek(SeekFrom::Start(end))
                .map_err(|e| Error::storage("append_rows", e))?;
            file.read_to_end(&mut tail)
                .map_err(|e| Error::storage("append_rows", e))?;
            file.seek(SeekFrom::Start(end + added.len() as u64))
                .map_err(|e| Error::storage("append_rows", e))?;
            file.write_all(&tail)
                .map_err(|e| Error::storage("append_rows", e))?;
        }

        let new_rows = block.rows + rows.rows() as u64;
        file.seek(SeekFrom::Start(block.count_offset))
            .map_err(|e| Error::storage("append_rows", e))?;
        file.write_all(&new_rows.to_le_bytes())
            .map_err(|e| Error::storage("append_rows", e))?;

        file.seek(SeekFrom::Start(end))
            .map_err(|e| Error::storage("append_rows", e))?;
        file.write_all(&added)
            .map_err(|e| Error::storage("append_rows", e))?;
        Ok(new_rows)
    }
}

impl ArrayBackend for FileContainer {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn collections(&self) -> Result<Vec<String>> {
        let mut file = self.acquire(Access::Read)?;
        let catalog = self.catalog(&mut file)?;
        Ok(catalog.blocks.into_iter().map(|b| b.name).collect())
    }

    fn row_count(&self, name: &str) -> Result<Option<usize>> {
        let mut file = self.acquire(Access::Read)?;
        let catalog = self.catalog(&mut file)?;
        catalog.find(name).map(|b| to_usize(b.rows)).transpose()
    }

    fn append(&self, name: &str, rows: &Matrix) -> Result<usize> {
        if rows.dimensions() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: rows.dimensions(),
            });
        }

        let mut file = self.acquire(Access::ReadWrite)?;
        let catalog = self.catalog(&mut file)?;
        let new_rows = match catalog.find(name) {
            Some(block) => Self::grow_block(&mut file, &catalog, block, rows)?,
            None => {
                Self::append_block(&mut file, name, rows, catalog.blocks.len())?;
                tracing::debug!(collection = name, "Created collection");
                rows.rows() as u64
            },
        };
        file.sync_data()
            .map_err(|e| Error::storage("sync_container", e))?;
        to_usize(new_rows)
    }

    fn read_row(&self, name: &str, index: usize) -> Result<Vec<f32>> {
        let mut file = self.acquire(Access::Read)?;
        let catalog = self.catalog(&mut file)?;
        let block = catalog.require(name)?;
        Self::check_index(block, index)?;

        let row_bytes = catalog.row_bytes();
        let mut buf = vec![0u8; to_usize(row_bytes)?];
        file.seek(SeekFrom::Start(block.data_offset + index as u64 * row_bytes))
            .map_err(|e| Error::storage("read_row", e))?;
        file.read_exact(&mut buf)
            .map_err(|e| Error::storage("read_row", e))?;
        Ok(decode(&buf))
    }

    fn write_row(&self, name: &str, index: usize, row: &[f32]) -> Result<()> {
        if row.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: row.len(),
            });
        }

        let mut file = self.acquire(Access::ReadWrite)?;
        let catalog = self.catalog(&mut file)?;
        let block = catalog.require(name)?;
        Self::check_index(block, index)?;

        file.seek(SeekFrom::Start(
            block.data_offset + index as u64 * catalog.row_bytes(),
        ))
        .map_err(|e| Error::storage("write_row", e))?;
        file.write_all(&encode(row))
            .map_err(|e| Error::storage("write_row", e))?;
        file.sync_data()
            .map_err(|e| Error::storage("sync_container", e))
    }

    fn read_all(&self, name: &str) -> Result<Matrix> {
        let mut file = self.acquire(Access::Read)?;
        let catalog = self.catalog(&mut file)?;
        let block = catalog.require(name)?;

        let mut buf = vec![0u8; to_usize(block.rows * catalog.row_bytes())?];
        file.seek(SeekFrom::Start(block.data_offset))
            .map_err(|e| Error::storage("read_all", e))?;
        file.read_exact(&mut buf)
            .map_err(|e| Error::storage("read_all", e))?;
        Matrix::from_flat(decode(&buf), catalog.dimensions)
    }
}

fn to_usize(value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|e| Error::storage("convert_offset", e))
}

fn encode(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
