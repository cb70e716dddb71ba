//! File-backed image store.
//!
//! A disc image on disk is nothing but the flat concatenation of all its
//! sectors, so the store seeks to `cluster × 36 × 2352 + sector × 2352`
//! and reads or writes whole sectors in place.
//!
//! The first sector of the image (cluster 0, sector 0) is TOC-framed and
//! self-describes the disc: the big-endian 16-bit value at offset 18 of
//! its payload holds the first lead-out cluster, from which the capacity
//! class is recovered when reopening the file. No other marker or
//! checksum exists, so [`FileImage::open`] cross-checks the file size
//! against the recovered class and rejects any mismatch.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::format::{
    image_bytes, HEADER_BYTES, SECTOR_BYTES, TOC_PAYLOAD_BYTES, TYPE_MARKER_PAYLOAD_OFFSET,
};
use crate::{Address, DiscType, Image, MdError, MdResult, Sector};

/// Absolute byte offset of the type marker: payload offset 18 of the
/// TOC-framed sector at cluster 0, sector 0
const TYPE_MARKER_OFFSET: u64 = (HEADER_BYTES + TYPE_MARKER_PAYLOAD_OFFSET) as u64;

/// Image store backed by a file of exactly `clusters × 36 × 2352` bytes
pub struct FileImage {
    file: File,
    clusters: u16,
}

impl FileImage {
    /// Wrap an already-open file as a store holding `clusters` clusters.
    /// Fails unless the file is exactly `clusters × 36 × 2352` bytes long.
    pub fn new(file: File, clusters: u16) -> MdResult<FileImage> {
        let expected = image_bytes(clusters);
        let got = file.metadata()?.len();

        if got != expected {
            return Err(MdError::ImageSizeMismatch { expected, got });
        }

        Ok(FileImage { file, clusters })
    }

    /// Create a fresh image file for a disc of the given capacity class.
    ///
    /// The file is created at its exact final size (it must not already
    /// exist) and the self-describing type marker is written as a
    /// fully-formed TOC sector at cluster 0, sector 0. Everything else is
    /// left zeroed.
    pub fn create<P: AsRef<Path>>(path: P, disc_type: DiscType) -> MdResult<FileImage> {
        let path = path.as_ref();
        let clusters = disc_type.total_clusters();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        file.set_len(image_bytes(clusters))?;

        let mut image = FileImage { file, clusters };

        let mut payload = [0u8; TOC_PAYLOAD_BYTES];
        let program_end = disc_type.program_end();
        payload[TYPE_MARKER_PAYLOAD_OFFSET] = (program_end >> 8) as u8;
        payload[TYPE_MARKER_PAYLOAD_OFFSET + 1] = program_end as u8;

        let marker = Sector::from_toc_data(Address::ZERO, &payload)?;
        image.write_sector(Address::ZERO, &marker)?;

        image.file.sync_all()?;

        log::debug!(
            "created {} image at {} ({} clusters, {} bytes)",
            disc_type,
            path.display(),
            clusters,
            image_bytes(clusters)
        );

        Ok(image)
    }

    /// Open an existing image file in read-write mode, recovering its
    /// capacity class from the type marker.
    ///
    /// Fails if the marker matches no supported class, or if the file size
    /// disagrees with the recovered class.
    pub fn open<P: AsRef<Path>>(path: P) -> MdResult<(FileImage, DiscType)> {
        let path = path.as_ref();

        let mut file = OpenOptions::new().read(true).write(true).open(path)?;

        let mut marker = [0u8; 2];
        file.seek(SeekFrom::Start(TYPE_MARKER_OFFSET))?;
        file.read_exact(&mut marker)?;

        let program_end = u16::from_be_bytes(marker);

        let disc_type = DiscType::from_program_end(program_end)
            .ok_or(MdError::UnknownDiscType { program_end })?;

        let image = FileImage::new(file, disc_type.total_clusters())?;

        log::debug!(
            "opened {} image at {} ({} clusters)",
            disc_type,
            path.display(),
            image.clusters
        );

        Ok((image, disc_type))
    }
}

impl Image for FileImage {
    fn image_format(&self) -> String {
        "raw file".to_string()
    }

    fn cluster_count(&self) -> u16 {
        self.clusters
    }

    fn read_sector(&mut self, addr: Address) -> MdResult<Sector> {
        if addr.cluster() >= self.clusters {
            return Err(MdError::ClusterOutOfRange {
                cluster: addr.cluster(),
                clusters: self.clusters,
            });
        }

        let mut raw = [0u8; SECTOR_BYTES];

        self.file.seek(SeekFrom::Start(addr.byte_offset()))?;
        self.file.read_exact(&mut raw)?;

        Sector::from_raw(&raw)
    }

    fn write_sector(&mut self, addr: Address, sector: &Sector) -> MdResult<()> {
        if addr.cluster() >= self.clusters {
            return Err(MdError::ClusterOutOfRange {
                cluster: addr.cluster(),
                clusters: self.clusters,
            });
        }

        self.file.seek(SeekFrom::Start(addr.byte_offset()))?;
        self.file.write_all(sector.data_2352())?;

        Ok(())
    }
}
