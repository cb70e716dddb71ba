//! Generic interface to build and manipulate raw MiniDisc image files.
//!
//! An image is a flat array of fixed-size clusters, each made of 36
//! fixed-size 2352-byte sectors. The crate covers the binary sector codec,
//! the cluster-zone layout of a disc (lead-in, UTOC, program area,
//! lead-out) and a streaming recorder that turns interleaved PCM frames
//! into fully framed clusters written at the right offsets. The audio
//! codec itself and the production of PCM frames are consumed through
//! narrow traits and are not implemented here.

#![warn(missing_docs)]

pub use address::{Address, SectorRole};
pub use file::FileImage;
pub use layout::{Layout, LayoutCheckedImage};
pub use memory::MemoryImage;
pub use pcm::PcmFrameSource;
pub use recorder::{AudioBlock, ClusterEncoder, Recorder};
pub use sector::{Sector, SectorHeader, SectorMode};

use std::fmt;
use std::io;
use thiserror::Error;

pub mod address;
pub mod file;
pub mod format;
pub mod layout;
pub mod memory;
pub mod pcm;
pub mod recorder;
pub mod sector;


/// The capacity class of a disc. The class fixes the size of the program
/// area and therefore the total cluster count of the image.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiscType {
    /// 60-minute class disc
    Md60,
    /// 74-minute class disc
    Md74,
    /// 80-minute class disc
    Md80,
}

impl DiscType {
    /// All supported capacity classes
    pub const ALL: [DiscType; 3] = [DiscType::Md60, DiscType::Md74, DiscType::Md80];

    /// Number of clusters in the program area for this class.
    ///
    /// One cluster holds a shade over two seconds of audio: 3600 seconds of
    /// a 60-minute disc divide into 1763 whole clusters, 4440 seconds of a
    /// 74-minute disc into 2202 (the documented 0x8CC lead-out start minus
    /// the 0x32 program start).
    pub const fn program_clusters(self) -> u16 {
        match self {
            DiscType::Md60 => 1763,
            DiscType::Md74 => 2202,
            DiscType::Md80 => 2352,
        }
    }

    /// First cluster past the program area, which is also where the
    /// lead-out starts. This is the value stored in the image's type
    /// marker.
    pub const fn program_end(self) -> u16 {
        format::PROGRAM_START + self.program_clusters()
    }

    /// Total cluster count of an image of this class: the program end plus
    /// the 115 lead-out clusters.
    pub const fn total_clusters(self) -> u16 {
        self.program_end() + format::LEAD_OUT_CLUSTERS
    }

    /// Recover the capacity class from a type-marker value, i.e. the
    /// first lead-out cluster as stored at creation time. Returns `None`
    /// for a value matching no supported class.
    pub fn from_program_end(program_end: u16) -> Option<DiscType> {
        DiscType::ALL.into_iter().find(|t| t.program_end() == program_end)
    }
}

impl fmt::Display for DiscType {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DiscType::Md60 => "MD60",
            DiscType::Md74 => "MD74",
            DiscType::Md80 => "MD80",
        };

        write!(fmt, "{}", name)
    }
}

/// Abstract interface to a raw image store: a fixed-length array of
/// whole sectors addressed by cluster and sector index.
///
/// Implementations are purely positional; nothing at this layer interprets
/// sector contents or enforces zone rules. The store's size is fixed at
/// construction and never changes.
pub trait Image {
    /// Return a string identifying the storage backend in a human-readable
    /// way
    fn image_format(&self) -> String;

    /// Total number of clusters in the store
    fn cluster_count(&self) -> u16;

    /// Total number of sectors in the store
    fn sector_count(&self) -> u32 {
        self.cluster_count() as u32 * format::SECTORS_PER_CLUSTER as u32
    }

    /// Read the whole sector at `addr`. Fails with a range error if
    /// `addr.cluster()` is past the end of the store.
    fn read_sector(&mut self, addr: Address) -> MdResult<Sector>;

    /// Write the whole sector at `addr`. A write either commits all 2352
    /// bytes or fails without committing. Fails with a range error if
    /// `addr.cluster()` is past the end of the store.
    fn write_sector(&mut self, addr: Address, sector: &Sector) -> MdResult<()>;
}

/// Error type for image operations.
#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum MdError {
    #[error("Generic I/O error")]
    IoError(#[from] io::Error),
    #[error("Cluster {cluster} out of range (image holds {clusters} clusters)")]
    ClusterOutOfRange { cluster: u16, clusters: u16 },
    #[error("A raw sector must be exactly 2352 bytes, got {got}")]
    BadSectorLength { got: usize },
    #[error("An audio block must be exactly 2332 bytes, got {got}")]
    BadAudioBlockLength { got: usize },
    #[error("A TOC payload must be exactly 2336 bytes, got {got}")]
    BadTocPayloadLength { got: usize },
    #[error("Sector role mismatch: expected {expected:?}, got {got:?}")]
    RoleMismatch {
        expected: SectorRole,
        got: SectorRole,
    },
    #[error("Cluster {cluster} is not in the program area")]
    OutsideProgramArea { cluster: u16 },
    #[error("Cluster {cluster} is not in the lead-in or UTOC zone")]
    OutsideTocArea { cluster: u16 },
    #[error("Incoherent cluster layout")]
    IncoherentLayout,
    #[error("Image cluster count mismatch: layout wants {expected}, store holds {got}")]
    ClusterCountMismatch { expected: u16, got: u16 },
    #[error("Image size mismatch: expected {expected} bytes, got {got}")]
    ImageSizeMismatch { expected: u64, got: u64 },
    #[error("The sync pattern at the start of the sector is invalid")]
    BadSyncPattern,
    #[error("Prohibited sector mode {0}")]
    BadMode(u8),
    #[error("Unknown disc type marker: no capacity class ends its program area at cluster {program_end}")]
    UnknownDiscType { program_end: u16 },
    #[error("Encoder contract violation: expected {expected} sectors per cluster, got {got}")]
    EncoderContract { expected: usize, got: usize },
    #[error("PCM range out of bounds: offset {offset} + count {count} frames exceeds a {frames}-frame buffer")]
    FrameRangeOutOfBounds {
        offset: usize,
        count: usize,
        frames: usize,
    },
    #[error("The recording session is closed")]
    RecorderClosed,
}

/// Convenience type alias for a `Result<R, MdError>`
pub type MdResult<R> = std::result::Result<R, MdError>;

#[test]
fn mderror_display() {
    // Make sure that MdError implements Display. This should be true if we
    // set an `#[error("...")]` for every variant
    println!("{}", MdError::BadSyncPattern);
}

#[test]
fn disc_type_geometry() {
    assert_eq!(DiscType::Md60.program_end(), 0x0715);
    assert_eq!(DiscType::Md74.program_end(), 0x08cc);
    assert_eq!(DiscType::Md60.total_clusters(), 1928);
    assert_eq!(DiscType::Md74.total_clusters(), 2367);
    assert_eq!(DiscType::Md80.total_clusters(), 2517);

    for t in DiscType::ALL {
        assert_eq!(DiscType::from_program_end(t.program_end()), Some(t));
    }

    assert_eq!(DiscType::from_program_end(0), None);
}
