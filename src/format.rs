//! Fixed numeric facts about the MiniDisc medium: sector and cluster
//! geometry, the byte layout of a raw sector, the cluster zones of a disc
//! and the PCM capacity of one cluster.
//!
//! Every byte offset used by the sector codec and the image stores is
//! defined here exactly once. The audio and TOC framings share the same
//! 16-byte header and differ only in whether a 4-byte zero separator
//! precedes the payload, so keeping both derivations in one place is what
//! prevents the two framings from drifting apart.

/// Size of one raw sector in bytes, the smallest read/write unit
pub const SECTOR_BYTES: usize = 2352;

/// The 12-byte synchronization sequence at the start of every sector
pub const SYNC_PATTERN: [u8; 12] = [
    0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00,
];

/// Offset of the big-endian 16-bit cluster address within a sector
pub const HEADER_CLUSTER_OFFSET: usize = 12;

/// Offset of the sector-address byte within a sector
pub const HEADER_SECTOR_OFFSET: usize = 14;

/// Offset of the mode byte within a sector
pub const HEADER_MODE_OFFSET: usize = 15;

/// Total length of the sync pattern and header: sync, cluster address,
/// sector-address byte and mode
pub const HEADER_BYTES: usize = 16;

/// Length of the zero separator between the header and the payload of an
/// audio-framed sector. TOC-framed sectors have no separator.
pub const AUDIO_SEPARATOR_BYTES: usize = 4;

/// Offset of the 2332-byte block within an audio-framed sector
pub const AUDIO_BLOCK_OFFSET: usize = HEADER_BYTES + AUDIO_SEPARATOR_BYTES;

/// Length of the audio block carried by an audio-framed sector
pub const AUDIO_BLOCK_BYTES: usize = SECTOR_BYTES - AUDIO_BLOCK_OFFSET;

/// Offset of the payload within a TOC-framed sector: the payload follows
/// the header immediately
pub const TOC_PAYLOAD_OFFSET: usize = HEADER_BYTES;

/// Length of the payload carried by a TOC-framed sector
pub const TOC_PAYLOAD_BYTES: usize = SECTOR_BYTES - TOC_PAYLOAD_OFFSET;

/// Offset within the TOC payload of the big-endian 16-bit marker holding
/// the first lead-out cluster of the disc. The marker lives in cluster 0,
/// sector 0 and is the only means of recovering the capacity class of an
/// image file.
pub const TYPE_MARKER_PAYLOAD_OFFSET: usize = 18;

/// Number of sectors in one cluster, the medium's write granularity
pub const SECTORS_PER_CLUSTER: usize = 36;

/// Number of audio data sectors at the start of each cluster
pub const DATA_SECTORS_PER_CLUSTER: usize = 32;

/// Number of link sectors following the data sectors of each cluster
pub const LINK_SECTORS_PER_CLUSTER: usize = 3;

/// Number of subdata sectors closing each cluster
pub const SUBDATA_SECTORS_PER_CLUSTER: usize = 1;

/// Size of one full cluster in bytes
pub const CLUSTER_BYTES: usize = SECTORS_PER_CLUSTER * SECTOR_BYTES;

/// First cluster of the lead-in zone
pub const LEAD_IN_START: u16 = 0x0000;

/// First cluster past the lead-in zone
pub const LEAD_IN_END: u16 = 0x0003;

/// First cluster of the UTOC and system zone
pub const TOC_START: u16 = 0x0003;

/// First cluster past the UTOC and system zone
pub const TOC_END: u16 = 0x0032;

/// First cluster of the program area holding recorded audio
pub const PROGRAM_START: u16 = 0x0032;

/// Number of clusters in the lead-out zone, identical for every capacity
/// class
pub const LEAD_OUT_CLUSTERS: u16 = 115;

/// Size in bytes of one sound group, the audio codec's framing unit
pub const SOUND_GROUP_BYTES: usize = 424;

/// Number of stereo PCM frames in one sound group (512 samples per channel
/// at 44.1kHz, about 11.6ms)
pub const FRAMES_PER_SOUND_GROUP: usize = 512;

/// Number of sound groups covered by one cluster
pub const SOUND_GROUPS_PER_CLUSTER: usize = 176;

/// Number of stereo PCM frames consumed by one cluster (just over two
/// seconds of audio)
pub const FRAMES_PER_CLUSTER: usize = FRAMES_PER_SOUND_GROUP * SOUND_GROUPS_PER_CLUSTER;

/// Exact byte length of an image holding `clusters` clusters
pub const fn image_bytes(clusters: u16) -> u64 {
    clusters as u64 * CLUSTER_BYTES as u64
}

#[test]
fn derived_constants() {
    assert_eq!(AUDIO_BLOCK_BYTES, 2332);
    assert_eq!(TOC_PAYLOAD_BYTES, 2336);
    assert_eq!(CLUSTER_BYTES, 84_672);
    assert_eq!(FRAMES_PER_CLUSTER, 90_112);
    assert_eq!(
        DATA_SECTORS_PER_CLUSTER + LINK_SECTORS_PER_CLUSTER + SUBDATA_SECTORS_PER_CLUSTER,
        SECTORS_PER_CLUSTER
    );
}
