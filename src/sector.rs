//! MiniDisc sector codec.
//!
//! A raw sector is 2352 bytes: a 12-byte sync pattern, a 3-byte address
//! (16-bit big-endian cluster plus the sector-address byte), one mode byte
//! and the payload. Two payload framings coexist:
//!
//! - *audio framing*: a 4-byte zero separator then a 2332-byte block. Used
//!   for data-role audio sectors and for the zero-filled link and subdata
//!   sectors.
//! - *TOC framing*: a 2336-byte payload immediately after the header, no
//!   separator. Used for table-of-contents sectors in the lead-in and UTOC
//!   zones.
//!
//! Which framing applies is decided by the sector's purpose, not by its
//! bytes: a sector read back from an image must be interpreted with the
//! framing of the zone it came from.

use arrayref::array_ref;

use crate::address::{Address, SectorRole};
use crate::format::{
    AUDIO_BLOCK_BYTES, AUDIO_BLOCK_OFFSET, HEADER_CLUSTER_OFFSET, HEADER_MODE_OFFSET,
    SECTOR_BYTES, SYNC_PATTERN, TOC_PAYLOAD_BYTES, TOC_PAYLOAD_OFFSET,
};
use crate::{MdError, MdResult};

/// The mode byte stored in every sector header.
///
/// Only [`SectorMode::MiniDisc`] is ever written by this crate; the other
/// two codes exist so that sectors produced elsewhere can be decoded.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SectorMode {
    /// All-zero sector, unrecorded medium
    Zero = 0,
    /// Reserved by the standard
    Reserved = 1,
    /// Recorded MiniDisc sector
    MiniDisc = 2,
}

impl SectorMode {
    /// Returns the numeric code stored in the header
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decode a mode byte. Codes 3..=255 are prohibited and return `None`.
    pub const fn from_code(code: u8) -> Option<SectorMode> {
        match code {
            0 => Some(SectorMode::Zero),
            1 => Some(SectorMode::Reserved),
            2 => Some(SectorMode::MiniDisc),
            _ => None,
        }
    }
}

/// Decoded sector header
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SectorHeader {
    /// Cluster index stored in the header
    pub cluster: u16,
    /// Raw sector-address byte (0x00..=0x1F for data sectors,
    /// 0xFC..=0xFF for link and subdata)
    pub address_byte: u8,
    /// Sector mode
    pub mode: SectorMode,
}

/// A single fully-formed 2352-byte sector.
///
/// The factory methods are pure: the same inputs always produce the same
/// bytes. Structural validation (role and payload length) happens here;
/// cluster-zone validation is the job of
/// [`LayoutCheckedImage`](crate::LayoutCheckedImage).
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sector {
    #[cfg_attr(feature = "serde", serde(with = "serde_big_array::BigArray"))]
    data: [u8; SECTOR_BYTES],
}

impl Sector {
    /// Start from an all-zero sector and lay down the sync pattern and the
    /// header for `addr` with the given mode.
    fn with_header(addr: Address, mode: SectorMode) -> Sector {
        let mut data = [0u8; SECTOR_BYTES];

        data[..SYNC_PATTERN.len()].copy_from_slice(&SYNC_PATTERN);
        addr.write_header(&mut data, HEADER_CLUSTER_OFFSET);
        data[HEADER_MODE_OFFSET] = mode.code();

        Sector { data }
    }

    /// Build an audio-framed data sector carrying `block`.
    ///
    /// Fails if `addr` is not a data-role address or if `block` is not
    /// exactly 2332 bytes.
    pub fn from_audio_block(addr: Address, block: &[u8]) -> MdResult<Sector> {
        if addr.role() != SectorRole::Data {
            return Err(MdError::RoleMismatch {
                expected: SectorRole::Data,
                got: addr.role(),
            });
        }

        if block.len() != AUDIO_BLOCK_BYTES {
            return Err(MdError::BadAudioBlockLength { got: block.len() });
        }

        let mut sector = Sector::with_header(addr, SectorMode::MiniDisc);

        // Bytes 16..20 are the separator and stay zero
        sector.data[AUDIO_BLOCK_OFFSET..].copy_from_slice(block);

        Ok(sector)
    }

    /// Build a TOC-framed sector carrying `data` directly after the header.
    ///
    /// Fails if `data` is not exactly 2336 bytes. Any sector index is
    /// acceptable here; restricting TOC sectors to the lead-in and UTOC
    /// zones is done one layer up.
    pub fn from_toc_data(addr: Address, data: &[u8]) -> MdResult<Sector> {
        if data.len() != TOC_PAYLOAD_BYTES {
            return Err(MdError::BadTocPayloadLength { got: data.len() });
        }

        let mut sector = Sector::with_header(addr, SectorMode::MiniDisc);

        sector.data[TOC_PAYLOAD_OFFSET..].copy_from_slice(data);

        Ok(sector)
    }

    /// Build a link sector: audio framing with an all-zero block.
    ///
    /// Fails if `addr` is not a link-role address.
    pub fn link_filler(addr: Address) -> MdResult<Sector> {
        if addr.role() != SectorRole::Link {
            return Err(MdError::RoleMismatch {
                expected: SectorRole::Link,
                got: addr.role(),
            });
        }

        Ok(Sector::with_header(addr, SectorMode::MiniDisc))
    }

    /// Build a subdata sector: audio framing with an all-zero block.
    ///
    /// Fails if `addr` is not the subdata-role address.
    pub fn subdata_filler(addr: Address) -> MdResult<Sector> {
        if addr.role() != SectorRole::Subdata {
            return Err(MdError::RoleMismatch {
                expected: SectorRole::Subdata,
                got: addr.role(),
            });
        }

        Ok(Sector::with_header(addr, SectorMode::MiniDisc))
    }

    /// Wrap an existing byte sequence as a sector, copying it. Fails if
    /// `raw` is not exactly 2352 bytes. No structural validation is
    /// performed; use [`Sector::header`] to decode and validate the header.
    pub fn from_raw(raw: &[u8]) -> MdResult<Sector> {
        if raw.len() != SECTOR_BYTES {
            return Err(MdError::BadSectorLength { got: raw.len() });
        }

        let mut data = [0u8; SECTOR_BYTES];
        data.copy_from_slice(raw);

        Ok(Sector { data })
    }

    /// Retrieve the entire raw sector data
    pub fn data_2352(&self) -> &[u8; SECTOR_BYTES] {
        &self.data
    }

    /// Retrieve the 2332-byte block of an audio-framed sector
    pub fn audio_block(&self) -> &[u8; AUDIO_BLOCK_BYTES] {
        array_ref![self.data, AUDIO_BLOCK_OFFSET, AUDIO_BLOCK_BYTES]
    }

    /// Retrieve the 2336-byte payload of a TOC-framed sector
    pub fn toc_payload(&self) -> &[u8; TOC_PAYLOAD_BYTES] {
        array_ref![self.data, TOC_PAYLOAD_OFFSET, TOC_PAYLOAD_BYTES]
    }

    /// Decode the sector header, validating the sync pattern and the mode
    /// byte
    pub fn header(&self) -> MdResult<SectorHeader> {
        if self.data[..SYNC_PATTERN.len()] != SYNC_PATTERN {
            return Err(MdError::BadSyncPattern);
        }

        let (cluster, address_byte) = Address::read_header(&self.data);

        let mode = match SectorMode::from_code(self.data[HEADER_MODE_OFFSET]) {
            Some(m) => m,
            None => return Err(MdError::BadMode(self.data[HEADER_MODE_OFFSET])),
        };

        Ok(SectorHeader {
            cluster,
            address_byte,
            mode,
        })
    }
}

#[cfg(test)]
mod test {
    use super::{Sector, SectorHeader, SectorMode};
    use crate::address::{Address, SectorRole};
    use crate::format::{AUDIO_BLOCK_BYTES, SECTOR_BYTES, TOC_PAYLOAD_BYTES};
    use crate::MdError;

    #[test]
    fn audio_block_round_trip() {
        let addr = Address::new(0x32, 5).unwrap();

        let mut block = [0u8; AUDIO_BLOCK_BYTES];
        for (i, b) in block.iter_mut().enumerate() {
            *b = i as u8;
        }

        let sector = Sector::from_audio_block(addr, &block).unwrap();

        assert_eq!(sector.audio_block(), &block);

        // Header + separator layout
        let raw = sector.data_2352();
        assert_eq!(raw[12], 0x00);
        assert_eq!(raw[13], 0x32);
        assert_eq!(raw[14], 5);
        assert_eq!(raw[15], 2);
        assert_eq!(&raw[16..20], &[0, 0, 0, 0]);

        // Wrap the same bytes again and decode
        let sector = Sector::from_raw(raw).unwrap();
        assert_eq!(
            sector.header().unwrap(),
            SectorHeader {
                cluster: 0x32,
                address_byte: 5,
                mode: SectorMode::MiniDisc,
            }
        );
    }

    #[test]
    fn toc_framing_has_no_separator() {
        let mut payload = [0u8; TOC_PAYLOAD_BYTES];
        payload[0] = 0xab;
        payload[18] = 0x07;
        payload[19] = 0x15;

        let sector = Sector::from_toc_data(Address::ZERO, &payload).unwrap();

        let raw = sector.data_2352();
        assert_eq!(raw[16], 0xab);
        // The type marker lands at absolute offset 34
        assert_eq!(raw[34], 0x07);
        assert_eq!(raw[35], 0x15);

        assert_eq!(sector.toc_payload(), &payload);
    }

    #[test]
    fn audio_block_rejects_wrong_role() {
        let block = [0u8; AUDIO_BLOCK_BYTES];

        for s in 32..36 {
            let addr = Address::new(0x32, s).unwrap();

            assert!(matches!(
                Sector::from_audio_block(addr, &block),
                Err(MdError::RoleMismatch {
                    expected: SectorRole::Data,
                    ..
                })
            ));
        }
    }

    #[test]
    fn builders_reject_wrong_lengths() {
        let addr = Address::new(0x32, 0).unwrap();

        assert!(matches!(
            Sector::from_audio_block(addr, &[0u8; 2331]),
            Err(MdError::BadAudioBlockLength { got: 2331 })
        ));
        assert!(matches!(
            Sector::from_toc_data(addr, &[0u8; 2332]),
            Err(MdError::BadTocPayloadLength { got: 2332 })
        ));
        assert!(matches!(
            Sector::from_raw(&[0u8; 2353]),
            Err(MdError::BadSectorLength { got: 2353 })
        ));
    }

    #[test]
    fn fillers_check_roles() {
        let link = Address::new(0x40, 33).unwrap();
        let subdata = Address::new(0x40, 35).unwrap();

        let sector = Sector::link_filler(link).unwrap();
        assert_eq!(sector.header().unwrap().address_byte, 0xfd);
        assert!(sector.audio_block().iter().all(|&b| b == 0));

        let sector = Sector::subdata_filler(subdata).unwrap();
        assert_eq!(sector.header().unwrap().address_byte, 0xff);

        assert!(Sector::link_filler(subdata).is_err());
        assert!(Sector::subdata_filler(link).is_err());
    }

    #[test]
    fn header_rejects_bad_sync_and_mode() {
        let raw = [0u8; SECTOR_BYTES];
        let sector = Sector::from_raw(&raw).unwrap();

        assert!(matches!(sector.header(), Err(MdError::BadSyncPattern)));

        let addr = Address::new(0, 0).unwrap();
        let mut sector = Sector::with_header(addr, SectorMode::MiniDisc);
        sector.data[15] = 3;

        assert!(matches!(sector.header(), Err(MdError::BadMode(3))));
    }
}
