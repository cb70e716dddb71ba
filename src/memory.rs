//! In-memory image store.
//!
//! Backs an image with a plain byte vector. Mostly useful for tests and
//! for assembling small images before dumping them to disk; the vector is
//! sized exactly at construction and never grows or shrinks afterwards.

use crate::format::{image_bytes, SECTOR_BYTES};
use crate::{Address, Image, MdError, MdResult, Sector};

/// Image store backed by a `Vec<u8>` of exactly
/// `clusters × 36 × 2352` bytes
pub struct MemoryImage {
    data: Vec<u8>,
    clusters: u16,
}

impl MemoryImage {
    /// Create a zero-filled store holding `clusters` clusters
    pub fn blank(clusters: u16) -> MemoryImage {
        MemoryImage {
            data: vec![0; image_bytes(clusters) as usize],
            clusters,
        }
    }

    /// Take ownership of `data` as a store holding `clusters` clusters.
    /// Fails unless `data` is exactly `clusters × 36 × 2352` bytes long;
    /// the store is never resized to fit.
    pub fn from_bytes(data: Vec<u8>, clusters: u16) -> MdResult<MemoryImage> {
        let expected = image_bytes(clusters);

        if data.len() as u64 != expected {
            return Err(MdError::ImageSizeMismatch {
                expected,
                got: data.len() as u64,
            });
        }

        Ok(MemoryImage { data, clusters })
    }

    /// View the backing bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the store and return the backing bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn check_cluster(&self, addr: Address) -> MdResult<usize> {
        if addr.cluster() >= self.clusters {
            return Err(MdError::ClusterOutOfRange {
                cluster: addr.cluster(),
                clusters: self.clusters,
            });
        }

        Ok(addr.byte_offset() as usize)
    }
}

impl Image for MemoryImage {
    fn image_format(&self) -> String {
        "in-memory".to_string()
    }

    fn cluster_count(&self) -> u16 {
        self.clusters
    }

    fn read_sector(&mut self, addr: Address) -> MdResult<Sector> {
        let offset = self.check_cluster(addr)?;

        Sector::from_raw(&self.data[offset..offset + SECTOR_BYTES])
    }

    fn write_sector(&mut self, addr: Address, sector: &Sector) -> MdResult<()> {
        let offset = self.check_cluster(addr)?;

        self.data[offset..offset + SECTOR_BYTES].copy_from_slice(sector.data_2352());

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::MemoryImage;
    use crate::format::{image_bytes, CLUSTER_BYTES};
    use crate::{Address, Image, MdError, Sector};
    use proptest::prelude::*;

    #[test]
    fn sizing() {
        let image = MemoryImage::blank(4);

        assert_eq!(image.cluster_count(), 4);
        assert_eq!(image.sector_count(), 4 * 36);
        assert_eq!(image.as_bytes().len(), 4 * CLUSTER_BYTES);
    }

    #[test]
    fn write_read_round_trip() {
        let mut image = MemoryImage::blank(2);

        let addr = Address::new(1, 3).unwrap();
        let sector = Sector::from_audio_block(addr, &[0x5a; 2332]).unwrap();

        image.write_sector(addr, &sector).unwrap();

        let back = image.read_sector(addr).unwrap();
        assert_eq!(back.data_2352(), sector.data_2352());

        // The neighbouring sectors are untouched
        let before = image.read_sector(Address::new(1, 2).unwrap()).unwrap();
        assert!(before.data_2352().iter().all(|&b| b == 0));
    }

    #[test]
    fn rejects_out_of_range_cluster() {
        let mut image = MemoryImage::blank(2);

        let addr = Address::new(2, 0).unwrap();

        assert!(matches!(
            image.read_sector(addr),
            Err(MdError::ClusterOutOfRange {
                cluster: 2,
                clusters: 2
            })
        ));
    }

    proptest! {
        #[test]
        fn rejects_wrong_byte_length(clusters in 1u16..8, delta in -3i64..=3) {
            prop_assume!(delta != 0);

            let len = (image_bytes(clusters) as i64 + delta) as usize;
            let res = MemoryImage::from_bytes(vec![0; len], clusters);

            prop_assert!(
                matches!(res, Err(MdError::ImageSizeMismatch { .. })),
                "expected ImageSizeMismatch error"
            );
        }

        #[test]
        fn accepts_exact_byte_length(clusters in 1u16..8) {
            let len = image_bytes(clusters) as usize;

            prop_assert!(MemoryImage::from_bytes(vec![0; len], clusters).is_ok());
        }
    }
}
