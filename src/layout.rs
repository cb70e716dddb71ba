//! Cluster-zone layout and the layout-checked image wrapper.
//!
//! Cluster-range validation lives here; sector structure validation lives
//! in the [`Sector`] factories. The wrapper is the single point deciding
//! whether a write may land in a given zone, which matters because a
//! misplaced sector corrupts an otherwise playable image with no checksum
//! to catch it later.

use crate::format::{LEAD_IN_END, LEAD_IN_START, LEAD_OUT_CLUSTERS, PROGRAM_START, TOC_END, TOC_START};
use crate::{Address, DiscType, Image, MdError, MdResult, Sector};

/// Zone boundaries of a disc, in clusters.
///
/// All `*_end` fields are exclusive. The standard layouts share every
/// boundary except `program_end`, which the capacity class fixes.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout {
    /// First cluster of the lead-in
    pub lead_in_start: u16,
    /// First cluster past the lead-in
    pub lead_in_end: u16,
    /// First cluster of the UTOC and system zone
    pub toc_start: u16,
    /// First cluster past the UTOC and system zone
    pub toc_end: u16,
    /// First cluster of the program area
    pub program_start: u16,
    /// First cluster past the program area, where the lead-out starts
    pub program_end: u16,
    /// Number of lead-out clusters after the program area
    pub lead_out_clusters: u16,
}

impl Layout {
    /// Return the standard layout for a disc of the given capacity class
    pub const fn for_disc_type(disc_type: DiscType) -> Layout {
        Layout {
            lead_in_start: LEAD_IN_START,
            lead_in_end: LEAD_IN_END,
            toc_start: TOC_START,
            toc_end: TOC_END,
            program_start: PROGRAM_START,
            program_end: disc_type.program_end(),
            lead_out_clusters: LEAD_OUT_CLUSTERS,
        }
    }

    /// Check the structural coherence of the boundaries: the zones must
    /// follow each other without overlapping.
    pub fn validate(&self) -> MdResult<()> {
        let ordered = self.lead_in_start < self.lead_in_end
            && self.lead_in_end <= self.toc_start
            && self.toc_start <= self.toc_end
            && self.toc_end <= self.program_start
            && self.program_start < self.program_end;

        if ordered {
            Ok(())
        } else {
            Err(MdError::IncoherentLayout)
        }
    }

    /// Total cluster count of an image using this layout
    pub const fn total_clusters(&self) -> u16 {
        self.program_end + self.lead_out_clusters
    }

    /// Returns true if `cluster` lies in the program area
    pub const fn in_program_area(&self, cluster: u16) -> bool {
        cluster >= self.program_start && cluster < self.program_end
    }

    /// Returns true if `cluster` lies in the lead-in or the UTOC zone
    pub const fn in_lead_in_or_toc(&self, cluster: u16) -> bool {
        (cluster >= self.lead_in_start && cluster < self.lead_in_end)
            || (cluster >= self.toc_start && cluster < self.toc_end)
    }
}

/// An image store wrapped with zone validation.
///
/// The wrapper owns the underlying store for its lifetime and exposes its
/// read/write contract unchanged, plus guarded write operations that
/// refuse to put a sector in the wrong zone.
pub struct LayoutCheckedImage<I: Image> {
    image: I,
    layout: Layout,
}

impl<I: Image> LayoutCheckedImage<I> {
    /// Wrap `image` with the given zone boundaries.
    ///
    /// Fails if the boundaries are incoherent or if the store's cluster
    /// count is not exactly `program_end + lead_out_clusters`.
    pub fn new(image: I, layout: Layout) -> MdResult<LayoutCheckedImage<I>> {
        layout.validate()?;

        let expected = layout.total_clusters();

        if image.cluster_count() != expected {
            return Err(MdError::ClusterCountMismatch {
                expected,
                got: image.cluster_count(),
            });
        }

        Ok(LayoutCheckedImage { image, layout })
    }

    /// Wrap `image` with the standard layout of the given capacity class
    pub fn for_disc_type(image: I, disc_type: DiscType) -> MdResult<LayoutCheckedImage<I>> {
        LayoutCheckedImage::new(image, Layout::for_disc_type(disc_type))
    }

    /// Returns the zone boundaries this wrapper enforces
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Release the underlying store
    pub fn into_inner(self) -> I {
        self.image
    }

    /// Build an audio sector from `block` and write it at `addr`.
    ///
    /// Fails with a zone error if `addr.cluster()` is outside the program
    /// area, and with the sector codec's role/length errors for a bad
    /// address or block. Nothing is written on failure.
    pub fn write_audio_sector(&mut self, addr: Address, block: &[u8]) -> MdResult<()> {
        if !self.layout.in_program_area(addr.cluster()) {
            return Err(MdError::OutsideProgramArea {
                cluster: addr.cluster(),
            });
        }

        let sector = Sector::from_audio_block(addr, block)?;

        self.image.write_sector(addr, &sector)
    }

    /// Build a TOC sector from `data` and write it at `addr`.
    ///
    /// Fails with a zone error if `addr.cluster()` is outside both the
    /// lead-in and the UTOC zone. Nothing is written on failure.
    pub fn write_toc_sector(&mut self, addr: Address, data: &[u8]) -> MdResult<()> {
        if !self.layout.in_lead_in_or_toc(addr.cluster()) {
            return Err(MdError::OutsideTocArea {
                cluster: addr.cluster(),
            });
        }

        let sector = Sector::from_toc_data(addr, data)?;

        self.image.write_sector(addr, &sector)
    }
}

impl<I: Image> Image for LayoutCheckedImage<I> {
    fn image_format(&self) -> String {
        format!("layout-checked {}", self.image.image_format())
    }

    fn cluster_count(&self) -> u16 {
        self.image.cluster_count()
    }

    fn read_sector(&mut self, addr: Address) -> MdResult<Sector> {
        self.image.read_sector(addr)
    }

    fn write_sector(&mut self, addr: Address, sector: &Sector) -> MdResult<()> {
        self.image.write_sector(addr, sector)
    }
}

#[cfg(test)]
mod test {
    use super::{Layout, LayoutCheckedImage};
    use crate::format::AUDIO_BLOCK_BYTES;
    use crate::{Address, DiscType, MdError, MemoryImage};

    fn checked_image(disc_type: DiscType) -> LayoutCheckedImage<MemoryImage> {
        let store = MemoryImage::blank(disc_type.total_clusters());

        LayoutCheckedImage::for_disc_type(store, disc_type).unwrap()
    }

    #[test]
    fn rejects_wrong_cluster_count() {
        for t in DiscType::ALL {
            let store = MemoryImage::blank(t.total_clusters() - 1);

            assert!(matches!(
                LayoutCheckedImage::for_disc_type(store, t),
                Err(MdError::ClusterCountMismatch { .. })
            ));

            let store = MemoryImage::blank(t.total_clusters() + 1);

            assert!(matches!(
                LayoutCheckedImage::for_disc_type(store, t),
                Err(MdError::ClusterCountMismatch { .. })
            ));
        }
    }

    #[test]
    fn rejects_incoherent_layout() {
        let mut layout = Layout::for_disc_type(DiscType::Md60);
        layout.program_end = layout.program_start;

        assert!(matches!(layout.validate(), Err(MdError::IncoherentLayout)));

        let store = MemoryImage::blank(DiscType::Md60.total_clusters());

        assert!(matches!(
            LayoutCheckedImage::new(store, layout),
            Err(MdError::IncoherentLayout)
        ));
    }

    #[test]
    fn audio_zone_boundaries() {
        let mut image = checked_image(DiscType::Md60);
        let layout = *image.layout();
        let block = [0u8; AUDIO_BLOCK_BYTES];

        // First and last program clusters are writable
        let first = Address::new(layout.program_start, 0).unwrap();
        image.write_audio_sector(first, &block).unwrap();

        let last = Address::new(layout.program_end - 1, 0).unwrap();
        image.write_audio_sector(last, &block).unwrap();

        // One past the end is the lead-out
        let lead_out = Address::new(layout.program_end, 0).unwrap();
        assert!(matches!(
            image.write_audio_sector(lead_out, &block),
            Err(MdError::OutsideProgramArea { .. })
        ));

        // The UTOC zone is off-limits for audio
        let toc = Address::new(layout.toc_start, 0).unwrap();
        assert!(matches!(
            image.write_audio_sector(toc, &block),
            Err(MdError::OutsideProgramArea { .. })
        ));
    }

    #[test]
    fn toc_zone_boundaries() {
        let mut image = checked_image(DiscType::Md74);
        let layout = *image.layout();
        let payload = [0u8; 2336];

        image.write_toc_sector(Address::ZERO, &payload).unwrap();

        let utoc = Address::new(layout.toc_end - 1, 4).unwrap();
        image.write_toc_sector(utoc, &payload).unwrap();

        // The program area rejects TOC sectors
        let program = Address::new(layout.program_start, 0).unwrap();
        assert!(matches!(
            image.write_toc_sector(program, &payload),
            Err(MdError::OutsideTocArea { .. })
        ));
    }

    #[test]
    fn pass_through_preserves_store_errors() {
        use crate::{Image, Sector};

        let mut image = checked_image(DiscType::Md60);
        let total = image.cluster_count();

        let addr = Address::new(total, 0).unwrap();
        let sector = Sector::from_raw(&[0u8; 2352]).unwrap();

        assert!(matches!(
            image.write_sector(addr, &sector),
            Err(MdError::ClusterOutOfRange { .. })
        ));
    }
}
