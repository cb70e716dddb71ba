//! Streaming recorder: PCM frames in, fully framed clusters out.
//!
//! The recorder buffers exactly one cluster's worth of interleaved stereo
//! samples. Whenever the buffer fills, the external encoder turns it into
//! the 32 audio blocks of the cluster and the recorder writes the whole
//! cluster through the layout-checked image: audio sectors 0..=31, then
//! the three link fillers 32..=34, then the subdata filler 35. Clusters
//! are written in strictly increasing order, one at a time.
//!
//! The session must be closed so that a trailing partial cluster is
//! zero-padded and flushed; dropping an unclosed recorder attempts the
//! flush as a last resort and logs if it fails.

use crate::format::{
    AUDIO_BLOCK_BYTES, DATA_SECTORS_PER_CLUSTER, FRAMES_PER_CLUSTER, LINK_SECTORS_PER_CLUSTER,
    SECTORS_PER_CLUSTER,
};
use crate::{Address, Image, LayoutCheckedImage, MdError, MdResult, PcmFrameSource, Sector};

/// One encoded 2332-byte audio block, the payload of a single data sector
pub type AudioBlock = [u8; AUDIO_BLOCK_BYTES];

/// The audio codec contract consumed by the recorder, kept narrow so that
/// codec internals never leak into the disk layer.
///
/// An implementation compresses one full cluster of PCM audio into the
/// cluster's 32 audio blocks. The recorder treats any other output arity
/// as a fatal contract violation.
pub trait ClusterEncoder {
    /// Encode a full PCM cluster into exactly 32 audio blocks, one per
    /// data sector in order 0..=31.
    ///
    /// `pcm` is always exactly [`FRAMES_PER_CLUSTER`] interleaved stereo
    /// frames (`2 × 90112` samples); `last_cluster` is true when the tail
    /// of the buffer is padding rather than audio.
    fn encode_cluster(&mut self, pcm: &[i16], last_cluster: bool) -> MdResult<Vec<AudioBlock>>;
}

/// A recording session: consumes PCM frames and appends encoded clusters
/// to the program area of an image.
///
/// The session exclusively borrows the image and the encoder for its whole
/// lifetime, so a second writer cannot exist while it is alive.
pub struct Recorder<'a, I: Image, E: ClusterEncoder> {
    image: &'a mut LayoutCheckedImage<I>,
    encoder: &'a mut E,
    /// One cluster of interleaved samples, `[L0, R0, L1, R1, ...]`
    pcm: Box<[i16]>,
    /// Number of frames currently buffered, 0..=FRAMES_PER_CLUSTER
    buffered_frames: usize,
    /// Absolute index of the next cluster to fill
    next_cluster: u16,
    closed: bool,
}

impl<'a, I: Image, E: ClusterEncoder> Recorder<'a, I, E> {
    /// Start a recording session appending clusters from `start_cluster`
    /// onwards.
    ///
    /// The start cluster is not zone-checked here: the first flush fails
    /// with a zone error before writing anything if it lies outside the
    /// program area.
    pub fn new(
        image: &'a mut LayoutCheckedImage<I>,
        encoder: &'a mut E,
        start_cluster: u16,
    ) -> Recorder<'a, I, E> {
        Recorder {
            image,
            encoder,
            pcm: vec![0; FRAMES_PER_CLUSTER * 2].into_boxed_slice(),
            buffered_frames: 0,
            next_cluster: start_cluster,
            closed: false,
        }
    }

    /// Number of frames currently buffered towards the next cluster
    pub fn buffered_frames(&self) -> usize {
        self.buffered_frames
    }

    /// Absolute index of the next cluster the recorder will fill
    pub fn next_cluster(&self) -> u16 {
        self.next_cluster
    }

    /// Append `frame_count` interleaved stereo frames starting at
    /// `frame_offset` (in frames, not samples) of `pcm`.
    ///
    /// Every time the internal buffer reaches one full cluster it is
    /// encoded and written out before the remaining input is consumed.
    /// Fails if the session is closed or if `frame_offset + frame_count`
    /// overruns `pcm`.
    pub fn write_frames(
        &mut self,
        pcm: &[i16],
        frame_offset: usize,
        frame_count: usize,
    ) -> MdResult<()> {
        self.ensure_open()?;

        let frames = pcm.len() / 2;

        let in_bounds = frame_offset
            .checked_add(frame_count)
            .map_or(false, |end| end <= frames);

        if !in_bounds {
            return Err(MdError::FrameRangeOutOfBounds {
                offset: frame_offset,
                count: frame_count,
                frames,
            });
        }

        let mut remaining = frame_count;
        let mut src_frame = frame_offset;

        while remaining > 0 {
            let room = FRAMES_PER_CLUSTER - self.buffered_frames;
            let n = room.min(remaining);

            let dst = self.buffered_frames * 2;
            let src = src_frame * 2;
            self.pcm[dst..dst + n * 2].copy_from_slice(&pcm[src..src + n * 2]);

            self.buffered_frames += n;
            src_frame += n;
            remaining -= n;

            if self.buffered_frames == FRAMES_PER_CLUSTER {
                self.flush_cluster(false)?;
            }
        }

        Ok(())
    }

    /// Flush a trailing partial cluster, like pressing STOP: the unused
    /// tail of the buffer is zero-padded and the cluster is encoded with
    /// the last-cluster flag set. Does nothing when the buffer is empty.
    /// Fails if the session is closed.
    pub fn finalize(&mut self) -> MdResult<()> {
        self.ensure_open()?;

        if self.buffered_frames > 0 {
            self.pcm[self.buffered_frames * 2..].fill(0);
            self.flush_cluster(true)?;
        }

        Ok(())
    }

    /// Finalize the session and mark it closed. Safe to call any number of
    /// times; only the first call flushes.
    pub fn close(&mut self) -> MdResult<()> {
        if self.closed {
            return Ok(());
        }

        let res = self.finalize();
        self.closed = true;

        res
    }

    /// Pump `source` into the session until its end of stream. The session
    /// stays open: call [`Recorder::close`] to flush the tail.
    pub fn record_from<S: PcmFrameSource>(&mut self, source: &mut S) -> MdResult<()> {
        let mut chunk = vec![0i16; 8192];

        loop {
            let frames = source.read_frames(&mut chunk)?;

            if frames == 0 {
                return Ok(());
            }

            self.write_frames(&chunk, 0, frames)?;
        }
    }

    /// Encode the buffered cluster and write all 36 of its sectors.
    ///
    /// The encoder's output arity is checked before any sector is written,
    /// so a contract violation leaves the cluster untouched in the store.
    fn flush_cluster(&mut self, last_cluster: bool) -> MdResult<()> {
        let blocks = self.encoder.encode_cluster(&self.pcm, last_cluster)?;

        if blocks.len() != DATA_SECTORS_PER_CLUSTER {
            return Err(MdError::EncoderContract {
                expected: DATA_SECTORS_PER_CLUSTER,
                got: blocks.len(),
            });
        }

        let cluster = self.next_cluster;

        log::debug!(
            "flushing cluster {:#06x} (last_cluster: {})",
            cluster,
            last_cluster
        );

        for (s, block) in blocks.iter().enumerate() {
            let addr = Address::new(cluster, s as u8).expect("Invalid data sector index");

            self.image.write_audio_sector(addr, block)?;
        }

        for s in DATA_SECTORS_PER_CLUSTER..DATA_SECTORS_PER_CLUSTER + LINK_SECTORS_PER_CLUSTER {
            let addr = Address::new(cluster, s as u8).expect("Invalid link sector index");

            let sector = Sector::link_filler(addr)?;
            self.image.write_sector(addr, &sector)?;
        }

        let addr = Address::new(cluster, SECTORS_PER_CLUSTER as u8 - 1)
            .expect("Invalid subdata sector index");

        let sector = Sector::subdata_filler(addr)?;
        self.image.write_sector(addr, &sector)?;

        self.next_cluster += 1;
        self.buffered_frames = 0;

        Ok(())
    }

    fn ensure_open(&self) -> MdResult<()> {
        if self.closed {
            Err(MdError::RecorderClosed)
        } else {
            Ok(())
        }
    }
}

impl<'a, I: Image, E: ClusterEncoder> Drop for Recorder<'a, I, E> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close() {
                log::error!("recording session dropped with an unflushed cluster: {}", e);
            }
        }
    }
}
