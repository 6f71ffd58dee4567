//! Image stack discovery and channel reading.

use crate::error::{Error, Result};
use ndarray::Array3;
use puncta_core::{Calibration, IntensityVolume, LabelVolume};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, DecodingResult};

/// Stack file extensions the pipeline picks up in an input folder.
const STACK_EXTENSIONS: [&str; 2] = ["tif", "tiff"];

/// Capability interface over one multi-channel image stack.
///
/// Channels are opened one at a time to bound memory. Channel naming
/// is the reader's responsibility; the core never branches on file
/// format identity.
pub trait ChannelReader {
    /// Number of channels in the stack.
    fn channel_count(&self) -> usize;

    /// Display name of a channel.
    fn channel_name(&self, index: usize) -> String;

    /// Decodes one channel into an intensity volume.
    fn read_channel(&mut self, index: usize) -> Result<IntensityVolume>;

    /// Physical calibration carried by the file, if any.
    fn calibration(&self) -> Option<Calibration>;
}

/// Reader for multi-page grayscale TIFF stacks.
///
/// Pages are interpreted in XYCZ order: the channel index varies
/// fastest, so page `i` holds channel `i % channels` of slice
/// `i / channels`. Plain single-channel Z stacks are the
/// `channels == 1` case.
pub struct TiffStackReader {
    path: PathBuf,
    channels: usize,
    depth: usize,
    width: usize,
    height: usize,
}

impl TiffStackReader {
    /// Opens a stack and validates its page geometry.
    pub fn open<P: AsRef<Path>>(path: P, channels: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if channels == 0 {
            return Err(Error::InvalidStack("channel count must be positive".into()));
        }

        let mut decoder = Decoder::new(BufReader::new(File::open(&path)?))?;
        let (width, height) = decoder.dimensions()?;
        let mut pages = 1usize;
        while decoder.more_images() {
            decoder.next_image()?;
            let dims = decoder.dimensions()?;
            if dims != (width, height) {
                return Err(Error::InvalidStack(format!(
                    "page {pages} is {}x{}, expected {width}x{height}",
                    dims.0, dims.1
                )));
            }
            pages += 1;
        }
        if pages % channels != 0 {
            return Err(Error::InvalidStack(format!(
                "{pages} pages not divisible by {channels} channels"
            )));
        }

        Ok(Self {
            path,
            channels,
            depth: pages / channels,
            width: width as usize,
            height: height as usize,
        })
    }

    /// Number of Z slices per channel.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Lateral dimensions as `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

impl ChannelReader for TiffStackReader {
    fn channel_count(&self) -> usize {
        self.channels
    }

    fn channel_name(&self, index: usize) -> String {
        index.to_string()
    }

    fn read_channel(&mut self, index: usize) -> Result<IntensityVolume> {
        if index >= self.channels {
            return Err(Error::ChannelOutOfRange {
                index,
                count: self.channels,
            });
        }

        let mut decoder = Decoder::new(BufReader::new(File::open(&self.path)?))?;
        let mut volume: IntensityVolume = Array3::zeros((self.depth, self.height, self.width));

        let pages = self.depth * self.channels;
        for page in 0..pages {
            if page % self.channels == index {
                let z = page / self.channels;
                let samples = decode_page_f32(&mut decoder)?;
                if samples.len() != self.height * self.width {
                    return Err(Error::InvalidStack(format!(
                        "page {page} holds {} samples, expected {}",
                        samples.len(),
                        self.height * self.width
                    )));
                }
                for (i, v) in samples.into_iter().enumerate() {
                    volume[(z, i / self.width, i % self.width)] = v;
                }
            }
            if page + 1 < pages {
                decoder.next_image()?;
            }
        }
        Ok(volume)
    }

    fn calibration(&self) -> Option<Calibration> {
        // Plain TIFF stacks carry no trustworthy physical voxel size;
        // the operator supplies it at run level.
        None
    }
}

fn decode_page_f32(decoder: &mut Decoder<BufReader<File>>) -> Result<Vec<f32>> {
    let samples = match decoder.read_image()? {
        DecodingResult::U8(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::F32(data) => data,
        _ => return Err(Error::InvalidStack("unsupported sample format".into())),
    };
    Ok(samples)
}

/// Reads a labeled mask stack into a label volume.
///
/// Sample values are taken verbatim as instance labels; 0 stays
/// background.
pub fn read_label_stack<P: AsRef<Path>>(path: P) -> Result<LabelVolume> {
    let mut decoder = Decoder::new(BufReader::new(File::open(path.as_ref())?))?;
    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);

    let mut slices: Vec<Vec<u32>> = Vec::new();
    loop {
        let samples: Vec<u32> = match decoder.read_image()? {
            DecodingResult::U8(data) => data.into_iter().map(u32::from).collect(),
            DecodingResult::U16(data) => data.into_iter().map(u32::from).collect(),
            DecodingResult::U32(data) => data,
            _ => {
                return Err(Error::InvalidStack(
                    "unsupported label sample format".into(),
                ))
            }
        };
        if samples.len() != width * height {
            return Err(Error::InvalidStack(format!(
                "label page holds {} samples, expected {}",
                samples.len(),
                width * height
            )));
        }
        slices.push(samples);
        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
        if decoder.dimensions()? != (width as u32, height as u32) {
            return Err(Error::InvalidStack("label pages change size".into()));
        }
    }

    let depth = slices.len();
    let mut volume: LabelVolume = Array3::zeros((depth, height, width));
    for (z, samples) in slices.into_iter().enumerate() {
        for (i, v) in samples.into_iter().enumerate() {
            volume[(z, i / width, i % width)] = v;
        }
    }
    Ok(volume)
}

/// Finds the image stacks in a folder: supported extensions, dotfiles
/// skipped, sorted by name for a reproducible analysis order.
pub fn discover_images<P: AsRef<Path>>(folder: P) -> Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(folder.as_ref())? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if STACK_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}
