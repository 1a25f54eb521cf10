//! `ImageInput`/`ImageOutput`: a minimal uncompressed-BMP codec, used as
//! the universal fallback when a requested image format isn't available.
//! No crate in the corpus pulls in a general image-codec dependency, and
//! BMP's header is simple enough to read/write by hand, so this stays
//! dependency-free rather than reaching for one. The image-sequence job
//! directory layout around it does reach for `uuid`, for the same
//! correlation-id purpose [`crate::runtime::Simulator::job_id`] uses it.

use crate::storage::error::{StorageError, StorageResult};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Row-major, top-to-bottom RGB pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 3]>,
}

impl ImageBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        ImageBuffer { width, height, pixels: vec![[0, 0, 0]; (width * height) as usize] }
    }

    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        self.pixels[(y * self.width + x) as usize] = rgb;
    }
}

pub struct ImageOutput;

impl ImageOutput {
    pub fn write_bmp(path: &Path, image: &ImageBuffer) -> StorageResult<()> {
        let mut file = File::create(path)?;
        write_bmp(&mut file, image)
    }

    /// Path for one frame of an image sequence: `<output-stem>/<frame#>.<ext>`
    /// under the job directory, creating that directory on first use. A
    /// single (non-sequence) image stays at the stem itself.
    pub fn sequence_frame_path(job_dir: &Path, output_stem: &str, frame: usize, ext: &str) -> StorageResult<PathBuf> {
        let dir = job_dir.join(output_stem);
        std::fs::create_dir_all(&dir)?;
        Ok(dir.join(format!("{frame}.{ext}")))
    }

    pub fn write_sequence_frame(
        job_dir: &Path,
        output_stem: &str,
        frame: usize,
        ext: &str,
        image: &ImageBuffer,
    ) -> StorageResult<PathBuf> {
        let path = Self::sequence_frame_path(job_dir, output_stem, frame, ext)?;
        Self::write_bmp(&path, image)?;
        Ok(path)
    }
}

/// A unique, per-run job directory name ("under the job
/// directory"), generated the same way the simulator's own
/// correlation id is: a fresh random UUID rather than a sequence
/// counter, so concurrent runs never collide.
pub fn new_job_directory(base: &Path) -> PathBuf {
    base.join(uuid::Uuid::new_v4().to_string())
}

pub struct ImageInput;

impl ImageInput {
    pub fn read_bmp(path: &Path) -> StorageResult<ImageBuffer> {
        let mut file =
            File::open(path).map_err(|_| StorageError::MissingFile(path.display().to_string()))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        read_bmp(&bytes)
    }
}

fn row_stride(width: u32) -> u32 {
    (width * 3).div_ceil(4) * 4
}

fn write_bmp<W: Write>(w: &mut W, image: &ImageBuffer) -> StorageResult<()> {
    let row_size = row_stride(image.width);
    let pixel_data_size = row_size * image.height;
    let file_size = 54 + pixel_data_size;

    w.write_all(b"BM")?;
    w.write_all(&file_size.to_le_bytes())?;
    w.write_all(&0u32.to_le_bytes())?;
    w.write_all(&54u32.to_le_bytes())?;

    w.write_all(&40u32.to_le_bytes())?;
    w.write_all(&(image.width as i32).to_le_bytes())?;
    w.write_all(&(image.height as i32).to_le_bytes())?;
    w.write_all(&1u16.to_le_bytes())?;
    w.write_all(&24u16.to_le_bytes())?;
    w.write_all(&0u32.to_le_bytes())?;
    w.write_all(&pixel_data_size.to_le_bytes())?;
    w.write_all(&2835i32.to_le_bytes())?;
    w.write_all(&2835i32.to_le_bytes())?;
    w.write_all(&0u32.to_le_bytes())?;
    w.write_all(&0u32.to_le_bytes())?;

    for y in (0..image.height).rev() {
        let mut row = Vec::with_capacity(row_size as usize);
        for x in 0..image.width {
            let [r, g, b] = image.get(x, y);
            row.push(b);
            row.push(g);
            row.push(r);
        }
        row.resize(row_size as usize, 0);
        w.write_all(&row)?;
    }
    Ok(())
}

fn read_bmp(bytes: &[u8]) -> StorageResult<ImageBuffer> {
    if bytes.len() < 54 || &bytes[0..2] != b"BM" {
        return Err(StorageError::IllFormedMatrix("not a BMP file".into()));
    }
    let data_offset = u32::from_le_bytes(bytes[10..14].try_into().unwrap()) as usize;
    let width = i32::from_le_bytes(bytes[18..22].try_into().unwrap()) as u32;
    let height_raw = i32::from_le_bytes(bytes[22..26].try_into().unwrap());
    let height = height_raw.unsigned_abs();
    let bpp = u16::from_le_bytes(bytes[28..30].try_into().unwrap());
    if bpp != 24 {
        return Err(StorageError::IllFormedMatrix("only 24-bit BMP is supported".into()));
    }

    let row_size = row_stride(width);
    let mut image = ImageBuffer::new(width, height);
    for y in 0..height {
        // height_raw < 0 means rows are stored top-to-bottom already.
        let src_row = if height_raw < 0 { y } else { height - 1 - y };
        let row_start = data_offset + (src_row * row_size) as usize;
        for x in 0..width {
            let px = row_start + (x * 3) as usize;
            if px + 2 >= bytes.len() {
                continue;
            }
            image.set(x, y, [bytes[px + 2], bytes[px + 1], bytes[px]]);
        }
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmp_round_trips_through_an_in_memory_buffer() {
        let mut image = ImageBuffer::new(2, 2);
        image.set(0, 0, [255, 0, 0]);
        image.set(1, 0, [0, 255, 0]);
        image.set(0, 1, [0, 0, 255]);
        image.set(1, 1, [255, 255, 255]);

        let mut buffer = Vec::new();
        write_bmp(&mut buffer, &image).unwrap();
        let read_back = read_bmp(&buffer).unwrap();
        assert_eq!(read_back, image);
    }

    #[test]
    fn a_non_bmp_buffer_is_rejected() {
        assert!(read_bmp(b"not a bitmap").is_err());
    }

    #[test]
    fn a_sequence_frame_lands_under_stem_slash_frame_number() {
        let dir = tempfile::tempdir().unwrap();
        let image = ImageBuffer::new(1, 1);
        let path = ImageOutput::write_sequence_frame(dir.path(), "V", 3, "bmp", &image).unwrap();
        assert_eq!(path, dir.path().join("V").join("3.bmp"));
        assert!(path.exists());
    }

    #[test]
    fn distinct_job_directories_never_collide() {
        let base = Path::new("/tmp/n2a-jobs");
        assert_ne!(new_job_directory(base), new_job_directory(base));
    }
}
