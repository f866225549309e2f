//! # Raster
//!
//! Reading and writing of single band grids. Grids are TIFF files without any georeferencing,
//! previews are 8-bit greyscale images in whatever format the file extension names (normally
//! PNG).

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::{
    convert::TryFrom,
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use image::{GrayImage, Luma};
use log::debug;
use ndarray::Array2;
use ndarray_stats::{errors::MinMaxError, QuantileExt};
use tiff::{
    decoder::{Decoder, DecodingResult, Limits},
    encoder::{colortype, TiffEncoder},
    ColorType, TiffError,
};

use crate::{map::CostLayer, params::LayerParams};

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("Cannot open {0:?}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("TIFF error in {0:?}: {1}")]
    Tiff(PathBuf, TiffError),

    #[error("{0:?} must be a single band raster, found colour type {1:?}")]
    UnsupportedColorType(PathBuf, ColorType),

    #[error("{0:?} contains no cells")]
    Empty(PathBuf),

    #[error("{0:?} is {1}x{2} but only {3} samples could be read")]
    SampleCount(PathBuf, usize, usize, usize),

    #[error("Grid of {0}x{1} cells is too large to encode")]
    TooLarge(usize, usize),

    #[error("Layer {0:?} has shape {1:?} but the elevation raster has shape {2:?}")]
    LayerShape(PathBuf, (usize, usize), (usize, usize)),

    #[error("Cannot compute the range of the grid: {0}")]
    Range(#[from] MinMaxError),

    #[error("Cannot write image {0:?}: {1}")]
    Image(PathBuf, image::ImageError),
}

// -----------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Read the first band of a TIFF raster as an array of `f32` indexed `[[y, x]]`.
///
/// Any integer or floating point sample type is accepted.
pub fn read_grid<P: AsRef<Path>>(path: P) -> Result<Array2<f32>, RasterError> {
    let path = path.as_ref();
    let tiff_err = |e| RasterError::Tiff(path.to_path_buf(), e);

    let file = File::open(path).map_err(|e| RasterError::Io(path.to_path_buf(), e))?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(tiff_err)?
        .with_limits(Limits::unlimited());

    match decoder.colortype().map_err(tiff_err)? {
        ColorType::Gray(_) => (),
        other => return Err(RasterError::UnsupportedColorType(path.to_path_buf(), other)),
    }

    let (width, height) = decoder.dimensions().map_err(tiff_err)?;
    let (width, height) = (width as usize, height as usize);

    if width == 0 || height == 0 {
        return Err(RasterError::Empty(path.to_path_buf()));
    }

    let data: Vec<f32> = match decoder.read_image().map_err(tiff_err)? {
        DecodingResult::U8(d) => d.into_iter().map(f32::from).collect(),
        DecodingResult::U16(d) => d.into_iter().map(f32::from).collect(),
        DecodingResult::U32(d) => d.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(d) => d.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(d) => d.into_iter().map(f32::from).collect(),
        DecodingResult::I16(d) => d.into_iter().map(f32::from).collect(),
        DecodingResult::I32(d) => d.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(d) => d.into_iter().map(|v| v as f32).collect(),
        DecodingResult::F32(d) => d,
        DecodingResult::F64(d) => d.into_iter().map(|v| v as f32).collect(),
    };

    let num_samples = data.len();
    let grid = Array2::from_shape_vec((height, width), data).map_err(|_| {
        RasterError::SampleCount(path.to_path_buf(), width, height, num_samples)
    })?;

    debug!("Read {}x{} grid from {:?}", width, height, path);

    Ok(grid)
}

/// Write a grid as a single band 32-bit signed integer TIFF.
pub fn write_int_grid<P: AsRef<Path>>(grid: &Array2<i32>, path: P) -> Result<(), RasterError> {
    let path = path.as_ref();
    let (width, height) = encoded_dim(grid)?;
    let data: Vec<i32> = grid.iter().copied().collect();

    let mut encoder = create_encoder(path)?;
    encoder
        .write_image::<colortype::GrayI32>(width, height, &data)
        .map_err(|e| RasterError::Tiff(path.to_path_buf(), e))?;

    debug!("Wrote {}x{} integer grid to {:?}", width, height, path);

    Ok(())
}

/// Write a grid as a single band 32-bit float TIFF.
pub fn write_float_grid<P: AsRef<Path>>(grid: &Array2<f32>, path: P) -> Result<(), RasterError> {
    let path = path.as_ref();
    let (width, height) = encoded_dim(grid)?;
    let data: Vec<f32> = grid.iter().copied().collect();

    let mut encoder = create_encoder(path)?;
    encoder
        .write_image::<colortype::Gray32Float>(width, height, &data)
        .map_err(|e| RasterError::Tiff(path.to_path_buf(), e))?;

    debug!("Wrote {}x{} float grid to {:?}", width, height, path);

    Ok(())
}

/// Write an 8-bit greyscale preview of the grid, with the grid's minimum mapped to black and its
/// maximum to white. A grid with a single value is written all black.
pub fn write_preview<A, P>(grid: &Array2<A>, path: P) -> Result<(), RasterError>
where
    A: Copy + PartialOrd + Into<f64>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let (width, height) = encoded_dim(grid)?;

    let min: f64 = (*grid.min()?).into();
    let max: f64 = (*grid.max()?).into();

    let image = GrayImage::from_fn(width, height, |x, y| {
        let value: f64 = grid[[y as usize, x as usize]].into();
        let level = util::maths::lin_map((min, max), (0.0, 255.0), value);

        Luma([util::maths::clamp(level, 0.0, 255.0).round() as u8])
    });

    image
        .save(path)
        .map_err(|e| RasterError::Image(path.to_path_buf(), e))?;

    debug!("Wrote {}x{} preview to {:?}", width, height, path);

    Ok(())
}

/// Load an extra cost layer, resolving its filename relative to `base_dir` and checking it
/// matches the elevation raster's shape.
pub fn read_cost_layer(
    layer: &LayerParams,
    base_dir: &Path,
    dim: (usize, usize),
) -> Result<CostLayer, RasterError> {
    let path = base_dir.join(&layer.filename);
    let raw = read_grid(&path)?;

    if raw.dim() != dim {
        return Err(RasterError::LayerShape(path, raw.dim(), dim));
    }

    Ok(CostLayer::weighted(
        layer.filename.display().to_string(),
        raw,
        layer.weight,
    ))
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Width and height of the grid as encoded in an image header.
fn encoded_dim<A>(grid: &Array2<A>) -> Result<(u32, u32), RasterError> {
    let (rows, cols) = grid.dim();

    match (u32::try_from(cols), u32::try_from(rows)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(RasterError::TooLarge(cols, rows)),
    }
}

fn create_encoder(path: &Path) -> Result<TiffEncoder<BufWriter<File>>, RasterError> {
    let file = File::create(path).map_err(|e| RasterError::Io(path.to_path_buf(), e))?;

    TiffEncoder::new(BufWriter::new(file)).map_err(|e| RasterError::Tiff(path.to_path_buf(), e))
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
