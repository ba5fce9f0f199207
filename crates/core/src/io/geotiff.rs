//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate for TIFF I/O with the ModelPixelScale and
//! ModelTiepoint tags for georeferencing. Single band, striped layout;
//! sufficient for the HydroSHEDS direction and accumulation grids.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray32Float, Gray8};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

// GeoTIFF tag ids
const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;

/// Read a GeoTIFF file into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    let mut decoder =
        Decoder::new(file).map_err(|e| Error::Tiff(format!("decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Tiff(format!("cannot read dimensions: {}", e)))?;

    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Tiff(format!("cannot read image data: {}", e)))?;

    let data: Vec<T> = match result {
        DecodingResult::U8(buf) => cast_buffer(&buf),
        DecodingResult::U16(buf) => cast_buffer(&buf),
        DecodingResult::U32(buf) => cast_buffer(&buf),
        DecodingResult::I16(buf) => cast_buffer(&buf),
        DecodingResult::I32(buf) => cast_buffer(&buf),
        DecodingResult::F32(buf) => cast_buffer(&buf),
        DecodingResult::F64(buf) => cast_buffer(&buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    if data.len() != rows * cols {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Ok(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }

    Ok(raster)
}

fn cast_buffer<S, T>(buf: &[S]) -> Vec<T>
where
    S: Copy + num_traits::NumCast,
    T: RasterElement,
{
    buf.iter()
        .map(|&v| num_traits::cast(v).unwrap_or(T::default_nodata()))
        .collect()
}

/// Attempt to read a GeoTransform from TIFF tags
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| Error::Tiff("no pixel scale tag".into()))?;

    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| Error::Tiff("no tiepoint tag".into()))?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z]; scale: [ScaleX, ScaleY, ScaleZ]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];

        return Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
    }

    Err(Error::Tiff("cannot determine geotransform".into()))
}

/// Write a Raster to a GeoTIFF file.
///
/// `u8` rasters are written as 8-bit grayscale (direction grids); all other
/// element types are written as 32-bit float.
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let mut encoder =
        TiffEncoder::new(file).map_err(|e| Error::Tiff(format!("encoder error: {}", e)))?;

    let (rows, cols) = raster.shape();
    let gt = *raster.transform();

    // Shared geo tags, written through whichever image encoder the element
    // type selects below.
    macro_rules! write_geo_tags {
        ($image:expr) => {{
            let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
            $image
                .encoder()
                .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])
                .map_err(|e| Error::Tiff(format!("cannot write scale tag: {}", e)))?;

            let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
            $image
                .encoder()
                .write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])
                .map_err(|e| Error::Tiff(format!("cannot write tiepoint tag: {}", e)))?;

            // Minimal geokey directory: geographic model, pixel-is-area
            let geokeys: [u16; 12] = [
                1, 1, 0, 2, //
                1024, 0, 1, 2, // GTModelTypeGeoKey = ModelTypeGeographic
                1025, 0, 1, 1, // GTRasterTypeGeoKey = RasterPixelIsArea
            ];
            $image
                .encoder()
                .write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), &geokeys[..])
                .map_err(|e| Error::Tiff(format!("cannot write geokey tag: {}", e)))?;
        }};
    }

    if std::mem::size_of::<T>() == 1 && !T::is_float() {
        let data: Vec<u8> = raster
            .data()
            .iter()
            .map(|&v| num_traits::cast(v).unwrap_or(0))
            .collect();

        let mut image = encoder
            .new_image::<Gray8>(cols as u32, rows as u32)
            .map_err(|e| Error::Tiff(format!("cannot create image: {}", e)))?;
        write_geo_tags!(image);
        image
            .write_data(&data)
            .map_err(|e| Error::Tiff(format!("cannot write image data: {}", e)))?;
    } else {
        let data: Vec<f32> = raster
            .data()
            .iter()
            .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
            .collect();

        let mut image = encoder
            .new_image::<Gray32Float>(cols as u32, rows as u32)
            .map_err(|e| Error::Tiff(format!("cannot create image: {}", e)))?;
        write_geo_tags!(image);
        image
            .write_data(&data)
            .map_err(|e| Error::Tiff(format!("cannot write image data: {}", e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_u8_roundtrip() {
        let mut raster: Raster<u8> = Raster::new(4, 5);
        raster.set_transform(GeoTransform::new(146.0, -32.0, 0.05, -0.05));
        for row in 0..4 {
            for col in 0..5 {
                raster.set(row, col, (row * 5 + col) as u8).unwrap();
            }
        }

        let tmp = tempfile::NamedTempFile::with_suffix(".tif").unwrap();
        write_geotiff(&raster, tmp.path()).unwrap();

        let reloaded: Raster<u8> = read_geotiff(tmp.path()).unwrap();
        assert_eq!(reloaded.shape(), (4, 5));
        assert_eq!(reloaded.get(2, 3).unwrap(), 13);

        let gt = reloaded.transform();
        assert_relative_eq!(gt.origin_x, 146.0);
        assert_relative_eq!(gt.origin_y, -32.0);
        assert_relative_eq!(gt.pixel_width, 0.05);
        assert_relative_eq!(gt.pixel_height, -0.05);
    }

    #[test]
    fn test_float_roundtrip() {
        let mut raster: Raster<f64> = Raster::new(3, 3);
        raster.set(1, 1, 1234.5).unwrap();

        let tmp = tempfile::NamedTempFile::with_suffix(".tif").unwrap();
        write_geotiff(&raster, tmp.path()).unwrap();

        let reloaded: Raster<f64> = read_geotiff(tmp.path()).unwrap();
        assert_relative_eq!(reloaded.get(1, 1).unwrap(), 1234.5);
        assert_relative_eq!(reloaded.get(0, 0).unwrap(), 0.0);
    }
}
