use crate::tree::BuildError;
use glam::{DVec3, Vec3};

/// Root half-extent used when every point collapses onto the centroid.
/// Any positive power of two would do; 1.0 keeps degenerate clouds at a
/// sane scale.
pub const MIN_HALF_SIZE: f32 = 1.0;

/// Centers `points` on their centroid in place and returns the cubic root
/// half-extent: the smallest power of two >= the largest absolute
/// coordinate of the centered cloud.
pub fn center_cloud(points: &mut [Vec3]) -> Result<f32, BuildError> {
    if points.is_empty() {
        return Err(BuildError::EmptyCloud);
    }

    // Accumulate in f64 so the centroid of large clouds stays accurate.
    let sum = points
        .iter()
        .fold(DVec3::ZERO, |acc, point| acc + point.as_dvec3());
    let centroid = (sum / points.len() as f64).as_vec3();

    let mut max_abs = 0.0f32;
    for point in points.iter_mut() {
        *point -= centroid;
        max_abs = max_abs.max(point.abs().max_element());
    }

    if max_abs == 0.0 {
        return Ok(MIN_HALF_SIZE);
    }
    Ok(2f32.powf(max_abs.log2().ceil()))
}
