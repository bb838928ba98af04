// Range queries over the sample/timestamp series for annotation display

use crate::core::constants::{POINT_FOCUS_HALF_HEIGHT, POINT_FOCUS_SECS, RANGE_FOCUS_DIVISOR};
use crate::core::error::{ProjectError, Result};
use crate::core::format::{Annotation, VerticalExtent, ViewWindow};
use chrono::{Duration, NaiveDateTime};

/// Max and min of the samples whose timestamp lies strictly inside
/// `(start, end)`. Timestamps must be sorted, which the loader guarantees.
pub fn range_query_between(
    timestamps: &[NaiveDateTime],
    samples: &[f64],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<VerticalExtent> {
    let len = timestamps.len().min(samples.len());
    let timestamps = &timestamps[..len];

    let lo = timestamps.partition_point(|t| *t <= start);
    let hi = timestamps.partition_point(|t| *t < end);
    if lo >= hi {
        return Err(ProjectError::EmptyRange { start, end });
    }

    let window = &samples[lo..hi];
    let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = window.iter().copied().fold(f64::INFINITY, f64::min);
    Ok(VerticalExtent { max, min })
}

/// Extent under the annotation's own bounds, exclusive on both sides.
///
/// A point annotation has an empty interior; callers that want the sample
/// under a point use [`vertical_extent`], which applies the tolerance.
pub fn range_query(
    timestamps: &[NaiveDateTime],
    samples: &[f64],
    annotation: &Annotation,
) -> Result<VerticalExtent> {
    range_query_between(timestamps, samples, annotation.start, annotation.end)
}

/// Extent used for drawing: points are widened by ±19 ms first.
pub fn vertical_extent(
    timestamps: &[NaiveDateTime],
    samples: &[f64],
    annotation: &Annotation,
) -> Result<VerticalExtent> {
    let (start, end) = annotation.query_window();
    range_query_between(timestamps, samples, start, end)
}

/// Viewport for jumping to an annotation.
pub fn focus_window(
    timestamps: &[NaiveDateTime],
    samples: &[f64],
    annotation: &Annotation,
) -> Result<ViewWindow> {
    if annotation.is_point() {
        let extent = vertical_extent(timestamps, samples, annotation)?;
        let pad = Duration::seconds(POINT_FOCUS_SECS);
        return Ok(ViewWindow {
            x_min: annotation.start - pad,
            x_max: annotation.end + pad,
            y_min: extent.max - POINT_FOCUS_HALF_HEIGHT,
            y_max: extent.max + POINT_FOCUS_HALF_HEIGHT,
        });
    }

    let extent = range_query(timestamps, samples, annotation)?;
    let half_height = (extent.max - extent.min) / 2.0;
    let pad = (annotation.end - annotation.start) / RANGE_FOCUS_DIVISOR;
    Ok(ViewWindow {
        x_min: annotation.start - pad,
        x_max: annotation.end + pad,
        y_min: extent.min - half_height,
        y_max: extent.max + half_height,
    })
}
