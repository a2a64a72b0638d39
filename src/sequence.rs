use crate::error::{QuotepressError, QuotepressResult};
use crate::model::{MediaItem, VarianceMode};

/// Block-transpose permutation of the generated item list.
///
/// The input is laid out as consecutive quote blocks of `group_size` items
/// (one per source image). Output is column-major over that matrix, so items
/// sharing an image index become contiguous: "different quote, same image".
///
/// `group_size` must be non-zero and evenly divide `items.len()`; anything
/// else is rejected rather than truncated.
pub fn interleave(items: &[MediaItem], group_size: usize) -> QuotepressResult<Vec<MediaItem>> {
    if group_size == 0 {
        return Err(QuotepressError::validation("group_size must be > 0"));
    }
    if !items.len().is_multiple_of(group_size) {
        return Err(QuotepressError::validation(format!(
            "group_size {} does not evenly divide {} items",
            group_size,
            items.len()
        )));
    }

    let rows = items.len() / group_size;
    let mut out = Vec::with_capacity(items.len());
    for col in 0..group_size {
        for row in 0..rows {
            out.push(items[row * group_size + col].clone());
        }
    }
    Ok(out)
}

/// Apply the job's variance mode to the generation-order item list.
pub fn apply_variance(
    mode: VarianceMode,
    items: Vec<MediaItem>,
    group_size: usize,
) -> QuotepressResult<Vec<MediaItem>> {
    match mode {
        VarianceMode::DifferentImage => Ok(items),
        VarianceMode::DifferentQuote => interleave(&items, group_size),
    }
}
