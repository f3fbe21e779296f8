//! Nearest-predecessor search over address-sorted slices.

/// Index of the last entry whose address is at or below `address`.
///
/// `items` must be sorted by `address_of`. Returns `None` when `address` lies
/// below the first entry or the slice is empty.
pub fn find_nearest<T, F>(items: &[T], address_of: F, address: u32) -> Option<usize>
where
    F: Fn(&T) -> u32,
{
    let upper = items.partition_point(|item| address_of(item) <= address);
    upper.checked_sub(1)
}
