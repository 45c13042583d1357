/// Wrap `pos` into `0..len`. Negative positions count back from the end.
///
/// An empty range always yields 0.
pub fn norm_pos(pos: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    pos.rem_euclid(len as isize) as usize
}

/// Step `pos` by `delta` and wrap into `0..len`
pub fn step(pos: usize, delta: isize, len: usize) -> usize {
    norm_pos(pos as isize + delta, len)
}
