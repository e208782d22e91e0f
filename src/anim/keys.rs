use super::types::Key;
use itertools::Itertools;

/// Result of looking up a time in a channel of keys
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeySpan<'a, T> {
    /// The channel has no keys
    Empty,
    /// Only one key applies. Times before the first key or after the last
    /// key clamp to that key, as does a channel with a single key.
    Clamped(&'a Key<T>),
    /// Bracketing keys and the interpolation parameter between them
    Between(&'a Key<T>, &'a Key<T>, f32),
}

/// Finds the keys around `time` with a linear scan. Keys must be sorted by
/// time. The pair satisfies `first.time <= time < second.time`.
pub fn find<T>(keys: &[Key<T>], time: f32) -> KeySpan<'_, T> {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return KeySpan::Empty;
    };
    if time <= first.time {
        return KeySpan::Clamped(first);
    }
    if time >= last.time {
        return KeySpan::Clamped(last);
    }
    keys.iter()
        .tuple_windows()
        .find(|(a, b)| a.time <= time && time < b.time)
        .map_or(KeySpan::Clamped(last), |(a, b)| {
            KeySpan::Between(
                a,
                b,
                crate::interpolate::weight(a.time, b.time, time),
            )
        })
}

/// Samples a channel, using `default` when it is empty and `blend` between
/// bracketing keys
pub fn sample<T, F>(keys: &[Key<T>], time: f32, default: T, blend: F) -> T
where
    T: Copy,
    F: Fn(&T, &T, f32) -> T,
{
    match find(keys, time) {
        KeySpan::Empty => default,
        KeySpan::Clamped(k) => k.value,
        KeySpan::Between(a, b, u) => blend(&a.value, &b.value, u),
    }
}
