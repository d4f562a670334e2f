//! Traversal over ordered element sequences
//!
//! Every multi-field operation (message encode/decode, validity, refresh,
//! length) goes through these helpers, so "each element exactly once, in
//! declared order" holds in one place. They accept anything iterable:
//! field slices, boxed trait objects, layer lists.

/// Invoke `func` on every element, in order.
pub fn for_each<I, F>(seq: I, mut func: F)
where
    I: IntoIterator,
    F: FnMut(I::Item),
{
    for elem in seq {
        func(elem);
    }
}

/// Invoke `func` on every element together with its zero-based position.
pub fn for_each_with_index<I, F>(seq: I, mut func: F)
where
    I: IntoIterator,
    F: FnMut(usize, I::Item),
{
    for (idx, elem) in seq.into_iter().enumerate() {
        func(idx, elem);
    }
}

/// Left fold: `func(acc, elem)` applied in order, returning the final value.
pub fn accumulate<I, A, F>(seq: I, init: A, mut func: F) -> A
where
    I: IntoIterator,
    F: FnMut(A, I::Item) -> A,
{
    let mut acc = init;
    for elem in seq {
        acc = func(acc, elem);
    }
    acc
}

/// Like [`for_each`], stopping at the first error.
///
/// Elements after the failing one are not visited.
pub fn try_for_each<I, F, E>(seq: I, mut func: F) -> Result<(), E>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Result<(), E>,
{
    for elem in seq {
        func(elem)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Debug;

    #[test]
    fn test_for_each_visits_in_order() {
        let mut seen = Vec::new();
        for_each([3, 1, 2], |v| seen.push(v));
        assert_eq!(seen, vec![3, 1, 2]);
    }

    #[test]
    fn test_for_each_heterogeneous() {
        let items: Vec<Box<dyn Debug>> = vec![Box::new(1u8), Box::new("two"), Box::new(3.0f32)];
        let mut calls = Vec::new();
        for_each(&items, |item| calls.push(format!("{item:?}")));
        assert_eq!(calls, vec!["1", "\"two\"", "3.0"]);
    }

    #[test]
    fn test_for_each_with_index() {
        let mut seen = Vec::new();
        for_each_with_index(["a", "b", "c"], |idx, v| seen.push((idx, v)));
        assert_eq!(seen, vec![(0, "a"), (1, "b"), (2, "c")]);
    }

    #[test]
    fn test_accumulate_is_left_fold() {
        let joined = accumulate(["a", "b", "c"], String::new(), |mut acc, s| {
            acc.push_str(s);
            acc
        });
        assert_eq!(joined, "abc");
        assert_eq!(accumulate(Vec::<u32>::new(), 7, |a, b| a + b), 7);
    }

    #[test]
    fn test_try_for_each_stops_at_first_error() {
        let mut visited = 0;
        let res = try_for_each([1, 2, 3, 4], |v| {
            visited += 1;
            if v == 2 { Err(v) } else { Ok(()) }
        });
        assert_eq!(res, Err(2));
        assert_eq!(visited, 2);
    }
}
