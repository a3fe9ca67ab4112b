use crate::LookupError;

/// A lower bound on the number of moves needed to solve `state`.
pub trait Heuristic<S: ?Sized> {
    /// # Errors
    ///
    /// Whatever the backing store fails with. A state the heuristic knows
    /// nothing about is not an error.
    fn heuristic(&mut self, state: &S) -> Result<u8, LookupError>;
}

/// Adapts a heuristic over keys to a heuristic over whole states by
/// extracting the key first.
pub struct Keyed<F, H> {
    key: F,
    inner: H,
}

impl<F, H> Keyed<F, H> {
    pub fn new(key: F, inner: H) -> Self {
        Keyed { key, inner }
    }
}

impl<S: ?Sized, F: Fn(&S) -> String, H: Heuristic<str>> Heuristic<S> for Keyed<F, H> {
    fn heuristic(&mut self, state: &S) -> Result<u8, LookupError> {
        let key = (self.key)(state);
        self.inner.heuristic(&key)
    }
}

/// The largest of several heuristics, which stays admissible when each of
/// them is.
pub struct MaxHeuristic<'a, S: ?Sized> {
    parts: Vec<Box<dyn Heuristic<S> + 'a>>,
}

impl<'a, S: ?Sized> MaxHeuristic<'a, S> {
    #[must_use]
    pub fn new() -> Self {
        MaxHeuristic { parts: vec![] }
    }

    #[must_use]
    pub fn with(mut self, part: impl Heuristic<S> + 'a) -> Self {
        self.parts.push(Box::new(part));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl<S: ?Sized> Default for MaxHeuristic<'_, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized> Heuristic<S> for MaxHeuristic<'_, S> {
    fn heuristic(&mut self, state: &S) -> Result<u8, LookupError> {
        let mut best = 0;
        for part in &mut self.parts {
            best = best.max(part.heuristic(state)?);
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Length;

    impl Heuristic<str> for Length {
        fn heuristic(&mut self, state: &str) -> Result<u8, LookupError> {
            Ok(u8::try_from(state.len()).unwrap_or(u8::MAX))
        }
    }

    struct Fixed(u8);

    impl Heuristic<str> for Fixed {
        fn heuristic(&mut self, _: &str) -> Result<u8, LookupError> {
            Ok(self.0)
        }
    }

    #[test]
    fn max_of_parts() {
        let mut max = MaxHeuristic::<str>::new().with(Length).with(Fixed(3));
        assert_eq!(max.len(), 2);
        assert_eq!(max.heuristic("ab").unwrap(), 3);
        assert_eq!(max.heuristic("abcde").unwrap(), 5);
        assert_eq!(MaxHeuristic::<str>::default().heuristic("abc").unwrap(), 0);
    }

    #[test]
    fn keyed_extracts_first() {
        let mut keyed = Keyed::new(|n: &usize| "x".repeat(*n), Length);
        assert_eq!(keyed.heuristic(&4).unwrap(), 4);
    }
}
