/// Groups a stream of fallible items into vectors of at most `size` items.
///
/// The first error is yielded on its own as soon as it is pulled, discarding
/// the partial group, and ends the iteration.
pub struct TryChunked<I> {
    inner: I,
    size: usize,
    done: bool,
}

/// A `size` of zero is treated as one.
pub fn try_chunked<I: IntoIterator>(iter: I, size: usize) -> TryChunked<I::IntoIter> {
    TryChunked {
        inner: iter.into_iter(),
        size: size.max(1),
        done: false,
    }
}

impl<I> TryChunked<I> {
    pub fn get_ref(&self) -> &I {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut I {
        &mut self.inner
    }
}

impl<I, T, E> Iterator for TryChunked<I>
where
    I: Iterator<Item = Result<T, E>>,
{
    type Item = Result<Vec<T>, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut piece = Vec::new();
        while piece.len() < self.size {
            match self.inner.next() {
                Some(Ok(item)) => piece.push(item),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }
        if piece.is_empty() { None } else { Some(Ok(piece)) }
    }
}
