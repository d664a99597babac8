//! A vector indexed by a typed index instead of a bare `usize`.

use core::fmt::Debug;
use core::fmt::Formatter;
use core::marker::PhantomData;
use core::ops::Index;
use core::ops::IndexMut;

#[derive(Clone)]
pub struct TVec<I, T> {
    vec: Vec<T>,
    phantom_i: PhantomData<I>,
}

impl<I, T> TVec<I, T>
where
    I: Copy + From<usize> + Into<usize>,
{
    pub fn new() -> Self {
        Self {
            vec: Vec::new(),
            phantom_i: PhantomData,
        }
    }

    /// Appends `value` and returns the index it was stored at.
    pub fn push(&mut self, value: T) -> I {
        let index = I::from(self.vec.len());
        self.vec.push(value);
        index
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.vec.iter()
    }

    pub fn iter_enumerated(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.vec.iter().enumerate().map(|(i, t)| (I::from(i), t))
    }
}

impl<I, T> Default for TVec<I, T>
where
    I: Copy + From<usize> + Into<usize>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I, T: Debug> Debug for TVec<I, T> {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> core::fmt::Result {
        self.vec.fmt(fmt)
    }
}

impl<I, T> Index<I> for TVec<I, T>
where
    I: Into<usize>,
{
    type Output = T;
    fn index(&self, index: I) -> &T {
        &self.vec[index.into()]
    }
}

impl<I, T> IndexMut<I> for TVec<I, T>
where
    I: Into<usize>,
{
    fn index_mut(&mut self, index: I) -> &mut T {
        &mut self.vec[index.into()]
    }
}
