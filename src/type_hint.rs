use std::marker::PhantomData;

pub struct TypeHint<T>(PhantomData<*const T>);

impl<T> TypeHint<T> {
  #[inline]
  pub fn new() -> Self {
    Self::default()
  }
}

impl<T> Default for TypeHint<T> {
  fn default() -> Self {
    TypeHint(PhantomData)
  }
}

impl<T> Clone for TypeHint<T> {
  #[inline]
  fn clone(&self) -> Self {
    Self::new()
  }
}
