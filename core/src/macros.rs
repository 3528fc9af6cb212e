/// Builds a `CircularBuffer` the way `vec!` builds a `Vec`.
///
/// ```
/// use circbuf::circbuf;
///
/// let empty: circbuf::CircularBuffer<u8> = circbuf![];
/// assert!(empty.is_empty());
/// let zeros = circbuf![0u8; 4];
/// assert_eq!(zeros, [0, 0, 0, 0]);
/// let items = circbuf![1, 2, 3];
/// assert_eq!(items.back(), Some(&3));
/// ```
#[macro_export]
macro_rules! circbuf {
    () => {
        $crate::CircularBuffer::new()
    };
    ($elem:expr; $n:expr) => {
        $crate::CircularBuffer::from_elem($elem, $n)
    };
    ($($x:expr),+ $(,)?) => {
        $crate::CircularBuffer::from([$($x),+])
    };
}
