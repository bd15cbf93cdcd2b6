/// Borrows the payload of one enum variant.
pub trait TryAsRef<T> {
    fn try_as_ref(&self) -> Option<&T>;
}

/// Implements [`TryAsRef`] for each `Variant(Type)` of a newtype-variant enum.
///
/// ```
/// use lumen_utils::{convert::TryAsRef, impl_try_as_ref};
///
/// enum Value {
///     Text(String),
///     Count(usize),
/// }
///
/// impl_try_as_ref!(Value, Text(String), Count(usize));
///
/// let value = Value::Count(3);
/// assert_eq!(TryAsRef::<usize>::try_as_ref(&value), Some(&3));
/// assert_eq!(TryAsRef::<String>::try_as_ref(&value), None);
/// ```
#[macro_export]
macro_rules! impl_try_as_ref {
    ($enum_type:ident, $($variant:ident($variant_type:ty)),* $(,)?) => {
        $(
            impl $crate::convert::TryAsRef<$variant_type> for $enum_type {
                fn try_as_ref(&self) -> Option<&$variant_type> {
                    match self {
                        $enum_type::$variant(inner) => Some(inner),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }
            }
        )*
    };
}
