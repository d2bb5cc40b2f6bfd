/// Checks that a numerical value is in the provided interval `[a,b]` and returns
/// early with an [`Error::Config`](crate::Error::Config) if not
///
/// ### Example
/// ```ignore
/// let value = 2.0;
/// ensure_interval!(value, 0.0, 1.0);
/// ```
/// This will return the error "Invalid value for \`value\`. Must be in the interval \[0, 1\]."
#[macro_export]
macro_rules! ensure_interval {
    ($var:expr, $a:expr, $b:expr) => {
        if !($var >= $a && $var <= $b) {
            return Err($crate::Error::Config(format!(
                "Invalid value for `{}`. Must be in the interval [{}, {}].",
                stringify!($var),
                $a,
                $b,
            )));
        }
    };
}
