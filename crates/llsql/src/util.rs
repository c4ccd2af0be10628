use std::fmt;

/// Create a `Display` value from a formatting closure.
pub fn display_fn<F>(f: F) -> impl fmt::Display
where
    F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
{
    struct DisplayFn<F>(F);

    impl<F> fmt::Display for DisplayFn<F>
    where
        F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
    {
        fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            (self.0)(formatter)
        }
    }

    DisplayFn(f)
}

/// Write the items separated by a single space, or `ε` if there are none.
pub fn write_sequence<T>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result
where
    T: fmt::Display,
{
    if items.is_empty() {
        return f.write_str("ε");
    }
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
