//! # Policy traits.

/// Decides the final command of an ungrouped conductor.
pub trait Policy<T>: Send + Sync + 'static {
    /// `Some(cmd)` to inject `cmd`, `None` to stay silent.
    fn decide(&self) -> Option<T>;
}

/// Decides the final command of each partition of a tagged conductor.
pub trait TaggedPolicy<T>: Send + Sync + 'static {
    /// Called once per existing partition; `tag` is `""` for the untagged one.
    fn decide(&self, tag: &str) -> Option<T>;
}

impl<T, F> Policy<T> for F
where
    F: Fn() -> Option<T> + Send + Sync + 'static,
{
    fn decide(&self) -> Option<T> {
        self()
    }
}

impl<T, F> TaggedPolicy<T> for F
where
    F: Fn(&str) -> Option<T> + Send + Sync + 'static,
{
    fn decide(&self, tag: &str) -> Option<T> {
        self(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run<P: Policy<u8>>(p: P) -> Option<u8> {
        p.decide()
    }

    fn run_tagged<P: TaggedPolicy<u8>>(p: P, tag: &str) -> Option<u8> {
        p.decide(tag)
    }

    #[test]
    fn closures_are_policies() {
        assert_eq!(run(|| Some(1)), Some(1));
        assert_eq!(run(|| None), None);
        assert_eq!(run_tagged(|tag: &str| (tag == "a").then_some(2), "a"), Some(2));
        assert_eq!(run_tagged(|tag: &str| (tag == "a").then_some(2), "b"), None);
    }
}
