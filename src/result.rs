/// Minimal interface every detector result satisfies, so the fusion layer
/// can treat heterogeneous outputs uniformly. Detectors that carry an
/// explicit reason list return it; the others derive their reasons from
/// their own fields.
pub trait Verdict {
    fn is_suspicious(&self) -> bool;
    fn reasons(&self) -> Vec<String>;
}
