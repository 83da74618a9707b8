#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// A per-frame extraction of scene state into draw-ready data.
pub trait Layer {
    fn id(&self) -> LayerId;

    fn name(&self) -> &'static str;
}
