use foundation::handles::Handle;

/// Handle to a marker owned by `MarkerRegistry`.
///
/// The generation is the registry's marker-set generation; ids issued before
/// a `set_cities` call never resolve afterwards.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub Handle);

impl MarkerId {
    pub fn index(&self) -> u32 {
        self.0.index()
    }

    pub fn generation(&self) -> u32 {
        self.0.generation()
    }
}
