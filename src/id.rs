//! Identifiers.

use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[repr(C)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32, u16, u16, [u8; 8]);

        impl $name {
            pub(crate) fn new() -> $name {
                let uuid = Uuid::new_v4();
                let (a, b, c, d) = uuid.as_fields();
                $name(a, b, c, *d)
            }
        }
    };
}

uuid_id! {
    /// A unique identifier for a surface in a [`Document`](crate::Document).
    ///
    /// (this is just a UUID)
    SurfaceId
}

uuid_id! {
    /// Identifies an object that owns subjects or subscribes to them: widgets, data sources.
    ObjectId
}

#[test]
fn test_ids_are_unique() {
    let a = SurfaceId::new();
    let b = SurfaceId::new();
    assert_ne!(a, b);
    assert_ne!(ObjectId::new(), ObjectId::new());
}
