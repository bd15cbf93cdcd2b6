// Id { u32 }
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        pub struct $name {
            id: u32,
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.id)
            }
        }

        impl $name {
            pub const fn new(id: u32) -> Self {
                Self { id }
            }

            pub fn from_usize(id: usize) -> Self {
                Self { id: id as u32 }
            }

            pub fn as_usize(&self) -> usize {
                self.id as usize
            }

            pub fn id(&self) -> u32 {
                self.id
            }
        }
    };
}
