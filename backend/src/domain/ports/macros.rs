//! `define_port_error!` generates the error enum of a driven port.
//!
//! Every variant carries named fields and a display template. Alongside the
//! enum the macro emits one snake_case constructor per variant whose
//! parameters accept anything convertible into the field types, so adapters
//! can write `BookingPersistenceError::query(err.to_string())` or pass a
//! `&str` directly.

macro_rules! define_port_error {
    (
        $(#[$enum_meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident { $($field:ident : $ty:ty),+ $(,)? } => $template:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($template)]
                $variant { $($field: $ty),+ },
            )+
        }

        ::paste::paste! {
            impl $name {
                $(
                    #[doc = "Build the `" $variant "` variant."]
                    pub fn [<$variant:snake>]($($field: impl Into<$ty>),+) -> Self {
                        Self::$variant { $($field: $field.into()),+ }
                    }
                )+
            }
        }
    };
}

pub(crate) use define_port_error;
