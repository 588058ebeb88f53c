//! Helper macro for declaring store port error enums.
//!
//! Each declaration expands to a `thiserror` enum, one snake_case
//! constructor per variant taking `impl Into<_>` arguments, and a conversion
//! into the domain [`Error`](crate::domain::Error) under
//! [`ErrorCode::OperationFailed`](crate::domain::ErrorCode::OperationFailed).

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@constructor $variant $( [ $($field : $ty),* ] )?);
            )*
        }

        impl From<$name> for $crate::domain::Error {
            fn from(err: $name) -> Self {
                $crate::domain::Error::operation_failed(err.to_string())
            }
        }
    };

    (@constructor $variant:ident) => {
        ::paste::paste! {
            #[doc = concat!("Construct [`Self::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@constructor $variant:ident [ $($field:ident : $ty:ty),* ]) => {
        ::paste::paste! {
            #[doc = concat!("Construct [`Self::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use crate::domain::ErrorCode;

    define_port_error! {
        pub enum SamplePortError {
            Offline => "store offline",
            Rejected { message: String } => "rejected: {message}",
            Status { status: u16, message: String } => "status {status}: {message}",
        }
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(SamplePortError::offline().to_string(), "store offline");
    }

    #[test]
    fn string_fields_accept_str() {
        let err = SamplePortError::rejected("duplicate barcode");
        assert_eq!(err.to_string(), "rejected: duplicate barcode");
    }

    #[test]
    fn mixed_fields_keep_their_types() {
        let err = SamplePortError::status(409_u16, "conflict");
        assert_eq!(err.to_string(), "status 409: conflict");
    }

    #[test]
    fn converts_into_operation_failed() {
        let err: crate::domain::Error = SamplePortError::offline().into();
        assert_eq!(err.code(), ErrorCode::OperationFailed);
        assert_eq!(err.message(), "store offline");
    }
}
