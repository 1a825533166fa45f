//! Macros for enumerated status types.

use thiserror::Error;

/// Returned when parsing a name that no variant of a generated status enum carries.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("unknown status '{0}'")]
pub struct UnknownStatus(pub String);

/// Generate an enumerated status type that maps each variant to its
/// canonical status name.
///
/// The generated type implements [`Status`](crate::core::Status), `Display`,
/// `FromStr`, serde (as the canonical name) and converts into
/// [`StateName`](crate::core::StateName), so it can be passed anywhere a plain
/// status string is accepted.
///
/// # Example
///
/// ```
/// use modelstatus::status_enum;
///
/// status_enum! {
///     pub enum AccountStatus {
///         Offline => "offline",
///         Online => "online",
///     }
/// }
///
/// assert_eq!(AccountStatus::Online.name(), "online");
/// assert_eq!(AccountStatus::from_name("offline"), Some(AccountStatus::Offline));
/// assert_eq!(AccountStatus::ALL.len(), 2);
/// ```
#[macro_export]
macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $value:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// The canonical status name.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value),*
                }
            }

            /// The variant carrying `name`, if any.
            pub fn from_name(name: &str) -> ::std::option::Option<Self> {
                match name {
                    $($value => ::std::option::Option::Some(Self::$variant),)*
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl $crate::core::Status for $name {
            fn name(&self) -> &str {
                $name::name(self)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($name::name(self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::builder::UnknownStatus;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                Self::from_name(s).ok_or_else(|| $crate::builder::UnknownStatus(s.to_string()))
            }
        }

        impl ::std::convert::From<$name> for $crate::core::StateName {
            fn from(status: $name) -> Self {
                $crate::core::StateName::new($name::name(&status))
            }
        }

        impl $crate::__serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: $crate::__serde::Serializer,
            {
                serializer.serialize_str($name::name(self))
            }
        }

        impl<'de> $crate::__serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: $crate::__serde::Deserializer<'de>,
            {
                let name: ::std::string::String =
                    $crate::__serde::Deserialize::deserialize(deserializer)?;
                Self::from_name(&name).ok_or_else(|| {
                    let message = format!("unknown status '{}'", name);
                    <D::Error as $crate::__serde::de::Error>::custom(message)
                })
            }
        }
    };
}
